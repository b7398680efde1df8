//! Request-time admission decision.
//!
//! The gate is pure: the caller resolves the session first and passes the
//! lookup result in. Nothing here awaits or mutates shared state.
use url::form_urlencoded;

use crate::services::admission::types::{
    Decision, DenyAction, GateConfig, Rejection, RequestDescriptor, Requirement, RouteClass,
};
use crate::services::identity::{IdentityResult, SessionContext, SessionStatus};

/// What the identity collaborator returned for this request.
pub type SessionLookup = IdentityResult<Option<SessionContext>>;

#[derive(Debug)]
pub struct AdmissionGate {
    config: GateConfig,
}

impl AdmissionGate {
    pub fn new(config: GateConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Exclusions are consulted before protected rules, except that `always`
    /// rules keep a path in scope even when a skip rule also matches.
    pub fn classify(&self, path: &str) -> RouteClass<'_> {
        let config = &self.config;

        if !config.always.matches(path) && config.skip.matches(path) {
            return RouteClass::OutOfScope;
        }
        if config.public.matches(path) {
            return RouteClass::Public;
        }
        config
            .protected
            .iter()
            .find(|route| route.pattern.matches(path))
            .map_or(RouteClass::Unprotected, |route| {
                RouteClass::Protected(&route.requirement)
            })
    }

    /// Whether the gate looks at this path at all (and a session is worth resolving).
    pub fn in_scope(&self, path: &str) -> bool {
        self.classify(path) != RouteClass::OutOfScope
    }

    pub fn evaluate(&self, request: &RequestDescriptor<'_>, session: &SessionLookup) -> Decision {
        let requirement = match self.classify(request.path) {
            RouteClass::Protected(requirement) => requirement,
            _ => {
                if let Err(err) = session {
                    tracing::debug!(
                        error = %err,
                        path = request.path,
                        "session lookup failed on unprotected path"
                    );
                }
                return Decision::Continue;
            }
        };

        let session = match session {
            Ok(session) => session.as_ref(),
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    path = request.path,
                    "session lookup failed; treating request as unauthenticated"
                );
                None
            }
        };

        let decision = match session.map(|s| (s, s.status)) {
            None | Some((_, SessionStatus::Anonymous)) => self.deny_unauthenticated(request),
            Some((_, SessionStatus::Pending)) => self.redirect_or_reject(
                request,
                &self.config.redirects.session_tasks,
                Rejection::Unauthenticated,
            ),
            Some((s, SessionStatus::Authenticated)) => match requirement {
                Requirement::Authenticated => Decision::Continue,
                Requirement::Session(check) if s.has(check) => Decision::Continue,
                Requirement::Session(_) => self.deny_unauthorized(request),
            },
        };

        if decision != Decision::Continue {
            tracing::debug!(
                path = request.path,
                requirement = %requirement,
                session_id = session.map(|s| s.session_id.as_str()),
                ?decision,
                "request not admitted"
            );
        }
        decision
    }

    fn deny_unauthenticated(&self, request: &RequestDescriptor<'_>) -> Decision {
        match self.config.on_unauthenticated {
            DenyAction::Reject => Decision::Reject(Rejection::Unauthenticated),
            DenyAction::Redirect => {
                let target = self.sign_in_target(request);
                self.redirect_or_reject(request, &target, Rejection::Unauthenticated)
            }
        }
    }

    fn deny_unauthorized(&self, request: &RequestDescriptor<'_>) -> Decision {
        match self.config.on_unauthorized {
            DenyAction::Reject => Decision::Reject(Rejection::Forbidden),
            DenyAction::Redirect => self.redirect_or_reject(
                request,
                &self.config.redirects.unauthorized,
                Rejection::Forbidden,
            ),
        }
    }

    // A redirect back to the very path being denied would loop; reject instead.
    fn redirect_or_reject(
        &self,
        request: &RequestDescriptor<'_>,
        target: &str,
        fallback: Rejection,
    ) -> Decision {
        let target_path = target.split('?').next().unwrap_or(target);
        if target_path == request.path {
            return Decision::Reject(fallback);
        }
        Decision::Redirect(target.to_string())
    }

    fn sign_in_target(&self, request: &RequestDescriptor<'_>) -> String {
        let redirects = &self.config.redirects;
        let Some(param) = redirects.return_to_param.as_deref() else {
            return redirects.sign_in.clone();
        };

        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair(param, &request.path_and_query())
            .finish();
        let sep = if redirects.sign_in.contains('?') { '&' } else { '?' };
        format!("{}{}{}", redirects.sign_in, sep, query)
    }
}
