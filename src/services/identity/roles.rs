//! Role helpers on top of the provider-issued `metadata.role` claim.
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::session::SessionContext;

/// Dotted claim path the identity provider writes the role to.
pub const ROLE_CLAIM: &str = "metadata.role";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Moderator,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Moderator => "moderator",
        }
    }

    /// The role a claim value names. Claims must spell the role exactly;
    /// only configuration goes through the lenient `FromStr`.
    pub fn from_claim(value: &str) -> Option<Self> {
        [Self::Admin, Self::Moderator]
            .into_iter()
            .find(|role| role.as_str() == value)
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "moderator" => Ok(Self::Moderator),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True when the session is signed in and carries exactly this role.
pub fn check_role(session: &SessionContext, role: Role) -> bool {
    session.is_authenticated() && session.role() == Some(role)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_known_roles_case_insensitively() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(" Moderator ".parse::<Role>(), Ok(Role::Moderator));
        assert_eq!(
            "owner".parse::<Role>(),
            Err(UnknownRole("owner".to_string()))
        );
    }

    #[test]
    fn check_role_reads_metadata_role() {
        let admin = SessionContext::authenticated("sess_1", "user_1")
            .with_claims(json!({ "metadata": { "role": "admin" } }));
        assert!(check_role(&admin, Role::Admin));
        assert!(!check_role(&admin, Role::Moderator));

        let plain = SessionContext::authenticated("sess_2", "user_2");
        assert!(!check_role(&plain, Role::Admin));
    }

    #[test]
    fn claim_must_spell_role_exactly() {
        assert_eq!(Role::from_claim("admin"), Some(Role::Admin));
        assert_eq!(Role::from_claim("Admin"), None);
        assert_eq!(Role::from_claim(" admin"), None);

        let shouty = SessionContext::authenticated("sess_4", "user_4")
            .with_claims(json!({ "metadata": { "role": "Admin" } }));
        assert_eq!(shouty.role(), None);
        assert!(!check_role(&shouty, Role::Admin));
    }

    #[test]
    fn pending_sessions_hold_no_role() {
        let pending = SessionContext::pending("sess_3", "user_3", ["choose-organization"])
            .with_claims(json!({ "metadata": { "role": "admin" } }));
        assert!(!check_role(&pending, Role::Admin));
    }
}
