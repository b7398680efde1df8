use serde::Serialize;

use crate::services::identity::{Claims, SessionContext, SessionStatus};

/// Body of `GET /api/v1/user`.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user_id: Option<String>,
    pub session: SessionSummary,
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub id: String,
    pub status: SessionStatus,
    pub org_id: Option<String>,
    pub role: Option<&'static str>,
    pub claims: Claims,
}

impl From<SessionContext> for UserResponse {
    fn from(s: SessionContext) -> Self {
        let role = s.role().map(|r| r.as_str());
        Self {
            user_id: s.user_id,
            session: SessionSummary {
                id: s.session_id,
                status: s.status,
                org_id: s.org_id,
                role,
                claims: s.claims,
            },
        }
    }
}
