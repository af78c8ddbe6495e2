use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Patient,
    Doctor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Role resolved from the token claim; unknown roles resolve to `None`.
    pub fn clinic_role(&self) -> Option<Role> {
        match self.role.as_deref() {
            Some("patient") => Some(Role::Patient),
            Some("doctor") => Some(Role::Doctor),
            _ => None,
        }
    }

    pub fn uuid(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.id).ok()
    }

    /// Whether this caller is the given record owner acting in the given role.
    pub fn is(&self, role: Role, id: Uuid) -> bool {
        self.clinic_role() == Some(role) && self.uuid() == Some(id)
    }
}
