use models::user::Registration;
use serde::{Deserialize, Serialize};

/// Which credential namespace a login targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthKind {
    Admin,
    User,
}

/// Result of a successful login, handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub kind: AuthKind,
    /// Present for users, `None` for admins.
    pub fullname: Option<String>,
}

impl Session {
    pub fn is_admin(&self) -> bool { self.kind == AuthKind::Admin }
}

/// Admin account installed when the admin store starts out empty.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

/// Accounts installed into empty credential stores on first open.
#[derive(Debug, Clone, Default)]
pub struct CredentialSeeds {
    pub admins: Vec<AdminSeed>,
    pub users: Vec<Registration>,
}
