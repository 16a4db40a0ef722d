use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::record::Record;

/// Stored end-user account. `password_hash` is an argon2 PHC string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub username: String,
    pub password_hash: String,
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

impl Record for UserAccount {
    const KIND: &'static str = "user";

    fn key(&self) -> &str { &self.username }
}

/// Public view of a user, safe to hand to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub fullname: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl From<&UserAccount> for UserProfile {
    fn from(u: &UserAccount) -> Self {
        Self {
            username: u.username.clone(),
            fullname: u.fullname.clone(),
            email: u.email.clone(),
            phone: u.phone.clone(),
            address: u.address.clone(),
        }
    }
}

/// Stored admin account. Admin usernames live in their own namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminAccount {
    pub username: String,
    pub password_hash: String,
}

impl Record for AdminAccount {
    const KIND: &'static str = "admin";

    fn key(&self) -> &str { &self.username }
}

/// Registration form input, including the password confirmation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

impl Registration {
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_username(&self.username)?;
        if self.password.is_empty() {
            return Err(ModelError::required("password"));
        }
        if self.password != self.confirm_password {
            return Err(ModelError::Validation("passwords do not match".into()));
        }
        Ok(())
    }
}

pub fn validate_username(username: &str) -> Result<(), ModelError> {
    if username.trim().is_empty() {
        return Err(ModelError::required("username"));
    }
    if username.trim() != username {
        return Err(ModelError::Validation("username must not have surrounding whitespace".into()));
    }
    Ok(())
}
