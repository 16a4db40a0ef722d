//! Credential directory: admin and user accounts, registration and login.
//!
//! Passwords are stored as salted argon2 hashes, never in plaintext.

pub mod directory;
pub mod domain;
pub mod password;

pub use directory::{CredentialDirectory, ADMINS_KEY, USER_DATA_KEY, USER_MAP_KEY};
pub use domain::{AdminSeed, AuthKind, CredentialSeeds, Session};
pub use password::CredentialHasher;
