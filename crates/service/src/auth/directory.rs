use std::sync::Arc;

use models::user::{validate_username, AdminAccount, Registration, UserAccount, UserProfile};
use tracing::{debug, info, instrument, warn};

use super::domain::{AuthKind, CredentialSeeds, Session};
use super::password::CredentialHasher;
use crate::errors::ServiceError;
use crate::storage::{BlobStore, RecordStore};

/// Blob key holding the ordered user collection.
pub const USER_DATA_KEY: &str = "userData";
/// Blob key holding the username -> user mirror of the user collection.
pub const USER_MAP_KEY: &str = "userMap";
/// Blob key holding the ordered admin collection.
pub const ADMINS_KEY: &str = "adminCredentials";

/// User and admin accounts in two independent namespaces.
///
/// Lookups go through the record stores' key index, so authentication is a
/// single hash-map probe plus one argon2 verification.
pub struct CredentialDirectory {
    users: RecordStore<UserAccount>,
    admins: RecordStore<AdminAccount>,
    hasher: CredentialHasher,
}

impl CredentialDirectory {
    /// Open both namespaces over `blobs`. A namespace with no persisted blob
    /// at all is filled from `seeds`; one persisted empty stays empty.
    pub async fn open(
        blobs: Arc<dyn BlobStore>,
        hasher: CredentialHasher,
        seeds: CredentialSeeds,
    ) -> Result<Self, ServiceError> {
        let users = RecordStore::new(Arc::clone(&blobs), USER_DATA_KEY).with_index_blob(USER_MAP_KEY);
        let admins = RecordStore::new(blobs, ADMINS_KEY);
        let users_loaded = users.load().await;
        let admins_loaded = admins.load().await;
        let dir = Self { users, admins, hasher };

        if !admins_loaded.blob_found && !seeds.admins.is_empty() {
            for seed in &seeds.admins {
                dir.add_admin(&seed.username, &seed.password).await?;
            }
            info!(count = seeds.admins.len(), "admin accounts seeded");
        }
        if !users_loaded.blob_found && !seeds.users.is_empty() {
            for seed in seeds.users {
                dir.register(seed).await?;
            }
            info!("user accounts seeded");
        }
        Ok(dir)
    }

    /// Exact password check against the admin namespace.
    #[instrument(skip(self, password))]
    pub async fn authenticate_admin(&self, username: &str, password: &str) -> bool {
        let ok = match self.admins.get(username).await {
            Some(admin) => self.hasher.verify(password, &admin.password_hash),
            None => false,
        };
        debug!(ok, "admin authentication");
        ok
    }

    /// Exact password check against the user namespace.
    #[instrument(skip(self, password))]
    pub async fn authenticate_user(&self, username: &str, password: &str) -> bool {
        let ok = match self.users.get(username).await {
            Some(user) => self.hasher.verify(password, &user.password_hash),
            None => false,
        };
        debug!(ok, "user authentication");
        ok
    }

    pub async fn authenticate(&self, kind: AuthKind, username: &str, password: &str) -> bool {
        match kind {
            AuthKind::Admin => self.authenticate_admin(username, password).await,
            AuthKind::User => self.authenticate_user(username, password).await,
        }
    }

    /// Authenticate and, on success, describe the logged-in account.
    pub async fn login(&self, kind: AuthKind, username: &str, password: &str) -> Option<Session> {
        match kind {
            AuthKind::Admin => {
                let admin = self.admins.get(username).await?;
                if !self.hasher.verify(password, &admin.password_hash) {
                    warn!(%username, "admin login rejected");
                    return None;
                }
                info!(%username, "admin_login");
                Some(Session { username: admin.username, kind, fullname: None })
            }
            AuthKind::User => {
                let user = self.users.get(username).await?;
                if !self.hasher.verify(password, &user.password_hash) {
                    warn!(%username, "user login rejected");
                    return None;
                }
                info!(%username, "user_login");
                Some(Session { username: user.username, kind, fullname: Some(user.fullname) })
            }
        }
    }

    /// Register a user. The password confirmation must match.
    ///
    /// # Examples
    /// ```
    /// use service::auth::{CredentialDirectory, CredentialHasher, CredentialSeeds};
    /// use service::storage::MemoryBlobStore;
    /// use models::user::Registration;
    /// let hasher = CredentialHasher::new(64, 1).unwrap();
    /// let dir = tokio_test::block_on(CredentialDirectory::open(MemoryBlobStore::new(), hasher, CredentialSeeds::default())).unwrap();
    /// let reg = Registration { username: "u1".into(), password: "pw1".into(), confirm_password: "pw1".into(), ..Default::default() };
    /// tokio_test::block_on(dir.register(reg)).unwrap();
    /// assert!(tokio_test::block_on(dir.authenticate_user("u1", "pw1")));
    /// assert!(!tokio_test::block_on(dir.authenticate_user("u1", "wrong")));
    /// ```
    #[instrument(skip(self, registration), fields(username = %registration.username))]
    pub async fn register(&self, registration: Registration) -> Result<UserProfile, ServiceError> {
        registration.validate()?;
        if self.users.contains(&registration.username).await {
            return Err(ServiceError::duplicate("user", registration.username));
        }
        let account = UserAccount {
            password_hash: self.hasher.hash(&registration.password)?,
            username: registration.username,
            fullname: registration.fullname,
            email: registration.email,
            phone: registration.phone,
            address: registration.address,
        };
        let stored = self.users.add(account).await?;
        info!(username = %stored.username, "user_registered");
        Ok(UserProfile::from(&stored))
    }

    /// Create a user with only a username and password.
    pub async fn add_user(&self, username: &str, password: &str) -> Result<UserProfile, ServiceError> {
        self.register(Registration {
            username: username.to_string(),
            password: password.to_string(),
            confirm_password: password.to_string(),
            ..Default::default()
        })
        .await
    }

    pub async fn remove_user(&self, username: &str) -> Result<UserProfile, ServiceError> {
        let removed = self.users.remove(username).await?;
        info!(%username, "user_removed");
        Ok(UserProfile::from(&removed))
    }

    pub async fn add_admin(&self, username: &str, password: &str) -> Result<(), ServiceError> {
        validate_username(username)?;
        if password.is_empty() {
            return Err(ServiceError::Validation("password is required".into()));
        }
        if self.admins.contains(username).await {
            return Err(ServiceError::duplicate("admin", username));
        }
        let account = AdminAccount { username: username.to_string(), password_hash: self.hasher.hash(password)? };
        self.admins.add(account).await?;
        info!(%username, "admin_added");
        Ok(())
    }

    pub async fn remove_admin(&self, username: &str) -> Result<(), ServiceError> {
        self.admins.remove(username).await?;
        info!(%username, "admin_removed");
        Ok(())
    }

    pub async fn user_profile(&self, username: &str) -> Option<UserProfile> {
        self.users.get(username).await.as_ref().map(UserProfile::from)
    }

    pub async fn users(&self) -> Vec<UserProfile> {
        self.users.list().await.iter().map(UserProfile::from).collect()
    }

    pub async fn admin_usernames(&self) -> Vec<String> {
        self.admins.list().await.into_iter().map(|a| a.username).collect()
    }
}
