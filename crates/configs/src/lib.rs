use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub geocode: GeocodeConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backend: StorageBackend::File, data_dir: default_data_dir() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeConfig {
    #[serde(default = "default_geocode_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Delay before a typed address is looked up; `0` fires immediately.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_geocode_timeout")]
    pub timeout_secs: u64,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocode_url(),
            user_agent: default_user_agent(),
            debounce_ms: default_debounce_ms(),
            timeout_secs: default_geocode_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedAdmin {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_argon2_memory")]
    pub argon2_memory_kib: u32,
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,
    /// Installed only when the admin store is empty.
    #[serde(default = "default_seed_admins")]
    pub seed_admins: Vec<SeedAdmin>,
    /// Installed only when the user store is empty.
    #[serde(default = "default_seed_users")]
    pub seed_users: Vec<SeedUser>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            argon2_memory_kib: default_argon2_memory(),
            argon2_iterations: default_argon2_iterations(),
            seed_admins: default_seed_admins(),
            seed_users: default_seed_users(),
        }
    }
}

fn default_data_dir() -> String { "data".into() }
fn default_geocode_url() -> String { "https://nominatim.openstreetmap.org".into() }
fn default_user_agent() -> String { concat!("ambulance-portal/", env!("CARGO_PKG_VERSION")).into() }
fn default_debounce_ms() -> u64 { 500 }
fn default_geocode_timeout() -> u64 { 10 }
fn default_argon2_memory() -> u32 { 19 * 1024 }
fn default_argon2_iterations() -> u32 { 2 }

fn default_seed_admins() -> Vec<SeedAdmin> {
    vec![
        SeedAdmin { username: "admin1".into(), password: "admin123".into() },
        SeedAdmin { username: "admin2".into(), password: "admin456".into() },
    ]
}

fn default_seed_users() -> Vec<SeedUser> {
    vec![SeedUser {
        username: "user1".into(),
        password: "user123".into(),
        fullname: "John Doe".into(),
        email: "john@example.com".into(),
        phone: "1234567890".into(),
        address: "123 Main St".into(),
    }]
}

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Like [`AppConfig::load_and_validate`], but a missing config file yields
    /// the defaults instead of an error. A file that exists but fails to parse
    /// is still an error.
    pub fn load_or_default() -> Result<Self> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        let mut cfg = if std::path::Path::new(&path).exists() {
            load_from_file(&path)?
        } else {
            AppConfig::default()
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.storage.normalize();
        self.geocode.validate()?;
        self.auth.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        if let Some(w) = self.worker_threads {
            if w == 0 { self.worker_threads = Some(4); }
        } else {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl StorageConfig {
    fn normalize(&mut self) {
        if self.data_dir.trim().is_empty() {
            self.data_dir = default_data_dir();
        }
    }
}

impl GeocodeConfig {
    pub fn validate(&self) -> Result<()> {
        let lower = self.base_url.trim().to_lowercase();
        if lower.is_empty() {
            return Err(anyhow!("geocode.base_url is empty"));
        }
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(anyhow!("geocode.base_url must start with http:// or https://"));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("geocode.timeout_secs must be a positive number of seconds"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn validate(&self) -> Result<()> {
        if self.argon2_memory_kib < 8 {
            return Err(anyhow!("auth.argon2_memory_kib must be >= 8"));
        }
        if self.argon2_iterations == 0 {
            return Err(anyhow!("auth.argon2_iterations must be >= 1"));
        }
        Ok(())
    }
}
