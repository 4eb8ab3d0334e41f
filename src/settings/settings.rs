use anyhow::{Result, anyhow};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    pub store: Store,
    pub http: Http,
    pub log: Log,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    pub backend: String, // "fake" or "real"
    pub issuer: String,
    pub audience: String,
    pub access_ttl_secs: u64,
    /// Name of the environment variable holding the HS256 signing key.
    pub signing_key_env: String,
}

#[derive(Debug, Deserialize)]
pub struct Store {
    pub backend: String, // "memory" or "mysql"
    pub mysql_dsn: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

// e.g. FELLOWSHIP__STORE__BACKEND=mysql
const ENV_PREFIX: &str = "FELLOWSHIP";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

pub fn parse_settings_str(toml: &str) -> Result<Settings> {
    Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))
}
