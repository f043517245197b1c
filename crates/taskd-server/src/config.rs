use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

/// Server configuration, merged from `config.toml` and `TASKD_`-prefixed
/// environment variables (env wins).
#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path to the SQLite database file.
    #[serde(default = "default_db_file")]
    pub db_file: String,
    /// Directory with the static web UI, served at `/`.
    #[serde(default = "default_web_dir")]
    pub web_dir: String,
    /// Sign-in password. Unset disables authentication entirely.
    #[serde(default)]
    pub password: Option<String>,
    /// HMAC key for session tokens. Override in any deployment that sets a
    /// password; tokens do not survive a secret change.
    #[serde(default = "default_token_secret")]
    pub token_secret: String,
}

fn default_port() -> u16 {
    7540
}

fn default_db_file() -> String {
    "taskd.db".to_string()
}

fn default_web_dir() -> String {
    "./web".to_string()
}

fn default_token_secret() -> String {
    "taskd-dev-secret".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            db_file: default_db_file(),
            web_dir: default_web_dir(),
            password: None,
            token_secret: default_token_secret(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("TASKD_"))
            .extract()
    }
}
