use std::path::PathBuf;

use secstr::{SecStr, SecUtf8};
use serde::{Deserialize, Deserializer};

use crate::week::WeekStart;

/// Process-wide settings, read once from `GHLOG_`-prefixed environment
/// variables and immutable afterwards.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_hook_path")]
    pub hook_path: String,
    /// Unset means webhook signatures aren't checked.
    #[serde(default, deserialize_with = "deserialize_opt_secstr")]
    pub webhook_secret: Option<SecStr>,
    #[serde(default)]
    pub week_start: WeekStart,
    /// Unset means the remote weekly log is disabled.
    #[serde(default)]
    pub drive_folder_id: Option<String>,
    /// A pre-obtained access token for headless deployments. Unset means the
    /// interactive installed-app flow runs on first start.
    #[serde(default, deserialize_with = "deserialize_opt_secutf8")]
    pub drive_token: Option<SecUtf8>,
    #[serde(default = "default_client_secret_path")]
    pub client_secret_path: PathBuf,
    #[serde(default = "default_token_cache_name")]
    pub token_cache_name: String,
}

fn default_port() -> u16 {
    8080
}

fn default_hook_path() -> String {
    "/hook".to_owned()
}

fn default_client_secret_path() -> PathBuf {
    PathBuf::from("client_secret.json")
}

fn default_token_cache_name() -> String {
    "ghlog-drive.json".to_owned()
}

fn deserialize_opt_secstr<'de, D>(de: D) -> Result<Option<SecStr>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(de).map(|o| o.map(|s| SecStr::new(s.into_bytes())))
}

fn deserialize_opt_secutf8<'de, D>(de: D) -> Result<Option<SecUtf8>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(de).map(|o| o.map(SecUtf8::from))
}
