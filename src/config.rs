use std::env;
use std::fmt;

use crate::redact::redacted;

const DEFAULT_API_BASE: &str = "https://api.soundcloud.com";
const DEFAULT_TOKEN_URL: &str = "https://secure.soundcloud.com/oauth/token";

/// Application configuration from environment variables.
///
/// Store and SoundCloud credentials are optional here; a missing value is
/// reported by whichever component needs it on first use.
#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub kv_rest_api_url: Option<String>,
    pub kv_rest_api_token: Option<String>,
    pub soundcloud_client_id: Option<String>,
    pub soundcloud_client_secret: Option<String>,
    pub soundcloud_api_base: String,
    pub soundcloud_token_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match env::var("PORT") {
            Ok(p) => p
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a port number, got {:?}", p))?,
            Err(_) => 8081,
        };

        Ok(Self {
            port,
            kv_rest_api_url: non_empty_var("KV_REST_API_URL"),
            kv_rest_api_token: non_empty_var("KV_REST_API_TOKEN"),
            soundcloud_client_id: non_empty_var("SOUNDCLOUD_CLIENT_ID"),
            soundcloud_client_secret: non_empty_var("SOUNDCLOUD_CLIENT_SECRET"),
            soundcloud_api_base: non_empty_var("SOUNDCLOUD_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.into()),
            soundcloud_token_url: non_empty_var("SOUNDCLOUD_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_TOKEN_URL.into()),
        })
    }

    /// Log which credentials are present. Values are never printed.
    pub fn log_environment(&self) {
        tracing::info!(
            kv_url = self.kv_rest_api_url.is_some(),
            kv_token = %redacted(self.kv_rest_api_token.as_deref()),
            client_id = %redacted(self.soundcloud_client_id.as_deref()),
            client_secret = %redacted(self.soundcloud_client_secret.as_deref()),
            "environment check"
        );
        for (name, missing) in [
            ("KV_REST_API_URL", self.kv_rest_api_url.is_none()),
            ("KV_REST_API_TOKEN", self.kv_rest_api_token.is_none()),
            ("SOUNDCLOUD_CLIENT_ID", self.soundcloud_client_id.is_none()),
            ("SOUNDCLOUD_CLIENT_SECRET", self.soundcloud_client_secret.is_none()),
        ] {
            if missing {
                tracing::warn!("{} is not set; requests needing it will fail", name);
            }
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("kv_rest_api_url", &self.kv_rest_api_url)
            .field("kv_rest_api_token", &redacted(self.kv_rest_api_token.as_deref()))
            .field("soundcloud_client_id", &redacted(self.soundcloud_client_id.as_deref()))
            .field(
                "soundcloud_client_secret",
                &redacted(self.soundcloud_client_secret.as_deref()),
            )
            .field("soundcloud_api_base", &self.soundcloud_api_base)
            .field("soundcloud_token_url", &self.soundcloud_token_url)
            .finish()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
