use super::RtouchConfig;
use tracing::warn;

/// Bearer credential for the upstream hub
pub const SUPERVISOR_TOKEN_VAR: &str = "SUPERVISOR_TOKEN";

/// Shared secret for webhook signatures
pub const WEBHOOK_SECRET_VAR: &str = "WEBHOOK_SECRET";

/// Process-wide secrets, read once at start-up and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct ProxyEnv {
    /// Hub bearer token. Absence is tolerated; the hub will reject the calls.
    pub supervisor_token: Option<String>,
    /// Webhook secret. Absence disables the webhook endpoint (500).
    pub webhook_secret: Option<String>,
}

impl ProxyEnv {
    /// Build from env vars. Empty values count as unset.
    pub fn from_env() -> Self {
        let env = Self {
            supervisor_token: non_empty_var(SUPERVISOR_TOKEN_VAR),
            webhook_secret: non_empty_var(WEBHOOK_SECRET_VAR),
        };

        if env.supervisor_token.is_none() {
            warn!("{} is not set; upstream hub calls will be unauthenticated", SUPERVISOR_TOKEN_VAR);
        }
        if env.webhook_secret.is_none() {
            warn!("{} is not set; /webhook will reject all requests", WEBHOOK_SECRET_VAR);
        }

        env
    }
}

impl RtouchConfig {
    /// Apply RTOUCH_PORT / RTOUCH_HA_URL overrides on top of file config.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("RTOUCH_PORT") {
            match v.parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!(value = %v, "Ignoring invalid RTOUCH_PORT"),
            }
        }
        if let Some(url) = non_empty_var("RTOUCH_HA_URL") {
            self.upstream.base_url = url;
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
