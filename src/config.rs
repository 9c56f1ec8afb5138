//! Centralizes every environment variable this core reads, the way each
//! teacher daemon pulls its own `YUI_*` knob via `ctx.env_parse`, but
//! gathered once at startup instead of scattered across call sites.

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub listen_port: u16,
    pub ws_port: u16,
    pub message_bus_url: Option<String>,
    pub jwt_signing_key: String,
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_secs: u64,
    pub whatsapp_store_path: String,
    pub media_dir: String,
    pub qr_timeout_secs: u64,
    pub restore_stagger_ms: u64,
    pub hub_buffer_size: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;
        let jwt_signing_key = std::env::var("JWT_SIGNING_KEY")
            .map_err(|_| anyhow::anyhow!("JWT_SIGNING_KEY must be set"))?;

        Ok(Self {
            database_url,
            listen_port: env_parse("LISTEN_PORT", 8080),
            ws_port: env_parse("WS_PORT", 8081),
            // absent optional bus URL MUST NOT fail startup (§6.4)
            message_bus_url: std::env::var("MESSAGE_BUS_URL").ok(),
            jwt_signing_key,
            access_token_ttl_secs: env_parse("ACCESS_TOKEN_TTL_SECS", 900),
            refresh_token_ttl_secs: env_parse("REFRESH_TOKEN_TTL_SECS", 1_209_600),
            whatsapp_store_path: env_string("WHATSAPP_STORE_PATH", "whatsapp.db"),
            media_dir: env_string("MEDIA_DIR", "storage/media"),
            qr_timeout_secs: env_parse("QR_TIMEOUT_SECS", 60),
            restore_stagger_ms: env_parse("RESTORE_STAGGER_MS", 750),
            hub_buffer_size: env_parse("HUB_BUFFER_SIZE", 256),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_falls_back_to_default_when_unset_or_invalid() {
        // SAFETY: single-threaded test, no concurrent env access.
        unsafe {
            std::env::remove_var("CHATCORE_TEST_KEY");
        }
        assert_eq!(env_parse::<u16>("CHATCORE_TEST_KEY", 42), 42);

        unsafe {
            std::env::set_var("CHATCORE_TEST_KEY", "not-a-number");
        }
        assert_eq!(env_parse::<u16>("CHATCORE_TEST_KEY", 42), 42);

        unsafe {
            std::env::set_var("CHATCORE_TEST_KEY", "99");
        }
        assert_eq!(env_parse::<u16>("CHATCORE_TEST_KEY", 42), 99);

        unsafe {
            std::env::remove_var("CHATCORE_TEST_KEY");
        }
    }
}
