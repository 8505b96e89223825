use std::path::PathBuf;

/// Upper bound for any request body, uploaded file included.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Credentials of the account created by the startup seed step.
#[derive(Clone, Debug)]
pub struct WardenSeed {
    pub username: String,
    pub password: String,
    pub name: String,
}

/// Process configuration resolved from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub upload_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub warden: WardenSeed,
}

impl Config {
    pub fn from_env() -> Self {
        fn str_env(name: &str, default: &str) -> String {
            std::env::var(name)
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        }
        Self {
            database_url: str_env("DATABASE_URL", "sqlite://hostel.db"),
            upload_dir: PathBuf::from(str_env("UPLOAD_DIR", "uploads")),
            host: str_env("HOST", "0.0.0.0"),
            port: std::env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(5000),
            warden: WardenSeed {
                username: str_env("WARDEN_USERNAME", "warden"),
                password: str_env("WARDEN_PASSWORD", "warden123"),
                name: str_env("WARDEN_NAME", "Hostel Warden"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial_test::serial]
    fn defaults_and_overrides() {
        for k in ["DATABASE_URL", "UPLOAD_DIR", "HOST", "PORT", "WARDEN_USERNAME", "WARDEN_PASSWORD", "WARDEN_NAME"] {
            std::env::remove_var(k);
        }
        let cfg = Config::from_env();
        assert_eq!(cfg.database_url, "sqlite://hostel.db");
        assert_eq!(cfg.upload_dir, PathBuf::from("uploads"));
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.warden.username, "warden");

        std::env::set_var("PORT", "8081");
        std::env::set_var("UPLOAD_DIR", "/tmp/hostel-up");
        let cfg = Config::from_env();
        assert_eq!(cfg.port, 8081);
        assert_eq!(cfg.upload_dir, PathBuf::from("/tmp/hostel-up"));

        // unparseable port falls back to the default
        std::env::set_var("PORT", "not-a-port");
        assert_eq!(Config::from_env().port, 5000);
        std::env::remove_var("PORT");
        std::env::remove_var("UPLOAD_DIR");
    }
}
