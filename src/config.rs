use std::{env, path::PathBuf, str::FromStr};
use tracing::warn;

/// Upper bound for `SESSION_DAYS`, roughly ten years.
pub const MAX_SESSION_DAYS: i64 = 3650;

/// Runtime settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub admin_code: Option<String>,
    pub session_days: i64,
    pub cookie_secure: bool,
    pub bcrypt_cost: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            data_path: PathBuf::from("data/state.json"),
            admin_code: None,
            session_days: 30,
            cookie_secure: false,
            bcrypt_cost: 10,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: parse_var("PORT", defaults.port),
            data_path: env::var("APP_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            admin_code: env::var("ADMIN_CODE").ok().filter(|code| !code.is_empty()),
            session_days: parse_var("SESSION_DAYS", defaults.session_days).clamp(1, MAX_SESSION_DAYS),
            cookie_secure: parse_var("COOKIE_SECURE", defaults.cookie_secure),
            bcrypt_cost: parse_var("BCRYPT_COST", defaults.bcrypt_cost).clamp(4, 31),
        }
    }
}

fn parse_var<T: FromStr + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!(variable = name, value = %raw, "invalid value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_path, PathBuf::from("data/state.json"));
        assert_eq!(config.session_days, 30);
        assert!(config.admin_code.is_none());
        assert!(!config.cookie_secure);
    }

    #[test]
    fn parse_var_falls_back_when_unset() {
        assert_eq!(parse_var("CIVIC_SCORE_TEST_UNSET_VARIABLE", 42u16), 42);
    }

    #[test]
    fn session_days_are_clamped() {
        let _guard = ENV_LOCK.lock().unwrap();
        for (raw, expected) in [("0", 1), ("90", 90), ("9223372036854775807", MAX_SESSION_DAYS)] {
            unsafe { env::set_var("SESSION_DAYS", raw) };
            assert_eq!(Config::from_env().session_days, expected);
        }
        unsafe { env::remove_var("SESSION_DAYS") };
    }
}
