//! Env-driven configuration: one-time dotenv loading, typed getters, and
//! the default catalog file paths.
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Once;

static INIT: Once = Once::new();

/// Load .env if present, exactly once. Safe to call many times.
pub fn init_env() {
    INIT.call_once(|| {
        let _ = dotenv::dotenv();
    });
}

/// Get optional env var (None if unset or empty).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Get parsed value with default fallback.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Clone,
{
    init_env();
    match std::env::var(key) {
        Ok(raw) => raw.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Boolean flag: accepts 1/true/yes/on and 0/false/no/off.
pub fn env_flag(key: &str, default: bool) -> bool {
    init_env();
    std::env::var(key)
        .ok()
        .map(|v| match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        })
        .unwrap_or(default)
}

/// Raw catalog CSV path (MM_DATA_CSV, default data/data.csv).
pub fn data_csv_path() -> PathBuf {
    env_opt("MM_DATA_CSV")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/data.csv"))
}

/// Cleaned catalog CSV path (MM_CLEANED_CSV, default data/cleaned.csv).
pub fn cleaned_csv_path() -> PathBuf {
    env_opt("MM_CLEANED_CSV")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/cleaned.csv"))
}
