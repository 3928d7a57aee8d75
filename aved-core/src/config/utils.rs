//! Configuration utility functions
//!
//! Helpers for reading typed values from environment variables.

/// Get a string value from an environment variable or use the default
pub fn get_env_string(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

/// Get a u64 value from an environment variable or use the default
pub fn get_env_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring non-numeric value '{}' for {}", val, key);
            default
        }),
        Err(_) => default,
    }
}

/// Get a whitespace-separated list from an environment variable
pub fn get_env_list(key: &str) -> Option<Vec<String>> {
    std::env::var(key)
        .ok()
        .map(|val| val.split_whitespace().map(str::to_string).collect())
}
