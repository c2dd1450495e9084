//! Small helpers shared across the engine.

/// Returns the current Unix timestamp in seconds.
///
/// A clock set before the Unix epoch yields 0 rather than failing.
pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

/// Checks a region key: non-empty, ASCII letters and digits only.
///
/// Returns the offending characters, space separated, on failure.
pub fn validate_region_key(key: &str) -> Result<(), String> {
    if key.is_empty() {
        return Err("<empty>".to_string());
    }

    let invalid: Vec<String> = key
        .chars()
        .filter(|c| !c.is_ascii_alphanumeric())
        .map(|c| c.to_string())
        .collect();

    if invalid.is_empty() {
        Ok(())
    } else {
        Err(invalid.join(" "))
    }
}
