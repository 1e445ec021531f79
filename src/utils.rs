use chrono::TimeZone;

/// Configures a custom Rayon thread pool with specified size.
///
/// Used when `--threads` is given so that both the per-symbol fan out and the
/// per-window transforms run on an explicitly sized pool instead of the global one.
///
/// # Arguments
/// * `num_threads` - Desired number of threads for the pool.
///
/// # Returns
/// * `Result<ThreadPool>` - Created thread pool or an error if creation fails.
pub fn configure_thread_pool(num_threads: usize) -> anyhow::Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build thread pool: {}", e))
}

/// Parses the `<DATE>` and `<TIME>` columns of an export row into a Unix timestamp.
///
/// # Arguments
/// * `date` - Date as `YYYYMMDD`.
/// * `time` - Time as `HHMMSS`.
///
/// # Returns
/// * `anyhow::Result<u64>` - Seconds since epoch, UTC.
pub fn parse_export_datetime(date: &str, time: &str) -> anyhow::Result<u64> {
    let dt_str = format!("{} {}", date, time);
    let dt = chrono::NaiveDateTime::parse_from_str(&dt_str, "%Y%m%d %H%M%S")
        .map_err(|e| anyhow::anyhow!("Failed to parse datetime '{}': {}", dt_str, e))?;
    let timestamp = dt.and_utc().timestamp();
    u64::try_from(timestamp).map_err(|_| anyhow::anyhow!("Datetime '{}' is before the epoch", dt_str))
}

/// Formats Unix timestamp into readable string: YYYY-MM-DD HH:MM:SS.
///
/// # Arguments
/// * `ts` - Unix timestamp in seconds.
///
/// # Returns
/// * `anyhow::Result<String>` - Formatted string (e.g., "2024-06-13 10:00:00") or error if invalid timestamp.
pub fn format_timestamp(ts: u64) -> anyhow::Result<String> {
    let dt = chrono::Utc
        .timestamp_opt(ts as i64, 0)
        .single()
        .ok_or_else(|| anyhow::anyhow!("Invalid timestamp: {}", ts))?;
    anyhow::Ok(dt.format("%Y-%m-%d %H:%M:%S").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_format_roundtrip() {
        let ts = parse_export_datetime("20231214", "090100").unwrap();
        assert_eq!(ts, 1_702_544_460);
        assert_eq!(format_timestamp(ts).unwrap(), "2023-12-14 09:01:00");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_export_datetime("2023-12-14", "090000").is_err());
        assert!(parse_export_datetime("20231214", "9").is_err());
    }
}
