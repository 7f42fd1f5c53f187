//! Byte-size formatting for reports and prompts

const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Format bytes into a human-readable string using powers of 1024.
///
/// Zero is rendered as `"0B"`; everything else gets two decimals and a
/// space before the unit. Sizes beyond petabytes stay in PB.
///
/// # Example
/// ```
/// use reclaimarr::services::file_utils::format_bytes;
/// assert_eq!(format_bytes(1536), "1.50 KB");
/// assert_eq!(format_bytes(1073741824), "1.00 GB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    format!("{:.2} {}", value, UNITS[unit])
}
