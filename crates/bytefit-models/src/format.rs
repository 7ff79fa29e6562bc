//! Byte formatting for user-facing log lines.

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Format a byte count for display: `842 B`, `1.5 KB`, `1.00 MB`.
///
/// Bytes print whole, kilobytes with one decimal, megabytes and above
/// with two.
pub fn pretty_bytes(bytes: u64) -> String {
    let b = bytes as f64;
    if b < KIB {
        format!("{} B", bytes)
    } else if b < MIB {
        format!("{:.1} KB", b / KIB)
    } else if b < GIB {
        format!("{:.2} MB", b / MIB)
    } else {
        format!("{:.2} GB", b / GIB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_print_whole() {
        assert_eq!(pretty_bytes(0), "0 B");
        assert_eq!(pretty_bytes(1), "1 B");
        assert_eq!(pretty_bytes(842), "842 B");
        assert_eq!(pretty_bytes(1023), "1023 B");
    }

    #[test]
    fn test_kilobytes_one_decimal() {
        assert_eq!(pretty_bytes(1024), "1.0 KB");
        assert_eq!(pretty_bytes(1536), "1.5 KB");
        assert_eq!(pretty_bytes(500_000), "488.3 KB");
    }

    #[test]
    fn test_megabytes_two_decimals() {
        assert_eq!(pretty_bytes(1_048_576), "1.00 MB");
        assert_eq!(pretty_bytes(2_621_440), "2.50 MB");
    }

    #[test]
    fn test_gigabytes_two_decimals() {
        assert_eq!(pretty_bytes(1_073_741_824), "1.00 GB");
        assert_eq!(pretty_bytes(1_610_612_736), "1.50 GB");
    }
}
