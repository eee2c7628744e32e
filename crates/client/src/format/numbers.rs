/// Suffix thresholds, largest first.
const UNITS: [(u64, &str); 3] = [(1_000_000_000, "b"), (1_000_000, "m"), (1_000, "k")];

/// Compact count label: `999`, `1k`, `1.1k`, `2.5m`.
///
/// One decimal is kept and truncated (never rounded up), so a value just under
/// the next unit reads `999.9k` rather than `1000k`.
pub fn abbreviate_count(n: u64) -> String {
    for (unit, suffix) in UNITS {
        if n >= unit {
            let tenths = n / (unit / 10);
            let whole = tenths / 10;
            let frac = tenths % 10;
            return if frac == 0 {
                format!("{}{}", whole, suffix)
            } else {
                format!("{}.{}{}", whole, frac, suffix)
            };
        }
    }
    n.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abbreviations() {
        assert_eq!(abbreviate_count(0), "0");
        assert_eq!(abbreviate_count(999), "999");
        assert_eq!(abbreviate_count(1000), "1k");
        assert_eq!(abbreviate_count(1100), "1.1k");
        assert_eq!(abbreviate_count(1999), "1.9k");
        assert_eq!(abbreviate_count(999_999), "999.9k");
        assert_eq!(abbreviate_count(1_000_000), "1m");
        assert_eq!(abbreviate_count(2_540_000), "2.5m");
        assert_eq!(abbreviate_count(3_000_000_000), "3b");
    }
}
