//! Audio tempo decomposition.
//!
//! FFmpeg's `atempo` filter accepts factors in [0.5, 2.0] per stage,
//! so an arbitrary speed multiplier is realized as a chain of bounded
//! stages whose product equals the requested factor. The video-side
//! `setpts` filter has no such restriction and stays a single stage.

/// Build the `atempo` filter chain for a speed multiplier.
///
/// Non-positive, NaN, or unit speed yields an empty chain. Fixed
/// stages render as `atempo=0.5` / `atempo=2.0`; the final remainder
/// carries four decimals.
pub fn atempo_chain(speed: f64) -> Vec<String> {
    if !(speed > 0.0) || speed == 1.0 {
        return Vec::new();
    }

    let mut filters = Vec::new();
    let mut remaining = speed;

    while remaining < 0.5 {
        filters.push("atempo=0.5".to_string());
        remaining /= 0.5;
    }
    while remaining > 2.0 {
        filters.push("atempo=2.0".to_string());
        remaining /= 2.0;
    }
    filters.push(format!("atempo={:.4}", remaining));

    filters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_speed_is_empty() {
        assert!(atempo_chain(1.0).is_empty());
    }

    #[test]
    fn test_invalid_speed_is_empty() {
        assert!(atempo_chain(0.0).is_empty());
        assert!(atempo_chain(-2.0).is_empty());
        assert!(atempo_chain(f64::NAN).is_empty());
    }

    #[test]
    fn test_in_range_speed_is_single_stage() {
        assert_eq!(atempo_chain(1.5), vec!["atempo=1.5000"]);
        assert_eq!(atempo_chain(0.75), vec!["atempo=0.7500"]);
        assert_eq!(atempo_chain(2.0), vec!["atempo=2.0000"]);
        assert_eq!(atempo_chain(0.5), vec!["atempo=0.5000"]);
    }

    #[test]
    fn test_speed_four_is_two_stages() {
        assert_eq!(atempo_chain(4.0), vec!["atempo=2.0", "atempo=2.0000"]);
    }

    #[test]
    fn test_speed_quarter_is_two_stages() {
        assert_eq!(atempo_chain(0.25), vec!["atempo=0.5", "atempo=0.5000"]);
    }

    #[test]
    fn test_speed_eight() {
        let chain = atempo_chain(8.0);
        assert_eq!(chain, vec!["atempo=2.0", "atempo=2.0", "atempo=2.0000"]);
    }

    fn stage_value(stage: &str) -> f64 {
        stage.strip_prefix("atempo=").unwrap().parse().unwrap()
    }

    #[test]
    fn test_stages_in_range_and_product_matches() {
        for speed in [0.1, 0.25, 0.3, 0.5, 0.75, 1.5, 2.0, 3.0, 4.0, 7.3, 16.0, 32.0] {
            let chain = atempo_chain(speed);
            let mut product = 1.0;
            for stage in &chain {
                let value = stage_value(stage);
                assert!((0.5..=2.0).contains(&value), "stage {stage} out of range");
                product *= value;
            }
            assert!(
                (product - speed).abs() < 1e-3,
                "product {product} != speed {speed}"
            );
        }
    }
}
