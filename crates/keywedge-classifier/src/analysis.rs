use keywedge_core::{BurstAnalysis, ClassifierTuning, Confidence, Decision, Trigger};
use std::time::Duration;

/// Classify one completed burst.
///
/// `elapsed` is the time from the first to the last keystroke of the burst.
/// Speed is the mean gap between those keystrokes, so every keystroke of
/// `raw` counts, whitespace included. Length and patterns use the trimmed text.
pub fn analyze(
    raw: &str,
    elapsed: Duration,
    tuning: &ClassifierTuning,
    trigger: Trigger,
) -> BurstAnalysis {
    let text = raw.trim();
    let char_count = text.chars().count();

    if char_count == 0 {
        return BurstAnalysis {
            text: String::new(),
            char_count: 0,
            elapsed,
            ms_per_char: 0.0,
            all_digits: false,
            alnum_no_spaces: false,
            is_fast: false,
            is_barcode_length: false,
            decision: Decision::Empty,
            trigger,
        };
    }

    let gaps = raw.chars().count().saturating_sub(1);
    let ms_per_char = if gaps == 0 {
        0.0
    } else {
        elapsed.as_nanos() as f64 / 1_000_000.0 / gaps as f64
    };
    let all_digits = text.chars().all(|c| c.is_ascii_digit());
    let alnum_no_spaces = text.chars().all(|c| c.is_alphanumeric());
    let is_fast = ms_per_char > 0.0 && ms_per_char < tuning.fast_threshold_ms as f64;
    let is_barcode_length =
        (tuning.min_barcode_len..=tuning.max_barcode_len).contains(&char_count);

    let decision = if is_fast && is_barcode_length && (all_digits || alnum_no_spaces) {
        Decision::Scanned(Confidence::High)
    } else if is_fast && char_count >= tuning.min_fast_len {
        Decision::Scanned(Confidence::Medium)
    } else {
        Decision::Typed
    };

    BurstAnalysis {
        text: text.to_string(),
        char_count,
        elapsed,
        ms_per_char,
        all_digits,
        alnum_no_spaces,
        is_fast,
        is_barcode_length,
        decision,
        trigger,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(raw: &str, elapsed_ms: u64) -> BurstAnalysis {
        analyze(
            raw,
            Duration::from_millis(elapsed_ms),
            &ClassifierTuning::default(),
            Trigger::Timeout,
        )
    }

    #[test]
    fn test_analyze_fast_digits_is_high_confidence() {
        let a = run("12345678", 70);
        assert!(a.all_digits);
        assert!(a.is_fast);
        assert!(a.is_barcode_length);
        assert_eq!(a.decision, Decision::Scanned(Confidence::High));
        assert_eq!(a.text, "12345678");
    }

    #[test]
    fn test_analyze_fast_alnum_is_high_confidence() {
        let a = run("ABC123XYZ9", 90);
        assert!(!a.all_digits);
        assert!(a.alnum_no_spaces);
        assert_eq!(a.decision, Decision::Scanned(Confidence::High));
    }

    #[test]
    fn test_analyze_trims_whitespace_before_counting() {
        let a = run("  12345678\n", 70);
        assert_eq!(a.text, "12345678");
        assert_eq!(a.char_count, 8);
        assert_eq!(a.decision, Decision::Scanned(Confidence::High));
    }

    #[test]
    fn test_analyze_whitespace_only_is_empty() {
        let a = run("   ", 30);
        assert_eq!(a.decision, Decision::Empty);
        assert_eq!(a.char_count, 0);
    }

    #[test]
    fn test_analyze_slow_input_is_typed() {
        let a = run("12345678", 8 * 300);
        assert!(!a.is_fast);
        assert_eq!(a.decision, Decision::Typed);
    }

    #[test]
    fn test_analyze_speed_at_threshold_is_not_fast() {
        // 7 gaps over 560ms is exactly 80ms/char
        let a = run("12345678", 560);
        assert_eq!(a.ms_per_char, 80.0);
        assert!(!a.is_fast);
        assert_eq!(a.decision, Decision::Typed);
    }

    #[test]
    fn test_analyze_speed_is_mean_gap() {
        // 10ms between 8 keystrokes
        let a = run("12345678", 70);
        assert_eq!(a.ms_per_char, 10.0);
    }

    #[test]
    fn test_analyze_gap_just_over_threshold_is_not_fast() {
        let a = run("12345678", 7 * 81);
        assert_eq!(a.ms_per_char, 81.0);
        assert!(!a.is_fast);
        assert_eq!(a.decision, Decision::Typed);

        let a = run("12345678901234567890", 19 * 81);
        assert!(!a.is_fast);
        assert_eq!(a.decision, Decision::Typed);
    }

    #[test]
    fn test_analyze_whitespace_keystrokes_count_as_gaps() {
        // 11 keystrokes, 10 gaps
        let a = run("  12345678\n", 100);
        assert_eq!(a.ms_per_char, 10.0);
        assert_eq!(a.char_count, 8);
    }

    #[test]
    fn test_analyze_single_char_is_not_fast() {
        let a = run("7", 0);
        assert_eq!(a.ms_per_char, 0.0);
        assert!(!a.is_fast);
    }

    #[test]
    fn test_analyze_zero_elapsed_is_not_fast() {
        let a = run("12345678", 0);
        assert!(!a.is_fast);
        assert_eq!(a.decision, Decision::Typed);
    }

    #[test]
    fn test_analyze_medium_confidence_ignores_pattern() {
        let a = run("ab cdef", 60);
        assert_eq!(a.char_count, 7);
        assert!(!a.alnum_no_spaces);
        assert!(!a.is_barcode_length);
        assert_eq!(a.decision, Decision::Scanned(Confidence::Medium));
    }

    #[test]
    fn test_analyze_fast_long_payload_with_separators_is_medium() {
        let a = run("(01)09501101530008(17)251231", 200);
        assert!(a.char_count > 20);
        assert_eq!(a.decision, Decision::Scanned(Confidence::Medium));
    }

    #[test]
    fn test_analyze_short_fast_burst_is_typed() {
        let a = run("a b!", 10);
        assert!(a.is_fast);
        assert_eq!(a.decision, Decision::Typed);
    }

    #[test]
    fn test_analyze_barcode_length_bounds_inclusive() {
        assert!(!run("1234567", 30).is_barcode_length);
        assert!(run("12345678", 30).is_barcode_length);
        assert!(run("12345678901234567890", 100).is_barcode_length);
        assert!(!run("123456789012345678901", 100).is_barcode_length);
    }

    #[test]
    fn test_analyze_respects_custom_threshold() {
        let tuning = ClassifierTuning {
            fast_threshold_ms: 20,
            ..ClassifierTuning::default()
        };
        let a = analyze("12345678", Duration::from_millis(200), &tuning, Trigger::Terminator);
        assert!(!a.is_fast);
        assert_eq!(a.decision, Decision::Typed);
        assert_eq!(a.trigger, Trigger::Terminator);
    }
}
