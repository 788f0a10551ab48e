//! Script timing validation.
//!
//! Generated ad scripts carry `[MM:SS-MM:SS]` timing annotations. This module
//! extracts those ranges and checks that they form a single, gapless timeline
//! starting at zero and covering the requested duration within tolerance.
//! Validation never fails hard; every anomaly is returned as data so callers
//! can decide whether to regenerate, block, or just log.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Allowed deviation between a script's total duration and its target, in seconds.
pub const DEFAULT_TOLERANCE: u32 = 1;

static TIMESTAMP_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\d{2}):(\d{2})-(\d{2}):(\d{2})\]").unwrap());

/// One parsed `[MM:SS-MM:SS]` range, in order of appearance in the script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    /// The matched token, kept verbatim for error messages.
    pub raw: String,
    pub start: u32,
    pub end: u32,
}

impl Segment {
    /// Signed so that a pathological range like `[00:05-00:03]` reports a
    /// negative duration instead of wrapping.
    pub fn duration(&self) -> i64 {
        i64::from(self.end) - i64::from(self.start)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScriptValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub segments: Vec<Segment>,
    pub total_duration: Option<u32>,
}

/// Extract all timestamp ranges from free text, ordered by first character
/// position. Near-miss tokens (single-digit fields, missing dash) are silently
/// ignored, they are simply not matches.
pub fn parse_segments(text: &str) -> Vec<Segment> {
    TIMESTAMP_PATTERN
        .captures_iter(text)
        .map(|captures| {
            // Two-digit fields are guaranteed by the pattern
            let field = |index: usize| captures[index].parse::<u32>().unwrap_or(0);
            Segment {
                raw: captures[0].to_string(),
                start: field(1) * 60 + field(2),
                end: field(3) * 60 + field(4),
            }
        })
        .collect()
}

/// Quick non-strict check: does the text contain any timestamp range at all?
pub fn has_valid_format(script: &str) -> bool {
    TIMESTAMP_PATTERN.is_match(script)
}

/// Duration implied by the script's last timestamp range, if any.
pub fn extract_duration(script: &str) -> Option<u32> {
    parse_segments(script).last().map(|segment| segment.end)
}

/// Validate a generated script's timing annotations against a target duration.
pub fn validate_script(
    script: &str,
    expected_seconds: u32,
    tolerance: u32,
) -> ScriptValidationResult {
    let segments = parse_segments(script);

    if segments.is_empty() {
        return ScriptValidationResult {
            valid: false,
            errors: vec![
                "No valid timestamp patterns found. Expected format: [MM:SS-MM:SS]".to_string(),
            ],
            segments,
            total_duration: None,
        };
    }

    let mut errors = Vec::new();

    if segments[0].start != 0 {
        errors.push(format!(
            "First segment should start at 00:00, but starts at {}",
            format_seconds(segments[0].start)
        ));
    }

    for pair in segments.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        if curr.start > prev.end {
            errors.push(format!(
                "Gap between segments: {} and {}",
                prev.raw, curr.raw
            ));
        } else if curr.start < prev.end {
            errors.push(format!(
                "Overlap between segments: {} and {}",
                prev.raw, curr.raw
            ));
        }
    }

    for segment in &segments {
        if segment.duration() <= 0 {
            errors.push(format!(
                "Invalid segment duration: {} ({}s)",
                segment.raw,
                segment.duration()
            ));
        }
    }

    // Total duration is the end of the last segment in parse order, not the
    // maximum across segments.
    let total_duration = segments.last().map(|segment| segment.end);
    if let Some(total) = total_duration {
        if total.abs_diff(expected_seconds) > tolerance {
            errors.push(format!(
                "Total duration ({}s) doesn't match expected ({}s) within ±{}s tolerance",
                total, expected_seconds, tolerance
            ));
        }
    }

    ScriptValidationResult {
        valid: errors.is_empty(),
        errors,
        segments,
        total_duration,
    }
}

/// Multi-line summary of a validation result for logging.
pub fn format_validation_result(result: &ScriptValidationResult) -> String {
    let mut lines = Vec::new();

    if result.valid {
        lines.push("Script format is valid".to_string());
    } else {
        lines.push("Script format validation failed".to_string());
    }

    lines.push(format!("   Segments: {}", result.segments.len()));
    lines.push(format!(
        "   Total duration: {}",
        match result.total_duration {
            Some(total) => format!("{}s", total),
            None => "N/A".to_string(),
        }
    ));

    if !result.errors.is_empty() {
        lines.push("   Errors:".to_string());
        for error in &result.errors {
            lines.push(format!("     - {}", error));
        }
    }

    lines.join("\n")
}

fn format_seconds(total: u32) -> String {
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_segments_in_order_of_appearance() {
        let segments = parse_segments("[00:04-00:08] later first [00:00-00:04] earlier");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].start, 4);
        assert_eq!(segments[0].end, 8);
        assert_eq!(segments[1].start, 0);
        assert_eq!(segments[1].raw, "[00:00-00:04]");
    }

    #[test]
    fn test_parse_segments_converts_minutes() {
        let segments = parse_segments("[01:30-02:15] long take");
        assert_eq!(segments[0].start, 90);
        assert_eq!(segments[0].end, 135);
    }

    #[test]
    fn test_parse_segments_ignores_near_misses() {
        assert!(parse_segments("[0:00-00:02] single-digit minutes").is_empty());
        assert!(parse_segments("[00:00 00:02] missing dash").is_empty());
        assert!(parse_segments("00:00-00:02 no brackets").is_empty());
        assert!(parse_segments("").is_empty());
    }

    #[test]
    fn test_valid_two_segment_script() {
        let result = validate_script("[00:00-00:02] A [00:02-00:04] B", 4, 1);
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert_eq!(result.segments.len(), 2);
        assert_eq!(result.total_duration, Some(4));
    }

    #[test]
    fn test_single_segment_exact_coverage() {
        let result = validate_script("[00:00-00:08] one continuous shot", 8, 1);
        assert!(result.valid);
        assert_eq!(result.total_duration, Some(8));
    }

    #[test]
    fn test_empty_script_is_hard_failure() {
        let result = validate_script("", 8, 1);
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("No valid timestamp patterns found"));
        assert!(result.segments.is_empty());
        assert_eq!(result.total_duration, None);
    }

    #[test]
    fn test_text_without_brackets_is_hard_failure() {
        let result = validate_script("Open on the product from 0 to 2 seconds", 8, 1);
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.segments.is_empty());
    }

    #[test]
    fn test_nonzero_start_reports_actual_start() {
        let result = validate_script("[00:01-00:03] A", 2, 1);
        assert!(!result.valid);
        assert!(
            result
                .errors
                .iter()
                .any(|error| error.contains("00:01") && error.contains("start"))
        );
    }

    #[test]
    fn test_gap_cites_both_raw_tokens() {
        let result = validate_script("[00:00-00:02] A [00:03-00:05] B", 5, 1);
        assert!(!result.valid);
        let gap = result
            .errors
            .iter()
            .find(|error| error.starts_with("Gap"))
            .expect("expected a gap error");
        assert!(gap.contains("[00:00-00:02]"));
        assert!(gap.contains("[00:03-00:05]"));
    }

    #[test]
    fn test_one_second_overlap_is_distinct_from_gap() {
        let result = validate_script("[00:00-00:03] A [00:02-00:04] B", 4, 1);
        assert!(!result.valid);
        assert!(result.errors.iter().any(|error| error.starts_with("Overlap")));
        assert!(!result.errors.iter().any(|error| error.starts_with("Gap")));
    }

    #[test]
    fn test_reversed_range_flags_invalid_duration() {
        let result = validate_script("[00:00-00:02] A [00:05-00:03] B", 3, 1);
        assert!(!result.valid);
        assert!(
            result
                .errors
                .iter()
                .any(|error| error.contains("Invalid segment duration") && error.contains("-2s"))
        );
    }

    #[test]
    fn test_tolerance_boundary_passes() {
        // Ends at 9s against an 8s target with 1s tolerance
        let result = validate_script("[00:00-00:09] A", 8, 1);
        assert!(result.valid);
    }

    #[test]
    fn test_one_second_beyond_tolerance_fails() {
        let result = validate_script("[00:00-00:10] A", 8, 1);
        assert!(!result.valid);
        let error = &result.errors[0];
        assert!(error.contains("10s"));
        assert!(error.contains("8s"));
        assert!(error.contains("1s"));
    }

    #[test]
    fn test_total_duration_is_last_segment_not_max() {
        // The middle segment ends later than the final one; parse order wins.
        let result = validate_script("[00:00-00:12] A [00:02-00:04] B", 4, 1);
        assert_eq!(result.total_duration, Some(4));
    }

    #[test]
    fn test_failed_validation_still_returns_segments() {
        let result = validate_script("[00:01-00:03] A [00:05-00:07] B", 20, 1);
        assert!(!result.valid);
        assert_eq!(result.segments.len(), 2);
        assert_eq!(result.total_duration, Some(7));
    }

    #[test]
    fn test_validation_is_deterministic() {
        let script = "[00:00-00:02] A [00:03-00:05] B";
        let first = validate_script(script, 4, 1);
        let second = validate_script(script, 4, 1);
        assert_eq!(first.errors, second.errors);
        assert_eq!(first.segments, second.segments);
        assert_eq!(first.total_duration, second.total_duration);
    }

    #[test]
    fn test_has_valid_format() {
        assert!(has_valid_format("intro [00:00-00:04] outro"));
        assert!(!has_valid_format("no timestamps here"));
    }

    #[test]
    fn test_extract_duration() {
        assert_eq!(extract_duration("[00:00-00:04] A [00:04-00:08] B"), Some(8));
        assert_eq!(extract_duration("nothing"), None);
    }

    #[test]
    fn test_format_validation_result_lists_errors() {
        let result = validate_script("[00:01-00:03] A", 2, 1);
        let formatted = format_validation_result(&result);
        assert!(formatted.contains("Script format validation failed"));
        assert!(formatted.contains("Segments: 1"));
        assert!(formatted.contains("Total duration: 3s"));
        assert!(formatted.contains("     - "));
    }
}
