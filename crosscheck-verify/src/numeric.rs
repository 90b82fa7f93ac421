//! Quantity extraction, normalization, and consistency checking.
//!
//! Financial/market claims routinely state a range ("$400–$800") while the
//! evidence states a different but overlapping one ("$400–$600"), so the
//! consistency check falls back to interval semantics when exact fuzzy
//! matching fails. Naive set-equality over-penalizes legitimate paraphrase.

use crate::types::NumericCheck;
use crosscheck_common::VerifyConfig;
use regex::Regex;
use std::sync::OnceLock;

/// One alternation, ordered so the most specific branch wins at each
/// position (rust-regex alternations prefer earlier branches):
/// currency+magnitude, percentage, bare magnitude, thousands-separated,
/// decimal, 4+ digit integer (which covers years).
fn number_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?x)
            \$\s?\d[\d,]*(?:\.\d+)?(?:\s?(?:trillion|billion|million|thousand)\b|[tbmk]\b)?
            | \d[\d,]*(?:\.\d+)?\s?%
            | \d[\d,]*(?:\.\d+)?\s?(?:trillion|billion|million|thousand)\b
            | \d{1,3}(?:,\d{3})+(?:\.\d+)?
            | \d+\.\d+
            | \d{4,}
            ",
        )
        .expect("number pattern")
    })
}

/// Pull quantities out of free text as de-duplicated lowercase raw matches.
/// Empty or number-free text yields an empty list; never fails.
pub fn extract_numbers(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let lowered = text.to_lowercase();
    let mut out: Vec<String> = Vec::new();
    for m in number_pattern().find_iter(&lowered) {
        let raw = m.as_str().trim().to_string();
        if !out.contains(&raw) {
            out.push(raw);
        }
    }
    out
}

const MAGNITUDES: [(&str, f64); 8] = [
    ("trillion", 1e12),
    ("billion", 1e9),
    ("million", 1e6),
    ("thousand", 1e3),
    ("t", 1e12),
    ("b", 1e9),
    ("m", 1e6),
    ("k", 1e3),
];

/// Normalize one raw quantity string to a comparable floating value.
///
/// Currency symbols and thousands separators are stripped; `%` values stay
/// unscaled (`"18.5%"` → `18.5`); magnitude suffixes multiply
/// (`"$96.8 billion"` → `9.68e10`). Empty, whitespace-only, symbol-only, or
/// non-numeric input yields `None`.
pub fn normalize_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim().to_lowercase();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(body) = trimmed.strip_suffix('%') {
        return parse_numeric(body);
    }

    let mut body = trimmed.as_str();
    let mut multiplier = 1.0f64;
    for (suffix, mult) in MAGNITUDES {
        if let Some(prefix) = body.strip_suffix(suffix) {
            body = prefix;
            multiplier = mult;
            break;
        }
    }

    parse_numeric(body).map(|v| v * multiplier)
}

fn parse_numeric(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .trim_start_matches(['$', '£', '€'])
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// A bare 4-digit token reading as a plausible year. Years are identifiers,
/// not magnitudes, so the consistency check skips them.
fn is_year(raw: &str) -> bool {
    let s = raw.trim();
    s.len() == 4
        && s.bytes().all(|b| b.is_ascii_digit())
        && (s.starts_with("19") || s.starts_with("20"))
}

fn fuzzy_match(claim_value: f64, evidence_value: f64, percentage: bool, cfg: &VerifyConfig) -> bool {
    if percentage {
        return (claim_value - evidence_value).abs() <= cfg.percent_tolerance;
    }
    if claim_value == evidence_value {
        return true;
    }
    let denom = claim_value.abs().max(evidence_value.abs());
    denom > 0.0 && (claim_value - evidence_value).abs() / denom <= cfg.ratio_tolerance
}

fn roughly_equal(a: f64, b: f64, tolerance: f64) -> bool {
    if a == b {
        return true;
    }
    let denom = a.abs().max(b.abs());
    denom > 0.0 && (a - b).abs() / denom <= tolerance
}

fn sorted_non_year_values(raws: &[String]) -> Vec<f64> {
    let mut values: Vec<f64> = raws
        .iter()
        .filter(|r| !is_year(r))
        .filter_map(|r| normalize_number(r))
        .filter(|v| v.is_finite())
        .collect();
    values.sort_by(f64::total_cmp);
    values
}

/// Compare the numbers found in a claim against those in its evidence.
///
/// Strict pass first: every non-year claim number must fuzzy-match some
/// evidence number. Failing that, interval semantics over the sorted
/// non-year values of each side: range overlap with a roughly-shared
/// endpoint, containment of a single claim value, or reverse containment of
/// a single evidence value.
pub fn check_numeric_consistency(
    claim_numbers: &[String],
    evidence_numbers: &[String],
    cfg: &VerifyConfig,
) -> NumericCheck {
    let verdict = |is_match: bool| NumericCheck {
        claim_numbers: claim_numbers.to_vec(),
        evidence_numbers: evidence_numbers.to_vec(),
        is_match,
    };

    // A claim with no numbers cannot be numerically contradicted.
    if claim_numbers.is_empty() {
        return verdict(true);
    }

    let evidence_values: Vec<f64> = evidence_numbers
        .iter()
        .filter_map(|r| normalize_number(r))
        .collect();

    let strict_ok = claim_numbers.iter().all(|raw| {
        if is_year(raw) {
            return true;
        }
        let Some(value) = normalize_number(raw) else {
            return true;
        };
        let percentage = raw.trim().ends_with('%');
        evidence_values
            .iter()
            .any(|&ev| fuzzy_match(value, ev, percentage, cfg))
    });
    if strict_ok {
        return verdict(true);
    }

    let claim_values = sorted_non_year_values(claim_numbers);
    let ev_values = sorted_non_year_values(evidence_numbers);

    if claim_values.len() >= 2 && ev_values.len() >= 2 {
        let (c_min, c_max) = (claim_values[0], *claim_values.last().expect("non-empty"));
        let (e_min, e_max) = (ev_values[0], *ev_values.last().expect("non-empty"));
        let overlap = c_min <= e_max && e_min <= c_max;
        let shared_endpoint = roughly_equal(c_min, e_min, cfg.range_endpoint_tolerance)
            || roughly_equal(c_max, e_max, cfg.range_endpoint_tolerance);
        return verdict(overlap && shared_endpoint);
    }

    if ev_values.len() >= 2 && claim_values.len() == 1 {
        let c = claim_values[0];
        return verdict(ev_values[0] <= c && c <= *ev_values.last().expect("non-empty"));
    }

    if claim_values.len() >= 2 && ev_values.len() == 1 {
        let e = ev_values[0];
        return verdict(claim_values[0] <= e && e <= *claim_values.last().expect("non-empty"));
    }

    verdict(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> VerifyConfig {
        VerifyConfig::default()
    }

    fn strs(raws: &[&str]) -> Vec<String> {
        raws.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn extracts_currency_percent_and_years() {
        let nums = extract_numbers("Revenue grew 18.5% to $96.8 billion in 2023.");
        assert_eq!(nums, vec!["18.5%", "$96.8 billion", "2023"]);
    }

    #[test]
    fn extracts_thousands_separated_and_decimals() {
        let nums = extract_numbers("Shipments hit 1,234,567 units at 3.75 per unit.");
        assert_eq!(nums, vec!["1,234,567", "3.75"]);
    }

    #[test]
    fn extraction_dedupes_and_handles_empty() {
        assert_eq!(
            extract_numbers("$400 versus $400 and $800"),
            vec!["$400", "$800"]
        );
        assert!(extract_numbers("").is_empty());
        assert!(extract_numbers("no digits here").is_empty());
    }

    #[test]
    fn normalizes_magnitudes() {
        assert_eq!(normalize_number("$96.8 billion"), Some(96.8e9));
        assert_eq!(normalize_number("3.2 million"), Some(3.2e6));
        assert_eq!(normalize_number("$1.5b"), Some(1.5e9));
        assert_eq!(normalize_number("40k"), Some(40_000.0));
        assert_eq!(normalize_number("2 trillion"), Some(2e12));
    }

    #[test]
    fn percentages_stay_unscaled() {
        assert_eq!(normalize_number("18.5%"), Some(18.5));
        assert_eq!(normalize_number("7%"), Some(7.0));
    }

    #[test]
    fn normalize_rejects_junk() {
        assert_eq!(normalize_number(""), None);
        assert_eq!(normalize_number("   "), None);
        assert_eq!(normalize_number("$"), None);
        assert_eq!(normalize_number("%"), None);
        assert_eq!(normalize_number("about"), None);
    }

    #[test]
    fn normalize_strips_separators() {
        assert_eq!(normalize_number("$5,000"), Some(5000.0));
        assert_eq!(normalize_number("1,234,567"), Some(1_234_567.0));
    }

    #[test]
    fn exact_values_match_and_distant_values_do_not() {
        assert!(check_numeric_consistency(&strs(&["100"]), &strs(&["100"]), &cfg()).is_match);
        assert!(!check_numeric_consistency(&strs(&["15"]), &strs(&["25"]), &cfg()).is_match);
    }

    #[test]
    fn overlapping_ranges_with_shared_minimum_match() {
        let check = check_numeric_consistency(&strs(&["400", "800"]), &strs(&["400", "600"]), &cfg());
        assert!(check.is_match);
    }

    #[test]
    fn disjoint_ranges_do_not_match() {
        let check = check_numeric_consistency(&strs(&["400", "800"]), &strs(&["900", "950"]), &cfg());
        assert!(!check.is_match);
    }

    #[test]
    fn single_claim_value_inside_evidence_range_matches() {
        let check = check_numeric_consistency(&strs(&["500"]), &strs(&["400", "600"]), &cfg());
        assert!(check.is_match);
    }

    #[test]
    fn single_evidence_value_inside_claim_range_matches() {
        let check = check_numeric_consistency(&strs(&["400", "600"]), &strs(&["500"]), &cfg());
        assert!(check.is_match);
    }

    #[test]
    fn years_are_skipped_in_strict_pass() {
        let check = check_numeric_consistency(&strs(&["2023", "18.5%"]), &strs(&["18.3%"]), &cfg());
        assert!(check.is_match);
    }

    #[test]
    fn percent_tolerance_is_absolute() {
        assert!(check_numeric_consistency(&strs(&["18.5%"]), &strs(&["18.9%"]), &cfg()).is_match);
        assert!(!check_numeric_consistency(&strs(&["18.5%"]), &strs(&["19.5%"]), &cfg()).is_match);
    }

    #[test]
    fn no_claim_numbers_is_vacuously_consistent() {
        assert!(check_numeric_consistency(&[], &strs(&["42.0"]), &cfg()).is_match);
    }

    #[test]
    fn magnitude_words_compare_against_suffix_forms() {
        let check =
            check_numeric_consistency(&strs(&["$96.8 billion"]), &strs(&["$96.8b"]), &cfg());
        assert!(check.is_match);
    }
}
