use std::collections::BTreeMap;

use crate::models::CvssVersion;

/// Split a CVSS vector into metric → value pairs.
///
/// Accepts v3 (`CVSS:3.1/AV:N/AC:L/...`) and v2 (`AV:N/AC:L/Au:N/...`) forms.
/// Malformed components are skipped.
pub fn decompose(vector: &str) -> BTreeMap<String, String> {
    vector
        .trim()
        .split('/')
        .filter_map(|part| part.split_once(':'))
        .filter(|(metric, _)| !metric.eq_ignore_ascii_case("CVSS"))
        .filter(|(metric, value)| !metric.is_empty() && !value.is_empty())
        .map(|(metric, value)| (metric.trim().to_string(), value.trim().to_ascii_uppercase()))
        .collect()
}

/// Scoring version a vector string was written in. Unprefixed vectors are v2.
pub fn vector_version(vector: &str) -> Option<CvssVersion> {
    let vector = vector.trim();
    match vector.split('/').next()?.split_once(':') {
        Some((prefix, version)) if prefix.eq_ignore_ascii_case("CVSS") => CvssVersion::parse(version),
        _ if !decompose(vector).is_empty() => Some(CvssVersion::V2),
        _ => None,
    }
}

/// Registry long name for the attack vector → vector abbreviation.
pub fn attack_vector_abbrev(long: &str) -> Option<&'static str> {
    match long.trim().to_ascii_uppercase().as_str() {
        "NETWORK" => Some("N"),
        "ADJACENT_NETWORK" | "ADJACENT" => Some("A"),
        "LOCAL" => Some("L"),
        "PHYSICAL" => Some("P"),
        _ => None,
    }
}

pub fn attack_complexity_abbrev(long: &str) -> Option<&'static str> {
    match long.trim().to_ascii_uppercase().as_str() {
        "LOW" => Some("L"),
        "MEDIUM" => Some("M"),
        "HIGH" => Some("H"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_version() {
        assert_eq!(vector_version("CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H"), Some(CvssVersion::V31));
        assert_eq!(vector_version("CVSS:3.0/AV:L/AC:H"), Some(CvssVersion::V30));
        assert_eq!(vector_version("AV:N/AC:L/Au:N/C:P/I:P/A:P"), Some(CvssVersion::V2));
        assert_eq!(vector_version("CVSS:4.0/AV:N"), None);
        assert_eq!(vector_version("  "), None);
    }

    #[test]
    fn test_decompose_v31() {
        let m = decompose("CVSS:3.1/AV:N/AC:L/PR:N/UI:R/S:C/C:H/I:L/A:N");
        assert_eq!(m.len(), 8);
        assert_eq!(m["AV"], "N");
        assert_eq!(m["S"], "C");
        assert!(!m.contains_key("CVSS"));
    }

    #[test]
    fn test_decompose_v2() {
        let m = decompose("AV:N/AC:M/Au:N/C:P/I:P/A:C");
        assert_eq!(m["Au"], "N");
        assert_eq!(m["A"], "C");
    }

    #[test]
    fn test_decompose_skips_garbage() {
        let m = decompose("AV:/garbage/AC:L");
        assert_eq!(m.len(), 1);
        assert_eq!(m["AC"], "L");
        assert!(decompose("").is_empty());
    }

    #[test]
    fn test_long_names() {
        assert_eq!(attack_vector_abbrev("network"), Some("N"));
        assert_eq!(attack_vector_abbrev("ADJACENT_NETWORK"), Some("A"));
        assert_eq!(attack_complexity_abbrev("HIGH"), Some("H"));
        assert_eq!(attack_complexity_abbrev("trivial"), None);
    }
}
