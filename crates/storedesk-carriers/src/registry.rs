//! Static carrier table and tracking-number based carrier prediction.

use storedesk_core::CarrierRef;

/// Carrier whose tracking returns synthetic data for `TEST`-prefixed numbers.
pub const SANDBOX_CARRIER_ID: &str = "HANJIN";

/// Prefix that marks a tracking number as synthetic.
pub const SANDBOX_PREFIX: &str = "TEST";

/// One shape rule a carrier's tracking numbers follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingPattern {
    /// Literal prefix, compared case-insensitively.
    Prefix(&'static str),
    /// All digits, with one of the listed lengths.
    Digits(&'static [usize]),
    /// Alphanumeric of the given length containing at least one letter.
    AlphanumericWithLetter(usize),
    /// UPU item identifier: two letters, nine digits, two letters.
    Upu,
}

impl TrackingPattern {
    /// Whether `cleaned` (already stripped of whitespace and `-`) fits this rule.
    #[must_use]
    pub fn matches(&self, cleaned: &str) -> bool {
        match *self {
            TrackingPattern::Prefix(prefix) => cleaned
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix)),
            TrackingPattern::Digits(lengths) => {
                cleaned.bytes().all(|b| b.is_ascii_digit()) && lengths.contains(&cleaned.len())
            }
            TrackingPattern::AlphanumericWithLetter(len) => {
                cleaned.len() == len
                    && cleaned.bytes().all(|b| b.is_ascii_alphanumeric())
                    && cleaned.bytes().any(|b| b.is_ascii_alphabetic())
            }
            TrackingPattern::Upu => {
                let bytes = cleaned.as_bytes();
                bytes.len() == 13
                    && bytes[..2].iter().all(u8::is_ascii_alphabetic)
                    && bytes[2..11].iter().all(u8::is_ascii_digit)
                    && bytes[11..].iter().all(u8::is_ascii_alphabetic)
            }
        }
    }

    /// Prefix rules outrank shape-only rules.
    #[must_use]
    pub fn specificity(&self) -> u8 {
        match self {
            TrackingPattern::Prefix(_) => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierInfo {
    /// Upper-case identifier, e.g. `CJ`.
    pub id: &'static str,
    /// Dotted slug, e.g. `kr.cjlogistics`.
    pub name: &'static str,
    pub display_name: &'static str,
    pub patterns: &'static [TrackingPattern],
}

impl CarrierInfo {
    #[must_use]
    pub fn carrier_ref(&self) -> CarrierRef {
        CarrierRef {
            id: self.id.to_string(),
            name: self.display_name.to_string(),
        }
    }
}

const fn carrier(
    id: &'static str,
    name: &'static str,
    display_name: &'static str,
    patterns: &'static [TrackingPattern],
) -> CarrierInfo {
    CarrierInfo {
        id,
        name,
        display_name,
        patterns,
    }
}

/// Registration order; prediction ties resolve in this order.
static CARRIERS: [CarrierInfo; 22] = [
    carrier(
        "HANJIN",
        "kr.hanjin",
        "한진택배",
        &[
            TrackingPattern::Prefix(SANDBOX_PREFIX),
            TrackingPattern::Digits(&[12, 14]),
        ],
    ),
    carrier(
        "CJ",
        "kr.cjlogistics",
        "CJ대한통운",
        &[TrackingPattern::Digits(&[10, 12])],
    ),
    carrier(
        "LOGEN",
        "kr.logen",
        "로젠택배",
        &[
            TrackingPattern::Digits(&[11]),
            TrackingPattern::AlphanumericWithLetter(12),
        ],
    ),
    carrier(
        "EPOST",
        "kr.epost",
        "우체국택배",
        &[TrackingPattern::Digits(&[13])],
    ),
    carrier(
        "LOTTE",
        "kr.lotte",
        "롯데택배",
        &[TrackingPattern::Digits(&[12])],
    ),
    carrier("COUPANG", "kr.coupangls", "쿠팡 로켓배송", &[]),
    carrier(
        "KDEXP",
        "kr.kdexp",
        "경동택배",
        &[TrackingPattern::Digits(&[11])],
    ),
    carrier("DAESIN", "kr.daesin", "대신택배", &[]),
    carrier("CVSNET", "kr.cvsnet", "CVS편의점택배", &[]),
    carrier("CHUNILPS", "kr.chunilps", "천일택배", &[]),
    carrier("KUNYOUNG", "kr.kunyoung", "건영택배", &[]),
    carrier("ILYANGLOGIS", "kr.ilyanglogis", "일양로지스", &[]),
    carrier("HONAMLOGIS", "kr.honamlogis", "호남물류", &[]),
    carrier("CWAY", "kr.cway", "합동택배", &[]),
    carrier("HOMEPICK", "kr.homepick", "홈픽", &[]),
    carrier("EPANTOS", "kr.epantos", "판토스", &[]),
    carrier("SLX", "kr.slx", "SLX", &[]),
    carrier("TODAYPICKUP", "kr.todaypickup", "오늘의픽업", &[]),
    carrier("YONGMALOGIS", "kr.yongmalogis", "용마로지스", &[]),
    carrier(
        "EPOST_EMS",
        "kr.epost.ems",
        "우체국 EMS",
        &[TrackingPattern::Upu],
    ),
    carrier(
        "LOTTE_GLOBAL",
        "kr.lotte.global",
        "롯데글로벌로지스",
        &[],
    ),
    carrier("GOODSTOLUCK", "kr.goodstoluck", "굿투럭", &[]),
];

/// Strip whitespace and `-` separators from user input.
#[must_use]
pub fn clean_tracking_number(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Whether the number requests synthetic sandbox tracking.
#[must_use]
pub fn is_sandbox_number(raw: &str) -> bool {
    TrackingPattern::Prefix(SANDBOX_PREFIX).matches(&clean_tracking_number(raw))
}

#[must_use]
pub fn all_carriers() -> &'static [CarrierInfo] {
    &CARRIERS
}

/// Case-insensitive lookup by identifier.
#[must_use]
pub fn carrier_by_id(id: &str) -> Option<&'static CarrierInfo> {
    let id = id.trim();
    CARRIERS.iter().find(|c| c.id.eq_ignore_ascii_case(id))
}

/// Lookup by dotted slug such as `kr.hanjin`.
#[must_use]
pub fn carrier_by_name(name: &str) -> Option<&'static CarrierInfo> {
    CARRIERS.iter().find(|c| c.name == name.trim())
}

/// Predict candidate carriers for a tracking number, best match first.
///
/// Each carrier scores the specificity of its best matching pattern; carriers
/// with no match are dropped. Ties keep registration order. Never fails: an
/// unrecognizable number yields an empty list.
#[must_use]
pub fn predict_carriers(tracking_number: &str) -> Vec<&'static CarrierInfo> {
    let cleaned = clean_tracking_number(tracking_number);
    if cleaned.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(u8, usize, &'static CarrierInfo)> = CARRIERS
        .iter()
        .enumerate()
        .filter_map(|(order, carrier)| {
            carrier
                .patterns
                .iter()
                .filter(|p| p.matches(&cleaned))
                .map(TrackingPattern::specificity)
                .max()
                .map(|score| (score, order, carrier))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    scored.into_iter().map(|(_, _, carrier)| carrier).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(carriers: &[&CarrierInfo]) -> Vec<&'static str> {
        carriers.iter().map(|c| c.id).collect()
    }

    #[test]
    fn registry_has_unique_ids_and_names() {
        let carriers = all_carriers();
        assert_eq!(carriers.len(), 22);
        let mut ids: Vec<_> = carriers.iter().map(|c| c.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 22);
        let mut names: Vec<_> = carriers.iter().map(|c| c.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 22);
    }

    #[test]
    fn lookup_by_id_is_case_insensitive() {
        assert_eq!(carrier_by_id("cj").map(|c| c.id), Some("CJ"));
        assert_eq!(carrier_by_id(" epost_ems ").map(|c| c.id), Some("EPOST_EMS"));
        assert!(carrier_by_id("FEDEX").is_none());
    }

    #[test]
    fn lookup_by_name_uses_slug() {
        assert_eq!(carrier_by_name("kr.lotte.global").map(|c| c.id), Some("LOTTE_GLOBAL"));
        assert!(carrier_by_name("LOTTE").is_none());
    }

    #[test]
    fn ten_digits_predicts_cj() {
        assert_eq!(ids(&predict_carriers("1234567890")), vec!["CJ"]);
    }

    #[test]
    fn twelve_digits_keeps_registration_order() {
        assert_eq!(
            ids(&predict_carriers("1234-5678-9012")),
            vec!["HANJIN", "CJ", "LOTTE"]
        );
    }

    #[test]
    fn thirteen_and_fourteen_digits() {
        assert_eq!(ids(&predict_carriers("1234567890123")), vec!["EPOST"]);
        assert_eq!(ids(&predict_carriers("12345678901234")), vec!["HANJIN"]);
    }

    #[test]
    fn eleven_digits_predicts_logen_then_kdexp() {
        assert_eq!(ids(&predict_carriers("123 4567 8901")), vec!["LOGEN", "KDEXP"]);
    }

    #[test]
    fn upu_identifier_predicts_ems() {
        assert_eq!(ids(&predict_carriers("EE123456789KR")), vec!["EPOST_EMS"]);
        assert_eq!(ids(&predict_carriers("ee123456789kr")), vec!["EPOST_EMS"]);
    }

    #[test]
    fn alphanumeric_twelve_predicts_logen_once() {
        assert_eq!(ids(&predict_carriers("AB1234567890")), vec!["LOGEN"]);
    }

    #[test]
    fn sandbox_prefix_wins_over_shape_rules() {
        let predicted = predict_carriers("TEST12345678");
        assert_eq!(predicted.first().map(|c| c.id), Some(SANDBOX_CARRIER_ID));
        assert_eq!(predicted.iter().filter(|c| c.id == SANDBOX_CARRIER_ID).count(), 1);
    }

    #[test]
    fn sandbox_prefix_is_case_insensitive() {
        assert_eq!(
            predict_carriers("testdel-1").first().map(|c| c.id),
            Some(SANDBOX_CARRIER_ID)
        );
        assert!(is_sandbox_number("test 123"));
        assert!(!is_sandbox_number("TES"));
    }

    #[test]
    fn no_match_is_empty() {
        assert!(predict_carriers("").is_empty());
        assert!(predict_carriers("   ").is_empty());
        assert!(predict_carriers("123").is_empty());
        assert!(predict_carriers("한글번호").is_empty());
    }

    #[test]
    fn every_declared_digit_length_is_predicted() {
        for carrier in all_carriers() {
            for pattern in carrier.patterns {
                if let TrackingPattern::Digits(lengths) = pattern {
                    for &len in *lengths {
                        let number = "7".repeat(len);
                        assert!(
                            predict_carriers(&number).iter().any(|c| c.id == carrier.id),
                            "{} should be predicted for {len} digits",
                            carrier.id
                        );
                    }
                }
            }
        }
    }
}
