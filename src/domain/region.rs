/// Region codes (`zcode`) accepted by the charger listing.
pub const REGIONS: &[(&str, &str)] = &[
    ("11", "서울"),
    ("26", "부산"),
    ("27", "대구"),
    ("28", "인천"),
    ("29", "광주"),
    ("30", "대전"),
    ("31", "울산"),
    ("36", "세종"),
    ("41", "경기"),
    ("42", "강원"),
    ("43", "충북"),
    ("44", "충남"),
    ("45", "전북"),
    ("46", "전남"),
    ("47", "경북"),
    ("48", "경남"),
    ("50", "제주"),
];

pub const DEFAULT_REGION_CODE: &str = "11";

pub fn region_name(code: &str) -> Option<&'static str> {
    let code = code.trim();
    REGIONS
        .iter()
        .find(|(candidate, _)| *candidate == code)
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_REGION_CODE, REGIONS, region_name};

    #[test]
    fn resolves_known_region_codes() {
        assert_eq!(region_name(DEFAULT_REGION_CODE), Some("서울"));
        assert_eq!(region_name(" 50 "), Some("제주"));
        assert_eq!(REGIONS.len(), 17);
    }

    #[test]
    fn unknown_region_has_no_name() {
        assert_eq!(region_name("99"), None);
    }
}
