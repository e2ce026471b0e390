/// 歐洲及鄰近國家 (EU + EEA + UK + CH + 巴爾幹 + 東歐 + 高加索)
pub const EUROPE_COUNTRIES: &[&str] = &[
    "AL", "AD", "AM", "AT", "AZ", "BA", "BE", "BG", "BY", "CH", "CY", "CZ", "DE", "DK", "EE", "ES",
    "FI", "FO", "FR", "GB", "GE", "GI", "GR", "HR", "HU", "IE", "IS", "IT", "KZ", "LI", "LT", "LU",
    "LV", "MC", "MD", "ME", "MK", "MT", "NL", "NO", "PL", "PT", "RO", "RS", "RU", "SE", "SI", "SK",
    "SM", "TR", "UA", "VA", "XK",
];

pub fn is_europe_country(code: Option<&str>) -> bool {
    match code {
        Some(code) if !code.is_empty() => {
            let upper = code.to_ascii_uppercase();
            EUROPE_COUNTRIES.contains(&upper.as_str())
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_europe_country() {
        assert!(is_europe_country(Some("ES")));
        assert!(is_europe_country(Some("gb")));
        assert!(!is_europe_country(Some("US")));
        assert!(!is_europe_country(Some("")));
        assert!(!is_europe_country(None));
    }
}
