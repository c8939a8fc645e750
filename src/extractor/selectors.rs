//! Selector and pattern cascades for profile pages
//!
//! The provider ships several page generations, so every field is resolved
//! through an ordered candidate list: the first selector (or pattern) that
//! matches wins. Identifier scans run over raw markup/script text and try
//! each key-name variant in order: snake_case and camelCase object keys,
//! kebab-case keys, data attributes, then form-field values.

use lazy_static::lazy_static;
use regex::Regex;
use scraper::Selector;

// Helper macro to parse selectors safely at startup
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

lazy_static! {
    /// The embedded structured-data block (Next.js payload)
    pub static ref NEXT_DATA: Selector = parse_selector!("script#__NEXT_DATA__");

    /// Doctor display name candidates
    pub static ref NAME: Vec<Selector> = vec![
        parse_selector!("[data-testid='doctor-name']"),
        parse_selector!("h1.doctor-name"),
        parse_selector!(".doctor-profile__name"),
        parse_selector!("h1[itemprop='name']"),
        parse_selector!(".profile-header h1"),
        parse_selector!("h1"),
    ];

    /// Specialty candidates
    pub static ref SPECIALTY: Vec<Selector> = vec![
        parse_selector!("[data-testid='doctor-expertise']"),
        parse_selector!(".doctor-profile__specialty"),
        parse_selector!("[itemprop='medicalSpecialty']"),
        parse_selector!(".profile-header .specialty"),
        parse_selector!("h2.expertise"),
    ];

    /// Center display-name candidates
    pub static ref CENTER_NAME: Vec<Selector> = vec![
        parse_selector!("[data-testid='center-name']"),
        parse_selector!(".center-info__name"),
        parse_selector!("[itemprop='workLocation']"),
        parse_selector!(".office-name"),
    ];

    /// Center address candidates
    pub static ref CENTER_ADDRESS: Vec<Selector> = vec![
        parse_selector!("[data-testid='center-address']"),
        parse_selector!(".center-info__address"),
        parse_selector!("[itemprop='address']"),
        parse_selector!(".address"),
    ];

    /// Center phone candidates
    pub static ref CENTER_PHONE: Vec<Selector> = vec![
        parse_selector!("[data-testid='center-phone']"),
        parse_selector!(".center-info__phone"),
        parse_selector!("a[href^='tel:']"),
        parse_selector!("[itemprop='telephone']"),
    ];

    /// Fallback name source: the OpenGraph title
    pub static ref OG_TITLE: Selector = parse_selector!("meta[property='og:title']");

    /// Identifier pattern cascades, one list per opaque identifier
    pub static ref DOCTOR_ID_PATTERNS: Vec<Regex> = key_patterns("doctor_id");
    pub static ref CENTER_ID_PATTERNS: Vec<Regex> = key_patterns("center_id");
    pub static ref USER_CENTER_ID_PATTERNS: Vec<Regex> = key_patterns("user_center_id");
    pub static ref SERVICE_ID_PATTERNS: Vec<Regex> = key_patterns("service_id");
}

/// Markers that must appear somewhere in a fetched page for it to count as a
/// provider profile at all
pub const PAGE_MARKERS: &[&str] = &["__NEXT_DATA__", "paziresh24", "doctor-profile"];

fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for c in key.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Build the ordered pattern cascade for one identifier key.
///
/// Order matters: snake_case object key, camelCase object key, kebab-case
/// key, data attribute, form-field value.
fn key_patterns(snake: &str) -> Vec<Regex> {
    let camel = snake_to_camel(snake);
    let kebab = snake.replace('_', "-");
    let value = r#"["']?([A-Za-z0-9_-]+)"#;

    [
        format!(r#"["']{snake}["']\s*:\s*{value}"#),
        format!(r#"["']{camel}["']\s*:\s*{value}"#),
        format!(r#"["']{kebab}["']\s*:\s*{value}"#),
        format!(r#"data-{kebab}=["']([A-Za-z0-9_-]+)"#),
        format!(r#"name=["']{snake}["'][^>]*value=["']([A-Za-z0-9_-]+)"#),
    ]
    .iter()
    .map(|p| Regex::new(p).expect("invalid identifier pattern"))
    .collect()
}

/// Run a pattern cascade over raw page text, first match wins
pub fn first_pattern_match(text: &str, patterns: &[Regex]) -> Option<String> {
    for pattern in patterns {
        if let Some(caps) = pattern.captures(text) {
            if let Some(m) = caps.get(1) {
                return Some(m.as_str().to_string());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cascades_are_nonempty() {
        assert!(!NAME.is_empty());
        assert!(!SPECIALTY.is_empty());
        assert!(!CENTER_NAME.is_empty());
        assert!(!CENTER_ADDRESS.is_empty());
        assert!(!CENTER_PHONE.is_empty());
        assert_eq!(DOCTOR_ID_PATTERNS.len(), 5);
        assert_eq!(CENTER_ID_PATTERNS.len(), 5);
    }

    #[test]
    fn test_snake_to_camel() {
        assert_eq!(snake_to_camel("center_id"), "centerId");
        assert_eq!(snake_to_camel("user_center_id"), "userCenterId");
    }

    #[test]
    fn test_snake_case_key_match() {
        let text = r#"{"center_id": "5532", "other": 1}"#;
        assert_eq!(
            first_pattern_match(text, &CENTER_ID_PATTERNS),
            Some("5532".to_string())
        );
    }

    #[test]
    fn test_camel_case_key_match() {
        // Only quoted keys count; bare object literals stay unmatched
        let quoted = r#"{"centerId":"5532"}"#;
        assert_eq!(
            first_pattern_match(quoted, &CENTER_ID_PATTERNS),
            Some("5532".to_string())
        );

        let bare = r#"var booking = {centerId: "5532"};"#;
        assert_eq!(first_pattern_match(bare, &CENTER_ID_PATTERNS), None);
    }

    #[test]
    fn test_data_attribute_match() {
        let html = r#"<div data-user-center-id="88120"></div>"#;
        assert_eq!(
            first_pattern_match(html, &USER_CENTER_ID_PATTERNS),
            Some("88120".to_string())
        );
    }

    #[test]
    fn test_form_field_match() {
        let html = r#"<input type="hidden" name="service_id" value="1604">"#;
        assert_eq!(
            first_pattern_match(html, &SERVICE_ID_PATTERNS),
            Some("1604".to_string())
        );
    }

    #[test]
    fn test_first_match_wins() {
        let text = r#"{"center_id": "1111"} <div data-center-id="2222"></div>"#;
        assert_eq!(
            first_pattern_match(text, &CENTER_ID_PATTERNS),
            Some("1111".to_string())
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(first_pattern_match("<html></html>", &SERVICE_ID_PATTERNS), None);
    }
}
