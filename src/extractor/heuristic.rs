//! Heuristic extraction from profile markup
//!
//! Independent of the structured path: field values come from ordered
//! selector cascades over the DOM, identifiers from ordered key-variant
//! patterns over the raw page text. First match wins per field; a field no
//! candidate matches stays unresolved.

use scraper::{Html, Selector};

use super::selectors;

/// Partially resolved profile fields
#[derive(Debug, Default, Clone)]
pub struct HeuristicProfile {
    pub name: Option<String>,
    pub specialty: Option<String>,
    pub center_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub identifiers: IdentifierSet,
}

/// The four opaque identifiers the protocol client needs
#[derive(Debug, Default, Clone)]
pub struct IdentifierSet {
    pub doctor_id: Option<String>,
    pub center_id: Option<String>,
    pub user_center_id: Option<String>,
    pub service_id: Option<String>,
}

impl IdentifierSet {
    /// All four identifiers resolved
    pub fn is_complete(&self) -> bool {
        self.doctor_id.is_some()
            && self.center_id.is_some()
            && self.user_center_id.is_some()
            && self.service_id.is_some()
    }

    /// None of the identifiers resolved
    pub fn is_empty(&self) -> bool {
        self.doctor_id.is_none()
            && self.center_id.is_none()
            && self.user_center_id.is_none()
            && self.service_id.is_none()
    }
}

/// Run both heuristic passes over one fetched page
pub fn scan(raw_html: &str) -> HeuristicProfile {
    let document = Html::parse_document(raw_html);

    HeuristicProfile {
        name: scan_name(&document),
        specialty: first_selector_text(&document, &selectors::SPECIALTY),
        center_name: first_selector_text(&document, &selectors::CENTER_NAME),
        address: first_selector_text(&document, &selectors::CENTER_ADDRESS),
        phone: first_selector_text(&document, &selectors::CENTER_PHONE),
        identifiers: scan_identifiers(raw_html),
    }
}

/// Identifier scan over raw markup/script text
pub fn scan_identifiers(raw_html: &str) -> IdentifierSet {
    IdentifierSet {
        doctor_id: selectors::first_pattern_match(raw_html, &selectors::DOCTOR_ID_PATTERNS),
        center_id: selectors::first_pattern_match(raw_html, &selectors::CENTER_ID_PATTERNS),
        user_center_id: selectors::first_pattern_match(
            raw_html,
            &selectors::USER_CENTER_ID_PATTERNS,
        ),
        service_id: selectors::first_pattern_match(raw_html, &selectors::SERVICE_ID_PATTERNS),
    }
}

fn scan_name(document: &Html) -> Option<String> {
    if let Some(name) = first_selector_text(document, &selectors::NAME) {
        return Some(name);
    }

    // Last resort: the OpenGraph title, stripped of the site suffix
    document
        .select(&selectors::OG_TITLE)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|content| content.split('|').next().unwrap_or(content))
        .map(clean_text)
        .filter(|s| !s.is_empty())
}

/// Apply a selector cascade, first non-empty text wins
fn first_selector_text(document: &Html, cascade: &[Selector]) -> Option<String> {
    for selector in cascade {
        if let Some(element) = document.select(selector).next() {
            let text = clean_text(&element.text().collect::<String>());
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Decode HTML entities and collapse whitespace
fn clean_text(raw: &str) -> String {
    let decoded = html_escape::decode_html_entities(raw);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
