//! Profile URL normalization
//!
//! Accepts the forms users actually paste into the chat surface: a full
//! profile URL, a path fragment, or a bare slug, with or without
//! percent-encoding. Everything collapses to one canonical form so the rest
//! of the extraction pipeline only ever sees decoded slugs.
//!
//! Normalization is idempotent: `normalize(normalize(x)) == normalize(x)`.

use percent_encoding::percent_decode_str;
use url::Url;

use crate::utils::error::ExtractError;

/// Hosts accepted as the booking provider's own
pub const PROVIDER_DOMAIN: &str = "paziresh24.com";

/// Base used when rebuilding the canonical profile URL
pub const CANONICAL_BASE: &str = "https://www.paziresh24.com";

/// A normalized profile reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalProfile {
    /// Canonical profile URL (`https://www.paziresh24.com/dr/{slug}/`)
    pub url: String,
    /// Percent-decoded slug
    pub slug: String,
}

/// Normalize a raw profile reference into its canonical form.
///
/// # Errors
///
/// `ExtractError::WrongHost` when the input carries a host outside the
/// provider domain, `ExtractError::InvalidUrl` for unparseable input or an
/// empty slug.
pub fn normalize(raw: &str) -> Result<CanonicalProfile, ExtractError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ExtractError::InvalidUrl("empty input".to_string()));
    }

    let path = if trimmed.contains("://") {
        let url = Url::parse(trimmed)
            .map_err(|e| ExtractError::InvalidUrl(format!("{trimmed}: {e}")))?;
        let host = url
            .host_str()
            .ok_or_else(|| ExtractError::InvalidUrl(format!("{trimmed}: no host")))?;
        if !host_allowed(host) {
            return Err(ExtractError::WrongHost(host.to_string()));
        }
        url.path().to_string()
    } else {
        let mut rest = trimmed.to_string();
        // Schemeless input may still lead with a host
        if let Some((first, tail)) = trimmed.trim_start_matches('/').split_once('/') {
            if looks_like_host(first) {
                if !host_allowed(first) {
                    return Err(ExtractError::WrongHost(first.to_string()));
                }
                rest = tail.to_string();
            }
        }
        rest
    };

    let slug = extract_slug(&path)?;

    Ok(CanonicalProfile {
        url: format!("{CANONICAL_BASE}/dr/{slug}/"),
        slug,
    })
}

fn host_allowed(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == PROVIDER_DOMAIN || host.ends_with(&format!(".{PROVIDER_DOMAIN}"))
}

/// A path's first segment is treated as a host only when it is
/// unambiguously domain-shaped (ASCII labels with at least one dot).
fn looks_like_host(segment: &str) -> bool {
    segment.contains('.')
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

/// Pick the slug out of a path, percent-decoding each segment.
fn extract_slug(path: &str) -> Result<String, ExtractError> {
    for segment in path.split('/') {
        if segment.is_empty() {
            continue;
        }
        let decoded = percent_decode_str(segment)
            .decode_utf8()
            .map_err(|_| ExtractError::InvalidUrl(format!("bad percent-encoding: {segment}")))?
            .into_owned();
        if decoded == "dr" {
            continue;
        }
        if decoded.is_empty() {
            continue;
        }
        return Ok(decoded);
    }

    Err(ExtractError::InvalidUrl(format!("no slug in path: {path}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_url() {
        let canon = normalize("https://www.paziresh24.com/dr/dr-smith-2/").unwrap();
        assert_eq!(canon.slug, "dr-smith-2");
        assert_eq!(canon.url, "https://www.paziresh24.com/dr/dr-smith-2/");
    }

    #[test]
    fn test_percent_encoded_persian_slug() {
        let canon = normalize(
            "https://www.paziresh24.com/dr/%D8%AF%DA%A9%D8%AA%D8%B1-test-0/",
        )
        .unwrap();
        assert_eq!(canon.slug, "دکتر-test-0");
        assert_eq!(canon.url, "https://www.paziresh24.com/dr/دکتر-test-0/");
    }

    #[test]
    fn test_path_fragment() {
        let canon = normalize("/dr/dr-smith-2").unwrap();
        assert_eq!(canon.slug, "dr-smith-2");

        let canon = normalize("dr/dr-smith-2/").unwrap();
        assert_eq!(canon.slug, "dr-smith-2");
    }

    #[test]
    fn test_bare_slug() {
        let canon = normalize("دکتر-test-0").unwrap();
        assert_eq!(canon.slug, "دکتر-test-0");
        assert_eq!(canon.url, "https://www.paziresh24.com/dr/دکتر-test-0/");
    }

    #[test]
    fn test_schemeless_host() {
        let canon = normalize("www.paziresh24.com/dr/dr-smith-2/").unwrap();
        assert_eq!(canon.slug, "dr-smith-2");
    }

    #[test]
    fn test_foreign_host_rejected() {
        assert!(matches!(
            normalize("https://evil.example.com/dr/dr-smith-2/"),
            Err(ExtractError::WrongHost(_))
        ));
        assert!(matches!(
            normalize("evil.example.com/dr/dr-smith-2/"),
            Err(ExtractError::WrongHost(_))
        ));
    }

    #[test]
    fn test_subdomain_allowed() {
        let canon = normalize("https://m.paziresh24.com/dr/dr-smith-2/").unwrap();
        assert_eq!(canon.slug, "dr-smith-2");
    }

    #[test]
    fn test_empty_and_hostless_inputs_rejected() {
        assert!(normalize("").is_err());
        assert!(normalize("   ").is_err());
        assert!(normalize("/dr//").is_err());
    }

    #[test]
    fn test_idempotence() {
        let inputs = [
            "https://www.paziresh24.com/dr/%D8%AF%DA%A9%D8%AA%D8%B1-test-0/",
            "dr/dr-smith-2",
            "دکتر-test-0",
        ];
        for input in inputs {
            let once = normalize(input).unwrap();
            let twice = normalize(&once.url).unwrap();
            assert_eq!(once, twice, "normalize must be idempotent for {input}");
        }
    }
}
