//! Profile-identifier extraction
//!
//! Turns a human-shared profile URL into the identifier bundle the booking
//! protocol client needs:
//!
//! ```text
//! INPUT_URL → NORMALIZE → FETCH_PAGE → PARSE_STRUCTURED → (success)
//!                                    │
//!                                    └→ PARSE_HEURISTIC → (success)
//!                                                       │
//!                                                       └→ PLACEHOLDER_FALLBACK
//!                                    → VALIDATE → SUCCESS | FAIL
//! ```
//!
//! The structured path (embedded `__NEXT_DATA__` block) is authoritative when
//! internally consistent. The heuristic path resolves display fields through
//! selector cascades and the four opaque identifiers through key-variant
//! pattern scans. When identifiers remain unresolved, deterministic
//! placeholders are derived from the slug and the bundle is flagged
//! non-functional: it will not satisfy the protocol client's identifier
//! precondition and must stay out of polling until corrected.

pub mod heuristic;
pub mod normalize;
pub mod selectors;
pub mod structured;

use reqwest::Client;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::booking::headers::build_profile_headers;
use crate::config::ProviderConfig;
use crate::models::{Center, Doctor, Service, PLACEHOLDER_PREFIX};
use crate::utils::error::ExtractError;
use crate::utils::retry::{with_retry_if, RetryConfig};

pub use normalize::{normalize, CanonicalProfile, CANONICAL_BASE, PROVIDER_DOMAIN};

/// Profile page fetch timeout
const PROFILE_TIMEOUT_SECS: u64 = 20;

/// Which pass produced a bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionSource {
    /// Embedded structured-data block, authoritative
    Structured,
    /// Selector/pattern cascades resolved everything
    Heuristic,
    /// Identifiers are hash-derived placeholders
    Placeholder,
}

/// The result of one extraction attempt
#[derive(Debug, Clone)]
pub struct ProfileBundle {
    pub doctor: Doctor,
    pub source: ExtractionSource,
    /// False when the identifiers are placeholders; non-functional bundles
    /// are excluded from polling
    pub functional: bool,
}

impl ProfileBundle {
    pub fn is_functional(&self) -> bool {
        self.functional
    }
}

/// Structural validation: a bundle needs a name, a slug, and at least one
/// center with at least one service. Specialty, address, and phone may be
/// empty or unknown.
pub fn validate(bundle: &ProfileBundle) -> bool {
    let doctor = &bundle.doctor;
    !doctor.name.trim().is_empty()
        && !doctor.slug.trim().is_empty()
        && doctor
            .centers
            .iter()
            .any(|center| !center.services.is_empty())
}

/// Derive deterministic placeholder identifiers from a slug hash.
///
/// The `ph-` prefix keeps them distinguishable from genuine identifiers at
/// every layer.
fn placeholder_ids(slug: &str) -> (i64, String, String, String) {
    let digest = Sha256::digest(slug.as_bytes());

    // Shift keeps the derived id in the non-negative i64 range
    let doctor_id = (u64::from_be_bytes(digest[..8].try_into().expect("8-byte slice")) >> 1) as i64;
    let chunk = |range: std::ops::Range<usize>| -> String {
        let bytes: [u8; 4] = digest[range].try_into().expect("4-byte slice");
        format!("{PLACEHOLDER_PREFIX}{:08x}", u32::from_be_bytes(bytes))
    };

    (doctor_id, chunk(8..12), chunk(12..16), chunk(16..20))
}

/// Profile extractor with a browser-like fetch path
pub struct ProfileExtractor {
    client: Client,
    profile_base: String,
    retry: RetryConfig,
}

impl ProfileExtractor {
    /// Create a new extractor
    ///
    /// # Errors
    ///
    /// Returns `ExtractError::Network` if the HTTP client cannot be built
    pub fn new(provider: &ProviderConfig) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(PROFILE_TIMEOUT_SECS))
            .gzip(true)
            .cookie_store(true)
            .build()
            .map_err(|e| ExtractError::Network(e.to_string()))?;

        Ok(Self {
            client,
            profile_base: provider.profile_base.trim_end_matches('/').to_string(),
            retry: RetryConfig::new(provider.max_retries),
        })
    }

    /// Run the full extraction pipeline for one shared profile reference.
    ///
    /// # Errors
    ///
    /// Normalization and fetch failures are terminal for this attempt and
    /// carry a structured reason ([`ExtractError::reason`]). A page in which
    /// neither name nor specialty can be found is a total extraction failure
    /// (`UnrecognizedPage`), not a partial success.
    pub async fn extract(&self, raw: &str) -> Result<ProfileBundle, ExtractError> {
        let canon = normalize(raw)?;
        let fetch_url = format!("{}/dr/{}/", self.profile_base, canon.slug);

        let raw_html = self.fetch_profile_page(&fetch_url).await?;
        let document = scraper::Html::parse_document(&raw_html);

        if let Some(doctor) = structured::parse_structured(&document, &canon.slug) {
            info!(slug = %canon.slug, doctor_id = doctor.id, "structured extraction succeeded");
            return Ok(ProfileBundle {
                doctor,
                source: ExtractionSource::Structured,
                functional: true,
            });
        }
        drop(document);

        debug!(slug = %canon.slug, "structured block unusable, running heuristic pass");
        let partial = heuristic::scan(&raw_html);

        if partial.name.is_none() && partial.specialty.is_none() {
            // Neither pass recognized the page shape at all
            return Err(ExtractError::UnrecognizedPage);
        }

        let bundle = self.assemble_heuristic(&canon, partial);
        if !validate(&bundle) {
            return Err(ExtractError::UnrecognizedPage);
        }

        Ok(bundle)
    }

    fn assemble_heuristic(
        &self,
        canon: &CanonicalProfile,
        partial: heuristic::HeuristicProfile,
    ) -> ProfileBundle {
        let ids = partial.identifiers;
        let parsed_doctor_id = ids.doctor_id.as_deref().and_then(|s| s.parse::<i64>().ok());

        let complete = parsed_doctor_id.is_some()
            && ids.center_id.is_some()
            && ids.user_center_id.is_some()
            && ids.service_id.is_some();

        let (ph_doctor, ph_center, ph_user_center, ph_service) = placeholder_ids(&canon.slug);

        let doctor_id = parsed_doctor_id.unwrap_or(ph_doctor);
        let center_id = ids.center_id.unwrap_or(ph_center);
        let user_center_id = ids.user_center_id.unwrap_or(ph_user_center);
        let service_id = ids.service_id.unwrap_or(ph_service);

        if !complete {
            warn!(
                slug = %canon.slug,
                "identifiers unresolved, returning non-functional placeholder bundle"
            );
        }

        let doctor = Doctor {
            id: doctor_id,
            name: partial.name.unwrap_or_default(),
            slug: canon.slug.clone(),
            specialty: partial.specialty.unwrap_or_default(),
            active: complete,
            last_checked_at: None,
            centers: vec![Center {
                center_id,
                user_center_id,
                name: partial.center_name.unwrap_or_default(),
                address: partial.address.unwrap_or_default(),
                phone: partial.phone.unwrap_or_default(),
                services: vec![Service {
                    service_id,
                    name: None,
                }],
            }],
        };

        ProfileBundle {
            doctor,
            source: if complete {
                ExtractionSource::Heuristic
            } else {
                ExtractionSource::Placeholder
            },
            functional: complete,
        }
    }

    /// Fetch the profile page with a browser-like signature.
    ///
    /// Extraction runs outside the polling loop, so network failures get a
    /// small retry budget here; not-found and unrecognized pages do not.
    async fn fetch_profile_page(&self, url: &str) -> Result<String, ExtractError> {
        with_retry_if(
            &self.retry,
            || self.fetch_once(url),
            ExtractError::is_recoverable,
        )
        .await
    }

    async fn fetch_once(&self, url: &str) -> Result<String, ExtractError> {
        let headers = build_profile_headers(&self.profile_base);

        let response = self
            .client
            .get(url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| ExtractError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ExtractError::NotFound);
        }
        if !status.is_success() {
            return Err(ExtractError::Network(format!("status {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ExtractError::Network(e.to_string()))?;

        if !selectors::PAGE_MARKERS.iter().any(|m| body.contains(m)) {
            return Err(ExtractError::UnrecognizedPage);
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::is_placeholder_id;

    fn canon(slug: &str) -> CanonicalProfile {
        CanonicalProfile {
            url: format!("{CANONICAL_BASE}/dr/{slug}/"),
            slug: slug.to_string(),
        }
    }

    fn extractor() -> ProfileExtractor {
        ProfileExtractor::new(&ProviderConfig {
            profile_base: "http://localhost:9".to_string(),
            max_retries: 0,
        })
        .unwrap()
    }

    #[test]
    fn test_placeholder_ids_are_deterministic_and_tagged() {
        let (doc_a, center_a, user_a, service_a) = placeholder_ids("دکتر-test-0");
        let (doc_b, center_b, user_b, service_b) = placeholder_ids("دکتر-test-0");

        assert_eq!(doc_a, doc_b);
        assert_eq!(center_a, center_b);
        assert_eq!(user_a, user_b);
        assert_eq!(service_a, service_b);

        assert!(doc_a >= 0);
        assert!(is_placeholder_id(&center_a));
        assert!(is_placeholder_id(&user_a));
        assert!(is_placeholder_id(&service_a));
    }

    #[test]
    fn test_placeholder_ids_differ_per_slug() {
        let (_, center_a, ..) = placeholder_ids("slug-a");
        let (_, center_b, ..) = placeholder_ids("slug-b");
        assert_ne!(center_a, center_b);
    }

    #[test]
    fn test_assemble_complete_heuristic_is_functional() {
        let partial = heuristic::HeuristicProfile {
            name: Some("دکتر آزمایشی".to_string()),
            specialty: Some("قلب".to_string()),
            identifiers: heuristic::IdentifierSet {
                doctor_id: Some("7291".to_string()),
                center_id: Some("5532".to_string()),
                user_center_id: Some("88120".to_string()),
                service_id: Some("1604".to_string()),
            },
            ..Default::default()
        };

        let bundle = extractor().assemble_heuristic(&canon("دکتر-test-0"), partial);

        assert!(bundle.is_functional());
        assert_eq!(bundle.source, ExtractionSource::Heuristic);
        assert_eq!(bundle.doctor.id, 7291);
        assert!(bundle.doctor.is_pollable());
        assert!(validate(&bundle));
    }

    #[test]
    fn test_assemble_without_identifiers_is_placeholder_bundle() {
        let partial = heuristic::HeuristicProfile {
            name: Some("دکتر آزمایشی".to_string()),
            specialty: Some("قلب".to_string()),
            ..Default::default()
        };

        let bundle = extractor().assemble_heuristic(&canon("دکتر-test-0"), partial);

        assert!(!bundle.is_functional());
        assert_eq!(bundle.source, ExtractionSource::Placeholder);
        // Structurally valid, but excluded from polling
        assert!(validate(&bundle));
        assert!(!bundle.doctor.is_pollable());
        assert!(is_placeholder_id(&bundle.doctor.centers[0].center_id));
    }

    #[test]
    fn test_partial_identifiers_still_non_functional() {
        let partial = heuristic::HeuristicProfile {
            name: Some("دکتر آزمایشی".to_string()),
            identifiers: heuristic::IdentifierSet {
                center_id: Some("5532".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let bundle = extractor().assemble_heuristic(&canon("x"), partial);

        assert!(!bundle.is_functional());
        assert_eq!(bundle.doctor.centers[0].center_id, "5532");
        assert!(is_placeholder_id(&bundle.doctor.centers[0].user_center_id));
    }

    #[test]
    fn test_validate_requires_name_and_center() {
        let partial = heuristic::HeuristicProfile {
            name: Some("دکتر".to_string()),
            ..Default::default()
        };
        let mut bundle = extractor().assemble_heuristic(&canon("x"), partial);
        assert!(validate(&bundle));

        bundle.doctor.name.clear();
        assert!(!validate(&bundle));

        bundle.doctor.name = "دکتر".to_string();
        bundle.doctor.centers.clear();
        assert!(!validate(&bundle));
    }
}
