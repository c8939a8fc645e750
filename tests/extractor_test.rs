//! Profile extraction pipeline tests

mod common;

use proptest::prelude::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use nobat::config::ProviderConfig;
use nobat::extractor::{normalize, validate, ExtractionSource, ProfileExtractor};
use nobat::models::is_placeholder_id;
use nobat::utils::error::{ExtractError, ExtractFailureReason};

fn extractor_for(server: &MockServer) -> ProfileExtractor {
    ProfileExtractor::new(&ProviderConfig {
        profile_base: server.uri(),
        max_retries: 0,
    })
    .unwrap()
}

async fn mount_profile(server: &MockServer, slug: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(format!("/dr/{slug}/")))
        .respond_with(ResponseTemplate::new(200).set_body_string(html))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_structured_extraction() {
    let server = MockServer::start().await;
    mount_profile(
        &server,
        "doctor-7291",
        common::structured_profile_html(7291, "دکتر آزمایشی", "5532", "88120", "1604"),
    )
    .await;

    let bundle = extractor_for(&server)
        .extract("doctor-7291")
        .await
        .unwrap();

    assert_eq!(bundle.source, ExtractionSource::Structured);
    assert!(bundle.is_functional());
    assert!(validate(&bundle));

    let doctor = &bundle.doctor;
    assert_eq!(doctor.id, 7291);
    assert_eq!(doctor.name, "دکتر آزمایشی");
    assert_eq!(doctor.slug, "doctor-7291");
    assert_eq!(doctor.centers[0].center_id, "5532");
    assert_eq!(doctor.centers[0].user_center_id, "88120");
    assert_eq!(doctor.centers[0].services[0].service_id, "1604");
    assert!(doctor.is_pollable());
}

#[tokio::test]
async fn test_heuristic_extraction_with_identifiers() {
    let server = MockServer::start().await;
    mount_profile(
        &server,
        "legacy-doc",
        common::heuristic_profile_html("دکتر قدیمی", true),
    )
    .await;

    let bundle = extractor_for(&server).extract("legacy-doc").await.unwrap();

    assert_eq!(bundle.source, ExtractionSource::Heuristic);
    assert!(bundle.is_functional());
    assert_eq!(bundle.doctor.id, 7291);
    assert_eq!(bundle.doctor.name, "دکتر قدیمی");
    assert_eq!(bundle.doctor.specialty, "قلب و عروق");
    assert_eq!(bundle.doctor.centers[0].center_id, "5532");
    assert!(bundle.doctor.is_pollable());
}

#[tokio::test]
async fn test_placeholder_fallback_is_flagged_non_functional() {
    // Scenario: heuristic finds name + specialty but no identifiers
    let server = MockServer::start().await;
    mount_profile(
        &server,
        "no-ids-doc",
        common::heuristic_profile_html("دکتر بی‌شناسه", false),
    )
    .await;

    let bundle = extractor_for(&server).extract("no-ids-doc").await.unwrap();

    assert_eq!(bundle.source, ExtractionSource::Placeholder);
    assert!(!bundle.is_functional());
    // Structurally valid, but the placeholder ids keep it out of polling
    assert!(validate(&bundle));
    assert!(!bundle.doctor.is_pollable());
    assert!(is_placeholder_id(&bundle.doctor.centers[0].center_id));
    assert!(is_placeholder_id(&bundle.doctor.centers[0].services[0].service_id));

    // Deterministic: a second extraction derives the same placeholders
    let again = extractor_for(&server).extract("no-ids-doc").await.unwrap();
    assert_eq!(
        again.doctor.centers[0].center_id,
        bundle.doctor.centers[0].center_id
    );
}

#[tokio::test]
async fn test_page_with_no_recognizable_shape_is_total_failure() {
    let server = MockServer::start().await;
    mount_profile(&server, "broken-doc", common::unrecognized_profile_html()).await;

    let err = extractor_for(&server)
        .extract("broken-doc")
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::UnrecognizedPage));
    assert_eq!(err.reason(), ExtractFailureReason::UnrecognizedPage);
}

#[tokio::test]
async fn test_missing_page_marker_is_terminal() {
    let server = MockServer::start().await;
    mount_profile(
        &server,
        "foreign-doc",
        "<html><body><h1>Completely different site</h1></body></html>".to_string(),
    )
    .await;

    let err = extractor_for(&server)
        .extract("foreign-doc")
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::UnrecognizedPage));
}

#[tokio::test]
async fn test_not_found_profile() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = extractor_for(&server).extract("gone-doc").await.unwrap_err();
    assert!(matches!(err, ExtractError::NotFound));
    assert_eq!(err.reason(), ExtractFailureReason::NotFound);
}

#[tokio::test]
async fn test_wrong_host_fails_before_any_fetch() {
    let server = MockServer::start().await;
    let err = extractor_for(&server)
        .extract("https://evil.example.com/dr/some-doc/")
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::WrongHost(_)));
    assert_eq!(err.reason(), ExtractFailureReason::InvalidInput);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[test]
fn test_normalize_decodes_persian_slug() {
    let canon = normalize("https://www.paziresh24.com/dr/%D8%AF%DA%A9%D8%AA%D8%B1-test-0/").unwrap();
    assert_eq!(canon.slug, "دکتر-test-0");
}

proptest! {
    /// normalize(normalize(u)) == normalize(u) across input shapes
    #[test]
    fn prop_normalize_idempotent(slug in "[a-z0-9]{1,12}(-[a-z0-9]{1,12}){0,3}") {
        prop_assume!(slug != "dr");

        let forms = [
            slug.clone(),
            format!("dr/{slug}"),
            format!("/dr/{slug}/"),
            format!("https://www.paziresh24.com/dr/{slug}/"),
        ];

        for form in &forms {
            let once = normalize(form).unwrap();
            let twice = normalize(&once.url).unwrap();
            prop_assert_eq!(&once, &twice);
            prop_assert_eq!(&once.slug, &slug);
        }
    }

    /// Percent-encoded and decoded forms of the same slug normalize equally
    #[test]
    fn prop_normalize_percent_encoding_transparent(slug in "[a-z]{1,8}-[0-9]{1,4}") {
        prop_assume!(slug != "dr");

        use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
        let encoded = utf8_percent_encode(&slug, NON_ALPHANUMERIC).to_string();

        let plain = normalize(&format!("/dr/{slug}/")).unwrap();
        let escaped = normalize(&format!("/dr/{encoded}/")).unwrap();
        prop_assert_eq!(plain, escaped);
    }
}
