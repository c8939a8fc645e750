//! Structured-data extraction from the embedded Next.js payload
//!
//! Profile pages embed a single `__NEXT_DATA__` JSON block. When present and
//! internally consistent it is authoritative and no heuristic pass runs.

use scraper::Html;
use serde::Deserialize;
use tracing::debug;

use super::selectors;
use crate::models::{Center, Doctor, Service};

#[derive(Debug, Deserialize)]
struct NextData {
    props: Props,
}

#[derive(Debug, Deserialize)]
struct Props {
    #[serde(rename = "pageProps")]
    page_props: PageProps,
}

#[derive(Debug, Default, Deserialize)]
struct PageProps {
    #[serde(default)]
    information: Option<WireInformation>,
    #[serde(default)]
    expertises: Vec<WireExpertise>,
    #[serde(default)]
    centers: Vec<WireCenter>,
}

#[derive(Debug, Deserialize)]
struct WireInformation {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireExpertise {
    #[serde(default)]
    alias: Option<String>,
    #[serde(default)]
    expertise_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireCenter {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    user_center_id: Option<serde_json::Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    display_number: Option<String>,
    #[serde(default)]
    services: Vec<WireService>,
}

#[derive(Debug, Deserialize)]
struct WireService {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    alias: Option<String>,
}

/// The backend emits ids sometimes as numbers, sometimes as strings
fn opaque_id(value: &Option<serde_json::Value>) -> Option<String> {
    match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

fn numeric_id(value: &Option<serde_json::Value>) -> Option<i64> {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) => s.parse().ok(),
        _ => None,
    }
}

/// Parse the embedded structured-data block into a fully functional doctor.
///
/// Returns `None` when the block is absent or not internally consistent
/// (missing id or name, or no center with usable identifiers and at least
/// one service); the caller then falls back to the heuristic pass.
pub fn parse_structured(document: &Html, slug: &str) -> Option<Doctor> {
    let script = document.select(&selectors::NEXT_DATA).next()?;
    let raw = script.inner_html();

    let data: NextData = match serde_json::from_str(&raw) {
        Ok(data) => data,
        Err(e) => {
            debug!(error = %e, "structured block present but unparseable");
            return None;
        }
    };

    let page = data.props.page_props;
    let information = page.information?;

    let id = numeric_id(&information.id)?;
    let name = information.display_name.filter(|n| !n.trim().is_empty())?;

    let specialty = page
        .expertises
        .iter()
        .find_map(|e| {
            e.alias
                .as_deref()
                .or(e.expertise_name.as_deref())
                .filter(|s| !s.trim().is_empty())
        })
        .unwrap_or_default()
        .to_string();

    let centers: Vec<Center> = page
        .centers
        .into_iter()
        .filter_map(|wire| {
            let center_id = opaque_id(&wire.id)?;
            let user_center_id = opaque_id(&wire.user_center_id)?;
            let services: Vec<Service> = wire
                .services
                .into_iter()
                .filter_map(|s| {
                    Some(Service {
                        service_id: opaque_id(&s.id)?,
                        name: s.alias,
                    })
                })
                .collect();
            if services.is_empty() {
                return None;
            }
            Some(Center {
                center_id,
                user_center_id,
                name: wire.name.unwrap_or_default(),
                address: wire.address.unwrap_or_default(),
                phone: wire.display_number.unwrap_or_default(),
                services,
            })
        })
        .collect();

    if centers.is_empty() {
        debug!(slug, "structured block has no usable center, falling back");
        return None;
    }

    Some(Doctor {
        id,
        name: name.trim().to_string(),
        slug: slug.to_string(),
        specialty,
        active: true,
        last_checked_at: None,
        centers,
    })
}
