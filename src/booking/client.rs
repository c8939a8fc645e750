//! Protocol client for the undocumented booking backend
//!
//! The backend exposes a multi-step flow behind POST endpoints:
//! `getFreeDays` (day discovery), `getFreeTurns` (per-day slot discovery),
//! and the best-effort `suspend`/`unsuspend` pair (hold/release, used only
//! for diagnostic self-checks).
//!
//! Every call burst against one center uses a single freshly generated
//! terminal id. A non-success HTTP status or a body-level status flag other
//! than 1 means "no data", not an error; only transport failures and
//! unrecognized response shapes are surfaced, and those abort just the
//! current (doctor, center, service) unit.

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::time::Duration;
use tracing::{debug, warn};

use super::headers::build_booking_headers;
use super::terminal::{self, TerminalId};
use crate::config::BookingConfig;
use crate::models::{AppointmentSlot, Center, Service};
use crate::utils::error::BookingError;

/// Backend body-level status flag meaning "ok, data follows"
const STATUS_OK: i64 = 1;

/// Token returned by a successful hold, needed to release it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationToken(pub String);

impl ReservationToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Deserialize)]
struct WireTurn {
    from: i64,
    to: i64,
    #[serde(default)]
    workhour_turn_num: u32,
}

/// Stateless per-call wrapper around the booking protocol
pub struct BookingClient {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// Rate limiter to control request frequency
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,

    /// Booking API base URL
    base_url: String,

    /// Namespace prefix for generated terminal ids
    terminal_prefix: String,

    /// Referer sent with every call (the provider's public site)
    referer: String,
}

impl BookingClient {
    /// Create a new client from booking configuration
    ///
    /// # Errors
    ///
    /// Returns `BookingError::Transport` if the HTTP client cannot be built
    pub fn new(config: &BookingConfig, referer: &str) -> Result<Self, BookingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .gzip(true)
            .cookie_store(true)
            .build()?;

        let rate = NonZeroU32::new(config.rate_limit).unwrap_or(NonZeroU32::new(1).unwrap());
        let rate_limiter = RateLimiter::direct(Quota::per_second(rate));

        Ok(Self {
            client,
            rate_limiter,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            terminal_prefix: config.terminal_prefix.clone(),
            referer: referer.to_string(),
        })
    }

    /// Create a client against a custom base URL (mock servers in tests)
    pub fn with_base_url(base_url: &str) -> Result<Self, BookingError> {
        let config = BookingConfig {
            base_url: base_url.to_string(),
            terminal_prefix: "clinic-".to_string(),
            rate_limit: 100,
            request_timeout_secs: 5,
        };
        Self::new(&config, base_url)
    }

    /// Generate a fresh terminal id for one call burst against a center
    pub fn new_terminal(&self) -> TerminalId {
        terminal::generate(&self.terminal_prefix)
    }

    /// List calendar-day timestamps the backend reports as having openings.
    ///
    /// An empty list is a valid "no slots" result. The caller is expected to
    /// pass the result through [`filter_days`] before querying per-day slots.
    ///
    /// # Errors
    ///
    /// `InvalidIdentifiers` when center/service carry placeholder ids,
    /// `Transport`/`Timeout` on network failure, `Protocol` when the body
    /// shape is unrecognized.
    pub async fn list_open_days(
        &self,
        center: &Center,
        service: &Service,
        terminal: &TerminalId,
    ) -> Result<Vec<i64>, BookingError> {
        require_identifiers(center, service)?;

        let form = [
            ("center_id", center.center_id.clone()),
            ("user_center_id", center.user_center_id.clone()),
            ("service_id", service.service_id.clone()),
            ("terminal_id", terminal.as_str().to_string()),
        ];

        let Some(body) = self.post_form("getFreeDays", &form).await? else {
            return Ok(Vec::new());
        };

        if body_status(&body)? != STATUS_OK {
            debug!(center_id = %center.center_id, "Backend reports no open days");
            return Ok(Vec::new());
        }

        let days = body
            .get("calendar_days")
            .and_then(|v| v.as_array())
            .ok_or_else(|| BookingError::Protocol("calendar_days missing".to_string()))?;

        days.iter()
            .map(|d| {
                d.as_i64()
                    .ok_or_else(|| BookingError::Protocol("non-numeric calendar day".to_string()))
            })
            .collect()
    }

    /// List open slots for one calendar day.
    ///
    /// Called once per day surviving the look-ahead filter, in chronological
    /// order.
    pub async fn list_slots_for_day(
        &self,
        center: &Center,
        service: &Service,
        terminal: &TerminalId,
        day: i64,
    ) -> Result<Vec<AppointmentSlot>, BookingError> {
        require_identifiers(center, service)?;

        let form = [
            ("center_id", center.center_id.clone()),
            ("user_center_id", center.user_center_id.clone()),
            ("service_id", service.service_id.clone()),
            ("terminal_id", terminal.as_str().to_string()),
            ("from", day.to_string()),
        ];

        let Some(body) = self.post_form("getFreeTurns", &form).await? else {
            return Ok(Vec::new());
        };

        if body_status(&body)? != STATUS_OK {
            return Ok(Vec::new());
        }

        let turns: Vec<WireTurn> = body
            .get("result")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| BookingError::Protocol(format!("malformed turn list: {e}")))?
            .unwrap_or_default();

        Ok(turns
            .into_iter()
            .map(|t| AppointmentSlot {
                from_time: t.from,
                to_time: t.to,
                turn_number: t.workhour_turn_num,
            })
            .collect())
    }

    /// Place a best-effort hold on a slot.
    ///
    /// Diagnostic self-checks only; booking completion is out of scope and
    /// the hold is not guaranteed atomic.
    pub async fn hold_slot(
        &self,
        center: &Center,
        service: &Service,
        slot: &AppointmentSlot,
    ) -> Result<ReservationToken, BookingError> {
        require_identifiers(center, service)?;

        // A hold is its own burst against the center
        let terminal = self.new_terminal();

        let form = [
            ("center_id", center.center_id.clone()),
            ("user_center_id", center.user_center_id.clone()),
            ("service_id", service.service_id.clone()),
            ("terminal_id", terminal.as_str().to_string()),
            ("from", slot.from_time.to_string()),
            ("to", slot.to_time.to_string()),
        ];

        let Some(body) = self.post_form("suspend", &form).await? else {
            return Err(BookingError::HoldRejected(0));
        };

        if body_status(&body)? != STATUS_OK {
            return Err(BookingError::HoldRejected(200));
        }

        body.get("request_code")
            .and_then(|v| v.as_str())
            .map(|code| ReservationToken(code.to_string()))
            .ok_or_else(|| BookingError::Protocol("request_code missing".to_string()))
    }

    /// Release a previously held slot
    pub async fn release_hold(
        &self,
        center: &Center,
        token: &ReservationToken,
    ) -> Result<(), BookingError> {
        let form = [
            ("center_id", center.center_id.clone()),
            ("request_code", token.as_str().to_string()),
        ];

        let Some(body) = self.post_form("unsuspend", &form).await? else {
            return Err(BookingError::HoldRejected(0));
        };

        if body_status(&body)? != STATUS_OK {
            return Err(BookingError::HoldRejected(200));
        }

        Ok(())
    }

    /// POST a form to the backend and parse the JSON body.
    ///
    /// Returns `Ok(None)` on a non-success HTTP status ("no data"). Transport
    /// failures map to `Timeout`/`Transport`; an unparseable body on a
    /// success status is a `Protocol` error.
    async fn post_form(
        &self,
        endpoint: &str,
        form: &[(&str, String)],
    ) -> Result<Option<serde_json::Value>, BookingError> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/{}", self.base_url, endpoint);
        let headers = build_booking_headers(&self.referer);

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .form(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BookingError::Timeout
                } else {
                    BookingError::Transport(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(endpoint, status = status.as_u16(), "Backend returned non-success, treating as no data");
            return Ok(None);
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BookingError::Protocol(format!("invalid JSON body: {e}")))?;

        Ok(Some(body))
    }
}

fn body_status(body: &serde_json::Value) -> Result<i64, BookingError> {
    body.get("status")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| BookingError::Protocol("status flag missing".to_string()))
}

fn require_identifiers(center: &Center, service: &Service) -> Result<(), BookingError> {
    if !center.has_usable_ids() {
        return Err(BookingError::InvalidIdentifiers(format!(
            "center {} has placeholder or missing ids",
            center.name
        )));
    }
    if !service.is_pollable() {
        return Err(BookingError::InvalidIdentifiers(format!(
            "service {} has a placeholder or missing id",
            service.service_id
        )));
    }
    Ok(())
}

/// Filter day timestamps to `now <= day < now + days_ahead`, sorted
/// chronologically.
///
/// Applied before any per-day slot query to bound call volume.
pub fn filter_days(mut days: Vec<i64>, now: i64, days_ahead: u32) -> Vec<i64> {
    let horizon = now + i64::from(days_ahead) * 86_400;
    days.retain(|&d| d >= now && d < horizon);
    days.sort_unstable();
    days.dedup();
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PLACEHOLDER_PREFIX;

    fn center() -> Center {
        Center {
            center_id: "5532".to_string(),
            user_center_id: "88120".to_string(),
            name: "مطب".to_string(),
            address: String::new(),
            phone: String::new(),
            services: Vec::new(),
        }
    }

    fn service() -> Service {
        Service {
            service_id: "1604".to_string(),
            name: None,
        }
    }

    #[test]
    fn test_filter_days_window() {
        let now = 1_900_000_000;
        let days = vec![
            now - 86_400,      // yesterday, dropped
            now,               // today, kept
            now + 86_400,      // kept
            now + 6 * 86_400,  // kept (last day inside a 7-day window)
            now + 7 * 86_400,  // horizon, dropped
            now + 30 * 86_400, // far future, dropped
        ];

        let filtered = filter_days(days, now, 7);
        assert_eq!(filtered, vec![now, now + 86_400, now + 6 * 86_400]);
    }

    #[test]
    fn test_filter_days_sorts_chronologically() {
        let now = 1_900_000_000;
        let days = vec![now + 3 * 86_400, now, now + 86_400, now];

        let filtered = filter_days(days, now, 7);
        assert_eq!(filtered, vec![now, now + 86_400, now + 3 * 86_400]);
    }

    #[test]
    fn test_filter_days_empty() {
        assert!(filter_days(Vec::new(), 1_900_000_000, 7).is_empty());
    }

    #[test]
    fn test_require_identifiers_accepts_real_ids() {
        assert!(require_identifiers(&center(), &service()).is_ok());
    }

    #[test]
    fn test_require_identifiers_rejects_placeholders() {
        let mut bad_center = center();
        bad_center.center_id = format!("{PLACEHOLDER_PREFIX}deadbeef");
        assert!(matches!(
            require_identifiers(&bad_center, &service()),
            Err(BookingError::InvalidIdentifiers(_))
        ));

        let mut bad_service = service();
        bad_service.service_id = String::new();
        assert!(matches!(
            require_identifiers(&center(), &bad_service),
            Err(BookingError::InvalidIdentifiers(_))
        ));
    }

    #[test]
    fn test_body_status() {
        let ok = serde_json::json!({"status": 1, "calendar_days": []});
        assert_eq!(body_status(&ok).unwrap(), 1);

        let missing = serde_json::json!({"calendar_days": []});
        assert!(matches!(
            body_status(&missing),
            Err(BookingError::Protocol(_))
        ));
    }

    #[test]
    fn test_client_creation() {
        assert!(BookingClient::with_base_url("http://localhost:9").is_ok());
    }
}
