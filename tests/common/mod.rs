//! Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use nobat::models::{Center, Doctor, Service, User};
use nobat::notify::{MessagingChannel, SendOutcome};
use nobat::providers::MemorySubscriberStore;

/// Build a doctor with one center and one service
pub fn sample_doctor(id: i64, center_id: &str, service_id: &str) -> Doctor {
    Doctor {
        id,
        name: format!("دکتر {id}"),
        slug: format!("doctor-{id}"),
        specialty: "قلب و عروق".to_string(),
        active: true,
        last_checked_at: None,
        centers: vec![Center {
            center_id: center_id.to_string(),
            user_center_id: format!("uc-{center_id}"),
            name: "مطب".to_string(),
            address: String::new(),
            phone: String::new(),
            services: vec![Service {
                service_id: service_id.to_string(),
                name: Some("ویزیت".to_string()),
            }],
        }],
    }
}

/// Populate a subscriber store with (user_id, chat_id) pairs subscribed to
/// one doctor
pub async fn subscribe_users(store: &MemorySubscriberStore, doctor_id: i64, users: &[(i64, i64)]) {
    for &(user_id, chat_id) in users {
        store
            .add_user(
                User {
                    id: user_id,
                    display_name: format!("user-{user_id}"),
                    active: true,
                },
                chat_id,
            )
            .await;
        store.subscribe(user_id, doctor_id).await;
    }
}

/// Channel double returning scripted outcomes per chat id and recording
/// every delivery attempt
pub struct ScriptedChannel {
    outcomes: Mutex<HashMap<i64, SendOutcome>>,
    sent: Mutex<Vec<(i64, String)>>,
}

impl ScriptedChannel {
    pub fn delivering() -> Self {
        Self::new(HashMap::new())
    }

    pub fn new(outcomes: HashMap<i64, SendOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_chats(&self) -> Vec<i64> {
        self.sent.lock().unwrap().iter().map(|(c, _)| *c).collect()
    }
}

#[async_trait]
impl MessagingChannel for ScriptedChannel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn send(&self, chat_id: i64, text: &str) -> SendOutcome {
        self.sent.lock().unwrap().push((chat_id, text.to_string()));
        self.outcomes
            .lock()
            .unwrap()
            .get(&chat_id)
            .cloned()
            .unwrap_or(SendOutcome::Delivered)
    }
}

/// A structured profile page with an embedded Next.js block
pub fn structured_profile_html(
    doctor_id: i64,
    name: &str,
    center_id: &str,
    user_center_id: &str,
    service_id: &str,
) -> String {
    let payload = serde_json::json!({
        "props": {"pageProps": {
            "information": {"id": doctor_id, "display_name": name},
            "expertises": [{"alias": "قلب و عروق"}],
            "centers": [{
                "id": center_id,
                "user_center_id": user_center_id,
                "name": "مطب",
                "address": "تهران",
                "display_number": "021-1234",
                "services": [{"id": service_id, "alias": "ویزیت"}]
            }]
        }}
    });

    format!(
        r#"<!DOCTYPE html><html><head><title>{name}</title></head><body>
        <div id="__next"></div>
        <script id="__NEXT_DATA__" type="application/json">{payload}</script>
        </body></html>"#
    )
}

/// A legacy page without the structured block: fields and identifiers must
/// come from the heuristic cascades
pub fn heuristic_profile_html(name: &str, with_identifiers: bool) -> String {
    let ids = if with_identifiers {
        r#"<script>
            var booking = {"doctor_id": "7291", "center_id": "5532",
                           "user_center_id": "88120"};
        </script>
        <input type="hidden" name="service_id" value="1604">"#
    } else {
        ""
    };

    format!(
        r#"<!DOCTYPE html><html><head>
        <meta property="og:title" content="{name} | paziresh24">
        </head><body class="doctor-profile">
        <div class="profile-header"><h1>{name}</h1></div>
        <h2 class="expertise">قلب و عروق</h2>
        <div class="center-info__address">تهران، خیابان آزادی</div>
        {ids}
        </body></html>"#
    )
}

/// A page that carries the provider marker but no recognizable profile shape
pub fn unrecognized_profile_html() -> String {
    r#"<!DOCTYPE html><html><body>
    <p>paziresh24 maintenance page</p>
    </body></html>"#
        .to_string()
}
