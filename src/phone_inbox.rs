use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use log::{info, warn};
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::contacts::Contact;
use crate::error::ProspectError;

const PIPEDREAM_BASE_URL: &str = "https://api.pipedream.com/v1";

/// Polls the webhook collector that receives the provider's asynchronous
/// phone-lookup results. There is no push channel: the run sleeps a fixed
/// interval, then reads the event list exactly once.
pub struct PhoneInbox {
    client: Client,
    base_url: String,
    api_key: String,
    source_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct EventsEnvelope {
    #[serde(default)]
    data: Vec<InboxEvent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboxEvent {
    pub e: Option<EventPayload>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPayload {
    pub body: Option<WebhookBody>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookBody {
    pub status: Option<String>,
    #[serde(default)]
    pub people: Vec<PhoneResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhoneResult {
    pub status: Option<String>,
    pub id: Option<String>,
    #[serde(default)]
    pub phone_numbers: Vec<PhoneNumber>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhoneNumber {
    pub raw_number: Option<String>,
}

impl PhoneInbox {
    pub fn new(api_key: String, source_id: String) -> Self {
        PhoneInbox {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build inbox client"),
            base_url: PIPEDREAM_BASE_URL.to_string(),
            api_key,
            source_id,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    /// Blocks for the configured interval, then polls once. Anything but
    /// HTTP 200 aborts the run.
    pub fn wait_and_collect(&self, wait: Duration) -> Result<HashMap<String, String>, ProspectError> {
        info!(
            "Waiting {} seconds to retrieve phone numbers...",
            wait.as_secs()
        );
        thread::sleep(wait);

        let events = self.poll_events()?;
        Ok(index_phone_numbers(&events))
    }

    pub fn poll_events(&self) -> Result<Vec<InboxEvent>, ProspectError> {
        let url = format!("{}/sources/{}/events", self.base_url, self.source_id);
        let response = self.client.get(&url).bearer_auth(&self.api_key).send()?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ProspectError::InboxStatus {
                status: status.as_u16(),
            });
        }

        let envelope: EventsEnvelope = response.json()?;
        Ok(envelope.data)
    }
}

/// Builds the person ID → phone map. Every raw number a person received is
/// comma-joined into one string. Events without a successful body are
/// logged and skipped, never fatal.
pub fn index_phone_numbers(events: &[InboxEvent]) -> HashMap<String, String> {
    let mut id_to_phone = HashMap::new();
    for event in events {
        let body = match event.e.as_ref().and_then(|payload| payload.body.as_ref()) {
            Some(body) => body,
            None => {
                warn!("Webhook's body is empty");
                continue;
            }
        };
        if body.status.as_deref() != Some("success") {
            warn!(
                "Webhook's status was {}; not 'success'",
                body.status.as_deref().unwrap_or("missing")
            );
            continue;
        }
        for person in &body.people {
            if person.status.as_deref() != Some("success") {
                continue;
            }
            let raw_numbers: Vec<&str> = person
                .phone_numbers
                .iter()
                .filter_map(|number| number.raw_number.as_deref())
                .collect();
            let joined = raw_numbers.join(", ");
            if let Some(id) = person.id.as_ref() {
                if !joined.is_empty() {
                    id_to_phone.insert(id.clone(), joined);
                }
            }
        }
    }
    id_to_phone
}

/// Routes each retrieved number onto its contact: numbers carrying an
/// extension marker belong to the organization switchboard, the rest are
/// treated as personal WhatsApp numbers.
pub fn apply_phone_numbers(contacts: &mut [Contact], id_to_phone: &HashMap<String, String>) {
    for contact in contacts.iter_mut() {
        let phone = match id_to_phone.get(&contact.person_id) {
            Some(phone) => phone,
            None => continue,
        };
        if phone.contains("ext") {
            if contact.organization_phone.is_empty() {
                contact.organization_phone = phone.clone();
            } else {
                contact.organization_phone = format!("{}, {}", contact.organization_phone, phone);
            }
        } else {
            contact.whatsapp = phone.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn events_from(json: serde_json::Value) -> Vec<InboxEvent> {
        let envelope: EventsEnvelope = serde_json::from_value(json).unwrap();
        envelope.data
    }

    #[test]
    fn joins_all_raw_numbers_per_person() {
        let events = events_from(serde_json::json!({
            "data": [{
                "e": { "body": { "status": "success", "people": [{
                    "status": "success",
                    "id": "p_1",
                    "phone_numbers": [
                        { "raw_number": "555-1234" },
                        { "raw_number": "555-5678" }
                    ]
                }]}}
            }]
        }));

        let phones = index_phone_numbers(&events);
        assert_eq!(
            phones.get("p_1").map(String::as_str),
            Some("555-1234, 555-5678")
        );
    }

    #[test]
    fn unsuccessful_bodies_and_people_are_skipped() {
        let events = events_from(serde_json::json!({
            "data": [
                { "e": { "body": { "status": "error", "people": [{
                    "status": "success", "id": "p_1",
                    "phone_numbers": [{ "raw_number": "555-1111" }]
                }]}}},
                { "e": { "body": { "status": "success", "people": [{
                    "status": "error", "id": "p_2",
                    "phone_numbers": [{ "raw_number": "555-2222" }]
                }]}}},
                { "e": {} }
            ]
        }));

        assert!(index_phone_numbers(&events).is_empty());
    }

    #[test]
    fn extension_numbers_route_to_organization_phone() {
        let mut contacts = vec![
            Contact {
                person_id: "p_1".into(),
                organization_phone: "+52 55 0000".into(),
                ..Contact::default()
            },
            Contact {
                person_id: "p_2".into(),
                ..Contact::default()
            },
        ];
        let mut phones = HashMap::new();
        phones.insert("p_1".to_string(), "555-1234 ext 22".to_string());
        phones.insert("p_2".to_string(), "555-9999".to_string());

        apply_phone_numbers(&mut contacts, &phones);

        assert_eq!(contacts[0].organization_phone, "+52 55 0000, 555-1234 ext 22");
        assert_eq!(contacts[0].whatsapp, "");
        assert_eq!(contacts[1].whatsapp, "555-9999");
        assert_eq!(contacts[1].organization_phone, "");
    }

    fn serve_once(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{}", addr)
    }

    #[test]
    fn poll_rejects_non_200() {
        let base = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                .to_string(),
        );
        let inbox = PhoneInbox::new("token".into(), "src_1".into()).with_base_url(&base);

        match inbox.poll_events() {
            Err(ProspectError::InboxStatus { status }) => assert_eq!(status, 500),
            other => panic!("expected inbox status error, got {:?}", other),
        }
    }

    #[test]
    fn poll_parses_event_envelope() {
        let body = r#"{"data":[{"e":{"body":{"status":"success","people":[]}}}]}"#;
        let base = serve_once(format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        ));
        let inbox = PhoneInbox::new("token".into(), "src_1".into()).with_base_url(&base);

        let events = inbox.poll_events().unwrap();
        assert_eq!(events.len(), 1);
    }
}
