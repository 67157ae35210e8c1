use std::time::Duration;

use log::{error, info};
use reqwest::blocking::Client;

use crate::config::Settings;
use crate::contacts::Contact;

const UPNIFY_CONTACTS_URL: &str = "https://api.upnify.com/v1/contacts";

/// Pushes the freshly exported contacts to the Upnify CRM, one request per
/// contact. Missing credentials or an empty list skip the step; individual
/// request failures are logged and the rest of the batch continues.
pub fn upload_contacts(settings: &Settings, contacts: &[Contact]) {
    let (api_key, api_token) = match (&settings.upnify_api_key, &settings.upnify_api_token) {
        (Some(key), Some(token)) if !contacts.is_empty() => (key, token),
        _ => {
            info!("Upnify upload skipped (no credentials or no contacts).");
            return;
        }
    };

    info!("Uploading to Upnify CRM...");
    let client = Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .expect("Failed to build Upnify client");

    for contact in contacts {
        let payload = serde_json::json!({
            "name": format!("{} {}", contact.first_name, contact.last_name),
            "email": contact.email,
            "phone": contact.whatsapp,
            "company": contact.organization_name,
            "title": contact.title,
            "location": contact.location,
        });

        let result = client
            .post(UPNIFY_CONTACTS_URL)
            .header("X-API-KEY", api_key)
            .header("X-API-TOKEN", api_token)
            .json(&payload)
            .send()
            .and_then(|response| response.error_for_status());

        if let Err(e) = result {
            error!("[Upnify Error] {}", e);
        }
    }

    info!("Upload complete.");
}
