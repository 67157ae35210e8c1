use std::collections::HashSet;
use std::path::Path;

use log::info;

use crate::apollo_client::PersonRecord;
use crate::config::LOCKED_EMAIL;
use crate::contacts::Contact;
use crate::error::ProspectError;

/// Lower-cased e-mails already exported. Rebuilt from the master CSV each
/// run, grown in memory while the run adds contacts, never written back.
#[derive(Debug, Clone, Default)]
pub struct EmailRegistry {
    emails: HashSet<String>,
}

impl EmailRegistry {
    pub fn new() -> Self {
        EmailRegistry::default()
    }

    pub fn load_from_master(path: &Path) -> Result<Self, ProspectError> {
        let mut registry = EmailRegistry::default();
        if !path.exists() {
            return Ok(registry);
        }

        let mut reader = csv::Reader::from_path(path).map_err(|e| ProspectError::csv(path, e))?;
        let headers = reader
            .headers()
            .map_err(|e| ProspectError::csv(path, e))?
            .clone();
        let email_column = headers.iter().position(|h| h == "Email").ok_or_else(|| {
            ProspectError::MissingEmailColumn {
                path: path.display().to_string(),
            }
        })?;

        for record in reader.records() {
            let record = record.map_err(|e| ProspectError::csv(path, e))?;
            if let Some(email) = record.get(email_column) {
                registry.emails.insert(email.to_lowercase());
            }
        }

        info!("Loaded {} previously exported e-mails.", registry.len());
        Ok(registry)
    }

    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(email)
    }

    pub fn insert(&mut self, email: String) {
        self.emails.insert(email);
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

/// Pre-enrichment pass. Builds export rows while skipping people whose
/// e-mail was already exported; each kept e-mail registers immediately so
/// duplicates within the same run are suppressed too. The locked placeholder
/// always passes, since only enrichment can resolve it.
pub fn screen_people(people: &[PersonRecord], registry: &mut EmailRegistry) -> Vec<Contact> {
    let mut contacts = Vec::new();
    for person in people {
        let email = person.email.as_deref().unwrap_or_default().to_lowercase();
        if registry.contains(&email) && email != LOCKED_EMAIL {
            continue;
        }
        let contact = Contact::from_person(person, email.clone());
        registry.insert(email);
        contacts.push(contact);
    }
    contacts
}

/// Post-enrichment pass. Drops rows whose final e-mail is blank or already
/// registered. The registry is left untouched, so repeating the pass over
/// the same list changes nothing.
pub fn retain_unseen(contacts: Vec<Contact>, registry: &EmailRegistry) -> Vec<Contact> {
    contacts
        .into_iter()
        .filter(|contact| {
            !contact.email.is_empty() && !registry.contains(&contact.email.to_lowercase())
        })
        .collect()
}
