use std::collections::HashMap;

use log::warn;

use crate::apollo_client::{ApolloClient, MatchRecord};
use crate::contacts::Contact;

const ENRICHMENT_BATCH_SIZE: usize = 10;

/// Reveals masked e-mails in batches of ten and overwrites each matched
/// contact's e-mail in place. The same bulk request carries the webhook
/// target, which is what starts the provider's phone lookup job.
pub fn enrich_emails(client: &ApolloClient, contacts: &mut [Contact], webhook_url: &str) {
    for chunk in contacts.chunks_mut(ENRICHMENT_BATCH_SIZE) {
        let person_ids: Vec<String> = chunk
            .iter()
            .filter(|contact| !contact.person_id.is_empty())
            .map(|contact| contact.person_id.clone())
            .collect();
        if person_ids.is_empty() {
            continue;
        }

        let matches = client.bulk_match(&person_ids, webhook_url);
        let revealed = index_matches(matches);
        merge_revealed_emails(chunk, &revealed);
    }
}

/// Maps match IDs to revealed e-mails, skipping entries that are missing
/// either field.
pub fn index_matches(matches: Vec<MatchRecord>) -> HashMap<String, String> {
    let mut revealed = HashMap::new();
    for record in matches {
        match (record.id, record.email) {
            (Some(id), Some(email)) if !id.is_empty() && !email.is_empty() => {
                revealed.insert(id, email);
            }
            _ => warn!("Skipping enrichment match without an id or e-mail"),
        }
    }
    revealed
}

pub fn merge_revealed_emails(chunk: &mut [Contact], revealed: &HashMap<String, String>) {
    for contact in chunk.iter_mut() {
        if let Some(email) = revealed.get(&contact.person_id) {
            contact.email = email.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(person_id: &str, email: &str) -> Contact {
        Contact {
            person_id: person_id.into(),
            email: email.into(),
            ..Contact::default()
        }
    }

    #[test]
    fn matched_email_overwrites_original() {
        let mut chunk = vec![
            contact("p_1", "email_not_unlocked@domain.com"),
            contact("p_2", "kept@x.com"),
        ];
        let mut revealed = HashMap::new();
        revealed.insert("p_1".to_string(), "real@x.com".to_string());

        merge_revealed_emails(&mut chunk, &revealed);

        assert_eq!(chunk[0].email, "real@x.com");
        assert_eq!(chunk[1].email, "kept@x.com");
    }

    #[test]
    fn malformed_matches_are_skipped() {
        let matches = vec![
            MatchRecord {
                id: Some("p_1".into()),
                email: Some("real@x.com".into()),
            },
            MatchRecord {
                id: None,
                email: Some("orphan@x.com".into()),
            },
            MatchRecord {
                id: Some("p_3".into()),
                email: None,
            },
            MatchRecord {
                id: Some("p_4".into()),
                email: Some(String::new()),
            },
        ];

        let revealed = index_matches(matches);
        assert_eq!(revealed.len(), 1);
        assert_eq!(revealed.get("p_1").map(String::as_str), Some("real@x.com"));
    }
}
