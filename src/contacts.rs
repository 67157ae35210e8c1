use log::warn;

use crate::apollo_client::PersonRecord;

/// Column order shared by the per-run and master CSVs.
pub const CSV_HEADERS: [&str; 11] = [
    "Person ID",
    "First Name",
    "Last Name",
    "WhatsApp",
    "LinkedIn",
    "Organization ID",
    "Organization",
    "Title",
    "Email",
    "Organization Phone",
    "Location",
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contact {
    pub person_id: String,
    pub first_name: String,
    pub last_name: String,
    pub whatsapp: String,
    pub linkedin_url: String,
    pub organization_id: String,
    pub organization_name: String,
    pub title: String,
    pub email: String,
    pub organization_phone: String,
    pub location: String,
}

impl Contact {
    /// Builds an export row from a provider person record. Missing nested
    /// fields are logged and left empty; the record is still exported.
    pub fn from_person(person: &PersonRecord, email: String) -> Contact {
        let label = person.name.clone().unwrap_or_default();

        if person.city.is_none() || person.state.is_none() || person.country.is_none() {
            warn!("{} does not have a complete location.", label);
        }
        let location = format!(
            "{}, {}, {}",
            person.city.as_deref().unwrap_or_default(),
            person.state.as_deref().unwrap_or_default(),
            person.country.as_deref().unwrap_or_default()
        );

        let (organization_name, organization_phone) = match person.organization.as_ref() {
            Some(org) => (
                org.name.clone().unwrap_or_default(),
                org.phone.clone().unwrap_or_default(),
            ),
            None => {
                warn!("{} does not have an organization.", label);
                warn!("{} does not have a phone.", label);
                (String::new(), String::new())
            }
        };

        Contact {
            person_id: person.resolved_id().unwrap_or_default(),
            first_name: person.first_name.clone().unwrap_or_default(),
            last_name: person.last_name.clone().unwrap_or_default(),
            whatsapp: String::new(),
            linkedin_url: person.linkedin_url.clone().unwrap_or_default(),
            organization_id: person.organization_id.clone().unwrap_or_default(),
            organization_name,
            title: person.title.clone().unwrap_or_default(),
            email,
            organization_phone,
            location,
        }
    }

    /// Field values in `CSV_HEADERS` order.
    pub fn to_record(&self) -> [&str; 11] {
        [
            self.person_id.as_str(),
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.whatsapp.as_str(),
            self.linkedin_url.as_str(),
            self.organization_id.as_str(),
            self.organization_name.as_str(),
            self.title.as_str(),
            self.email.as_str(),
            self.organization_phone.as_str(),
            self.location.as_str(),
        ]
    }
}
