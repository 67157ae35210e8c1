use std::time::Duration;

use log::error;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CACHE_CONTROL};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

const ORG_SEARCH_URL: &str = "https://api.apollo.io/api/v1/mixed_companies/search";
const PEOPLE_SEARCH_URL: &str = "https://api.apollo.io/api/v1/mixed_people/search";
const BULK_MATCH_URL: &str = "https://api.apollo.io/api/v1/people/bulk_match";

/// Blocking client for the Apollo search and enrichment endpoints. Search and
/// enrichment use separate API keys; both travel in the `X-Api-Key` header.
pub struct ApolloClient {
    client: Client,
    search_key: String,
    enrichment_key: String,
}

/// Picks the provider record ID out of the two response shapes Apollo uses.
/// Account-shaped records carry the logical ID in a scoped field
/// (`organization_id` / `person_id`) while plain records carry it in `id`;
/// `id` also exists on account-shaped records but refers to the account
/// itself, so the scoped field always wins when present.
pub fn resolve_provider_id(scoped_id: Option<&str>, direct_id: Option<&str>) -> Option<String> {
    scoped_id.or(direct_id).map(|id| id.to_string())
}

#[derive(Debug, Default, Deserialize)]
struct OrgSearchResponse {
    #[serde(default)]
    organizations: Vec<OrgRecord>,
    #[serde(default)]
    accounts: Vec<OrgRecord>,
}

/// One company out of `mixed_companies/search`, either shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrgRecord {
    pub organization_id: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
}

impl OrgRecord {
    pub fn resolved_id(&self) -> Option<String> {
        resolve_provider_id(self.organization_id.as_deref(), self.id.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
struct PeopleSearchResponse {
    #[serde(default)]
    people: Vec<PersonRecord>,
    #[serde(default)]
    contacts: Vec<PersonRecord>,
}

/// One person out of `mixed_people/search`, either shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonRecord {
    pub person_id: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub linkedin_url: Option<String>,
    pub title: Option<String>,
    pub email: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub organization_id: Option<String>,
    pub organization: Option<OrgSummary>,
}

impl PersonRecord {
    pub fn resolved_id(&self) -> Option<String> {
        resolve_provider_id(self.person_id.as_deref(), self.id.as_deref())
    }
}

/// Employer summary nested inside a person record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrgSummary {
    pub name: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BulkMatchResponse {
    #[serde(default)]
    matches: Vec<MatchRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchRecord {
    pub id: Option<String>,
    pub email: Option<String>,
}

impl ApolloClient {
    pub fn new(search_key: String, enrichment_key: String) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(headers)
            .build()
            .expect("Failed to build Apollo client");

        ApolloClient {
            client,
            search_key,
            enrichment_key,
        }
    }

    /// Transport and HTTP-status failures are logged and collapsed into an
    /// empty response; the pipeline carries on with whatever it has.
    fn post<T>(&self, url: &str, api_key: &str, query: &[(&str, String)], body: &Value) -> T
    where
        T: DeserializeOwned + Default,
    {
        let request = self
            .client
            .post(url)
            .header("X-Api-Key", api_key)
            .query(query)
            .json(body);

        match request.send().and_then(|resp| resp.error_for_status()) {
            Ok(resp) => match resp.json::<T>() {
                Ok(parsed) => parsed,
                Err(e) => {
                    error!("Could not decode response from {}: {}", url, e);
                    T::default()
                }
            },
            Err(e) => {
                error!("[Error] {}", e);
                T::default()
            }
        }
    }

    /// Returns the union of the `organizations` and `accounts` arrays.
    pub fn search_organizations(&self, query: &[(&str, String)]) -> Vec<OrgRecord> {
        let response: OrgSearchResponse =
            self.post(ORG_SEARCH_URL, &self.search_key, query, &serde_json::json!({}));
        let mut records = response.organizations;
        records.extend(response.accounts);
        records
    }

    /// Returns the union of the `people` and `contacts` arrays.
    pub fn search_people(&self, query: &[(&str, String)]) -> Vec<PersonRecord> {
        let response: PeopleSearchResponse = self.post(
            PEOPLE_SEARCH_URL,
            &self.search_key,
            query,
            &serde_json::json!({}),
        );
        let mut records = response.people;
        records.extend(response.contacts);
        records
    }

    /// Bulk e-mail reveal. The same request carries the webhook target that
    /// triggers the provider's asynchronous phone lookup.
    pub fn bulk_match(&self, person_ids: &[String], webhook_url: &str) -> Vec<MatchRecord> {
        let query = [
            ("reveal_personal_emails", "true".to_string()),
            ("reveal_phone_number", "true".to_string()),
            ("webhook_url", webhook_url.to_string()),
        ];
        let details: Vec<Value> = person_ids
            .iter()
            .map(|id| serde_json::json!({ "id": id }))
            .collect();
        let body = serde_json::json!({ "details": details });

        let response: BulkMatchResponse =
            self.post(BULK_MATCH_URL, &self.enrichment_key, &query, &body);
        response.matches
    }
}
