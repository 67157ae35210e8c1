use std::env;

/// Placeholder the provider returns while a personal e-mail is still masked.
/// Never counts as a duplicate; enrichment is expected to replace it.
pub const LOCKED_EMAIL: &str = "email_not_unlocked@domain.com";

// Organization search filters.
pub const ORGANIZATION_LOCATIONS: [&str; 5] = [
    "mexico, mexico city",
    "guadalajara",
    "monterrey",
    "querétaro",
    "puebla",
];
pub const EMPLOYEE_RANGES: [&str; 1] = ["500,9999999"];
pub const REVENUE_RANGE_MIN: u64 = 50_000_000;

// People search filters.
pub const PERSON_TITLES: [&str; 8] = [
    "sales",
    "marketing",
    "media",
    "communication",
    "advertising",
    "advertisement",
    "branding",
    "brands",
];

const DEFAULT_WEBHOOK_WAIT_SECS: u64 = 300;

/// Everything read from the environment, once, at startup. Missing Apollo
/// keys are not validated here; the first request fails instead.
#[derive(Debug, Clone)]
pub struct Settings {
    pub apollo_search_key: String,
    pub apollo_enrichment_key: String,
    pub pipedream_api_key: String,
    pub pipedream_source_id: String,
    pub pipedream_webhook_url: String,
    pub upnify_api_key: Option<String>,
    pub upnify_api_token: Option<String>,
    pub test_mode: bool,
    pub organizations_per_page: u32,
    pub contacts_per_page: u32,
    pub webhook_wait_secs: u64,
}

impl Settings {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let test_mode = env::var("TEST_MODE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Settings {
            apollo_search_key: env::var("APOLLO_API_ORG_AND_PEOPLE_SEARCH_KEY").unwrap_or_default(),
            apollo_enrichment_key: env::var("APOLLO_API_PEOPLE_ENRICHMENT_SEARCH_KEY")
                .unwrap_or_default(),
            pipedream_api_key: env::var("PIPEDREAM_API_KEY").unwrap_or_default(),
            pipedream_source_id: env::var("PIPEDREAM_SOURCE_ID").unwrap_or_default(),
            pipedream_webhook_url: env::var("PIPEDREAM_WEBHOOK_URL").unwrap_or_default(),
            upnify_api_key: env::var("UPNIFY_API_KEY").ok().filter(|v| !v.is_empty()),
            upnify_api_token: env::var("UPNIFY_API_TOKEN").ok().filter(|v| !v.is_empty()),
            // The organization endpoint is queried twice per refresh (employee
            // and revenue filters), so each query asks for half as many rows.
            organizations_per_page: if test_mode { 5 } else { 50 },
            contacts_per_page: if test_mode { 5 } else { 100 },
            webhook_wait_secs: env::var("WEBHOOK_RESPONSE_TIME")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_WEBHOOK_WAIT_SECS),
            test_mode,
        }
    }
}
