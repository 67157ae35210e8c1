use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::apollo_client::{ApolloClient, OrgRecord};
use crate::config::{Settings, EMPLOYEE_RANGES, ORGANIZATION_LOCATIONS, REVENUE_RANGE_MIN};
use crate::error::ProspectError;

pub const ORG_CACHE_FILE: &str = "cached_organizations.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
}

/// Flat JSON file holding the organizations the people search runs against.
/// Refreshes overwrite it wholesale.
pub struct OrganizationCache {
    path: PathBuf,
}

impl OrganizationCache {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        OrganizationCache {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Missing file means an empty cache; a file that no longer parses is
    /// surfaced rather than silently rebuilt.
    pub fn load(&self) -> Result<Vec<Organization>, ProspectError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content =
            fs::read_to_string(&self.path).map_err(|e| ProspectError::io(&self.path, e))?;
        serde_json::from_str(&content).map_err(|e| ProspectError::json(&self.path, e))
    }

    pub fn save(&self, organizations: &[Organization]) {
        let json = match serde_json::to_string_pretty(organizations) {
            Ok(j) => j,
            Err(e) => {
                error!("Failed to serialize organization cache: {}", e);
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, json) {
            error!("Failed to write organization cache {:?}: {}", self.path, e);
        }
    }
}

/// Runs the two filter strategies against the organization search endpoint
/// and replaces the cache with their union.
pub struct OrganizationFetcher<'a> {
    client: &'a ApolloClient,
    settings: &'a Settings,
    cache: &'a OrganizationCache,
}

impl<'a> OrganizationFetcher<'a> {
    pub fn new(
        client: &'a ApolloClient,
        settings: &'a Settings,
        cache: &'a OrganizationCache,
    ) -> Self {
        OrganizationFetcher {
            client,
            settings,
            cache,
        }
    }

    /// Fetches `page` under both filters, overwrites the cache, and returns
    /// the new list with the next organization page. The page advances only
    /// when `advance_page` is set; otherwise the cursor resets to 1.
    pub fn refresh(&self, page: u32, advance_page: bool) -> (Vec<Organization>, u32) {
        info!("Retrieving companies...");

        let per_page = self.settings.organizations_per_page.to_string();

        let mut query: Vec<(&str, String)> = Vec::new();
        for range in EMPLOYEE_RANGES {
            query.push(("organization_num_employees_ranges[]", range.to_string()));
        }
        for location in ORGANIZATION_LOCATIONS {
            query.push(("organization_locations[]", location.to_string()));
        }
        query.push(("page", page.to_string()));
        query.push(("per_page", per_page.clone()));
        let mut companies = self.client.search_organizations(&query);

        let mut query: Vec<(&str, String)> = Vec::new();
        for location in ORGANIZATION_LOCATIONS {
            query.push(("organization_locations[]", location.to_string()));
        }
        query.push(("revenue_range[min]", REVENUE_RANGE_MIN.to_string()));
        query.push(("page", page.to_string()));
        query.push(("per_page", per_page));
        companies.extend(self.client.search_organizations(&query));

        info!("Retrieved {} companies.", companies.len());

        // A company matching both filters shows up twice; entries are kept
        // as returned.
        let organizations = collect_organizations(&companies);
        self.cache.save(&organizations);

        let next_page = if advance_page { page + 1 } else { 1 };
        (organizations, next_page)
    }
}

pub fn collect_organizations(records: &[OrgRecord]) -> Vec<Organization> {
    records
        .iter()
        .map(|record| Organization {
            id: record.resolved_id().unwrap_or_default(),
            name: record.name.clone().unwrap_or_default(),
        })
        .collect()
}
