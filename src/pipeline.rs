use log::{info, warn};

use crate::apollo_client::{ApolloClient, PersonRecord};
use crate::config::{Settings, ORGANIZATION_LOCATIONS, PERSON_TITLES};
use crate::organizations::{Organization, OrganizationCache, OrganizationFetcher};
use crate::state_manager::PaginationState;

/// Where candidate organizations and people come from. Split out so the
/// fallback chain can be exercised without the live API.
pub trait ProspectSource {
    fn refresh_organizations(&mut self, page: u32, advance_page: bool) -> (Vec<Organization>, u32);
    fn fetch_people(&mut self, organization_ids: &[String], page: u32) -> Vec<PersonRecord>;
}

/// Live source backed by the Apollo endpoints and the on-disk cache.
pub struct ApolloSource<'a> {
    client: &'a ApolloClient,
    settings: &'a Settings,
    fetcher: OrganizationFetcher<'a>,
}

impl<'a> ApolloSource<'a> {
    pub fn new(
        client: &'a ApolloClient,
        settings: &'a Settings,
        cache: &'a OrganizationCache,
    ) -> Self {
        ApolloSource {
            client,
            settings,
            fetcher: OrganizationFetcher::new(client, settings, cache),
        }
    }
}

impl ProspectSource for ApolloSource<'_> {
    fn refresh_organizations(&mut self, page: u32, advance_page: bool) -> (Vec<Organization>, u32) {
        self.fetcher.refresh(page, advance_page)
    }

    fn fetch_people(&mut self, organization_ids: &[String], page: u32) -> Vec<PersonRecord> {
        info!(
            "Retrieving contacts... (page {}) from {} orgs...",
            page,
            organization_ids.len()
        );

        let mut query: Vec<(&str, String)> = Vec::new();
        for title in PERSON_TITLES {
            query.push(("person_titles[]", title.to_string()));
        }
        for location in ORGANIZATION_LOCATIONS {
            query.push(("person_locations[]", location.to_string()));
        }
        for id in organization_ids {
            query.push(("organization_ids[]", id.clone()));
        }
        query.push(("page", page.to_string()));
        query.push(("per_page", self.settings.contacts_per_page.to_string()));

        self.client.search_people(&query)
    }
}

#[derive(Debug)]
pub struct RetrievalOutcome {
    pub people: Vec<PersonRecord>,
    /// Cursors to persist once the run is past its fatal-error window. Equal
    /// to the pre-run state when every fallback came back empty.
    pub next_state: PaginationState,
}

/// Bounded fallback chain: current page, then the next page, then refresh
/// the organization list and try once more. Never more than three people
/// fetches per run.
pub fn retrieve_people<S: ProspectSource>(
    source: &mut S,
    cached_organizations: Vec<Organization>,
    state: &PaginationState,
    test_mode: bool,
) -> RetrievalOutcome {
    let mut organization_page = state.organization_page;
    let mut people_page = state.people_page;

    let mut organizations = cached_organizations;
    if organizations.is_empty() {
        let (refreshed, next_page) = source.refresh_organizations(organization_page, false);
        organizations = refreshed;
        organization_page = next_page;
        people_page = 1;
    }

    let mut organization_ids = collect_ids(&organizations);
    let mut people = source.fetch_people(&organization_ids, people_page);

    if people.is_empty() {
        warn!("No people found. Trying next page...");
        people_page += 1;
        people = source.fetch_people(&organization_ids, people_page);
    }

    if people.is_empty() {
        warn!("Still no people after next page. Refreshing organizations...");
        let (refreshed, next_page) = source.refresh_organizations(organization_page, true);
        organizations = refreshed;
        organization_page = next_page;
        people_page = 1;
        organization_ids = collect_ids(&organizations);
        people = source.fetch_people(&organization_ids, people_page);
    }

    if people.is_empty() {
        info!("No people found after all fallbacks.");
        return RetrievalOutcome {
            people,
            next_state: state.clone(),
        };
    }

    info!("Retrieved {} people.", people.len());
    let next_state = PaginationState {
        organization_page,
        people_page: if test_mode { 1 } else { people_page + 1 },
    };
    RetrievalOutcome { people, next_state }
}

fn collect_ids(organizations: &[Organization]) -> Vec<String> {
    organizations
        .iter()
        .map(|organization| organization.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeSource {
        refresh_calls: Vec<(u32, bool)>,
        fetch_calls: Vec<(Vec<String>, u32)>,
        people_by_call: Vec<Vec<PersonRecord>>,
        refreshed_orgs: Vec<Organization>,
    }

    impl FakeSource {
        fn new(people_by_call: Vec<Vec<PersonRecord>>) -> Self {
            FakeSource {
                refresh_calls: Vec::new(),
                fetch_calls: Vec::new(),
                people_by_call,
                refreshed_orgs: vec![Organization {
                    id: "org_fresh".into(),
                    name: "Fresh".into(),
                }],
            }
        }
    }

    impl ProspectSource for FakeSource {
        fn refresh_organizations(
            &mut self,
            page: u32,
            advance_page: bool,
        ) -> (Vec<Organization>, u32) {
            self.refresh_calls.push((page, advance_page));
            let next_page = if advance_page { page + 1 } else { 1 };
            (self.refreshed_orgs.clone(), next_page)
        }

        fn fetch_people(&mut self, organization_ids: &[String], page: u32) -> Vec<PersonRecord> {
            self.fetch_calls.push((organization_ids.to_vec(), page));
            if self.people_by_call.is_empty() {
                Vec::new()
            } else {
                self.people_by_call.remove(0)
            }
        }
    }

    fn one_person() -> Vec<PersonRecord> {
        vec![PersonRecord {
            id: Some("p_1".into()),
            ..PersonRecord::default()
        }]
    }

    fn cached() -> Vec<Organization> {
        vec![Organization {
            id: "org_cached".into(),
            name: "Cached".into(),
        }]
    }

    #[test]
    fn first_attempt_success_advances_people_page() {
        let mut source = FakeSource::new(vec![one_person()]);
        let state = PaginationState {
            organization_page: 3,
            people_page: 5,
        };

        let outcome = retrieve_people(&mut source, cached(), &state, false);

        assert_eq!(source.fetch_calls.len(), 1);
        assert_eq!(source.fetch_calls[0].1, 5);
        assert!(source.refresh_calls.is_empty());
        assert_eq!(outcome.next_state.people_page, 6);
        assert_eq!(outcome.next_state.organization_page, 3);
    }

    #[test]
    fn empty_page_retries_next_page_once() {
        let mut source = FakeSource::new(vec![Vec::new(), one_person()]);
        let state = PaginationState {
            organization_page: 2,
            people_page: 4,
        };

        let outcome = retrieve_people(&mut source, cached(), &state, false);

        assert_eq!(source.fetch_calls.len(), 2);
        assert_eq!(source.fetch_calls[1].1, 5);
        assert!(source.refresh_calls.is_empty());
        assert_eq!(outcome.next_state.people_page, 6);
    }

    #[test]
    fn exhausted_pages_refresh_organizations_then_stop() {
        let mut source = FakeSource::new(vec![Vec::new(), Vec::new(), Vec::new()]);
        let state = PaginationState {
            organization_page: 2,
            people_page: 4,
        };

        let outcome = retrieve_people(&mut source, cached(), &state, false);

        // Exactly three fetches: current page, next page, post-refresh page 1.
        assert_eq!(source.fetch_calls.len(), 3);
        assert_eq!(source.fetch_calls[0].1, 4);
        assert_eq!(source.fetch_calls[1].1, 5);
        assert_eq!(source.fetch_calls[2].1, 1);
        assert_eq!(source.refresh_calls, vec![(2, true)]);

        // The refreshed organization list feeds the final attempt.
        assert_eq!(source.fetch_calls[2].0, vec!["org_fresh".to_string()]);

        assert!(outcome.people.is_empty());
        assert_eq!(outcome.next_state, state);
    }

    #[test]
    fn refresh_fallback_success_resets_people_page() {
        let mut source = FakeSource::new(vec![Vec::new(), Vec::new(), one_person()]);
        let state = PaginationState {
            organization_page: 2,
            people_page: 9,
        };

        let outcome = retrieve_people(&mut source, cached(), &state, false);

        assert_eq!(source.fetch_calls.len(), 3);
        assert_eq!(outcome.next_state.organization_page, 3);
        assert_eq!(outcome.next_state.people_page, 2);
    }

    #[test]
    fn empty_cache_triggers_refresh_without_advancing() {
        let mut source = FakeSource::new(vec![one_person()]);
        let state = PaginationState {
            organization_page: 7,
            people_page: 3,
        };

        let outcome = retrieve_people(&mut source, Vec::new(), &state, false);

        assert_eq!(source.refresh_calls, vec![(7, false)]);
        // People cursor resets along with the rebuilt cache.
        assert_eq!(source.fetch_calls[0].1, 1);
        assert_eq!(source.fetch_calls[0].0, vec!["org_fresh".to_string()]);
        assert_eq!(outcome.next_state.organization_page, 1);
        assert_eq!(outcome.next_state.people_page, 2);
    }

    #[test]
    fn test_mode_pins_people_page_to_one() {
        let mut source = FakeSource::new(vec![one_person()]);
        let state = PaginationState {
            organization_page: 1,
            people_page: 1,
        };

        let outcome = retrieve_people(&mut source, cached(), &state, true);
        assert_eq!(outcome.next_state.people_page, 1);
    }
}
