use apollo_prospector_lib::{
    config, crm, dedup, enrichment, logger, organizations, output, phone_inbox, pipeline,
    state_manager,
};
use apollo_prospector_lib::{ApolloClient, EmailRegistry, OrganizationCache, PaginationState, PhoneInbox};

use chrono::Local;
use log::{info, warn};
use std::error::Error;
use std::path::Path;
use std::time::Duration;

fn main() -> Result<(), Box<dyn Error>> {
    logger::init();

    let started_at = Local::now();
    info!(
        "Program started running at: {}!",
        started_at.format("%Y%m%d_%H%M%S")
    );

    let settings = config::Settings::from_env();

    // 1. Load cursors and the already-exported e-mail set
    let state_path = Path::new(state_manager::STATE_FILE);
    let state = PaginationState::load(state_path)?;

    let master_path = Path::new(output::MASTER_CSV);
    let mut registry = EmailRegistry::load_from_master(master_path)?;

    // 2. Retrieve people through the fallback chain
    let client = ApolloClient::new(
        settings.apollo_search_key.clone(),
        settings.apollo_enrichment_key.clone(),
    );
    let cache = OrganizationCache::new(organizations::ORG_CACHE_FILE);
    let cached_organizations = cache.load()?;

    let mut source = pipeline::ApolloSource::new(&client, &settings, &cache);
    let outcome = pipeline::retrieve_people(
        &mut source,
        cached_organizations,
        &state,
        settings.test_mode,
    );

    if outcome.people.is_empty() {
        warn!("No new contacts to save.");
        return Ok(());
    }

    // 3. Dedup, then reveal e-mails (which also kicks off the phone lookup)
    let mut contacts = dedup::screen_people(&outcome.people, &mut registry);

    if !contacts.is_empty() {
        enrichment::enrich_emails(&client, &mut contacts, &settings.pipedream_webhook_url);
    }

    let mut contacts = dedup::retain_unseen(contacts, &registry);

    if contacts.is_empty() {
        warn!("No new contacts to save.");
        outcome.next_state.save(state_path);
        return Ok(());
    }
    info!("Retrieved {} new contacts.", contacts.len());

    // 4. Collect phone numbers from the webhook inbox
    let inbox = PhoneInbox::new(
        settings.pipedream_api_key.clone(),
        settings.pipedream_source_id.clone(),
    );
    let phones = inbox.wait_and_collect(Duration::from_secs(settings.webhook_wait_secs))?;
    if phones.is_empty() {
        warn!("Could not retrieve phone numbers");
    } else {
        info!("Retrieved {} phone numbers.", phones.len());
    }
    phone_inbox::apply_phone_numbers(&mut contacts, &phones);

    // Cursors only advance once the run is past its fatal-error window.
    outcome.next_state.save(state_path);

    // 5. Persist and optionally hand off to the CRM
    let run_file = output::run_file_name(&started_at);
    output::write_run_file(Path::new(&run_file), &contacts)?;
    output::append_master(master_path, &contacts);

    crm::upload_contacts(&settings, &contacts);

    info!("Script finished.");
    Ok(())
}
