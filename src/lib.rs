pub mod apollo_client;
pub mod config;
pub mod contacts;
pub mod crm;
pub mod dedup;
pub mod enrichment;
pub mod error;
pub mod logger;
pub mod organizations;
pub mod output;
pub mod phone_inbox;
pub mod pipeline;
pub mod state_manager;

// Exporting types for convenience
pub use apollo_client::ApolloClient;
pub use contacts::Contact;
pub use dedup::EmailRegistry;
pub use error::ProspectError;
pub use organizations::{Organization, OrganizationCache};
pub use phone_inbox::PhoneInbox;
pub use state_manager::PaginationState;
