use std::fs;
use std::path::Path;

use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::error::ProspectError;

pub const STATE_FILE: &str = "pagination_state.json";

fn first_page() -> u32 {
    1
}

/// Search cursors carried between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    #[serde(default = "first_page")]
    pub organization_page: u32,
    #[serde(default = "first_page")]
    pub people_page: u32,
}

impl Default for PaginationState {
    fn default() -> Self {
        PaginationState {
            organization_page: 1,
            people_page: 1,
        }
    }
}

impl PaginationState {
    /// A missing file starts both cursors at 1. A file that exists but does
    /// not parse is surfaced as an error rather than silently reset.
    pub fn load(path: &Path) -> Result<Self, ProspectError> {
        if !path.exists() {
            info!("No pagination state found. Starting from page 1.");
            return Ok(PaginationState::default());
        }
        let content = fs::read_to_string(path).map_err(|e| ProspectError::io(path, e))?;
        let state: PaginationState =
            serde_json::from_str(&content).map_err(|e| ProspectError::json(path, e))?;
        info!(
            "Resuming at organization page {}, people page {}.",
            state.organization_page, state.people_page
        );
        Ok(state)
    }

    pub fn save(&self, path: &Path) {
        let json = match serde_json::to_string_pretty(self) {
            Ok(j) => j,
            Err(e) => {
                error!("Failed to serialize pagination state: {}", e);
                return;
            }
        };
        if let Err(e) = fs::write(path, json) {
            error!("Failed to write pagination state to {:?}: {}", path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_defaults_both_cursors() {
        let dir = TempDir::new().unwrap();
        let state = PaginationState::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(state, PaginationState::default());
    }

    #[test]
    fn state_roundtrips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        let state = PaginationState {
            organization_page: 4,
            people_page: 7,
        };
        state.save(&path);

        assert_eq!(PaginationState::load(&path).unwrap(), state);
    }

    #[test]
    fn missing_keys_default_to_one() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, r#"{"organization_page": 3}"#).unwrap();

        let state = PaginationState::load(&path).unwrap();
        assert_eq!(state.organization_page, 3);
        assert_eq!(state.people_page, 1);
    }

    #[test]
    fn malformed_state_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{{{{").unwrap();

        assert!(PaginationState::load(&path).is_err());
    }
}
