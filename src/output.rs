use std::fs::OpenOptions;
use std::path::Path;

use chrono::{DateTime, Local};
use log::{info, warn};

use crate::contacts::{Contact, CSV_HEADERS};
use crate::error::ProspectError;

pub const MASTER_CSV: &str = "apollo_contacts_master.csv";

pub fn run_file_name(started_at: &DateTime<Local>) -> String {
    format!("apollo_contacts_{}.csv", started_at.format("%Y%m%d_%H%M%S"))
}

/// Writes the per-run output, header included. A failure here is fatal;
/// nothing has been persisted yet.
pub fn write_run_file(path: &Path, contacts: &[Contact]) -> Result<(), ProspectError> {
    info!("Saving results to {:?}...", path);

    let mut writer = csv::Writer::from_path(path).map_err(|e| ProspectError::csv(path, e))?;
    writer
        .write_record(CSV_HEADERS)
        .map_err(|e| ProspectError::csv(path, e))?;
    for contact in contacts {
        writer
            .write_record(contact.to_record())
            .map_err(|e| ProspectError::csv(path, e))?;
    }
    writer.flush().map_err(|e| ProspectError::io(path, e))?;
    Ok(())
}

/// Appends the same rows to the cumulative output, writing the header only
/// when the file is new. Failures are reported but never undo the per-run
/// file; the usual culprit is the master being open in a spreadsheet.
pub fn append_master(path: &Path, contacts: &[Contact]) {
    let file_exists = path.exists();
    let file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Could not open {:?} for appending: {}", path, e);
            warn!("Please ensure that {:?} isn't open elsewhere", path);
            return;
        }
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    if !file_exists {
        if let Err(e) = writer.write_record(CSV_HEADERS) {
            warn!("Failed to write header to {:?}: {}", path, e);
            return;
        }
    }
    for contact in contacts {
        if let Err(e) = writer.write_record(contact.to_record()) {
            warn!("Failed to append record to {:?}: {}", path, e);
            return;
        }
    }
    if let Err(e) = writer.flush() {
        warn!("Failed to flush {:?}: {}", path, e);
        return;
    }

    info!("Contacts appended to {:?}", path);
}
