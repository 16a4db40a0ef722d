//! Ambulance directory: registration, status toggling and location history.

pub mod directory;
pub mod report;

pub use directory::{AmbulanceDirectory, AMBULANCES_KEY};
pub use report::history_report;
