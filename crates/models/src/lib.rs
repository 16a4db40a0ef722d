//! Domain records for the dispatch portal.
//!
//! Plain data plus field validation; persistence and workflows live in the
//! `service` crate.

pub mod errors;
pub mod record;
pub mod ambulance;
pub mod user;

pub use record::Record;
