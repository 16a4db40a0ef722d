//! Service layer for the ambulance dispatch portal.
//! - `storage`: blob persistence and the generic indexed record store.
//! - `ambulance` / `auth`: the two directories built on the record store.
//! - `geocode`: the external address resolution boundary, with debouncing.
//! - `portal`: the facade the presentation layer talks to.

pub mod errors;
pub mod storage;
pub mod ambulance;
pub mod auth;
pub mod geocode;
pub mod portal;
#[cfg(test)]
pub mod test_support;

pub use errors::{AdapterError, ServiceError};
pub use portal::{AmbulanceListObserver, DispatchPortal, LookupField};
