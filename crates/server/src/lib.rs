pub mod routes;
pub mod startup;
pub mod errors;
pub mod app_state;

pub use startup::run;
