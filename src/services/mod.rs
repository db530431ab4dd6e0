pub mod sems_api;

pub use sems_api::{Credentials, Region, SemsApi, SemsError, SessionToken};
