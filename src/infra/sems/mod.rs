//! HTTP client for the SEMS portal.
//!
//! [`SemsClient`] implements [`crate::services::SemsApi`] with the crosslogin
//! handshake and the `GetInverterDataByColumn` endpoint.

mod client;

pub use client::{BaseUrls, SemsClient};
