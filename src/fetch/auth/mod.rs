//! SEMS token handling: the anonymous pre-login token, the session token
//! derived from a login response, and the header wrapper that sends either.

mod token;

pub use token::{TOKEN_HEADER, TokenHeader, pre_login_token, session_token};
