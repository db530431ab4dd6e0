pub mod api;
pub mod fetch;
pub mod infra;
pub mod mock;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod services;
pub mod summary;
pub mod table;
