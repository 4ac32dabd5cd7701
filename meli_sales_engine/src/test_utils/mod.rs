//! Helpers shared by the integration tests: database setup and scripted stand-ins for the marketplace API.

pub mod prepare_env;
pub mod sources;
