// Dashboard snapshot contract: typed model, validator and loaders
pub mod application;
pub mod domain;
pub mod infrastructure;
