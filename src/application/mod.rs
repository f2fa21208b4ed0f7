// Application layer - Validation and use cases
pub mod render_plan;
pub mod snapshot_repository;
pub mod snapshot_service;
pub mod validator;
