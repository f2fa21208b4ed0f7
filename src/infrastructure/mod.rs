// Infrastructure layer - Configuration, document codec and storage adapters
pub mod config;
pub mod document;
pub mod file_repository;
