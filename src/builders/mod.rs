//! Builders to construct a manager from configuration.

pub mod manager_builder;

pub use manager_builder::build_manager;
