//! Persistence for user-facing configuration

pub mod settings;
