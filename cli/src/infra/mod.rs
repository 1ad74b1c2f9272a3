//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: the console API client, the
//! YAML file store, the local cache, and settings loaded from the environment.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod backend;
pub mod cache;
pub mod file;
pub mod http;
pub mod settings;

pub use backend::AnyBackend;
pub use settings::ConsoleSettings;
