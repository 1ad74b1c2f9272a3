//! Unit tests for polis-console
//!
//! These tests use an in-memory backend and run fast without network I/O.

mod config_repository;
mod config_store_service;
mod mocks;
mod settings;
