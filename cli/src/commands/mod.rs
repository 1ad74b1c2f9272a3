//! Command implementations

pub mod agent;
pub mod catalog;
pub mod config;
pub mod env;
pub mod model;
pub mod registry;

/// Parse a `KEY=VALUE` argument.
///
/// # Errors
///
/// Returns a message for clap if there is no `=` or the key is empty.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}
