//! # VenuePulse Common Library
//!
//! Shared code for the VenuePulse services including:
//! - Common error types
//! - Event types (PulseEvent enum) and the broadcast EventBus
//! - Configuration loading and root folder resolution

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
