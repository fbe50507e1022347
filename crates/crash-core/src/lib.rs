//! Domain types shared by the crash-stats crates.
//!
//! Holds the fixed code tables, the raw and normalized record types, the
//! aggregate row types handed to renderers, date helpers and the CLI settings.

pub mod codes;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;

pub use error::{CrashError, Result};
