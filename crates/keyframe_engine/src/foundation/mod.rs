//! Foundation module - Core utilities and types
//!
//! - Math types and operations
//! - Tick timers
//! - Logging utilities

pub mod logging;
pub mod math;
pub mod time;
