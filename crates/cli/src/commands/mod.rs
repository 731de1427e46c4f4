//! CLI command implementations

pub mod containers;
pub mod notify;
pub mod pihole;
pub mod services;
