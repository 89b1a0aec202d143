pub mod adapters;
pub mod compliance;
pub mod core;
pub mod error;
pub mod handlers;
pub mod inspector;
pub mod registry;
pub mod trail;
