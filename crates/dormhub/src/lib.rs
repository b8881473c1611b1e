//! Occupancy and rent rules for a boarding-house operator.
//!
//! The [`property`] module carries the domain: tenants, rooms, payments, the
//! rules keeping room membership and tenant assignments in agreement, and the
//! dashboard aggregation. [`auth`] and [`media`] are the seams to the identity
//! provider and the image host.

pub mod auth;
pub mod config;
pub mod error;
pub mod media;
pub mod property;
pub mod telemetry;
