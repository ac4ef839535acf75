//! `supplychain-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by the admin and
//! product registries (no infrastructure concerns).

pub mod aggregate;
pub mod error;
pub mod id;

pub use aggregate::{Aggregate, AggregateRoot};
pub use error::{DomainError, DomainResult};
pub use id::Identity;
