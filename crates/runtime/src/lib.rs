//! `supplychain-runtime` — deployment wiring around the registries.
//!
//! Deploys an [`AdminRegistry`](supplychain_auth::AdminRegistry) and a
//! [`ProductRegistry`](supplychain_products::ProductRegistry) bound to it, and
//! replays JSON call scripts against the pair.

pub mod config;
pub mod deployment;
pub mod script;

pub use config::{ConfigError, RuntimeConfig};
pub use deployment::Deployment;
pub use script::{Account, Call, CallOutcome, CallScript, CallStatus, ScriptError, ScriptReport};
