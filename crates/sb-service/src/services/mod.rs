//! Service layer for the Session Broker.
//!
//! This module contains services that interact with the external room
//! provider and encapsulate business logic.
//!
//! # Components
//!
//! - `broker` - Session broker composing the registry, resolver, and issuer
//! - `capacity` - Admission decisions from live registry state
//! - `issuer` - Join-credential issuance with sentinel fallback
//! - `registry` - HTTP client for the provider's room registry

pub mod broker;
pub mod capacity;
pub mod issuer;
pub mod registry;

pub use broker::{DeleteOutcome, SessionBroker, SessionStarted};
pub use issuer::TokenIssuer;
pub use registry::RegistryClient;
