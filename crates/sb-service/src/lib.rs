//! Switchboard Session Broker (SB) Service Library
//!
//! This library provides the core functionality for the Switchboard
//! Session Broker - a stateless HTTP facade over an external media-room
//! provider, responsible for:
//!
//! - Room lifecycle (create, list, delete) against the provider's registry
//! - Session brokering (fresh room + creator credential in one operation)
//! - Capacity admission decisions from live registry state
//! - Scoped join-credential issuance
//!
//! The provider's registry is the system of record; the broker owns no
//! storage and caches nothing across requests.
//!
//! # Architecture
//!
//! The SB follows the Handler -> Service pattern:
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> services/*.rs -> provider registry
//! ```
//!
//! # Modules
//!
//! - `config` - Service configuration and live/degraded mode resolution
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - HTTP metrics middleware
//! - `models` - Request/response models
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router setup
//! - `services` - Registry client, credential issuer, capacity resolver,
//!   session broker

pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
