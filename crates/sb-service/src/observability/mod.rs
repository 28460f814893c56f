//! Observability: Prometheus metrics for the Session Broker.

pub mod metrics;
