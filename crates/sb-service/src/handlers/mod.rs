//! HTTP request handlers for the Session Broker.

pub mod health;
pub mod metrics;
pub mod rooms;
pub mod sessions;
pub mod tokens;

pub use health::{detailed_health, health_check};
pub use metrics::metrics_handler;
pub use rooms::{check_capacity, create_room, delete_room, list_rooms};
pub use sessions::start_session;
pub use tokens::issue_token;
