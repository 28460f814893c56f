//! Capacity resolver: admission arithmetic over live registry state.
//!
//! Reconciles the registry-reported participant count against an effective
//! maximum. The maximum comes from, in order of precedence: a
//! `max_participants` entry in the room's metadata map, the registry's
//! declared value, or the broker default. A maximum of zero means unlimited.
//!
//! Decisions are computed fresh per call and never cached; the staleness
//! window is one registry round trip. A room absent from the registry is
//! treated as creatable and therefore joinable.

use crate::models::{CapacityDecision, DEFAULT_MAX_PARTICIPANTS};
use crate::services::registry::RoomInfo;
use tracing::warn;

/// Metadata key that overrides the declared maximum.
const METADATA_MAX_PARTICIPANTS_KEY: &str = "max_participants";

/// Compute the admission verdict for a registry lookup result.
///
/// `None` (room not in the registry) is joinable with the broker default
/// maximum. Metadata parse failures are logged and ignored, never fatal:
/// the decision degrades to the registry-declared value.
pub fn resolve(room: Option<&RoomInfo>) -> CapacityDecision {
    let Some(room) = room else {
        return CapacityDecision {
            can_join: true,
            current_participants: 0,
            max_participants: DEFAULT_MAX_PARTICIPANTS,
        };
    };

    let current = room.num_participants;
    let mut max = room.max_participants;

    if let Some(override_max) = metadata_max_participants(&room.name, &room.metadata) {
        max = override_max;
    }

    CapacityDecision {
        can_join: max == 0 || current < max,
        current_participants: current,
        max_participants: max,
    }
}

/// Extract a `max_participants` override from room metadata.
///
/// Metadata is conventionally a serialized JSON map; the value may be a
/// number or a numeric string (both shapes exist in the wild). Anything
/// unparseable yields `None`.
fn metadata_max_participants(room: &str, metadata: &str) -> Option<u32> {
    if metadata.is_empty() {
        return None;
    }

    let parsed: serde_json::Value = match serde_json::from_str(metadata) {
        Ok(value) => value,
        Err(e) => {
            warn!(
                target: "sb.services.capacity",
                room = %room,
                error = %e,
                "Unparseable room metadata; using declared maximum"
            );
            return None;
        }
    };

    let value = parsed.get(METADATA_MAX_PARTICIPANTS_KEY)?;
    let parsed_max = match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        serde_json::Value::String(s) => s.parse::<u32>().ok(),
        _ => None,
    };

    if parsed_max.is_none() {
        warn!(
            target: "sb.services.capacity",
            room = %room,
            value = %value,
            "Invalid max_participants in room metadata; using declared maximum"
        );
    }
    parsed_max
}
