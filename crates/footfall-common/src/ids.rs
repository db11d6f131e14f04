//! Internal ID generation.
//!
//! Devices choose their own opaque string identity at registration time
//! (spec: firmware-assigned). Everything this server mints itself — pet
//! state rows — uses UUID v7 for a time-sortable, coordination-free ID.

use uuid::Uuid;

/// Generate a new time-sortable internal ID.
pub fn generate_id() -> Uuid {
    Uuid::now_v7()
}
