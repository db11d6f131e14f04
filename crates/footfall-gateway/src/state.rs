//! The per-connection session state machine (spec.md §4.4).

/// A session's lifecycle state. `Closed` is terminal and never observed
/// by the dispatch table — a closed connection simply stops reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Registered,
    Authenticated,
}

impl ConnectionState {
    /// Whether `type_name` is accepted while in this state (spec.md §4.4's
    /// accepted-message-types table).
    pub fn accepts(self, type_name: &str) -> bool {
        match type_name {
            "register" => true,
            "ping" => true,
            "authenticate" => matches!(self, Self::Registered | Self::Authenticated),
            "step_data" | "getPet" | "updatePet" | "claimResources" | "feedPet" | "playWithPet" => {
                matches!(self, Self::Authenticated)
            }
            _ => false,
        }
    }
}
