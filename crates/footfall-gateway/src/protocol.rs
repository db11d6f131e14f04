//! Wire protocol types (spec.md §6). Inbound frames are a tagged-variant
//! table keyed by literal `type` strings — exactly the set spec.md §6
//! enumerates, mixed casing and all; unknown types are a serde error the
//! caller turns into a `ValidationError`, matching spec.md §9's
//! "dynamic message dispatch becomes a tagged-variant table".

use serde::Deserialize;
use serde_json::value::RawValue;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum InboundMessage {
    #[serde(rename = "register")]
    Register { device_id: String, public_key: String },

    #[serde(rename = "authenticate")]
    Authenticate { device_id: String },

    #[serde(rename = "step_data")]
    StepData {
        device_id: String,
        step_count: i64,
        timestamp: i64,
        firmware_version: i64,
        battery_percent: i64,
        raw_acc_samples: Box<RawValue>,
        signature: String,
    },

    #[serde(rename = "ping")]
    Ping {},

    #[serde(rename = "getPet")]
    GetPet {},

    #[serde(rename = "updatePet")]
    UpdatePet {
        #[serde(default)]
        pet_name: Option<String>,
        #[serde(default)]
        cosmetic: Option<String>,
    },

    #[serde(rename = "claimResources")]
    ClaimResources { steps: i64 },

    #[serde(rename = "feedPet")]
    FeedPet {},

    #[serde(rename = "playWithPet")]
    PlayWithPet {},
}

impl InboundMessage {
    /// The literal wire `type` string, used for state-table lookups and
    /// logging — kept in one place so the accepted-type table (spec.md
    /// §4.4) and this list cannot drift apart.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::Authenticate { .. } => "authenticate",
            Self::StepData { .. } => "step_data",
            Self::Ping {} => "ping",
            Self::GetPet {} => "getPet",
            Self::UpdatePet { .. } => "updatePet",
            Self::ClaimResources { .. } => "claimResources",
            Self::FeedPet {} => "feedPet",
            Self::PlayWithPet {} => "playWithPet",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_register() {
        let msg: InboundMessage =
            serde_json::from_str(r#"{"type":"register","deviceId":"d1","publicKey":"0xabcd"}"#).unwrap();
        assert!(matches!(msg, InboundMessage::Register { .. }));
    }

    #[test]
    fn parses_step_data_preserving_raw_samples_text() {
        let msg: InboundMessage = serde_json::from_str(
            r#"{"type":"step_data","deviceId":"d1","stepCount":100,"timestamp":1,"firmwareVersion":1,"batteryPercent":85,"rawAccSamples":[[1.0,2.0,3.0]],"signature":"0xab"}"#,
        )
        .unwrap();
        match msg {
            InboundMessage::StepData { raw_acc_samples, .. } => {
                assert_eq!(raw_acc_samples.get(), "[[1.0,2.0,3.0]]");
            }
            _ => panic!("wrong variant"),
        }
    }

    #[test]
    fn rejects_unknown_type() {
        let result: Result<InboundMessage, _> = serde_json::from_str(r#"{"type":"nonsense"}"#);
        assert!(result.is_err());
    }
}
