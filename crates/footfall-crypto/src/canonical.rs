//! Deterministic byte-serialization of the signed submission fields.
//!
//! The signed object is `{batteryPercent, deviceId, firmwareVersion,
//! rawAccSamples, stepCount, timestamp}`, keys sorted lexicographically,
//! compact JSON, no insignificant whitespace (spec.md §6).
//!
//! `rawAccSamples` is never re-derived from parsed floats: the caller
//! passes the exact compact JSON text the device put on the wire for that
//! sub-array, and it is spliced into the canonical object verbatim. This
//! resolves spec.md §9's open question on numeric form in the direction
//! the spec itself prefers — verify over the raw bytes, not a
//! re-serialized float — so the verifier can never disagree with the
//! device about how a float should print.

/// The six fields that make up a submission's signed object.
pub struct SigningFields<'a> {
    pub device_id: &'a str,
    pub step_count: i64,
    pub timestamp_ms: i64,
    pub firmware_version: i64,
    pub battery_percent: i64,
    /// Exact compact JSON text of the `rawAccSamples` array as received.
    pub raw_acc_samples_json: &'a str,
}

/// Build the canonical signing bytes for a submission.
///
/// Key order is fixed and alphabetical: `batteryPercent`, `deviceId`,
/// `firmwareVersion`, `rawAccSamples`, `stepCount`, `timestamp`.
pub fn canonicalize(fields: &SigningFields<'_>) -> Vec<u8> {
    let device_id_json =
        serde_json::to_string(fields.device_id).expect("string serialization is infallible");
    let samples = fields.raw_acc_samples_json.trim();

    format!(
        r#"{{"batteryPercent":{},"deviceId":{},"firmwareVersion":{},"rawAccSamples":{},"stepCount":{},"timestamp":{}}}"#,
        fields.battery_percent,
        device_id_json,
        fields.firmware_version,
        samples,
        fields.step_count,
        fields.timestamp_ms,
    )
    .into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form_is_sorted_and_compact() {
        let fields = SigningFields {
            device_id: "d1",
            step_count: 100,
            timestamp_ms: 1_700_000_000_000,
            firmware_version: 100,
            battery_percent: 85,
            raw_acc_samples_json: "[[1.0,2.0,3.0]]",
        };
        let bytes = canonicalize(&fields);
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(
            text,
            r#"{"batteryPercent":85,"deviceId":"d1","firmwareVersion":100,"rawAccSamples":[[1.0,2.0,3.0]],"stepCount":100,"timestamp":1700000000000}"#
        );
    }

    #[test]
    fn canonical_form_is_deterministic_across_calls() {
        let fields = SigningFields {
            device_id: "d2",
            step_count: 50,
            timestamp_ms: 42,
            firmware_version: 3,
            battery_percent: 10,
            raw_acc_samples_json: "[]",
        };
        assert_eq!(canonicalize(&fields), canonicalize(&fields));
    }

    #[test]
    fn device_id_is_escaped_safely() {
        let fields = SigningFields {
            device_id: "weird\"id",
            step_count: 1,
            timestamp_ms: 1,
            firmware_version: 1,
            battery_percent: 1,
            raw_acc_samples_json: "[]",
        };
        let text = String::from_utf8(canonicalize(&fields)).unwrap();
        assert!(text.contains(r#""deviceId":"weird\"id""#));
    }
}
