//! Resource model and response decoding
//!
//! The remote API wraps every collection in a `data` array of compact records.
//! Only the fields shared by all resource types are modeled.

use crate::domain::Result;
use serde::{Deserialize, Deserializer, Serialize};

/// A generic remote API record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Globally unique identifier
    pub gid: String,

    /// Human-readable name, used to build the output filename
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,

    /// Resource category (project, user, ...)
    #[serde(default, deserialize_with = "null_as_empty")]
    pub resource_type: String,
}

// Explicit `null` decodes like a missing field
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Vec<Resource>>,
}

/// Decodes a `{"data": [...]}` payload, preserving source order
///
/// A missing, `null` or empty `data` array yields no resources.
///
/// # Errors
///
/// Returns [`crate::domain::ExporterError::Decode`] wrapping the JSON error when
/// the payload is malformed.
pub fn decode_resources(payload: &[u8]) -> Result<Vec<Resource>> {
    let envelope: Envelope = serde_json::from_slice(payload)?;
    Ok(envelope.data.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExporterError;

    #[test]
    fn test_decode_preserves_order_and_fields() {
        let payload = r#"{"data":[
            {"gid":"2","name":"Beta","resource_type":"project"},
            {"gid":"1","name":"Alpha / ü","resource_type":"project"},
            {"gid":"3","name":"","resource_type":"project"}
        ]}"#;

        let resources = decode_resources(payload.as_bytes()).unwrap();
        let gids: Vec<&str> = resources.iter().map(|r| r.gid.as_str()).collect();
        assert_eq!(gids, vec!["2", "1", "3"]);
        assert_eq!(resources[1].name, "Alpha / ü");
        assert_eq!(resources[1].resource_type, "project");
    }

    #[test]
    fn test_decode_empty_and_missing_data() {
        assert!(decode_resources(br#"{"data":[]}"#).unwrap().is_empty());
        assert!(decode_resources(br#"{"data":null}"#).unwrap().is_empty());
        assert!(decode_resources(br#"{}"#).unwrap().is_empty());
        assert!(decode_resources(br#"{"errors":[{"message":"Not Found"}]}"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_decode_null_and_missing_fields_as_empty() {
        let payload = br#"{"data":[
            {"gid":"1","name":null,"resource_type":"project"},
            {"gid":"2","name":"Two","resource_type":null},
            {"gid":"3"}
        ]}"#;

        let resources = decode_resources(payload).unwrap();
        assert_eq!(resources.len(), 3);
        assert_eq!(resources[0].name, "");
        assert_eq!(resources[0].resource_type, "project");
        assert_eq!(resources[1].name, "Two");
        assert_eq!(resources[1].resource_type, "");
        assert_eq!(resources[2].name, "");
        assert_eq!(resources[2].resource_type, "");
    }

    #[test]
    fn test_decode_malformed_json() {
        for payload in [
            &b"invalid json"[..],
            &b""[..],
            &br#"{"data":[{"gid":"1""#[..],
            &br#"{"data":"not-an-array"}"#[..],
        ] {
            let err = decode_resources(payload).unwrap_err();
            assert!(matches!(err, ExporterError::Decode(_)), "payload {payload:?}");
        }
    }

    #[test]
    fn test_decode_ignores_unknown_fields() {
        let payload = br#"{"data":[{"gid":"9","name":"X","resource_type":"user","email":"x@example.test"}],"next_page":null}"#;
        let resources = decode_resources(payload).unwrap();
        assert_eq!(
            resources,
            vec![Resource {
                gid: "9".to_string(),
                name: "X".to_string(),
                resource_type: "user".to_string(),
            }]
        );
    }

    #[test]
    fn test_serialize_uses_snake_case_keys() {
        let resource = Resource {
            gid: "1".to_string(),
            name: "Test1".to_string(),
            resource_type: "project".to_string(),
        };
        let json = serde_json::to_string(&resource).unwrap();
        assert_eq!(
            json,
            r#"{"gid":"1","name":"Test1","resource_type":"project"}"#
        );
    }
}
