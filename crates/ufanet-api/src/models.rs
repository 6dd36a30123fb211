// Portal response types
//
// Shapes returned by the `skud/shared` endpoints. Fields use
// `#[serde(default)]` because the portal omits optional keys instead of
// sending nulls (and sometimes sends nulls anyway).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// Display name used when the portal does not provide one.
pub const UNKNOWN_DOORPHONE_NAME: &str = "Unknown Doorphone";

// ── DoorphoneId ─────────────────────────────────────────────────────

/// Server-assigned doorphone identifier.
///
/// The portal sends numeric ids, but nothing promises it always will.
/// Both JSON numbers and strings are accepted and canonicalised to their
/// textual form, so `42` and `"42"` name the same doorphone (they also
/// produce the same open URL).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct DoorphoneId(String);

impl DoorphoneId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DoorphoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DoorphoneId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<u64> for DoorphoneId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for DoorphoneId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DoorphoneId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl<'de> Deserialize<'de> for DoorphoneId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Unsigned(u64),
            Signed(i64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Unsigned(n) => Self(n.to_string()),
            Raw::Signed(n) => Self(n.to_string()),
            Raw::Text(s) => Self(s),
        })
    }
}

// ── Doorphone ───────────────────────────────────────────────────────

/// One entry of `GET /api/v0/skud/shared`.
///
/// Only `id` is guaranteed. `string_view` is the human-readable address
/// label shown in the portal; everything else lands in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doorphone {
    pub id: DoorphoneId,
    #[serde(default)]
    pub string_view: Option<String>,
    /// Catch-all for undocumented fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Doorphone {
    /// Descriptor with just an id and optional label (tests, manual use).
    pub fn new(id: impl Into<DoorphoneId>, string_view: Option<String>) -> Self {
        Self {
            id: id.into(),
            string_view,
            extra: serde_json::Map::new(),
        }
    }

    /// The portal label, or [`UNKNOWN_DOORPHONE_NAME`] when absent.
    pub fn display_name(&self) -> &str {
        self.string_view.as_deref().unwrap_or(UNKNOWN_DOORPHONE_NAME)
    }
}

// ── Open ────────────────────────────────────────────────────────────

/// Body of `GET /api/v0/skud/shared/{id}/open/`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct OpenResponse {
    /// Missing or `null` means the portal did not confirm the open.
    #[serde(default)]
    pub result: Option<bool>,
}

impl OpenResponse {
    pub(crate) fn opened(&self) -> bool {
        self.result.unwrap_or(false)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn numeric_and_string_ids_are_equal() {
        let a: DoorphoneId = serde_json::from_value(json!(42)).unwrap();
        let b: DoorphoneId = serde_json::from_value(json!("42")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "42");
    }

    #[test]
    fn doorphone_keeps_unknown_fields() {
        let d: Doorphone = serde_json::from_value(json!({
            "id": 7,
            "string_view": "Entrance 2",
            "camera": {"rtsp": "rtsp://example"}
        }))
        .unwrap();
        assert_eq!(d.id, DoorphoneId::from(7_u64));
        assert_eq!(d.display_name(), "Entrance 2");
        assert!(d.extra.contains_key("camera"));
    }

    #[test]
    fn missing_or_null_name_uses_placeholder() {
        let missing: Doorphone = serde_json::from_value(json!({"id": 1})).unwrap();
        let null: Doorphone =
            serde_json::from_value(json!({"id": 2, "string_view": null})).unwrap();
        assert_eq!(missing.display_name(), UNKNOWN_DOORPHONE_NAME);
        assert_eq!(null.display_name(), UNKNOWN_DOORPHONE_NAME);
    }

    #[test]
    fn open_result_defaults_to_false() {
        let empty: OpenResponse = serde_json::from_value(json!({})).unwrap();
        let null: OpenResponse = serde_json::from_value(json!({"result": null})).unwrap();
        let yes: OpenResponse = serde_json::from_value(json!({"result": true})).unwrap();
        assert!(!empty.opened());
        assert!(!null.opened());
        assert!(yes.opened());
    }
}
