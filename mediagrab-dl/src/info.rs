//! Metadata returned by the extractor.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Sanitized info dict returned by `extract_info`.
///
/// Kept as a raw JSON object because extractors report arbitrary fields;
/// accessors cover the fields the download pipeline relies on.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaInfo(pub Map<String, Value>);

impl MediaInfo {
    /// Look up a raw field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// Look up a string field.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Video identifier
    pub fn id(&self) -> Option<&str> {
        self.get_str("id")
    }

    /// Video title
    pub fn title(&self) -> Option<&str> {
        self.get_str("title")
    }

    /// Full name of the uploader
    pub fn uploader(&self) -> Option<&str> {
        self.get_str("uploader")
    }

    /// Extractor name (e.g., "Youtube")
    pub fn extractor_key(&self) -> Option<&str> {
        self.get_str("extractor_key")
    }

    /// Length in seconds
    pub fn duration(&self) -> Option<f64> {
        self.get("duration").and_then(Value::as_f64)
    }

    /// `filepath` of the first entry in `requested_downloads`.
    pub fn requested_filepath(&self) -> Option<PathBuf> {
        self.get("requested_downloads")?
            .as_array()?
            .first()?
            .get("filepath")?
            .as_str()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
    }

    /// Internal `_filename` field, falling back to `filename`.
    pub fn reported_filename(&self) -> Option<PathBuf> {
        ["_filename", "filename"]
            .iter()
            .find_map(|key| self.get_str(key).filter(|s| !s.is_empty()))
            .map(PathBuf::from)
    }
}

impl From<Map<String, Value>> for MediaInfo {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info(value: Value) -> MediaInfo {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn typed_accessors() {
        let info = info(json!({
            "id": "jNQXAC9IVRw",
            "title": "Me at the zoo",
            "uploader": "jawed",
            "extractor_key": "Youtube",
            "duration": 19,
        }));

        assert_eq!(info.id(), Some("jNQXAC9IVRw"));
        assert_eq!(info.title(), Some("Me at the zoo"));
        assert_eq!(info.uploader(), Some("jawed"));
        assert_eq!(info.extractor_key(), Some("Youtube"));
        assert_eq!(info.duration(), Some(19.0));
    }

    #[test]
    fn null_fields_are_absent() {
        let info = info(json!({ "title": null }));
        assert_eq!(info.title(), None);
    }

    #[test]
    fn requested_filepath_uses_first_entry() {
        let info = info(json!({
            "requested_downloads": [
                { "filepath": "/tmp/a.mkv" },
                { "filepath": "/tmp/b.mkv" },
            ]
        }));

        assert_eq!(info.requested_filepath(), Some(PathBuf::from("/tmp/a.mkv")));
    }

    #[test]
    fn requested_filepath_missing() {
        assert_eq!(info(json!({ "requested_downloads": [] })).requested_filepath(), None);
        assert_eq!(info(json!({ "requested_downloads": [{}] })).requested_filepath(), None);
        assert_eq!(info(json!({})).requested_filepath(), None);
    }

    #[test]
    fn reported_filename_prefers_internal_field() {
        let both = info(json!({ "_filename": "/tmp/a.webm", "filename": "/tmp/b.webm" }));
        assert_eq!(both.reported_filename(), Some(PathBuf::from("/tmp/a.webm")));

        let public = info(json!({ "filename": "/tmp/b.webm" }));
        assert_eq!(public.reported_filename(), Some(PathBuf::from("/tmp/b.webm")));
    }
}
