//! In-memory request store, newest first

use common::model::CapturedRequest;
use common::platform::EXPORT_FILE_NAME;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::CaptureError;

/// Ordered captured requests plus an independent selection.
///
/// Ordering is by insertion, not timestamp. The selection is kept as an
/// id and resolved on read, so a selection that no longer matches a
/// record reads as "nothing selected".
#[derive(Debug, Default)]
pub struct RequestStore {
    records: VecDeque<CapturedRequest>,
    selected: Option<String>,
}

impl RequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepends a record. A duplicate id is rejected and returns false.
    pub fn append(&mut self, request: CapturedRequest) -> bool {
        if self.contains(&request.id) {
            warn!("Ignoring request with duplicate id {}", request.id);
            return false;
        }
        self.records.push_front(request);
        true
    }

    /// Empties the list and the selection
    pub fn clear(&mut self) {
        self.records.clear();
        self.selected = None;
    }

    /// Selects `id` if present; an unknown id leaves the selection as is
    pub fn select(&mut self, id: &str) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.selected = Some(id.to_string());
        true
    }

    pub fn selected(&self) -> Option<&CapturedRequest> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    pub fn get(&self, id: &str) -> Option<&CapturedRequest> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Index of `id` in newest-first order
    pub fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    /// Index of the selected record, if it is still present
    pub fn selected_position(&self) -> Option<usize> {
        self.selected.as_deref().and_then(|id| self.position(id))
    }

    pub fn records(&self) -> impl Iterator<Item = &CapturedRequest> {
        self.records.iter()
    }

    pub fn at(&self, index: usize) -> Option<&CapturedRequest> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The whole list as pretty JSON (two-space indent), newest first
    pub fn export_json(&self) -> Result<String, CaptureError> {
        serde_json::to_string_pretty(&self.records).map_err(CaptureError::Serialize)
    }

    /// Writes the export into `dir`, creating it if needed
    pub fn export_to(&self, dir: &Path) -> Result<PathBuf, CaptureError> {
        let json = self.export_json()?;
        let path = dir.join(EXPORT_FILE_NAME);

        std::fs::create_dir_all(dir)
            .and_then(|_| std::fs::write(&path, json))
            .map_err(|source| CaptureError::Export {
                path: path.clone(),
                source,
            })?;

        info!("Exported {} requests to {:?}", self.records.len(), path);
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn request(id: &str, method: &str, path: &str) -> CapturedRequest {
        CapturedRequest::new(method, path).with_id(id)
    }

    #[test]
    fn test_append_is_newest_first() {
        let mut store = RequestStore::new();
        for i in 0..5 {
            store.append(request(&i.to_string(), "POST", "/hook"));
            assert_eq!(store.at(0).unwrap().id, i.to_string());
        }
        let ids: Vec<_> = store.records().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["4", "3", "2", "1", "0"]);
    }

    #[test]
    fn test_append_rejects_duplicate_id() {
        let mut store = RequestStore::new();
        assert!(store.append(request("1", "POST", "/a")));
        assert!(!store.append(request("1", "GET", "/b")));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("1").unwrap().path, "/a");
    }

    #[test]
    fn test_clear_resets_list_and_selection() {
        let mut store = RequestStore::new();
        store.append(request("1", "POST", "/a"));
        store.append(request("2", "POST", "/b"));
        store.select("1");

        store.clear();
        assert!(store.is_empty());
        assert!(store.selected().is_none());

        // A later record with the old id must not resurrect the selection
        store.append(request("1", "POST", "/c"));
        assert!(store.selected().is_none());
    }

    #[test]
    fn test_select_unknown_id_is_noop() {
        let mut store = RequestStore::new();
        assert!(!store.select("missing"));
        assert!(store.selected().is_none());

        store.append(request("1", "POST", "/a"));
        store.select("1");
        assert!(!store.select("missing"));
        assert_eq!(store.selected().unwrap().id, "1");
        assert_eq!(store.selected_position(), Some(0));
    }

    #[test]
    fn test_export_round_trip() {
        let mut store = RequestStore::new();
        store.append(request("1", "POST", "/webhook").with_body(json!({"a": 1})));
        store.append(request("2", "GET", "/status").with_body(json!([1, "two", null])));

        let json = store.export_json().unwrap();
        let parsed: Vec<CapturedRequest> = serde_json::from_str(&json).unwrap();
        let current: Vec<CapturedRequest> = store.records().cloned().collect();
        assert_eq!(parsed, current);
        assert!(json.contains("\n  {\n    \"id\": \"2\""));
    }

    #[test]
    fn test_export_of_empty_store() {
        let store = RequestStore::new();
        assert_eq!(store.export_json().unwrap(), "[]");
    }

    #[test]
    fn test_export_to_writes_named_file() {
        let temp = TempDir::new().unwrap();
        let mut store = RequestStore::new();
        store.append(request("1", "POST", "/webhook"));

        let dir = temp.path().join("nested");
        let path = store.export_to(&dir).unwrap();
        assert_eq!(path, dir.join("webhook-requests.json"));

        let written = std::fs::read_to_string(path).unwrap();
        assert_eq!(written, store.export_json().unwrap());
    }
}
