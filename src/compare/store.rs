//! Per-branch persistence of the chosen compare-with target.
//!
//! All branches share one mapping stored under a single workspace-state key.
//! Every save re-reads the latest mapping before writing it back, so saves for
//! different branches never clobber each other. Two saves for the *same*
//! branch racing each other are last-writer-wins.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{AppError, Result};
use crate::models::{ComparisonMode, ComparisonTarget, RangeNotation};

pub const COMPARISONS_KEY: &str = "branch-comparisons";

/// Key/value state that outlives the process.
#[async_trait]
pub trait WorkspaceState: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Replace the value under `key`; `None` removes it.
    async fn update(&self, key: &str, value: Option<serde_json::Value>) -> Result<()>;
}

/// Stored value for one branch. Older state files hold a bare ref string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
enum StoredComparison {
    Legacy(String),
    Target(StoredTarget),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct StoredTarget {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notation: Option<RangeNotation>,
    #[serde(rename = "type", alias = "mode", default, skip_serializing_if = "Option::is_none")]
    mode: Option<ComparisonMode>,
}

impl StoredComparison {
    fn into_target(self, default_mode: ComparisonMode) -> ComparisonTarget {
        match self {
            StoredComparison::Legacy(reference) => ComparisonTarget {
                reference,
                notation: None,
                mode: default_mode,
            },
            StoredComparison::Target(stored) => ComparisonTarget {
                reference: stored.reference,
                notation: stored.notation,
                mode: stored.mode.unwrap_or(default_mode),
            },
        }
    }

    fn from_target(target: &ComparisonTarget) -> Self {
        StoredComparison::Target(StoredTarget {
            reference: target.reference.clone(),
            notation: target.notation,
            mode: Some(target.mode),
        })
    }
}

type StoredComparisons = BTreeMap<String, serde_json::Value>;

#[derive(Clone)]
pub struct ComparisonStateStore {
    state: Arc<dyn WorkspaceState>,
}

impl ComparisonStateStore {
    pub fn new(state: Arc<dyn WorkspaceState>) -> Self {
        Self { state }
    }

    async fn read_all(&self) -> Result<StoredComparisons> {
        match self.state.get(COMPARISONS_KEY).await? {
            Some(serde_json::Value::Object(map)) => Ok(map.into_iter().collect()),
            Some(serde_json::Value::Null) | None => Ok(StoredComparisons::new()),
            Some(other) => {
                tracing::warn!("Ignoring malformed comparison state: {}", other);
                Ok(StoredComparisons::new())
            }
        }
    }

    /// Stored target for `identity`; legacy entries take `default_mode`.
    pub async fn load(&self, identity: &str, default_mode: ComparisonMode) -> Result<Option<ComparisonTarget>> {
        let mut all = self.read_all().await?;
        let Some(raw) = all.remove(identity) else {
            return Ok(None);
        };

        match serde_json::from_value::<StoredComparison>(raw) {
            Ok(stored) => Ok(Some(stored.into_target(default_mode))),
            Err(e) => {
                tracing::warn!("Unreadable comparison for {}: {}", identity, e);
                Ok(None)
            }
        }
    }

    pub async fn save(&self, identity: &str, target: Option<&ComparisonTarget>) -> Result<()> {
        let mut all = self.read_all().await?;

        match target {
            Some(target) => {
                let value = serde_json::to_value(StoredComparison::from_target(target))?;
                all.insert(identity.to_string(), value);
            }
            None => {
                all.remove(identity);
            }
        }

        let value = serde_json::to_value(&all)?;
        self.state.update(COMPARISONS_KEY, Some(value)).await?;
        tracing::debug!("Saved comparison for {}: {:?}", identity, target.map(|t| &t.reference));
        Ok(())
    }
}

/// Workspace state kept in one JSON object file.
pub struct JsonFileState {
    path: PathBuf,
}

impl JsonFileState {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> Result<serde_json::Map<String, serde_json::Value>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(serde_json::Map::new()),
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(serde_json::Map::new());
        }
        match serde_json::from_str(&contents)? {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(AppError::Persistence(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }
}

#[async_trait]
impl WorkspaceState for JsonFileState {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let mut map = self.read_file().await?;
        Ok(map.remove(key))
    }

    async fn update(&self, key: &str, value: Option<serde_json::Value>) -> Result<()> {
        let mut map = self.read_file().await?;
        match value {
            Some(v) => {
                map.insert(key.to_string(), v);
            }
            None => {
                map.remove(key);
            }
        }

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write to a sibling temp file and rename so readers never see half a file
        let tmp = self.path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(&serde_json::Value::Object(map))?;
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Process-local workspace state (`--ephemeral`, tests).
#[derive(Default)]
pub struct MemoryState {
    values: Mutex<HashMap<String, serde_json::Value>>,
    writes: AtomicUsize,
}

impl MemoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `update` calls so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WorkspaceState for MemoryState {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let values = self.values.lock().map_err(|_| AppError::Internal("Lock poisoned".to_string()))?;
        Ok(values.get(key).cloned())
    }

    async fn update(&self, key: &str, value: Option<serde_json::Value>) -> Result<()> {
        let mut values = self.values.lock().map_err(|_| AppError::Internal("Lock poisoned".to_string()))?;
        match value {
            Some(v) => {
                values.insert(key.to_string(), v);
            }
            None => {
                values.remove(key);
            }
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_with(state: Arc<MemoryState>) -> ComparisonStateStore {
        ComparisonStateStore::new(state)
    }

    const DEFAULT: ComparisonMode = ComparisonMode::Branch;

    #[tokio::test]
    async fn missing_identity_loads_none() {
        let store = store_with(Arc::new(MemoryState::new()));
        assert_eq!(store.load("repo|heads/main", DEFAULT).await.unwrap(), None);
    }

    #[tokio::test]
    async fn legacy_string_loads_with_default_mode() {
        let state = Arc::new(MemoryState::new());
        state
            .update(COMPARISONS_KEY, Some(json!({ "repo|heads/feature": "main" })))
            .await
            .unwrap();

        let store = store_with(state);
        let target = store.load("repo|heads/feature", DEFAULT).await.unwrap().unwrap();
        assert_eq!(
            target,
            ComparisonTarget {
                reference: "main".to_string(),
                notation: None,
                mode: ComparisonMode::Branch,
            }
        );
    }

    #[tokio::test]
    async fn structured_entry_keeps_its_mode() {
        let state = Arc::new(MemoryState::new());
        state
            .update(
                COMPARISONS_KEY,
                Some(json!({ "id": { "ref": "v1.0", "notation": "...", "type": "tag" } })),
            )
            .await
            .unwrap();

        let target = store_with(state).load("id", DEFAULT).await.unwrap().unwrap();
        assert_eq!(target.reference, "v1.0");
        assert_eq!(target.notation, Some(RangeNotation::ThreeDot));
        assert_eq!(target.mode, ComparisonMode::Tag);
    }

    #[tokio::test]
    async fn save_preserves_other_branches() {
        let state = Arc::new(MemoryState::new());
        let store = store_with(state.clone());

        store
            .save("a", Some(&ComparisonTarget::new("main", ComparisonMode::Branch)))
            .await
            .unwrap();
        store
            .save("b", Some(&ComparisonTarget::new("develop", ComparisonMode::Working)))
            .await
            .unwrap();

        assert_eq!(store.load("a", DEFAULT).await.unwrap().unwrap().reference, "main");
        assert_eq!(store.load("b", DEFAULT).await.unwrap().unwrap().reference, "develop");

        store.save("a", None).await.unwrap();
        assert_eq!(store.load("a", DEFAULT).await.unwrap(), None);
        assert!(store.load("b", DEFAULT).await.unwrap().is_some());
        assert_eq!(state.writes(), 3);
    }

    #[tokio::test]
    async fn saved_copy_is_independent_of_caller() {
        let store = store_with(Arc::new(MemoryState::new()));
        let mut target = ComparisonTarget::new("main", ComparisonMode::Branch);
        store.save("a", Some(&target)).await.unwrap();

        target.reference = "changed".to_string();
        assert_eq!(store.load("a", DEFAULT).await.unwrap().unwrap().reference, "main");
    }

    #[tokio::test]
    async fn json_file_state_round_trips_through_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let store = ComparisonStateStore::new(Arc::new(JsonFileState::new(&path)));
        store
            .save("repo|heads/main+current", Some(&ComparisonTarget::new("origin/main", ComparisonMode::Branch)))
            .await
            .unwrap();

        // A fresh store over the same file sees the entry
        let reopened = ComparisonStateStore::new(Arc::new(JsonFileState::new(&path)));
        let target = reopened.load("repo|heads/main+current", DEFAULT).await.unwrap().unwrap();
        assert_eq!(target.reference, "origin/main");
        assert_eq!(target.mode, ComparisonMode::Branch);

        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[COMPARISONS_KEY]["repo|heads/main+current"]["type"], "branch");
    }

    #[tokio::test]
    async fn corrupt_file_is_a_persistence_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "not json").unwrap();

        let state = JsonFileState::new(&path);
        assert!(matches!(state.get(COMPARISONS_KEY).await, Err(AppError::Persistence(_))));
    }
}
