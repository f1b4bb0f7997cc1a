use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::error::{Error, Result};

/// String key/value storage with local-storage semantics.
#[cfg_attr(test, mockall::automock)]
pub trait PreferenceStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;
}

#[derive(Debug, Default)]
pub struct InMemoryPreferenceStore {
    items: RwLock<HashMap<String, String>>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::Store("preference store lock poisoned".to_string())
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.read().map_err(poisoned)?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items
            .write()
            .map_err(poisoned)?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.write().map_err(poisoned)?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.items.read().map_err(poisoned)?.keys().cloned().collect())
    }
}

/// Keeps every item in one JSON object on disk, rewritten on each change.
/// A change only becomes visible once the file write has succeeded.
#[derive(Debug)]
pub struct JsonFilePreferenceStore {
    path: PathBuf,
    items: RwLock<HashMap<String, String>>,
}

impl JsonFilePreferenceStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let items = match std::fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(err.into()),
        };
        info!(path = %path.display(), entries = items.len(), "preference store opened");
        Ok(Self {
            path,
            items: RwLock::new(items),
        })
    }

    fn persist(&self, items: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(items)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl PreferenceStore for JsonFilePreferenceStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.read().map_err(poisoned)?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let mut items = self.items.write().map_err(poisoned)?;
        let mut next = items.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *items = next;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let mut items = self.items.write().map_err(poisoned)?;
        if !items.contains_key(key) {
            return Ok(());
        }
        let mut next = items.clone();
        next.remove(key);
        self.persist(&next)?;
        *items = next;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.items.read().map_err(poisoned)?.keys().cloned().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PreferenceKind {
    FavoriteJob,
    FavoriteCompany,
    FollowCompany,
}

impl PreferenceKind {
    fn prefix(&self) -> &'static str {
        match self {
            PreferenceKind::FavoriteJob => "favorite_",
            PreferenceKind::FavoriteCompany => "favorite_company_",
            PreferenceKind::FollowCompany => "follow_company_",
        }
    }

    pub fn key(&self, id: &str) -> String {
        format!("{}{}", self.prefix(), id)
    }

    /// The id a storage key belongs to, if the key is of this kind.
    pub fn id_from_key<'a>(&self, key: &'a str) -> Option<&'a str> {
        if *self == PreferenceKind::FavoriteJob
            && key.starts_with(PreferenceKind::FavoriteCompany.prefix())
        {
            return None;
        }
        key.strip_prefix(self.prefix())
    }
}

impl FromStr for PreferenceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "favorite-job" => Ok(PreferenceKind::FavoriteJob),
            "favorite-company" => Ok(PreferenceKind::FavoriteCompany),
            "follow-company" => Ok(PreferenceKind::FollowCompany),
            other => Err(Error::BadRequest(format!(
                "Unknown preference kind: {}",
                other
            ))),
        }
    }
}

#[derive(Clone)]
pub struct PreferenceService {
    store: Arc<dyn PreferenceStore>,
}

impl PreferenceService {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryPreferenceStore::new()))
    }

    /// Only the literal value `"true"` counts as marked.
    pub fn is_marked(&self, kind: PreferenceKind, id: &str) -> Result<bool> {
        Ok(self.store.get_item(&kind.key(id))?.as_deref() == Some("true"))
    }

    pub fn set(&self, kind: PreferenceKind, id: &str, marked: bool) -> Result<()> {
        self.store.set_item(&kind.key(id), if marked { "true" } else { "false" })
    }

    /// Flips the flag and returns its new value.
    #[instrument(skip(self))]
    pub fn toggle(&self, kind: PreferenceKind, id: &str) -> Result<bool> {
        let marked = !self.is_marked(kind, id)?;
        self.set(kind, id, marked)?;
        info!(marked, "preference toggled");
        Ok(marked)
    }

    pub fn marked_ids(&self, kind: PreferenceKind) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for key in self.store.keys()? {
            let Some(id) = kind.id_from_key(&key) else {
                continue;
            };
            if self.store.get_item(&key)?.as_deref() == Some("true") {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Removes every favorite and follow entry.
    pub fn clear_all(&self) -> Result<usize> {
        let keys: Vec<String> = self
            .store
            .keys()?
            .into_iter()
            .filter(|key| key.starts_with("favorite_") || key.starts_with("follow_"))
            .collect();
        for key in &keys {
            self.store.remove_item(key)?;
        }
        Ok(keys.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    #[test]
    fn toggle_writes_flipped_value() {
        let mut store = MockPreferenceStore::new();
        store
            .expect_get_item()
            .with(eq("favorite_PH001"))
            .times(1)
            .returning(|_| Ok(Some("true".to_string())));
        store
            .expect_set_item()
            .with(eq("favorite_PH001"), eq("false"))
            .times(1)
            .returning(|_, _| Ok(()));

        let service = PreferenceService::new(Arc::new(store));
        assert!(!service.toggle(PreferenceKind::FavoriteJob, "PH001").unwrap());
    }

    #[test]
    fn unknown_values_read_as_unmarked() {
        let mut store = MockPreferenceStore::new();
        store
            .expect_get_item()
            .returning(|_| Ok(Some("yes".to_string())));

        let service = PreferenceService::new(Arc::new(store));
        assert!(!service
            .is_marked(PreferenceKind::FollowCompany, "COMPANY_ABC")
            .unwrap());
    }

    #[test]
    fn store_errors_propagate() {
        let mut store = MockPreferenceStore::new();
        store
            .expect_get_item()
            .returning(|_| Err(Error::Store("disk full".into())));

        let service = PreferenceService::new(Arc::new(store));
        assert!(matches!(
            service.toggle(PreferenceKind::FavoriteCompany, "C1"),
            Err(Error::Store(_))
        ));
    }

    #[test]
    fn favorite_job_ids_skip_company_keys() {
        let service = PreferenceService::in_memory();
        service.set(PreferenceKind::FavoriteJob, "PH001", true).unwrap();
        service.set(PreferenceKind::FavoriteJob, "PH002", false).unwrap();
        service
            .set(PreferenceKind::FavoriteCompany, "COMPANY_ABC", true)
            .unwrap();

        assert_eq!(
            service.marked_ids(PreferenceKind::FavoriteJob).unwrap(),
            vec!["PH001".to_string()]
        );
        assert_eq!(
            service.marked_ids(PreferenceKind::FavoriteCompany).unwrap(),
            vec!["COMPANY_ABC".to_string()]
        );
    }
}
