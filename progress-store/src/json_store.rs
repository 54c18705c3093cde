use crate::ProgressError;
use crate::ProgressStore;
use crate::normalize_slug;
use async_trait::async_trait;
use log::debug;
use log::info;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;

/// Completion set kept in memory, optionally mirrored to a JSON file.
///
/// The file is rewritten (temp file, then rename) after every new
/// completion; repeated completions do not touch the disk.
pub struct JsonProgressStore {
    state: Mutex<ProgressState>,
    path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ProgressState {
    #[serde(default)]
    completed: BTreeMap<String, BTreeSet<String>>,
}

impl JsonProgressStore {
    /// Store that forgets everything on restart.
    pub fn in_memory() -> Self {
        Self {
            state: Mutex::new(ProgressState::default()),
            path: None,
        }
    }

    /// Open a store backed by `path`, loading existing records if the file exists.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, ProgressError> {
        let path = path.into();
        let state = match fs::read(&path).await {
            Ok(data) => serde_json::from_slice::<ProgressState>(&data)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => ProgressState::default(),
            Err(err) => return Err(err.into()),
        };
        let records: usize = state.completed.values().map(BTreeSet::len).sum();
        info!(
            "Loaded {records} completion records from {}",
            path.display()
        );
        Ok(Self {
            state: Mutex::new(state),
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn validate<'a>(user_id: &str, slug: &'a str) -> Result<&'a str, ProgressError> {
    if user_id.trim().is_empty() {
        return Err(ProgressError::InvalidUser);
    }
    normalize_slug(slug).ok_or_else(|| ProgressError::InvalidSlug(slug.to_string()))
}

async fn persist(path: &Path, state: &ProgressState) -> Result<(), ProgressError> {
    let data = serde_json::to_vec_pretty(state)?;
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, &data).await?;
    fs::rename(&tmp_path, path).await?;
    Ok(())
}

#[async_trait]
impl ProgressStore for JsonProgressStore {
    async fn is_completed(&self, user_id: &str, slug: &str) -> Result<bool, ProgressError> {
        let slug = validate(user_id, slug)?;
        let guard = self.state.lock().await;
        Ok(guard
            .completed
            .get(user_id)
            .is_some_and(|slugs| slugs.contains(slug)))
    }

    async fn mark_completed(&self, user_id: &str, slug: &str) -> Result<(), ProgressError> {
        let slug = validate(user_id, slug)?;
        let mut guard = self.state.lock().await;
        let inserted = guard
            .completed
            .entry(user_id.to_string())
            .or_default()
            .insert(slug.to_string());
        if !inserted {
            return Ok(());
        }

        debug!("Marked {slug} completed");
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        if let Err(err) = persist(path, &guard).await {
            // keep memory consistent with disk
            if let Some(slugs) = guard.completed.get_mut(user_id) {
                slugs.remove(slug);
                if slugs.is_empty() {
                    guard.completed.remove(user_id);
                }
            }
            return Err(err);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), ProgressError> {
        let _guard = self.state.lock().await;
        let Some(parent) = self.path.as_deref().and_then(Path::parent) else {
            return Ok(());
        };
        if parent.as_os_str().is_empty() {
            return Ok(());
        }
        match fs::metadata(parent).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(ProgressError::Unavailable(format!(
                "{} is not a directory",
                parent.display()
            ))),
            Err(err) => Err(ProgressError::Unavailable(err.to_string())),
        }
    }
}
