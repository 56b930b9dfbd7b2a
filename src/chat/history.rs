use async_trait::async_trait;
use tokio::fs;

use std::{
    io,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use crate::models::chat::ChatMessage;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("Chat history I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("Chat history is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

/// Durable home of one conversation. Always read and written as a whole.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn load(&self) -> Result<Vec<ChatMessage>, HistoryError>;

    async fn save(&self, messages: &[ChatMessage]) -> Result<(), HistoryError>;

    /// Erases the persisted copy. Erasing an absent copy is not an error.
    async fn clear(&self) -> Result<(), HistoryError>;
}

/// Conversation kept in a single JSON file.
pub struct FileMessageStore {
    path: PathBuf,
}

impl FileMessageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MessageStore for FileMessageStore {
    async fn load(&self) -> Result<Vec<ChatMessage>, HistoryError> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, messages: &[ChatMessage]) -> Result<(), HistoryError> {
        let bytes = serde_json::to_vec(messages)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        // Swap in a complete file so a crash mid-write leaves the old copy intact.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, &self.path).await?;

        Ok(())
    }

    async fn clear(&self) -> Result<(), HistoryError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Conversation kept for the lifetime of the process only.
#[derive(Default)]
pub struct MemoryMessageStore {
    saved: Mutex<Option<Vec<ChatMessage>>>,
}

impl MemoryMessageStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The persisted copy, or `None` when nothing is stored.
    #[must_use]
    pub fn persisted(&self) -> Option<Vec<ChatMessage>> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn load(&self) -> Result<Vec<ChatMessage>, HistoryError> {
        Ok(self.persisted().unwrap_or_default())
    }

    async fn save(&self, messages: &[ChatMessage]) -> Result<(), HistoryError> {
        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = Some(messages.to_vec());
        Ok(())
    }

    async fn clear(&self) -> Result<(), HistoryError> {
        *self.saved.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_store_round_trips_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileMessageStore::new(dir.path().join("nested").join("chat.json"));

        assert!(store.load().await.unwrap().is_empty());

        let messages = vec![ChatMessage::user("hello")];
        store.save(&messages).await.unwrap();
        assert_eq!(store.load().await.unwrap(), messages);

        store.clear().await.unwrap();
        assert!(!store.path().exists());
        store.clear().await.unwrap();
    }
}
