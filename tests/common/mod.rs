#![allow(dead_code)]

use async_trait::async_trait;
use tokio::sync::Semaphore;

use std::{
    collections::VecDeque,
    io,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use neuralnote::{
    chat::{HistoryError, MemoryMessageStore, MessageStore},
    gateway::{AiGateway, GatewayError},
    models::{Note, SortOrder, chat::ChatMessage},
    repository::{MemoryNoteStore, NoteStore, PageSlice, StoreError},
};

/// Memory store seeded with `count` notes named `note 0..count`.
pub async fn seeded_store(count: usize) -> Arc<MemoryNoteStore> {
    let store = Arc::new(MemoryNoteStore::new());
    for i in 0..count {
        store.create(&format!("note {i}"), "tester").await.unwrap();
    }
    store
}

/// Wraps a memory store, counting calls, optionally failing or blocking listings.
pub struct TestStore {
    inner: Arc<MemoryNoteStore>,
    pub calls: AtomicUsize,
    pub fail_listing: AtomicBool,
    gate: Option<Semaphore>,
}

impl TestStore {
    pub fn new(inner: Arc<MemoryNoteStore>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            fail_listing: AtomicBool::new(false),
            gate: None,
        }
    }

    /// Every listing waits for a permit released through [`TestStore::release`].
    pub fn gated(inner: Arc<MemoryNoteStore>) -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new(inner)
        }
    }

    pub fn release(&self, permits: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(permits);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_listing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl NoteStore for TestStore {
    async fn list_page(
        &self,
        offset: usize,
        limit: usize,
        order: SortOrder,
    ) -> Result<PageSlice, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("listing disabled".to_string()));
        }
        self.inner.list_page(offset, limit, order).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Note>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_by_id(id).await
    }

    async fn create(&self, content: &str, owner_id: &str) -> Result<Note, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.create(content, owner_id).await
    }

    async fn update(&self, id: i64, content: &str) -> Result<Option<Note>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.update(id, content).await
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(id).await
    }
}

/// Gateway answering from a queue of scripted results; `Ok("ok")` once the queue is empty.
#[derive(Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<String, GatewayError>>>,
    prompts: Mutex<Vec<String>>,
    gate: Option<Semaphore>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    pub fn reply(self, reply: Result<String, GatewayError>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AiGateway for ScriptedGateway {
    async fn complete(&self, prompt: &str) -> Result<String, GatewayError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("ok".to_string()))
    }
}

/// History store whose writes fail while `failing` is set.
#[derive(Default)]
pub struct FlakyHistory {
    inner: MemoryMessageStore,
    failing: AtomicBool,
}

impl FlakyHistory {
    pub fn failing() -> Self {
        Self {
            failing: AtomicBool::new(true),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn persisted(&self) -> Option<Vec<ChatMessage>> {
        self.inner.persisted()
    }
}

#[async_trait]
impl MessageStore for FlakyHistory {
    async fn load(&self) -> Result<Vec<ChatMessage>, HistoryError> {
        self.inner.load().await
    }

    async fn save(&self, messages: &[ChatMessage]) -> Result<(), HistoryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(io::Error::other("disk full").into());
        }
        self.inner.save(messages).await
    }

    async fn clear(&self) -> Result<(), HistoryError> {
        self.inner.clear().await
    }
}
