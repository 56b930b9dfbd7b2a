use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Sender {
    User,
    Assistant,
    SystemDeveloper,
}

impl Sender {
    /// Role name used on the completion API.
    #[must_use]
    pub const fn role(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::SystemDeveloper => "developer",
        }
    }
}

/// Lifecycle of a single message. Only assistant placeholders are ever `Pending`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MessageState {
    Pending,
    #[default]
    Resolved,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub state: MessageState,
}

impl ChatMessage {
    fn new(sender: Sender, content: String, state: MessageState) -> Self {
        Self {
            id: Uuid::new_v4(),
            content,
            sender,
            timestamp: Utc::now(),
            state,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Sender::User, content.into(), MessageState::Resolved)
    }

    #[must_use]
    pub fn placeholder() -> Self {
        Self::new(Sender::Assistant, String::new(), MessageState::Pending)
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.state, MessageState::Pending)
    }

    /// Settles a pending placeholder in place.
    pub fn settle(&mut self, state: MessageState, content: String) {
        self.state = state;
        self.content = content;
        self.timestamp = Utc::now();
    }
}
