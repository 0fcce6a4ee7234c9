//! Request/response envelope for one conversational turn, plus the chip
//! policy. Chips are derived from the message kind alone; handler content
//! never influences them.

use serde::{Deserialize, Serialize};

use crate::{ConversationState, GroundedState, RestaurantCard};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Structured UI actions that arrive instead of free text (chip taps).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiAction {
    ShowMore,
    ShowMoreRestaurant { restaurant_id: i64 },
    EnterRestaurant { restaurant_id: i64 },
    ExitRestaurant,
}

/// Closed set of assistant message kinds. Deterministically controls the
/// follow-up chips offered under the message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Results,
    Answer,
    RestaurantProfile,
    Clarify,
    NoResults,
    Menu,
    Error,
}

/// Chips allowed for a message kind. Pure function of the kind.
pub fn chips_for(kind: MessageKind) -> Vec<String> {
    let chips: &[&str] = match kind {
        MessageKind::Results => &["Show more", "Is it spicy?", "Only vegan"],
        MessageKind::Answer => &["Show the results again", "New search"],
        MessageKind::RestaurantProfile => &["Ask about this restaurant", "Show the menu"],
        MessageKind::Clarify => &[],
        MessageKind::NoResults => &["Try without filters", "Search another city"],
        MessageKind::Menu => &["Show more", "Back to all restaurants"],
        MessageKind::Error => &["Try again"],
    };
    chips.iter().map(|c| (*c).to_string()).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantMessage {
    pub role: Role,
    pub content: String,
    pub kind: MessageKind,
    #[serde(default)]
    pub restaurants: Vec<RestaurantCard>,
    #[serde(default)]
    pub followup_chips: Vec<String>,
}

impl AssistantMessage {
    pub fn new(kind: MessageKind, content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            kind,
            restaurants: Vec::new(),
            followup_chips: chips_for(kind),
        }
    }

    pub fn with_restaurants(mut self, restaurants: Vec<RestaurantCard>) -> Self {
        self.restaurants = restaurants;
        self
    }
}

/// Diagnostics surfaced alongside the message; the trace is also logged
/// once at request completion.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ladder_step: Option<char>,
    #[serde(default)]
    pub was_tag_filtered: bool,
    #[serde(default)]
    pub elapsed_ms: u64,
    #[serde(default)]
    pub trace: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub state: ConversationState,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ui_action: Option<UiAction>,
}

impl ChatRequest {
    /// Latest user utterance, empty string when the transcript has none.
    pub fn latest_user_text(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }

    /// Most recent assistant message, if any (override rules inspect it).
    pub fn last_assistant_text(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    pub message: AssistantMessage,
    pub state: ConversationState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grounded: Option<GroundedState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}
