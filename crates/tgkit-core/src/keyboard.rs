//! Per-chat inline keyboard layout.
//!
//! `KeyboardManager` owns one `ChatKeyboardState` per chat. Buttons are appended
//! to a pending list and laid out into rows of at most `max_columns` buttons the
//! first time the grid is requested. All access goes through a single manager
//! lock, so handlers running concurrently for the same chat never interleave a
//! read-modify-write.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{domain::ChatId, errors::Error, Result};

pub const DEFAULT_MAX_COLUMNS: usize = 3;

/// Row-major button grid, as embedded in `reply_markup.inline_keyboard`.
pub type KeyboardGrid = Vec<Vec<Button>>;

/// One inline keyboard button: a label and the opaque token sent back on press.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    #[serde(rename = "text")]
    label: String,
    callback_data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            callback_data: callback_data.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn callback_data(&self) -> &str {
        &self.callback_data
    }
}

/// Group `buttons` into rows of `max_columns`, in insertion order.
///
/// The last row may be shorter. No empty trailing row is ever produced.
pub fn paginate(buttons: &[Button], max_columns: usize) -> Result<KeyboardGrid> {
    if max_columns < 1 {
        return Err(Error::InvalidArgument(format!(
            "max_columns must be at least 1, got {max_columns}"
        )));
    }
    Ok(buttons.chunks(max_columns).map(<[Button]>::to_vec).collect())
}

#[derive(Debug)]
struct ChatKeyboardState {
    max_columns: usize,
    pending: Vec<Button>,
    rows: KeyboardGrid,
}

impl ChatKeyboardState {
    fn new(max_columns: usize) -> Self {
        Self {
            max_columns,
            pending: Vec::new(),
            rows: Vec::new(),
        }
    }

    fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.rows.iter().all(Vec::is_empty)
    }

    /// Fold pending buttons into the grid. A grid with nothing pending is returned as is.
    fn layout(&mut self) -> Result<&KeyboardGrid> {
        if self.pending.is_empty() {
            return Ok(&self.rows);
        }

        let all: Vec<Button> = self
            .rows
            .iter()
            .flatten()
            .chain(self.pending.iter())
            .cloned()
            .collect();
        self.rows = paginate(&all, self.max_columns)?;
        self.pending.clear();
        Ok(&self.rows)
    }
}

/// Multi-tenant store: chat identity -> keyboard state.
#[derive(Debug)]
pub struct KeyboardManager {
    default_columns: usize,
    chats: Mutex<HashMap<ChatId, ChatKeyboardState>>,
}

impl Default for KeyboardManager {
    fn default() -> Self {
        Self {
            default_columns: DEFAULT_MAX_COLUMNS,
            chats: Mutex::new(HashMap::new()),
        }
    }
}

impl KeyboardManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_columns(default_columns: usize) -> Result<Self> {
        validate_columns(default_columns)?;
        Ok(Self {
            default_columns,
            ..Self::default()
        })
    }

    pub fn default_columns(&self) -> usize {
        self.default_columns
    }

    /// Create an empty keyboard for `chat_id` with the manager's default column count.
    ///
    /// Returns `false` (and leaves the existing state untouched) when the chat already
    /// has a keyboard.
    pub async fn create_keyboard(&self, chat_id: ChatId) -> Result<bool> {
        self.create_keyboard_with_columns(chat_id, self.default_columns)
            .await
    }

    pub async fn create_keyboard_with_columns(
        &self,
        chat_id: ChatId,
        max_columns: usize,
    ) -> Result<bool> {
        validate_columns(max_columns)?;

        let mut chats = self.chats.lock().await;
        if chats.contains_key(&chat_id) {
            tracing::debug!(chat_id = chat_id.0, "keyboard already exists, keeping it");
            return Ok(false);
        }
        chats.insert(chat_id, ChatKeyboardState::new(max_columns));
        Ok(true)
    }

    /// Append one button. Fails with `NotConfigured` if the chat has no keyboard.
    pub async fn add_button(
        &self,
        chat_id: ChatId,
        label: impl Into<String>,
        callback_data: impl Into<String>,
    ) -> Result<()> {
        let mut chats = self.chats.lock().await;
        let state = chats.get_mut(&chat_id).ok_or_else(|| no_keyboard(chat_id))?;
        state.pending.push(Button::new(label, callback_data));
        Ok(())
    }

    /// Append buttons from a flat `label, callback_data, label, callback_data, ...` list.
    ///
    /// Nothing is added unless the whole list is well formed.
    pub async fn add_buttons<S: AsRef<str>>(&self, chat_id: ChatId, pairs: &[S]) -> Result<()> {
        let buttons = buttons_from_pairs(pairs)?;

        let mut chats = self.chats.lock().await;
        let state = chats.get_mut(&chat_id).ok_or_else(|| no_keyboard(chat_id))?;
        state.pending.extend(buttons);
        Ok(())
    }

    /// Make `pairs` the chat's only buttons, creating the keyboard if needed.
    ///
    /// Create, clear and fill happen under one lock, so concurrent replacements for the
    /// same chat never mix their buttons. An existing column count is kept.
    pub async fn replace_buttons<S: AsRef<str>>(
        &self,
        chat_id: ChatId,
        pairs: &[S],
    ) -> Result<()> {
        let buttons = buttons_from_pairs(pairs)?;

        let mut chats = self.chats.lock().await;
        let state = chats
            .entry(chat_id)
            .or_insert_with(|| ChatKeyboardState::new(self.default_columns));
        state.rows.clear();
        state.pending = buttons;
        Ok(())
    }

    /// True only if the chat has state *and* at least one button.
    pub async fn has_keyboard(&self, chat_id: ChatId) -> bool {
        let chats = self.chats.lock().await;
        chats.get(&chat_id).is_some_and(|s| !s.is_empty())
    }

    /// Lay out and return the chat's grid. Unknown chats yield an empty grid.
    ///
    /// The grid always holds every button added so far: buttons added after an earlier
    /// call are laid out again together with the existing rows.
    pub async fn return_keyboard(&self, chat_id: ChatId) -> KeyboardGrid {
        let mut chats = self.chats.lock().await;
        match chats.get_mut(&chat_id) {
            Some(state) => laid_out(chat_id, state),
            None => Vec::new(),
        }
    }

    /// The chat's grid, or `None` when it has no buttons. One lock for both checks.
    pub async fn grid_if_any(&self, chat_id: ChatId) -> Option<KeyboardGrid> {
        let mut chats = self.chats.lock().await;
        let state = chats.get_mut(&chat_id).filter(|s| !s.is_empty())?;
        Some(laid_out(chat_id, state)).filter(|grid| !grid.is_empty())
    }

    /// Forget the chat entirely. Returns whether any state existed.
    pub async fn delete_keyboard(&self, chat_id: ChatId) -> bool {
        self.chats.lock().await.remove(&chat_id).is_some()
    }

    /// Drop all buttons but keep the chat's entry and column count.
    pub async fn clear_keyboard(&self, chat_id: ChatId) -> bool {
        let mut chats = self.chats.lock().await;
        match chats.get_mut(&chat_id) {
            Some(state) => {
                state.pending.clear();
                state.rows.clear();
                true
            }
            None => false,
        }
    }

    pub async fn max_columns(&self, chat_id: ChatId) -> Option<usize> {
        self.chats.lock().await.get(&chat_id).map(|s| s.max_columns)
    }
}

fn laid_out(chat_id: ChatId, state: &mut ChatKeyboardState) -> KeyboardGrid {
    match state.layout() {
        Ok(rows) => rows.clone(),
        Err(e) => {
            tracing::warn!(chat_id = chat_id.0, error = %e, "keyboard layout failed");
            Vec::new()
        }
    }
}

fn buttons_from_pairs<S: AsRef<str>>(pairs: &[S]) -> Result<Vec<Button>> {
    if pairs.len() % 2 != 0 {
        return Err(Error::InvalidArgument(format!(
            "buttons must come in label/callback pairs, got {} values",
            pairs.len()
        )));
    }
    Ok(pairs
        .chunks_exact(2)
        .map(|pair| Button::new(pair[0].as_ref(), pair[1].as_ref()))
        .collect())
}

fn validate_columns(max_columns: usize) -> Result<()> {
    if max_columns < 1 {
        return Err(Error::InvalidArgument(format!(
            "max_columns must be at least 1, got {max_columns}"
        )));
    }
    Ok(())
}

fn no_keyboard(chat_id: ChatId) -> Error {
    Error::NotConfigured(format!("no keyboard for chat {}", chat_id.0))
}

/// Single-owner keyboard built row by row.
///
/// `row()` seals the current row explicitly; `paginate()` ignores the explicit rows and
/// regroups every button under a column limit instead.
#[derive(Clone, Debug, Default)]
pub struct KeyboardBuilder {
    rows: KeyboardGrid,
    current: Vec<Button>,
}

impl KeyboardBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn button(mut self, label: impl Into<String>, callback_data: impl Into<String>) -> Self {
        self.current.push(Button::new(label, callback_data));
        self
    }

    pub fn row(mut self) -> Self {
        if !self.current.is_empty() {
            self.rows.push(std::mem::take(&mut self.current));
        }
        self
    }

    pub fn build(self) -> KeyboardGrid {
        self.row().rows
    }

    pub fn paginate(self, max_columns: usize) -> Result<KeyboardGrid> {
        let all: Vec<Button> = self.build().into_iter().flatten().collect();
        paginate(&all, max_columns)
    }
}
