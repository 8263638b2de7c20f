use serde::{Deserialize, Serialize};

use crate::{
    domain::{ChatId, MessageId},
    keyboard::KeyboardGrid,
    transport::ApiRequest,
    update::types::{Message, User},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    #[serde(rename = "HTML")]
    Html,
    #[serde(rename = "MarkdownV2")]
    MarkdownV2,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: KeyboardGrid,
}

impl InlineKeyboardMarkup {
    /// `None` for an empty grid, so the field is left out of the request entirely.
    pub fn from_grid(grid: KeyboardGrid) -> Option<Self> {
        if grid.iter().all(Vec::is_empty) {
            None
        } else {
            Some(Self {
                inline_keyboard: grid,
            })
        }
    }
}

/// `editMessageText` answers with the edited message, or `true` for inline messages.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum EditResult {
    Message(Box<Message>),
    Done(bool),
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct GetMe {}

impl ApiRequest for GetMe {
    const METHOD: &'static str = "getMe";
    type Response = User;
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct GetUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_updates: Vec<String>,
}

/// Entries stay undecoded so one malformed update cannot sink the whole batch.
impl ApiRequest for GetUpdates {
    const METHOD: &'static str = "getUpdates";
    type Response = Vec<serde_json::Value>;
}

#[derive(Clone, Debug, Serialize)]
pub struct SendMessage {
    pub chat_id: ChatId,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl SendMessage {
    pub fn new(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: None,
            reply_markup: None,
        }
    }

    pub fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = Some(mode);
        self
    }

    pub fn keyboard(mut self, grid: KeyboardGrid) -> Self {
        self.reply_markup = InlineKeyboardMarkup::from_grid(grid);
        self
    }
}

impl ApiRequest for SendMessage {
    const METHOD: &'static str = "sendMessage";
    type Response = Message;
}

#[derive(Clone, Debug, Serialize)]
pub struct EditMessageText {
    pub chat_id: ChatId,
    pub message_id: MessageId,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

impl EditMessageText {
    pub fn new(chat_id: ChatId, message_id: MessageId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            message_id,
            text: text.into(),
            parse_mode: None,
            reply_markup: None,
        }
    }

    pub fn keyboard(mut self, grid: KeyboardGrid) -> Self {
        self.reply_markup = InlineKeyboardMarkup::from_grid(grid);
        self
    }
}

impl ApiRequest for EditMessageText {
    const METHOD: &'static str = "editMessageText";
    type Response = EditResult;
}

#[derive(Clone, Debug, Serialize)]
pub struct AnswerCallbackQuery {
    pub callback_query_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_alert: Option<bool>,
}

impl ApiRequest for AnswerCallbackQuery {
    const METHOD: &'static str = "answerCallbackQuery";
    type Response = bool;
}

#[derive(Clone, Debug, Serialize)]
pub struct DeleteMessage {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

impl ApiRequest for DeleteMessage {
    const METHOD: &'static str = "deleteMessage";
    type Response = bool;
}

/// Media is referenced by `file_id` or by URL; uploads are not supported.
macro_rules! media_request {
    ($name:ident, $method:literal, $field:ident) => {
        #[derive(Clone, Debug, Serialize)]
        pub struct $name {
            pub chat_id: ChatId,
            pub $field: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            pub caption: Option<String>,
            #[serde(skip_serializing_if = "Option::is_none")]
            pub reply_markup: Option<InlineKeyboardMarkup>,
        }

        impl $name {
            pub fn new(chat_id: ChatId, $field: impl Into<String>) -> Self {
                Self {
                    chat_id,
                    $field: $field.into(),
                    caption: None,
                    reply_markup: None,
                }
            }

            pub fn caption(mut self, caption: impl Into<String>) -> Self {
                self.caption = Some(caption.into());
                self
            }

            pub fn keyboard(mut self, grid: KeyboardGrid) -> Self {
                self.reply_markup = InlineKeyboardMarkup::from_grid(grid);
                self
            }
        }

        impl ApiRequest for $name {
            const METHOD: &'static str = $method;
            type Response = Message;
        }
    };
}

media_request!(SendPhoto, "sendPhoto", photo);
media_request!(SendVideo, "sendVideo", video);
media_request!(SendDocument, "sendDocument", document);

#[derive(Clone, Debug, Serialize)]
pub struct SetWebhook {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_token: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_updates: Vec<String>,
}

impl ApiRequest for SetWebhook {
    const METHOD: &'static str = "setWebhook";
    type Response = bool;
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct DeleteWebhook {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drop_pending_updates: Option<bool>,
}

impl ApiRequest for DeleteWebhook {
    const METHOD: &'static str = "deleteWebhook";
    type Response = bool;
}
