use crate::{
    domain::{ChatId, MessageRef},
    update::types::{Message, RawUpdate, User},
};

pub const COMMAND_MARKER: char = '/';

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    Text,
    EditedText,
    Callback,
    Document,
    Photo,
    Video,
    MediaGroup,
    Unknown,
}

/// A raw update tagged with its semantic kind and, for text, its command token.
#[derive(Clone, Debug)]
pub struct ClassifiedUpdate {
    pub raw: RawUpdate,
    pub kind: UpdateKind,
    pub command: Option<String>,
}

/// Decide the kind of `raw`. Pure; the first matching rule wins.
///
/// Order matters: a photo message also carries an (empty) text, a callback
/// carries the message it was attached to, and so on.
pub fn classify(raw: RawUpdate, bot_username: &str) -> ClassifiedUpdate {
    let kind = kind_of(&raw);

    let command = match kind {
        UpdateKind::EditedText => raw
            .edited_message
            .as_ref()
            .and_then(Message::non_empty_text)
            .and_then(|t| extract_command(t, bot_username)),
        UpdateKind::Text => raw
            .message
            .as_ref()
            .and_then(Message::non_empty_text)
            .and_then(|t| extract_command(t, bot_username)),
        _ => None,
    };

    ClassifiedUpdate { raw, kind, command }
}

fn kind_of(raw: &RawUpdate) -> UpdateKind {
    if raw
        .edited_message
        .as_ref()
        .and_then(Message::non_empty_text)
        .is_some()
    {
        return UpdateKind::EditedText;
    }

    if raw
        .message
        .as_ref()
        .and_then(Message::non_empty_text)
        .is_some()
    {
        return UpdateKind::Text;
    }

    if raw
        .callback_query
        .as_ref()
        .is_some_and(|q| !q.id.is_empty())
    {
        return UpdateKind::Callback;
    }

    let Some(msg) = raw.message.as_ref() else {
        return UpdateKind::Unknown;
    };

    if msg.has_named_document() {
        UpdateKind::Document
    } else if msg.has_photo() && msg.has_video() {
        UpdateKind::MediaGroup
    } else if msg.has_photo() {
        UpdateKind::Photo
    } else if msg.has_video() {
        UpdateKind::Video
    } else {
        UpdateKind::Unknown
    }
}

/// Leading `/word` of `text`, with a trailing `@<bot_username>` mention removed.
///
/// Mentions of other bots are kept. An empty `bot_username` disables stripping.
pub fn extract_command(text: &str, bot_username: &str) -> Option<String> {
    let token = text.split_whitespace().next()?;
    if !token.starts_with(COMMAND_MARKER) {
        return None;
    }

    if !bot_username.is_empty() {
        if let Some(bare) = token
            .strip_suffix(bot_username)
            .and_then(|t| t.strip_suffix('@'))
        {
            return Some(bare.to_string());
        }
    }

    Some(token.to_string())
}

impl ClassifiedUpdate {
    /// The message this update is about: the edited one, the plain one, or the one a
    /// callback button was attached to.
    pub fn message(&self) -> Option<&Message> {
        match self.kind {
            UpdateKind::EditedText => self.raw.edited_message.as_ref(),
            UpdateKind::Callback => self
                .raw
                .callback_query
                .as_ref()
                .and_then(|q| q.message.as_ref()),
            _ => self.raw.message.as_ref(),
        }
    }

    pub fn chat_id(&self) -> Option<ChatId> {
        self.message().map(|m| m.chat.id)
    }

    pub fn message_ref(&self) -> Option<MessageRef> {
        self.message().map(|m| MessageRef {
            chat_id: m.chat.id,
            message_id: m.message_id,
        })
    }

    pub fn user(&self) -> Option<&User> {
        match self.kind {
            UpdateKind::Callback => self.raw.callback_query.as_ref().map(|q| &q.from),
            _ => self.message().and_then(|m| m.from.as_ref()),
        }
    }

    /// Message text, only for `Text` and `EditedText`.
    pub fn text(&self) -> Option<&str> {
        match self.kind {
            UpdateKind::Text | UpdateKind::EditedText => {
                self.message().and_then(Message::non_empty_text)
            }
            _ => None,
        }
    }

    /// Everything after the command token, or `None` when there is no command.
    pub fn command_args(&self) -> Option<&str> {
        self.command.as_ref()?;
        let text = self.text()?.trim_start();
        Some(
            text.split_once(char::is_whitespace)
                .map(|(_, rest)| rest.trim())
                .unwrap_or(""),
        )
    }

    pub fn callback_id(&self) -> Option<&str> {
        match self.kind {
            UpdateKind::Callback => self.raw.callback_query.as_ref().map(|q| q.id.as_str()),
            _ => None,
        }
    }

    pub fn callback_data(&self) -> Option<&str> {
        match self.kind {
            UpdateKind::Callback => self
                .raw
                .callback_query
                .as_ref()
                .and_then(|q| q.data.as_deref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BOT: &str = "MyBot";

    fn raw(v: serde_json::Value) -> RawUpdate {
        serde_json::from_value(v).unwrap()
    }

    fn message(extra: serde_json::Value) -> serde_json::Value {
        let mut m = json!({
            "message_id": 10,
            "from": { "id": 7, "first_name": "Ann", "username": "ann" },
            "chat": { "id": 99, "type": "private" }
        });
        if let (Some(base), Some(extra)) = (m.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        m
    }

    #[test]
    fn edited_text_wins_over_text() {
        let u = classify(
            raw(json!({
                "update_id": 1,
                "message": message(json!({ "text": "plain" })),
                "edited_message": message(json!({ "text": "edited" }))
            })),
            BOT,
        );
        assert_eq!(u.kind, UpdateKind::EditedText);
        assert_eq!(u.text(), Some("edited"));
    }

    #[test]
    fn plain_text_and_accessors() {
        let u = classify(
            raw(json!({ "update_id": 2, "message": message(json!({ "text": "hello there" })) })),
            BOT,
        );
        assert_eq!(u.kind, UpdateKind::Text);
        assert_eq!(u.command, None);
        assert_eq!(u.command_args(), None);
        assert_eq!(u.chat_id(), Some(ChatId(99)));
        assert_eq!(u.user().and_then(|u| u.username.as_deref()), Some("ann"));
    }

    #[test]
    fn command_mention_is_stripped_for_own_bot() {
        let u = classify(
            raw(json!({ "update_id": 3, "message": message(json!({ "text": "/start@MyBot hello" })) })),
            BOT,
        );
        assert_eq!(u.command.as_deref(), Some("/start"));
        assert_eq!(u.command_args(), Some("hello"));

        let u = classify(
            raw(json!({ "update_id": 4, "message": message(json!({ "text": "/start hello" })) })),
            BOT,
        );
        assert_eq!(u.command.as_deref(), Some("/start"));
    }

    #[test]
    fn command_mention_of_other_bot_is_kept() {
        assert_eq!(
            extract_command("/start@OtherBot", BOT).as_deref(),
            Some("/start@OtherBot")
        );
        assert_eq!(
            extract_command("/start@mybot", BOT).as_deref(),
            Some("/start@mybot")
        );
        assert_eq!(
            extract_command("/start@MyBot", "").as_deref(),
            Some("/start@MyBot")
        );
    }

    #[test]
    fn command_edge_cases() {
        assert_eq!(extract_command("", BOT), None);
        assert_eq!(extract_command("   \n\t ", BOT), None);
        assert_eq!(extract_command("hi /start", BOT), None);
        assert_eq!(extract_command("  /help  me", BOT).as_deref(), Some("/help"));
    }

    #[test]
    fn edited_text_gets_a_command_too() {
        let u = classify(
            raw(json!({ "update_id": 5, "edited_message": message(json!({ "text": "/menu@MyBot" })) })),
            BOT,
        );
        assert_eq!(u.kind, UpdateKind::EditedText);
        assert_eq!(u.command.as_deref(), Some("/menu"));
        assert_eq!(u.command_args(), Some(""));
    }

    #[test]
    fn callback_query() {
        let u = classify(
            raw(json!({
                "update_id": 6,
                "callback_query": {
                    "id": "cb-1",
                    "from": { "id": 7, "first_name": "Ann" },
                    "data": "pick:2",
                    "message": message(json!({ "text": "choose" }))
                }
            })),
            BOT,
        );
        assert_eq!(u.kind, UpdateKind::Callback);
        assert_eq!(u.callback_id(), Some("cb-1"));
        assert_eq!(u.callback_data(), Some("pick:2"));
        assert_eq!(u.chat_id(), Some(ChatId(99)));
        assert_eq!(u.text(), None);
        assert_eq!(u.command, None);
    }

    #[test]
    fn empty_callback_id_is_not_a_callback() {
        let u = classify(
            raw(json!({
                "update_id": 7,
                "callback_query": { "id": "", "from": { "id": 7 } }
            })),
            BOT,
        );
        assert_eq!(u.kind, UpdateKind::Unknown);
    }

    #[test]
    fn media_kinds() {
        let photo = json!([{ "file_id": "p1", "width": 90, "height": 90 }, { "file_id": "p2" }]);
        let video = json!({ "file_id": "v1", "duration": 3 });

        let doc = classify(
            raw(json!({ "update_id": 8, "message": message(json!({
                "text": "",
                "document": { "file_id": "d1", "file_name": "a.pdf" },
                "photo": photo.clone()
            })) })),
            BOT,
        );
        assert_eq!(doc.kind, UpdateKind::Document);

        let unnamed = classify(
            raw(json!({ "update_id": 9, "message": message(json!({
                "document": { "file_id": "d1", "file_name": "" }
            })) })),
            BOT,
        );
        assert_eq!(unnamed.kind, UpdateKind::Unknown);

        let group = classify(
            raw(json!({ "update_id": 10, "message": message(json!({
                "photo": photo.clone(), "video": video.clone()
            })) })),
            BOT,
        );
        assert_eq!(group.kind, UpdateKind::MediaGroup);

        let p = classify(
            raw(json!({ "update_id": 11, "message": message(json!({ "text": "", "photo": photo })) })),
            BOT,
        );
        assert_eq!(p.kind, UpdateKind::Photo);
        assert_eq!(
            p.message()
                .and_then(Message::largest_photo)
                .map(|s| s.file_id.as_str()),
            Some("p2")
        );

        let v = classify(
            raw(json!({ "update_id": 12, "message": message(json!({ "video": video })) })),
            BOT,
        );
        assert_eq!(v.kind, UpdateKind::Video);
    }

    #[test]
    fn nothing_recognisable_is_unknown() {
        let u = classify(raw(json!({ "update_id": 13 })), BOT);
        assert_eq!(u.kind, UpdateKind::Unknown);
        assert_eq!(u.chat_id(), None);

        let u = classify(
            raw(json!({ "update_id": 14, "message": message(json!({ "text": "" })) })),
            BOT,
        );
        assert_eq!(u.kind, UpdateKind::Unknown);
        assert_eq!(u.chat_id(), Some(ChatId(99)));
    }
}
