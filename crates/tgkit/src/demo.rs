//! Example handler: a colour picker keyboard plus echo.

use tgkit_core::{
    transport::requests::{ParseMode, SendMessage},
    update::types::Message,
    Bot, ClassifiedUpdate, Result, UpdateKind,
};

const DEFAULT_OPTIONS: [&str; 5] = ["Red", "Green", "Blue", "Cyan", "Magenta"];
const PICK_PREFIX: &str = "pick:";

pub async fn handle(bot: &Bot, update: ClassifiedUpdate) -> Result<()> {
    let Some(chat_id) = update.chat_id() else {
        tracing::debug!(update_id = update.raw.update_id, "update without chat, ignoring");
        return Ok(());
    };

    match update.kind {
        UpdateKind::Text => match update.command.as_deref() {
            Some("/start") => {
                let req = SendMessage::new(
                    chat_id,
                    "Hi! Send <b>/menu</b> to get a keyboard, <b>/clear</b> to drop it.",
                )
                .parse_mode(ParseMode::Html);
                bot.send_request(&req).await?;
            }
            Some("/menu") => {
                let args = update.command_args().unwrap_or("");
                let options: Vec<&str> = if args.is_empty() {
                    DEFAULT_OPTIONS.to_vec()
                } else {
                    args.split_whitespace().collect()
                };

                let pairs: Vec<String> = options
                    .iter()
                    .flat_map(|o| [o.to_string(), format!("{PICK_PREFIX}{o}")])
                    .collect();
                bot.keyboards()
                    .replace_buttons(chat_id, pairs.as_slice())
                    .await?;

                bot.send_message(chat_id, "Pick one:").await?;
            }
            Some("/clear") => {
                bot.keyboards().delete_keyboard(chat_id).await;
                bot.send_text(chat_id, "Keyboard removed.").await?;
            }
            Some(other) => {
                bot.send_text(chat_id, &format!("Unknown command {other}"))
                    .await?;
            }
            None => {
                let text = update.text().unwrap_or_default();
                bot.send_message(chat_id, text).await?;
            }
        },
        UpdateKind::EditedText => {
            let text = update.text().unwrap_or_default();
            bot.send_text(chat_id, &format!("Edited to: {text}")).await?;
        }
        UpdateKind::Callback => {
            let data = update.callback_data().unwrap_or_default();
            let picked = data.strip_prefix(PICK_PREFIX).unwrap_or(data);
            if let Some(id) = update.callback_id() {
                bot.answer_callback(id, Some(&format!("Picked {picked}")))
                    .await?;
            }
            if let Some(msg) = update.message_ref() {
                bot.edit_message(msg, &format!("You picked {picked}")).await?;
            }
        }
        UpdateKind::Photo => {
            if let Some(p) = update.message().and_then(Message::largest_photo) {
                bot.send_photo(chat_id, &p.file_id, Some("Nice photo."))
                    .await?;
            }
        }
        UpdateKind::Video => {
            if let Some(v) = update.message().and_then(|m| m.video.as_ref()) {
                bot.send_video(chat_id, &v.file_id, None).await?;
            }
        }
        UpdateKind::Document => {
            let name = update
                .message()
                .and_then(|m| m.document.as_ref())
                .and_then(|d| d.file_name.clone())
                .unwrap_or_default();
            bot.send_text(chat_id, &format!("Got document {name}")).await?;
        }
        UpdateKind::MediaGroup => {
            bot.send_text(chat_id, "Got photos and a video.").await?;
        }
        UpdateKind::Unknown => {
            tracing::debug!(update_id = update.raw.update_id, "unknown update kind");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use tgkit_core::{domain::ChatId, transport::Transport, Dispatcher, KeyboardManager, RawUpdate};

    #[derive(Default)]
    struct FakeTransport {
        calls: Mutex<Vec<(String, Value)>>,
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn call(&self, method: &str, body: Value) -> Result<Value> {
            self.calls
                .lock()
                .unwrap()
                .push((method.to_string(), body.clone()));
            let chat = body["chat_id"].clone();
            Ok(match method {
                "sendMessage" | "sendPhoto" | "sendVideo" => {
                    json!({ "message_id": 1, "chat": { "id": chat } })
                }
                _ => json!(true),
            })
        }
    }

    fn setup() -> (Bot, Arc<FakeTransport>) {
        let t = Arc::new(FakeTransport::default());
        let bot = Bot::new(
            t.clone(),
            Arc::new(KeyboardManager::new()),
            Arc::new(Dispatcher::new("DemoBot")),
        );
        (bot, t)
    }

    fn update(bot: &Bot, v: Value) -> ClassifiedUpdate {
        let raw: RawUpdate = serde_json::from_value(v).unwrap();
        bot.dispatcher().classify(raw)
    }

    #[tokio::test]
    async fn menu_builds_a_paginated_keyboard() {
        let (bot, t) = setup();
        let u = update(
            &bot,
            json!({ "update_id": 1, "message": {
                "message_id": 1, "chat": { "id": 4 }, "text": "/menu@DemoBot a b c d"
            } }),
        );
        handle(&bot, u).await.unwrap();

        assert!(bot.keyboards().has_keyboard(ChatId(4)).await);
        let calls = t.calls.lock().unwrap().clone();
        let kb = &calls[0].1["reply_markup"]["inline_keyboard"];
        assert_eq!(kb.as_array().map(Vec::len), Some(2));
        assert_eq!(kb[1][0]["callback_data"], json!("pick:d"));
    }

    #[tokio::test]
    async fn callback_answers_and_edits() {
        let (bot, t) = setup();
        let u = update(
            &bot,
            json!({ "update_id": 2, "callback_query": {
                "id": "q1",
                "from": { "id": 9 },
                "data": "pick:Blue",
                "message": { "message_id": 8, "chat": { "id": 4 } }
            } }),
        );
        handle(&bot, u).await.unwrap();

        let calls = t.calls.lock().unwrap().clone();
        assert_eq!(calls[0].0, "answerCallbackQuery");
        assert_eq!(calls[0].1["text"], json!("Picked Blue"));
        assert_eq!(calls[1].0, "editMessageText");
        assert_eq!(calls[1].1["message_id"], json!(8));
    }

    #[tokio::test]
    async fn clear_removes_keyboard() {
        let (bot, _t) = setup();
        let chat = json!({ "id": 4 });
        for (i, text) in ["/menu", "/clear"].iter().enumerate() {
            let u = update(
                &bot,
                json!({ "update_id": i, "message": {
                    "message_id": i, "chat": chat.clone(), "text": text
                } }),
            );
            handle(&bot, u).await.unwrap();
        }
        assert!(!bot.keyboards().has_keyboard(ChatId(4)).await);
    }

    #[tokio::test]
    async fn start_is_sent_as_html() {
        let (bot, t) = setup();
        let u = update(
            &bot,
            json!({ "update_id": 3, "message": {
                "message_id": 1, "chat": { "id": 4 }, "text": "/start"
            } }),
        );
        handle(&bot, u).await.unwrap();

        let calls = t.calls.lock().unwrap().clone();
        assert_eq!(calls[0].0, "sendMessage");
        assert_eq!(calls[0].1["parse_mode"], json!("HTML"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn overlapping_menus_do_not_double_the_keyboard() {
        let (bot, _t) = setup();
        for round in 0..100 {
            let tasks: Vec<_> = (0..2)
                .map(|i| {
                    let bot = bot.clone();
                    let u = update(
                        &bot,
                        json!({ "update_id": round * 2 + i, "message": {
                            "message_id": 1, "chat": { "id": 4 }, "text": "/menu a b c"
                        } }),
                    );
                    tokio::spawn(async move { handle(&bot, u).await.unwrap() })
                })
                .collect();
            for t in tasks {
                t.await.unwrap();
            }

            let grid = bot.keyboards().return_keyboard(ChatId(4)).await;
            assert_eq!(grid.iter().map(Vec::len).sum::<usize>(), 3, "round {round}");
        }
    }
}
