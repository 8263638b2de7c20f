use std::sync::Arc;

use crate::{
    domain::{ChatId, MessageRef},
    keyboard::KeyboardManager,
    transport::{
        requests::{
            AnswerCallbackQuery, DeleteMessage, DeleteWebhook, EditMessageText, GetMe,
            SendDocument, SendMessage, SendPhoto, SendVideo, SetWebhook,
        },
        send, Transport,
    },
    update::types::{Message, User},
    Dispatcher, Result,
};

/// Thin glue: a transport, the per-chat keyboards, and the update dispatcher.
///
/// Outgoing messages pick up the chat's keyboard automatically when it has one.
#[derive(Clone)]
pub struct Bot {
    transport: Arc<dyn Transport>,
    keyboards: Arc<KeyboardManager>,
    dispatcher: Arc<Dispatcher>,
}

impl Bot {
    pub fn new(
        transport: Arc<dyn Transport>,
        keyboards: Arc<KeyboardManager>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            transport,
            keyboards,
            dispatcher,
        }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn keyboards(&self) -> &Arc<KeyboardManager> {
        &self.keyboards
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub async fn get_me(&self) -> Result<User> {
        send(self.transport.as_ref(), &GetMe {}).await
    }

    /// Send `text`, attaching the chat's keyboard if it has one.
    pub async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        let mut req = SendMessage::new(chat_id, text);
        if let Some(grid) = self.keyboards.grid_if_any(chat_id).await {
            req = req.keyboard(grid);
        }
        let msg = send(self.transport.as_ref(), &req).await?;
        Ok(message_ref(&msg))
    }

    /// Send `text` without any keyboard.
    pub async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        let msg = send(self.transport.as_ref(), &SendMessage::new(chat_id, text)).await?;
        Ok(message_ref(&msg))
    }

    /// Send a fully built `SendMessage`, e.g. one with a parse mode. No keyboard is added.
    pub async fn send_request(&self, req: &SendMessage) -> Result<MessageRef> {
        let msg = send(self.transport.as_ref(), req).await?;
        Ok(message_ref(&msg))
    }

    /// Replace the text of `msg`, re-attaching the chat's keyboard if it has one.
    pub async fn edit_message(&self, msg: MessageRef, text: &str) -> Result<()> {
        let mut req = EditMessageText::new(msg.chat_id, msg.message_id, text);
        if let Some(grid) = self.keyboards.grid_if_any(msg.chat_id).await {
            req = req.keyboard(grid);
        }
        send(self.transport.as_ref(), &req).await?;
        Ok(())
    }

    pub async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        send(
            self.transport.as_ref(),
            &DeleteMessage {
                chat_id: msg.chat_id,
                message_id: msg.message_id,
            },
        )
        .await?;
        Ok(())
    }

    pub async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        send(
            self.transport.as_ref(),
            &AnswerCallbackQuery {
                callback_query_id: callback_id.to_string(),
                text: text.map(str::to_string),
                show_alert: None,
            },
        )
        .await?;
        Ok(())
    }

    /// `photo` is a `file_id` or an HTTP URL.
    pub async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &str,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        let mut req = SendPhoto::new(chat_id, photo);
        if let Some(c) = caption {
            req = req.caption(c);
        }
        let msg = send(self.transport.as_ref(), &req).await?;
        Ok(message_ref(&msg))
    }

    pub async fn send_video(
        &self,
        chat_id: ChatId,
        video: &str,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        let mut req = SendVideo::new(chat_id, video);
        if let Some(c) = caption {
            req = req.caption(c);
        }
        let msg = send(self.transport.as_ref(), &req).await?;
        Ok(message_ref(&msg))
    }

    pub async fn send_document(
        &self,
        chat_id: ChatId,
        document: &str,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        let mut req = SendDocument::new(chat_id, document);
        if let Some(c) = caption {
            req = req.caption(c);
        }
        let msg = send(self.transport.as_ref(), &req).await?;
        Ok(message_ref(&msg))
    }

    pub async fn set_webhook(&self, url: &str, secret_token: Option<&str>) -> Result<()> {
        send(
            self.transport.as_ref(),
            &SetWebhook {
                url: url.to_string(),
                secret_token: secret_token.map(str::to_string),
                allowed_updates: Vec::new(),
            },
        )
        .await?;
        Ok(())
    }

    pub async fn delete_webhook(&self) -> Result<()> {
        send(self.transport.as_ref(), &DeleteWebhook::default()).await?;
        Ok(())
    }
}

fn message_ref(msg: &Message) -> MessageRef {
    MessageRef {
        chat_id: msg.chat.id,
        message_id: msg.message_id,
    }
}
