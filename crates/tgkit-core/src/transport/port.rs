use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::{errors::Error, Result};

/// Hexagonal port for the Bot API exchange.
///
/// Implementations post `body` to `method` and return the `result` member of a
/// successful response. Anything else (network error, non-ok envelope) comes back as
/// `Error::Transport`; the core never looks deeper than that.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, method: &str, body: serde_json::Value) -> Result<serde_json::Value>;
}

/// A typed Bot API method.
pub trait ApiRequest: Serialize + Send + Sync {
    const METHOD: &'static str;
    type Response: DeserializeOwned;
}

/// Send a typed request and decode its typed response.
///
/// A `result` that does not match `R::Response` is a transport failure, not a decode one.
pub async fn send<R: ApiRequest>(transport: &dyn Transport, req: &R) -> Result<R::Response> {
    let body = serde_json::to_value(req)?;
    let result = transport.call(R::METHOD, body).await?;
    serde_json::from_value(result)
        .map_err(|e| Error::Transport(format!("{}: unexpected result: {e}", R::METHOD)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatId, MessageId};
    use crate::transport::requests::{DeleteMessage, GetMe};
    use serde_json::{json, Value};

    struct FixedTransport(Value);

    #[async_trait]
    impl Transport for FixedTransport {
        async fn call(&self, _method: &str, _body: Value) -> Result<Value> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn typed_response_is_decoded() {
        let t = FixedTransport(json!(true));
        let req = DeleteMessage {
            chat_id: ChatId(1),
            message_id: MessageId(2),
        };
        assert!(send(&t, &req).await.unwrap());
    }

    #[tokio::test]
    async fn mismatched_result_is_a_transport_failure() {
        let t = FixedTransport(json!("not a user"));
        let err = send(&t, &GetMe {}).await.unwrap_err();
        match err {
            Error::Transport(msg) => assert!(msg.starts_with("getMe: unexpected result")),
            other => panic!("expected transport failure, got {other:?}"),
        }
    }
}
