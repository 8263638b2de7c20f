//! Hands classified updates to the registered handler.
//!
//! Every update runs in its own tokio task. `dispatch` returns as soon as the task
//! is spawned; there is no ordering between updates, not even for the same chat,
//! and a slow handler is never cancelled or timed out.

use std::{
    future::Future,
    sync::{Arc, PoisonError, RwLock},
};

use async_trait::async_trait;
use tokio::{runtime::Handle, sync::Semaphore, task::JoinHandle};

use crate::{
    errors::Error,
    update::{classify, ClassifiedUpdate, RawUpdate},
    Result,
};

/// User code that reacts to one update. Nothing it returns is observed.
#[async_trait]
pub trait UpdateHandler: Send + Sync + 'static {
    async fn handle(&self, update: ClassifiedUpdate);
}

#[async_trait]
impl<F, Fut> UpdateHandler for F
where
    F: Fn(ClassifiedUpdate) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn handle(&self, update: ClassifiedUpdate) {
        (self)(update).await
    }
}

pub struct Dispatcher {
    bot_username: String,
    handler: RwLock<Option<Arc<dyn UpdateHandler>>>,
    limit: Option<Arc<Semaphore>>,
    runtime: Option<Handle>,
}

impl Dispatcher {
    /// `bot_username` is used to strip `/cmd@bot` mentions; a leading `@` is ignored.
    pub fn new(bot_username: impl Into<String>) -> Self {
        let bot_username: String = bot_username.into();
        Self {
            bot_username: bot_username.trim_start_matches('@').to_string(),
            handler: RwLock::new(None),
            limit: None,
            runtime: None,
        }
    }

    /// Cap the number of handlers running at once. `0` keeps it unbounded.
    ///
    /// Waiting for a slot happens inside the spawned task, never in `dispatch`.
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.limit = (max > 0).then(|| Arc::new(Semaphore::new(max)));
        self
    }

    /// Spawn handlers on `handle` instead of the caller's ambient runtime.
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn bot_username(&self) -> &str {
        &self.bot_username
    }

    /// Register the handler, replacing any previous one.
    pub fn set_handler<H: UpdateHandler>(&self, handler: H) {
        let mut slot = self.handler.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Arc::new(handler));
    }

    pub fn has_handler(&self) -> bool {
        self.current_handler().is_some()
    }

    pub fn classify(&self, raw: RawUpdate) -> ClassifiedUpdate {
        classify(raw, &self.bot_username)
    }

    /// Spawn the handler for `update` and return without waiting for it.
    ///
    /// The update is dropped with `NotConfigured` when no handler is registered, or when
    /// there is neither a configured runtime nor an ambient one to spawn on.
    pub fn dispatch(&self, update: ClassifiedUpdate) -> Result<JoinHandle<()>> {
        let Some(handler) = self.current_handler() else {
            tracing::warn!(
                update_id = update.raw.update_id,
                kind = ?update.kind,
                "handler not configured, dropping update"
            );
            return Err(Error::NotConfigured("no update handler registered".to_string()));
        };

        let Some(runtime) = self.runtime_handle() else {
            tracing::warn!(
                update_id = update.raw.update_id,
                kind = ?update.kind,
                "no tokio runtime, dropping update"
            );
            return Err(Error::NotConfigured("no tokio runtime".to_string()));
        };

        tracing::debug!(update_id = update.raw.update_id, kind = ?update.kind, "dispatching update");

        let limit = self.limit.clone();
        Ok(runtime.spawn(async move {
            let _permit = match limit {
                Some(sem) => match sem.acquire_owned().await {
                    Ok(p) => Some(p),
                    Err(_) => return,
                },
                None => None,
            };

            let update_id = update.raw.update_id;
            let run = tokio::spawn(async move { handler.handle(update).await });
            if let Err(e) = run.await {
                if e.is_panic() {
                    tracing::error!(update_id, "update handler panicked");
                }
            }
        }))
    }

    pub fn dispatch_raw(&self, raw: RawUpdate) -> Result<JoinHandle<()>> {
        self.dispatch(self.classify(raw))
    }

    /// Decode a webhook body, classify it and dispatch it.
    ///
    /// A body that does not decode never reaches the handler.
    pub fn dispatch_payload(&self, body: &[u8]) -> Result<JoinHandle<()>> {
        let raw = RawUpdate::from_slice(body).map_err(|e| {
            tracing::warn!(error = %e, bytes = body.len(), "dropping undecodable update");
            Error::Decode(e)
        })?;
        self.dispatch_raw(raw)
    }

    fn runtime_handle(&self) -> Option<Handle> {
        self.runtime.clone().or_else(|| Handle::try_current().ok())
    }

    fn current_handler(&self) -> Option<Arc<dyn UpdateHandler>> {
        self.handler
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
