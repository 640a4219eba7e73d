//! The assistant client: request lifecycle on top of a single backend.
//!
//! [`AssistantClient`] is generic over the backend `B`, the same way the
//! editor talks to exactly one provider at a time.  It owns what the backend
//! should not care about:
//!
//! * the current [`ProviderSettings`] (swappable while calls are running),
//! * prompt preprocessing via [`RequestContext`],
//! * one [`CancelHandle`] per call, plus a "most recent call" slot for the
//!   editor's single *Stop* button,
//! * the generating indicator and the guaranteed cleanup on every exit path,
//! * routing of tokens, failures and completion into a [`StreamSink`].
//!
//! ```rust,ignore
//! let client = AssistantClient::new(backend, ProviderSettings::from_env()?);
//! let mut sink = FnSink::new().with_token(|t| print!("{t}"));
//! client.stream_ai_content(StreamRequest::new("Fix my grammar"), &mut sink).await;
//! ```
use std::{
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard, PoisonError, RwLock,
    },
    task::{Context, Poll},
};

use futures_core::Stream;
use futures_util::StreamExt;

use crate::{
    cancel::CancelHandle,
    config::ProviderSettings,
    error::{InkpressError, Result},
    generic::Prompt,
    provider::{ChatCompletionProvider, StreamingChatProvider},
    request::{RequestContext, StreamRequest},
    sink::{StreamOutcome, StreamSink},
};

/// A client bound to a single provider backend.
///
/// Cloning is cheap: clones share the backend, the settings, the cancel slot
/// and the generating indicator.
pub struct AssistantClient<B> {
    backend: Arc<B>,
    settings: Arc<RwLock<ProviderSettings>>,
    current: Arc<Mutex<Option<CancelHandle>>>,
    active: Arc<AtomicUsize>,
}

impl<B> Clone for AssistantClient<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            settings: Arc::clone(&self.settings),
            current: Arc::clone(&self.current),
            active: Arc::clone(&self.active),
        }
    }
}

impl<B> AssistantClient<B> {
    pub fn new(backend: B, settings: ProviderSettings) -> Self {
        Self {
            backend: Arc::new(backend),
            settings: Arc::new(RwLock::new(settings)),
            current: Arc::new(Mutex::new(None)),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Access the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Snapshot of the current settings.
    pub fn settings(&self) -> ProviderSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the settings. Calls already running keep the old snapshot.
    pub fn set_settings(&self, settings: ProviderSettings) {
        *self
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner) = settings;
    }

    /// `true` while at least one streaming call is alive.
    pub fn is_generating(&self) -> bool {
        self.active.load(Ordering::SeqCst) > 0
    }

    /// Cancel the most recently started streaming call, if it is still
    /// running.  Returns whether there was anything to cancel.
    ///
    /// Older calls keep running; cancel those through their own handle.
    pub fn cancel_ai_request(&self) -> bool {
        match lock(&self.current).take() {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }
}

impl<B> AssistantClient<B>
where
    B: StreamingChatProvider,
{
    /// Start a streaming call and hand back the raw token stream.
    ///
    /// The returned stream carries its own [`CancelHandle`] and also
    /// becomes the target of [`Self::cancel_ai_request`].  Dropping it runs the
    /// cleanup: decoder state goes away, the generating count drops and the
    /// cancel slot is cleared if it still points at this call.
    pub fn start(&self, request: StreamRequest) -> Result<ActiveStream<'_, B>> {
        let settings = self.settings();
        settings.validate()?;

        let ctx = RequestContext::new(&settings, request);
        let params = ctx.parameters(&settings);
        let handle = ctx.cancel.clone();

        *lock(&self.current) = Some(handle.clone());
        let guard = GenerationGuard::enter(&self.active, &self.current, handle.clone());

        tracing::debug!(
            provider = %settings.provider_id,
            model = %settings.model,
            messages = params.messages.len(),
            deep_thinking = ctx.deep_thinking,
            "starting streaming completion"
        );

        let inner = Box::pin(self.backend.chat_complete_stream(params, handle.clone()));

        Ok(ActiveStream {
            handle,
            inner,
            _guard: guard,
        })
    }

    /// Drive one streaming call to completion, reporting into `sink`.
    ///
    /// Tokens reach `sink` in stream order.  Exactly one of `on_error` /
    /// `on_finish` fires, unless the call was cancelled, in which case
    /// neither does.  Cleanup has already happened when the terminal callback
    /// runs, so `is_generating()` reflects the end of this call.
    pub async fn stream_ai_content<S>(&self, request: StreamRequest, sink: &mut S) -> StreamOutcome
    where
        S: StreamSink + ?Sized,
    {
        let mut stream = match self.start(request) {
            Ok(stream) => stream,
            Err(err) => {
                tracing::debug!(error = %err, "streaming completion rejected before start");
                sink.on_error(&err);
                return StreamOutcome::Failed;
            }
        };
        let handle = stream.handle().clone();

        while let Some(item) = stream.next().await {
            if handle.is_cancelled() {
                break;
            }

            match item {
                Ok(token) => sink.on_token(&token),
                Err(err) => {
                    drop(stream);
                    if handle.is_cancelled() {
                        tracing::info!("AI request cancelled");
                        return StreamOutcome::Cancelled;
                    }
                    tracing::debug!(error = %err, "streaming completion failed");
                    sink.on_error(&err);
                    return StreamOutcome::Failed;
                }
            }
        }

        drop(stream);
        if handle.is_cancelled() {
            tracing::info!("AI request cancelled");
            return StreamOutcome::Cancelled;
        }

        tracing::debug!("streaming completion finished");
        sink.on_finish();
        StreamOutcome::Finished
    }

    /// Stream `prompt` and collect the whole reply.
    ///
    /// Fails with [`InkpressError::Cancelled`] if the call is cancelled
    /// before the provider finishes.
    pub async fn generate_with_ai(&self, prompt: impl Into<Prompt>) -> Result<String> {
        let mut stream = self.start(StreamRequest::new(prompt))?;
        let handle = stream.handle().clone();
        let mut content = String::new();

        while let Some(token) = stream.next().await {
            match token {
                Ok(token) => content.push_str(&token),
                Err(_) if handle.is_cancelled() => return Err(InkpressError::Cancelled),
                Err(err) => return Err(err),
            }
        }

        if handle.is_cancelled() {
            return Err(InkpressError::Cancelled);
        }
        Ok(content)
    }

    /// Single-shot, non-streaming completion with the same message assembly
    /// as the streaming path.  Errors propagate unchanged; nothing is retried.
    pub async fn call_ai(&self, prompt: impl Into<Prompt>) -> Result<String> {
        let settings = self.settings();
        settings.validate()?;

        let ctx = RequestContext::new(&settings, StreamRequest::new(prompt));
        self.backend.chat_complete(ctx.parameters(&settings)).await
    }
}

/// A running streaming call.
///
/// Yields text fragments; ends quietly after cancellation.
pub struct ActiveStream<'s, B>
where
    B: StreamingChatProvider + 's,
{
    handle: CancelHandle,
    inner: Pin<Box<B::Delta<'s>>>,
    _guard: GenerationGuard,
}

impl<'s, B> ActiveStream<'s, B>
where
    B: StreamingChatProvider + 's,
{
    pub fn handle(&self) -> &CancelHandle {
        &self.handle
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }
}

impl<'s, B> Stream for ActiveStream<'s, B>
where
    B: StreamingChatProvider + 's,
{
    type Item = Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// Bookkeeping that must run however a call ends.
struct GenerationGuard {
    active: Arc<AtomicUsize>,
    current: Arc<Mutex<Option<CancelHandle>>>,
    handle: CancelHandle,
}

impl GenerationGuard {
    fn enter(
        active: &Arc<AtomicUsize>,
        current: &Arc<Mutex<Option<CancelHandle>>>,
        handle: CancelHandle,
    ) -> Self {
        active.fetch_add(1, Ordering::SeqCst);
        Self {
            active: Arc::clone(active),
            current: Arc::clone(current),
            handle,
        }
    }
}

impl Drop for GenerationGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);

        let mut current = lock(&self.current);
        if current
            .as_ref()
            .is_some_and(|h| h.same_request(&self.handle))
        {
            *current = None;
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
