//! Callback-style consumers for streaming completions.
//!
//! The editor wires three callbacks into every generation: one per token,
//! one for a failure and one for a clean finish.  [`StreamSink`] models that
//! contract; [`FnSink`] adapts plain closures.

use crate::error::InkpressError;

/// Receiver for the events of a single streaming call.
///
/// For one call the client guarantees:
/// * `on_token` fires once per extracted fragment, in stream order;
/// * at most one of `on_error` / `on_finish` fires, and neither does when the
///   call was cancelled.
pub trait StreamSink {
    fn on_token(&mut self, _token: &str) {}

    fn on_error(&mut self, _error: &InkpressError) {}

    fn on_finish(&mut self) {}
}

/// Discard everything.
impl StreamSink for () {}

type TokenFn<'a> = Box<dyn FnMut(&str) + Send + 'a>;
type ErrorFn<'a> = Box<dyn FnMut(&InkpressError) + Send + 'a>;
type FinishFn<'a> = Box<dyn FnMut() + Send + 'a>;

/// Closure-backed [`StreamSink`]; unset callbacks are no-ops.
///
/// ```rust
/// use inkpress_core::sink::{FnSink, StreamSink};
///
/// let mut text = String::new();
/// {
///     let mut sink = FnSink::new().with_token(|t| text.push_str(t));
///     sink.on_token("Hi");
/// }
/// assert_eq!(text, "Hi");
/// ```
#[derive(Default)]
pub struct FnSink<'a> {
    token: Option<TokenFn<'a>>,
    error: Option<ErrorFn<'a>>,
    finish: Option<FinishFn<'a>>,
}

impl<'a> FnSink<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, f: impl FnMut(&str) + Send + 'a) -> Self {
        self.token = Some(Box::new(f));
        self
    }

    pub fn with_error(mut self, f: impl FnMut(&InkpressError) + Send + 'a) -> Self {
        self.error = Some(Box::new(f));
        self
    }

    pub fn with_finish(mut self, f: impl FnMut() + Send + 'a) -> Self {
        self.finish = Some(Box::new(f));
        self
    }
}

impl StreamSink for FnSink<'_> {
    fn on_token(&mut self, token: &str) {
        if let Some(f) = self.token.as_mut() {
            f(token);
        }
    }

    fn on_error(&mut self, error: &InkpressError) {
        if let Some(f) = self.error.as_mut() {
            f(error);
        }
    }

    fn on_finish(&mut self) {
        if let Some(f) = self.finish.as_mut() {
            f();
        }
    }
}

/// How a streaming call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The body was read to the end; `on_finish` fired.
    Finished,
    /// The call was cancelled; no terminal callback fired.
    Cancelled,
    /// The call failed; `on_error` fired once.
    Failed,
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn fn_sink_is_driven_through_the_trait_methods() {
        let log = Mutex::new(Vec::new());
        {
            let mut sink = FnSink::new()
                .with_token(|t| log.lock().unwrap().push(format!("token:{t}")))
                .with_finish(|| log.lock().unwrap().push("finish".to_owned()));
            sink.on_token("Hi");
            sink.on_token(" there");
            sink.on_error(&InkpressError::Cancelled);
            sink.on_finish();
        }

        assert_eq!(log.into_inner().unwrap(), vec!["token:Hi", "token: there", "finish"]);
    }
}
