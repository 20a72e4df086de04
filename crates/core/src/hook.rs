//! Caller-supplied transform applied to decoded text before parsing.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::fetch::ResponseMeta;
use crate::{ReadError, Result};

type HookFn = dyn Fn(String, ResponseMeta) -> BoxFuture<'static, Result<String>> + Send + Sync;

/// Asynchronous `(text, response) -> text` transform.
///
/// The hook runs once per fetched resource, after charset normalization and
/// before the document is built. Returning an error aborts the read.
///
/// # Example
///
/// ```rust
/// use legible_core::PreprocessHook;
///
/// let hook = PreprocessHook::new(|text, _meta| async move {
///     Ok(text.replace("<blink>", "<span>").replace("</blink>", "</span>"))
/// });
/// ```
#[derive(Clone)]
pub struct PreprocessHook {
    inner: Arc<HookFn>,
}

impl PreprocessHook {
    /// Wraps an async closure as a hook.
    pub fn new<F, Fut>(hook: F) -> Self
    where
        F: Fn(String, ResponseMeta) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        let inner: Arc<HookFn> = Arc::new(move |text: String, meta: ResponseMeta| -> BoxFuture<'static, Result<String>> {
            Box::pin(hook(text, meta))
        });
        Self { inner }
    }

    /// Wraps a synchronous closure whose errors are reported as messages.
    pub fn from_fn<F, E>(hook: F) -> Self
    where
        F: Fn(String, &ResponseMeta) -> std::result::Result<String, E> + Send + Sync + 'static,
        E: fmt::Display + 'static,
    {
        let hook = Arc::new(hook);
        Self::new(move |text, meta| {
            let hook = Arc::clone(&hook);
            async move { hook(text, &meta).map_err(|e| ReadError::Preprocess(e.to_string())) }
        })
    }

    /// Runs the hook.
    pub async fn apply(&self, text: String, meta: &ResponseMeta) -> Result<String> {
        (self.inner)(text, meta.clone()).await
    }
}

impl fmt::Debug for PreprocessHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PreprocessHook(..)")
    }
}
