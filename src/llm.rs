//! LLM adapter surface (spec §6).
//!
//! The engine consumes exactly one capability from its language model:
//! `generate(prompt) -> text`. A provider's model may expose that call as
//! either sync or async; in async Rust there is only one await-able shape.
//! [`LlmAdapter::generate`] is that shape, and a
//! synchronous provider should wrap itself with [`SyncLlmAdapter`], which
//! offloads the blocking call to `tokio::task::spawn_blocking` — the same
//! "don't block the executor" move any fire-and-forget sink reaches for
//! when it wraps a synchronous collaborator.

use async_trait::async_trait;
use miette::Diagnostic;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while invoking an [`LlmAdapter`].
#[derive(Debug, Error, Diagnostic)]
pub enum LlmError {
    #[error("provider error ({provider}): {message}")]
    #[diagnostic(code(narrative_engine::llm::provider))]
    Provider { provider: String, message: String },

    #[error("generation task panicked or was cancelled")]
    #[diagnostic(code(narrative_engine::llm::join))]
    Join,

    #[error("invalid model uri '{uri}': {reason}")]
    #[diagnostic(code(narrative_engine::llm::invalid_uri))]
    InvalidUri { uri: String, reason: &'static str },
}

/// A value capable of turning a prompt into generated text.
///
/// Implementers are expected to be cheap to clone (wrap a connection-pooled
/// client in an `Arc` internally) since the engine holds one adapter for the
/// lifetime of a graph run and shares it across every node that needs it.
#[async_trait]
pub trait LlmAdapter: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

#[async_trait]
impl LlmAdapter for Arc<dyn LlmAdapter> {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        (**self).generate(prompt).await
    }
}

/// Wraps a synchronous `Fn(&str) -> Result<String, String>` closure so it
/// can be used wherever an [`LlmAdapter`] is expected, offloading the
/// blocking call to a worker thread per spec §6. The closure's `Err` is a
/// provider message, wrapped into [`LlmError::Provider`] on failure.
pub struct SyncLlmAdapter<F> {
    provider: &'static str,
    call: Arc<F>,
}

impl<F> SyncLlmAdapter<F>
where
    F: Fn(&str) -> Result<String, String> + Send + Sync + 'static,
{
    pub fn new(provider: &'static str, call: F) -> Self {
        Self {
            provider,
            call: Arc::new(call),
        }
    }
}

#[async_trait]
impl<F> LlmAdapter for SyncLlmAdapter<F>
where
    F: Fn(&str) -> Result<String, String> + Send + Sync + 'static,
{
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let call = Arc::clone(&self.call);
        let prompt = prompt.to_string();
        let provider = self.provider;
        tokio::task::spawn_blocking(move || call(&prompt))
            .await
            .map_err(|_| LlmError::Join)?
            .map_err(|message| LlmError::Provider {
                provider: provider.to_string(),
                message,
            })
    }
}

/// The schemes an engine-visible model URI may declare (spec §6).
///
/// The engine only validates the scheme; resolving it to a concrete
/// [`LlmAdapter`] is the hosting application's responsibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelScheme {
    Google,
    Ollama,
    OpenRouter,
    MyFlowise,
}

impl fmt::Display for ModelScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModelScheme::Google => "google",
            ModelScheme::Ollama => "ollama",
            ModelScheme::OpenRouter => "openrouter",
            ModelScheme::MyFlowise => "myflowise",
        };
        write!(f, "{s}")
    }
}

impl ModelScheme {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "google" => Some(Self::Google),
            "ollama" => Some(Self::Ollama),
            "openrouter" => Some(Self::OpenRouter),
            "myflowise" => Some(Self::MyFlowise),
            _ => None,
        }
    }
}

/// A parsed `scheme://identifier[@host[:port]]` model URI (spec §6).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelUri {
    pub scheme: ModelSchemeRepr,
    pub identifier: String,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Either a recognised [`ModelScheme`] or an unrecognised scheme string,
/// kept around verbatim for forward compatibility rather than rejected
/// outright — only the closed set is validated, per spec §6.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelSchemeRepr {
    Known(ModelScheme),
    Unknown(String),
}

impl ModelUri {
    /// Parse a model URI, validating only that the scheme is recognised.
    pub fn parse(uri: &str) -> Result<Self, LlmError> {
        let (scheme_str, rest) = uri.split_once("://").ok_or(LlmError::InvalidUri {
            uri: uri.to_string(),
            reason: "missing '://' separator",
        })?;
        if rest.is_empty() {
            return Err(LlmError::InvalidUri {
                uri: uri.to_string(),
                reason: "missing identifier",
            });
        }

        let (identifier, authority) = match rest.split_once('@') {
            Some((id, auth)) => (id, Some(auth)),
            None => (rest, None),
        };
        if identifier.is_empty() {
            return Err(LlmError::InvalidUri {
                uri: uri.to_string(),
                reason: "empty identifier",
            });
        }

        let (host, port) = match authority {
            Some(auth) => match auth.split_once(':') {
                Some((h, p)) => {
                    let port = p.parse::<u16>().map_err(|_| LlmError::InvalidUri {
                        uri: uri.to_string(),
                        reason: "invalid port",
                    })?;
                    (Some(h.to_string()), Some(port))
                }
                None => (Some(auth.to_string()), None),
            },
            None => (None, None),
        };

        let scheme = match ModelScheme::parse(scheme_str) {
            Some(known) => ModelSchemeRepr::Known(known),
            None => ModelSchemeRepr::Unknown(scheme_str.to_string()),
        };

        Ok(ModelUri {
            scheme,
            identifier: identifier.to_string(),
            host,
            port,
        })
    }

    #[must_use]
    pub fn is_known_scheme(&self) -> bool {
        matches!(self.scheme, ModelSchemeRepr::Known(_))
    }
}
