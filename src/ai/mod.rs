//! AI Integration Layer
//!
//! Provider abstraction and resilient invocation of the text-generation
//! service used to regenerate document sections.

pub mod invoker;
pub mod provider;
pub mod timeout;

pub use invoker::{ResilientInvoker, RetryPolicy};
pub use provider::{
    ConfigProviderFactory, LlmProvider, LlmResponse, OllamaProvider, OpenAiProvider,
    ProviderConfig, ProviderFactory, ResponseMetadata, ResponseTiming, SharedFactory,
    SharedProvider, TokenUsage, create_provider,
};
pub use timeout::{TimeoutConfig, with_timeout};
