//! Code generation: the local fallback responder, the HTTP generator the chat
//! orchestrator talks to, and the ordered endpoint chain behind the proxy route.

pub mod chain;
pub mod fallback;
pub mod generator;
pub mod templates;

pub use chain::{AttemptFailure, ChainExhausted, EndpointChain};
pub use fallback::{resolve, respond};
pub use generator::{FallbackGenerator, GenerateError, Generator, HttpGenerator};
pub use templates::{Template, TemplateKind};
