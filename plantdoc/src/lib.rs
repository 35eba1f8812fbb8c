//! Plant health and nutrition diagnosis over hosted APIs.
//!
//! DESIGN
//! ======
//! Every outbound call goes through one [`dispatch::Dispatcher`], so retry,
//! backoff, and the transient/terminal split are identical for the diagnosis
//! API and the generative-text API. Domain modules only build payloads and
//! decode responses.
//!
//! State owned by a caller (a conversation, a result list) is never shared:
//! each assistant owns its own log, and notifications go through an injected
//! [`notify::Notifier`] rather than a global.

pub mod chat;
pub mod config;
pub mod diagnosis;
pub mod llm;
pub mod notify;
pub mod report;
pub mod services;
pub mod symptoms;
pub mod typewriter;

#[cfg(test)]
pub(crate) mod test_helpers;
