//! Completion provider implementations for ChatRelay.
//!
//! All providers implement the `chatrelay_core::Provider` trait.
//! The factory builds the configured one at startup.

pub mod factory;
pub mod openai_compat;

pub use factory::build_from_config;
pub use openai_compat::OpenAiCompatProvider;
