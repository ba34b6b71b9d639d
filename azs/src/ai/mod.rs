//! AI-assisted analysis
//!
//! The provider is opaque to the core: text in, text out. One
//! OpenAI-compatible HTTP implementation is included; anything speaking
//! the same wire shape works. Analysis is manual-only unless
//! `AZSCOPE_AI_AUTO` is set, and entirely absent without credentials.

mod provider;

pub use provider::{AiError, Analyst, HttpAnalyst};

#[cfg(test)]
pub use provider::mock::MockAnalyst;
