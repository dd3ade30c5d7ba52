//! Narrative collaborator for the Advisor Gym.
//!
//! After a turn is finalized the session hands a [`NarrativeContext`] to a
//! [`Narrator`], which returns the client's message and a short market
//! commentary. Narration is display-only: nothing it returns feeds back into
//! the simulation.
//!
//! # Usage
//!
//! ```ignore
//! use narrative::{AnyNarrator, Narrator, DEFAULT_MODEL};
//!
//! let narrator = AnyNarrator::from_env_or_fallback(DEFAULT_MODEL);
//! let text = narrator.generate(&context).await?;
//! println!("{}", text.client_message);
//! ```

mod context;
mod error;
mod generator;
pub mod prompt;

pub use context::{NarrativeContext, NarrativeSource, NarrativeText, ValueDirection};
pub use error::NarrativeError;
pub use generator::{AnyNarrator, DEFAULT_MODEL, FallbackNarrator, LlmNarrator, Narrator};
