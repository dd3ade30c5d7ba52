//! Narrator implementations.

use std::future::Future;

use rig::client::ProviderClient;
use rig::providers::gemini;
use tracing::debug;

use crate::context::{NarrativeContext, NarrativeText};
use crate::error::NarrativeError;
use crate::prompt;

/// Default Gemini model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Produces client-facing text for a finalized turn.
///
/// Implementations only read the context; they never see the session.
pub trait Narrator {
    fn generate(
        &self,
        context: &NarrativeContext,
    ) -> impl Future<Output = Result<NarrativeText, NarrativeError>> + Send;
}

// =============================================================================
// LLM narrator
// =============================================================================

/// Narrator backed by Gemini through `rig`.
pub struct LlmNarrator {
    client: gemini::Client,
    model: String,
}

impl LlmNarrator {
    /// Create a narrator from the `GEMINI_API_KEY` env var.
    pub fn from_env(model: impl Into<String>) -> Result<Self, NarrativeError> {
        let Ok(key) = std::env::var("GEMINI_API_KEY") else {
            return Err(NarrativeError::Unavailable("GEMINI_API_KEY is not set".into()));
        };
        if key.trim().is_empty() {
            return Err(NarrativeError::Unavailable("GEMINI_API_KEY is empty".into()));
        }
        let client = gemini::Client::from_env();
        Ok(Self {
            client,
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        preamble: &str,
        prompt: &str,
        temperature: f64,
        what: &'static str,
    ) -> Result<String, NarrativeError> {
        use rig::client::CompletionClient;
        use rig::completion::Prompt;

        let agent = self
            .client
            .agent(&self.model)
            .preamble(preamble)
            .temperature(temperature)
            .build();

        let response = agent
            .prompt(prompt)
            .await
            .map_err(|e| NarrativeError::Generation(e.to_string()))?;

        let text = response.trim();
        if text.is_empty() {
            return Err(NarrativeError::EmptyResponse(what));
        }
        Ok(text.to_string())
    }
}

impl Narrator for LlmNarrator {
    async fn generate(&self, context: &NarrativeContext) -> Result<NarrativeText, NarrativeError> {
        debug!(model = %self.model, turn = %context.turn, "Generating narrative");

        let client_message = self
            .complete(
                &prompt::client_preamble(context),
                &prompt::client_prompt(context),
                0.9,
                "client message",
            )
            .await?;
        let market_commentary = self
            .complete(
                prompt::COMMENTARY_PREAMBLE,
                &prompt::commentary_prompt(context),
                0.8,
                "market commentary",
            )
            .await?;

        Ok(NarrativeText::generated(client_message, market_commentary))
    }
}

// =============================================================================
// Fallback narrator
// =============================================================================

/// Deterministic canned text. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackNarrator;

impl Narrator for FallbackNarrator {
    async fn generate(&self, context: &NarrativeContext) -> Result<NarrativeText, NarrativeError> {
        Ok(NarrativeText::fallback(context))
    }
}

/// Either narrator, chosen at runtime.
pub enum AnyNarrator {
    Llm(LlmNarrator),
    Fallback(FallbackNarrator),
}

impl AnyNarrator {
    /// Use the LLM when a key is configured, canned text otherwise.
    pub fn from_env_or_fallback(model: impl Into<String>) -> Self {
        match LlmNarrator::from_env(model) {
            Ok(llm) => AnyNarrator::Llm(llm),
            Err(e) => {
                debug!(error = %e, "Using fallback narrator");
                AnyNarrator::Fallback(FallbackNarrator)
            }
        }
    }
}

impl Narrator for AnyNarrator {
    async fn generate(&self, context: &NarrativeContext) -> Result<NarrativeText, NarrativeError> {
        match self {
            AnyNarrator::Llm(llm) => llm.generate(context).await,
            AnyNarrator::Fallback(fallback) => fallback.generate(context).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::sample_context;
    use psychology::ClientIntent;

    #[tokio::test]
    async fn test_fallback_narrator() {
        let ctx = sample_context(ClientIntent::Greedy, 0.09);
        let text = FallbackNarrator.generate(&ctx).await.unwrap();
        assert!(text.is_fallback());
        assert!(text.client_message.contains("+9.0%"));
    }

    #[tokio::test]
    #[ignore = "requires GEMINI_API_KEY"]
    async fn test_llm_narrator() {
        let narrator = LlmNarrator::from_env(DEFAULT_MODEL).unwrap();
        let ctx = sample_context(ClientIntent::Concerned, -0.04);
        let text = narrator.generate(&ctx).await.unwrap();

        assert!(!text.is_fallback());
        assert!(!text.client_message.is_empty());
        assert!(!text.market_commentary.is_empty());
    }
}
