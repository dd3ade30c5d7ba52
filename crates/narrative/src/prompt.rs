//! Prompt construction for the LLM narrator.

use crate::context::NarrativeContext;

/// Preamble for market commentary.
pub const COMMENTARY_PREAMBLE: &str = r#"You are a sharp, conversational finance professor explaining a market event to a smart student who is new to investing.

Tone: smart but plain English. No bullet points. No fluff. Make it genuinely interesting and something the student would actually remember."#;

/// Preamble that puts the model in the client's shoes.
pub fn client_preamble(ctx: &NarrativeContext) -> String {
    let mood = if ctx.anxiety > 70.0 {
        "very anxious and emotional"
    } else if ctx.anxiety > 45.0 {
        "moderately concerned"
    } else {
        "calm and rational"
    };
    let trust = if ctx.trust > 65.0 {
        "high. You generally believe in them"
    } else if ctx.trust > 40.0 {
        "moderate. You want reassurance"
    } else {
        "low. You are skeptical of their advice"
    };

    format!(
        "You are {name}, a real person with money invested with a financial advisor.\n\
         You have a specific personality:\n\
         - You are {mood} about money\n\
         - Your trust in your advisor is {trust}\n\
         - You speak casually, like a real person texting or emailing\n\
         - You never sound like a financial textbook\n\
         - You sometimes ramble, ask multiple questions, or express contradictory feelings",
        name = ctx.client_name,
    )
}

/// The situation the client reacts to.
pub fn client_prompt(ctx: &NarrativeContext) -> String {
    format!(
        "Write your message to your financial advisor right now.\n\n\
         The situation:\n\
         - It's check-in #{turn} of your relationship\n\
         - The market just had a {regime} period\n\
         - Your portfolio {direction} {ret}\n\
         - Your portfolio is {equity}% stocks, {bond}% bonds, {cash}% cash\n\
         - You are saving for: {goal}\n\
         - Your risk tolerance is {tolerance}\n\
         - Your anxiety right now: {anxiety:.0}/100\n\
         - Your current mood: {mood}\n\n\
         Rules:\n\
         - 2-4 sentences max\n\
         - No greetings like \"Hi\" or \"Dear\"\n\
         - Reference your goal ({goal}) naturally\n\
         - Show your actual emotion. Don't be polite if you're scared\n\n\
         Write ONLY the message. Nothing else.",
        turn = ctx.turn.raw(),
        regime = ctx.regime,
        direction = ctx.value_direction,
        ret = ctx.return_pct(),
        equity = ctx.equity_pct,
        bond = ctx.bond_pct,
        cash = ctx.cash_pct,
        goal = ctx.client_goal,
        tolerance = ctx.risk_tolerance,
        anxiety = ctx.anxiety,
        mood = ctx.intent_description,
    )
}

pub fn commentary_prompt(ctx: &NarrativeContext) -> String {
    format!(
        "What just happened: {regime}. {description}\n\
         Portfolio result: {ret} this period\n\n\
         Write exactly 2 sentences:\n\
         1. A real-world explanation of why this market condition happens, referencing something concrete like interest rates, earnings, inflation, sentiment or a historical parallel\n\
         2. One specific thing a skilled wealth manager does differently than an average one in this environment\n\n\
         Write ONLY the 2 sentences.",
        regime = ctx.regime,
        description = ctx.regime_description,
        ret = ctx.return_pct(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::tests::sample_context;
    use psychology::ClientIntent;

    #[test]
    fn test_client_prompt_carries_situation() {
        let ctx = sample_context(ClientIntent::Concerned, -0.04);
        let prompt = client_prompt(&ctx);
        assert!(prompt.contains("check-in #3"));
        assert!(prompt.contains("lost -4.0%"));
        assert!(prompt.contains("60% stocks"));
        assert!(prompt.contains("buying a home"));
    }

    #[test]
    fn test_preamble_reflects_mood() {
        let mut ctx = sample_context(ClientIntent::Panic, -0.1);
        ctx.anxiety = 85.0;
        ctx.trust = 20.0;
        let preamble = client_preamble(&ctx);
        assert!(preamble.contains("very anxious"));
        assert!(preamble.contains("skeptical"));
    }

    #[test]
    fn test_commentary_prompt() {
        let ctx = sample_context(ClientIntent::NeutralCheckin, 0.02);
        let prompt = commentary_prompt(&ctx);
        assert!(prompt.contains("correction"));
        assert!(prompt.contains("+2.0%"));
    }
}
