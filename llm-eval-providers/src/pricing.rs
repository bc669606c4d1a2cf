//! Per-model token pricing
//!
//! Rates are USD per 1,000 tokens, with input and output billed separately.
//! Models missing from a table have no cost rather than a guessed one.

use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenPricing {
    pub input_per_1k: Decimal,
    pub output_per_1k: Decimal,
}

impl TokenPricing {
    pub const fn new(input_per_1k: Decimal, output_per_1k: Decimal) -> Self {
        Self {
            input_per_1k,
            output_per_1k,
        }
    }

    /// Cost of one call
    pub fn cost(&self, input_tokens: u64, output_tokens: u64) -> Decimal {
        let thousand = Decimal::from(1000);
        (Decimal::from(input_tokens) / thousand) * self.input_per_1k
            + (Decimal::from(output_tokens) / thousand) * self.output_per_1k
    }
}

/// Rates for models served through the chat-completions API
pub fn chat_completion_pricing(model: &str) -> Option<TokenPricing> {
    let (input, output) = match model {
        "gpt-4-turbo-preview" | "gpt-4-turbo" => (Decimal::new(1, 2), Decimal::new(3, 2)),
        "gpt-4" => (Decimal::new(3, 2), Decimal::new(6, 2)),
        "gpt-4o" => (Decimal::new(5, 3), Decimal::new(15, 3)),
        "gpt-4o-mini" => (Decimal::new(15, 5), Decimal::new(6, 4)),
        "gpt-3.5-turbo" => (Decimal::new(5, 4), Decimal::new(15, 4)),
        _ => return None,
    };
    Some(TokenPricing::new(input, output))
}

/// Rates for models served through the messages API
pub fn messages_pricing(model: &str) -> Option<TokenPricing> {
    let (input, output) = match model {
        "claude-3-opus-20240229" => (Decimal::new(15, 3), Decimal::new(75, 3)),
        "claude-3-sonnet-20240229" | "claude-3-5-sonnet-20240620" | "claude-3-5-sonnet-20241022" => {
            (Decimal::new(3, 3), Decimal::new(15, 3))
        }
        "claude-3-haiku-20240307" => (Decimal::new(25, 5), Decimal::new(125, 5)),
        _ => return None,
    };
    Some(TokenPricing::new(input, output))
}
