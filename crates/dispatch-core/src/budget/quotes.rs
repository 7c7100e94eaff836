//! Reference passage selection.

use crate::budget::counter::TokenCounter;
use crate::chat::{Message, QuoteItem};
use crate::prompt::template::render_quote;

/// Quotes that survived the ceiling, and their rendered text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteSelection {
    pub retained: Vec<QuoteItem>,
    pub text: String,
}

/// Keep the longest prefix of `quotes` whose rendered token total stays within `max_tokens`.
///
/// Each quote is rendered through `template` with its 1-based index and measured
/// as a System message. Caller order is relevance order: once a quote does not
/// fit, it and every quote after it are dropped.
pub fn fit_quotes(
    quotes: &[QuoteItem],
    template: &str,
    max_tokens: u32,
    counter: &dyn TokenCounter,
) -> QuoteSelection {
    let mut rendered = Vec::with_capacity(quotes.len());
    let mut used: u32 = 0;

    for (position, quote) in quotes.iter().enumerate() {
        let text = render_quote(template, quote, position + 1);
        let tokens = counter.count_message(&Message::system(text.as_str()));

        if used.saturating_add(tokens) > max_tokens {
            tracing::debug!(
                "Quote budget reached: kept {} of {} quotes ({} / {} tokens)",
                position,
                quotes.len(),
                used,
                max_tokens
            );
            break;
        }

        used = used.saturating_add(tokens);
        rendered.push(text);
    }

    QuoteSelection {
        retained: quotes[..rendered.len()].to_vec(),
        text: rendered.join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::counter::HeuristicTokenCounter;

    /// One token per character, no framing overhead.
    fn char_counter() -> HeuristicTokenCounter {
        HeuristicTokenCounter::new(1.0, 1.0, 0)
    }

    fn quote(q: &str) -> QuoteItem {
        QuoteItem::new().with_field("q", q)
    }

    #[test]
    fn keeps_prefix_that_fits() {
        let quotes = vec![quote("aaaa"), quote("bbbb"), quote("cccc")];

        let selection = fit_quotes(&quotes, "{{q}}", 10, &char_counter());

        assert_eq!(selection.retained, quotes[..2].to_vec());
        assert_eq!(selection.text, "aaaa\nbbbb");
    }

    #[test]
    fn exact_fit_is_kept() {
        let quotes = vec![quote("aaaaa"), quote("bbbbb")];
        let selection = fit_quotes(&quotes, "{{q}}", 10, &char_counter());
        assert_eq!(selection.retained.len(), 2);
    }

    #[test]
    fn later_small_quotes_are_not_backfilled() {
        let quotes = vec![quote("aaaa"), quote("bbbbbbbbbb"), quote("c")];

        let selection = fit_quotes(&quotes, "{{q}}", 10, &char_counter());

        assert_eq!(selection.retained, vec![quote("aaaa")]);
    }

    #[test]
    fn empty_when_first_quote_overflows() {
        let quotes = vec![quote("aaaaaaaaaaaa"), quote("b")];
        let selection = fit_quotes(&quotes, "{{q}}", 10, &char_counter());
        assert!(selection.retained.is_empty());
        assert_eq!(selection.text, "");
    }

    #[test]
    fn empty_input_yields_empty_text() {
        let selection = fit_quotes(&[], "{{q}}", 10, &char_counter());
        assert_eq!(selection, QuoteSelection::default());
    }

    #[test]
    fn index_is_part_of_measured_render() {
        let quotes = vec![quote("aaaa"), quote("bbbb")];
        // "1:aaaa" is 6 tokens, "2:bbbb" would make 12
        let selection = fit_quotes(&quotes, "{{index}}:{{q}}", 10, &char_counter());
        assert_eq!(selection.text, "1:aaaa");
    }

    #[test]
    fn retained_is_always_prefix_within_budget() {
        let counter = char_counter();
        let quotes: Vec<QuoteItem> = (1..=8).map(|n| quote(&"x".repeat(n))).collect();

        for budget in 0..40 {
            let selection = fit_quotes(&quotes, "{{q}}", budget, &counter);
            let n = selection.retained.len();
            assert_eq!(selection.retained, quotes[..n].to_vec());

            let used: u32 = selection
                .text
                .split('\n')
                .filter(|s| !s.is_empty())
                .map(|s| counter.count_text(s))
                .sum();
            assert!(used <= budget);
        }
    }
}
