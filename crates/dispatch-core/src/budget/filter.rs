//! Context filtering for the assembled message sequence.

use crate::budget::counter::TokenCounter;
use crate::budget::types::BudgetError;
use crate::chat::Message;

/// Tokens held back from the context window for role/format overhead.
pub const CONTEXT_SAFETY_MARGIN: u32 = 300;

/// Trim `messages` from the front until the total fits in `max_tokens`.
///
/// The leading run of System messages and the final message (the question)
/// are anchors and are never dropped. Everything between them is kept
/// newest-first: the oldest history goes first, and once one message does
/// not fit, every older message is dropped with it.
///
/// Fails with [`BudgetError::ContextExhausted`] when the anchors alone exceed
/// `max_tokens`.
pub fn filter_context(
    messages: Vec<Message>,
    max_tokens: u32,
    counter: &dyn TokenCounter,
) -> Result<Vec<Message>, BudgetError> {
    let chat_start = messages
        .iter()
        .position(|m| !m.is_system())
        .unwrap_or(messages.len());

    let mut messages = messages;
    let mut chats = messages.split_off(chat_start);
    let system_prompts = messages;

    let Some(question) = chats.pop() else {
        // Nothing but system prompts.
        let tokens = counter.count_messages(&system_prompts);
        if tokens > max_tokens {
            return Err(BudgetError::ContextExhausted {
                required_tokens: tokens,
                available_tokens: max_tokens,
            });
        }
        return Ok(system_prompts);
    };

    let anchor_tokens = counter
        .count_messages(&system_prompts)
        .saturating_add(counter.count_message(&question));
    if anchor_tokens > max_tokens {
        return Err(BudgetError::ContextExhausted {
            required_tokens: anchor_tokens,
            available_tokens: max_tokens,
        });
    }

    let total_chats = chats.len();
    let mut used = anchor_tokens;
    let mut kept: Vec<Message> = Vec::new();

    for message in chats.into_iter().rev() {
        let tokens = counter.count_message(&message);
        if used.saturating_add(tokens) > max_tokens {
            break;
        }
        used = used.saturating_add(tokens);
        kept.push(message);
    }
    kept.reverse();

    if kept.len() < total_chats {
        tracing::debug!(
            "Context filter dropped {} oldest messages ({} / {} tokens kept)",
            total_chats - kept.len(),
            used,
            max_tokens
        );
    }

    let mut filtered = system_prompts;
    filtered.extend(kept);
    filtered.push(question);
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::counter::HeuristicTokenCounter;
    use crate::chat::Role;

    fn char_counter() -> HeuristicTokenCounter {
        HeuristicTokenCounter::new(1.0, 1.0, 0)
    }

    #[test]
    fn returns_everything_when_within_budget() {
        let messages = vec![
            Message::system("sys"),
            Message::human("old"),
            Message::ai("ans"),
            Message::human("now"),
        ];

        let filtered = filter_context(messages.clone(), 100, &char_counter()).unwrap();

        assert_eq!(filtered, messages);
    }

    #[test]
    fn drops_oldest_history_first() {
        let messages = vec![
            Message::system("sys"),
            Message::human("aaaa"),
            Message::ai("bbbb"),
            Message::human("cccc"),
            Message::ai("dddd"),
            Message::human("q"),
        ];

        // sys(3) + q(1) + dddd(4) + cccc(4) = 12
        let filtered = filter_context(messages, 12, &char_counter()).unwrap();

        let contents: Vec<&str> = filtered.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["sys", "cccc", "dddd", "q"]);
    }

    #[test]
    fn stops_at_first_message_that_does_not_fit() {
        let messages = vec![
            Message::human("a"),
            Message::ai("bbbbbbbbbb"),
            Message::human("q"),
        ];

        let filtered = filter_context(messages, 5, &char_counter()).unwrap();

        assert_eq!(filtered, vec![Message::human("q")]);
    }

    #[test]
    fn limit_prompt_before_question_is_preferred_over_history() {
        let messages = vec![
            Message::system("sys"),
            Message::human("history"),
            Message::system("limit"),
            Message::human("q"),
        ];

        let filtered = filter_context(messages, 10, &char_counter()).unwrap();

        assert_eq!(
            filtered,
            vec![Message::system("sys"), Message::system("limit"), Message::human("q")]
        );
    }

    #[test]
    fn keeps_leading_system_prompt_over_history() {
        let messages = vec![
            Message::system("a long system prompt"),
            Message::human("hello there"),
            Message::human("q"),
        ];

        let filtered = filter_context(messages, 25, &char_counter()).unwrap();

        assert_eq!(filtered.first().map(|m| m.role), Some(Role::System));
        assert_eq!(filtered.len(), 2);
    }

    #[test]
    fn errors_when_anchors_overflow() {
        let messages = vec![Message::system("x".repeat(50)), Message::human("q")];

        let result = filter_context(messages, 10, &char_counter());

        assert_eq!(
            result,
            Err(BudgetError::ContextExhausted {
                required_tokens: 51,
                available_tokens: 10
            })
        );
    }

    #[test]
    fn question_always_survives_and_budget_holds() {
        let counter = HeuristicTokenCounter::default();
        let mut messages = vec![Message::system("You answer questions.")];
        for i in 0..40 {
            messages.push(Message::human(format!("question number {i} with padding")));
            messages.push(Message::ai(format!("answer number {i} with some more padding")));
        }
        messages.push(Message::human("final question"));

        for max in [60u32, 100, 250, 500, 2_000] {
            let filtered = filter_context(messages.clone(), max, &counter).unwrap();
            assert_eq!(filtered.last(), Some(&Message::human("final question")));
            assert!(counter.count_messages(&filtered) <= max);
        }
    }

    #[test]
    fn only_system_messages() {
        let messages = vec![Message::system("abc")];
        assert_eq!(filter_context(messages.clone(), 3, &char_counter()), Ok(messages));
    }
}
