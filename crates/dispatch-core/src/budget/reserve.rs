use crate::budget::types::BudgetError;

/// Decide how many tokens the response may use.
///
/// Keeps `requested` when prompt + response fit in the context window,
/// otherwise clamps to what is left after the prompt. A window with nothing
/// left is an error rather than a zero or negative budget.
pub fn reserve_response_tokens(
    requested: u32,
    context_max_tokens: u32,
    prompt_tokens: u32,
) -> Result<u32, BudgetError> {
    let reserved = if u64::from(requested) + u64::from(prompt_tokens) > u64::from(context_max_tokens)
    {
        context_max_tokens.saturating_sub(prompt_tokens)
    } else {
        requested
    };

    if reserved == 0 {
        return Err(BudgetError::ResponseBudgetExhausted {
            prompt_tokens,
            context_max_tokens,
        });
    }

    Ok(reserved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_requested_when_it_fits() {
        assert_eq!(reserve_response_tokens(1_000, 4_000, 500), Ok(1_000));
        assert_eq!(reserve_response_tokens(3_500, 4_000, 500), Ok(3_500));
    }

    #[test]
    fn clamps_to_remaining_window() {
        assert_eq!(reserve_response_tokens(4_000, 4_000, 1_500), Ok(2_500));
    }

    #[test]
    fn fails_when_prompt_fills_window() {
        assert_eq!(
            reserve_response_tokens(100, 4_000, 4_000),
            Err(BudgetError::ResponseBudgetExhausted {
                prompt_tokens: 4_000,
                context_max_tokens: 4_000
            })
        );
        assert!(reserve_response_tokens(100, 4_000, 5_000).is_err());
    }

    #[test]
    fn never_exceeds_requested_and_is_idempotent() {
        for requested in [1u32, 100, 2_000, 8_000] {
            for prompt in [0u32, 10, 3_999, 4_000, 9_000] {
                let first = reserve_response_tokens(requested, 4_000, prompt);
                let second = reserve_response_tokens(requested, 4_000, prompt);
                assert_eq!(first, second);
                if let Ok(reserved) = first {
                    assert!(reserved <= requested);
                    if requested + prompt > 4_000 {
                        assert_eq!(reserved, 4_000 - prompt);
                    }
                }
            }
        }
    }
}
