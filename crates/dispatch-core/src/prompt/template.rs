//! `{{variable}}` substitution for quote templates and quote prompts.

use crate::chat::QuoteItem;

/// Used when the caller does not supply a quote template.
pub const DEFAULT_QUOTE_TEMPLATE: &str = "{{q}}\n{{a}}";

/// Used when the caller does not supply a quote prompt.
pub const DEFAULT_QUOTE_PROMPT: &str = r#"Use the content between the triple quotes as your knowledge:
"""
{{quote}}
"""
My question is: "{{question}}""#;

/// Replace every `{{key}}` in `text` with its value. Unknown placeholders are left as-is.
pub fn replace_variables<'a, I>(text: &str, variables: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    variables
        .into_iter()
        .fold(text.to_string(), |acc, (key, value)| {
            acc.replace(&format!("{{{{{key}}}}}"), value)
        })
}

/// Render one quote. `index` is the quote's 1-based position in the caller's list.
pub fn render_quote(template: &str, quote: &QuoteItem, index: usize) -> String {
    let index = index.to_string();
    let values: Vec<(&str, String)> = quote
        .fields
        .keys()
        .filter(|key| key.as_str() != "index")
        .filter_map(|key| quote.field_text(key).map(|value| (key.as_str(), value)))
        .collect();

    let rendered = replace_variables(template, values.iter().map(|(k, v)| (*k, v.as_str())));
    replace_variables(&rendered, [("index", index.as_str())])
}

/// Merge the rendered quotes and the question through the quote prompt.
pub fn render_quote_prompt(quote_prompt: &str, quote_text: &str, question: &str) -> String {
    replace_variables(quote_prompt, [("quote", quote_text), ("question", question)])
}
