//! Quick actions: improve, synonyms, describe
//!
//! Quick actions are stateless request/response calls against the AI
//! assist endpoint. Before sending, the surrounding document text is
//! trimmed to a word budget around the selection so the request stays
//! small; the selection itself is stripped back out of the window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::assist::{AssistClient, AssistRequest};
use crate::chat::store::ChatStore;
use crate::error::Result;

/// Hard ceiling on trimmed context length (characters)
const MAX_CONTEXT_CHARS: usize = 1000;

/// The kind of quick action requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssistKind {
    /// Rewrite the selection for clarity and style
    Improvement,
    /// Suggest synonyms for the selection
    Synonyms,
    /// Describe what the selection says
    Description,
}

impl AssistKind {
    /// Wire name of this kind, as the backend expects it
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Improvement => "improvement",
            Self::Synonyms => "synonyms",
            Self::Description => "description",
        }
    }
}

impl std::fmt::Display for AssistKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One remembered quick-action result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionRecord {
    /// The selected text the action ran on
    pub original: String,
    /// The suggestion returned by the backend
    pub suggestion: String,
    /// When the action completed
    pub timestamp: DateTime<Utc>,
    /// Which action produced it
    pub kind: AssistKind,
}

/// Trims `context` to a word budget around `text`
///
/// Locates the selection inside the context, expands up to `max_words`
/// words on each side, strips the selection back out of the window, and
/// hard-truncates the result to 1000 characters, breaking on the last
/// whitespace before the ceiling. When the selection cannot be found the
/// full context is returned untouched.
///
/// # Examples
///
/// ```
/// use textly::chat::assist::trim_context;
///
/// let context = "one two three four five six seven";
/// let trimmed = trim_context(context, "four", 1);
/// assert_eq!(trimmed, "three five");
/// ```
pub fn trim_context(context: &str, text: &str, max_words: usize) -> String {
    if context.is_empty() {
        return String::new();
    }

    let words: Vec<&str> = context.split_whitespace().collect();
    let text_word_count = text.split_whitespace().count();

    let Some(text_start) = context.find(text) else {
        return context.to_string();
    };

    // Count the words that begin before the selection by walking byte
    // offsets the same way the words were split out.
    let mut before_word_count = 0usize;
    let mut cursor = 0usize;
    for word in &words {
        if cursor < text_start {
            before_word_count += 1;
        }
        cursor += word.len() + 1;
    }

    let start = before_word_count.saturating_sub(max_words);
    let end = (before_word_count + text_word_count + max_words).min(words.len());
    let mut window = words[start..end].join(" ");

    // Strip the selection back out of the window (first occurrence),
    // consuming one trailing separator so no double space is left behind.
    if let Some(pos) = window.find(text) {
        let mut strip_end = pos + text.len();
        if window[strip_end..].starts_with(' ') {
            strip_end += 1;
        }
        window.replace_range(pos..strip_end, "");
    }
    let result = window.trim().to_string();

    if result.len() <= MAX_CONTEXT_CHARS {
        return result;
    }

    let mut ceiling = MAX_CONTEXT_CHARS;
    while !result.is_char_boundary(ceiling) {
        ceiling -= 1;
    }
    let cut = result[..ceiling].rfind(' ').unwrap_or(ceiling);
    let mut truncated = result[..cut].to_string();
    truncated.push_str("...");
    truncated
}

/// Quick-action service
///
/// Runs assist requests against the backend and keeps the suggestion
/// state (latest suggestions, bounded history, loading and error flags)
/// in the shared [`ChatStore`].
pub struct AssistService {
    client: AssistClient,
    store: ChatStore,
    max_history: usize,
    max_context_words: usize,
}

impl AssistService {
    /// Creates a quick-action service
    ///
    /// # Arguments
    ///
    /// * `client` - Backend assist client
    /// * `store` - Shared chat store to surface state into
    /// * `max_history` - Suggestion history bound
    /// * `max_context_words` - Word budget per side when trimming context
    pub fn new(
        client: AssistClient,
        store: ChatStore,
        max_history: usize,
        max_context_words: usize,
    ) -> Self {
        Self {
            client,
            store,
            max_history,
            max_context_words,
        }
    }

    /// Requests an improvement of the selection
    pub async fn improve(&self, text: &str, context: &str) -> Result<String> {
        self.request(AssistKind::Improvement, text, context).await
    }

    /// Requests synonyms for the selection
    pub async fn synonyms(&self, text: &str, context: &str) -> Result<String> {
        self.request(AssistKind::Synonyms, text, context).await
    }

    /// Requests a description of the selection
    pub async fn describe(&self, text: &str, context: &str) -> Result<String> {
        self.request(AssistKind::Description, text, context).await
    }

    async fn request(&self, kind: AssistKind, text: &str, context: &str) -> Result<String> {
        self.store.update(|state| {
            state.is_assist_loading = true;
            state.assist_error = None;
        });

        let trimmed = trim_context(context, text, self.max_context_words);
        let request = AssistRequest {
            kind,
            text: text.to_string(),
            context: if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            },
        };

        match self.client.request(&request).await {
            Ok(response) => {
                let record = SuggestionRecord {
                    original: text.to_string(),
                    suggestion: response.suggestion.clone(),
                    timestamp: Utc::now(),
                    kind,
                };
                let max_history = self.max_history;
                self.store.update(move |state| {
                    state.suggestions = vec![record.suggestion.clone()];
                    state.is_assist_loading = false;
                    state.history.insert(0, record);
                    state.history.truncate(max_history);
                });
                Ok(response.suggestion)
            }
            Err(e) => {
                let message = e.to_string();
                self.store.update(move |state| {
                    state.assist_error = Some(message);
                    state.is_assist_loading = false;
                    state.suggestions.clear();
                });
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_assist_kind_wire_names() {
        assert_eq!(AssistKind::Improvement.as_str(), "improvement");
        assert_eq!(AssistKind::Synonyms.as_str(), "synonyms");
        assert_eq!(AssistKind::Description.as_str(), "description");
    }

    #[test]
    fn test_assist_kind_serialization() {
        let json = serde_json::to_string(&AssistKind::Improvement).unwrap();
        assert_eq!(json, "\"improvement\"");
        let parsed: AssistKind = serde_json::from_str("\"synonyms\"").unwrap();
        assert_eq!(parsed, AssistKind::Synonyms);
    }

    #[test]
    fn test_trim_context_empty_context() {
        assert_eq!(trim_context("", "sel", 10), "");
    }

    #[test]
    fn test_trim_context_selection_not_found() {
        let context = "alpha beta gamma";
        assert_eq!(trim_context(context, "missing", 10), context);
    }

    #[test]
    fn test_trim_context_strips_selection() {
        let context = "one two three four five";
        let trimmed = trim_context(context, "three", 10);
        assert!(!trimmed.contains("three"));
        assert!(trimmed.contains("two"));
        assert!(trimmed.contains("four"));
    }

    #[test]
    fn test_trim_context_window_budget() {
        let context = "one two three four five six seven";
        assert_eq!(trim_context(context, "four", 1), "three five");
    }

    /// A 250-word context with a 5-word middle selection and
    /// max_words=100 keeps at most 100 words per side and drops the
    /// selection.
    #[test]
    fn test_trim_context_spec_property() {
        let before = words(120);
        let selection = "sa sb sc sd se";
        let after = (0..125)
            .map(|i| format!("a{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let context = format!("{} {} {}", before, selection, after);

        let trimmed = trim_context(&context, selection, 100);
        assert!(!trimmed.contains(selection));

        let kept: Vec<&str> = trimmed.split_whitespace().collect();
        let kept_before = kept.iter().filter(|w| w.starts_with('w')).count();
        let kept_after = kept.iter().filter(|w| w.starts_with('a')).count();
        assert!(kept_before <= 100, "kept {} words before", kept_before);
        assert!(kept_after <= 100, "kept {} words after", kept_after);
    }

    #[test]
    fn test_trim_context_character_ceiling() {
        // Every word is 9 chars + separator, so 2*100 words blows well
        // past the 1000-char ceiling.
        let long_words: Vec<String> = (0..220).map(|i| format!("word{:05}", i)).collect();
        let context = long_words.join(" ");
        let selection = long_words[110].clone();

        let trimmed = trim_context(&context, &selection, 100);
        assert!(trimmed.len() <= MAX_CONTEXT_CHARS + 3);
        assert!(trimmed.ends_with("..."));
        // Break must land on a word boundary, not mid-word.
        let body = trimmed.trim_end_matches("...");
        assert!(context.contains(body.split_whitespace().last().unwrap()));
    }

    #[test]
    fn test_trim_context_no_panic_on_multibyte() {
        let word = "héllo";
        let context = std::iter::repeat(word)
            .take(400)
            .collect::<Vec<_>>()
            .join(" ");
        let trimmed = trim_context(&context, word, 300);
        assert!(trimmed.len() <= MAX_CONTEXT_CHARS + 3);
    }

    #[test]
    fn test_suggestion_record_roundtrip() {
        let record = SuggestionRecord {
            original: "teh".to_string(),
            suggestion: "the".to_string(),
            timestamp: Utc::now(),
            kind: AssistKind::Improvement,
        };
        let json = serde_json::to_string(&record).unwrap();
        let parsed: SuggestionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.original, "teh");
        assert_eq!(parsed.kind, AssistKind::Improvement);
    }
}
