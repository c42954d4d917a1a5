use rustc_hash::FxHashMap;

/// Maximum token length to store in the index.
/// Longer runs are usually hashes, base64 or other non-searchable content.
const MAX_TOKEN_LENGTH: usize = 64;

/// Split text into lowercase alphanumeric word tokens, in document order.
///
/// Non-ASCII alphanumerics are kept so that accented words survive; any other
/// character separates tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        if ch.is_alphanumeric() {
            current.extend(ch.to_lowercase());
        } else if !current.is_empty() {
            push_token(&mut tokens, &mut current);
        }
    }

    if !current.is_empty() {
        push_token(&mut tokens, &mut current);
    }

    tokens
}

fn push_token(tokens: &mut Vec<String>, current: &mut String) {
    if current.chars().count() <= MAX_TOKEN_LENGTH {
        tokens.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

/// Count term frequencies for a document.
/// Returns the per-term counts and the document length in tokens.
pub fn term_frequencies(text: &str) -> (FxHashMap<String, u32>, u32) {
    let tokens = tokenize(text);
    let doc_len = tokens.len() as u32;

    let mut counts: FxHashMap<String, u32> = FxHashMap::default();
    for token in tokens {
        *counts.entry(token).or_insert(0) += 1;
    }

    (counts, doc_len)
}

/// Normalize a query term the same way documents are tokenized.
/// Returns `None` when nothing searchable remains.
pub fn normalize_term(term: &str) -> Option<String> {
    let mut tokens = tokenize(term);
    match tokens.len() {
        0 => None,
        1 => tokens.pop(),
        // multi-word input is looked up as its first word
        _ => Some(tokens.swap_remove(0)),
    }
}
