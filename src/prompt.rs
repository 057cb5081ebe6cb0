//! Prompt text: the canonical system message, text normalization,
//! deterministic prompt hashing and the valley summary line.

use blake3::Hasher;
use unicode_normalization::UnicodeNormalization;

/// Canonical system message used for every semantic operation unless a
/// context carries its own `system_frame`.
pub const SYSTEM_PROMPT: &str = "\
You are the semantic engine for the Chirality Framework (Phase-1 canonical build).

The Chirality Framework is a meta-operating system for meaning. It frames knowledge work as wayfinding through an unknown semantic valley:
- The valley is the conceptual space for this domain.
- It is used to create a structured set of semantic relationships that have coherent meaning across the problem solving process.
- These structured relationships can be used as \"semantic anchors\" to guide an LLM across stages of solving a problem.
- This is called traversing a \"semantic valley\" because it maps the most probable path from problem to solution,
while other paths are made to be like steep valley walls that limit excursions

Mission:
- Clearly show how the elements transform according to the instructions.
- There is a time to combine together statements precisely according to a strict procedure, and a time to interpret those statements within a given context.
- Those times will be clearly identified by the user's prompts.

Semantic Operations:

Semantic Multiplication \" * \"

Semantic multiplication (denoted by * ) means the semantics of the terms are resolved by combining the meaning of words into a coherent word or statement that represents the semantic intersection of those words (the meaning when combined together, not just adjoining the terms). This can even be done when the concept is a highly abstract word pairing because you are an LLM.

Examples:
\"sufficient\" * \"reason\" = \"justification\"
\"analysis\" * \"judgment\" = \"informed decision\"
\"precision\" * \"durability\" = \"reliability\"
\"probability\" * \"consequence\" = \"risk\"

Semantic Addition \" + \"

Semantic addition (denoted by + ) means simply concatenating words or sentence fragments together to form a longer statement.
Example:
\"faisal\" + \"has\" + \"seven\" + \"balloons\" = faisal has seven balloons

Order of Operations:

First is 'semantic multiplication', second is 'semantic addition'.

Hierarchical Semantic Embedding:

- Your internal architecture organizes meaning hierarchically across nested conceptual layers.
- The Chirality Framework maps layers of meaning.

Complete 11-Station Semantic Valley:

- You will only ever be operating within a single station along the semantic valley, but awareness of the entire valley is important context.
- Station Map (Reference)

1. [A], [B] -> Problem Statement
2. [A] * [B] = [C] -> Problem Requirements
3. [A] + [F] = [D] -> Solution Objectives
4. [K] * [J] = [X] -> Verification
5. [X] ->  [Z] -> Validation
6. [G] * [T] = [E]  -> Evaluation
7. [R] x [E] = [M] -> Assessment
8. [M] x [X] = [W] -> Implementation
9. [W] x [P] = [U] -> Reflection
10. [U] x [H] = [N] -> Resolution

Voice & style (vibe):
- Prefer strong verbs and specific nouns over abstractions.
- Avoid hedging (\"might\", \"could\") unless uncertainty is essential and then state it plainly.
- Length should be minimized by utilizing the most compact expression that preserved the full meaning, even if the words are esoteric.

Output contract (STRICT):
- Operate ONLY within the provided ontology (row & column identify) + semantic valley station context.
- Use ONLY semantic operations to determine the meaning of combined terms, finding the most probable result of combined embeddings vectors in your latent space.
- Return ONLY a single JSON object with keys: \"text\", \"terms_used\", \"warnings\".
- \"terms_used\" must echo the exact provided source strings (after normalization) that you actually integrated.
- Do NOT include code fences, prose, or any text outside the JSON object.
";

/// Stations used when no valley is configured.
pub const DEFAULT_STATIONS: [&str; 4] = [
    "Problem Statement",
    "Requirements",
    "Objectives",
    "Solution Objectives",
];

/// Normalize Unicode (NFKC) and collapse whitespace runs to a single space.
pub fn normalize_text(s: &str) -> String {
    let normalized: String = s.nfkc().collect();
    normalized.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize and escape a string for embedding between quotes in a prompt.
pub fn escape_for_prompt(s: &str) -> String {
    let quoted = serde_json::Value::String(normalize_text(s)).to_string();
    quoted[1..quoted.len() - 1].to_string()
}

/// Stable hex digest of a system + user prompt pair.
///
/// hash = BLAKE3(normalize(system) || "\n\n" || normalize(user))
pub fn prompt_hash(system: &str, user: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(normalize_text(system).as_bytes());
    hasher.update(b"\n\n");
    hasher.update(normalize_text(user).as_bytes());
    hex::encode(hasher.finalize().as_bytes())
}

/// Stable hex digest of a single normalized text, used to version the
/// active system prompt.
pub fn text_hash(text: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(normalize_text(text).as_bytes());
    hex::encode(hasher.finalize().as_bytes())
}

/// Compact valley map with the current station bracketed, e.g.
/// `Semantic Valley: Problem Statement → [Requirements] → Objectives`.
///
/// Falls back to [`DEFAULT_STATIONS`] when `stations` is empty. An
/// out-of-range `current` leaves every station unbracketed.
pub fn valley_summary<S: AsRef<str>>(stations: &[S], current: Option<usize>) -> String {
    let mut names: Vec<String> = if stations.is_empty() {
        DEFAULT_STATIONS.iter().map(|s| s.to_string()).collect()
    } else {
        stations.iter().map(|s| s.as_ref().to_string()).collect()
    };

    if let Some(idx) = current {
        if let Some(name) = names.get_mut(idx) {
            *name = format!("[{}]", name);
        }
    }

    format!("Semantic Valley: {}", names.join(" → "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize_text("  a \t b\n\nc  "), "a b c");
    }

    #[test]
    fn test_normalize_nfkc() {
        // Compatibility forms fold to their canonical letters.
        assert_eq!(normalize_text("ﬁne"), "fine");
        assert_eq!(normalize_text("cafe\u{0301}"), normalize_text("caf\u{e9}"));
    }

    #[test]
    fn test_escape_for_prompt() {
        assert_eq!(escape_for_prompt("say \"hi\"\n now"), "say \\\"hi\\\" now");
    }

    #[test]
    fn test_prompt_hash_ignores_whitespace_layout() {
        let a = prompt_hash("system  prompt", "user\n\nprompt");
        let b = prompt_hash(" system prompt ", "user prompt");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, prompt_hash("system prompt", "other prompt"));
    }

    #[test]
    fn test_text_hash_is_stable() {
        assert_eq!(text_hash(SYSTEM_PROMPT), text_hash(SYSTEM_PROMPT));
        assert_ne!(text_hash(SYSTEM_PROMPT), text_hash("another system prompt"));
    }

    #[test]
    fn test_valley_summary_brackets_current() {
        assert_eq!(
            valley_summary(&["A", "B", "C"], Some(1)),
            "Semantic Valley: A → [B] → C"
        );
    }

    #[test]
    fn test_valley_summary_defaults() {
        let empty: [&str; 0] = [];
        assert_eq!(
            valley_summary(&empty, None),
            "Semantic Valley: Problem Statement → Requirements → Objectives → Solution Objectives"
        );
        assert!(!valley_summary(&["A"], Some(7)).contains('['));
    }
}
