//! String and code similarity primitives shared by the client resolver and
//! the product matcher.
//!
//! All functions are pure. Scores are in `[0, 1]`, and the thresholds used by
//! the resolvers assume plain Levenshtein distance (unit costs, no
//! transposition) over normalized text.

use strsim::levenshtein;

/// Corporate suffixes ignored when building search terms from a name
const STOP_WORDS: &[&str] = &[
    "ltda", "ltd", "sa", "eireli", "me", "epp", "mei", "cia", "inc", "corp", "dos", "das",
];

/// Maximum number of search terms extracted from a name
const MAX_SEARCH_TERMS: usize = 3;

/// Lowercase, drop punctuation and collapse whitespace.
pub fn normalize_text(value: &str) -> String {
    let stripped: String = value
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Similarity of two free-text values, `(max_len - distance) / max_len`.
///
/// Returns `0.0` when either side is empty after normalization and exactly
/// `1.0` when both normalize to the same string.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let a = normalize_text(a);
    let b = normalize_text(b);

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let max_len = a.chars().count().max(b.chars().count());
    let distance = levenshtein(&a, &b);
    (max_len - distance) as f64 / max_len as f64
}

/// Canonical form of a SKU or internal code ("AB-001" -> "ab001").
pub fn normalize_code(code: &str) -> String {
    code.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Canonical unit of measure. Unknown units are returned lowercased.
pub fn normalize_unit(unit: &str) -> String {
    let unit = unit.trim().to_lowercase();
    let canonical = match unit.as_str() {
        "kg" | "kgs" | "quilograma" | "quilogramas" => "kg",
        "l" | "lt" | "lts" | "litro" | "litros" => "l",
        "ml" | "mililitro" | "mililitros" => "ml",
        "g" | "gr" | "grs" | "grama" | "gramas" => "g",
        "ton" | "tonelada" | "toneladas" | "t" => "t",
        "un" | "und" | "unidade" | "unidades" => "un",
        "pc" | "pcs" | "peça" | "peças" | "peca" | "pecas" => "pc",
        _ => return unit,
    };
    canonical.to_string()
}

/// Up to three meaningful tokens of a company or product name, in order.
pub fn extract_search_terms(name: &str) -> Vec<String> {
    normalize_text(name)
        .split_whitespace()
        .filter(|token| token.chars().count() > 2 && !STOP_WORDS.contains(token))
        .take(MAX_SEARCH_TERMS)
        .map(str::to_string)
        .collect()
}

/// Keep only ASCII digits (CNPJ/CPF cleaning).
pub fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}
