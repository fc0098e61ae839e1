//! Company-name normalization.
//!
//! Turns a raw name into its "core" form: case-folded, punctuation
//! stripped, acronym expanded, and with corporate designators removed.
//! The output only contains lower-case alphanumeric tokens (and `&`)
//! separated by single spaces, so normalizing a core name again is a no-op.

use std::collections::BTreeMap;

use crate::vocabulary::Lexicon;

/// Normalize a company name into its core form.
///
/// Steps:
/// 1. Trim, lower-case, collapse whitespace
/// 2. Substitute a configured acronym (whole string, else leading token)
///    unless the name already starts with its expansion
/// 3. Drop apostrophes; every other punctuation character separates tokens
/// 4. Apply token rewrites (e.g. `bancorporation` -> `bancorp`)
/// 5. Remove designator tokens anywhere in the name and trailing
///    share-class / perpetual / `na` suffixes, until nothing changes
///
/// If nothing is left, the punctuation-stripped name is returned instead so
/// the core is never empty for a non-empty input.
pub fn normalize(raw: &str, acronyms: &BTreeMap<String, String>, lexicon: &Lexicon) -> String {
    normalize_with_tokens(raw, acronyms, lexicon).0
}

/// Like [`normalize`], also returning the name's tokens as they were
/// before designators and suffixes were removed (steps 1-4).
pub fn normalize_with_tokens(
    raw: &str,
    acronyms: &BTreeMap<String, String>,
    lexicon: &Lexicon,
) -> (String, Vec<String>) {
    let folded = collapse_whitespace(&raw.trim().to_lowercase());
    if folded.is_empty() {
        return (folded, Vec::new());
    }

    let expanded = expand_acronym(&folded, acronyms, lexicon);
    let cleaned = strip_punctuation(&expanded);

    let name_tokens: Vec<String> = cleaned
        .split_whitespace()
        .map(|t| lexicon.rewrite(t).to_string())
        .collect();
    let mut tokens: Vec<&str> = name_tokens.iter().map(String::as_str).collect();

    loop {
        let before = tokens.len();
        tokens.retain(|t| !lexicon.is_designator(t));
        strip_trailing_suffixes(&mut tokens);
        if tokens.len() == before {
            break;
        }
    }

    let core = if !tokens.is_empty() {
        tokens.join(" ")
    } else if cleaned.is_empty() {
        folded
    } else {
        cleaned
    };
    (core, name_tokens)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whole-string match first, then the leading token with surrounding
/// punctuation trimmed. A name that already begins with the expansion is
/// left alone, so an expansion starting with its own acronym
/// (`apple` -> `Apple Computer`) is not applied twice.
fn expand_acronym(folded: &str, acronyms: &BTreeMap<String, String>, lexicon: &Lexicon) -> String {
    if acronyms.is_empty() {
        return folded.to_string();
    }

    let mut parts = folded.splitn(2, ' ');
    let leading = parts.next().unwrap_or_default();
    let rest = parts.next();
    let (expansion, rest) = match acronyms.get(folded) {
        Some(expansion) => (expansion, None),
        None => match acronyms.get(leading.trim_matches(|c: char| !c.is_alphanumeric())) {
            Some(expansion) => (expansion, rest),
            None => return folded.to_string(),
        },
    };
    if starts_with_expansion(folded, expansion, lexicon) {
        return folded.to_string();
    }
    match rest {
        Some(rest) => format!("{} {}", expansion.to_lowercase(), rest),
        None => expansion.to_lowercase(),
    }
}

/// Compare on the tokens that survive normalization, so designators and
/// punctuation in either string do not matter.
fn starts_with_expansion(folded: &str, expansion: &str, lexicon: &Lexicon) -> bool {
    let significant = |s: &str| -> Vec<String> {
        strip_punctuation(&s.to_lowercase())
            .split_whitespace()
            .map(|t| lexicon.rewrite(t).to_string())
            .filter(|t| !lexicon.is_designator(t))
            .collect()
    };
    let expansion = significant(expansion);
    !expansion.is_empty() && significant(folded).starts_with(&expansion)
}

fn strip_punctuation(s: &str) -> String {
    let replaced: String = s
        .chars()
        .filter(|c| *c != '\'' && *c != '\u{2019}')
        .map(|c| {
            if c.is_alphanumeric() || c == '&' || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    collapse_whitespace(&replaced)
}

/// Drop `class a` / `cl b`, `perp` (with a preceding `<series> <n>`), and a
/// bank-style trailing `na`.
fn strip_trailing_suffixes(tokens: &mut Vec<&str>) {
    loop {
        let n = tokens.len();
        if n >= 3 && matches!(tokens[n - 2], "class" | "cl") && is_share_class(tokens[n - 1]) {
            tokens.truncate(n - 2);
        } else if n >= 2 && tokens[n - 1] == "perp" {
            tokens.truncate(n - 1);
            let m = tokens.len();
            if m >= 3 && tokens[m - 1].chars().all(|c| c.is_ascii_digit()) {
                tokens.truncate(m - 2);
            }
        } else if n >= 2 && tokens[n - 1] == "na" {
            tokens.truncate(n - 1);
        } else {
            break;
        }
    }
}

fn is_share_class(token: &str) -> bool {
    token.len() == 1 && token.chars().all(|c| c.is_ascii_lowercase())
}
