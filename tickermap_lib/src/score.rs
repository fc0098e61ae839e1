//! Token-order-insensitive name similarity.
//!
//! Scores are Indel ratios: `2 * LCS / (len_a + len_b)` over characters,
//! scaled to 0-100. Insertions and deletions count, substitutions cost two.

/// Similarity between two core names on a 0-100 scale.
///
/// Tokens are sorted before comparison so word order does not matter.
/// Case-insensitive equality short-circuits to 100. Symmetric.
pub fn score(a: &str, b: &str) -> f64 {
    if a.eq_ignore_ascii_case(b) {
        return 100.0;
    }
    let sorted_a = sorted_tokens(a);
    let sorted_b = sorted_tokens(b);
    if sorted_a == sorted_b {
        return 100.0;
    }
    indel_ratio(&sorted_a, &sorted_b)
}

/// Plain similarity between two single tokens on a 0-100 scale.
pub fn token_ratio(a: &str, b: &str) -> f64 {
    if a == b {
        return 100.0;
    }
    indel_ratio(a, b)
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<String> = s.split_whitespace().map(str::to_lowercase).collect();
    tokens.sort();
    tokens.join(" ")
}

fn indel_ratio(a: &str, b: &str) -> f64 {
    let chars_a: Vec<char> = a.chars().collect();
    let chars_b: Vec<char> = b.chars().collect();
    let total = chars_a.len() + chars_b.len();
    if total == 0 {
        return 100.0;
    }
    let lcs = longest_common_subsequence(&chars_a, &chars_b);
    (2 * lcs) as f64 / total as f64 * 100.0
}

/// Length of the longest common subsequence, one DP row at a time.
fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        let mut diag = 0;
        for (j, &cb) in b.iter().enumerate() {
            let up = row[j + 1];
            row[j + 1] = if ca == cb { diag + 1 } else { up.max(row[j]) };
            diag = up;
        }
    }
    row[b.len()]
}
