//! Helpers shared by the feature panels.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const HEX_CHARS: &[u8] = b"0123456789abcdef";

/// Seedable generator for placeholder values (hashes, build numbers,
/// simulated delays). Panels hold one so tests can pin the seed.
/// 佔位資料（雜湊、建置編號、模擬延遲）用的可設種子產生器。
#[derive(Debug)]
pub struct Placeholder {
    rng: StdRng,
}

impl Placeholder {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Lowercase hex string of the requested length.
    pub fn hex_hash(&mut self, length: usize) -> String {
        (0..length)
            .map(|_| HEX_CHARS[self.rng.gen_range(0..HEX_CHARS.len())] as char)
            .collect()
    }

    /// Integer in `[low, high)`.
    pub fn range(&mut self, low: u64, high: u64) -> u64 {
        self.rng.gen_range(low..high)
    }
}

/// Same address shape the original form accepted: one `@`, a dot in the
/// domain, no whitespace.
pub fn is_valid_email(address: &str) -> bool {
    let address = address.trim();
    if address.is_empty() || address.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Splits a pasted recipient blob on commas, semicolons, and newlines,
/// returning `(valid, rejected)`.
pub fn parse_recipient_blob(text: &str) -> (Vec<String>, usize) {
    let mut valid = Vec::new();
    let mut rejected = 0;
    for part in text.split(|c| c == ',' || c == ';' || c == '\n' || c == '\r') {
        let candidate = part.trim();
        if candidate.is_empty() {
            continue;
        }
        if is_valid_email(candidate) {
            if !valid.iter().any(|existing| existing == candidate) {
                valid.push(candidate.to_string());
            }
        } else {
            rejected += 1;
        }
    }
    (valid, rejected)
}

/// Replaces `{key}` placeholders with the paired values; unknown keys are
/// left in place so gaps stay visible in previews.
pub fn substitute_variables(text: &str, values: &[(&str, &str)]) -> String {
    let mut result = text.to_string();
    for (key, value) in values {
        result = result.replace(&format!("{{{key}}}"), value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_hex_is_deterministic_under_seed() {
        let mut a = Placeholder::from_seed(7);
        let mut b = Placeholder::from_seed(7);
        assert_eq!(a.hex_hash(16), b.hex_hash(16));
        let hash = a.hex_hash(64);
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn email_validation_accepts_common_shapes() {
        assert!(is_valid_email("qa-team@example.com"));
        assert!(is_valid_email("  padded@example.org "));
        assert!(!is_valid_email("missing-at.example.com"));
        assert!(!is_valid_email("no-domain@"));
        assert!(!is_valid_email("two@@example.com"));
        assert!(!is_valid_email("spaces in@example.com"));
        assert!(!is_valid_email("no-tld@example"));
    }

    #[test]
    fn recipient_blob_splits_and_dedupes() {
        let (valid, rejected) = parse_recipient_blob(
            "a@example.com, b@example.com;a@example.com\nnot-an-address\nc@example.com",
        );
        assert_eq!(valid, vec!["a@example.com", "b@example.com", "c@example.com"]);
        assert_eq!(rejected, 1);
    }

    #[test]
    fn substitution_keeps_unknown_placeholders() {
        let result = substitute_variables(
            "Product: {product} v{version}",
            &[("product", "OM5P-AC")],
        );
        assert_eq!(result, "Product: OM5P-AC v{version}");
    }
}
