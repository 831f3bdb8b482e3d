use xxhash_rust::xxh64::xxh64;

/// Derives the short id for an original URL.
///
/// Two independently seeded xxh64 passes give 128 bits of digest, rendered
/// in base58 for a compact, URL-safe id. The function is pure and
/// deterministic: the same URL always maps to the same id, which is what
/// lets duplicate creates be detected as conflicts instead of minting a
/// second id for the same target.
///
/// Collisions between distinct URLs are astronomically unlikely at this
/// digest width and are tolerated: the store would report them as conflicts.
pub fn short_id(original_url: &str) -> String {
    let hi = xxh64(original_url.as_bytes(), 0);
    let lo = xxh64(original_url.as_bytes(), 1);

    let mut digest = [0u8; 16];
    digest[..8].copy_from_slice(&hi.to_be_bytes());
    digest[8..].copy_from_slice(&lo.to_be_bytes());

    bs58::encode(digest).into_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        assert_eq!(short_id("http://example.com"), short_id("http://example.com"));
    }

    #[test]
    fn distinct_urls_get_distinct_ids() {
        assert_ne!(short_id("http://example.com"), short_id("http://example.org"));
        assert_ne!(short_id("http://example.com"), short_id("http://example.com/"));
    }

    #[test]
    fn id_is_url_safe() {
        let id = short_id("https://example.com/some/deep/path?q=1&r=2");
        assert!(!id.is_empty());
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
