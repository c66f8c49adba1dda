use sha2::{Digest, Sha256};

/// Length of the hex digest kept for stable IDs
const ID_HEX_LEN: usize = 20;

/// Hex-encode a digest, truncated to the ID length
fn short_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out.truncate(ID_HEX_LEN);
    out
}

/// Stable file ID from (repo, path)
pub fn file_id(repo_id: &str, path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(repo_id.as_bytes());
    hasher.update(b"|");
    hasher.update(path.as_bytes());
    short_hex(&hasher.finalize())
}

/// Stable symbol ID from (repo, path, kind, fully qualified name).
///
/// Identical declarations hash identically; the symbol table appends a
/// declaration-order ordinal to disambiguate duplicates.
pub fn symbol_id(repo_id: &str, path: &str, kind: &str, qualified_name: &str) -> String {
    let mut hasher = Sha256::new();
    for part in [repo_id, path, kind, qualified_name] {
        hasher.update(part.as_bytes());
        hasher.update(b"|");
    }
    short_hex(&hasher.finalize())
}

/// Content hash of a source file (full sha256 hex)
pub fn content_hash(content: &[u8]) -> String {
    use std::fmt::Write;
    let digest = Sha256::digest(content);
    let mut out = String::with_capacity(64);
    for b in digest {
        let _ = write!(out, "{b:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_id_stable() {
        let a = symbol_id("repo", "src/a.py", "function", "foo");
        let b = symbol_id("repo", "src/a.py", "function", "foo");
        assert_eq!(a, b);
        assert_eq!(a.len(), ID_HEX_LEN);
    }

    #[test]
    fn test_symbol_id_varies_by_payload() {
        let base = symbol_id("repo", "src/a.py", "function", "foo");
        assert_ne!(base, symbol_id("repo", "src/b.py", "function", "foo"));
        assert_ne!(base, symbol_id("repo", "src/a.py", "class", "foo"));
        assert_ne!(base, symbol_id("repo", "src/a.py", "function", "Foo.foo"));
    }

    #[test]
    fn test_content_hash_hex() {
        let h = content_hash(b"fn main() {}");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
