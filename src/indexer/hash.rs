// Content addressing for persisted documents

use sha2::{Digest, Sha256};

pub const DOCUMENT_ID_PREFIX: &str = "sha256:";

/// Lowercase hex SHA-256 of the UTF-8 bytes of `text`
pub fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Persisted-document identifier: `sha256:<hex>` of the raw document text
pub fn document_id(text: &str) -> String {
    format!("{}{}", DOCUMENT_ID_PREFIX, sha256_hex(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            document_id("abc"),
            "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_whitespace_changes_id() {
        assert_ne!(document_id("query { a }"), document_id("query { a } "));
    }

    proptest! {
        #[test]
        fn prop_document_id_shape(text in ".*") {
            let id = document_id(&text);
            prop_assert!(id.starts_with(DOCUMENT_ID_PREFIX));
            let hex = &id[DOCUMENT_ID_PREFIX.len()..];
            prop_assert_eq!(hex.len(), 64);
            prop_assert!(hex.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
            prop_assert_eq!(id.clone(), document_id(&text));
        }
    }
}
