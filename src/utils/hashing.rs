//! Utility functions for hashing identifiers
use std::hash::{DefaultHasher, Hash, Hasher};

/// Hash a value and render the result as a hexadecimal string
pub(crate) fn hash_as_hex_string<T: Hash>(value: &T) -> String {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_and_distinct() {
        assert_eq!(hash_as_hex_string(&"R1"), hash_as_hex_string(&"R1"));
        assert_ne!(hash_as_hex_string(&"R1"), hash_as_hex_string(&"R2"));
    }
}
