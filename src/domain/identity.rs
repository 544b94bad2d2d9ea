use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Token every missing field normalizes to.
pub const MISSING_TOKEN: &str = "n/a";

/// Normalized `(name, address, phone)` tuple used to decide whether two
/// extractions describe the same place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityKey {
    pub name: String,
    pub address: String,
    pub phone: String,
}

impl IdentityKey {
    pub fn new(name: Option<&str>, address: Option<&str>, phone: Option<&str>) -> Self {
        Self {
            name: normalize_text(name),
            address: normalize_text(address),
            phone: normalize_phone(phone),
        }
    }

    /// True when the name part is the missing token.
    pub fn is_nameless(&self) -> bool {
        self.name == MISSING_TOKEN
    }

    /// Deterministic hex SHA-256 of the key, used as the record id.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.name.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.address.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.phone.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Lowercase, drop punctuation and collapse runs of whitespace.
///
/// Missing or blank input maps to [`MISSING_TOKEN`].
pub fn normalize_text(value: Option<&str>) -> String {
    let Some(value) = value else {
        return MISSING_TOKEN.to_string();
    };

    let cleaned: String = value
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect();

    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        MISSING_TOKEN.to_string()
    } else {
        collapsed
    }
}

/// Phone numbers compare on their digits only.
pub fn normalize_phone(value: Option<&str>) -> String {
    let digits: String = value
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();

    if digits.is_empty() {
        MISSING_TOKEN.to_string()
    } else {
        digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text_case_and_whitespace() {
        assert_eq!(
            normalize_text(Some("  Padaria   São JOSÉ ")),
            "padaria são josé"
        );
        assert_eq!(
            normalize_text(Some("Rua A, 123 - Centro")),
            "rua a 123 centro"
        );
    }

    #[test]
    fn test_normalize_text_missing_and_blank() {
        assert_eq!(normalize_text(None), MISSING_TOKEN);
        assert_eq!(normalize_text(Some("   ")), MISSING_TOKEN);
        assert_eq!(normalize_text(Some("--")), MISSING_TOKEN);
    }

    #[test]
    fn test_normalize_phone_digits_only() {
        assert_eq!(normalize_phone(Some("(11) 3456-7890")), "1134567890");
        assert_eq!(normalize_phone(Some("+55 11 3456 7890")), "551134567890");
        assert_eq!(normalize_phone(None), MISSING_TOKEN);
    }

    #[test]
    fn test_keys_equal_across_formatting() {
        let a = IdentityKey::new(Some("Joe's Pizza"), Some("1 Main St."), Some("555-0100"));
        let b = IdentityKey::new(Some("JOE S  PIZZA"), Some("1 main st"), Some("(555) 0100"));
        assert_eq!(a, b);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_missing_fields_do_not_merge_different_names() {
        let a = IdentityKey::new(Some("Alpha"), None, None);
        let b = IdentityKey::new(Some("Beta"), None, None);
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_is_hex_sha256() {
        let key = IdentityKey::new(Some("Alpha"), Some("Somewhere"), None);
        let id = key.fingerprint();
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_fingerprint_separates_fields() {
        let a = IdentityKey {
            name: "ab".into(),
            address: "c".into(),
            phone: MISSING_TOKEN.into(),
        };
        let b = IdentityKey {
            name: "a".into(),
            address: "bc".into(),
            phone: MISSING_TOKEN.into(),
        };
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_is_nameless() {
        assert!(IdentityKey::new(None, Some("x"), None).is_nameless());
        assert!(!IdentityKey::new(Some("x"), None, None).is_nameless());
    }
}
