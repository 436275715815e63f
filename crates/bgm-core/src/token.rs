//! Tab group tokens

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// 128-bit identifier naming one tab group within a session log.
///
/// Stored on the wire as two little-endian u64 halves, high half first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupToken {
    /// High 64 bits
    pub high: u64,
    /// Low 64 bits
    pub low: u64,
}

impl GroupToken {
    /// Create a token from its two halves
    pub fn new(high: u64, low: u64) -> Self {
        Self { high, low }
    }

    /// The all-zero token, which the browser treats as "no group"
    pub fn is_empty(&self) -> bool {
        self.high == 0 && self.low == 0
    }

    /// Combine both halves into a single u128
    pub fn as_u128(&self) -> u128 {
        (u128::from(self.high) << 64) | u128::from(self.low)
    }
}

impl From<u128> for GroupToken {
    fn from(value: u128) -> Self {
        Self {
            high: (value >> 64) as u64,
            low: value as u64,
        }
    }
}

impl Display for GroupToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:x}-{:x}", self.high, self.low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_equality_is_by_halves() {
        assert_eq!(GroupToken::new(7, 9), GroupToken::new(7, 9));
        assert_ne!(GroupToken::new(7, 9), GroupToken::new(9, 7));
    }

    #[test]
    fn test_token_u128_conversion() {
        let token = GroupToken::new(0xdead_beef, 0x1234);
        assert_eq!(GroupToken::from(token.as_u128()), token);
        assert_eq!(token.as_u128() >> 64, 0xdead_beef);
    }

    #[test]
    fn test_token_display() {
        assert_eq!(GroupToken::new(0xab, 0x1).to_string(), "ab-1");
    }

    #[test]
    fn test_empty_token() {
        assert!(GroupToken::new(0, 0).is_empty());
        assert!(!GroupToken::new(0, 1).is_empty());
    }
}
