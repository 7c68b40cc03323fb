//! Tokens and the flyweight cache that shares them.
//!
//! A [`Token`] is a plain immutable value. All tokens that live in the world
//! or in a player's hand are obtained through a [`TokenCache`], which keeps
//! exactly one [`TokenRef`] per distinct value for the cache's lifetime.
//! The distinct value space is tiny in practice (one entry per power of two
//! up to the winning threshold), so entries are never evicted.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// An immutable token carrying a positive integer value.
///
/// Tokens deliberately do not implement `Deserialize`: persisted data stores
/// raw values, and tokens are re-materialized through a [`TokenCache`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    value: u64,
}

impl Token {
    /// Construct a token. Values are expected to be `>= 1`; callers that read
    /// untrusted data validate before reaching this point.
    #[inline]
    pub const fn new(value: u64) -> Self {
        Self { value }
    }

    /// The token's value.
    #[inline]
    pub const fn value(&self) -> u64 {
        self.value
    }

    /// A new token with twice the value. `self` is left untouched.
    ///
    /// Saturates at `u64::MAX`, far beyond any reachable threshold.
    #[inline]
    pub const fn combine(&self) -> Token {
        Token::new(self.value.saturating_mul(2))
    }

    /// `true` if the value meets or exceeds `threshold`.
    #[inline]
    pub const fn is_winning(&self, threshold: u64) -> bool {
        self.value >= threshold
    }

    /// `true` if both tokens have the same value and may be merged.
    #[inline]
    pub const fn can_combine_with(&self, other: &Token) -> bool {
        self.value == other.value
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Shared handle to a cached [`Token`].
///
/// Two handles for the same value obtained from the same cache point at the
/// same allocation; compare with [`Arc::ptr_eq`] to observe that.
pub type TokenRef = Arc<Token>;

// ---------------------------------------------------------------------------
// TokenCache
// ---------------------------------------------------------------------------

/// Flyweight cache: at most one [`Token`] instance per value.
#[derive(Debug, Default)]
pub struct TokenCache {
    tokens: HashMap<u64, TokenRef>,
}

impl TokenCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            tokens: HashMap::new(),
        }
    }

    /// Return the shared token for `value`, creating it on first request.
    pub fn get_or_create(&mut self, value: u64) -> TokenRef {
        Arc::clone(
            self.tokens
                .entry(value)
                .or_insert_with(|| Arc::new(Token::new(value))),
        )
    }

    /// `true` if a token for `value` has been created by this cache.
    pub fn contains(&self, value: u64) -> bool {
        self.tokens.contains_key(&value)
    }

    /// Number of distinct values cached.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// `true` if no token has been created yet.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Cached values in ascending order.
    pub fn values(&self) -> Vec<u64> {
        let mut values: Vec<u64> = self.tokens.keys().copied().collect();
        values.sort_unstable();
        values
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_doubles_without_mutating() {
        let four = Token::new(4);
        let eight = four.combine();
        assert_eq!(eight.value(), 8);
        assert_eq!(four.value(), 4);
    }

    #[test]
    fn combine_saturates() {
        assert_eq!(Token::new(u64::MAX).combine().value(), u64::MAX);
    }

    #[test]
    fn can_combine_only_with_equal_value() {
        assert!(Token::new(4).can_combine_with(&Token::new(4)));
        assert!(!Token::new(4).can_combine_with(&Token::new(8)));
    }

    #[test]
    fn winning_threshold_is_inclusive() {
        assert!(Token::new(64).is_winning(64));
        assert!(Token::new(128).is_winning(64));
        assert!(!Token::new(32).is_winning(64));
    }

    #[test]
    fn cache_returns_identical_instances() {
        let mut cache = TokenCache::new();
        let a = cache.get_or_create(4);
        let b = cache.get_or_create(4);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cache_separates_values() {
        let mut cache = TokenCache::new();
        let two = cache.get_or_create(2);
        let four = cache.get_or_create(4);
        assert!(!Arc::ptr_eq(&two, &four));
        assert_eq!(cache.values(), vec![2, 4]);
        assert!(cache.contains(2));
        assert!(!cache.contains(8));
    }

    #[test]
    fn separate_caches_do_not_share() {
        let mut first = TokenCache::new();
        let mut second = TokenCache::new();
        assert!(!Arc::ptr_eq(&first.get_or_create(1), &second.get_or_create(1)));
    }

    #[test]
    fn cache_holds_a_reference_while_handles_live() {
        let mut cache = TokenCache::new();
        let handle = cache.get_or_create(16);
        // One count for the cache, one for the handle.
        assert_eq!(Arc::strong_count(&handle), 2);
        drop(cache);
        assert_eq!(Arc::strong_count(&handle), 1);
    }
}
