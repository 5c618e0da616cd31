//! Favorites entitlement rules.
//!
//! Free accounts may keep up to [`FREE_FAVORITE_LIMIT`] cities; premium
//! accounts are uncapped. The decision here is pure; enforcement happens
//! inside the insert transaction in the db layer.

pub const FREE_FAVORITE_LIMIT: i64 = 3;

/// The cap applying to an account, `None` meaning unlimited.
pub fn favorite_cap(is_premium: bool) -> Option<i64> {
    if is_premium {
        None
    } else {
        Some(FREE_FAVORITE_LIMIT)
    }
}

/// Whether an account with `count` favorites may add another one.
pub fn can_add_favorite(count: i64, is_premium: bool) -> bool {
    match favorite_cap(is_premium) {
        None => true,
        Some(cap) => count < cap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_account_below_cap() {
        assert!(can_add_favorite(0, false));
        assert!(can_add_favorite(1, false));
        assert!(can_add_favorite(2, false));
    }

    #[test]
    fn test_free_account_at_cap_is_rejected() {
        assert!(!can_add_favorite(3, false));
        assert!(!can_add_favorite(4, false));
    }

    #[test]
    fn test_premium_account_is_never_capped() {
        assert!(can_add_favorite(0, true));
        assert!(can_add_favorite(3, true));
        assert!(can_add_favorite(10_000, true));
    }

    #[test]
    fn test_cap_values() {
        assert_eq!(favorite_cap(false), Some(3));
        assert_eq!(favorite_cap(true), None);
    }

    #[test]
    fn test_sequence_of_adds_respects_cap() {
        // Simulate a free account adding until refused.
        let mut count = 0;
        while can_add_favorite(count, false) {
            count += 1;
        }
        assert_eq!(count, FREE_FAVORITE_LIMIT);
    }
}
