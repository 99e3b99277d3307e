//! Player Numbering
//!
//! Allocates the player number shown on each controller.
//! Numbers are derived from the live player set only, so a number freed by a
//! disconnect is handed to the next device that connects.

/// A player's display number (1-based).
pub type PlayerNumber = u32;

/// Return the smallest positive number not present in `existing`.
///
/// Values of zero are ignored. An empty set yields `1`.
///
/// ```
/// use joust::core::numbering::next_number;
///
/// assert_eq!(next_number([]), 1);
/// assert_eq!(next_number([1, 2, 3]), 4);
/// assert_eq!(next_number([1, 3]), 2);
/// ```
pub fn next_number<I>(existing: I) -> PlayerNumber
where
    I: IntoIterator<Item = PlayerNumber>,
{
    let taken: Vec<PlayerNumber> = existing.into_iter().filter(|n| *n > 0).collect();

    let max = match taken.iter().copied().max() {
        Some(max) => max,
        None => return 1,
    };

    (1..max)
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_set_starts_at_one() {
        assert_eq!(next_number(Vec::new()), 1);
    }

    #[test]
    fn test_contiguous_set_appends() {
        assert_eq!(next_number([1, 2, 3]), 4);
    }

    #[test]
    fn test_fills_lowest_gap() {
        assert_eq!(next_number([1, 3]), 2);
        assert_eq!(next_number([2, 3, 5]), 1);
        assert_eq!(next_number([4, 1, 2]), 3);
    }

    #[test]
    fn test_ignores_zero() {
        assert_eq!(next_number([0]), 1);
        assert_eq!(next_number([0, 1]), 2);
    }

    proptest! {
        #[test]
        fn prop_result_is_free_and_minimal(numbers in proptest::collection::btree_set(1u32..40, 0..20)) {
            let next = next_number(numbers.iter().copied());
            prop_assert!(next >= 1);
            prop_assert!(!numbers.contains(&next));
            for lower in 1..next {
                prop_assert!(numbers.contains(&lower));
            }
        }
    }
}
