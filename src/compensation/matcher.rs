use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashSet;
use uuid::Uuid;

/// A pending fee eligible for compensation: unpaid and not yet marked free.
/// The matcher never mutates candidates; it only selects a subset of ids.
#[derive(Debug, Clone)]
pub struct FeeCandidate {
    pub id: Uuid,
    pub amount: Decimal,
    pub entered_at: DateTime<Utc>,
}

/// Result of a successful match: ids in traversal (oldest-first) order and
/// the exact total they add up to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactMatch {
    pub entry_ids: Vec<Uuid>,
    pub total: Decimal,
}

/// Normalize a two-decimal currency amount to integer cents.
/// Rounding here is what absorbs binary floating-point drift upstream:
/// once both sides are cents, the cent-level tolerance is exact equality.
fn to_cents(amount: Decimal) -> i64 {
    (amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        * Decimal::ONE_HUNDRED)
        .to_i64()
        .unwrap_or(i64::MAX)
}

/// Find a non-empty subset of `candidates` whose amounts sum exactly to
/// `target`, or `None` if no such subset exists.
///
/// Search order is part of the contract: candidates are considered oldest
/// first, and at each position "include" is explored before "exclude", so
/// among multiple valid subsets the lexicographically-first one under that
/// traversal wins. For `[2.00@t1, 3.00@t2, 5.00@t3]` and target `5.00` the
/// result is the `t1/t2` pair, not the single `t3` record.
///
/// Amounts are non-negative, so a negative remainder can never recover;
/// the search prunes on overshoot and memoizes failed `(index, remaining)`
/// states to stay cheap on larger pools without changing the first result.
pub fn find_exact_combination(candidates: &[FeeCandidate], target: Decimal) -> Option<ExactMatch> {
    if target <= Decimal::ZERO || candidates.is_empty() {
        return None;
    }

    let mut ordered: Vec<&FeeCandidate> = candidates.iter().collect();
    ordered.sort_by_key(|c| c.entered_at);

    let cents: Vec<i64> = ordered.iter().map(|c| to_cents(c.amount)).collect();
    let target_cents = to_cents(target);

    let mut chosen: Vec<usize> = Vec::new();
    let mut dead: HashSet<(usize, i64)> = HashSet::new();

    if !search(&cents, 0, target_cents, &mut chosen, &mut dead) {
        return None;
    }

    let entry_ids: Vec<Uuid> = chosen.iter().map(|&i| ordered[i].id).collect();
    let total: Decimal = chosen
        .iter()
        .map(|&i| ordered[i].amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
        .sum();
    Some(ExactMatch { entry_ids, total })
}

/// Depth-first include-before-exclude search, short-circuiting on the first
/// subset that zeroes the remainder.
fn search(
    cents: &[i64],
    index: usize,
    remaining: i64,
    chosen: &mut Vec<usize>,
    dead: &mut HashSet<(usize, i64)>,
) -> bool {
    if remaining == 0 {
        return !chosen.is_empty();
    }
    if remaining < 0 || index == cents.len() {
        return false;
    }
    if dead.contains(&(index, remaining)) {
        return false;
    }

    chosen.push(index);
    if search(cents, index + 1, remaining - cents[index], chosen, dead) {
        return true;
    }
    chosen.pop();

    if search(cents, index + 1, remaining, chosen, dead) {
        return true;
    }

    dead.insert((index, remaining));
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal::prelude::FromPrimitive;
    use rust_decimal_macros::dec;

    fn candidate(seq: i64, amount: Decimal) -> FeeCandidate {
        FeeCandidate {
            id: Uuid::new_v4(),
            amount,
            entered_at: Utc.timestamp_opt(1_700_000_000 + seq, 0).unwrap(),
        }
    }

    #[test]
    fn test_single_candidate_equal_to_target() {
        let pool = vec![candidate(1, dec!(5.00))];
        let found = find_exact_combination(&pool, dec!(5.00)).unwrap();
        assert_eq!(found.entry_ids, vec![pool[0].id]);
        assert_eq!(found.total, dec!(5.00));
    }

    #[test]
    fn test_no_combination_found() {
        let pool = vec![candidate(1, dec!(1.00)), candidate(2, dec!(2.00))];
        assert!(find_exact_combination(&pool, dec!(4.00)).is_none());
    }

    #[test]
    fn test_empty_pool_never_matches() {
        assert!(find_exact_combination(&[], dec!(3.50)).is_none());
    }

    #[test]
    fn test_non_positive_target_never_matches() {
        let pool = vec![candidate(1, dec!(1.00))];
        assert!(find_exact_combination(&pool, Decimal::ZERO).is_none());
        assert!(find_exact_combination(&pool, dec!(-1.00)).is_none());
    }

    #[test]
    fn test_multi_record_sum() {
        let pool = vec![
            candidate(1, dec!(1.50)),
            candidate(2, dec!(2.25)),
            candidate(3, dec!(0.75)),
            candidate(4, dec!(9.00)),
        ];
        let found = find_exact_combination(&pool, dec!(4.50)).unwrap();
        assert_eq!(found.total, dec!(4.50));
        assert_eq!(
            found.entry_ids,
            vec![pool[0].id, pool[1].id, pool[2].id]
        );
    }

    /// Golden test for the tie-break contract: include-first, oldest-first
    /// traversal finds the two-record pair before the single 5.00 record.
    #[test]
    fn test_tie_break_prefers_oldest_inclusion_first() {
        let pool = vec![
            candidate(1, dec!(2.00)),
            candidate(2, dec!(3.00)),
            candidate(3, dec!(5.00)),
        ];
        let found = find_exact_combination(&pool, dec!(5.00)).unwrap();
        assert_eq!(found.entry_ids, vec![pool[0].id, pool[1].id]);
    }

    /// Candidates arriving unsorted must still be searched oldest first.
    #[test]
    fn test_unsorted_input_is_ordered_by_timestamp() {
        let pool = vec![
            candidate(3, dec!(5.00)),
            candidate(1, dec!(2.00)),
            candidate(2, dec!(3.00)),
        ];
        let found = find_exact_combination(&pool, dec!(5.00)).unwrap();
        assert_eq!(found.entry_ids, vec![pool[1].id, pool[2].id]);
    }

    /// Amounts carrying binary float drift (0.1 + 0.2) must still match a
    /// clean 0.30 target once rounded to cents.
    #[test]
    fn test_float_drift_absorbed_at_cent_level() {
        let drifted = Decimal::from_f64(0.1 + 0.2).unwrap();
        let pool = vec![candidate(1, drifted)];
        let found = find_exact_combination(&pool, dec!(0.30)).unwrap();
        assert_eq!(found.entry_ids, vec![pool[0].id]);
        assert_eq!(found.total, dec!(0.30));
    }

    #[test]
    fn test_input_is_not_mutated() {
        let pool = vec![candidate(1, dec!(2.00)), candidate(2, dec!(3.00))];
        let before: Vec<(Uuid, Decimal)> = pool.iter().map(|c| (c.id, c.amount)).collect();
        let _ = find_exact_combination(&pool, dec!(5.00));
        let after: Vec<(Uuid, Decimal)> = pool.iter().map(|c| (c.id, c.amount)).collect();
        assert_eq!(before, after);
    }

    /// Memoized pruning has to stay purely an optimization: a pool built to
    /// force overlapping failed states still yields the first-traversal
    /// subset.
    #[test]
    fn test_memoization_preserves_first_result() {
        let pool = vec![
            candidate(1, dec!(1.00)),
            candidate(2, dec!(1.00)),
            candidate(3, dec!(1.00)),
            candidate(4, dec!(2.00)),
            candidate(5, dec!(3.00)),
        ];
        let found = find_exact_combination(&pool, dec!(3.00)).unwrap();
        assert_eq!(
            found.entry_ids,
            vec![pool[0].id, pool[1].id, pool[2].id]
        );
    }

    #[test]
    fn test_zero_amount_candidates_are_carried_along() {
        let pool = vec![candidate(1, dec!(0.00)), candidate(2, dec!(4.00))];
        let found = find_exact_combination(&pool, dec!(4.00)).unwrap();
        assert_eq!(found.entry_ids, vec![pool[0].id, pool[1].id]);
        assert_eq!(found.total, dec!(4.00));
    }
}
