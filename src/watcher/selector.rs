//! Date selection logic
//!
//! Pure decision logic over an already-fetched list of candidate dates:
//! pick the first date strictly earlier than the booked one, and keep a
//! running record of the earliest date ever observed for diagnostics.

use crate::types::AppointmentDate;
use tracing::info;

/// Earliest appointment date observed across all polls so far.
///
/// Owned by the polling loop and threaded through `select`. The tracked
/// value only ever moves earlier; it is never reset. Diagnostic only:
/// selection correctness does not depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EarliestSeen(AppointmentDate);

impl EarliestSeen {
    /// Start with a far-future sentinel so the first observed date wins.
    pub fn new() -> Self {
        Self(AppointmentDate::MAX)
    }

    /// Record an observed date; returns true if it beat the tracked value.
    pub fn observe(&mut self, date: AppointmentDate) -> bool {
        if date < self.0 {
            self.0 = date;
            info!("Found new earliest date: {}", date);
            return true;
        }
        false
    }

    /// The earliest date observed so far, or the sentinel if none yet.
    pub fn get(&self) -> AppointmentDate {
        self.0
    }
}

impl Default for EarliestSeen {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick the first date strictly earlier than `target`.
///
/// Dates are visited in the order the gateway returned them, never
/// re-sorted. Every visited date is recorded in `earliest`; dates after
/// the returned one are not visited.
pub fn select(
    dates: &[AppointmentDate],
    target: AppointmentDate,
    earliest: &mut EarliestSeen,
) -> Option<AppointmentDate> {
    for &date in dates {
        earliest.observe(date);
        if date < target {
            return Some(date);
        }
        info!("{} is not earlier. Earliest seen: {}", date, earliest.get());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn d(s: &str) -> AppointmentDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_empty_input_returns_none_and_leaves_tracker_alone() {
        let mut earliest = EarliestSeen::new();
        assert_eq!(select(&[], d("2025-06-01"), &mut earliest), None);
        assert_eq!(earliest.get(), NaiveDate::MAX);
    }

    #[test]
    fn test_later_date_is_not_selected() {
        let mut earliest = EarliestSeen::new();
        let dates = [d("2025-07-01")];
        assert_eq!(select(&dates, d("2025-06-01"), &mut earliest), None);
        // Still observed for diagnostics
        assert_eq!(earliest.get(), d("2025-07-01"));
    }

    #[test]
    fn test_earlier_date_is_selected() {
        let mut earliest = EarliestSeen::new();
        let dates = [d("2025-05-10")];
        assert_eq!(
            select(&dates, d("2025-06-01"), &mut earliest),
            Some(d("2025-05-10"))
        );
        assert_eq!(earliest.get(), d("2025-05-10"));
    }

    #[test]
    fn test_equal_date_is_not_earlier() {
        let mut earliest = EarliestSeen::new();
        let dates = [d("2025-06-01")];
        assert_eq!(select(&dates, d("2025-06-01"), &mut earliest), None);
    }

    #[test]
    fn test_first_qualifying_date_wins_in_gateway_order() {
        let mut earliest = EarliestSeen::new();
        // Deliberately unsorted: the gateway's order rules
        let dates = [d("2025-07-01"), d("2025-05-20"), d("2025-05-10")];
        assert_eq!(
            select(&dates, d("2025-06-01"), &mut earliest),
            Some(d("2025-05-20"))
        );
        // The date after the selected one was never visited
        assert_eq!(earliest.get(), d("2025-05-20"));
    }

    #[test]
    fn test_tracker_is_monotonically_non_increasing() {
        let mut earliest = EarliestSeen::new();
        assert!(earliest.observe(d("2025-08-01")));
        assert!(earliest.observe(d("2025-05-01")));
        assert!(!earliest.observe(d("2025-09-01")));
        assert_eq!(earliest.get(), d("2025-05-01"));
    }

    fn arb_date() -> impl Strategy<Value = AppointmentDate> {
        (2020i32..2035, 1u32..=12, 1u32..=28)
            .prop_map(|(y, m, day)| NaiveDate::from_ymd_opt(y, m, day).unwrap())
    }

    proptest! {
        #[test]
        fn prop_result_is_input_member_earlier_than_target(
            dates in proptest::collection::vec(arb_date(), 0..8),
            target in arb_date(),
        ) {
            let mut earliest = EarliestSeen::new();
            let picked = select(&dates, target, &mut earliest);
            match picked {
                Some(date) => {
                    prop_assert!(dates.contains(&date));
                    prop_assert!(date < target);
                    // Nothing before it in gateway order qualified
                    let pos = dates.iter().position(|&x| x == date).unwrap();
                    prop_assert!(dates[..pos].iter().all(|&x| x >= target));
                }
                None => {
                    // None means the scan saw every date and nothing qualified
                    prop_assert!(dates.iter().all(|&x| x >= target));
                }
            }
        }

        #[test]
        fn prop_input_is_never_mutated(
            dates in proptest::collection::vec(arb_date(), 0..8),
            target in arb_date(),
        ) {
            let before = dates.clone();
            let mut earliest = EarliestSeen::new();
            let _ = select(&dates, target, &mut earliest);
            prop_assert_eq!(before, dates);
        }

        #[test]
        fn prop_tracker_never_increases(
            observations in proptest::collection::vec(arb_date(), 1..20),
        ) {
            let mut earliest = EarliestSeen::new();
            let mut previous = earliest.get();
            for date in observations {
                earliest.observe(date);
                prop_assert!(earliest.get() <= previous);
                previous = earliest.get();
            }
        }
    }
}
