//! Attendance reconciliation
//!
//! Folds canonical punches into an employee's interval timeline. The
//! decision is a pure function of the employee's latest interval and the
//! incoming punch; [`Reconciler::apply`] carries it out against the store.
//!
//! | State \ intent    | check-in              | check-out                                 |
//! |-------------------|-----------------------|-------------------------------------------|
//! | no interval       | open at `t`           | open at `t`                               |
//! | open(ci)          | close at `t`, open `t`| close at `t`                              |
//! | closed(ci, co)    | open at `t`           | `t - co <= window`: add `[co, t]`, else open at `t` |
//!
//! Punches older than the latest interval boundary are left out of the
//! timeline so intervals never overlap.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, trace};

use crate::error::StoreResult;
use crate::model::{AttendanceInterval, CanonicalPunch, IntervalId, NewInterval};
use crate::normalize::Intent;
use crate::store::IntervalStore;

pub const DEFAULT_BRIDGE_WINDOW_SECS: u64 = 180;

/// Employee timeline as seen from its most recent interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalState {
    NoInterval,
    Open {
        id: IntervalId,
        check_in: DateTime<Utc>,
    },
    Closed {
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    },
}

impl IntervalState {
    pub fn of(latest: Option<&AttendanceInterval>) -> Self {
        match latest {
            None => IntervalState::NoInterval,
            Some(interval) => match interval.check_out {
                None => IntervalState::Open {
                    id: interval.id,
                    check_in: interval.check_in,
                },
                Some(check_out) => IntervalState::Closed {
                    check_in: interval.check_in,
                    check_out,
                },
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Break or other code with no timeline meaning
    NotAttendance(u8),

    /// Earlier than the latest interval boundary
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Open {
        check_in: DateTime<Utc>,
    },
    Close {
        id: IntervalId,
        check_out: DateTime<Utc>,
    },
    CloseAndOpen {
        id: IntervalId,
        at: DateTime<Utc>,
    },
    /// Short closed interval for a repeated check-out
    Bridge {
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
    },
    Skip(SkipReason),
}

pub fn decide(state: IntervalState, intent: Intent, at: DateTime<Utc>, bridge_window: TimeDelta) -> Action {
    if let Intent::Other(code) = intent {
        return Action::Skip(SkipReason::NotAttendance(code));
    }

    match state {
        IntervalState::NoInterval => Action::Open { check_in: at },

        IntervalState::Open { check_in, .. } if at < check_in => Action::Skip(SkipReason::Stale),
        IntervalState::Open { id, .. } => match intent {
            Intent::CheckIn => Action::CloseAndOpen { id, at },
            _ => Action::Close { id, check_out: at },
        },

        IntervalState::Closed { check_out, .. } if at < check_out => {
            Action::Skip(SkipReason::Stale)
        }
        IntervalState::Closed { check_out, .. } => match intent {
            Intent::CheckOut if at - check_out <= bridge_window => Action::Bridge {
                check_in: check_out,
                check_out: at,
            },
            _ => Action::Open { check_in: at },
        },
    }
}

/// Applies punch decisions to an interval store
#[derive(Debug, Clone, Copy)]
pub struct Reconciler {
    bridge_window: TimeDelta,
}

impl Reconciler {
    pub fn new(bridge_window: TimeDelta) -> Self {
        Self { bridge_window }
    }

    pub fn bridge_window(&self) -> TimeDelta {
        self.bridge_window
    }

    pub async fn apply<S: IntervalStore + ?Sized>(&self, store: &S, punch: &CanonicalPunch) -> StoreResult<Action> {
        let latest = store.latest_interval(punch.employee_id).await?;
        let state = IntervalState::of(latest.as_ref());
        let action = decide(state, punch.intent, punch.at, self.bridge_window);
        trace!("{} {:?} at {}: {:?} -> {:?}", punch.employee_id, punch.intent, punch.at, state, action);

        let employee_id = punch.employee_id;
        match action {
            Action::Open { check_in } => {
                store
                    .create_interval(NewInterval {
                        employee_id,
                        check_in,
                        check_out: None,
                    })
                    .await?;
            }
            Action::Close { id, check_out } => {
                store.close_interval(id, check_out).await?;
            }
            Action::CloseAndOpen { id, at } => {
                store.close_interval(id, at).await?;
                store
                    .create_interval(NewInterval {
                        employee_id,
                        check_in: at,
                        check_out: None,
                    })
                    .await?;
            }
            Action::Bridge {
                check_in,
                check_out,
            } => {
                debug!("Bridging repeated check-out of {} at {}", employee_id, check_out);
                store
                    .create_interval(NewInterval {
                        employee_id,
                        check_in,
                        check_out: Some(check_out),
                    })
                    .await?;
            }
            Action::Skip(_) => {}
        }
        Ok(action)
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new(TimeDelta::seconds(DEFAULT_BRIDGE_WINDOW_SECS as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EmployeeId, NewEmployee};
    use crate::store::{EmployeeStore, MemoryLedger};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn t(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, h, m, s).unwrap()
    }

    async fn setup() -> (MemoryLedger, EmployeeId) {
        let ledger = MemoryLedger::new();
        let employee = ledger
            .create_employee(NewEmployee {
                name: "Alice".into(),
                device_user_id: "1001".into(),
            })
            .await
            .unwrap();
        (ledger, employee.id)
    }

    async fn punch(ledger: &MemoryLedger, employee_id: EmployeeId, intent: Intent, at: DateTime<Utc>) -> Action {
        Reconciler::default()
            .apply(
                ledger,
                &CanonicalPunch {
                    employee_id,
                    at,
                    intent,
                },
            )
            .await
            .unwrap()
    }

    fn spans(intervals: Vec<AttendanceInterval>) -> Vec<(DateTime<Utc>, Option<DateTime<Utc>>)> {
        intervals.into_iter().map(|i| (i.check_in, i.check_out)).collect()
    }

    #[tokio::test]
    async fn test_first_check_in_opens_interval() {
        let (ledger, alice) = setup().await;
        punch(&ledger, alice, Intent::CheckIn, t(8, 0, 0)).await;

        let intervals = ledger.intervals_for(alice).await.unwrap();
        assert_eq!(spans(intervals), vec![(t(8, 0, 0), None)]);
    }

    #[tokio::test]
    async fn test_check_in_on_open_interval_rolls_over() {
        let (ledger, alice) = setup().await;
        punch(&ledger, alice, Intent::CheckIn, t(8, 0, 0)).await;
        let action = punch(&ledger, alice, Intent::CheckIn, t(13, 0, 0)).await;
        assert!(matches!(action, Action::CloseAndOpen { .. }));

        let intervals = ledger.intervals_for(alice).await.unwrap();
        assert_eq!(
            spans(intervals),
            vec![(t(8, 0, 0), Some(t(13, 0, 0))), (t(13, 0, 0), None)]
        );
    }

    #[tokio::test]
    async fn test_check_out_within_window_bridges() {
        let (ledger, alice) = setup().await;
        punch(&ledger, alice, Intent::CheckIn, t(8, 0, 0)).await;
        punch(&ledger, alice, Intent::CheckOut, t(17, 0, 0)).await;
        let action = punch(&ledger, alice, Intent::CheckOut, t(17, 3, 0)).await;
        assert_eq!(
            action,
            Action::Bridge {
                check_in: t(17, 0, 0),
                check_out: t(17, 3, 0)
            }
        );

        let intervals = ledger.intervals_for(alice).await.unwrap();
        assert_eq!(
            spans(intervals),
            vec![
                (t(8, 0, 0), Some(t(17, 0, 0))),
                (t(17, 0, 0), Some(t(17, 3, 0)))
            ]
        );
    }

    #[tokio::test]
    async fn test_check_out_past_window_opens_fresh_interval() {
        let (ledger, alice) = setup().await;
        punch(&ledger, alice, Intent::CheckIn, t(8, 0, 0)).await;
        punch(&ledger, alice, Intent::CheckOut, t(17, 0, 0)).await;
        punch(&ledger, alice, Intent::CheckOut, t(17, 3, 1)).await;

        let intervals = ledger.intervals_for(alice).await.unwrap();
        assert_eq!(
            spans(intervals),
            vec![(t(8, 0, 0), Some(t(17, 0, 0))), (t(17, 3, 1), None)]
        );
    }

    #[tokio::test]
    async fn test_other_codes_and_stale_punches_leave_timeline_alone() {
        let (ledger, alice) = setup().await;
        punch(&ledger, alice, Intent::CheckIn, t(8, 0, 0)).await;

        assert_eq!(
            punch(&ledger, alice, Intent::Other(2), t(12, 0, 0)).await,
            Action::Skip(SkipReason::NotAttendance(2))
        );
        assert_eq!(
            punch(&ledger, alice, Intent::CheckOut, t(7, 0, 0)).await,
            Action::Skip(SkipReason::Stale)
        );
        assert_eq!(spans(ledger.intervals_for(alice).await.unwrap()), vec![(t(8, 0, 0), None)]);
    }

    #[test]
    fn test_lone_check_out_opens() {
        let action = decide(IntervalState::NoInterval, Intent::CheckOut, t(9, 0, 0), TimeDelta::seconds(180));
        assert_eq!(action, Action::Open { check_in: t(9, 0, 0) });
    }

    #[test]
    fn test_bridge_window_is_inclusive() {
        let state = IntervalState::Closed {
            check_in: t(8, 0, 0),
            check_out: t(17, 0, 0),
        };
        let window = TimeDelta::seconds(180);
        assert!(matches!(decide(state, Intent::CheckOut, t(17, 3, 0), window), Action::Bridge { .. }));
        assert!(matches!(decide(state, Intent::CheckOut, t(17, 3, 1), window), Action::Open { .. }));
        assert!(matches!(decide(state, Intent::CheckIn, t(17, 1, 0), window), Action::Open { .. }));
    }

    fn intent() -> impl Strategy<Value = Intent> {
        prop_oneof![
            Just(Intent::CheckIn),
            Just(Intent::CheckOut),
            (2u8..4).prop_map(Intent::Other),
        ]
    }

    proptest! {
        #[test]
        fn prop_timeline_stays_consistent(
            punches in prop::collection::vec((0i64..86_400, intent()), 1..60),
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let (ledger, alice) = setup().await;
                let base = t(0, 0, 0);

                let mut punches = punches;
                punches.sort_by_key(|(offset, _)| *offset);
                for (offset, intent) in punches {
                    punch(&ledger, alice, intent, base + TimeDelta::seconds(offset)).await;
                }

                let intervals = ledger.intervals_for(alice).await.unwrap();
                let open = intervals.iter().filter(|i| i.is_open()).count();
                prop_assert!(open <= 1);

                for pair in intervals.windows(2) {
                    let end = pair[0].check_out;
                    prop_assert!(end.is_some());
                    prop_assert!(end.unwrap() <= pair[1].check_in);
                }
                for interval in &intervals {
                    if let Some(out) = interval.check_out {
                        prop_assert!(out >= interval.check_in);
                    }
                }
                Ok(())
            })?;
        }
    }
}
