//! Pure credit-accrual arithmetic.
//!
//! Credits accrue one per whole configured interval elapsed since the
//! account's accrual anchor. The anchor advances by whole intervals only,
//! never snapping to "now", so partial-interval progress is preserved
//! across reads.
//!
//! All arithmetic is checked or saturating; the balance-bound invariant
//! `0 <= balance <= cap` holds for every input.

use chrono::{DateTime, Duration, Utc};

/// The result of evaluating accrual for one account at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accrual {
    /// Balance after granting accrued credits (capped).
    pub new_balance: i64,
    /// Accrual anchor advanced by the consumed whole intervals.
    pub new_anchor: DateTime<Utc>,
    /// Credits actually granted (zero when at the cap).
    pub granted: i64,
    /// Time remaining until the next credit would accrue.
    pub next_credit_in: Duration,
    /// Whether the account row needs persisting (balance or anchor moved).
    pub changed: bool,
}

/// Evaluate accrual for an account.
///
/// Whole intervals elapsed since `anchor` are converted into credits,
/// granting at most `cap - balance` so the balance never exceeds the cap.
/// The anchor advances by **all** elapsed whole intervals -- including
/// intervals that granted nothing because the account sat at the cap --
/// so capped time is never banked for an instant refill after spending.
///
/// A non-positive `interval` disables accrual entirely; the next-credit
/// ETA is reported as zero.
pub fn accrue(
    balance: i64,
    anchor: DateTime<Utc>,
    now: DateTime<Utc>,
    interval: Duration,
    cap: i64,
) -> Accrual {
    let interval_secs = interval.num_seconds();
    if interval_secs <= 0 {
        return Accrual {
            new_balance: balance,
            new_anchor: anchor,
            granted: 0,
            next_credit_in: Duration::zero(),
            changed: false,
        };
    }

    let elapsed_secs = now.signed_duration_since(anchor).num_seconds().max(0);
    let elapsed_intervals = elapsed_secs.checked_div(interval_secs).unwrap_or(0);

    let headroom = cap.saturating_sub(balance).max(0);
    let granted = elapsed_intervals.min(headroom);
    let new_balance = balance.saturating_add(granted).min(cap);

    let consumed = Duration::seconds(elapsed_intervals.saturating_mul(interval_secs));
    let new_anchor = anchor.checked_add_signed(consumed).unwrap_or(now);

    let until_next = new_anchor
        .checked_add_signed(interval)
        .map_or(interval, |next| next.signed_duration_since(now));

    Accrual {
        new_balance,
        new_anchor,
        granted,
        next_credit_in: until_next.max(Duration::zero()),
        changed: elapsed_intervals > 0,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_000_000, 0).unwrap() + Duration::seconds(secs)
    }

    /// Ten-minute accrual interval used across these tests.
    fn interval() -> Duration {
        Duration::seconds(600)
    }

    #[test]
    fn no_time_elapsed_grants_nothing() {
        let a = accrue(3, at(0), at(0), interval(), 10);
        assert_eq!(a.granted, 0);
        assert_eq!(a.new_balance, 3);
        assert_eq!(a.next_credit_in, interval());
        assert!(!a.changed);
    }

    #[test]
    fn whole_intervals_grant_credits() {
        // 25 minutes at a 10-minute interval: two credits, anchor +20min.
        let a = accrue(0, at(0), at(1500), interval(), 10);
        assert_eq!(a.granted, 2);
        assert_eq!(a.new_balance, 2);
        assert_eq!(a.new_anchor, at(1200));
        // 300s into the third interval: 300s remain.
        assert_eq!(a.next_credit_in, Duration::seconds(300));
        assert!(a.changed);
    }

    #[test]
    fn partial_interval_progress_is_preserved() {
        // 9m59s elapsed: nothing granted, anchor untouched.
        let a = accrue(0, at(0), at(599), interval(), 10);
        assert_eq!(a.granted, 0);
        assert_eq!(a.new_anchor, at(0));
        assert_eq!(a.next_credit_in, Duration::seconds(1));
    }

    #[test]
    fn grant_is_capped() {
        // 100 intervals elapsed but only 4 of headroom.
        let a = accrue(6, at(0), at(60_000), interval(), 10);
        assert_eq!(a.granted, 4);
        assert_eq!(a.new_balance, 10);
    }

    #[test]
    fn capped_time_is_not_banked() {
        // At the cap the anchor still advances, so a later spend does not
        // instantly refill from stored-up intervals.
        let a = accrue(10, at(0), at(6000), interval(), 10);
        assert_eq!(a.granted, 0);
        assert_eq!(a.new_balance, 10);
        assert_eq!(a.new_anchor, at(6000));
        assert!(a.changed);
    }

    #[test]
    fn balance_bound_holds_for_sweep() {
        // Property sweep: 0 <= balance <= cap for a grid of inputs.
        for balance in 0..=10 {
            for elapsed in [0, 1, 599, 600, 601, 6000, 60_000] {
                let a = accrue(balance, at(0), at(elapsed), interval(), 10);
                assert!(a.new_balance >= 0, "balance went negative");
                assert!(a.new_balance <= 10, "balance exceeded cap");
                assert!(a.next_credit_in >= Duration::zero());
            }
        }
    }

    #[test]
    fn anchor_in_the_future_grants_nothing() {
        // Clock skew or a freshly shifted anchor: treat as zero elapsed.
        let a = accrue(2, at(600), at(0), interval(), 10);
        assert_eq!(a.granted, 0);
        assert_eq!(a.new_anchor, at(600));
        assert!(!a.changed);
    }

    #[test]
    fn zero_interval_disables_accrual() {
        let a = accrue(2, at(0), at(9999), Duration::zero(), 10);
        assert_eq!(a.granted, 0);
        assert!(!a.changed);
    }

    #[test]
    fn pause_shift_leaves_eta_unchanged() {
        // An account 200s into an interval is paused for 1000s. Shifting
        // its anchor by the pause duration must leave the ETA exactly
        // where it was: neither advantaged nor penalized.
        let before = accrue(0, at(0), at(200), interval(), 10);

        let pause = Duration::seconds(1000);
        let shifted_anchor = at(0) + pause;
        let after = accrue(0, shifted_anchor, at(200) + pause, interval(), 10);

        assert_eq!(before.next_credit_in, after.next_credit_in);
        assert_eq!(before.granted, after.granted);
    }

    #[test]
    fn clamped_midpause_reads_match_an_idle_account() {
        // Voting pauses at t=1200 and resumes at t=4800. One account
        // polls its balance mid-pause; the caller clamps the read to the
        // pause start. After the resume anchor shift, the polling account
        // and an identical idle account must be indistinguishable.
        let pause_start = at(1200);
        let pause = Duration::seconds(3600);

        // Mid-pause read, evaluated at the clamp: only pre-pause time
        // counts, two credits from the first 1200s.
        let mid = accrue(0, at(0), pause_start, interval(), 10);
        assert_eq!(mid.granted, 2);
        assert_eq!(mid.new_anchor, at(1200));

        // Resume shifts both anchors forward by the paused span.
        let polled_anchor = mid.new_anchor + pause;
        let idle_anchor = at(0) + pause;

        // One interval after the resume.
        let later = at(5400);
        let polled = accrue(mid.new_balance, polled_anchor, later, interval(), 10);
        let idle = accrue(0, idle_anchor, later, interval(), 10);

        assert_eq!(polled.new_balance, idle.new_balance);
        assert_eq!(polled.new_anchor, idle.new_anchor);
    }
}
