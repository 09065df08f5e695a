//! Positional bonus points per bonus-eligible achievement.
//!
//! For each bonus-eligible achievement, targets are ranked by summed
//! received points descending, tie-broken by the earliest vote timestamp
//! among that target's votes for that achievement (first mover wins).
//! The top three standings award 5, 3, and 2 points, cumulative across
//! achievements per account.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use podium_types::{catalog, AccountId, Vote};

/// Bonus awards for the top three standings, in order.
const PODIUM_AWARDS: [i64; 3] = [5, 3, 2];

/// Per-target accumulator within one achievement.
#[derive(Debug, Clone, Copy)]
struct Standing {
    total: i64,
    earliest: DateTime<Utc>,
}

/// Compute cumulative bonus points per account from the valid vote set.
///
/// Votes targeting achievements that are unknown or not bonus-eligible
/// contribute nothing. The result omits accounts with zero bonus.
pub fn bonus_points(votes: &[Vote]) -> BTreeMap<AccountId, i64> {
    let mut bonuses: BTreeMap<AccountId, i64> = BTreeMap::new();

    for achievement in catalog::bonus_eligible() {
        let mut standings: BTreeMap<AccountId, Standing> = BTreeMap::new();

        for vote in votes.iter().filter(|v| v.achievement_id == achievement.id) {
            standings
                .entry(vote.to_account)
                .and_modify(|s| {
                    s.total = s.total.saturating_add(i64::from(vote.points));
                    s.earliest = s.earliest.min(vote.created_at);
                })
                .or_insert(Standing {
                    total: i64::from(vote.points),
                    earliest: vote.created_at,
                });
        }

        let mut ranked: Vec<(AccountId, Standing)> = standings.into_iter().collect();
        // Points descending, then first mover, then id for full determinism.
        ranked.sort_by(|(a_id, a), (b_id, b)| {
            b.total
                .cmp(&a.total)
                .then_with(|| a.earliest.cmp(&b.earliest))
                .then_with(|| a_id.cmp(b_id))
        });

        for ((account, _), award) in ranked.into_iter().zip(PODIUM_AWARDS) {
            bonuses
                .entry(account)
                .and_modify(|b| *b = b.saturating_add(award))
                .or_insert(award);
        }
    }

    bonuses
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::TimeZone;
    use podium_types::VoteId;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_000_000, 0).unwrap() + chrono::Duration::seconds(secs)
    }

    fn vote(to: AccountId, achievement: &str, points: i16, secs: i64) -> Vote {
        Vote {
            id: VoteId::new(),
            from_account: AccountId::new(),
            to_account: to,
            achievement_id: achievement.to_owned(),
            points,
            is_secret: false,
            invalidated: false,
            created_at: at(secs),
        }
    }

    #[test]
    fn top_three_get_five_three_two() {
        let (a, b, c, d) = (AccountId::new(), AccountId::new(), AccountId::new(), AccountId::new());
        let votes = vec![
            vote(a, "mvp", 3, 0),
            vote(a, "mvp", 3, 1),
            vote(b, "mvp", 3, 2),
            vote(c, "mvp", 2, 3),
            vote(d, "mvp", 1, 4),
        ];

        let bonuses = bonus_points(&votes);
        assert_eq!(bonuses.get(&a), Some(&5));
        assert_eq!(bonuses.get(&b), Some(&3));
        assert_eq!(bonuses.get(&c), Some(&2));
        assert_eq!(bonuses.get(&d), None, "fourth place gets nothing");
    }

    #[test]
    fn tie_broken_by_earliest_vote() {
        // Both receive 5 points on the same achievement; A's qualifying
        // vote landed earlier, so A takes 1st (5) and B 2nd (3).
        let (a, b) = (AccountId::new(), AccountId::new());
        let votes = vec![
            vote(a, "clutch", 2, 0),
            vote(b, "clutch", 3, 5),
            vote(a, "clutch", 3, 10),
            vote(b, "clutch", 2, 15),
        ];

        let bonuses = bonus_points(&votes);
        assert_eq!(bonuses.get(&a), Some(&5));
        assert_eq!(bonuses.get(&b), Some(&3));
    }

    #[test]
    fn bonuses_accumulate_across_achievements() {
        let a = AccountId::new();
        let votes = vec![vote(a, "mvp", 1, 0), vote(a, "clutch", 1, 1)];

        let bonuses = bonus_points(&votes);
        assert_eq!(bonuses.get(&a), Some(&10), "first on two achievements");
    }

    #[test]
    fn ineligible_achievements_award_nothing() {
        let a = AccountId::new();
        // rage_quit is negative and not bonus-eligible.
        let votes = vec![vote(a, "rage_quit", 3, 0), vote(a, "good_sport", 3, 1)];

        assert!(bonus_points(&votes).is_empty());
    }

    #[test]
    fn repeated_computation_is_stable() {
        let (a, b) = (AccountId::new(), AccountId::new());
        let votes = vec![vote(a, "mvp", 2, 0), vote(b, "mvp", 2, 0)];

        let first = bonus_points(&votes);
        for _ in 0..10 {
            assert_eq!(bonus_points(&votes), first);
        }
    }
}
