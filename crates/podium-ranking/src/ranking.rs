//! Global ranking computation.
//!
//! Pure, side-effect-free derivation of the standings from the roster and
//! the valid vote set. Recomputed in full on every call: vote volume in
//! this domain is hundreds of rows, and a stale rank is worse than a
//! cheap recompute.

use std::collections::BTreeMap;

use podium_types::{catalog, Account, AccountId, RankingRow, TopThree, Vote};

use crate::bonus::bonus_points;

/// Compute the full global ranking.
///
/// - `net_votes` = positive-achievement points received minus
///   negative-achievement points received; zero-vote accounts appear at 0.
/// - `total_score` = net votes + positional bonuses.
/// - Sorted by total score descending, ties broken by username ascending
///   (ordinal, locale-naive).
/// - Competition ranking: equal scores share a rank, and the next
///   distinct score resumes at the 1-based row position.
///
/// Votes referencing identifiers missing from the catalog are skipped.
pub fn global_ranking(roster: &[Account], votes: &[Vote]) -> Vec<RankingRow> {
    let mut net: BTreeMap<AccountId, i64> = BTreeMap::new();

    for vote in votes {
        let Some(achievement) = catalog::find(&vote.achievement_id) else {
            continue;
        };
        let signed = if achievement.polarity.is_positive() {
            i64::from(vote.points)
        } else {
            i64::from(vote.points).saturating_neg()
        };
        net.entry(vote.to_account)
            .and_modify(|n| *n = n.saturating_add(signed))
            .or_insert(signed);
    }

    let bonuses = bonus_points(votes);

    let mut rows: Vec<RankingRow> = roster
        .iter()
        .map(|account| {
            let net_votes = net.get(&account.id).copied().unwrap_or(0);
            let bonus = bonuses.get(&account.id).copied().unwrap_or(0);
            RankingRow {
                account_id: account.id,
                username: account.username.clone(),
                net_votes,
                bonus_points: bonus,
                total_score: net_votes.saturating_add(bonus),
                rank: 0,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.total_score
            .cmp(&a.total_score)
            .then_with(|| a.username.cmp(&b.username))
    });

    // Competition ranking: 1,1,3 rather than 1,1,2.
    let mut prev_score: Option<i64> = None;
    let mut current_rank: u32 = 1;
    for (position, row) in rows.iter_mut().enumerate() {
        let one_based = u32::try_from(position.saturating_add(1)).unwrap_or(u32::MAX);
        if prev_score != Some(row.total_score) {
            current_rank = one_based;
            prev_score = Some(row.total_score);
        }
        row.rank = current_rank;
    }

    rows
}

/// The first three entries of the ranking, or fewer for a small roster.
pub fn top_three(rows: &[RankingRow]) -> TopThree {
    TopThree {
        first: rows.first().cloned(),
        second: rows.get(1).cloned(),
        third: rows.get(2).cloned(),
    }
}

/// The account currently holding rank 1, if the roster is non-empty.
pub fn current_leader(rows: &[RankingRow]) -> Option<&RankingRow> {
    rows.first()
}

/// Whether enough votes have been recorded for ranks to be displayed.
///
/// Below the threshold the engine still computes raw numbers; callers
/// suppress the rank column rather than show a misleading one.
pub const fn is_active(total_votes: u64, min_votes: u64) -> bool {
    total_votes >= min_votes
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects, clippy::indexing_slicing)]
mod tests {
    use chrono::{TimeZone, Utc};
    use podium_types::VoteId;

    use super::*;

    fn account(name: &str) -> Account {
        Account {
            id: AccountId::new(),
            external_id: format!("steam:{name}"),
            username: name.to_owned(),
            avatar_url: None,
            credit_balance: 0,
            last_accrual_at: Utc.timestamp_opt(1_000_000, 0).unwrap(),
            is_admin: false,
            created_at: Utc.timestamp_opt(1_000_000, 0).unwrap(),
        }
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
            created_at: Utc.timestamp_opt(1_000_000, 0).unwrap() + chrono::Duration::seconds(secs),
        }
    }

    #[test]
    fn zero_vote_accounts_appear_at_zero() {
        let roster = vec![account("alice"), account("bob")];
        let rows = global_ranking(&roster, &[]);

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.net_votes == 0 && r.total_score == 0));
        // Equal scores share rank 1; tie broken alphabetically for order.
        assert_eq!(rows[0].username, "alice");
        assert_eq!(rows[0].rank, 1);
        assert_eq!(rows[1].rank, 1);
    }

    #[test]
    fn negative_achievements_subtract() {
        let roster = vec![account("alice")];
        let alice = roster[0].id;
        let votes = vec![
            vote(alice, "good_sport", 3, 0),
            vote(alice, "rage_quit", 2, 1),
        ];

        let rows = global_ranking(&roster, &votes);
        assert_eq!(rows[0].net_votes, 1);
    }

    #[test]
    fn competition_ranking_shares_and_skips() {
        // Scores 10, 10, 7 -> ranks 1, 1, 3.
        let roster = vec![account("alice"), account("bob"), account("carol")];
        let (a, b, c) = (roster[0].id, roster[1].id, roster[2].id);
        let votes = vec![
            vote(a, "good_sport", 3, 0),
            vote(a, "good_sport", 2, 1),
            vote(b, "good_sport", 3, 2),
            vote(b, "good_sport", 2, 3),
            vote(c, "good_sport", 2, 4),
        ];

        let rows = global_ranking(&roster, &votes);
        assert_eq!(
            rows.iter().map(|r| r.rank).collect::<Vec<_>>(),
            vec![1, 1, 3]
        );
    }

    #[test]
    fn ties_break_by_username_ordinal() {
        let roster = vec![account("zed"), account("amy")];
        let rows = global_ranking(&roster, &[]);
        assert_eq!(rows[0].username, "amy");
        assert_eq!(rows[1].username, "zed");
    }

    #[test]
    fn rank_is_monotone_in_score() {
        let roster = vec![account("a"), account("b"), account("c"), account("d")];
        let votes: Vec<Vote> = roster
            .iter()
            .enumerate()
            .flat_map(|(i, acct)| {
                (0..i).map(move |s| {
                    vote(acct.id, "good_sport", 1, i64::try_from(s).unwrap())
                })
            })
            .collect();

        let rows = global_ranking(&roster, &votes);
        for pair in rows.windows(2) {
            assert!(pair[0].total_score >= pair[1].total_score);
            assert!(pair[0].rank <= pair[1].rank);
        }
    }

    #[test]
    fn bonus_feeds_into_total_score() {
        let roster = vec![account("alice")];
        let alice = roster[0].id;
        // 3 net points plus a 5-point first-place bonus on "mvp".
        let votes = vec![vote(alice, "mvp", 3, 0)];

        let rows = global_ranking(&roster, &votes);
        assert_eq!(rows[0].net_votes, 3);
        assert_eq!(rows[0].bonus_points, 5);
        assert_eq!(rows[0].total_score, 8);
    }

    #[test]
    fn unknown_achievement_ids_are_skipped() {
        let roster = vec![account("alice")];
        let votes = vec![vote(roster[0].id, "retired_id", 3, 0)];

        let rows = global_ranking(&roster, &votes);
        assert_eq!(rows[0].total_score, 0);
    }

    #[test]
    fn top_three_handles_small_rosters() {
        let roster = vec![account("alice"), account("bob")];
        let rows = global_ranking(&roster, &[]);

        let podium = top_three(&rows);
        assert!(podium.first.is_some());
        assert!(podium.second.is_some());
        assert!(podium.third.is_none());
    }

    #[test]
    fn current_leader_is_the_top_row_or_nothing() {
        assert!(current_leader(&[]).is_none());

        let roster = vec![account("alice"), account("bob")];
        let alice = roster[0].id;
        let votes = vec![vote(alice, "good_sport", 3, 0)];
        let rows = global_ranking(&roster, &votes);

        let leader = current_leader(&rows).unwrap();
        assert_eq!(leader.account_id, alice);
        assert_eq!(leader.rank, 1);
    }

    #[test]
    fn activation_gate_thresholds() {
        assert!(!is_active(9, 10));
        assert!(is_active(10, 10));
        assert!(is_active(11, 10));
    }
}
