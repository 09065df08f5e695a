//! The vote transaction.
//!
//! Single orchestration point that makes "spend credits" and "record a
//! vote" appear atomic to the rest of the system. Request-shape problems
//! and business-rule rejections come back as [`VoteOutcome::Rejected`]
//! values the caller branches on; only storage failures are errors.

use chrono::{DateTime, Utc};

use podium_credits::{CreditError, CreditLedger};
use podium_hub::HubHandle;
use podium_ranking::{current_leader, RankingEngine, RankingError};
use podium_store::{
    AccountStore, CancellationSignal, PaidVote, RetryPolicy, StoreError, StorePool, VoteStore,
};
use podium_types::{
    catalog, Account, AccountId, Achievement, HubEvent, Participant, SettingsSnapshot, Vote,
    VoteId, VoteRejection,
};

use crate::visibility::{default_secrecy, sender_redacted};

/// Allowed point range for a single vote.
const MIN_POINTS: i16 = 1;
/// Upper bound of the allowed point range.
const MAX_POINTS: i16 = 3;

/// A vote request as received from the transport layer.
#[derive(Debug, Clone)]
pub struct VoteRequest {
    /// The authenticated acting account.
    pub actor: AccountId,
    /// The account being voted for.
    pub target: AccountId,
    /// Catalog identifier of the achievement.
    pub achievement_id: String,
    /// Point weight; defaults to 1 when omitted.
    pub points: Option<i16>,
    /// Explicit secrecy choice; polarity-based default when omitted.
    pub is_secret: Option<bool>,
}

/// What the vote transaction produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteOutcome {
    /// The vote is durable and paid for.
    Created {
        /// The recorded vote row.
        vote: Vote,
        /// The actor's credit balance after the charge.
        remaining_credits: i64,
    },
    /// The request was rejected; nothing was written.
    Rejected(VoteRejection),
}

/// Errors from the vote transaction (storage problems only; rejections
/// are [`VoteOutcome::Rejected`]).
#[derive(Debug, thiserror::Error)]
pub enum VoteError {
    /// The credit ledger failed.
    #[error(transparent)]
    Credit(#[from] CreditError),

    /// The ranking re-check failed.
    #[error(transparent)]
    Ranking(#[from] RankingError),

    /// The data layer failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A referenced account does not exist.
    #[error("unknown account: {0}")]
    UnknownAccount(AccountId),
}

/// Validate the request shape: self-vote, point range, catalog lookup.
///
/// Pure; returns the resolved achievement and point weight, or the
/// rejection to report. No side effects on rejection.
pub fn validate_request(
    request: &VoteRequest,
) -> Result<(&'static Achievement, i16), VoteRejection> {
    if request.actor == request.target {
        return Err(VoteRejection::SelfVote);
    }

    let points = request.points.unwrap_or(MIN_POINTS);
    if !(MIN_POINTS..=MAX_POINTS).contains(&points) {
        return Err(VoteRejection::InvalidPoints { points });
    }

    let Some(achievement) = catalog::find(&request.achievement_id) else {
        return Err(VoteRejection::UnknownAchievement {
            achievement_id: request.achievement_id.clone(),
        });
    };

    Ok((achievement, points))
}

/// Whether the rank-1 holder changed across a vote.
///
/// A ranking that emptied out (`after` is `None`) is never a leader
/// change; a first-ever leader always is.
pub fn leader_changed(before: Option<AccountId>, after: Option<AccountId>) -> bool {
    after.is_some_and(|a| before != Some(a))
}

/// The vote transaction orchestrator.
///
/// Cheap to clone; all clones share the pool, ledger, engine, and hub.
#[derive(Clone)]
pub struct VoteTransaction {
    pool: StorePool,
    ledger: CreditLedger,
    engine: RankingEngine,
    hub: HubHandle,
    policy: RetryPolicy,
}

impl VoteTransaction {
    /// Assemble the transaction over its collaborators.
    pub fn new(pool: StorePool, ledger: CreditLedger, engine: RankingEngine, hub: HubHandle) -> Self {
        Self {
            pool,
            ledger,
            engine,
            hub,
            policy: RetryPolicy::default(),
        }
    }

    /// Override the retry policy (mainly for tests).
    #[must_use]
    pub const fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Cast a vote.
    ///
    /// `settings` is the caller's point-in-time snapshot of the global
    /// configuration; it is never re-read mid-operation, so a concurrent
    /// admin change cannot alter this vote's outcome.
    ///
    /// # Errors
    ///
    /// Returns [`VoteError`] for storage failures only. Validation and
    /// business-rule outcomes come back as [`VoteOutcome::Rejected`].
    pub async fn cast(
        &self,
        request: VoteRequest,
        settings: &SettingsSnapshot,
        now: DateTime<Utc>,
        cancel: &CancellationSignal,
    ) -> Result<VoteOutcome, VoteError> {
        // 1. Request shape: no side effects, reported immediately.
        let (achievement, points) = match validate_request(&request) {
            Ok(resolved) => resolved,
            Err(rejection) => return Ok(VoteOutcome::Rejected(rejection)),
        };

        // 2. Global pause gate from the passed snapshot.
        if settings.voting_paused {
            return Ok(VoteOutcome::Rejected(VoteRejection::VotingPaused));
        }

        // 3. Up-to-date balance (applies accrual). The rejection carries
        // the balance so the client needs no second round-trip.
        let balance = self
            .ledger
            .current_balance(
                request.actor,
                now,
                settings.credit_interval(),
                settings.credit_cap,
                cancel,
            )
            .await?;
        if balance.balance < i64::from(points) {
            return Ok(VoteOutcome::Rejected(VoteRejection::InsufficientCredits {
                balance: balance.balance,
            }));
        }

        // Resolve both participants for the broadcast payload (and to
        // fail fast on a vanished target).
        let actor = self.fetch_account(request.actor, cancel).await?;
        let target = self.fetch_account(request.target, cancel).await?;

        // 5. Secrecy: explicit flag wins, else polarity default.
        let is_secret = request
            .is_secret
            .unwrap_or_else(|| default_secrecy(achievement.polarity));

        let vote = Vote {
            id: VoteId::new(),
            from_account: request.actor,
            to_account: request.target,
            achievement_id: achievement.id.to_owned(),
            points,
            is_secret,
            invalidated: false,
            created_at: now,
        };

        // 8a. Who leads before the insert (positive achievements only).
        let leader_before = if achievement.polarity.is_positive() {
            let standings = self.engine.standings(cancel).await?;
            current_leader(&standings.rows).map(|row| row.account_id)
        } else {
            None
        };

        // 4+6. Charge and insert in one durable transaction: a charge is
        // never stranded without its vote row.
        let paid = self
            .policy
            .run("vote_charge_and_insert", cancel, || async {
                VoteStore::new(self.pool.pool()).charge_and_insert(&vote).await
            })
            .await?;

        let remaining_credits = match paid {
            PaidVote::Recorded { remaining_credits } => remaining_credits,
            PaidVote::Insufficient => {
                // Lost the race to a concurrent charge between steps 3 and 4.
                return Ok(VoteOutcome::Rejected(VoteRejection::InsufficientCredits {
                    balance: balance.balance,
                }));
            }
        };

        // 7. Fan out, with the sender redacted when the resolved
        // visibility says so.
        let sender = if sender_redacted(settings.visibility, vote.is_secret) {
            None
        } else {
            Some(participant(&actor))
        };
        self.hub.broadcast(HubEvent::NewVote {
            sender,
            target: participant(&target),
            achievement: achievement.info(),
            points,
            created_at: vote.created_at,
        });

        // 8b. Re-read the standings after the durable insert; a change of
        // the rank-1 holder gets its own event.
        if achievement.polarity.is_positive() {
            let standings = self.engine.standings(cancel).await?;
            if let Some(leader) = current_leader(&standings.rows) {
                if leader_changed(leader_before, Some(leader.account_id)) {
                    tracing::info!(leader = %leader.account_id, score = leader.total_score, "new leader");
                    self.hub.broadcast(HubEvent::NewLeader {
                        leader: Participant {
                            account_id: leader.account_id,
                            username: leader.username.clone(),
                        },
                        total_score: leader.total_score,
                    });
                }
            }
        }

        Ok(VoteOutcome::Created {
            vote,
            remaining_credits,
        })
    }

    /// Fetch an account through the retry wrapper, failing on absence.
    async fn fetch_account(
        &self,
        id: AccountId,
        cancel: &CancellationSignal,
    ) -> Result<Account, VoteError> {
        self.policy
            .run("vote_fetch_account", cancel, || async {
                AccountStore::new(self.pool.pool()).get(id).await
            })
            .await?
            .ok_or(VoteError::UnknownAccount(id))
    }
}

/// Build the broadcast projection of an account.
fn participant(account: &Account) -> Participant {
    Participant {
        account_id: account.id,
        username: account.username.clone(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(points: Option<i16>, achievement: &str) -> VoteRequest {
        VoteRequest {
            actor: AccountId::new(),
            target: AccountId::new(),
            achievement_id: achievement.to_owned(),
            points,
            is_secret: None,
        }
    }

    #[test]
    fn self_vote_is_always_rejected() {
        let id = AccountId::new();
        let req = VoteRequest {
            actor: id,
            target: id,
            achievement_id: String::from("mvp"),
            points: Some(2),
            is_secret: Some(false),
        };
        assert_eq!(validate_request(&req), Err(VoteRejection::SelfVote));
    }

    #[test]
    fn points_outside_range_are_rejected() {
        for bad in [0, 4, -1, 100] {
            let req = request(Some(bad), "mvp");
            assert_eq!(
                validate_request(&req),
                Err(VoteRejection::InvalidPoints { points: bad })
            );
        }
    }

    #[test]
    fn points_default_to_one() {
        let req = request(None, "mvp");
        let (_, points) = validate_request(&req).unwrap();
        assert_eq!(points, 1);
    }

    #[test]
    fn unknown_achievement_is_rejected() {
        let req = request(Some(1), "nonexistent");
        assert_eq!(
            validate_request(&req),
            Err(VoteRejection::UnknownAchievement {
                achievement_id: String::from("nonexistent"),
            })
        );
    }

    #[test]
    fn leader_change_detection() {
        let (a, b) = (AccountId::new(), AccountId::new());
        assert!(!leader_changed(Some(a), Some(a)), "same leader");
        assert!(leader_changed(Some(a), Some(b)), "leadership moved");
        assert!(leader_changed(None, Some(a)), "first leader");
        assert!(!leader_changed(Some(a), None), "empty roster after");
        assert!(!leader_changed(None, None));
    }
}
