//! The notification hub: a single-writer session registry with
//! non-blocking fan-out.
//!
//! All registry mutation (register, unregister, broadcast dispatch,
//! targeted sends) is funneled through one command channel consumed by a
//! single task, so a session is always in exactly one of
//! {registered, gone} from any observer's point of view. Introspection
//! reads go through a separate lock-protected snapshot the writer task
//! maintains; they tolerate a few microseconds of staleness in exchange
//! for never touching the dispatch path.
//!
//! Sends are fire-and-forget: each session owns a bounded outbound queue,
//! and a queue that is full evicts that session rather than stalling
//! delivery to everyone else.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;

use podium_types::{AccountId, HubEvent, SessionId};

/// Outbound queue capacity per session.
///
/// A client that falls this many events behind is a slow consumer and is
/// evicted instead of applying backpressure to the hub.
pub const SESSION_QUEUE_CAPACITY: usize = 64;

/// Commands accepted by the hub's writer task.
enum Command {
    Register {
        session_id: SessionId,
        account_id: AccountId,
        sender: mpsc::Sender<HubEvent>,
    },
    Unregister {
        session_id: SessionId,
    },
    Broadcast {
        event: HubEvent,
    },
    SendToAccount {
        account_id: AccountId,
        event: HubEvent,
    },
}

/// A registered session as the writer task tracks it.
struct SessionEntry {
    account_id: AccountId,
    sender: mpsc::Sender<HubEvent>,
}

/// Point-in-time introspection snapshot, maintained by the writer task.
#[derive(Debug, Default)]
struct HubSnapshot {
    connected: HashSet<AccountId>,
    session_count: usize,
}

/// A live session's receiving end, handed to the transport layer on
/// registration.
///
/// Dropping the handle without calling
/// [`HubHandle::unregister`] leaves the session registered until the hub
/// notices the closed queue on the next send; transports should
/// unregister explicitly on disconnect.
#[derive(Debug)]
pub struct SessionHandle {
    /// Identity of the registered session.
    pub session_id: SessionId,
    /// Outbound event queue to drain into the transport.
    pub events: mpsc::Receiver<HubEvent>,
}

/// Cloneable front-end to the hub.
///
/// All methods are non-blocking; the caller never waits for delivery.
#[derive(Debug, Clone)]
pub struct HubHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshot: Arc<RwLock<HubSnapshot>>,
}

impl HubHandle {
    /// Start the hub's writer task and return its handle.
    pub fn spawn() -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let snapshot = Arc::new(RwLock::new(HubSnapshot::default()));

        tokio::spawn(run_writer(rx, Arc::clone(&snapshot)));

        Self { commands, snapshot }
    }

    /// Register a session for an account and receive its outbound queue.
    ///
    /// An account holds at most one session: registering while an older
    /// session for the same account is live evicts the older one.
    pub fn register(&self, account_id: AccountId) -> SessionHandle {
        let session_id = SessionId::new();
        let (sender, events) = mpsc::channel(SESSION_QUEUE_CAPACITY);
        self.send_command(Command::Register {
            session_id,
            account_id,
            sender,
        });
        SessionHandle { session_id, events }
    }

    /// Unregister a session (transport closed, logout).
    ///
    /// Silently a no-op if the session was already evicted.
    pub fn unregister(&self, session_id: SessionId) {
        self.send_command(Command::Unregister { session_id });
    }

    /// Queue an event for every registered session.
    pub fn broadcast(&self, event: HubEvent) {
        self.send_command(Command::Broadcast { event });
    }

    /// Queue an event for one account's session, if connected.
    ///
    /// Fire-and-forget: a disconnected account is silently skipped.
    pub fn send_to_account(&self, account_id: AccountId, event: HubEvent) {
        self.send_command(Command::SendToAccount { account_id, event });
    }

    /// Number of currently registered sessions.
    ///
    /// Served from the introspection snapshot; may trail the writer task
    /// by an in-flight command.
    pub fn register_count(&self) -> usize {
        self.snapshot
            .read()
            .map(|s| s.session_count)
            .unwrap_or_default()
    }

    /// Whether an account currently has a registered session.
    pub fn is_connected(&self, account_id: AccountId) -> bool {
        self.snapshot
            .read()
            .map(|s| s.connected.contains(&account_id))
            .unwrap_or_default()
    }

    fn send_command(&self, command: Command) {
        if self.commands.send(command).is_err() {
            tracing::warn!("hub writer task is gone; dropping command");
        }
    }
}

/// The writer task: sole owner of the session registry.
async fn run_writer(
    mut commands: mpsc::UnboundedReceiver<Command>,
    snapshot: Arc<RwLock<HubSnapshot>>,
) {
    let mut sessions: HashMap<SessionId, SessionEntry> = HashMap::new();
    let mut by_account: HashMap<AccountId, SessionId> = HashMap::new();

    while let Some(command) = commands.recv().await {
        match command {
            Command::Register {
                session_id,
                account_id,
                sender,
            } => {
                if let Some(old) = by_account.insert(account_id, session_id) {
                    sessions.remove(&old);
                    tracing::debug!(account = %account_id, old_session = %old, "replaced stale session");
                }
                sessions.insert(session_id, SessionEntry { account_id, sender });
                tracing::debug!(account = %account_id, session = %session_id, "session registered");
            }
            Command::Unregister { session_id } => {
                if let Some(entry) = sessions.remove(&session_id) {
                    // Only drop the account index if it still points here;
                    // a replacement session may have taken it over.
                    if by_account.get(&entry.account_id) == Some(&session_id) {
                        by_account.remove(&entry.account_id);
                    }
                    tracing::debug!(session = %session_id, "session unregistered");
                }
            }
            Command::Broadcast { event } => {
                let mut evicted: Vec<SessionId> = Vec::new();
                for (session_id, entry) in &sessions {
                    if !deliver(entry, &event, *session_id) {
                        evicted.push(*session_id);
                    }
                }
                for session_id in evicted {
                    if let Some(entry) = sessions.remove(&session_id) {
                        if by_account.get(&entry.account_id) == Some(&session_id) {
                            by_account.remove(&entry.account_id);
                        }
                    }
                }
            }
            Command::SendToAccount { account_id, event } => {
                let Some(session_id) = by_account.get(&account_id).copied() else {
                    continue;
                };
                let delivered = sessions
                    .get(&session_id)
                    .is_some_and(|entry| deliver(entry, &event, session_id));
                if !delivered {
                    sessions.remove(&session_id);
                    by_account.remove(&account_id);
                }
            }
        }

        publish_snapshot(&snapshot, &sessions);
    }

    tracing::debug!("hub writer task shutting down");
}

/// Try to queue `event` for one session.
///
/// Returns `false` when the session must be evicted: either its queue is
/// full (slow consumer) or its receiver is gone (dead transport).
fn deliver(entry: &SessionEntry, event: &HubEvent, session_id: SessionId) -> bool {
    match entry.sender.try_send(event.clone()) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            tracing::warn!(
                session = %session_id,
                account = %entry.account_id,
                event = event.kind(),
                "slow consumer, evicting session"
            );
            false
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            tracing::debug!(session = %session_id, "session queue closed, evicting");
            false
        }
    }
}

/// Replace the introspection snapshot with the registry's current shape.
fn publish_snapshot(snapshot: &RwLock<HubSnapshot>, sessions: &HashMap<SessionId, SessionEntry>) {
    if let Ok(mut guard) = snapshot.write() {
        guard.session_count = sessions.len();
        guard.connected = sessions.values().map(|e| e.account_id).collect();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::time::Duration;

    use super::*;

    /// Poll until `predicate` holds or a short deadline passes.
    async fn wait_for(mut predicate: impl FnMut() -> bool) {
        for _ in 0..200 {
            if predicate() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert!(predicate(), "condition not reached before deadline");
    }

    fn event() -> HubEvent {
        HubEvent::SyncComplete
    }

    #[tokio::test]
    async fn broadcast_reaches_every_registered_session() {
        let hub = HubHandle::spawn();
        let mut a = hub.register(AccountId::new());
        let mut b = hub.register(AccountId::new());
        wait_for(|| hub.register_count() == 2).await;

        hub.broadcast(event());

        assert_eq!(a.events.recv().await, Some(event()));
        assert_eq!(b.events.recv().await, Some(event()));
    }

    #[tokio::test]
    async fn send_to_account_targets_one_session() {
        let hub = HubHandle::spawn();
        let alice = AccountId::new();
        let mut alice_session = hub.register(alice);
        let mut bob_session = hub.register(AccountId::new());
        wait_for(|| hub.register_count() == 2).await;

        hub.send_to_account(alice, event());

        assert_eq!(alice_session.events.recv().await, Some(event()));
        assert!(bob_session.events.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_to_unconnected_account_is_a_noop() {
        let hub = HubHandle::spawn();
        // Nothing registered: must neither panic nor block.
        hub.send_to_account(AccountId::new(), event());
        hub.broadcast(event());
        wait_for(|| hub.register_count() == 0).await;
    }

    #[tokio::test]
    async fn slow_consumer_is_evicted_not_blocked() {
        let hub = HubHandle::spawn();
        let slow = AccountId::new();
        let fast = AccountId::new();
        let _slow_session = hub.register(slow); // never drained
        let mut fast_session = hub.register(fast);
        wait_for(|| hub.register_count() == 2).await;

        // Overflow the slow session's queue. The fast one drains as it goes.
        let overflow = SESSION_QUEUE_CAPACITY + 5;
        for _ in 0..overflow {
            hub.broadcast(event());
            let _ = fast_session.events.try_recv();
        }

        wait_for(|| !hub.is_connected(slow)).await;
        assert!(hub.is_connected(fast), "fast consumer must survive");
        assert_eq!(hub.register_count(), 1);
    }

    #[tokio::test]
    async fn unregister_removes_the_session() {
        let hub = HubHandle::spawn();
        let alice = AccountId::new();
        let session = hub.register(alice);
        wait_for(|| hub.is_connected(alice)).await;

        hub.unregister(session.session_id);
        wait_for(|| !hub.is_connected(alice)).await;
        assert_eq!(hub.register_count(), 0);
    }

    #[tokio::test]
    async fn reregistering_replaces_the_previous_session() {
        let hub = HubHandle::spawn();
        let alice = AccountId::new();
        let first = hub.register(alice);
        let mut second = hub.register(alice);
        wait_for(|| hub.register_count() == 1).await;

        hub.broadcast(event());
        assert_eq!(second.events.recv().await, Some(event()));

        // Unregistering the stale session must not disconnect the new one.
        hub.unregister(first.session_id);
        wait_for(|| hub.register_count() == 1).await;
        assert!(hub.is_connected(alice));
    }
}
