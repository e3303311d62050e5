use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use cc_core::entry::sort_for_view;
use cc_core::ports::{ClockPort, DocumentStorePort, SnapshotResult, SnapshotStream, StoreError};
use cc_core::{Entry, EntryId, NewEntry, ServerTimestamp, UserId};

/// In-process realtime document store.
///
/// 内存版的实时文档存储。
///
/// Every live query receives a full, ordered snapshot of its owner's entries
/// on subscribe and after each change to that owner's entries.
pub struct InMemoryDocumentStore {
    clock: Arc<dyn ClockPort>,
    state: Mutex<StoreState>,
}

#[derive(Default)]
struct StoreState {
    records: HashMap<EntryId, Entry>,
    last_timestamp: i64,
    queries: Vec<LiveQuery>,
    faults: FaultPlan,
}

struct LiveQuery {
    owner: UserId,
    tx: mpsc::UnboundedSender<SnapshotResult>,
}

#[derive(Default)]
struct FaultPlan {
    failing_subscribes: u32,
    failing_adds: u32,
    failing_deletes: HashSet<EntryId>,
}

impl InMemoryDocumentStore {
    pub fn new(clock: Arc<dyn ClockPort>) -> Self {
        Self {
            clock,
            state: Mutex::new(StoreState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every stored record regardless of owner, newest first.
    pub fn all_entries(&self) -> Vec<Entry> {
        sort_for_view(self.state().records.values().cloned().collect())
    }

    /// Number of open live queries, optionally restricted to one owner.
    pub fn live_query_count(&self, owner: Option<&UserId>) -> usize {
        let mut state = self.state();
        state.queries.retain(|q| !q.tx.is_closed());
        state
            .queries
            .iter()
            .filter(|q| owner.map_or(true, |o| &q.owner == o))
            .count()
    }

    /// Fail the next `count` subscribe calls with a transport error.
    pub fn fail_next_subscribes(&self, count: u32) {
        self.state().faults.failing_subscribes = count;
    }

    /// Fail the next `count` add calls with a transport error.
    pub fn fail_next_adds(&self, count: u32) {
        self.state().faults.failing_adds = count;
    }

    /// Fail the next delete of `id` with a transport error.
    pub fn fail_delete_of(&self, id: EntryId) {
        self.state().faults.failing_deletes.insert(id);
    }

    /// Push a transport fault into matching live queries and close them.
    ///
    /// Returns the number of queries interrupted.
    pub fn interrupt_queries(&self, owner: Option<&UserId>, reason: &str) -> usize {
        let mut state = self.state();
        let mut interrupted = 0;
        state.queries.retain(|query| {
            if owner.map_or(false, |o| &query.owner != o) {
                return true;
            }
            let _ = query.tx.send(Err(StoreError::Transport(reason.to_string())));
            interrupted += 1;
            false
        });
        warn!(interrupted, reason, "Interrupted live queries");
        interrupted
    }

    fn snapshot_for(records: &HashMap<EntryId, Entry>, owner: &UserId) -> Vec<Entry> {
        sort_for_view(
            records
                .values()
                .filter(|entry| &entry.owner_id == owner)
                .cloned()
                .collect(),
        )
    }

    fn broadcast(state: &mut StoreState, owner: &UserId) {
        let snapshot = Self::snapshot_for(&state.records, owner);
        state.queries.retain(|query| {
            if &query.owner != owner {
                return !query.tx.is_closed();
            }
            query.tx.send(Ok(snapshot.clone())).is_ok()
        });
    }

    fn next_timestamp(&self, state: &mut StoreState) -> ServerTimestamp {
        let now = self.clock.now_ms();
        let ts = if now > state.last_timestamp {
            now
        } else {
            state.last_timestamp + 1
        };
        state.last_timestamp = ts;
        ServerTimestamp::from_epoch_millis(ts)
    }
}

#[async_trait]
impl DocumentStorePort for InMemoryDocumentStore {
    async fn subscribe(&self, owner: &UserId) -> Result<SnapshotStream, StoreError> {
        let mut state = self.state();
        if state.faults.failing_subscribes > 0 {
            state.faults.failing_subscribes -= 1;
            return Err(StoreError::Transport("subscribe rejected".into()));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let initial = Self::snapshot_for(&state.records, owner);
        // The receiver is still in hand, this cannot fail.
        let _ = tx.send(Ok(initial));
        state.queries.push(LiveQuery {
            owner: owner.clone(),
            tx,
        });
        debug!(owner = %owner, "Opened live query");
        Ok(rx)
    }

    async fn add(&self, entry: NewEntry) -> Result<EntryId, StoreError> {
        let mut state = self.state();
        if state.faults.failing_adds > 0 {
            state.faults.failing_adds -= 1;
            return Err(StoreError::Transport("write rejected".into()));
        }

        let id = EntryId::new();
        let created_at = self.next_timestamp(&mut state);
        let owner = entry.owner_id.clone();
        state.records.insert(
            id.clone(),
            Entry {
                id: id.clone(),
                owner_id: entry.owner_id,
                text: entry.text,
                created_at,
            },
        );
        Self::broadcast(&mut state, &owner);
        info!(entry_id = %id, owner = %owner, "Stored entry");
        Ok(id)
    }

    async fn delete_by_id(&self, owner: &UserId, id: &EntryId) -> Result<(), StoreError> {
        let mut state = self.state();
        if state.faults.failing_deletes.remove(id) {
            return Err(StoreError::Transport(format!("delete of {id} timed out")));
        }

        match state.records.get(id) {
            None => return Err(StoreError::NotFound(id.clone())),
            Some(entry) if &entry.owner_id != owner => {
                warn!(entry_id = %id, requester = %owner, "Rejected cross-owner delete");
                return Err(StoreError::PermissionDenied(id.clone()));
            }
            Some(_) => {}
        }

        state.records.remove(id);
        Self::broadcast(&mut state, owner);
        info!(entry_id = %id, owner = %owner, "Deleted entry");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    struct FixedClock(AtomicI64);

    impl ClockPort for FixedClock {
        fn now_ms(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn store() -> InMemoryDocumentStore {
        InMemoryDocumentStore::new(Arc::new(FixedClock(AtomicI64::new(1_000))))
    }

    fn new_entry(owner: &UserId, text: &str) -> NewEntry {
        NewEntry {
            owner_id: owner.clone(),
            text: text.to_string(),
        }
    }

    async fn next_ok(rx: &mut SnapshotStream) -> Vec<Entry> {
        rx.recv()
            .await
            .expect("stream open")
            .expect("snapshot, not fault")
    }

    #[tokio::test]
    async fn subscribe_delivers_initial_snapshot() {
        let store = store();
        let owner = UserId::from("u1");
        let mut rx = store.subscribe(&owner).await.unwrap();
        assert!(next_ok(&mut rx).await.is_empty());
    }

    #[tokio::test]
    async fn add_pushes_ordered_snapshot_to_owner_only() {
        let store = store();
        let alice = UserId::from("alice");
        let bob = UserId::from("bob");
        let mut alice_rx = store.subscribe(&alice).await.unwrap();
        let mut bob_rx = store.subscribe(&bob).await.unwrap();
        next_ok(&mut alice_rx).await;
        next_ok(&mut bob_rx).await;

        store.add(new_entry(&alice, "first")).await.unwrap();
        store.add(new_entry(&alice, "second")).await.unwrap();

        next_ok(&mut alice_rx).await;
        let snapshot = next_ok(&mut alice_rx).await;
        let texts: Vec<_> = snapshot.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["second", "first"]);
        assert!(bob_rx.try_recv().is_err(), "bob must not see alice's writes");
    }

    #[tokio::test]
    async fn timestamps_strictly_increase_under_a_frozen_clock() {
        let store = store();
        let owner = UserId::from("u1");
        for text in ["a", "b", "c"] {
            store.add(new_entry(&owner, text)).await.unwrap();
        }
        let mut stamps: Vec<_> = store
            .all_entries()
            .iter()
            .map(|e| e.created_at.as_millis())
            .collect();
        stamps.sort();
        assert_eq!(stamps, vec![1_000, 1_001, 1_002]);
    }

    #[tokio::test]
    async fn delete_rejects_foreign_and_unknown_ids() {
        let store = store();
        let alice = UserId::from("alice");
        let bob = UserId::from("bob");
        let id = store.add(new_entry(&alice, "secret")).await.unwrap();

        assert_eq!(
            store.delete_by_id(&bob, &id).await,
            Err(StoreError::PermissionDenied(id.clone()))
        );
        let missing = EntryId::from("missing");
        assert_eq!(
            store.delete_by_id(&alice, &missing).await,
            Err(StoreError::NotFound(missing))
        );
        assert_eq!(store.all_entries().len(), 1);

        store.delete_by_id(&alice, &id).await.unwrap();
        assert!(store.all_entries().is_empty());
    }

    #[tokio::test]
    async fn injected_faults_fire_once() {
        let store = store();
        let owner = UserId::from("u1");

        store.fail_next_subscribes(1);
        assert!(store.subscribe(&owner).await.is_err());
        assert!(store.subscribe(&owner).await.is_ok());

        store.fail_next_adds(1);
        assert!(store.add(new_entry(&owner, "x")).await.is_err());
        let id = store.add(new_entry(&owner, "x")).await.unwrap();

        store.fail_delete_of(id.clone());
        assert!(matches!(
            store.delete_by_id(&owner, &id).await,
            Err(StoreError::Transport(_))
        ));
        assert!(store.delete_by_id(&owner, &id).await.is_ok());
    }

    #[tokio::test]
    async fn interrupt_sends_fault_and_closes_stream() {
        let store = store();
        let owner = UserId::from("u1");
        let mut rx = store.subscribe(&owner).await.unwrap();
        next_ok(&mut rx).await;

        assert_eq!(store.interrupt_queries(Some(&owner), "network down"), 1);
        assert!(matches!(
            rx.recv().await,
            Some(Err(StoreError::Transport(_)))
        ));
        assert!(rx.recv().await.is_none());
        assert_eq!(store.live_query_count(None), 0);
    }

    #[tokio::test]
    async fn dropped_receivers_are_pruned() {
        let store = store();
        let owner = UserId::from("u1");
        let rx = store.subscribe(&owner).await.unwrap();
        assert_eq!(store.live_query_count(Some(&owner)), 1);
        drop(rx);
        assert_eq!(store.live_query_count(Some(&owner)), 0);
    }
}
