//! Entry store: live, owner-scoped mirror of the remote entry collection.
//!
//! ## Invariants / 不变量
//!
//! - At most one live subscription at a time; each carries a [`Generation`].
//! - Only the current generation may replace the [`LocalView`]; anything a
//!   superseded subscription delivers is dropped.
//! - The view only ever contains entries owned by the subscribed identity.
//! - `add` / `delete_many` never touch the view; their effect arrives as the
//!   next snapshot.

mod subscription;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use cc_core::entry::sort_for_view;
use cc_core::ports::{DocumentStorePort, NotificationPort};
use cc_core::{
    BatchDeleteReport, ClipError, Entry, EntryId, Generation, Identity, LocalView, NewEntry,
    Notification, SubscriptionState, UserId, ValidationError, ViewHealth,
};

use crate::errors::from_store_error;
use crate::policy::{EntryPolicy, SubscriptionPolicy};
use crate::session::{ListenerHandle, SessionProvider};

pub struct EntryStore {
    shared: Arc<Shared>,
}

struct Shared {
    store: Arc<dyn DocumentStorePort>,
    notifier: Arc<dyn NotificationPort>,
    policy: SubscriptionPolicy,
    entry_policy: EntryPolicy,
    control: Mutex<Control>,
    view: watch::Sender<LocalView>,
}

struct Control {
    generation: Generation,
    state: SubscriptionState,
    task: Option<JoinHandle<()>>,
}

impl EntryStore {
    pub fn new(
        store: Arc<dyn DocumentStorePort>,
        notifier: Arc<dyn NotificationPort>,
        policy: SubscriptionPolicy,
        entry_policy: EntryPolicy,
    ) -> Self {
        let (view, _) = watch::channel(LocalView::empty());
        Self {
            shared: Arc::new(Shared {
                store,
                notifier,
                policy,
                entry_policy,
                control: Mutex::new(Control {
                    generation: Generation::NONE,
                    state: SubscriptionState::Unsubscribed,
                    task: None,
                }),
                view,
            }),
        }
    }

    /// Follow `session`: every identity transition re-subscribes this store.
    ///
    /// The listener holds a weak reference, so it never keeps the store alive.
    pub fn bind_to_session(self: &Arc<Self>, session: &SessionProvider) -> ListenerHandle {
        let store: Weak<EntryStore> = Arc::downgrade(self);
        session.on_identity_change(move |identity| {
            if let Some(store) = store.upgrade() {
                store.subscribe(identity);
            }
        })
    }

    /// Scope the live subscription to `identity`, tearing down the previous one.
    ///
    /// `None` empties the view and holds no subscription. Subscribing to the
    /// identity that is already subscribed is a no-op. Must be called from
    /// within a Tokio runtime.
    pub fn subscribe(&self, identity: Option<&Identity>) {
        let mut control = self.shared.control();

        let current_owner = control.state.owner();
        let target_owner = identity.map(|i| &i.id);
        if current_owner == target_owner {
            debug!(owner = ?target_owner, "Subscription already scoped to this identity");
            return;
        }

        if let Some(task) = control.task.take() {
            task.abort();
        }
        control.generation = control.generation.next();
        let generation = control.generation;

        match identity {
            None => {
                control.state = SubscriptionState::Unsubscribed;
                self.shared.view.send_replace(LocalView {
                    generation,
                    ..LocalView::empty()
                });
                info!(%generation, "Unsubscribed; local view cleared");
            }
            Some(identity) => {
                let owner = identity.id.clone();
                control.state = SubscriptionState::Subscribing {
                    generation,
                    owner: owner.clone(),
                };
                self.shared.view.send_replace(LocalView {
                    generation,
                    owner: Some(owner.clone()),
                    entries: Vec::new(),
                    health: ViewHealth::Live,
                });
                info!(%generation, owner = %owner, "Subscribing");
                control.task = Some(tokio::spawn(subscription::run(
                    Arc::clone(&self.shared),
                    generation,
                    owner,
                )));
            }
        }
    }

    /// Tear down the live subscription. Idempotent.
    pub fn unsubscribe(&self) {
        self.subscribe(None);
    }

    pub fn view(&self) -> LocalView {
        self.shared.view.borrow().clone()
    }

    pub fn watch_view(&self) -> watch::Receiver<LocalView> {
        self.shared.view.subscribe()
    }

    pub fn subscription_state(&self) -> SubscriptionState {
        self.shared.control().state.clone()
    }

    /// Propose a new entry. The view picks it up from the next snapshot.
    #[tracing::instrument(name = "entry_store.add", skip(self, identity, text), fields(len = text.len()))]
    pub async fn add(&self, identity: Option<&Identity>, text: &str) -> Result<EntryId, ClipError> {
        let identity = identity.ok_or(ValidationError::MissingIdentity)?;
        self.shared.entry_policy.check(text)?;

        let id = self
            .shared
            .store
            .add(NewEntry {
                owner_id: identity.id.clone(),
                text: text.to_string(),
            })
            .await
            .map_err(from_store_error)?;
        debug!(entry_id = %id, "Entry accepted by store");
        Ok(id)
    }

    /// Delete every id in `ids` owned by the subscribed identity.
    ///
    /// Each deletion is issued independently on behalf of the subscribed
    /// owner, and the store rejects records owned by anyone else. Unknown and
    /// foreign ids are both reported as not-found. Ownership is not checked
    /// against the local view, so an entry whose snapshot has not arrived yet
    /// can still be deleted. Successful deletions are never rolled back.
    #[tracing::instrument(name = "entry_store.delete_many", skip(self, ids), fields(count = ids.len()))]
    pub async fn delete_many(&self, ids: &[EntryId]) -> Result<BatchDeleteReport, ClipError> {
        if ids.is_empty() {
            return Err(ValidationError::EmptySelection.into());
        }

        let owner = self
            .shared
            .control()
            .state
            .owner()
            .cloned()
            .ok_or(ClipError::NoSession)?;

        let mut seen = HashSet::new();
        let mut report = BatchDeleteReport::default();
        let targets: Vec<EntryId> = ids
            .iter()
            .filter(|id| seen.insert((*id).clone()))
            .cloned()
            .collect();

        let store = &self.shared.store;
        let outcomes = join_all(targets.into_iter().map(|id| {
            let owner = &owner;
            async move {
                let result = store.delete_by_id(owner, &id).await;
                (id, result)
            }
        }))
        .await;

        for (id, result) in outcomes {
            match result {
                Ok(()) => report.deleted.push(id),
                Err(err) => {
                    warn!(entry_id = %id, error = %err, "Delete failed");
                    report.failed.push((id, from_store_error(err)));
                }
            }
        }

        info!(
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "Batch delete finished"
        );
        if report.is_complete() {
            Ok(report)
        } else {
            Err(ClipError::BatchDelete(report))
        }
    }

    #[cfg(test)]
    fn current_generation(&self) -> Generation {
        self.shared.control().generation
    }

    #[cfg(test)]
    fn apply_snapshot(&self, generation: Generation, owner: &UserId, entries: Vec<Entry>) -> bool {
        self.shared.apply_snapshot(generation, owner, entries)
    }
}

impl Drop for EntryStore {
    fn drop(&mut self) {
        if let Some(task) = self.shared.control().task.take() {
            task.abort();
        }
    }
}

impl Shared {
    fn control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_current(&self, generation: Generation) -> bool {
        self.control().generation == generation
    }

    /// Replace the view with `entries` if `generation` is still current.
    ///
    /// Returns `false` for a superseded generation; the caller should stop.
    fn apply_snapshot(&self, generation: Generation, owner: &UserId, entries: Vec<Entry>) -> bool {
        let mut control = self.control();
        if control.generation != generation {
            debug!(%generation, current = %control.generation, "Discarding stale snapshot");
            return false;
        }

        let total = entries.len();
        let owned: Vec<Entry> = entries
            .into_iter()
            .filter(|entry| &entry.owner_id == owner)
            .collect();
        if owned.len() != total {
            warn!(
                owner = %owner,
                dropped = total - owned.len(),
                "Snapshot contained foreign entries; dropped them"
            );
        }

        let recovered = matches!(
            self.view.borrow().health,
            ViewHealth::Degraded { .. }
        );
        control.state = SubscriptionState::Active {
            generation,
            owner: owner.clone(),
        };
        self.view.send_replace(LocalView {
            generation,
            owner: Some(owner.clone()),
            entries: sort_for_view(owned),
            health: ViewHealth::Live,
        });
        if recovered {
            info!(%generation, "Live sync recovered");
        }
        true
    }

    /// Move a current subscription into `Error`; flags the view degraded past
    /// the retry ceiling. Returns `false` for a superseded generation.
    fn record_failure(
        &self,
        generation: Generation,
        owner: &UserId,
        attempt: u32,
        reason: String,
    ) -> bool {
        let newly_degraded = {
            let mut control = self.control();
            if control.generation != generation {
                return false;
            }
            control.state = SubscriptionState::Error {
                generation,
                owner: owner.clone(),
                attempt,
                reason,
            };
            if !self.policy.is_degraded(attempt) {
                false
            } else {
                let mut newly = false;
                self.view.send_modify(|view| {
                    newly = view.health == ViewHealth::Live;
                    view.health = ViewHealth::Degraded {
                        consecutive_failures: attempt,
                    };
                });
                newly
            }
        };

        if newly_degraded {
            warn!(%generation, attempt, "Live sync degraded past retry ceiling");
            self.notifier.notify(Notification::warning(
                "Live sync degraded; showing the last known entries",
            ));
        }
        true
    }

    fn mark_subscribing(&self, generation: Generation, owner: &UserId) -> bool {
        let mut control = self.control();
        if control.generation != generation {
            return false;
        }
        control.state = SubscriptionState::Subscribing {
            generation,
            owner: owner.clone(),
        };
        true
    }
}
