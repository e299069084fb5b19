//! Bounded, detached Web Push delivery.
//!
//! [`PushDispatcher`] owns a [`TaskTracker`] and a [`Semaphore`]: every
//! subscription gets its own task, at most `concurrency` of them talk to
//! push services at once, and callers never wait for delivery. Subscription
//! lookups and gone-endpoint deletes go through the dispatcher's own
//! connection pool so delivery bookkeeping never borrows connections from
//! request handlers.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use campus_core::types::DbId;
use campus_db::models::push_subscription::PushSubscription;
use campus_db::repositories::PushSubscriptionRepo;
use campus_db::DbPool;
use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio_util::task::TaskTracker;

use crate::delivery::{DeliveryOutcome, PushMessage, PushTarget, PushTransport};

/// Default cap on simultaneous push requests.
pub const DEFAULT_CONCURRENCY: usize = 16;

// ---------------------------------------------------------------------------
// PushDispatcher
// ---------------------------------------------------------------------------

pub struct PushDispatcher {
    deliveries: Deliveries,
    /// Set once `shutdown` has closed the tracker for good.
    shut_down: Mutex<bool>,
}

/// Everything a delivery task needs; cloned into tasks that spawn more.
#[derive(Clone)]
struct Deliveries {
    transport: Arc<dyn PushTransport>,
    pool: DbPool,
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
}

impl PushDispatcher {
    pub fn new(transport: Arc<dyn PushTransport>, pool: DbPool, concurrency: usize) -> Self {
        Self {
            deliveries: Deliveries {
                transport,
                pool,
                permits: Arc::new(Semaphore::new(concurrency.max(1))),
                tracker: TaskTracker::new(),
            },
            shut_down: Mutex::new(false),
        }
    }

    /// Schedule one delivery per subscription and return immediately.
    ///
    /// Returns the number of deliveries scheduled.
    pub fn dispatch(&self, subscriptions: Vec<PushSubscription>, message: PushMessage) -> usize {
        self.deliveries.spawn(subscriptions, Arc::new(message))
    }

    /// Look up the active subscriptions of `users` and deliver `message` to
    /// each, all in the background. Once this returns the work is tracked,
    /// so dropping the caller afterwards does not lose the push.
    pub fn dispatch_to_users(&self, users: Vec<DbId>, message: PushMessage) {
        if users.is_empty() {
            return;
        }
        let deliveries = self.deliveries.clone();
        self.deliveries.tracker.spawn(async move {
            let subscriptions =
                match PushSubscriptionRepo::list_active_for_users(&deliveries.pool, &users).await {
                    Ok(subs) => subs,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to load push subscriptions");
                        return;
                    }
                };
            if subscriptions.is_empty() {
                return;
            }
            let scheduled = deliveries.spawn(subscriptions, Arc::new(message));
            tracing::debug!(scheduled, "Push deliveries scheduled");
        });
    }

    /// Number of deliveries still queued or in flight.
    pub fn in_flight(&self) -> usize {
        self.deliveries.tracker.len()
    }

    pub fn is_closed(&self) -> bool {
        self.deliveries.tracker.is_closed()
    }

    /// Wait until every delivery scheduled so far has finished. After
    /// `shutdown` the tracker stays closed.
    pub async fn wait_idle(&self) {
        let tracker = &self.deliveries.tracker;
        {
            let shut_down = self.shut_down.lock().unwrap_or_else(PoisonError::into_inner);
            if !*shut_down {
                tracker.close();
            }
        }
        tracker.wait().await;

        let shut_down = self.shut_down.lock().unwrap_or_else(PoisonError::into_inner);
        if !*shut_down {
            tracker.reopen();
        }
    }

    /// Close the tracker and wait up to `timeout` for in-flight deliveries.
    /// Returns `true` if everything drained.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        let tracker = &self.deliveries.tracker;
        {
            let mut shut_down = self.shut_down.lock().unwrap_or_else(PoisonError::into_inner);
            *shut_down = true;
            tracker.close();
        }
        match tokio::time::timeout(timeout, tracker.wait()).await {
            Ok(()) => {
                tracing::info!("Push dispatcher drained");
                true
            }
            Err(_) => {
                tracing::warn!(
                    pending = tracker.len(),
                    "Push dispatcher shutdown timed out, abandoning deliveries"
                );
                false
            }
        }
    }
}

impl Deliveries {
    fn spawn(&self, subscriptions: Vec<PushSubscription>, message: Arc<PushMessage>) -> usize {
        let count = subscriptions.len();

        for subscription in subscriptions {
            let target = PushTarget::from(subscription);
            let transport = Arc::clone(&self.transport);
            let permits = Arc::clone(&self.permits);
            let pool = self.pool.clone();
            let message = Arc::clone(&message);

            self.tracker.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };
                let attempt = AssertUnwindSafe(transport.send(&target, &message))
                    .catch_unwind()
                    .await;
                match attempt {
                    Ok(outcome) => handle_outcome(&pool, &target, outcome).await,
                    Err(_) => tracing::error!(
                        subscription_id = target.subscription_id,
                        endpoint = %target.endpoint,
                        "Push delivery panicked"
                    ),
                }
            });
        }

        count
    }
}

async fn handle_outcome(pool: &DbPool, target: &PushTarget, outcome: DeliveryOutcome) {
    match outcome {
        DeliveryOutcome::Delivered => {
            tracing::debug!(subscription_id = target.subscription_id, "Push delivered");
        }
        DeliveryOutcome::Gone { status } => {
            match PushSubscriptionRepo::delete(pool, target.subscription_id).await {
                Ok(_) => tracing::info!(
                    subscription_id = target.subscription_id,
                    endpoint = %target.endpoint,
                    status,
                    "Deleted gone push subscription"
                ),
                Err(e) => tracing::warn!(
                    subscription_id = target.subscription_id,
                    error = %e,
                    "Failed to delete gone push subscription"
                ),
            }
        }
        DeliveryOutcome::Failed { reason } => {
            tracing::warn!(
                subscription_id = target.subscription_id,
                endpoint = %target.endpoint,
                reason = %reason,
                "Push delivery failed"
            );
        }
    }
}
