//! Reminder scheduling and notification delivery for the campus backend.
//!
//! - [`DedupStore`] -- batched "already notified?" lookups over a trailing
//!   window.
//! - [`NotificationFanout`] -- bulk-inserts one notification per recipient
//!   and hands Web Push delivery to the dispatcher after commit.
//! - [`delivery`] -- the [`PushTransport`] seam and its Web Push
//!   implementation.
//! - [`PushDispatcher`] -- bounded, detached push delivery worker pool.
//! - [`ReminderGenerator`] -- turns upcoming timeslots into lesson reminders.
//! - [`ReminderScheduler`] -- the background polling loop.

pub mod dedup;
pub mod delivery;
pub mod dispatcher;
pub mod fanout;
pub mod reminders;
pub mod scheduler;

pub use dedup::{DedupKey, DedupStore};
pub use delivery::web_push::{WebPushConfig, WebPushTransport};
pub use delivery::{DeliveryOutcome, PushMessage, PushTarget, PushTransport};
pub use dispatcher::PushDispatcher;
pub use fanout::NotificationFanout;
pub use reminders::{ReminderError, ReminderGenerator};
pub use scheduler::{
    CycleOutcome, ReminderScheduler, SchedulerConfig, SchedulerHandle, SchedulerState,
    MIN_POLL_INTERVAL,
};
