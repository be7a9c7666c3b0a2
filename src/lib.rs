//! Watches Flavortown projects and announces each new devlog in Slack exactly once.
//!
//! A [`scheduler::Scheduler`] sweeps every registered credential on a fixed
//! cadence. For each tracked project the [`sync::SyncEngine`] diffs the remote
//! devlog ids against the [`store::SeenIdStore`], and the
//! [`dispatch::NotificationDispatcher`] posts whatever is new.

pub mod api;
pub mod config;
pub mod dispatch;
pub mod models;
pub mod registry;
pub mod scheduler;
pub mod sink;
pub mod source;
pub mod store;
pub mod sync;
