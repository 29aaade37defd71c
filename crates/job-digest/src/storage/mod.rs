//! Sent-set storage.
//!
//! Persists the ids of already-notified listings as a flat text file.

mod sent_set;

pub use sent_set::{SentSet, SentSetStore};
