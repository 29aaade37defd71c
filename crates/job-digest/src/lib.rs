//! Job listing digest pipeline.
//!
//! This crate provides:
//! - Listing retrieval from the Wanted jobs API with filter mapping
//! - A flat-file sent-set so each listing is only notified once
//! - HTML + plain-text digest rendering
//! - SMTP delivery via STARTTLS
//!
//! A run is strictly sequential: load the sent-set, fetch, diff, and if
//! anything is new, render, send and persist the updated sent-set.

pub mod config;
pub mod digest;
pub mod error;
pub mod pipeline;
pub mod storage;
pub mod wanted;

// Re-export main types
pub use config::{DigestConfig, SearchParameters, SearchValue};
pub use digest::{Digest, DigestGenerator, Mailer, SmtpMailer};
pub use error::{ConfigError, FetchError, MailError, StoreError};
pub use pipeline::{Pipeline, Preview, RunOutcome};
pub use storage::{SentSet, SentSetStore};
pub use wanted::{JobFetcher, Listing, ListingId};
