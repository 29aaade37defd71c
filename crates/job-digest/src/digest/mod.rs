//! Email digest of new listings.
//!
//! Renders newly seen listings as an HTML email with a plain-text
//! alternative and delivers it in a single SMTP session.

mod email;
mod generator;

pub use email::{Mailer, SmtpMailer};
pub use generator::{Digest, DigestGenerator};
