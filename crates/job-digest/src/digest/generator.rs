//! Digest content generator.
//!
//! Builds email content from newly seen listings.

use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::wanted::{Listing, ListingId};

/// Rendered digest body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    /// HTML body.
    pub html: String,
    /// Plain-text alternative.
    pub text: String,
    /// Number of listings included.
    pub listing_count: usize,
}

/// Generates digest email content from listings.
#[derive(Debug, Clone)]
pub struct DigestGenerator {
    job_url_template: String,
}

impl DigestGenerator {
    #[must_use]
    pub fn new(job_url_template: impl Into<String>) -> Self {
        Self {
            job_url_template: job_url_template.into(),
        }
    }

    /// Public URL of a listing.
    pub fn job_url(&self, id: &ListingId) -> String {
        self.job_url_template.replace("{id}", id.as_str())
    }

    /// Render a digest, or `None` when there is nothing to report.
    #[must_use]
    pub fn render(&self, listings: &[Listing], generated_at: DateTime<Utc>) -> Option<Digest> {
        if listings.is_empty() {
            return None;
        }

        Some(Digest {
            html: self.generate_html(listings, generated_at),
            text: self.generate_text(listings, generated_at),
            listing_count: listings.len(),
        })
    }

    /// Generate HTML email content.
    #[must_use]
    pub fn generate_html(&self, listings: &[Listing], generated_at: DateTime<Utc>) -> String {
        let date_str = generated_at.format("%B %d, %Y").to_string();

        let mut listings_html = String::new();
        for listing in listings {
            let _ = write!(
                listings_html,
                r#"
        <div class="listing">
            <h3><a href="{url}" target="_blank">{title}</a></h3>
            <p><strong>Company:</strong> {company}</p>
        </div>
"#,
                url = html_escape(&self.job_url(&listing.id)),
                title = html_escape(listing.title()),
                company = html_escape(listing.company_name()),
            );
        }

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, 'Helvetica Neue', sans-serif;
            line-height: 1.6;
            color: #1f2937;
            padding: 20px;
        }}
        .container {{
            max-width: 700px;
            margin: 0 auto;
        }}
        .listing {{
            margin-bottom: 20px;
            padding: 10px;
            border: 1px solid #ddd;
            border-radius: 5px;
        }}
        .listing h3 {{
            margin: 0 0 8px 0;
        }}
        .footer {{
            color: #6b7280;
            font-size: 12px;
        }}
    </style>
</head>
<body>
    <div class="container">
        <h1>New Job Listings</h1>
        <p>{count} new listing(s) matching your search as of {date}.</p>
        <hr>
{listings}
        <p class="footer">Sent by job-digest</p>
    </div>
</body>
</html>
"#,
            count = listings.len(),
            date = date_str,
            listings = listings_html,
        )
    }

    /// Generate the plain-text alternative.
    #[must_use]
    pub fn generate_text(&self, listings: &[Listing], generated_at: DateTime<Utc>) -> String {
        let mut text = format!(
            "NEW JOB LISTINGS - {date}\n{count} new listing(s) matching your search.\n\n",
            date = generated_at.format("%B %d, %Y"),
            count = listings.len(),
        );

        for listing in listings {
            let _ = write!(
                text,
                "{title}\nCompany: {company}\n{url}\n\n",
                title = listing.title(),
                company = listing.company_name(),
                url = self.job_url(&listing.id),
            );
        }

        text.push_str("---\nSent by job-digest\n");
        text
    }

    /// A fixed digest for verifying SMTP settings.
    #[must_use]
    pub fn test_digest() -> Digest {
        let html = r#"<!DOCTYPE html>
<html>
<body>
    <h1>job-digest</h1>
    <p>Email configuration is working!</p>
    <p>If you're seeing this, SMTP is configured correctly.</p>
</body>
</html>
"#;
        let text = "job-digest\n\nEmail configuration is working!\nIf you're seeing this, SMTP is configured correctly.\n";

        Digest {
            html: html.to_string(),
            text: text.to_string(),
            listing_count: 0,
        }
    }
}

/// Simple HTML escaping for API content.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
