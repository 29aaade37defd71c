//! Digest pipeline - orchestrates the load-fetch-diff-notify flow.

use chrono::Utc;
use std::sync::Arc;

use crate::config::DigestConfig;
use crate::digest::{Digest, DigestGenerator, Mailer};
use crate::error::StoreError;
use crate::storage::{SentSet, SentSetStore};
use crate::wanted::{JobFetcher, Listing};

/// How a single run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The API returned nothing (or the request failed).
    NoListings,
    /// Every fetched listing was already notified.
    NothingNew { fetched: usize },
    /// The digest was accepted by the mail server.
    Delivered {
        fetched: usize,
        new: usize,
        /// Whether the updated sent-set reached disk.
        persisted: bool,
    },
    /// Sending failed; the sent-set was left untouched.
    DeliveryFailed { fetched: usize, new: usize },
}

/// Listings that would go into the next digest.
#[derive(Debug, Clone)]
pub struct Preview {
    pub fetched: usize,
    pub new_listings: Vec<Listing>,
    pub digest: Option<Digest>,
}

/// Digest pipeline orchestrator.
pub struct Pipeline {
    config: DigestConfig,
    store: SentSetStore,
    fetcher: JobFetcher,
    generator: DigestGenerator,
    mailer: Arc<dyn Mailer>,
}

impl Pipeline {
    /// Create a new pipeline.
    #[must_use]
    pub fn new(config: DigestConfig, store: SentSetStore, mailer: Arc<dyn Mailer>) -> Self {
        let fetcher = JobFetcher::new(config.api.clone());
        let generator = DigestGenerator::new(config.api.job_url_template.clone());
        Self {
            config,
            store,
            fetcher,
            generator,
            mailer,
        }
    }

    /// Run a single cycle.
    ///
    /// Only an unreadable sent-set file is returned as an error; fetch and
    /// delivery failures are logged and reported through [`RunOutcome`].
    /// The sent-set is written only after the mailer confirms delivery.
    pub async fn run_once(&self) -> Result<RunOutcome, StoreError> {
        tracing::info!("Starting digest run");

        let mut sent = self.store.load()?;
        tracing::debug!(sent = sent.len(), "Loaded sent-set");

        let listings = self.fetcher.fetch(&self.config.search).await;
        if listings.is_empty() {
            tracing::info!("No listings returned from the API");
            return Ok(RunOutcome::NoListings);
        }
        let fetched = listings.len();

        let new_listings = sent.new_listings(&listings);
        if new_listings.is_empty() {
            tracing::info!(fetched, "No new listings");
            return Ok(RunOutcome::NothingNew { fetched });
        }
        let new = new_listings.len();
        tracing::info!(fetched, new, "Found new listings");

        let Some(digest) = self.generator.render(&new_listings, Utc::now()) else {
            return Ok(RunOutcome::NothingNew { fetched });
        };

        if let Err(e) = self.mailer.send(&self.config.subject, &digest).await {
            tracing::error!(
                mailer = self.mailer.name(),
                error = %e,
                new,
                "Failed to send digest; listings will be retried next run"
            );
            return Ok(RunOutcome::DeliveryFailed { fetched, new });
        }

        sent.mark_sent(&new_listings);
        let persisted = self.persist(&sent);

        tracing::info!(fetched, new, persisted, "Digest run complete");
        Ok(RunOutcome::Delivered {
            fetched,
            new,
            persisted,
        })
    }

    /// Fetch and diff without sending or persisting anything.
    pub async fn preview(&self) -> Result<Preview, StoreError> {
        let sent = self.store.load()?;
        let listings = self.fetcher.fetch(&self.config.search).await;
        let new_listings = sent.new_listings(&listings);
        let digest = self.generator.render(&new_listings, Utc::now());

        Ok(Preview {
            fetched: listings.len(),
            new_listings,
            digest,
        })
    }

    fn persist(&self, sent: &SentSet) -> bool {
        match self.store.save(sent) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Failed to persist sent-set; delivered listings may be sent again"
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiSettings, SearchParameters, SearchValue, SmtpSettings, DEFAULT_SUBJECT};
    use crate::digest::SmtpMailer;
    use crate::error::MailError;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Captures digests instead of sending them.
    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<Digest>>,
        fail: bool,
    }

    impl RecordingMailer {
        fn failing() -> Self {
            Self {
                sent: Mutex::default(),
                fail: true,
            }
        }

        fn sent(&self) -> Vec<Digest> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn send(&self, _subject: &str, digest: &Digest) -> Result<(), MailError> {
            if self.fail {
                return Err(MailError::MissingCredential {
                    var: "RECORDING_MAILER_PASSWORD".to_string(),
                });
            }
            self.sent.lock().unwrap().push(digest.clone());
            Ok(())
        }
    }

    fn test_config(base_url: String, password_env_var: &str) -> DigestConfig {
        DigestConfig {
            recipient: "me@example.com".to_string(),
            smtp: SmtpSettings {
                host: "127.0.0.1".to_string(),
                port: 1,
                sender: "bot@example.com".to_string(),
                username: "bot@example.com".to_string(),
                password_env_var: password_env_var.to_string(),
            },
            search: SearchParameters {
                locations: Some(SearchValue::Text("all".to_string())),
                years: Some(SearchValue::Number(-1)),
                job_group_id: Some(SearchValue::Number(518)),
            },
            api: ApiSettings {
                base_url,
                ..ApiSettings::default()
            },
            subject: DEFAULT_SUBJECT.to_string(),
        }
    }

    async fn api_returning(data: Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v4/jobs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": data })))
            .mount(&server)
            .await;
        server
    }

    struct Harness {
        _dir: TempDir,
        store: SentSetStore,
        mailer: Arc<RecordingMailer>,
        pipeline: Pipeline,
    }

    fn harness(server: &MockServer, mailer: RecordingMailer, seed: &[&str]) -> Harness {
        let dir = TempDir::new().unwrap();
        let store = SentSetStore::new(dir.path().join("sent_jobs.txt"));
        if !seed.is_empty() {
            store.save(&seed.iter().copied().collect()).unwrap();
        }
        let mailer = Arc::new(mailer);
        let pipeline = Pipeline::new(
            test_config(format!("{}/api/v4/jobs", server.uri()), "UNUSED"),
            store.clone(),
            mailer.clone(),
        );
        Harness {
            _dir: dir,
            store,
            mailer,
            pipeline,
        }
    }

    fn two_listings() -> Value {
        json!([
            {"id": 1, "position": "Rust Engineer", "company": {"name": "Acme"}},
            {"id": 2, "position": "SRE", "company": {"name": "Initech"}}
        ])
    }

    fn set(ids: &[&str]) -> SentSet {
        ids.iter().copied().collect()
    }

    #[tokio::test]
    async fn test_all_new_listings_sent_and_persisted() {
        let server = api_returning(two_listings()).await;
        let h = harness(&server, RecordingMailer::default(), &[]);

        let outcome = h.pipeline.run_once().await.unwrap();

        assert_eq!(
            outcome,
            RunOutcome::Delivered {
                fetched: 2,
                new: 2,
                persisted: true
            }
        );
        let sent = h.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].listing_count, 2);
        assert_eq!(h.store.load().unwrap(), set(&["1", "2"]));
    }

    #[tokio::test]
    async fn test_only_unsent_listing_included() {
        let server = api_returning(two_listings()).await;
        let h = harness(&server, RecordingMailer::default(), &["1"]);

        let outcome = h.pipeline.run_once().await.unwrap();

        assert_eq!(
            outcome,
            RunOutcome::Delivered {
                fetched: 2,
                new: 1,
                persisted: true
            }
        );
        let sent = h.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].listing_count, 1);
        assert!(sent[0].html.contains("https://www.wanted.co.kr/wd/2"));
        assert!(!sent[0].html.contains("https://www.wanted.co.kr/wd/1\""));
        assert_eq!(h.store.load().unwrap(), set(&["1", "2"]));
    }

    #[tokio::test]
    async fn test_fetch_failure_sends_nothing_and_keeps_file() {
        let server = MockServer::start().await;
        let mut h = harness(&server, RecordingMailer::default(), &["5"]);
        h.pipeline = Pipeline::new(
            test_config("http://127.0.0.1:1/api/v4/jobs".to_string(), "UNUSED"),
            h.store.clone(),
            h.mailer.clone(),
        );
        let before = std::fs::read_to_string(h.store.path()).unwrap();

        let outcome = h.pipeline.run_once().await.unwrap();

        assert_eq!(outcome, RunOutcome::NoListings);
        assert!(h.mailer.sent().is_empty());
        assert_eq!(std::fs::read_to_string(h.store.path()).unwrap(), before);
    }

    #[tokio::test]
    async fn test_missing_password_does_not_persist() {
        let server = api_returning(json!([{"id": 77, "position": "Data Engineer"}])).await;
        let dir = TempDir::new().unwrap();
        let store = SentSetStore::new(dir.path().join("sent_jobs.txt"));
        let config = test_config(
            format!("{}/api/v4/jobs", server.uri()),
            "JOB_DIGEST_TEST_UNSET_PASSWORD_B71E",
        );
        let mailer = Arc::new(SmtpMailer::new(&config));
        let pipeline = Pipeline::new(config, store.clone(), mailer);

        let outcome = pipeline.run_once().await.unwrap();

        assert_eq!(outcome, RunOutcome::DeliveryFailed { fetched: 1, new: 1 });
        assert!(!store.path().exists());
        assert!(store.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_smtp_failure_does_not_persist() {
        let server = api_returning(two_listings()).await;
        let h = harness(&server, RecordingMailer::failing(), &["1"]);

        let outcome = h.pipeline.run_once().await.unwrap();

        assert_eq!(outcome, RunOutcome::DeliveryFailed { fetched: 2, new: 1 });
        assert_eq!(h.store.load().unwrap(), set(&["1"]));
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let server = api_returning(two_listings()).await;
        let h = harness(&server, RecordingMailer::default(), &[]);

        h.pipeline.run_once().await.unwrap();
        let after_first = std::fs::read_to_string(h.store.path()).unwrap();
        let outcome = h.pipeline.run_once().await.unwrap();

        assert_eq!(outcome, RunOutcome::NothingNew { fetched: 2 });
        assert_eq!(h.mailer.sent().len(), 1);
        assert_eq!(std::fs::read_to_string(h.store.path()).unwrap(), after_first);
    }

    #[tokio::test]
    async fn test_empty_response_is_no_listings() {
        let server = api_returning(json!([])).await;
        let h = harness(&server, RecordingMailer::default(), &[]);

        let outcome = h.pipeline.run_once().await.unwrap();

        assert_eq!(outcome, RunOutcome::NoListings);
        assert!(!h.store.path().exists());
    }

    #[tokio::test]
    async fn test_duplicate_ids_in_response_rendered_once() {
        let server = api_returning(json!([
            {"id": 3, "position": "QA"},
            {"id": "3", "position": "QA"}
        ]))
        .await;
        let h = harness(&server, RecordingMailer::default(), &[]);

        let outcome = h.pipeline.run_once().await.unwrap();

        assert_eq!(
            outcome,
            RunOutcome::Delivered {
                fetched: 2,
                new: 1,
                persisted: true
            }
        );
        assert_eq!(h.mailer.sent()[0].listing_count, 1);
    }

    #[tokio::test]
    async fn test_malformed_listing_does_not_block_valid_ones() {
        let server = api_returning(json!([
            {"id": 10, "position": "Platform Engineer"},
            {"id": null, "position": "Broken"}
        ]))
        .await;
        let h = harness(&server, RecordingMailer::default(), &[]);

        let outcome = h.pipeline.run_once().await.unwrap();

        assert_eq!(
            outcome,
            RunOutcome::Delivered {
                fetched: 1,
                new: 1,
                persisted: true
            }
        );
        assert!(h.mailer.sent()[0].html.contains("Platform Engineer"));
        assert_eq!(h.store.load().unwrap(), set(&["10"]));
    }

    #[tokio::test]
    async fn test_preview_does_not_send_or_persist() {
        let server = api_returning(two_listings()).await;
        let h = harness(&server, RecordingMailer::default(), &["2"]);

        let preview = h.pipeline.preview().await.unwrap();

        assert_eq!(preview.fetched, 2);
        assert_eq!(preview.new_listings.len(), 1);
        assert_eq!(preview.new_listings[0].id.as_str(), "1");
        assert!(preview.digest.is_some());
        assert!(h.mailer.sent().is_empty());
        assert_eq!(h.store.load().unwrap(), set(&["2"]));
    }

    #[tokio::test]
    async fn test_unreadable_sent_set_is_error() {
        let server = api_returning(two_listings()).await;
        let dir = TempDir::new().unwrap();
        // A directory where the file should be cannot be read as text.
        let store = SentSetStore::new(dir.path().to_path_buf());
        let pipeline = Pipeline::new(
            test_config(format!("{}/api/v4/jobs", server.uri()), "UNUSED"),
            store,
            Arc::new(RecordingMailer::default()),
        );

        let result = pipeline.run_once().await;

        assert!(matches!(result, Err(StoreError::Read { .. })));
    }
}
