//! Listings API client.

use crate::config::{ApiSettings, SearchParameters, SearchValue};
use crate::error::FetchError;

use super::types::{Listing, ListingsResponse};

/// Fetches the latest listings matching the configured filters.
pub struct JobFetcher {
    client: reqwest::Client,
    api: ApiSettings,
}

impl JobFetcher {
    /// Create a new fetcher for the given endpoint settings.
    #[must_use]
    pub fn new(api: ApiSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            api,
        }
    }

    /// Map search parameters onto the API's query string.
    ///
    /// Filters that are absent, empty or `"all"` are left out so the API
    /// applies no constraint for them. Country, sort and page size are
    /// always sent.
    pub fn build_query(&self, params: &SearchParameters) -> Vec<(&'static str, String)> {
        let filters: [(&'static str, Option<&SearchValue>); 3] = [
            ("locations", params.locations.as_ref()),
            ("years", params.years.as_ref()),
            ("job_group_id", params.job_group_id.as_ref()),
        ];

        let mut query: Vec<(&'static str, String)> = filters
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .flat_map(|(name, value)| {
                value
                    .query_values()
                    .into_iter()
                    .map(move |v| (name, v))
            })
            .collect();

        let fixed = [
            ("country", self.api.country.clone()),
            ("job_sort", self.api.sort.clone()),
            ("limit", self.api.limit.to_string()),
        ];
        query.extend(fixed.into_iter().filter(|(_, v)| !v.is_empty()));
        query
    }

    /// Issue the listings request, surfacing any failure.
    pub async fn try_fetch(&self, params: &SearchParameters) -> Result<Vec<Listing>, FetchError> {
        let query = self.build_query(params);
        tracing::debug!(url = %self.api.base_url, ?query, "Requesting listings");

        let response = self
            .client
            .get(&self.api.base_url)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status { status, body });
        }

        let payload: ListingsResponse = response.json().await?;
        Ok(payload.into_listings())
    }

    /// Fetch listings, degrading to an empty list on any failure.
    ///
    /// Callers cannot tell "no listings" apart from "request failed"; the
    /// failure is only visible in the logs.
    pub async fn fetch(&self, params: &SearchParameters) -> Vec<Listing> {
        match self.try_fetch(params).await {
            Ok(listings) => {
                tracing::info!(fetched = listings.len(), "Fetched listings");
                listings
            }
            Err(e) => {
                tracing::error!(error = %e, "Listings API request failed");
                Vec::new()
            }
        }
    }
}
