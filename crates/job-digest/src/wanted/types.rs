//! Listings API data types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Shown in a digest when the API omits a title or company name.
pub const PLACEHOLDER: &str = "Not specified";

/// Listing identifier.
///
/// The API may send ids as strings or integers; both are kept as their
/// string form so comparisons against the sent-set are uniform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawListingId", into = "String")]
pub struct ListingId(String);

impl ListingId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ListingId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ListingId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<ListingId> for String {
    fn from(id: ListingId) -> Self {
        id.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawListingId {
    Text(String),
    Number(serde_json::Number),
}

impl From<RawListingId> for ListingId {
    fn from(raw: RawListingId) -> Self {
        match raw {
            RawListingId::Text(s) => Self(s),
            RawListingId::Number(n) => Self(n.to_string()),
        }
    }
}

/// Hiring company attached to a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    #[serde(default)]
    pub name: Option<String>,
}

/// One job posting returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    /// Unique listing ID.
    pub id: ListingId,
    /// Position title.
    #[serde(default)]
    pub position: Option<String>,
    /// Hiring company, if the API includes it.
    #[serde(default)]
    pub company: Option<Company>,
}

impl Listing {
    /// Position title, or the placeholder when absent.
    pub fn title(&self) -> &str {
        self.position.as_deref().unwrap_or(PLACEHOLDER)
    }

    /// Company name, or the placeholder when absent.
    pub fn company_name(&self) -> &str {
        self.company
            .as_ref()
            .and_then(|c| c.name.as_deref())
            .unwrap_or(PLACEHOLDER)
    }
}

/// Envelope of the listings endpoint.
///
/// Entries stay as raw JSON so one malformed listing cannot sink the rest.
#[derive(Debug, Deserialize)]
pub(crate) struct ListingsResponse {
    #[serde(default)]
    pub data: Vec<serde_json::Value>,
}

impl ListingsResponse {
    /// Decode each entry, skipping the ones without a usable id.
    pub fn into_listings(self) -> Vec<Listing> {
        self.data
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value::<Listing>(entry) {
                Ok(listing) => Some(listing),
                Err(e) => {
                    tracing::warn!(index, error = %e, "Skipping malformed listing");
                    None
                }
            })
            .collect()
    }
}
