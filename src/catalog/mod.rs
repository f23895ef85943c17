//! Client for a CKAN catalog, answering in data package vocabulary.
//!
//! Every call is a single JSON request/response against the CKAN action
//! API; the only work done locally is the field mapping in [`convert`].

pub mod convert;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::client::USER_AGENT;
use crate::resolver::parse_base;
use crate::{Error, Result};

pub use convert::{Collection, SearchQuery};

/// One page of search results, converted to data packages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub count: u64,
    pub results: Vec<Value>,
    /// Everything else CKAN returned (facets, sort, ...), untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The envelope every CKAN action wraps its answer in.
#[derive(Debug, Deserialize)]
struct CkanResponse<T> {
    #[serde(default)]
    success: bool,
    result: Option<T>,
    #[serde(default)]
    error: Option<Value>,
}

impl<T> CkanResponse<T> {
    fn into_result(self, action: &str) -> Result<T> {
        match (self.success, self.result) {
            (true, Some(result)) => Ok(result),
            (_, _) => Err(Error::Catalog(match self.error {
                Some(err) => format!("{} failed: {}", action, err),
                None => format!("{} returned no result", action),
            })),
        }
    }
}

/// Contents API entry for a file; only the download URL is used.
#[derive(Debug, Deserialize)]
struct ContentsEntry {
    download_url: Option<String>,
}

/// CKAN catalog client.
///
/// This type is cheaply cloneable - clones share one HTTP agent.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    /// Base of the action API, e.g. `https://demo.ckan.org/api/3/action/`.
    api_url: Url,
    agent: ureq::Agent,
}

impl CatalogClient {
    pub fn new(api_url: &str) -> Result<Self> {
        Ok(CatalogClient {
            inner: Arc::new(CatalogClientInner {
                api_url: parse_base(api_url)?,
                agent: ureq::Agent::new(),
            }),
        })
    }

    pub fn with_agent(self, agent: ureq::Agent) -> Self {
        CatalogClient {
            inner: Arc::new(CatalogClientInner {
                api_url: self.inner.api_url.clone(),
                agent,
            }),
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        self.with_agent(agent)
    }

    pub fn api_url(&self) -> &Url {
        &self.inner.api_url
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .inner
            .agent
            .get(url)
            .set("Accept", "application/json")
            .set("User-Agent", USER_AGENT)
            .call()?;
        let body = response.into_string().map_err(|e| Error::read_body(url, e))?;
        Ok(serde_json::from_str(&body)?)
    }

    fn get_action<T: DeserializeOwned>(&self, action: &str, query: &[(&str, &str)]) -> Result<T> {
        let mut url = self.inner.api_url.join(action)?;
        url.query_pairs_mut().extend_pairs(query);
        tracing::debug!(action, url = %url, "catalog GET");

        let response: CkanResponse<T> = self.get_json(url.as_str())?;
        response.into_result(action)
    }

    fn post_action<T: DeserializeOwned>(&self, action: &str, params: &impl Serialize) -> Result<T> {
        let url = self.inner.api_url.join(action)?;
        tracing::debug!(action, url = %url, "catalog POST");

        let response = self
            .inner
            .agent
            .post(url.as_str())
            .set("Accept", "application/json")
            .set("User-Agent", USER_AGENT)
            .send_json(params)?;
        let body = response
            .into_string()
            .map_err(|e| Error::read_body(url.as_str(), e))?;

        let response: CkanResponse<T> = serde_json::from_str(&body)?;
        response.into_result(action)
    }

    /// Search packages; each hit comes back as a data package descriptor.
    pub fn search(&self, query: &SearchQuery) -> Result<SearchResult> {
        let params = convert::to_ckan_search_params(query);
        let mut result: SearchResult = self.post_action("package_search", &params)?;
        result.results = result
            .results
            .iter()
            .map(convert::ckan_to_data_package)
            .collect();
        Ok(result)
    }

    /// Fetch the `datapackage.json` published in a repository.
    ///
    /// Two requests: the contents entry, then its `download_url`.
    pub fn get_package(&self, owner: &str, name: &str) -> Result<Value> {
        let path = format!("repos/{}/{}/contents/datapackage.json", owner, name);
        let url = self.inner.api_url.join(&path)?;

        let entry: ContentsEntry = self.get_json(url.as_str())?;
        let download_url = entry.download_url.ok_or_else(|| {
            Error::Catalog(format!("{}/{} has no datapackage.json download URL", owner, name))
        })?;

        self.get_json(&download_url)
    }

    /// Views of a resource, converted to data package views.
    ///
    /// A failure here is logged and treated as "no views".
    pub fn get_resource_views(&self, resource_id: &str) -> Vec<Value> {
        match self.get_action::<Vec<Value>>("resource_view_list", &[("id", resource_id)]) {
            Ok(views) => views
                .iter()
                .map(convert::ckan_view_to_data_package_view)
                .collect(),
            Err(err) => {
                tracing::warn!(resource_id, %err, "error fetching resource views");
                Vec::new()
            }
        }
    }

    /// All organizations, largest first.
    pub fn get_organizations(&self) -> Result<Vec<Collection>> {
        let params = json!({ "all_fields": true, "sort": "package_count" });
        let orgs: Vec<Value> = self.post_action("organization_list", &params)?;
        Ok(orgs.iter().map(convert::to_standard_collection).collect())
    }

    /// Raw organization record for `owner`; an empty object on failure.
    pub fn get_profile(&self, owner: &str) -> Value {
        match self.get_action::<Value>(
            "organization_show",
            &[("id", owner), ("include_users", "false")],
        ) {
            Ok(profile) => profile,
            Err(err) => {
                tracing::warn!(owner, %err, "failed to fetch profile");
                Value::Object(Map::new())
            }
        }
    }

    /// Groups, with `params` passed to `group_list` as-is when given.
    pub fn get_collections(&self, params: Option<Value>) -> Result<Vec<Collection>> {
        let params = params.unwrap_or_else(|| json!({ "all_fields": true }));
        let groups: Vec<Value> = self.post_action("group_list", &params)?;
        Ok(groups.iter().map(convert::to_standard_collection).collect())
    }

    /// A single group.
    pub fn get_collection(&self, collection: &str) -> Result<Collection> {
        let group: Value = self.post_action("group_show", &json!({ "id": collection }))?;
        Ok(convert::to_standard_collection(&group))
    }
}
