// Passage service abstraction
//
// The workflow controller talks to the remote passage/translation service only
// through these traits:
// - PassageService: fetch passages, submit translation videos
// - SiteRegistry: register a new source site (admin flow)
// - wire: JSON shapes exchanged with the service
// - http: reqwest-backed implementation

pub mod http;
pub mod wire;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use http::HttpPassageService;

use crate::config::ServiceConfig;
use crate::error::Result;
use crate::passage::{PassageId, SearchCriteria, SearchScope, SiteId};

/// Parameters of one FetchPassages call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRequest {
    pub site_id: Option<SiteId>,
    pub all_from_site: bool,
}

impl From<&SearchCriteria> for FetchRequest {
    fn from(criteria: &SearchCriteria) -> Self {
        Self {
            site_id: criteria.site_id,
            all_from_site: criteria.scope == SearchScope::All,
        }
    }
}

/// A passage as delivered by the service, before it joins a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPassage {
    pub content: String,
    pub snapshot_name: Option<String>,
    pub passage_id: PassageId,
    pub site_url: String,
    pub site_id: SiteId,
}

/// Parameters of one SubmitVideo call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSubmission {
    pub interpreter_id: String,
    pub video_url: String,
    pub passage_id: PassageId,
}

/// Outcome of a site registration. Fields are absent when the service
/// accepted the site without echoing them back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredSite {
    pub site_url: Option<String>,
    pub site_id: Option<SiteId>,
}

/// Remote operations consumed by the interpreter workflow
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PassageService: Send + Sync {
    /// Fetch a batch of passages awaiting translation
    async fn fetch_passages(&self, request: &FetchRequest) -> Result<Vec<FetchedPassage>>;

    /// Record the video of a finished translation
    async fn submit_video(&self, submission: &VideoSubmission) -> Result<()>;

    /// Check that the service is reachable
    async fn check_availability(&self) -> Result<()>;
}

/// Site registration used by the admin flow
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SiteRegistry: Send + Sync {
    async fn register_site(&self, site_url: &str) -> Result<RegisteredSite>;
}

/// Factory for creating passage service instances
pub struct PassageServiceFactory;

impl PassageServiceFactory {
    /// Create the default HTTP-backed service
    pub fn create_service(config: ServiceConfig) -> Result<Box<dyn PassageService>> {
        Ok(Box::new(HttpPassageService::new(config)?))
    }

    pub fn create_registry(config: ServiceConfig) -> Result<Box<dyn SiteRegistry>> {
        Ok(Box::new(HttpPassageService::new(config)?))
    }
}
