//! Persistence contract for applications.
//!
//! Two backends realize it: a relational store (`postgres`, offset
//! pagination, uniqueness via index) and a document store (`memory`,
//! cursor pagination). `AppState` holds an `Arc<dyn ApplicationStore>`,
//! selected at startup via config.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::dto::application_dto::ApplicationDraft;
use crate::error::Result;
use crate::models::application::{
    Application, ApplicationFiles, ApplicationStatus, ApplicationSummary,
};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
    pub position: Option<String>,
}

/// Pagination input. Backends honor the style native to them: the
/// relational store reads `page`, the document store reads `cursor`.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub page: i64,
    pub cursor: Option<String>,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, cursor: Option<String>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            cursor,
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }
}

/// Pagination output, in whichever shape the backend natively supports.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PageInfo {
    #[serde(rename_all = "camelCase")]
    Offset {
        page: i64,
        per_page: i64,
        total: i64,
        total_pages: i64,
    },
    #[serde(rename_all = "camelCase")]
    Cursor {
        next_cursor: Option<String>,
        has_more: bool,
    },
}

#[derive(Debug)]
pub struct ApplicationPage {
    pub items: Vec<ApplicationSummary>,
    pub page_info: PageInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: ApplicationStatus,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PositionCount {
    pub position: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyCount {
    pub month: String,
    pub count: i64,
}

#[derive(Debug)]
pub struct ApplicationStats {
    pub total: i64,
    pub by_status: Vec<StatusCount>,
    pub by_position: Vec<PositionCount>,
    pub monthly: Vec<MonthlyCount>,
    pub recent: Vec<ApplicationSummary>,
}

/// The application repository. Implementations differ in how they realize
/// uniqueness, pagination, and aggregation, never in the contract surface.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Persists a validated draft plus its nested collections and file map
    /// as one logical unit. Stamps `status = pending` and both timestamps.
    /// Fails with `DuplicateEmail` if the email is already registered.
    async fn create(&self, draft: ApplicationDraft, files: ApplicationFiles) -> Result<Uuid>;

    /// Full record including nested collections, ordered for display.
    async fn get(&self, id: Uuid) -> Result<Application>;

    /// Flat re-label: any status is reachable from any other. Refreshes
    /// `updated_at`.
    async fn update_status(&self, id: Uuid, status: ApplicationStatus) -> Result<()>;

    /// Hard delete of the record and everything it owns. A second delete
    /// of the same id is `NotFound`.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Filtered listing, newest-created first.
    async fn list(&self, filter: ApplicationFilter, page: PageRequest) -> Result<ApplicationPage>;

    /// Collection-wide aggregates; `recent` is capped at 5, newest first.
    async fn stats(&self) -> Result<ApplicationStats>;
}
