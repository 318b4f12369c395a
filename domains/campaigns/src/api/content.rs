//! Content pipeline around the project detail page
//!
//! `PrepareContent` handlers run in order before the page is rendered and
//! may answer the request themselves. `FinalizeContent` handlers run in
//! order over the rendered response and may amend or replace it.

use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use chrono::NaiveDate;
use crowdfund_common::Error;

use crate::domain::entities::Project;

/// What a content handler gets to look at
#[derive(Debug, Clone, Copy)]
pub struct ContentRequest<'a> {
    pub project: &'a Project,
    pub today: NaiveDate,
}

/// Result of one prepare handler
pub enum Prepared {
    /// Nothing to say about this request
    Pass,
    /// The handler vouches for the content; cancels any not-found signal
    Succeeded,
    /// The handler could not do its work; logged, the pipeline continues.
    /// Clears the success of earlier handlers: the last verdict wins.
    Failed(String),
    /// Answer the request with this response and skip rendering
    Respond(Response),
    /// The content should not be visible
    NotFound,
}

#[async_trait]
pub trait PrepareContent: Send + Sync {
    fn name(&self) -> &'static str;

    async fn prepare(&self, request: &ContentRequest<'_>) -> Prepared;
}

/// Result of one finalize handler
pub enum Finalized {
    /// Hand the (possibly modified) response to the next handler
    Continue(Response),
    /// Send this response and skip the remaining handlers
    Replace(Response),
}

pub trait FinalizeContent: Send + Sync {
    fn name(&self) -> &'static str;

    fn finalize(&self, request: &ContentRequest<'_>, response: Response) -> Finalized;
}

/// Ordered prepare and finalize handler lists
#[derive(Clone, Default)]
pub struct ContentPipeline {
    prepare: Vec<Arc<dyn PrepareContent>>,
    finalize: Vec<Arc<dyn FinalizeContent>>,
}

impl ContentPipeline {
    /// An empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule gate and cache headers
    pub fn standard() -> Self {
        Self::new()
            .with_prepare(ScheduledProjectGate)
            .with_finalize(ProjectCacheControl::default())
    }

    pub fn with_prepare(mut self, handler: impl PrepareContent + 'static) -> Self {
        self.prepare.push(Arc::new(handler));
        self
    }

    pub fn with_finalize(mut self, handler: impl FinalizeContent + 'static) -> Self {
        self.finalize.push(Arc::new(handler));
        self
    }

    /// Run the prepare handlers. `Some` means the request is already answered.
    pub async fn prepare(&self, request: &ContentRequest<'_>) -> Option<Response> {
        let mut succeeded = false;
        let mut not_found = false;

        for handler in &self.prepare {
            match handler.prepare(request).await {
                Prepared::Pass => {}
                Prepared::Succeeded => succeeded = true,
                Prepared::Failed(reason) => {
                    succeeded = false;
                    tracing::warn!(handler = handler.name(), reason = %reason, "Content handler failed");
                }
                Prepared::Respond(response) => return Some(response),
                Prepared::NotFound => not_found = true,
            }
        }

        if not_found && !succeeded {
            tracing::debug!(slug = %request.project.slug, "Content hidden by prepare handlers");
            return Some(Error::NotFound("Project not found".to_string()).into_response());
        }

        None
    }

    /// Run the finalize handlers over the rendered response
    pub fn finalize(&self, request: &ContentRequest<'_>, mut response: Response) -> Response {
        for handler in &self.finalize {
            match handler.finalize(request, response) {
                Finalized::Continue(next) => response = next,
                Finalized::Replace(replacement) => return replacement,
            }
        }
        response
    }
}

/// Hides projects whose start date is still in the future
pub struct ScheduledProjectGate;

#[async_trait]
impl PrepareContent for ScheduledProjectGate {
    fn name(&self) -> &'static str {
        "scheduled_project_gate"
    }

    async fn prepare(&self, request: &ContentRequest<'_>) -> Prepared {
        if request.project.has_started(request.today) {
            Prepared::Pass
        } else {
            Prepared::NotFound
        }
    }
}

/// Cache headers by project state: finished projects no longer change
pub struct ProjectCacheControl {
    pub expired_max_age: u32,
}

impl Default for ProjectCacheControl {
    fn default() -> Self {
        Self {
            expired_max_age: 3600,
        }
    }
}

impl FinalizeContent for ProjectCacheControl {
    fn name(&self) -> &'static str {
        "project_cache_control"
    }

    fn finalize(&self, request: &ContentRequest<'_>, mut response: Response) -> Finalized {
        let value = if request.project.is_expired(request.today) {
            format!("public, max-age={}", self.expired_max_age)
        } else {
            "no-cache".to_string()
        };

        if let Ok(value) = HeaderValue::from_str(&value) {
            response.headers_mut().insert(header::CACHE_CONTROL, value);
        }
        Finalized::Continue(response)
    }
}
