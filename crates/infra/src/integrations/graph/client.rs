//! `CalendarClient` over the Graph `/users/{id}/events` endpoints

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use plansync_core::CalendarClient;
use plansync_domain::{CalendarEvent, EventDraft, GraphConfig, PlanSyncError, Result};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

use super::token::GraphTokenProvider;
use super::types::{EventPayload, EventsPage, GraphEvent, EVENT_SELECT};
use crate::errors::provider_error;
use crate::http::{failure_body, HttpClient};

const OUTLOOK_TIMEZONE_HEADER: &str = r#"outlook.timezone="UTC""#;
const OUTLOOK_BODY_TYPE_HEADER: &str = r#"outlook.body-content-type="text""#;
const PAGE_SIZE: &str = "50";

/// Upper bound on followed `@odata.nextLink` pages per listing.
const MAX_PAGES: usize = 40;

/// Graph calendar client using application permissions.
///
/// The client never retries; the reconciliation engine owns retry policy.
pub struct GraphCalendarClient {
    http: HttpClient,
    tokens: Arc<GraphTokenProvider>,
    base_url: String,
}

impl GraphCalendarClient {
    pub fn new(http: HttpClient, tokens: Arc<GraphTokenProvider>, base_url: impl Into<String>) -> Self {
        Self { http, tokens, base_url: base_url.into().trim_end_matches('/').to_string() }
    }

    /// Build the client and its token provider from configuration.
    ///
    /// # Errors
    /// `PlanSyncError::Config` when credentials are incomplete.
    pub fn from_config(config: &GraphConfig) -> Result<Self> {
        let http = HttpClient::builder().max_attempts(1).build()?;
        let tokens = Arc::new(GraphTokenProvider::from_config(http.clone(), config)?);
        Ok(Self::new(http, tokens, config.base_url.clone()))
    }

    fn events_url(&self, mailbox: &str) -> String {
        format!("{}/users/{}/events", self.base_url, urlencoding::encode(mailbox))
    }

    fn event_url(&self, mailbox: &str, event_id: &str) -> String {
        format!("{}/{}", self.events_url(mailbox), urlencoding::encode(event_id))
    }

    /// Authorise and send a request, mapping every failure to `Provider`.
    async fn call(&self, builder: RequestBuilder) -> Result<Response> {
        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .send(
                builder
                    .bearer_auth(token)
                    .header("Prefer", OUTLOOK_TIMEZONE_HEADER)
                    .header("Prefer", OUTLOOK_BODY_TYPE_HEADER),
            )
            .await
            .map_err(|e| provider_error(&e))?;

        if response.status().is_success() {
            return Ok(response);
        }
        if response.status() == StatusCode::UNAUTHORIZED {
            self.tokens.invalidate().await;
        }
        let (status, body) = failure_body(response).await;
        Err(PlanSyncError::provider(status, body))
    }

    /// Run a filtered listing and follow `@odata.nextLink` to the end.
    async fn list(&self, mailbox: &str, filter: &str) -> Result<Vec<CalendarEvent>> {
        let first = self.http.request(Method::GET, self.events_url(mailbox)).query(&[
            ("$filter", filter),
            ("$select", EVENT_SELECT),
            ("$top", PAGE_SIZE),
        ]);

        let mut events = Vec::new();
        let mut next = Some(first);
        let mut pages = 0;
        while let Some(request) = next.take() {
            pages += 1;
            let page: EventsPage =
                self.call(request).await?.json().await.map_err(|e| provider_error(&e))?;

            for raw in page.value {
                let event_id = raw.id.clone();
                match raw.into_event() {
                    Ok(event) => events.push(event),
                    Err(err) => warn!(
                        mailbox,
                        event_id = %event_id,
                        error = %err,
                        "Skipping event with unreadable times"
                    ),
                }
            }

            match page.next_link {
                Some(link) if pages < MAX_PAGES => {
                    next = Some(self.http.request(Method::GET, link));
                }
                Some(_) => {
                    warn!(mailbox, pages, "Stopped following event pages");
                }
                None => {}
            }
        }

        debug!(mailbox, count = events.len(), pages, "Listed events");
        Ok(events)
    }
}

#[async_trait]
impl CalendarClient for GraphCalendarClient {
    async fn find_by_subject(&self, mailbox: &str, subject: &str) -> Result<Vec<CalendarEvent>> {
        let filter = format!("subject eq '{}'", odata_quote(subject));
        let events = self.list(mailbox, &filter).await?;
        // Graph compares case-insensitively; callers expect exact matches.
        Ok(events.into_iter().filter(|event| event.subject == subject).collect())
    }

    async fn find_by_tag_prefix(
        &self,
        mailbox: &str,
        prefix: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        let filter = format!(
            "startswith(subject,'{}') and start/dateTime ge '{}'",
            odata_quote(prefix),
            since.format("%Y-%m-%dT%H:%M:%S")
        );
        let events = self.list(mailbox, &filter).await?;
        Ok(events
            .into_iter()
            .filter(|event| event.subject.starts_with(prefix) && event.start >= since)
            .collect())
    }

    async fn create(&self, mailbox: &str, draft: &EventDraft) -> Result<CalendarEvent> {
        let request = self
            .http
            .request(Method::POST, self.events_url(mailbox))
            .json(&EventPayload::from_draft(draft));
        let created: GraphEvent =
            self.call(request).await?.json().await.map_err(|e| provider_error(&e))?;
        created.into_event()
    }

    async fn update(&self, mailbox: &str, event_id: &str, draft: &EventDraft) -> Result<()> {
        let request = self
            .http
            .request(Method::PATCH, self.event_url(mailbox, event_id))
            .json(&EventPayload::from_draft(draft));
        self.call(request).await.map(drop)
    }

    async fn delete(&self, mailbox: &str, event_id: &str) -> Result<()> {
        let request = self.http.request(Method::DELETE, self.event_url(mailbox, event_id));
        match self.call(request).await {
            Ok(_) => Ok(()),
            Err(PlanSyncError::Provider { status: Some(404), .. }) => {
                debug!(mailbox, event_id, "Event already gone");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

/// Escape a literal for use inside single quotes in an OData filter.
fn odata_quote(value: &str) -> String {
    value.replace('\'', "''")
}
