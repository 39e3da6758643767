use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use plansync_core::CalendarClient;
use plansync_domain::{CalendarEvent, EventDraft, PlanSyncError, Result as DomainResult, ShowAs};

/// Provider operation recorded by [`FakeCalendar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    FindBySubject,
    FindByPrefix,
    Create,
    Update,
    Delete,
}

impl CallKind {
    pub fn is_mutation(self) -> bool {
        matches!(self, Self::Create | Self::Update | Self::Delete)
    }
}

#[derive(Debug, Clone)]
pub struct Call {
    pub kind: CallKind,
    pub mailbox: String,
    pub target: String,
}

#[derive(Default)]
struct State {
    events: BTreeMap<String, Vec<CalendarEvent>>,
    calls: Vec<Call>,
    failures: VecDeque<(CallKind, Option<String>, PlanSyncError)>,
    delay: Option<Duration>,
}

/// In-memory calendar keyed by mailbox.
///
/// Subject queries are exact and case-sensitive. Failures can be scripted per
/// operation (and optionally per mailbox); each scripted failure fires once.
#[derive(Clone, Default)]
pub struct FakeCalendar {
    state: Arc<Mutex<State>>,
    next_id: Arc<AtomicU64>,
}

impl FakeCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an event directly, bypassing call recording.
    pub fn seed(&self, mailbox: &str, draft: &EventDraft) -> String {
        let event = self.materialize(draft);
        let id = event.id.clone();
        self.state.lock().events.entry(mailbox.to_string()).or_default().push(event);
        id
    }

    pub fn seed_event(&self, mailbox: &str, event: CalendarEvent) {
        self.state.lock().events.entry(mailbox.to_string()).or_default().push(event);
    }

    pub fn events(&self, mailbox: &str) -> Vec<CalendarEvent> {
        self.state.lock().events.get(mailbox).cloned().unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, kind: CallKind) -> usize {
        self.calls().iter().filter(|call| call.kind == kind).count()
    }

    pub fn mutations(&self) -> usize {
        self.calls().iter().filter(|call| call.kind.is_mutation()).count()
    }

    pub fn reset_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Fail the next `kind` call (for `mailbox`, or any mailbox) with `error`.
    pub fn fail_next(&self, kind: CallKind, mailbox: Option<&str>, error: PlanSyncError) {
        self.state.lock().failures.push_back((
            kind,
            mailbox.map(str::to_string),
            error,
        ));
    }

    /// Delay every call, e.g. to provoke timeouts under paused time.
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().delay = Some(delay);
    }

    fn materialize(&self, draft: &EventDraft) -> CalendarEvent {
        let id = format!("evt-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        CalendarEvent {
            id,
            subject: draft.subject.clone(),
            start: draft.start,
            end: draft.end,
            body: draft.body.clone(),
            location: draft.location.clone(),
            show_as: draft.show_as,
        }
    }

    async fn enter(&self, kind: CallKind, mailbox: &str, target: &str) -> DomainResult<()> {
        let delay = {
            let mut state = self.state.lock();
            state.calls.push(Call {
                kind,
                mailbox: mailbox.to_string(),
                target: target.to_string(),
            });
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        let position = state.failures.iter().position(|(k, m, _)| {
            *k == kind && m.as_deref().map_or(true, |m| m == mailbox)
        });
        match position.and_then(|index| state.failures.remove(index)) {
            Some((_, _, error)) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CalendarClient for FakeCalendar {
    async fn find_by_subject(
        &self,
        mailbox: &str,
        subject: &str,
    ) -> DomainResult<Vec<CalendarEvent>> {
        self.enter(CallKind::FindBySubject, mailbox, subject).await?;
        Ok(self.events(mailbox).into_iter().filter(|event| event.subject == subject).collect())
    }

    async fn find_by_tag_prefix(
        &self,
        mailbox: &str,
        prefix: &str,
        since: DateTime<Utc>,
    ) -> DomainResult<Vec<CalendarEvent>> {
        self.enter(CallKind::FindByPrefix, mailbox, prefix).await?;
        Ok(self
            .events(mailbox)
            .into_iter()
            .filter(|event| event.subject.starts_with(prefix) && event.start >= since)
            .collect())
    }

    async fn create(&self, mailbox: &str, draft: &EventDraft) -> DomainResult<CalendarEvent> {
        self.enter(CallKind::Create, mailbox, &draft.subject).await?;
        let event = self.materialize(draft);
        self.seed_event(mailbox, event.clone());
        Ok(event)
    }

    async fn update(&self, mailbox: &str, event_id: &str, draft: &EventDraft) -> DomainResult<()> {
        self.enter(CallKind::Update, mailbox, event_id).await?;
        let mut state = self.state.lock();
        let event = state
            .events
            .get_mut(mailbox)
            .and_then(|events| events.iter_mut().find(|event| event.id == event_id))
            .ok_or_else(|| PlanSyncError::provider(404, "ErrorItemNotFound"))?;
        event.subject = draft.subject.clone();
        event.start = draft.start;
        event.end = draft.end;
        event.body = draft.body.clone();
        event.location = draft.location.clone();
        event.show_as = draft.show_as;
        Ok(())
    }

    async fn delete(&self, mailbox: &str, event_id: &str) -> DomainResult<()> {
        self.enter(CallKind::Delete, mailbox, event_id).await?;
        let mut state = self.state.lock();
        let events = state.events.entry(mailbox.to_string()).or_default();
        let before = events.len();
        events.retain(|event| event.id != event_id);
        if events.len() == before {
            return Err(PlanSyncError::provider(404, "ErrorItemNotFound"));
        }
        Ok(())
    }
}

/// Hand-written remote event, for calendars touched by people.
pub fn foreign_event(id: &str, subject: &str, start: DateTime<Utc>) -> CalendarEvent {
    CalendarEvent {
        id: id.to_string(),
        subject: subject.to_string(),
        start,
        end: start + chrono::Duration::hours(1),
        body: String::new(),
        location: String::new(),
        show_as: ShowAs::Busy,
    }
}
