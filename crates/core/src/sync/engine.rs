//! Calendar reconciliation engine
//!
//! Brings each user's remote calendar in line with a freshly fetched batch of
//! work orders. The provider is re-read on every run; the only local memory
//! is [`RunState`], which is a hint for reporting and never drives writes.
//!
//! Per user the engine runs two passes:
//!
//! 1. **Staleness** (only for users the fetch is known to cover): list tagged
//!    events from now on and delete the ones whose work order is neither in
//!    the batch nor retained.
//! 2. **Upsert**: look every order up by subject, then by id, and create,
//!    update or leave it. Duplicate remote events are reported, never
//!    deleted. Orders whose id cannot be carried in a subject are skipped.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::future::Future;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use plansync_domain::constants::PLANNING_WINDOW_DAYS;
use plansync_domain::{
    Anomaly, AnomalyKind, CalendarEvent, FetchCoverage, ItemError, PlanSyncError, Result,
    SkipReason, SkippedItem, SyncBatch, SyncConfig, SyncOperation, SyncReport, WorkOrder,
    WorkOrderId,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::codec::EventCodec;
use super::guard::RunGuard;
use super::ports::{Clock, UserMailboxMap};
use super::run_state::RunState;
use crate::calendar_ports::CalendarClient;

/// Tuning for a reconciliation engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Users reconciled concurrently.
    pub max_concurrent_users: usize,
    /// Upper bound for a single provider call.
    pub call_timeout: Duration,
    /// Pause before the single retry of a transient failure.
    pub retry_backoff: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for EngineConfig {
    fn from(config: &SyncConfig) -> Self {
        Self {
            max_concurrent_users: config.max_concurrent_users.max(1),
            call_timeout: Duration::from_secs(config.call_timeout_secs),
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }
}

/// Work for one user within a run.
struct UserPlan {
    user: String,
    mailbox: String,
    orders: Vec<WorkOrder>,
    confirmed: bool,
}

/// Reconciles work order batches against remote calendars.
pub struct ReconciliationEngine {
    calendar: Arc<dyn CalendarClient>,
    mailboxes: Arc<dyn UserMailboxMap>,
    clock: Arc<dyn Clock>,
    codec: EventCodec,
    config: EngineConfig,
    run_state: RunState,
    running: AtomicBool,
}

impl ReconciliationEngine {
    pub fn new(
        calendar: Arc<dyn CalendarClient>,
        mailboxes: Arc<dyn UserMailboxMap>,
        clock: Arc<dyn Clock>,
        codec: EventCodec,
        config: EngineConfig,
    ) -> Self {
        Self {
            calendar,
            mailboxes,
            clock,
            codec,
            config,
            run_state: RunState::new(),
            running: AtomicBool::new(false),
        }
    }

    pub fn codec(&self) -> &EventCodec {
        &self.codec
    }

    pub fn run_state(&self) -> &RunState {
        &self.run_state
    }

    /// Reconcile `batch` against every affected calendar.
    ///
    /// # Errors
    /// `PlanSyncError::SyncInProgress` when another run is active. Provider
    /// failures never abort a run; they are collected in the report.
    pub async fn sync(&self, batch: SyncBatch) -> Result<SyncReport> {
        self.sync_until(batch, &CancellationToken::new()).await
    }

    /// Like [`sync`](Self::sync), stopping between work order units once
    /// `cancel` fires. A cancelled run leaves the run state untouched.
    #[instrument(skip_all, fields(orders = batch.work_orders.len()))]
    pub async fn sync_until(
        &self,
        batch: SyncBatch,
        cancel: &CancellationToken,
    ) -> Result<SyncReport> {
        let Some(_guard) = RunGuard::try_acquire(&self.running) else {
            warn!("Rejecting sync trigger, a run is already in progress");
            return Err(PlanSyncError::SyncInProgress);
        };

        let started_at = self.clock.now();
        let mut report = SyncReport::new(started_at);
        let delta = self.run_state.delta(&batch.work_orders, &self.codec);

        let plans = self.partition(&batch, &mut report);
        info!(
            users = plans.len(),
            coverage = coverage_label(&batch.coverage),
            retained = batch.retained.len(),
            "Starting calendar reconciliation"
        );

        let retained = &batch.retained;
        let partials: Vec<SyncReport> = stream::iter(plans)
            .map(|plan| self.sync_user(plan, retained, started_at, cancel))
            .buffer_unordered(self.config.max_concurrent_users)
            .collect()
            .await;
        for partial in partials {
            report.merge(partial);
        }

        report.finished_at = self.clock.now();
        if report.cancelled {
            warn!("Reconciliation cancelled, run state left unchanged");
        } else {
            self.run_state.replace(&batch.work_orders, report.finished_at);
        }
        report.delta = delta;

        info!(
            created = report.created,
            updated = report.updated,
            unchanged = report.unchanged,
            deleted = report.deleted,
            skipped = report.skipped.len(),
            failed = report.failed,
            failed_users = report.failed_users.len(),
            anomalies = report.anomalies.len(),
            added = report.delta.added.len(),
            removed = report.delta.removed.len(),
            changed = report.delta.changed.len(),
            "Calendar reconciliation finished"
        );
        Ok(report)
    }

    /// Group orders by mailbox and add confirmed users that have no orders.
    fn partition(&self, batch: &SyncBatch, report: &mut SyncReport) -> Vec<UserPlan> {
        let mut plans: BTreeMap<String, UserPlan> = BTreeMap::new();
        let mut unmapped = BTreeSet::new();

        for order in &batch.work_orders {
            if !self.codec.accepts_id(&order.id) {
                warn!(
                    user = %order.user_key,
                    work_order_id = ?order.id.as_str(),
                    "Work order id cannot be carried in a subject, skipping"
                );
                report.skipped.push(SkippedItem {
                    work_order_id: order.id.clone(),
                    user: order.user_key.clone(),
                    reason: SkipReason::InvalidId,
                });
                continue;
            }
            if let Some(plan) = plans.get_mut(&order.user_key) {
                plan.orders.push(order.clone());
                continue;
            }
            match self.mailboxes.mailbox_for(&order.user_key) {
                Some(mailbox) => {
                    plans.insert(
                        order.user_key.clone(),
                        UserPlan {
                            user: order.user_key.clone(),
                            mailbox,
                            orders: vec![order.clone()],
                            confirmed: batch.coverage.confirms(&order.user_key),
                        },
                    );
                }
                None => {
                    if unmapped.insert(order.user_key.clone()) {
                        warn!(user = %order.user_key, "No mailbox mapped for user, skipping");
                    }
                    debug!(
                        user = %order.user_key,
                        work_order_id = %order.id,
                        "Skipped unmapped work order"
                    );
                    report.skipped.push(SkippedItem {
                        work_order_id: order.id.clone(),
                        user: order.user_key.clone(),
                        reason: SkipReason::MappingMissing,
                    });
                }
            }
        }

        let confirmed_idle: Vec<String> = match &batch.coverage {
            FetchCoverage::All => self.mailboxes.users(),
            FetchCoverage::Users(users) => users.iter().cloned().collect(),
            FetchCoverage::Unconfirmed => Vec::new(),
        };
        for user in confirmed_idle {
            if plans.contains_key(&user) {
                continue;
            }
            if let Some(mailbox) = self.mailboxes.mailbox_for(&user) {
                plans.insert(
                    user.clone(),
                    UserPlan { user, mailbox, orders: Vec::new(), confirmed: true },
                );
            }
        }

        plans.into_values().collect()
    }

    async fn sync_user(
        &self,
        plan: UserPlan,
        retained: &BTreeSet<WorkOrderId>,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> SyncReport {
        let mut report = SyncReport::new(now);
        let mut listed: HashMap<WorkOrderId, Vec<CalendarEvent>> = HashMap::new();

        if plan.confirmed {
            match self.staleness_pass(&plan, retained, now, cancel, &mut report).await {
                Ok(index) => listed = index,
                Err(err) => {
                    error!(
                        user = %plan.user,
                        operation = %SyncOperation::List,
                        error = %err,
                        "Listing tagged events failed, skipping user"
                    );
                    report.failed += 1;
                    report.failed_users.insert(plan.user.clone());
                    report.errors.push(ItemError {
                        user: plan.user,
                        work_order_id: None,
                        event_id: None,
                        operation: SyncOperation::List,
                        message: err.to_string(),
                    });
                    return report;
                }
            }
        } else {
            debug!(user = %plan.user, "Fetch coverage unconfirmed, skipping staleness pass");
        }

        if report.cancelled {
            skip_cancelled(&plan.user, &plan.orders, &mut report);
            return report;
        }

        let mut seen = BTreeSet::new();
        for (index, order) in plan.orders.iter().enumerate() {
            if cancel.is_cancelled() {
                report.cancelled = true;
                skip_cancelled(&plan.user, &plan.orders[index..], &mut report);
                break;
            }
            if !seen.insert(order.id.clone()) {
                warn!(
                    user = %plan.user,
                    work_order_id = %order.id,
                    "Duplicate work order id in batch"
                );
                report.anomalies.push(Anomaly {
                    user: plan.user.clone(),
                    work_order_id: Some(order.id.clone()),
                    kind: AnomalyKind::DuplicateInBatch,
                });
                continue;
            }
            let fallback = listed.remove(&order.id).unwrap_or_default();
            self.upsert(&plan, order, fallback, now, &mut report).await;
        }

        if report.failed > 0 {
            report.failed_users.insert(plan.user);
        }
        report
    }

    /// Delete stale events and return the listed events indexed by id.
    async fn staleness_pass(
        &self,
        plan: &UserPlan,
        retained: &BTreeSet<WorkOrderId>,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
        report: &mut SyncReport,
    ) -> Result<HashMap<WorkOrderId, Vec<CalendarEvent>>> {
        let calendar = self.calendar.as_ref();
        let mailbox = plan.mailbox.as_str();
        let prefix = self.codec.tag_prefix();
        let events = self.call(move || calendar.find_by_tag_prefix(mailbox, prefix, now)).await?;

        let wanted: BTreeSet<&WorkOrderId> = plan.orders.iter().map(|order| &order.id).collect();
        let mut index: HashMap<WorkOrderId, Vec<CalendarEvent>> = HashMap::new();

        for event in events {
            let id = match self.codec.decode_id(&event.subject) {
                Ok(Some(id)) => id,
                Ok(None) => continue,
                Err(err) => {
                    warn!(
                        user = %plan.user,
                        event_id = %event.id,
                        error = %err,
                        "Skipping undecodable event"
                    );
                    report.anomalies.push(Anomaly {
                        user: plan.user.clone(),
                        work_order_id: None,
                        kind: AnomalyKind::UndecodableSubject {
                            event_id: event.id.clone(),
                            subject: event.subject.clone(),
                        },
                    });
                    continue;
                }
            };

            if wanted.contains(&id) || retained.contains(&id) {
                index.entry(id).or_default().push(event);
                continue;
            }

            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let event_id = event.id.as_str();
            match self.call(move || calendar.delete(mailbox, event_id)).await {
                Ok(()) => {
                    info!(user = %plan.user, work_order_id = %id, event_id, "Deleted stale event");
                    report.deleted += 1;
                }
                Err(err) => {
                    let failure = Failure::new(&plan.user, SyncOperation::Delete)
                        .work_order(&id)
                        .event(event_id);
                    failure.record(report, &err);
                }
            }
        }

        Ok(index)
    }

    async fn upsert(
        &self,
        plan: &UserPlan,
        order: &WorkOrder,
        listed: Vec<CalendarEvent>,
        now: DateTime<Utc>,
        report: &mut SyncReport,
    ) {
        let calendar = self.calendar.as_ref();
        let mailbox = plan.mailbox.as_str();
        let draft = self.codec.encode(order);
        let subject = draft.subject.as_str();

        let found = match self.call(move || calendar.find_by_subject(mailbox, subject)).await {
            Ok(found) => found,
            Err(err) => {
                Failure::new(&plan.user, SyncOperation::Find).work_order(&order.id).record(report, &err);
                return;
            }
        };
        let mut matches: Vec<CalendarEvent> =
            found.into_iter().filter(|event| self.carries_id(event, &order.id)).collect();
        if matches.is_empty() {
            // Renamed orders no longer match by subject but still carry their id.
            matches = if listed.is_empty() {
                match self.find_by_id(mailbox, order, now).await {
                    Ok(found) => found,
                    Err(err) => {
                        Failure::new(&plan.user, SyncOperation::List)
                            .work_order(&order.id)
                            .record(report, &err);
                        return;
                    }
                }
            } else {
                listed
            };
        }

        let draft = &draft;
        let Some(first) = matches.first() else {
            match self.call(move || calendar.create(mailbox, draft)).await {
                Ok(created) => {
                    info!(
                        user = %plan.user,
                        work_order_id = %order.id,
                        event_id = %created.id,
                        "Created event"
                    );
                    report.created += 1;
                }
                Err(err) => {
                    Failure::new(&plan.user, SyncOperation::Create)
                        .work_order(&order.id)
                        .record(report, &err);
                }
            }
            return;
        };

        if matches.len() > 1 {
            let event_ids: Vec<String> = matches.iter().map(|event| event.id.clone()).collect();
            warn!(
                user = %plan.user,
                work_order_id = %order.id,
                events = ?event_ids,
                "Multiple events for one work order, updating the first only"
            );
            report.anomalies.push(Anomaly {
                user: plan.user.clone(),
                work_order_id: Some(order.id.clone()),
                kind: AnomalyKind::DuplicateEvents { event_ids },
            });
        }

        let changed = self.codec.diff(draft, first);
        if changed.is_empty() {
            debug!(user = %plan.user, work_order_id = %order.id, "Event up to date");
            report.unchanged += 1;
            return;
        }

        let event_id = first.id.as_str();
        match self.call(move || calendar.update(mailbox, event_id, draft)).await {
            Ok(()) => {
                info!(
                    user = %plan.user,
                    work_order_id = %order.id,
                    event_id,
                    fields = ?changed,
                    "Updated event"
                );
                report.updated += 1;
            }
            Err(err) => {
                Failure::new(&plan.user, SyncOperation::Update)
                    .work_order(&order.id)
                    .event(event_id)
                    .record(report, &err);
            }
        }
    }

    /// Tagged events carrying `order`'s id, including ones that already
    /// started and so fall outside the staleness listing.
    async fn find_by_id(
        &self,
        mailbox: &str,
        order: &WorkOrder,
        now: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        let calendar = self.calendar.as_ref();
        let prefix = self.codec.id_prefix(&order.id);
        let prefix = prefix.as_str();
        let since = order.start.min(now) - chrono::Duration::days(PLANNING_WINDOW_DAYS);
        let events = self.call(move || calendar.find_by_tag_prefix(mailbox, prefix, since)).await?;
        Ok(events.into_iter().filter(|event| self.carries_id(event, &order.id)).collect())
    }

    fn carries_id(&self, event: &CalendarEvent, id: &WorkOrderId) -> bool {
        self.codec.decode_id(&event.subject).ok().flatten().as_ref() == Some(id)
    }

    /// Run a provider call under the call timeout, retrying one transient
    /// failure after the configured backoff.
    async fn call<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match self.timed(op()).await {
            Err(err) if err.is_transient() => {
                debug!(
                    error = %err,
                    backoff = ?self.config.retry_backoff,
                    "Retrying transient provider failure"
                );
                tokio::time::sleep(self.config.retry_backoff).await;
                self.timed(op()).await
            }
            outcome => outcome,
        }
    }

    async fn timed<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.config.call_timeout, fut).await {
            Ok(outcome) => outcome,
            Err(_) => Err(PlanSyncError::provider(
                None,
                format!("call timed out after {}ms", self.config.call_timeout.as_millis()),
            )),
        }
    }
}

/// Context of a failed provider call.
struct Failure<'a> {
    user: &'a str,
    operation: SyncOperation,
    work_order_id: Option<&'a WorkOrderId>,
    event_id: Option<&'a str>,
}

impl<'a> Failure<'a> {
    fn new(user: &'a str, operation: SyncOperation) -> Self {
        Self { user, operation, work_order_id: None, event_id: None }
    }

    fn work_order(mut self, id: &'a WorkOrderId) -> Self {
        self.work_order_id = Some(id);
        self
    }

    fn event(mut self, id: &'a str) -> Self {
        self.event_id = Some(id);
        self
    }

    fn record(self, report: &mut SyncReport, err: &PlanSyncError) {
        error!(
            user = self.user,
            work_order_id = self.work_order_id.map(WorkOrderId::as_str),
            event_id = self.event_id,
            operation = %self.operation,
            error = %err,
            "Calendar operation failed"
        );
        report.failed += 1;
        report.errors.push(ItemError {
            user: self.user.to_string(),
            work_order_id: self.work_order_id.cloned(),
            event_id: self.event_id.map(str::to_string),
            operation: self.operation,
            message: err.to_string(),
        });
    }
}

fn skip_cancelled(user: &str, orders: &[WorkOrder], report: &mut SyncReport) {
    report.skipped.extend(orders.iter().map(|order| SkippedItem {
        work_order_id: order.id.clone(),
        user: user.to_string(),
        reason: SkipReason::Cancelled,
    }));
}

fn coverage_label(coverage: &FetchCoverage) -> &'static str {
    match coverage {
        FetchCoverage::All => "all",
        FetchCoverage::Users(_) => "partial",
        FetchCoverage::Unconfirmed => "unconfirmed",
    }
}
