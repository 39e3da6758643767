//! One polling cycle: session → planning fetch → enrichment → reconciliation

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use plansync_domain::{
    PlanSyncError, PlannedWorkOrder, Result, SyncBatch, SyncReport, WorkOrder, WorkOrderId,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use super::ports::{DetailsLookup, PlanningWindow, SessionProvider, SessionToken, WorkOrderSource};
use crate::sync::{Clock, ReconciliationEngine};

/// State carried from one cycle to the next by the scheduler.
#[derive(Debug, Default)]
pub struct CycleContext {
    pub session: Option<SessionToken>,
    pub last_fetch: Option<DateTime<Utc>>,
    pub last_finished: Option<DateTime<Utc>>,
}

/// Result of a completed cycle.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub fetched_at: DateTime<Utc>,
    pub planning: Vec<PlannedWorkOrder>,
    /// Rows whose enrichment failed; their events were left untouched.
    pub lookup_failures: Vec<WorkOrderId>,
    pub report: SyncReport,
}

/// Drives the poll → enrich → sync pipeline.
pub struct SyncCycle {
    sessions: Arc<dyn SessionProvider>,
    source: Arc<dyn WorkOrderSource>,
    details: Arc<dyn DetailsLookup>,
    engine: Arc<ReconciliationEngine>,
    clock: Arc<dyn Clock>,
    portal_zone: Tz,
}

impl SyncCycle {
    pub fn new(
        sessions: Arc<dyn SessionProvider>,
        source: Arc<dyn WorkOrderSource>,
        details: Arc<dyn DetailsLookup>,
        engine: Arc<ReconciliationEngine>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { sessions, source, details, engine, clock, portal_zone: chrono_tz::Europe::Stockholm }
    }

    /// Zone of the portal's naive production timestamps.
    pub fn with_portal_zone(mut self, zone: Tz) -> Self {
        self.portal_zone = zone;
        self
    }

    pub fn engine(&self) -> &Arc<ReconciliationEngine> {
        &self.engine
    }

    /// Run one full cycle.
    ///
    /// # Errors
    /// Session and planning fetch failures end the cycle before any calendar
    /// is touched. An `Auth` failure also drops the cached session.
    #[instrument(skip_all)]
    pub async fn run(
        &self,
        ctx: &mut CycleContext,
        cancel: &CancellationToken,
    ) -> Result<CycleOutcome> {
        let session = self.session(ctx).await?;

        let now = self.clock.now();
        let window = PlanningWindow::starting(now.with_timezone(&self.portal_zone).date_naive());
        info!(start = %window.start, end = %window.end, "Fetching planned work orders");

        let planning = match self.source.fetch_planning(&session, window).await {
            Ok(rows) => rows,
            Err(err) => {
                if err.is_auth() {
                    self.drop_session(ctx).await;
                }
                error!(error = %err, "Planning fetch failed, skipping calendar sync");
                return Err(err);
            }
        };
        ctx.last_fetch = Some(now);
        info!(rows = planning.len(), "Fetched planned work orders");

        let mut work_orders = Vec::with_capacity(planning.len());
        let mut retained = BTreeSet::new();
        let mut lookup_failures = Vec::new();
        for row in &planning {
            match self.enrich(row).await {
                Ok(order) => work_orders.push(order),
                Err(err) => {
                    warn!(
                        work_order_id = %row.id,
                        order_id = %row.work_order_id,
                        user = %row.user_name,
                        error = %err,
                        "Skipping work order"
                    );
                    let id = WorkOrderId::new(row.id.clone());
                    retained.insert(id.clone());
                    lookup_failures.push(id);
                }
            }
        }

        let batch = SyncBatch::complete(work_orders).with_retained(retained);
        let report = self.engine.sync_until(batch, cancel).await?;
        ctx.last_finished = Some(self.clock.now());

        Ok(CycleOutcome { fetched_at: now, planning, lookup_failures, report })
    }

    /// Force a new portal login, replacing the session held in `ctx`.
    ///
    /// # Errors
    /// Propagates the session provider's failure; `ctx` then holds no session.
    #[instrument(skip_all)]
    pub async fn refresh_session(&self, ctx: &mut CycleContext) -> Result<()> {
        ctx.session = None;
        let session = self.sessions.refresh_session().await?;
        info!(obtained_at = %session.obtained_at(), "Portal session refreshed");
        ctx.session = Some(session);
        Ok(())
    }

    async fn session(&self, ctx: &mut CycleContext) -> Result<SessionToken> {
        if let Some(session) = &ctx.session {
            return Ok(session.clone());
        }
        match self.sessions.get_session().await {
            Ok(session) => {
                ctx.session = Some(session.clone());
                Ok(session)
            }
            Err(err) => {
                if err.is_auth() {
                    self.drop_session(ctx).await;
                }
                error!(error = %err, "Could not obtain portal session");
                Err(err)
            }
        }
    }

    async fn drop_session(&self, ctx: &mut CycleContext) {
        ctx.session = None;
        if let Err(err) = self.sessions.invalidate().await {
            warn!(error = %err, "Failed to invalidate cached portal session");
        }
    }

    async fn enrich(&self, row: &PlannedWorkOrder) -> Result<WorkOrder> {
        let details = self.details.get_details(&row.work_order_id).await?;
        let start = self.to_utc(row.production_start, &row.id)?;
        let end = self.to_utc(row.production_end, &row.id)?;
        let location = details.customer_name.trim().to_string();
        Ok(WorkOrder {
            id: WorkOrderId::new(row.id.clone()),
            order_id: row.work_order_id.clone(),
            user_key: row.user_name.clone(),
            name: row.name.clone(),
            start,
            end,
            details,
            location,
        })
    }

    /// Interpret a naive portal timestamp in the portal zone. Times in a DST
    /// gap have no instant and are rejected.
    fn to_utc(&self, naive: NaiveDateTime, id: &str) -> Result<DateTime<Utc>> {
        self.portal_zone
            .from_local_datetime(&naive)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(|| {
                PlanSyncError::InvalidInput(format!(
                    "work order {id}: {naive} does not exist in {}",
                    self.portal_zone
                ))
            })
    }
}
