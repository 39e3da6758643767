//! Application context - dependency injection container

use std::sync::Arc;
use std::time::Duration;

use chrono_tz::Tz;
use plansync_core::{
    Clock, CycleOutcome, EngineConfig, EventCodec, ReconciliationEngine, StaticMailboxMap,
    SyncCycle, SyncStatus, SystemClock,
};
use plansync_domain::{Config, PlanSyncError, Result};
use plansync_infra::{
    CachedDetailsLookup, CycleRunner, DetailsClient, FormLogin, GraphCalendarClient, HttpClient,
    LogBuffer, PortalPlanningClient, PortalSessionProvider, SyncScheduler, SyncSchedulerConfig,
};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::handlers::AppState;

/// Application context - holds the wired pipeline, its scheduler and the
/// state shared with the status server.
pub struct AppContext {
    pub config: Config,
    pub status: Arc<SyncStatus>,
    pub logs: LogBuffer,
    scheduler: SyncScheduler,
    zone: Tz,
}

impl AppContext {
    /// Build every adapter from `config`. Nothing is contacted yet.
    ///
    /// # Errors
    /// `PlanSyncError::Config` for missing secrets or unknown time zones.
    pub fn from_config(config: Config, logs: LogBuffer) -> Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let cycle = build_cycle(&config, clock)?;

        let interval = i64::try_from(config.scheduler.sync_interval_secs)
            .map_err(|_| PlanSyncError::Config("scheduler.sync_interval_secs is too large".into()))?;
        let status = Arc::new(SyncStatus::with_interval(chrono::Duration::seconds(interval)));

        let scheduler_config = SyncSchedulerConfig::from(&config.scheduler);
        let runner = Arc::new(
            CycleRunner::new(Arc::new(cycle), status.clone(), scheduler_config.job_timeout)
                .with_cancel_grace(scheduler_config.cancel_grace),
        );
        let scheduler = SyncScheduler::new(scheduler_config, runner);
        let zone = parse_zone("sync.time_zone", &config.sync.time_zone)?;

        if config.mailboxes.is_empty() {
            warn!("No mailboxes configured, every work order will be skipped");
        }

        Ok(Self { config, status, logs, scheduler, zone })
    }

    pub fn state(&self) -> AppState {
        AppState::new(self.status.clone(), self.logs.clone(), self.zone)
    }

    pub fn time_zone(&self) -> Tz {
        self.zone
    }

    /// Start the cron jobs. With `scheduler.run_on_start` a first cycle is
    /// spawned right away and its handle returned.
    ///
    /// # Errors
    /// Scheduler start failures, e.g. an invalid cron expression.
    pub async fn start(&mut self) -> Result<Option<JoinHandle<Option<CycleOutcome>>>> {
        self.scheduler.start().await?;
        if !self.config.scheduler.run_on_start {
            return Ok(None);
        }
        info!("Running initial sync cycle");
        Ok(Some(self.scheduler.trigger()))
    }

    /// Stop the scheduler, cancelling any running cycle.
    ///
    /// # Errors
    /// Scheduler stop failures. Stopping a scheduler that never started is
    /// not an error.
    pub async fn shutdown(&mut self) -> Result<()> {
        if self.scheduler.is_running() {
            self.scheduler.stop().await?;
        }
        Ok(())
    }

    pub fn scheduler(&self) -> &SyncScheduler {
        &self.scheduler
    }
}

/// Wire the portal, details and Graph adapters into one polling cycle.
///
/// # Errors
/// `PlanSyncError::Config` when a secret or zone is missing or invalid.
pub fn build_cycle(config: &Config, clock: Arc<dyn Clock>) -> Result<SyncCycle> {
    let portal_zone = parse_zone("portal.time_zone", &config.portal.time_zone)?;

    let portal_http = HttpClient::builder()
        .timeout(Duration::from_secs(config.portal.request_timeout_secs))
        .build()?;
    let login = Arc::new(FormLogin::from_config(&config.portal)?);
    let sessions =
        PortalSessionProvider::new(login, portal_http.clone(), &config.portal, clock.clone());
    let source = PortalPlanningClient::new(portal_http, &config.portal);

    let details = CachedDetailsLookup::new(
        Arc::new(DetailsClient::from_config(&config.details)?),
        Duration::from_secs(config.details.cache_ttl_secs),
    );

    let engine = ReconciliationEngine::new(
        Arc::new(GraphCalendarClient::from_config(&config.graph)?),
        Arc::new(StaticMailboxMap::new(config.mailboxes.clone())),
        clock.clone(),
        EventCodec::from_config(&config.sync)?,
        EngineConfig::from(&config.sync),
    );

    info!(
        portal = %config.portal.base_url,
        mailboxes = config.mailboxes.len(),
        tag = %config.sync.tag,
        "Sync pipeline wired"
    );

    Ok(SyncCycle::new(
        Arc::new(sessions),
        Arc::new(source),
        Arc::new(details),
        Arc::new(engine),
        clock,
    )
    .with_portal_zone(portal_zone))
}

fn parse_zone(field: &str, zone: &str) -> Result<Tz> {
    zone.parse::<Tz>()
        .map_err(|_| PlanSyncError::Config(format!("{field} is not an IANA zone: {zone}")))
}
