//! Cron-driven polling cycle with explicit lifecycle management.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use plansync_core::{SyncCycle, SyncStatus};
//! use plansync_infra::scheduling::{
//!     CycleRunner, SchedulerResult, SyncScheduler, SyncSchedulerConfig,
//! };
//!
//! # async fn example(cycle: SyncCycle) -> SchedulerResult<()> {
//! let config = SyncSchedulerConfig::default();
//! let status = Arc::new(SyncStatus::default());
//! let runner = Arc::new(CycleRunner::new(Arc::new(cycle), status, config.job_timeout));
//! let mut scheduler = SyncScheduler::new(config, runner);
//!
//! scheduler.start().await?;
//! scheduler.run_now().await;
//! // ... application runs ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use plansync_core::{CycleContext, CycleOutcome, SyncCycle, SyncStatus};
use plansync_domain::{Result as DomainResult, SchedulerConfig};
use tokio::sync::Mutex;
use tokio::time::error::Elapsed;
use tokio::task::JoinHandle;
use tokio_cron_scheduler::{Job, JobScheduler};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Configuration for the sync scheduler.
#[derive(Debug, Clone)]
pub struct SyncSchedulerConfig {
    /// Cron expression (with seconds) for the polling cycle.
    pub sync_cron: String,
    /// Cron expression for the forced portal re-login.
    pub session_refresh_cron: String,
    /// Timeout applied to a single cycle or refresh.
    pub job_timeout: Duration,
    /// Time a timed-out cycle gets to finish the work order it is writing.
    pub cancel_grace: Duration,
    /// Timeout for starting the underlying scheduler.
    pub start_timeout: Duration,
    /// Timeout for stopping the scheduler.
    pub stop_timeout: Duration,
    /// Timeout for awaiting the monitor task join handle.
    pub join_timeout: Duration,
}

impl Default for SyncSchedulerConfig {
    fn default() -> Self {
        Self::from(&SchedulerConfig::default())
    }
}

impl From<&SchedulerConfig> for SyncSchedulerConfig {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            sync_cron: config.sync_cron.clone(),
            session_refresh_cron: config.session_refresh_cron.clone(),
            job_timeout: Duration::from_secs(config.job_timeout_secs.max(1)),
            cancel_grace: Duration::from_secs(config.cancel_grace_secs),
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Runs cycles and refreshes against one [`CycleContext`], recording results
/// in [`SyncStatus`].
///
/// Cycles never overlap: a trigger that finds the context busy is dropped.
/// A cycle that outlives `job_timeout` is cancelled between work orders and
/// gets `cancel_grace` to finish the one in flight.
pub struct CycleRunner {
    cycle: Arc<SyncCycle>,
    status: Arc<SyncStatus>,
    context: Mutex<CycleContext>,
    job_timeout: Duration,
    cancel_grace: Duration,
}

impl CycleRunner {
    pub fn new(cycle: Arc<SyncCycle>, status: Arc<SyncStatus>, job_timeout: Duration) -> Self {
        Self {
            cycle,
            status,
            context: Mutex::new(CycleContext::default()),
            job_timeout,
            cancel_grace: Duration::from_secs(60),
        }
    }

    pub fn with_cancel_grace(mut self, grace: Duration) -> Self {
        self.cancel_grace = grace;
        self
    }

    pub fn status(&self) -> &Arc<SyncStatus> {
        &self.status
    }

    /// Run one cycle unless another is in flight.
    ///
    /// Returns `None` when the cycle was skipped, failed or timed out; the
    /// outcome is recorded in the status board either way.
    #[instrument(skip_all)]
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> Option<CycleOutcome> {
        let Ok(mut ctx) = self.context.try_lock() else {
            info!("Previous cycle still running, skipping trigger");
            return None;
        };

        let started = Instant::now();
        let stop = cancel.child_token();
        let run = self.cycle.run(&mut ctx, &stop);
        tokio::pin!(run);

        let result = match tokio::time::timeout(self.job_timeout, &mut run).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    timeout_secs = self.job_timeout.as_secs(),
                    "Cycle timed out, stopping after the current work order"
                );
                stop.cancel();
                let drained = tokio::time::timeout(self.cancel_grace, &mut run).await;
                self.record_timeout(drained);
                return None;
            }
        };

        match result {
            Ok(outcome) => {
                self.status.record_fetch(outcome.fetched_at, outcome.planning.clone());
                self.status.record_report(outcome.report.clone());
                info!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    rows = outcome.planning.len(),
                    lookup_failures = outcome.lookup_failures.len(),
                    "Cycle finished"
                );
                Some(outcome)
            }
            Err(err) => {
                error!(error = %err, kind = err.label(), "Cycle failed");
                self.status.record_error(err.to_string());
                None
            }
        }
    }

    fn record_timeout(&self, drained: Result<DomainResult<CycleOutcome>, Elapsed>) {
        match drained {
            Ok(Ok(outcome)) => {
                info!(
                    created = outcome.report.created,
                    updated = outcome.report.updated,
                    deleted = outcome.report.deleted,
                    "Timed-out cycle stopped cleanly"
                );
                self.status.record_fetch(outcome.fetched_at, outcome.planning);
            }
            Ok(Err(err)) => warn!(error = %err, "Timed-out cycle ended with an error"),
            Err(_) => warn!(
                grace_secs = self.cancel_grace.as_secs(),
                "Timed-out cycle did not stop within its grace period, abandoning it"
            ),
        }
        self.status.record_error(format!("cycle timed out after {}s", self.job_timeout.as_secs()));
    }

    /// Force a portal re-login, waiting for a running cycle to finish first.
    #[instrument(skip_all)]
    pub async fn refresh_session(&self) {
        let refresh = async {
            let mut ctx = self.context.lock().await;
            self.cycle.refresh_session(&mut ctx).await
        };
        match tokio::time::timeout(self.job_timeout, refresh).await {
            Ok(Ok(())) => debug!("Scheduled session refresh done"),
            Ok(Err(err)) => error!(error = %err, "Session refresh failed"),
            Err(_) => warn!(timeout_secs = self.job_timeout.as_secs(), "Session refresh timed out"),
        }
    }
}

/// Sync scheduler with explicit lifecycle management.
pub struct SyncScheduler {
    scheduler: Option<JobScheduler>,
    config: SyncSchedulerConfig,
    monitor_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
    runner: Arc<CycleRunner>,
}

impl SyncScheduler {
    pub fn new(config: SyncSchedulerConfig, runner: Arc<CycleRunner>) -> Self {
        Self {
            scheduler: None,
            config,
            monitor_handle: None,
            cancellation: CancellationToken::new(),
            runner,
        }
    }

    pub fn runner(&self) -> &Arc<CycleRunner> {
        &self.runner
    }

    /// Start the scheduler, spawning the monitoring task.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();

        let scheduler_instance = self.build_scheduler().await?;
        let start_timeout = self.config.start_timeout;

        let start_result = tokio::time::timeout(start_timeout, scheduler_instance.start())
            .await
            .map_err(|source| SchedulerError::Timeout { duration: start_timeout, source })?;

        start_result.map_err(|source| SchedulerError::StartFailed { source })?;

        self.scheduler = Some(scheduler_instance);

        let cancel = self.cancellation.clone();
        let handle = tokio::spawn(async move {
            Self::monitor_task(cancel).await;
        });

        self.monitor_handle = Some(handle);
        info!(
            sync_cron = %self.config.sync_cron,
            refresh_cron = %self.config.session_refresh_cron,
            "Sync scheduler started"
        );
        Ok(())
    }

    /// Run one cycle immediately, outside the cron schedule.
    pub async fn run_now(&self) -> Option<CycleOutcome> {
        self.runner.run_cycle(&self.cancellation.child_token()).await
    }

    /// Spawn one cycle in the background. It is cancelled by [`stop`](Self::stop)
    /// like any scheduled cycle.
    pub fn trigger(&self) -> JoinHandle<Option<CycleOutcome>> {
        let runner = self.runner.clone();
        let cancel = self.cancellation.child_token();
        tokio::spawn(async move { runner.run_cycle(&cancel).await })
    }

    /// Stop the scheduler, cancelling any in-flight cycle, and wait for the
    /// monitor task to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        self.cancellation.cancel();

        let mut scheduler = match self.scheduler.take() {
            Some(scheduler) => scheduler,
            None => return Err(SchedulerError::NotRunning),
        };

        let stop_timeout = self.config.stop_timeout;
        let stop_result =
            tokio::time::timeout(stop_timeout, async move { scheduler.shutdown().await })
                .await
                .map_err(|source| SchedulerError::Timeout { duration: stop_timeout, source })?;

        stop_result.map_err(|source| SchedulerError::StopFailed { source })?;

        if let Some(handle) = self.monitor_handle.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??;
        }

        info!("Sync scheduler stopped");
        self.cancellation = CancellationToken::new();
        Ok(())
    }

    /// Returns true when a scheduler instance is active.
    pub fn is_running(&self) -> bool {
        self.scheduler.is_some()
    }

    async fn build_scheduler(&self) -> SchedulerResult<JobScheduler> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|source| SchedulerError::CreationFailed { source })?;

        let runner = self.runner.clone();
        let cancel = self.cancellation.clone();
        let sync_job = Job::new_async(self.config.sync_cron.as_str(), move |id, mut lock| {
            let runner = runner.clone();
            let cancel = cancel.child_token();
            Box::pin(async move {
                debug!(job_id = %id, "Sync job triggered");
                runner.run_cycle(&cancel).await;
                match lock.next_tick_for_job(id).await {
                    Ok(next) => runner.status().set_next_fetch(next),
                    Err(err) => debug!(error = ?err, "Could not read next sync tick"),
                }
            })
        })
        .map_err(|source| SchedulerError::JobRegistrationFailed {
            cron: self.config.sync_cron.clone(),
            source,
        })?;

        let runner = self.runner.clone();
        let refresh_job =
            Job::new_async(self.config.session_refresh_cron.as_str(), move |_id, _lock| {
                let runner = runner.clone();
                Box::pin(async move {
                    runner.refresh_session().await;
                })
            })
            .map_err(|source| SchedulerError::JobRegistrationFailed {
                cron: self.config.session_refresh_cron.clone(),
                source,
            })?;

        for (job, cron) in
            [(sync_job, &self.config.sync_cron), (refresh_job, &self.config.session_refresh_cron)]
        {
            let job_id = job.guid();
            scheduler.add(job).await.map_err(|source| {
                SchedulerError::JobRegistrationFailed { cron: cron.clone(), source }
            })?;
            debug!(cron = %cron, job_id = %job_id, "Registered job");
        }

        Ok(scheduler)
    }

    async fn monitor_task(cancel: CancellationToken) {
        cancel.cancelled().await;
        debug!("Sync scheduler monitor cancelled");
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("SyncScheduler dropped while running; cancelling tasks");
            self.cancellation.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use plansync_core::{
        CalendarClient, DetailsLookup, EngineConfig, EventCodec, PlanningWindow,
        ReconciliationEngine, SessionProvider, SessionToken, StaticMailboxMap, SystemClock,
        WorkOrderSource,
    };
    use plansync_domain::{
        CalendarEvent, EventDraft, PlanSyncError, PlannedWorkOrder, Result, WorkOrderDetails,
    };

    use super::*;

    struct EmptyCalendar;

    #[async_trait]
    impl CalendarClient for EmptyCalendar {
        async fn find_by_subject(&self, _: &str, _: &str) -> Result<Vec<CalendarEvent>> {
            Ok(Vec::new())
        }
        async fn find_by_tag_prefix(
            &self,
            _: &str,
            _: &str,
            _: DateTime<Utc>,
        ) -> Result<Vec<CalendarEvent>> {
            Ok(Vec::new())
        }
        async fn create(&self, _: &str, _: &EventDraft) -> Result<CalendarEvent> {
            Err(PlanSyncError::Internal("unexpected create".into()))
        }
        async fn update(&self, _: &str, _: &str, _: &EventDraft) -> Result<()> {
            Ok(())
        }
        async fn delete(&self, _: &str, _: &str) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Sessions {
        refreshes: AtomicUsize,
    }

    #[async_trait]
    impl SessionProvider for Sessions {
        async fn get_session(&self) -> Result<SessionToken> {
            Ok(SessionToken::new("cookie", Utc::now()))
        }
        async fn refresh_session(&self) -> Result<SessionToken> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            Ok(SessionToken::new("fresh", Utc::now()))
        }
        async fn invalidate(&self) -> Result<()> {
            Ok(())
        }
    }

    /// Empty schedule after `delay`, or a failure.
    struct Source {
        delay: Duration,
        fail: bool,
    }

    #[async_trait]
    impl WorkOrderSource for Source {
        async fn fetch_planning(
            &self,
            _: &SessionToken,
            _: PlanningWindow,
        ) -> Result<Vec<PlannedWorkOrder>> {
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(PlanSyncError::Network("HTTP 502".into()));
            }
            Ok(Vec::new())
        }
    }

    struct Details;

    #[async_trait]
    impl DetailsLookup for Details {
        async fn get_details(&self, _: &str) -> Result<WorkOrderDetails> {
            Ok(WorkOrderDetails::default())
        }
    }

    fn runner_with(source: Source, sessions: Arc<Sessions>, timeout: Duration) -> CycleRunner {
        runner_for(Arc::new(EmptyCalendar), BTreeMap::new(), Arc::new(source), sessions, timeout)
    }

    fn runner_for(
        calendar: Arc<dyn CalendarClient>,
        mailboxes: BTreeMap<String, String>,
        source: Arc<dyn WorkOrderSource>,
        sessions: Arc<Sessions>,
        timeout: Duration,
    ) -> CycleRunner {
        let engine = ReconciliationEngine::new(
            calendar,
            Arc::new(StaticMailboxMap::new(mailboxes)),
            Arc::new(SystemClock),
            EventCodec::new("Work Order", "Europe/Stockholm").unwrap(),
            EngineConfig::default(),
        );
        let cycle = SyncCycle::new(
            sessions,
            source,
            Arc::new(Details),
            Arc::new(engine),
            Arc::new(SystemClock),
        );
        CycleRunner::new(
            Arc::new(cycle),
            Arc::new(SyncStatus::with_interval(chrono::Duration::hours(1))),
            timeout,
        )
    }

    /// Calendar whose creates take eight seconds.
    #[derive(Default)]
    struct SlowCalendar {
        started: AtomicUsize,
        finished: AtomicUsize,
    }

    #[async_trait]
    impl CalendarClient for SlowCalendar {
        async fn find_by_subject(&self, _: &str, _: &str) -> Result<Vec<CalendarEvent>> {
            Ok(Vec::new())
        }
        async fn find_by_tag_prefix(
            &self,
            _: &str,
            _: &str,
            _: DateTime<Utc>,
        ) -> Result<Vec<CalendarEvent>> {
            Ok(Vec::new())
        }
        async fn create(&self, _: &str, draft: &EventDraft) -> Result<CalendarEvent> {
            self.started.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(8)).await;
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(CalendarEvent {
                id: "evt-1".into(),
                subject: draft.subject.clone(),
                start: draft.start,
                end: draft.end,
                body: draft.body.clone(),
                location: draft.location.clone(),
                show_as: draft.show_as,
            })
        }
        async fn update(&self, _: &str, _: &str, _: &EventDraft) -> Result<()> {
            Ok(())
        }
        async fn delete(&self, _: &str, _: &str) -> Result<()> {
            Ok(())
        }
    }

    /// Fixed schedule for anna.
    struct Rows(Vec<PlannedWorkOrder>);

    #[async_trait]
    impl WorkOrderSource for Rows {
        async fn fetch_planning(
            &self,
            _: &SessionToken,
            _: PlanningWindow,
        ) -> Result<Vec<PlannedWorkOrder>> {
            Ok(self.0.clone())
        }
    }

    fn anna_row(id: &str, day: u32) -> PlannedWorkOrder {
        let at = |hour| {
            chrono::NaiveDate::from_ymd_opt(2030, 1, day)
                .and_then(|date| date.and_hms_opt(hour, 0, 0))
                .unwrap()
        };
        PlannedWorkOrder {
            id: id.into(),
            work_order_id: format!("WO-{id}"),
            name: "Montage".into(),
            user_name: "anna".into(),
            production_start: at(8),
            production_end: at(16),
        }
    }

    fn quick_source() -> Source {
        Source { delay: Duration::ZERO, fail: false }
    }

    fn fast_config() -> SyncSchedulerConfig {
        SyncSchedulerConfig {
            // Never fires during a test run.
            sync_cron: "0 0 0 1 1 *".into(),
            session_refresh_cron: "0 0 0 1 1 *".into(),
            job_timeout: Duration::from_secs(5),
            ..SyncSchedulerConfig::default()
        }
    }

    #[tokio::test]
    async fn successful_cycle_is_recorded() {
        let runner = runner_with(quick_source(), Arc::default(), Duration::from_secs(5));

        let outcome = runner.run_cycle(&CancellationToken::new()).await;

        assert!(outcome.is_some());
        let snapshot = runner.status().snapshot();
        assert!(snapshot.last_fetch.is_some());
        assert!(snapshot.next_fetch.is_some());
        assert_eq!(snapshot.cycles, 1);
        assert_eq!(runner.status().planning().map(|rows| rows.len()), Some(0));
        assert!(runner.status().last_report().is_some());
    }

    #[tokio::test]
    async fn failed_cycle_records_error() {
        let runner = runner_with(
            Source { delay: Duration::ZERO, fail: true },
            Arc::default(),
            Duration::from_secs(5),
        );

        assert!(runner.run_cycle(&CancellationToken::new()).await.is_none());

        let snapshot = runner.status().snapshot();
        assert!(snapshot.last_error.unwrap_or_default().contains("502"));
        assert_eq!(snapshot.last_fetch, None);
        assert!(runner.status().planning().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_cycle_times_out() {
        let runner = runner_with(
            Source { delay: Duration::from_secs(120), fail: false },
            Arc::default(),
            Duration::from_secs(10),
        );

        assert!(runner.run_cycle(&CancellationToken::new()).await.is_none());
        assert!(runner.status().snapshot().last_error.unwrap_or_default().contains("timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn timed_out_cycle_finishes_write_in_flight() {
        let calendar = Arc::new(SlowCalendar::default());
        let runner = runner_for(
            calendar.clone(),
            BTreeMap::from([("anna".to_string(), "anna@example.se".to_string())]),
            Arc::new(Rows(vec![anna_row("1", 7), anna_row("2", 8)])),
            Arc::default(),
            Duration::from_secs(5),
        )
        .with_cancel_grace(Duration::from_secs(30));

        assert!(runner.run_cycle(&CancellationToken::new()).await.is_none());

        assert_eq!(calendar.started.load(Ordering::SeqCst), 1);
        assert_eq!(calendar.finished.load(Ordering::SeqCst), 1);
        let snapshot = runner.status().snapshot();
        assert!(snapshot.last_error.unwrap_or_default().contains("timed out"));
        assert!(snapshot.last_fetch.is_some());
        assert_eq!(snapshot.cycles, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_trigger_is_skipped() {
        let runner = runner_with(
            Source { delay: Duration::from_secs(1), fail: false },
            Arc::default(),
            Duration::from_secs(10),
        );
        let cancel = CancellationToken::new();

        let (first, second) = tokio::join!(runner.run_cycle(&cancel), runner.run_cycle(&cancel));

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(runner.status().snapshot().cycles, 1);
    }

    #[tokio::test]
    async fn refresh_goes_through_session_provider() {
        let sessions = Arc::new(Sessions::default());
        let runner = runner_with(quick_source(), sessions.clone(), Duration::from_secs(5));

        runner.refresh_session().await;

        assert_eq!(sessions.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn lifecycle_runs_successfully() {
        let runner = Arc::new(runner_with(quick_source(), Arc::default(), Duration::from_secs(5)));
        let mut scheduler = SyncScheduler::new(fast_config(), runner);

        scheduler.start().await.expect("start succeeds");
        assert!(scheduler.is_running());
        assert!(scheduler.run_now().await.is_some());
        scheduler.stop().await.expect("stop succeeds");

        assert!(!scheduler.is_running());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn triggered_cycle_runs_in_background() {
        let runner = Arc::new(runner_with(quick_source(), Arc::default(), Duration::from_secs(5)));
        let scheduler = SyncScheduler::new(fast_config(), runner.clone());

        let outcome = scheduler.trigger().await.expect("task joins");

        assert!(outcome.is_some());
        assert_eq!(runner.status().snapshot().cycles, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn double_start_is_rejected() {
        let runner = Arc::new(runner_with(quick_source(), Arc::default(), Duration::from_secs(5)));
        let mut scheduler = SyncScheduler::new(fast_config(), runner);

        scheduler.start().await.expect("first start");
        let err = scheduler.start().await.expect_err("second start fails");
        assert!(matches!(err, SchedulerError::AlreadyRunning));
        scheduler.stop().await.expect("stop succeeds");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn restart_after_stop_succeeds() {
        let runner = Arc::new(runner_with(quick_source(), Arc::default(), Duration::from_secs(5)));
        let mut scheduler = SyncScheduler::new(fast_config(), runner);

        scheduler.start().await.expect("start succeeds");
        scheduler.stop().await.expect("stop succeeds");
        scheduler.start().await.expect("start again");
        scheduler.stop().await.expect("stop again");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stop_without_start_is_rejected() {
        let runner = Arc::new(runner_with(quick_source(), Arc::default(), Duration::from_secs(5)));
        let mut scheduler = SyncScheduler::new(fast_config(), runner);

        assert!(matches!(scheduler.stop().await, Err(SchedulerError::NotRunning)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn invalid_cron_is_rejected() {
        let runner = Arc::new(runner_with(quick_source(), Arc::default(), Duration::from_secs(5)));
        let config = SyncSchedulerConfig { sync_cron: "every hour".into(), ..fast_config() };
        let mut scheduler = SyncScheduler::new(config, runner);

        let err = scheduler.start().await.expect_err("bad cron");
        assert!(matches!(err, SchedulerError::JobRegistrationFailed { .. }));
        assert!(!scheduler.is_running());
    }
}
