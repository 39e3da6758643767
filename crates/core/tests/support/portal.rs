use std::collections::{BTreeSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use plansync_core::{DetailsLookup, PlanningWindow, SessionProvider, SessionToken, WorkOrderSource};
use plansync_domain::{
    PlanSyncError, PlannedWorkOrder, Result as DomainResult, WorkOrderDetails,
};

use super::t0;

/// Session provider that hands out numbered cookies.
#[derive(Clone, Default)]
pub struct FakeSessions {
    pub logins: Arc<AtomicUsize>,
    pub invalidations: Arc<AtomicUsize>,
    reject: Arc<Mutex<bool>>,
}

impl FakeSessions {
    pub fn rejecting() -> Self {
        let sessions = Self::default();
        *sessions.reject.lock() = true;
        sessions
    }

    fn login(&self) -> DomainResult<SessionToken> {
        if *self.reject.lock() {
            return Err(PlanSyncError::Auth("invalid credentials".into()));
        }
        let n = self.logins.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(SessionToken::new(format!("cookie-{n}"), t0()))
    }
}

#[async_trait]
impl SessionProvider for FakeSessions {
    async fn get_session(&self) -> DomainResult<SessionToken> {
        self.login()
    }

    async fn refresh_session(&self) -> DomainResult<SessionToken> {
        self.login()
    }

    async fn invalidate(&self) -> DomainResult<()> {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Planning source that replays scripted responses, then repeats the last.
#[derive(Clone, Default)]
pub struct FakeSource {
    responses: Arc<Mutex<VecDeque<DomainResult<Vec<PlannedWorkOrder>>>>>,
    pub windows: Arc<Mutex<Vec<PlanningWindow>>>,
    pub cookies: Arc<Mutex<Vec<String>>>,
}

impl FakeSource {
    pub fn returning(rows: Vec<PlannedWorkOrder>) -> Self {
        let source = Self::default();
        source.push(Ok(rows));
        source
    }

    pub fn push(&self, response: DomainResult<Vec<PlannedWorkOrder>>) {
        self.responses.lock().push_back(response);
    }
}

#[async_trait]
impl WorkOrderSource for FakeSource {
    async fn fetch_planning(
        &self,
        session: &SessionToken,
        window: PlanningWindow,
    ) -> DomainResult<Vec<PlannedWorkOrder>> {
        self.windows.lock().push(window);
        self.cookies.lock().push(session.cookie().to_string());
        let mut responses = self.responses.lock();
        if responses.len() > 1 {
            return responses.pop_front().unwrap_or_else(|| Ok(Vec::new()));
        }
        responses.front().cloned().unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// Details lookup with a set of order ids that always fail.
#[derive(Clone, Default)]
pub struct FakeDetails {
    failing: Arc<Mutex<BTreeSet<String>>>,
    pub lookups: Arc<AtomicUsize>,
}

impl FakeDetails {
    pub fn failing_for(order_id: &str) -> Self {
        let details = Self::default();
        details.failing.lock().insert(order_id.to_string());
        details
    }
}

#[async_trait]
impl DetailsLookup for FakeDetails {
    async fn get_details(&self, order_id: &str) -> DomainResult<WorkOrderDetails> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().contains(order_id) {
            return Err(PlanSyncError::lookup(order_id, "HTTP 500"));
        }
        Ok(WorkOrderDetails {
            project_number: "1203".into(),
            project_name: "Hall B".into(),
            description: Some(format!("Order {order_id}")),
            customer_name: "Acme AB".into(),
            status_name: "Planerad".into(),
        })
    }
}

pub fn row(id: &str, user: &str, start: &str, end: &str) -> PlannedWorkOrder {
    PlannedWorkOrder {
        id: id.to_string(),
        work_order_id: format!("WO-{id}"),
        name: format!("Montage {id}"),
        user_name: user.to_string(),
        production_start: NaiveDateTime::parse_from_str(start, "%Y-%m-%dT%H:%M:%S").unwrap(),
        production_end: NaiveDateTime::parse_from_str(end, "%Y-%m-%dT%H:%M:%S").unwrap(),
    }
}
