//! Background execution of forecast jobs with per-tenant mutual exclusion.
//!
//! A forecast run deletes then re-inserts the tenant's forecast set, so two
//! runs for one tenant must never overlap. [`TenantLocks`] tracks tenants
//! with a job in flight; the [`TenantGuard`] it hands out is moved into the
//! job task and releases the tenant when dropped, whatever the outcome.

use std::{
  collections::HashSet,
  sync::{Arc, Mutex, PoisonError},
};

use grapeiq_core::store::ForecastStore;
use grapeiq_forecast::{
  Clock, ForecastJob, ForecastSettings, JobOutcome, JobRequest, SystemClock,
};
use thiserror::Error;
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug, Error)]
#[error("a forecast job is already running for tenant {0}")]
pub struct AlreadyRunning(pub Uuid);

// ─── Locks ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct TenantLocks {
  in_flight: Arc<Mutex<HashSet<Uuid>>>,
}

impl TenantLocks {
  /// Claim `tenant_id`, or fail if a job already holds it.
  pub fn try_acquire(&self, tenant_id: Uuid) -> Result<TenantGuard, AlreadyRunning> {
    let mut set = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
    if !set.insert(tenant_id) {
      return Err(AlreadyRunning(tenant_id));
    }
    Ok(TenantGuard { locks: self.in_flight.clone(), tenant_id })
  }

  pub fn is_running(&self, tenant_id: Uuid) -> bool {
    self
      .in_flight
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .contains(&tenant_id)
  }
}

/// Held for the lifetime of one job run.
#[derive(Debug)]
pub struct TenantGuard {
  locks:     Arc<Mutex<HashSet<Uuid>>>,
  tenant_id: Uuid,
}

impl Drop for TenantGuard {
  fn drop(&mut self) {
    self
      .locks
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .remove(&self.tenant_id);
  }
}

// ─── Runner ──────────────────────────────────────────────────────────────────

/// Starts forecast jobs against a shared store.
pub struct JobRunner<S, C = SystemClock> {
  store:    Arc<S>,
  clock:    Arc<C>,
  settings: ForecastSettings,
  locks:    TenantLocks,
}

impl<S, C> Clone for JobRunner<S, C> {
  fn clone(&self) -> Self {
    Self {
      store:    self.store.clone(),
      clock:    self.clock.clone(),
      settings: self.settings,
      locks:    self.locks.clone(),
    }
  }
}

impl<S> JobRunner<S> {
  pub fn new(store: Arc<S>, settings: ForecastSettings) -> Self {
    Self::with_clock(store, Arc::new(SystemClock), settings)
  }
}

impl<S, C> JobRunner<S, C> {
  pub fn with_clock(store: Arc<S>, clock: Arc<C>, settings: ForecastSettings) -> Self {
    Self { store, clock, settings, locks: TenantLocks::default() }
  }

  pub fn locks(&self) -> &TenantLocks { &self.locks }
}

impl<S, C> JobRunner<S, C>
where
  S: ForecastStore + 'static,
  C: Clock + 'static,
{
  /// Start a job in the background and return immediately.
  pub fn spawn(&self, request: JobRequest) -> Result<JoinHandle<JobOutcome>, AlreadyRunning> {
    let guard = self.locks.try_acquire(request.tenant_id)?;
    let store = self.store.clone();
    let clock = self.clock.clone();
    let settings = self.settings;

    Ok(tokio::spawn(async move {
      let _guard = guard;
      ForecastJob::new(&*store, &*store, &*clock, settings)
        .run(request)
        .await
    }))
  }

  /// Run a job in the foreground, still honouring the tenant lock.
  pub async fn run(&self, request: JobRequest) -> Result<JobOutcome, AlreadyRunning> {
    let _guard = self.locks.try_acquire(request.tenant_id)?;
    Ok(
      ForecastJob::new(&*self.store, &*self.store, &*self.clock, self.settings)
        .run(request)
        .await,
    )
  }
}
