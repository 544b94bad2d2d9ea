use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info, warn};

use crate::app::{HarvestError, Result};
use crate::domain::{JobStatus, ListingRecord, SearchParams};
use crate::scraper::chrome::BrowserSession;
use crate::scraper::config::HarvestSettings;
use crate::scraper::progress::{CancelFlag, StatusSink};
use crate::scraper::{harvest, HarvestReport};

/// Opens a page driver, runs a harvest on it and releases it again.
#[async_trait]
pub trait DriverFactory: Send + Sync {
    async fn run(
        &self,
        settings: &HarvestSettings,
        params: &SearchParams,
        sink: &dyn StatusSink,
        cancel: &CancelFlag,
    ) -> Result<HarvestReport>;
}

/// Launches a fresh Chrome for every job.
pub struct ChromeFactory;

#[async_trait]
impl DriverFactory for ChromeFactory {
    async fn run(
        &self,
        settings: &HarvestSettings,
        params: &SearchParams,
        sink: &dyn StatusSink,
        cancel: &CancelFlag,
    ) -> Result<HarvestReport> {
        sink.progress(5, "Launching browser...");
        let session = BrowserSession::launch(settings.scraper.clone()).await?;
        let result = harvest(&session, settings, params, sink, cancel).await;
        // Released on success, failure and cancellation alike
        session.close().await;
        result
    }
}

/// State of the current (or last) job.
#[derive(Debug, Clone, Default)]
pub struct JobState {
    pub status: JobStatus,
    pub params: Option<SearchParams>,
    pub results: Vec<ListingRecord>,
}

type SharedState = Arc<RwLock<JobState>>;

fn read(state: &SharedState) -> RwLockReadGuard<'_, JobState> {
    state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write(state: &SharedState) -> RwLockWriteGuard<'_, JobState> {
    state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Runs at most one harvest at a time on a background task.
pub struct JobManager {
    settings: Arc<HarvestSettings>,
    factory: Arc<dyn DriverFactory>,
    state: SharedState,
    running: Arc<AtomicBool>,
    cancel: Mutex<CancelFlag>,
}

impl JobManager {
    pub fn new(settings: HarvestSettings) -> Self {
        Self::with_factory(settings, Arc::new(ChromeFactory))
    }

    pub fn with_factory(settings: HarvestSettings, factory: Arc<dyn DriverFactory>) -> Self {
        Self {
            settings: Arc::new(settings),
            factory,
            state: Arc::new(RwLock::new(JobState::default())),
            running: Arc::new(AtomicBool::new(false)),
            cancel: Mutex::new(CancelFlag::new()),
        }
    }

    /// Start a job in the background and return immediately.
    ///
    /// Fails with [`HarvestError::JobAlreadyRunning`] while another job runs.
    /// Must be called from within a tokio runtime.
    pub fn start(&self, params: SearchParams) -> Result<()> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Rejected search: a job is already running");
            return Err(HarvestError::JobAlreadyRunning);
        }
        let guard = RunningGuard {
            running: self.running.clone(),
            state: self.state.clone(),
        };

        let cancel = CancelFlag::new();
        *self
            .cancel
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = cancel.clone();

        *write(&self.state) = JobState {
            status: JobStatus::started(Utc::now()),
            params: Some(params.clone()),
            results: Vec::new(),
        };

        info!(
            category = params.category.as_str(),
            location = params.location.as_str(),
            max_results = params.max_results,
            "Starting search job"
        );

        let sink = JobSink {
            state: self.state.clone(),
        };
        let factory = self.factory.clone();
        let settings = self.settings.clone();

        tokio::spawn(async move {
            let _guard = guard;
            let result = factory.run(&settings, &params, &sink, &cancel).await;
            sink.finish(result);
        });

        Ok(())
    }

    pub fn status(&self) -> JobStatus {
        read(&self.state).status.clone()
    }

    /// Parameters and accumulated records of the current or last job.
    pub fn results(&self) -> (Option<SearchParams>, Vec<ListingRecord>) {
        let state = read(&self.state);
        (state.params.clone(), state.results.clone())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask the running job to stop at its next checkpoint.
    pub fn cancel(&self) -> Result<()> {
        if !self.is_running() {
            return Err(HarvestError::NoJobRunning);
        }
        self.cancel
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .cancel();
        let mut state = write(&self.state);
        state.status.message = "Cancelling...".to_string();
        info!("Cancellation requested");
        Ok(())
    }
}

/// Clears the running flag on every exit path of the worker, panics included.
struct RunningGuard {
    running: Arc<AtomicBool>,
    state: SharedState,
}

impl Drop for RunningGuard {
    fn drop(&mut self) {
        let mut state = write(&self.state);
        if state.status.finished_at.is_none() {
            state.status.error = Some("Search worker stopped unexpectedly".to_string());
            state.status.finished_at = Some(Utc::now());
        }
        // Both flags flip under the write lock so a new start cannot interleave
        self.running.store(false, Ordering::SeqCst);
        state.status.is_running = false;
    }
}

/// Mirrors worker progress into the shared job state.
struct JobSink {
    state: SharedState,
}

impl JobSink {
    fn finish(&self, result: Result<HarvestReport>) {
        let mut state = write(&self.state);
        match result {
            Ok(report) => {
                let unique = report.records.len();
                state.status.progress = 100;
                state.status.total_found = report.total_found;
                state.status.unique_results = unique;
                state.status.message = if report.cancelled {
                    format!("Search cancelled. {} unique results kept.", unique)
                } else {
                    format!("Search complete! {} unique results found.", unique)
                };
                state.results = report.records;
                info!("{}", state.status.message);
            }
            Err(e) => {
                error!("Search failed: {}", e);
                state.status.error = Some(e.to_string());
                state.status.message = format!("Search failed: {}", e);
            }
        }
        state.status.finished_at = Some(Utc::now());
    }
}

impl StatusSink for JobSink {
    fn progress(&self, percent: u8, message: &str) {
        info!(percent, "{}", message);
        let mut state = write(&self.state);
        state.status.progress = percent;
        state.status.message = message.to_string();
    }

    fn candidates_found(&self, count: usize) {
        write(&self.state).status.total_found = count;
    }

    fn record_accepted(&self, record: &ListingRecord) {
        let mut state = write(&self.state);
        state.results.push(record.clone());
        state.status.unique_results = state.results.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::config::ServiceKeywords;
    use crate::scraper::fake::{self, place_url, FakeDriver, FakePage};
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Runs harvests against an in-memory driver, optionally holding until released.
    struct FakeFactory {
        links: usize,
        gate: Option<Arc<Notify>>,
        fail: bool,
    }

    impl FakeFactory {
        fn new(links: usize) -> Self {
            Self {
                links,
                gate: None,
                fail: false,
            }
        }
    }

    #[async_trait]
    impl DriverFactory for FakeFactory {
        async fn run(
            &self,
            settings: &HarvestSettings,
            params: &SearchParams,
            sink: &dyn StatusSink,
            cancel: &CancelFlag,
        ) -> Result<HarvestReport> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail {
                return Err(HarvestError::NoResultsFound(params.query("{category}")));
            }
            let links: Vec<String> = (0..self.links).map(|i| place_url(&i.to_string())).collect();
            let driver = FakeDriver::with_feed(vec![links.clone()]);
            for (i, link) in links.iter().enumerate() {
                driver.add_page(link, FakePage::listing(&format!("Shop {}", i), "addr", &i.to_string()));
            }
            harvest(&driver, settings, params, sink, cancel).await
        }
    }

    fn settings() -> HarvestSettings {
        HarvestSettings {
            scraper: fake::instant_config(),
            selectors: fake::selectors(),
            keywords: ServiceKeywords::default(),
        }
    }

    fn params() -> SearchParams {
        SearchParams::new(Some("bakery"), Some("Lisbon"), Some("10")).unwrap()
    }

    async fn wait_idle(manager: &JobManager) {
        for _ in 0..500 {
            if !manager.status().is_running && !manager.is_running() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job did not finish");
    }

    #[tokio::test]
    async fn test_job_completes_with_results() {
        let manager = JobManager::with_factory(settings(), Arc::new(FakeFactory::new(3)));
        manager.start(params()).unwrap();
        wait_idle(&manager).await;

        let status = manager.status();
        assert_eq!(status.progress, 100);
        assert_eq!(status.unique_results, 3);
        assert_eq!(status.total_found, 3);
        assert!(status.error.is_none());
        assert!(status.finished_at.is_some());

        let (params, results) = manager.results();
        assert_eq!(params.unwrap().category, "bakery");
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_second_start_rejected_while_running() {
        let gate = Arc::new(Notify::new());
        let factory = FakeFactory {
            links: 1,
            gate: Some(gate.clone()),
            fail: false,
        };
        let manager = JobManager::with_factory(settings(), Arc::new(factory));

        manager.start(params()).unwrap();
        assert!(manager.status().is_running);
        let err = manager.start(params()).unwrap_err();
        assert!(matches!(err, HarvestError::JobAlreadyRunning));

        gate.notify_one();
        wait_idle(&manager).await;
        // Free again once the first job is done
        gate.notify_one();
        assert!(manager.start(params()).is_ok());
        wait_idle(&manager).await;
    }

    #[tokio::test]
    async fn test_failure_recorded_in_status() {
        let factory = FakeFactory {
            links: 0,
            gate: None,
            fail: true,
        };
        let manager = JobManager::with_factory(settings(), Arc::new(factory));
        manager.start(params()).unwrap();
        wait_idle(&manager).await;

        let status = manager.status();
        assert!(!status.is_running);
        assert!(status.error.unwrap().contains("No results found"));
        assert!(manager.results().1.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_without_job() {
        let manager = JobManager::with_factory(settings(), Arc::new(FakeFactory::new(1)));
        assert!(matches!(manager.cancel(), Err(HarvestError::NoJobRunning)));
    }

    #[tokio::test]
    async fn test_cancel_running_job() {
        let gate = Arc::new(Notify::new());
        let factory = FakeFactory {
            links: 3,
            gate: Some(gate.clone()),
            fail: false,
        };
        let manager = JobManager::with_factory(settings(), Arc::new(factory));
        manager.start(params()).unwrap();

        manager.cancel().unwrap();
        gate.notify_one();
        wait_idle(&manager).await;

        let status = manager.status();
        assert!(status.error.is_none());
        assert!(status.message.contains("cancelled"));
        assert!(manager.results().1.is_empty());
    }

    #[tokio::test]
    async fn test_new_job_resets_previous_results() {
        let manager = JobManager::with_factory(settings(), Arc::new(FakeFactory::new(2)));
        manager.start(params()).unwrap();
        wait_idle(&manager).await;
        assert_eq!(manager.results().1.len(), 2);

        manager.start(params()).unwrap();
        let status = manager.status();
        assert!(status.unique_results <= 2);
        wait_idle(&manager).await;
        assert_eq!(manager.results().1.len(), 2);
    }

    #[test]
    fn test_guard_marks_abandoned_job() {
        let state: SharedState = Arc::new(RwLock::new(JobState {
            status: JobStatus::started(Utc::now()),
            ..Default::default()
        }));
        let running = Arc::new(AtomicBool::new(true));
        drop(RunningGuard {
            running: running.clone(),
            state: state.clone(),
        });

        assert!(!running.load(Ordering::SeqCst));
        let status = read(&state).status.clone();
        assert!(!status.is_running);
        assert!(status.error.is_some());
    }
}
