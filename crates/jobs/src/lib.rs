use api::ProjectApi;
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::{sync::Arc, thread, time::Duration};
use thiserror::Error;
use timeline::AtvTaskDto;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("poll runtime stopped")]
    Stopped,
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between two status requests for the same project.
    pub interval: Duration,
    /// Requests per watch before giving up.
    pub max_attempts: u32,
    pub workers: usize,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(2), max_attempts: 150, workers: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PollStatus {
    Pending,
    Fetched(AtvTaskDto),
    Failed(String),
    /// A terminal status was fetched.
    Finished,
    /// `max_attempts` requests went by without a terminal status.
    Exhausted,
    Canceled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollEvent {
    pub job_id: String,
    pub project_id: String,
    pub status: PollStatus,
}

type Watch = (String, String); // (job id, project id)

#[derive(Clone)]
pub struct PollHandle {
    tx_submit: Sender<Watch>,
    tx_cancel: Sender<String>,
    pub rx_events: Receiver<PollEvent>,
    shared: Arc<Shared>,
}

struct Shared {
    api: Arc<dyn ProjectApi>,
    config: PollConfig,
    queue: Mutex<VecDeque<Watch>>,
    canceled: Mutex<HashSet<String>>,
    stopped: AtomicBool,
    tx_events: Sender<PollEvent>,
}

impl Shared {
    fn emit(&self, id: &str, project_id: &str, status: PollStatus) {
        let _ = self.tx_events.send(PollEvent { job_id: id.to_string(), project_id: project_id.to_string(), status });
    }

    fn is_canceled(&self, id: &str) -> bool {
        self.canceled.lock().contains(id)
    }

    /// Report a canceled watch and forget its id.
    fn emit_canceled(&self, id: &str, project_id: &str) {
        self.canceled.lock().remove(id);
        self.emit(id, project_id, PollStatus::Canceled);
    }

    /// Sleep one interval in short slices so cancellation is noticed quickly.
    fn wait(&self, id: &str) -> bool {
        let slice = Duration::from_millis(10).min(self.config.interval);
        let mut waited = Duration::ZERO;
        while waited < self.config.interval {
            if self.is_canceled(id) {
                return false;
            }
            thread::sleep(slice);
            waited += slice;
        }
        !self.is_canceled(id)
    }

    fn run(&self, id: &str, project_id: &str) {
        for attempt in 1..=self.config.max_attempts {
            if self.is_canceled(id) {
                self.emit_canceled(id, project_id);
                return;
            }
            match self.api.get_project_status(project_id) {
                Ok(task) => {
                    let terminal = task.status.as_ref().is_some_and(|s| s.is_terminal());
                    debug!(project_id, attempt, status = ?task.status, "status fetched");
                    self.emit(id, project_id, PollStatus::Fetched(task));
                    if terminal {
                        self.emit(id, project_id, PollStatus::Finished);
                        return;
                    }
                }
                Err(e) => {
                    warn!(project_id, attempt, error = %e, "status request failed");
                    self.emit(id, project_id, PollStatus::Failed(e.to_string()));
                }
            }
            if attempt < self.config.max_attempts && !self.wait(id) {
                self.emit_canceled(id, project_id);
                return;
            }
        }
        self.emit(id, project_id, PollStatus::Exhausted);
    }
}

/// Background status polling. Results only ever leave through `rx_events`;
/// the caller decides what to dispatch.
pub struct PollRuntime;

impl PollRuntime {
    pub fn start(api: Arc<dyn ProjectApi>, config: PollConfig) -> PollHandle {
        let (tx_submit, rx_submit) = unbounded::<Watch>();
        let (tx_cancel, rx_cancel) = unbounded::<String>();
        let (tx_events, rx_events) = unbounded::<PollEvent>();
        let workers = config.workers.max(1);
        let shared = Arc::new(Shared {
            api,
            config,
            queue: Mutex::new(VecDeque::new()),
            canceled: Mutex::new(HashSet::new()),
            stopped: AtomicBool::new(false),
            tx_events,
        });

        for _ in 0..workers {
            Self::spawn_worker(shared.clone());
        }

        // Feeder thread
        {
            let shared = shared.clone();
            thread::spawn(move || {
                loop {
                    crossbeam_channel::select! {
                        recv(rx_submit) -> msg => {
                            if let Ok((id, project_id)) = msg {
                                if shared.is_canceled(&id) {
                                    shared.emit_canceled(&id, &project_id);
                                    continue;
                                }
                                shared.queue.lock().push_back((id.clone(), project_id.clone()));
                                shared.emit(&id, &project_id, PollStatus::Pending);
                            }
                            else { break; }
                        }
                        recv(rx_cancel) -> msg => {
                            if let Ok(id) = msg { shared.canceled.lock().insert(id); }
                            else { break; }
                        }
                        default(Duration::from_millis(10)) => {}
                    }
                }
                shared.stopped.store(true, Ordering::Release);
            });
        }

        PollHandle { tx_submit, tx_cancel, rx_events, shared }
    }

    fn spawn_worker(shared: Arc<Shared>) {
        thread::spawn(move || loop {
            let next = {
                let mut queue = shared.queue.lock();
                let mut found = None;
                while let Some((id, project_id)) = queue.pop_front() {
                    if shared.is_canceled(&id) {
                        shared.emit_canceled(&id, &project_id);
                        continue;
                    }
                    found = Some((id, project_id));
                    break;
                }
                found
            };
            match next {
                Some((id, project_id)) => shared.run(&id, &project_id),
                None if shared.stopped.load(Ordering::Acquire) => break,
                None => thread::sleep(Duration::from_millis(10)),
            }
        });
    }
}

impl PollHandle {
    /// Start polling `project_id`; returns the watch id used in events.
    pub fn watch(&self, project_id: &str) -> Result<String, JobError> {
        let id = Uuid::new_v4().to_string();
        self.tx_submit.send((id.clone(), project_id.to_string())).map_err(|_| JobError::Stopped)?;
        Ok(id)
    }

    pub fn cancel(&self, id: &str) {
        let _ = self.tx_cancel.send(id.to_string());
    }

    /// Cancel requests not yet picked up by a worker.
    pub fn pending_cancellations(&self) -> usize {
        self.shared.canceled.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::MemoryProjectApi;
    use timeline::TaskStatus;

    fn task(status: TaskStatus) -> AtvTaskDto {
        AtvTaskDto { status: Some(status), ..Default::default() }
    }

    fn fast() -> PollConfig {
        PollConfig { interval: Duration::from_millis(1), max_attempts: 20, workers: 1 }
    }

    fn collect_until_final(handle: &PollHandle) -> Vec<PollStatus> {
        let mut out = Vec::new();
        while let Ok(ev) = handle.rx_events.recv_timeout(Duration::from_secs(5)) {
            let done = matches!(ev.status, PollStatus::Finished | PollStatus::Exhausted | PollStatus::Canceled);
            out.push(ev.status);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn polls_until_terminal_status() {
        let api = Arc::new(MemoryProjectApi::new());
        api.script_statuses("p1", [task(TaskStatus::InProgress), task(TaskStatus::InProgress), task(TaskStatus::Error)]);
        let handle = PollRuntime::start(api.clone(), fast());
        handle.watch("p1").unwrap();
        let events = collect_until_final(&handle);
        assert_eq!(events.first(), Some(&PollStatus::Pending));
        assert_eq!(events.last(), Some(&PollStatus::Finished));
        assert!(events.contains(&PollStatus::Fetched(task(TaskStatus::Error))));
        assert_eq!(api.status_calls(), 3);
    }

    #[test]
    fn gives_up_after_max_attempts() {
        let api = Arc::new(MemoryProjectApi::new());
        api.script_statuses("p1", [task(TaskStatus::InProgress)]);
        let handle = PollRuntime::start(api.clone(), PollConfig { max_attempts: 3, ..fast() });
        handle.watch("p1").unwrap();
        assert_eq!(collect_until_final(&handle).last(), Some(&PollStatus::Exhausted));
        assert_eq!(api.status_calls(), 3);
    }

    #[test]
    fn request_errors_are_reported_and_polling_continues() {
        let api = Arc::new(MemoryProjectApi::new());
        let handle = PollRuntime::start(api, PollConfig { max_attempts: 2, ..fast() });
        handle.watch("missing").unwrap();
        let events = collect_until_final(&handle);
        let failures = events.iter().filter(|s| matches!(s, PollStatus::Failed(_))).count();
        assert_eq!(failures, 2);
        assert_eq!(events.last(), Some(&PollStatus::Exhausted));
    }

    #[test]
    fn cancel_stops_a_running_watch() {
        let api = Arc::new(MemoryProjectApi::new());
        api.script_statuses("p1", [task(TaskStatus::InProgress)]);
        let config = PollConfig { interval: Duration::from_millis(50), max_attempts: 1000, workers: 1 };
        let handle = PollRuntime::start(api, config);
        let id = handle.watch("p1").unwrap();
        // wait for the first reply so the watch is running
        loop {
            let ev = handle.rx_events.recv_timeout(Duration::from_secs(5)).unwrap();
            if matches!(ev.status, PollStatus::Fetched(_)) {
                break;
            }
        }
        handle.cancel(&id);
        assert_eq!(collect_until_final(&handle).last(), Some(&PollStatus::Canceled));
        assert_eq!(handle.pending_cancellations(), 0);
    }
}
