// src/driver.rs

//! Drive loops connecting the Master to its workers
//!
//! The Master is a single-threaded decision engine; workers only ever touch
//! it through two serialized boundary operations, take-a-job and
//! return-a-result. The serial loop below is the reference embedding; the
//! parallel loop runs N OS threads against one mutex-guarded Master with a
//! condvar for the "nothing ready but work in flight" case.

use crate::job::{Job, JobResult};
use crate::master::{FailureReport, Master};
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};

/// Executes one job and returns its result
pub trait Worker: Send + Sync {
    fn execute(&self, job: &Job) -> JobResult;
}

impl<F> Worker for F
where
    F: Fn(&Job) -> JobResult + Send + Sync,
{
    fn execute(&self, job: &Job) -> JobResult {
        self(job)
    }
}

/// Single-threaded cooperative drive loop
///
/// Takes ready jobs, executes them in order, feeds results back, and stops
/// when the pipeline is quiescent. Returns the terminal failure report.
pub fn drive(master: &mut Master, worker: &dyn Worker) -> Option<FailureReport> {
    loop {
        let jobs = master.get_job();
        if jobs.is_empty() {
            // Serial: every handed-out job already completed, so empty
            // means quiescent.
            break;
        }
        for job in jobs {
            let result = worker.execute(&job);
            master.register_result(result);
        }
    }
    master.fail()
}

struct DriveState {
    master: Master,
    queue: VecDeque<Job>,
    done: bool,
}

/// Multi-threaded drive loop
///
/// `threads` workers share the Master behind a single mutex. A worker with
/// nothing to do parks on the condvar until a result lands or the run ends.
/// Results may arrive in any order; stage monotonicity and job dedup make
/// that safe.
pub fn drive_parallel(
    master: Master,
    worker: Arc<dyn Worker>,
    threads: usize,
) -> (Master, Option<FailureReport>) {
    let state = Arc::new((
        Mutex::new(DriveState {
            master,
            queue: VecDeque::new(),
            done: false,
        }),
        Condvar::new(),
    ));

    std::thread::scope(|scope| {
        for _ in 0..threads.max(1) {
            let state = Arc::clone(&state);
            let worker = Arc::clone(&worker);
            scope.spawn(move || {
                let (lock, cond) = (&state.0, &state.1);
                loop {
                    let job = {
                        let mut guard = lock.lock().expect("driver state poisoned");
                        loop {
                            if guard.done {
                                return;
                            }
                            if let Some(job) = guard.queue.pop_front() {
                                break job;
                            }
                            let batch = guard.master.get_job();
                            if !batch.is_empty() {
                                guard.queue.extend(batch);
                                cond.notify_all();
                                continue;
                            }
                            if guard.master.in_flight() == 0 {
                                guard.done = true;
                                cond.notify_all();
                                return;
                            }
                            guard = cond.wait(guard).expect("driver state poisoned");
                        }
                    };

                    let result = worker.execute(&job);

                    let mut guard = lock.lock().expect("driver state poisoned");
                    guard.master.register_result(result);
                    cond.notify_all();
                }
            });
        }
    });

    let (lock, _) = Arc::try_unwrap(state)
        .unwrap_or_else(|_| panic!("worker threads still hold the driver state"));
    let mut state = lock.into_inner().expect("driver state poisoned");
    let report = state.master.fail();
    (state.master, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MasterConfig;
    use crate::job::JobSpec;

    #[test]
    fn test_drive_with_no_work_terminates() {
        let mut master = Master::new(MasterConfig::default());
        let worker = |job: &Job| JobResult::failure(job, "unreachable");
        let report = drive(&mut master, &worker);
        assert!(report.is_none());
    }

    #[test]
    fn test_parallel_drive_with_no_work_terminates() {
        let master = Master::new(MasterConfig::default());
        let worker: Arc<dyn Worker> =
            Arc::new(|job: &Job| JobResult::failure(job, "unreachable"));
        let (master, report) = drive_parallel(master, worker, 4);
        assert!(report.is_none());
        assert_eq!(master.installed_count(), 0);
    }

    #[test]
    fn test_failed_resolve_is_sticky() {
        let mut master = Master::new(MasterConfig::default());
        master.add_job(Job::new(JobSpec::Resolve {
            package: "Broken.Module".to_string(),
            range: crate::version::VersionRange::any(),
            reinstall: false,
            features: Vec::new(),
            git: None,
            git_ref: None,
        }));

        let worker = |job: &Job| JobResult::failure(job, "mirror unreachable");
        let report = drive(&mut master, &worker).expect("failure expected");
        assert_eq!(report.resolve_failures, ["Broken.Module"]);
    }
}
