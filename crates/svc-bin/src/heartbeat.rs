//! Example work unit: a background thread that reports it is alive.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Mutex;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::debug;

use svc_platform::work::{ServiceContext, WorkUnit};

const JOIN_POLL: Duration = Duration::from_millis(10);

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

pub struct HeartbeatWork {
    interval: Duration,
    worker: Mutex<Option<Worker>>,
}

impl HeartbeatWork {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            worker: Mutex::new(None),
        }
    }
}

impl WorkUnit for HeartbeatWork {
    fn start(&self, ctx: &ServiceContext) -> Result<()> {
        let mut worker = self.worker.lock().unwrap_or_else(|p| p.into_inner());
        if worker.is_some() {
            anyhow::bail!("heartbeat already running");
        }

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let interval = self.interval;
        let logger = ctx.logger.clone();

        let handle = std::thread::Builder::new()
            .name("heartbeat".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => logger.info("Service still running"),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })
            .context("failed to spawn heartbeat thread")?;

        *worker = Some(Worker { stop_tx, handle });
        Ok(())
    }

    fn stop(&self, _ctx: &ServiceContext) -> Result<()> {
        let worker = self.worker.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(w) = worker.as_ref() {
            // Receiver gone means the thread already exited
            let _ = w.stop_tx.send(());
        }
        Ok(())
    }

    fn shutdown(&self, grace: Duration) -> Result<()> {
        let Some(worker) = self.worker.lock().unwrap_or_else(|p| p.into_inner()).take() else {
            return Ok(());
        };

        let deadline = Instant::now() + grace;
        while !worker.handle.is_finished() {
            if Instant::now() >= deadline {
                anyhow::bail!("heartbeat thread still running after {:?}", grace);
            }
            std::thread::sleep(JOIN_POLL);
        }

        worker
            .handle
            .join()
            .map_err(|_| anyhow::anyhow!("heartbeat thread panicked"))?;
        debug!("heartbeat thread joined");
        Ok(())
    }
}
