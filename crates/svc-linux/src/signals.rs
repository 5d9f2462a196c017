//! Signal-driven run loop: the init system talks to a running service through
//! signals, which are translated into control events.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::{debug, info};

use svc_platform::control::ControlEvent;
use svc_platform::work::ServiceHandler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceSignal {
    Terminate,
    Interrupt,
    Hangup,
    Quit,
}

impl ServiceSignal {
    pub fn event(self) -> ControlEvent {
        match self {
            Self::Terminate | Self::Interrupt => ControlEvent::Stop,
            Self::Hangup => ControlEvent::ParamChange,
            Self::Quit => ControlEvent::Shutdown,
        }
    }
}

struct Listeners {
    terminate: Signal,
    interrupt: Signal,
    hangup: Signal,
    quit: Signal,
}

impl Listeners {
    fn install() -> Result<Self> {
        Ok(Self {
            terminate: signal(SignalKind::terminate()).context("failed to listen for SIGTERM")?,
            interrupt: signal(SignalKind::interrupt()).context("failed to listen for SIGINT")?,
            hangup: signal(SignalKind::hangup()).context("failed to listen for SIGHUP")?,
            quit: signal(SignalKind::quit()).context("failed to listen for SIGQUIT")?,
        })
    }

    async fn next(&mut self) -> ServiceSignal {
        tokio::select! {
            _ = self.terminate.recv() => ServiceSignal::Terminate,
            _ = self.interrupt.recv() => ServiceSignal::Interrupt,
            _ = self.hangup.recv() => ServiceSignal::Hangup,
            _ = self.quit.recv() => ServiceSignal::Quit,
        }
    }
}

/// Block the calling thread until a terminal signal arrives.
pub fn run_until_stopped(handler: Arc<dyn ServiceHandler>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build signal runtime")?;

    runtime.block_on(async move {
        // Listen before starting so an early SIGTERM is not lost
        let mut listeners = Listeners::install()?;
        handler.on_start()?;

        loop {
            let sig = listeners.next().await;
            let event = sig.event();
            debug!(signal = ?sig, %event, "signal received");
            handler.on_control(event);
            if event.is_terminal() {
                info!("received {:?}, stopping", sig);
                break;
            }
        }

        handler.on_stop()
    })
}
