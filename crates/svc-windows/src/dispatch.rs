//! SCM run loop. The dispatcher calls back into a bare `extern "system"`
//! entry point, so the handler reaches it through a process-wide slot that is
//! filled exactly once before the dispatcher starts.

use std::ffi::OsString;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info, warn};
use windows_service::define_windows_service;
use windows_service::service::{
    ServiceControlAccept, ServiceExitCode, ServiceState, ServiceStatus, ServiceType,
};
use windows_service::service_control_handler::{
    self, ServiceControlHandlerResult, ServiceStatusHandle,
};
use windows_service::service_dispatcher;

use svc_platform::control::{AcceptedControls, ControlEvent};
use svc_platform::work::ServiceHandler;

/// ERROR_FAILED_SERVICE_CONTROLLER_CONNECT: not launched by the SCM
const NOT_UNDER_SCM: i32 = 1063;

struct Registration {
    name: String,
    handler: Arc<dyn ServiceHandler>,
    accepted: AcceptedControls,
    stop_timeout: Duration,
}

static REGISTRATION: OnceLock<Registration> = OnceLock::new();
static OUTCOME: Mutex<Option<anyhow::Error>> = Mutex::new(None);

define_windows_service!(ffi_service_main, service_main);

pub fn run(
    name: &str,
    handler: Arc<dyn ServiceHandler>,
    accepted: AcceptedControls,
    stop_timeout: Duration,
) -> Result<()> {
    let registration = Registration {
        name: name.to_string(),
        handler: handler.clone(),
        accepted,
        stop_timeout,
    };
    if REGISTRATION.set(registration).is_err() {
        anyhow::bail!("service run loop already started in this process");
    }

    match service_dispatcher::start(name, ffi_service_main) {
        Ok(()) => take_outcome(),
        Err(windows_service::Error::Winapi(ref io)) if io.raw_os_error() == Some(NOT_UNDER_SCM) => {
            info!("not started by the service control manager, running interactively");
            run_interactive(handler)
        }
        Err(e) => Err(e).context("failed to start service dispatcher"),
    }
}

fn take_outcome() -> Result<()> {
    let outcome = OUTCOME
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .take();
    match outcome {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn service_main(_arguments: Vec<OsString>) {
    let Some(registration) = REGISTRATION.get() else {
        return;
    };
    if let Err(e) = run_service_inner(registration) {
        error!("service terminated with error: {:#}", e);
        *OUTCOME.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(e);
    }
}

fn run_service_inner(reg: &Registration) -> Result<()> {
    let (stop_tx, stop_rx) = mpsc::channel::<()>();

    let handler = reg.handler.clone();
    let status_handle = service_control_handler::register(&reg.name, move |control| {
        let event = ControlEvent::from_raw(control.raw_service_control_type());
        handler.on_control(event);
        if event.is_terminal() {
            let _ = stop_tx.send(());
        }
        ServiceControlHandlerResult::NoError
    })
    .context("failed to register control handler")?;

    set_status(&status_handle, ServiceState::StartPending, reg, 1, Duration::from_secs(10), 0)?;

    if let Err(e) = reg.handler.on_start() {
        set_status(&status_handle, ServiceState::Stopped, reg, 0, Duration::default(), 1)?;
        return Err(e);
    }

    set_status(&status_handle, ServiceState::Running, reg, 0, Duration::default(), 0)?;

    // A closed channel means the control handler was dropped; treat it as a stop
    let _ = stop_rx.recv();

    set_status(&status_handle, ServiceState::StopPending, reg, 1, reg.stop_timeout, 0)?;
    let stopped = reg.handler.on_stop();
    set_status(&status_handle, ServiceState::Stopped, reg, 0, Duration::default(), 0)?;
    stopped
}

fn set_status(
    status_handle: &ServiceStatusHandle,
    state: ServiceState,
    reg: &Registration,
    checkpoint: u32,
    wait_hint: Duration,
    specific_exit_code: u32,
) -> Result<()> {
    let controls_accepted = match state {
        ServiceState::Running => {
            ServiceControlAccept::STOP
                | ServiceControlAccept::SHUTDOWN
                | ServiceControlAccept::from_bits_truncate(reg.accepted.bits())
        }
        _ => ServiceControlAccept::empty(),
    };
    let exit_code = if specific_exit_code == 0 {
        ServiceExitCode::Win32(0)
    } else {
        ServiceExitCode::ServiceSpecific(specific_exit_code)
    };

    let status = ServiceStatus {
        service_type: ServiceType::OWN_PROCESS,
        current_state: state,
        controls_accepted,
        exit_code,
        checkpoint,
        wait_hint,
        process_id: None,
    };
    status_handle
        .set_service_status(status)
        .context("failed to report service status")?;
    Ok(())
}

fn run_interactive(handler: Arc<dyn ServiceHandler>) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build console runtime")?;

    runtime.block_on(async move {
        handler.on_start()?;
        info!("running in console, press Ctrl+C to stop");

        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to wait for Ctrl+C: {}", e);
        }
        handler.on_control(ControlEvent::Stop);
        handler.on_stop()
    })
}
