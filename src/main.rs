//! Entry point for the **snapgrd** daemon.
//!
//! Builds a headless window system from the configured displays, spawns the
//! Unix-socket listener on a background thread and feeds incoming messages
//! to the [`SnapGroupController`] on the main thread.

use snapgrd::config::Config;
use snapgrd::controller::SnapGroupController;
use snapgrd::event::ExitPoint;
use snapgrd::host::headless::HeadlessWindowSystem;
use snapgrd::ipc::listener::UnixSocketListener;
use snapgrd::ipc::Message;
use snapgrd::traits::{EventSource, GroupEvent};
use log::{debug, error, info, warn};
use std::sync::mpsc;

/// Default socket path for the listener.
fn default_socket_path() -> String {
    let runtime = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into());
    format!("{}/snapgrd.sock", runtime)
}

/// Resolve the config directory (`$XDG_CONFIG_HOME/snapgrd`).
fn config_dir() -> std::path::PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    std::path::PathBuf::from(base).join("snapgrd")
}

/// Try to load the config from `$XDG_CONFIG_HOME/snapgrd/config.json`,
/// falling back to compiled-in defaults.
fn load_config() -> Config {
    let path = config_dir().join("config.json");
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no usable config file ({}), using defaults", e);
            Config::default()
        }
    }
}

//  Main

fn main() {
    env_logger::init();

    let config = load_config();

    let host = HeadlessWindowSystem::new();
    for work_area in &config.headless.displays {
        let display = host.add_display(*work_area);
        match host.add_desk(display) {
            Ok(desk) => info!("display {} {:?} with desk {}", display, work_area, desk),
            Err(e) => {
                error!("failed to set up display {}: {}", display, e);
                std::process::exit(1);
            }
        }
    }

    let mut controller = SnapGroupController::new(host, config.snap_groups.clone());

    let (event_tx, event_rx) = mpsc::channel::<GroupEvent>();
    controller.set_event_channel(event_tx);
    spawn_telemetry_logger(event_rx);

    let (msg_tx, msg_rx) = mpsc::channel::<Message>();
    spawn_event_sources(msg_tx);

    run_event_loop(&mut controller, msg_rx);
}

//  Event loop

fn run_event_loop(
    controller: &mut SnapGroupController<HeadlessWindowSystem>,
    msg_rx: mpsc::Receiver<Message>,
) {
    info!("snapgrd running");
    for message in msg_rx {
        let events = match message {
            Message::Host(command) => match controller.window_system().apply(command) {
                Ok(events) => events,
                Err(e) => {
                    error!("host command error: {}", e);
                    continue;
                }
            },
            Message::Shell(event) => vec![event],
        };
        for event in events {
            match controller.handle(event) {
                Ok(()) => {}
                Err(e) if e.is_rejection() => debug!("rejected: {}", e),
                Err(e) => warn!("event error: {}", e),
            }
        }
        controller.flush_pending_releases();
    }
    controller.remove_all(ExitPoint::Shutdown);
    controller.flush_pending_releases();
    info!("all event sources closed, exiting");
}

//  Helpers

fn spawn_event_sources(tx: mpsc::Sender<Message>) {
    let path = default_socket_path();
    std::thread::spawn(move || {
        let mut source = UnixSocketListener::new(&path);
        if let Err(e) = source.run(tx) {
            error!("socket listener error: {}", e);
        }
    });
}

fn spawn_telemetry_logger(rx: mpsc::Receiver<GroupEvent>) {
    std::thread::spawn(move || {
        for event in rx {
            match event {
                GroupEvent::Removed {
                    group,
                    reason,
                    lifetime: Some(lifetime),
                } => info!("{} lived {:.1}s, removed: {}", group, lifetime.as_secs_f64(), reason),
                other => debug!("{:?}", other),
            }
        }
    });
}
