//! Install-state tracking and capability probes.
//!
//! The host's feature detection is collapsed into a `Capabilities`
//! value probed once at startup, and the install state lives in an
//! explicitly constructed `InstallMonitor` that interested parties
//! subscribe to. No module-level mutable state.

use tokio::sync::broadcast;
use tracing::debug;

/// Channel capacity for install events; a slow subscriber only misses
/// old events, never corrupts state.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Named capability checks, evaluated once.
#[derive(Debug, Clone, Copy)]
pub struct Capabilities {
    pub service_worker: bool,
    pub install_prompt: bool,
    pub background_sync: bool,
    pub standalone_display: bool,
}

impl Capabilities {
    /// Probe the environment once at startup. Each capability can be
    /// forced off (or on) through a SITECACHE_CAP_* variable.
    pub fn probe() -> Self {
        let caps = Self {
            service_worker: env_flag("SITECACHE_CAP_SERVICE_WORKER", true),
            install_prompt: env_flag("SITECACHE_CAP_INSTALL_PROMPT", true),
            background_sync: env_flag("SITECACHE_CAP_BACKGROUND_SYNC", true),
            standalone_display: env_flag("SITECACHE_CAP_STANDALONE", false),
        };
        debug!(?caps, "Probed capabilities");
        caps
    }

    /// Supported means the worker machinery itself is available.
    pub fn supported(&self) -> bool {
        self.service_worker
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(v) => matches!(v.as_str(), "1" | "true" | "yes"),
        Err(_) => default,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstallState {
    pub supported: bool,
    pub installable: bool,
    pub installed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallEvent {
    Installable,
    Installed,
}

/// Owner of the install state. Constructed where it is needed and
/// passed down; components react to transitions via `subscribe`.
pub struct InstallMonitor {
    state: InstallState,
    events: broadcast::Sender<InstallEvent>,
}

impl InstallMonitor {
    pub fn new(capabilities: Capabilities) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: InstallState {
                supported: capabilities.supported(),
                installable: false,
                // Standalone display means the app is already running
                // installed.
                installed: capabilities.standalone_display,
            },
            events,
        }
    }

    pub fn state(&self) -> InstallState {
        self.state
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InstallEvent> {
        self.events.subscribe()
    }

    /// An install prompt was captured; the app can now be installed.
    pub fn prompt_captured(&mut self) {
        if self.state.installed || !self.state.supported {
            return;
        }
        self.state.installable = true;
        // Send fails only when nobody is subscribed, which is fine.
        let _ = self.events.send(InstallEvent::Installable);
    }

    /// The app was installed; the prompt is consumed.
    pub fn installed(&mut self) {
        self.state.installed = true;
        self.state.installable = false;
        let _ = self.events.send(InstallEvent::Installed);
    }
}
