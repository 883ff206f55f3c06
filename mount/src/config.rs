use std::time::Duration;

/// Endpoints and watchdog tuning for one orchestrator instance.
#[derive(Debug, Clone)]
pub struct MountConfig {
    /// Control plane host, shared by the primary and watchdog endpoints.
    pub qmp_host: String,
    /// Primary control plane port.
    pub qmp_port: u16,
    /// Secondary port used only for watchdog nudges.
    pub watchdog_port: u16,
    /// Mount helper host.
    pub helper_host: String,
    /// Mount helper port.
    pub helper_port: u16,
    /// How long the watchdog loop sleeps between polls.
    pub poll_interval: Duration,
    /// How many polls may elapse before nudging begins.
    pub nudge_threshold: u32,
    /// Hard deadline for one attach sequence. Off unless configured.
    pub deadline: Option<Duration>,
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            qmp_host: "127.0.0.1".to_string(),
            qmp_port: 4444,
            watchdog_port: 4445,
            helper_host: "127.0.0.1".to_string(),
            helper_port: 22500,
            poll_interval: Duration::from_millis(20),
            nudge_threshold: 10,
            deadline: None,
        }
    }
}
