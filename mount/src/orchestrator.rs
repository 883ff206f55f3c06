use crate::config::MountConfig;
use crate::error::MountError;
use crate::serial;
use gdmount_helper::HelperClient;
use gdmount_params::Phase;
use gdmount_qmp::{BlockdevAddArgs, Command, DeviceAddArgs, QmpClient};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};

/// Terminal result of one mount request. Never retried for that request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountOutcome {
    /// The attach sequence ran; the payload is whatever the helper returned.
    Mounted { payload: String },
    /// The key was already mounted or in flight; nothing was done.
    AlreadyMounted,
    /// A before-phase directive suppressed the auto-mount.
    Skipped,
}

/// Owns the set of mounted keys and the collaborator clients. One instance
/// per process, injected into whoever handles launch events.
pub struct MountOrchestrator {
    config: MountConfig,
    helper: HelperClient,
    mounted: Mutex<HashSet<String>>,
}

impl MountOrchestrator {
    pub fn new(config: MountConfig) -> Result<Self, MountError> {
        let helper = HelperClient::new(&config.helper_host, config.helper_port)?;
        Ok(Self {
            config,
            helper,
            mounted: Mutex::new(HashSet::new()),
        })
    }

    /// Full pipeline for one launch: parse the parameter string, run the
    /// before-phase directives, attach the primary image, run the
    /// after-phase directives. A before-phase directive returning false
    /// suppresses the mount and the after phase entirely.
    pub async fn run(
        &self,
        identifier: &str,
        file_path: &Path,
        parameters: Option<&str>,
        is_docker: bool,
    ) -> Result<MountOutcome, MountError> {
        let directives = match parameters {
            Some(raw) => gdmount_params::parse(raw)?,
            None => Vec::new(),
        };
        if !self.run_phase(&directives, Phase::Before, is_docker).await? {
            tracing::debug!("auto-mount suppressed by a before-phase directive");
            return Ok(MountOutcome::Skipped);
        }
        let outcome = self.mount(identifier, file_path, is_docker).await?;
        self.run_phase(&directives, Phase::After, is_docker).await?;
        Ok(outcome)
    }

    /// Attach the primary image for `identifier`: at most one attach attempt
    /// per identifier for the life of this orchestrator, even if the attempt
    /// fails.
    pub async fn mount(
        &self,
        identifier: &str,
        file_path: &Path,
        is_docker: bool,
    ) -> Result<MountOutcome, MountError> {
        if !tokio::fs::try_exists(file_path).await? {
            return Err(MountError::DataNotPresent(file_path.to_path_buf()));
        }
        if !self.claim(identifier).await {
            tracing::debug!("{} already mounted, nothing to do", identifier);
            return Ok(MountOutcome::AlreadyMounted);
        }
        tracing::info!("mounting {}", file_path.display());
        let payload = if is_docker {
            self.helper.register(&base_name(file_path), None).await?
        } else {
            let device_serial = serial::identifier_serial(identifier)?;
            self.attach_racing_watchdog(file_path, &device_serial, None)
                .await?
        };
        tracing::info!("mount helper returned: {}", payload);
        Ok(MountOutcome::Mounted { payload })
    }

    /// Insert-if-absent on the mounted set. Must happen before any network
    /// I/O for the key; the set is never drained within a process lifetime.
    pub(crate) async fn claim(&self, key: &str) -> bool {
        self.mounted.lock().await.insert(key.to_string())
    }

    pub(crate) fn helper(&self) -> &HelperClient {
        &self.helper
    }

    /// Run the attach sequence with a watchdog loop alongside it. The
    /// watchdog never produces the outcome; it is aborted the moment the
    /// main task settles, and its only effect is the out-of-band nudge.
    pub(crate) async fn attach_racing_watchdog(
        &self,
        file_path: &Path,
        device_serial: &str,
        mount_point: Option<&str>,
    ) -> Result<String, MountError> {
        let watchdog = tokio::spawn(watchdog_loop(
            self.config.qmp_host.clone(),
            self.config.watchdog_port,
            self.config.poll_interval,
            self.config.nudge_threshold,
        ));
        let main_task = self.attach_sequence(file_path, device_serial, mount_point);
        let result = match self.config.deadline {
            Some(deadline) => match timeout(deadline, main_task).await {
                Ok(result) => result,
                Err(_) => Err(MountError::DeadlineExceeded),
            },
            None => main_task.await,
        };
        watchdog.abort();
        result
    }

    /// The main task: block node, virtio front-end, close, then tell the
    /// helper which serial to look for.
    async fn attach_sequence(
        &self,
        file_path: &Path,
        device_serial: &str,
        mount_point: Option<&str>,
    ) -> Result<String, MountError> {
        let tag = serial::device_tag();
        let mut qmp = QmpClient::connect(&self.config.qmp_host, self.config.qmp_port).await?;
        qmp.execute(&Command::BlockdevAdd(BlockdevAddArgs::raw_file(
            &tag,
            &file_path.to_string_lossy(),
        )))
        .await?;
        qmp.execute(&Command::DeviceAdd(DeviceAddArgs::virtio_blk(
            &tag,
            device_serial,
        )))
        .await?;
        qmp.close().await?;
        let payload = self.helper.register(device_serial, mount_point).await?;
        Ok(payload)
    }
}

pub(crate) fn base_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}

/// Poll until aborted. Once the poll count passes the threshold, nudge the
/// secondary endpoint on every further pass; nudges are awaited, so at most
/// one is in flight. A failed nudge only means the control plane is not
/// answering there either, which is worth a warning but never a mount
/// failure.
async fn watchdog_loop(host: String, port: u16, poll_interval: Duration, threshold: u32) {
    let mut polls: u32 = 0;
    loop {
        sleep(poll_interval).await;
        polls += 1;
        if polls > threshold {
            if let Err(err) = gdmount_qmp::nudge(&host, port).await {
                tracing::warn!("control plane appears unresponsive, nudge failed: {}", err);
            }
        }
    }
}
