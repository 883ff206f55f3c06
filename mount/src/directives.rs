use crate::error::MountError;
use crate::orchestrator::{MountOrchestrator, base_name};
use crate::serial;
use gdmount_params::{Directive, GrammarError, Phase, lookup};
use std::path::Path;

impl MountOrchestrator {
    /// Run every directive whose phase matches, in source order. The whole
    /// list is validated against the directive table before any effect runs,
    /// so a malformed directive can't land halfway through. Returns false
    /// when a before-phase directive aborts the pipeline.
    pub(crate) async fn run_phase(
        &self,
        directives: &[Directive],
        phase: Phase,
        is_docker: bool,
    ) -> Result<bool, MountError> {
        for directive in directives {
            let spec = lookup(&directive.keyword)
                .ok_or_else(|| GrammarError::UnknownKeyword(directive.keyword.clone()))?;
            if directive.args.len() != spec.arity {
                return Err(GrammarError::Arity {
                    keyword: directive.keyword.clone(),
                    expected: spec.arity,
                    found: directive.args.len(),
                }
                .into());
            }
        }
        for directive in directives {
            if directive.phase != phase {
                continue;
            }
            if !self.run_directive(directive, is_docker).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    async fn run_directive(
        &self,
        directive: &Directive,
        is_docker: bool,
    ) -> Result<bool, MountError> {
        match directive.keyword.as_str() {
            // The caller wants the data extracted, not attached: abort the
            // auto-mount for this request.
            "extract" => Ok(false),
            "extra" => {
                self.mount_extra(&directive.args[0], &directive.args[1], is_docker)
                    .await
            }
            other => Err(GrammarError::UnknownKeyword(other.to_string()).into()),
        }
    }

    /// Attach an auxiliary volume alongside the primary image. Deduplicated
    /// by the auxiliary path; the serial comes from a digest of the path so
    /// the guest sees a stable tag for the same file.
    async fn mount_extra(
        &self,
        path: &str,
        mount_point: &str,
        is_docker: bool,
    ) -> Result<bool, MountError> {
        if !self.claim(path).await {
            return Ok(true);
        }
        tracing::info!("mounting {}", path);
        let payload = if is_docker {
            self.helper()
                .register(&base_name(Path::new(path)), Some(mount_point))
                .await?
        } else {
            let device_serial = serial::content_serial(path);
            self.attach_racing_watchdog(Path::new(path), &device_serial, Some(mount_point))
                .await?
        };
        tracing::info!("mount helper returned: {}", payload);
        Ok(true)
    }
}
