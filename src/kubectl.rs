use log::debug;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("kubectl create failed with exit code {0}")]
    Create(ExitStatus),

    #[error("kubectl replace failed with exit code {0}")]
    Replace(ExitStatus),

    #[error("kubectl delete failed with exit code {0}")]
    Delete(ExitStatus),

    #[error("kubectl autoscale failed with exit code {0}")]
    Autoscale(ExitStatus),

    #[error("kubectl delete hpa failed with exit code {0}")]
    AutoscaleDelete(ExitStatus),

    #[error(transparent)]
    IOError(#[from] std::io::Error),
}

/// Replica bounds and the CPU target for an autoscaled deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoscalePolicy {
    pub cpu_percent: u32,
    pub max_replicas: u32,
}

/// Autoscaled deployments never scale to zero.
pub const MIN_REPLICAS: u32 = 1;

/// Collaborator for every cluster mutation of a rollout or teardown.
pub trait ControlPlane {
    fn create(&self, manifest: &Path) -> Result<(), Error>;
    fn replace(&self, manifest: &Path) -> Result<(), Error>;
    fn delete(&self, manifest: &Path) -> Result<(), Error>;
    fn autoscale_enable(&self, manifest: &Path, policy: &AutoscalePolicy) -> Result<(), Error>;
    fn autoscale_disable(&self, deployment: &str) -> Result<(), Error>;
}

/// The real kubectl CLI, talking to whatever cluster the current context
/// points at.
pub struct Kubectl;

impl ControlPlane for Kubectl {
    fn create(&self, manifest: &Path) -> Result<(), Error> {
        debug!("kubectl create -f {}", manifest.display());
        std::process::Command::new("kubectl")
            .arg("create")
            .arg("-f")
            .arg(manifest)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map(|exit_status| {
                if exit_status.success() {
                    Ok(())
                } else {
                    Err(Error::Create(exit_status))
                }
            })?
    }

    fn replace(&self, manifest: &Path) -> Result<(), Error> {
        debug!("kubectl replace -f {}", manifest.display());
        std::process::Command::new("kubectl")
            .arg("replace")
            .arg("-f")
            .arg(manifest)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map(|exit_status| {
                if exit_status.success() {
                    Ok(())
                } else {
                    Err(Error::Replace(exit_status))
                }
            })?
    }

    fn delete(&self, manifest: &Path) -> Result<(), Error> {
        debug!("kubectl delete -f {}", manifest.display());
        std::process::Command::new("kubectl")
            .arg("delete")
            .arg("-f")
            .arg(manifest)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map(|exit_status| {
                if exit_status.success() {
                    Ok(())
                } else {
                    Err(Error::Delete(exit_status))
                }
            })?
    }

    fn autoscale_enable(&self, manifest: &Path, policy: &AutoscalePolicy) -> Result<(), Error> {
        debug!("kubectl autoscale -f {}", manifest.display());
        std::process::Command::new("kubectl")
            .arg("autoscale")
            .arg("-f")
            .arg(manifest)
            .arg(format!("--min={MIN_REPLICAS}"))
            .arg(format!("--max={}", policy.max_replicas))
            .arg(format!("--cpu-percent={}", policy.cpu_percent))
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map(|exit_status| {
                if exit_status.success() {
                    Ok(())
                } else {
                    Err(Error::Autoscale(exit_status))
                }
            })?
    }

    // Quiet on purpose: this runs as a pre-clean before autoscale_enable and
    // during teardown, where a missing hpa is the common case.
    fn autoscale_disable(&self, deployment: &str) -> Result<(), Error> {
        debug!("kubectl delete hpa {}", deployment);
        std::process::Command::new("kubectl")
            .arg("delete")
            .arg("hpa")
            .arg(deployment)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|exit_status| {
                if exit_status.success() {
                    Ok(())
                } else {
                    Err(Error::AutoscaleDelete(exit_status))
                }
            })?
    }
}
