//! Teardown: best-effort removal of everything a rollout created.
//!
//! Individual delete failures are reported and skipped rather than
//! propagated. A teardown must get as far as it can so a half-deployed or
//! already-deleted app can always be cleaned up and redeployed from scratch.

use log::{debug, info, warn};
use std::path::Path;
use thiserror::Error;

use crate::kubectl::ControlPlane;
use crate::manifest;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no manifest directory at {0}, nothing to undeploy")]
    MissingManifestDir(String),

    #[error("scan {path}: {err}")]
    ScanManifests { err: std::io::Error, path: String },
}

pub struct TeardownOrchestrator<'a> {
    pub control_plane: &'a dyn ControlPlane,
}

impl TeardownOrchestrator<'_> {
    /// Deletes the resources of every manifest in `manifest_dir`, plus the
    /// autoscale policy of each scalable deployment. Succeeds as long as the
    /// manifest directory itself is readable.
    pub fn teardown(&self, manifest_dir: &Path) -> Result<(), Error> {
        if !manifest_dir.is_dir() {
            return Err(Error::MissingManifestDir(
                manifest_dir.display().to_string(),
            ));
        }
        let names =
            manifest::manifest_files(manifest_dir).map_err(|err| Error::ScanManifests {
                err,
                path: manifest_dir.display().to_string(),
            })?;

        for name in names {
            info!("Deleting resources from {}...", name);
            if let Err(err) = self.control_plane.delete(&manifest_dir.join(&name)) {
                warn!("could not delete resources from {}: {}", name, err);
            }
            if manifest::is_scalable(&name) {
                if let Some(deployment) = manifest::deployment_name(&name) {
                    if let Err(err) = self.control_plane.autoscale_disable(deployment) {
                        debug!("no autoscale policy to remove for {}: {}", deployment, err);
                    }
                }
            }
        }
        Ok(())
    }
}
