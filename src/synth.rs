//! Turns the embedded manifest templates into deployable manifests for one
//! concrete app.
//!
//! The templates are app-agnostic. Three wiring passes specialise them before
//! anything reaches the cluster: runtime wiring (shared source volume and
//! controller paths), scaling wiring (process counts per tier), and the image
//! reference for the app's source container. Every pass is idempotent so a
//! redeploy converges instead of accumulating.

use crate::config::ScalingConfig;
use crate::manifest::{self, ExecAction, Lifecycle, LifecycleHandler, Manifest};
use log::debug;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("write {path}: {err}")]
    WriteFile { err: std::io::Error, path: String },

    #[error(transparent)]
    Manifest(#[from] manifest::Error),
}

/// Volume shared between the source container and the service container.
pub const APP_SRC_VOLUME: &str = "app-src-volume";
/// Where the service container expects the app source.
pub const APP_SOURCE_PATH: &str = "/usr/src/app";
/// Where the source container stages its copy for the shared volume.
pub const SRC_STAGING_PATH: &str = "/usr/dest";

pub const WORKER_CONTROLLER_ENV: &str = "SOCKETCLUSTER_WORKER_CONTROLLER";
pub const MASTER_CONTROLLER_ENV: &str = "SOCKETCLUSTER_MASTER_CONTROLLER";
pub const WORKERS_ENV: &str = "SOCKETCLUSTER_WORKERS";
pub const BROKERS_ENV: &str = "SOCKETCLUSTER_BROKERS";

pub const WORKER_CONTROLLER_PATH: &str = "/usr/src/app/worker.js";
pub const MASTER_CONTROLLER_PATH: &str = "/usr/src/app/server.js";

const TEMPLATES: &[(&str, &str)] = &[
    (
        "scc-worker-deployment.yaml",
        include_str!("../boilerplate/kubernetes/scc-worker-deployment.yaml"),
    ),
    (
        "scc-worker-service.yaml",
        include_str!("../boilerplate/kubernetes/scc-worker-service.yaml"),
    ),
    (
        "scc-broker-deployment.yaml",
        include_str!("../boilerplate/kubernetes/scc-broker-deployment.yaml"),
    ),
    (
        "scc-broker-service.yaml",
        include_str!("../boilerplate/kubernetes/scc-broker-service.yaml"),
    ),
    (
        "scc-state-deployment.yaml",
        include_str!("../boilerplate/kubernetes/scc-state-deployment.yaml"),
    ),
    (
        "scc-state-service.yaml",
        include_str!("../boilerplate/kubernetes/scc-state-service.yaml"),
    ),
    (
        "scc-ingress.yaml",
        include_str!("../boilerplate/kubernetes/scc-ingress.yaml"),
    ),
];

/// Writes the full template set into `manifest_dir`. Only runs at app
/// creation time; deploys rewrite the materialized copies in place.
pub fn materialize(manifest_dir: &Path) -> Result<(), Error> {
    std::fs::create_dir_all(manifest_dir).map_err(|err| Error::WriteFile {
        err,
        path: manifest_dir.display().to_string(),
    })?;
    for (file_name, contents) in TEMPLATES {
        let path = manifest_dir.join(file_name);
        debug!("Writing manifest template {}", path.display());
        std::fs::write(&path, contents).map_err(|err| Error::WriteFile {
            err,
            path: path.display().to_string(),
        })?;
    }
    Ok(())
}

/// Wires the primary deployment so the service container finds the app
/// source: a shared emptyDir volume, mounts on both containers, controller
/// path variables, and a post-start hook that copies the source image's
/// content onto the shared volume.
pub fn inject_runtime_wiring(path: &Path) -> Result<(), Error> {
    let mut deployment = Manifest::load(path)?;

    deployment.pod_spec_mut()?.ensure_volume(APP_SRC_VOLUME);

    let service = deployment.service_container_mut()?;
    service.mount(APP_SRC_VOLUME, APP_SOURCE_PATH);
    service.set_env(WORKER_CONTROLLER_ENV, WORKER_CONTROLLER_PATH);
    service.set_env(MASTER_CONTROLLER_ENV, MASTER_CONTROLLER_PATH);

    let src = deployment.src_container_mut()?;
    src.mount(APP_SRC_VOLUME, SRC_STAGING_PATH);
    src.lifecycle = Some(Lifecycle {
        post_start: Some(LifecycleHandler {
            exec: Some(ExecAction::shell(&format!(
                "cp -RT {APP_SOURCE_PATH} {SRC_STAGING_PATH}"
            ))),
            ..LifecycleHandler::default()
        }),
        ..Lifecycle::default()
    });

    Ok(deployment.save(path)?)
}

/// Writes the per-tier process counts into the deployment's primary
/// container. Existing entries are replaced, never duplicated.
pub fn inject_scaling_wiring(path: &Path, scaling: &ScalingConfig) -> Result<(), Error> {
    let mut deployment = Manifest::load(path)?;

    let container = deployment.primary_container_mut()?;
    container.set_env(WORKERS_ENV, scaling.workers.to_string());
    container.set_env(BROKERS_ENV, scaling.brokers.to_string());

    Ok(deployment.save(path)?)
}

/// Points the source container at the freshly pushed app image. No other
/// container's image is touched; the service container keeps running the
/// stock runtime image.
pub fn inject_image_reference(path: &Path, image_name: &str) -> Result<(), Error> {
    let mut deployment = Manifest::load(path)?;
    deployment.src_container_mut()?.image = image_name.to_string();
    Ok(deployment.save(path)?)
}
