//! Rollout orchestration: everything between "deploy this app" and the
//! cluster holding the right resources.
//!
//! A rollout runs in two phases. The local phase resolves the version tag,
//! persists configuration, synthesizes manifests, then builds and pushes the
//! app image; any failure here is fatal and nothing has touched the cluster
//! yet. The cluster phase then applies the manifests in a fixed order:
//! apply-once resources, scalable deployments (each with its autoscale
//! policy), and the ingress strictly last.

use log::{debug, info, warn};
use std::path::Path;
use std::thread;
use std::time::Duration;
use thiserror::Error;

use crate::config::{self, DeploymentConfig, ServiceTier};
use crate::docker::{self, ContainerRuntime};
use crate::kubectl::{self, AutoscalePolicy, ControlPlane};
use crate::manifest;
use crate::prompt::{self, Prompt};
use crate::synth;
use crate::version;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no manifest directory at {0}, run 'baasil create' first")]
    MissingManifestDir(String),

    #[error("scan {path}: {err}")]
    ScanManifests { err: std::io::Error, path: String },

    #[error(transparent)]
    Config(#[from] config::Error),

    #[error(transparent)]
    Synth(#[from] synth::Error),

    #[error(transparent)]
    Runtime(#[from] docker::Error),

    #[error(transparent)]
    ControlPlane(#[from] kubectl::Error),

    #[error(transparent)]
    Prompt(#[from] prompt::Error),
}

/// How long the scalable deployments get to settle before the ingress is
/// created. The ingress controller binds against whatever backends exist at
/// creation time, so it must come last and not too early.
pub const SETTLE_DELAY: Duration = Duration::from_secs(10);

pub const DEFAULT_AUTOSCALE: AutoscalePolicy = AutoscalePolicy {
    cpu_percent: 50,
    max_replicas: 10,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployMode {
    /// First rollout: create every resource.
    Create,
    /// Redeploy over a running app: replace the primary deployment only.
    Update,
}

/// Options parsed from the command line, resolved once up front.
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Explicit tag; skips the interactive tag prompt.
    pub version_tag: Option<String>,
    /// Worker count for both scalable tiers.
    pub workers: Option<u32>,
    /// Broker count for both scalable tiers.
    pub brokers: Option<u32>,
    /// Autoscale policy for the scalable deployments, or None to skip
    /// autoscaling entirely.
    pub autoscale: Option<AutoscalePolicy>,
}

/// The manifest set of one app, partitioned by rollout treatment and sorted
/// within each group.
#[derive(Debug, Default, PartialEq)]
pub struct RolloutPlan {
    pub apply_once: Vec<String>,
    pub scalable: Vec<String>,
    pub ingress: Vec<String>,
}

impl RolloutPlan {
    pub fn from_dir(manifest_dir: &Path) -> Result<Self, Error> {
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
        let mut plan = RolloutPlan::default();
        for name in names {
            if manifest::is_ingress(&name) {
                plan.ingress.push(name);
            } else if manifest::is_scalable(&name) {
                plan.scalable.push(name);
            } else {
                plan.apply_once.push(name);
            }
        }
        Ok(plan)
    }
}

pub struct RolloutOrchestrator<'a> {
    pub runtime: &'a dyn ContainerRuntime,
    pub control_plane: &'a dyn ControlPlane,
    pub settle_delay: Duration,
}

impl RolloutOrchestrator<'_> {
    pub fn deploy(
        &self,
        app_dir: &Path,
        app_name: &str,
        options: &DeployOptions,
        mode: DeployMode,
        prompt: &mut dyn Prompt,
    ) -> Result<(), Error> {
        let manifest_dir = app_dir.join(manifest::MANIFEST_DIR);
        let plan = RolloutPlan::from_dir(&manifest_dir)?;

        let config_path = app_dir.join(config::CONFIG_FILE);
        let mut config = DeploymentConfig::load(&config_path);

        if !config.docker.is_complete() {
            collect_docker_settings(&mut config, app_name, prompt)?;
        }
        for tier in [ServiceTier::Worker, ServiceTier::Broker] {
            let scaling = config.scaling_mut(tier);
            if let Some(workers) = options.workers {
                scaling.workers = workers;
            }
            if let Some(brokers) = options.brokers {
                scaling.brokers = brokers;
            }
        }

        let tag = resolve_tag(&config, options, mode, prompt)?;
        config.docker.image_name = version::set_tag(&config.docker.image_name, &tag);
        config.save(&config_path)?;

        info!("Synthesizing deployment manifests...");
        let primary = manifest_dir.join(manifest::PRIMARY_DEPLOYMENT);
        synth::inject_runtime_wiring(&primary)?;
        synth::inject_scaling_wiring(&primary, config.scaling(ServiceTier::Worker))?;
        synth::inject_scaling_wiring(
            &manifest_dir.join(manifest::BROKER_DEPLOYMENT),
            config.scaling(ServiceTier::Broker),
        )?;
        synth::inject_image_reference(&primary, &config.docker.image_name)?;

        let credentials = config.docker.credentials()?;
        info!("Building image {}...", config.docker.image_name);
        self.runtime.build(&config.docker.image_name, app_dir)?;
        info!(
            "Pushing image {} to {}...",
            config.docker.image_name, config.docker.image_repo
        );
        self.runtime
            .push(&config.docker.image_name, &config.docker.image_repo, &credentials)?;

        match mode {
            DeployMode::Create => {
                self.create_rollout(&manifest_dir, &plan, options.autoscale.as_ref())
            }
            DeployMode::Update => {
                self.update_rollout(&manifest_dir);
                Ok(())
            }
        }
    }

    fn create_rollout(
        &self,
        manifest_dir: &Path,
        plan: &RolloutPlan,
        autoscale: Option<&AutoscalePolicy>,
    ) -> Result<(), Error> {
        for name in &plan.apply_once {
            info!("Creating resources from {}...", name);
            self.control_plane.create(&manifest_dir.join(name))?;
        }

        for name in &plan.scalable {
            info!("Creating resources from {}...", name);
            let path = manifest_dir.join(name);
            self.control_plane.create(&path)?;
            if let Some(policy) = autoscale {
                if let Some(deployment) = manifest::deployment_name(name) {
                    // A leftover policy from an earlier deployment would
                    // fight the one we are about to install.
                    if let Err(err) = self.control_plane.autoscale_disable(deployment) {
                        debug!("no previous autoscale policy for {}: {}", deployment, err);
                    }
                    self.control_plane.autoscale_enable(&path, policy)?;
                }
            }
        }

        if !plan.ingress.is_empty() {
            info!(
                "Waiting {} seconds for the scalable deployments to settle...",
                self.settle_delay.as_secs()
            );
            thread::sleep(self.settle_delay);
            for name in &plan.ingress {
                info!("Creating resources from {}...", name);
                self.control_plane.create(&manifest_dir.join(name))?;
            }
        }
        Ok(())
    }

    fn update_rollout(&self, manifest_dir: &Path) {
        info!("Replacing resources from {}...", manifest::PRIMARY_DEPLOYMENT);
        let primary = manifest_dir.join(manifest::PRIMARY_DEPLOYMENT);
        if let Err(err) = self.control_plane.replace(&primary) {
            warn!(
                "could not replace the running deployment, it may not be deployed yet: {}",
                err
            );
        }
    }
}

/// Fills in the registry section of a fresh configuration by asking for
/// credentials and an image name (defaulting to `<username>/<app>`).
fn collect_docker_settings(
    config: &mut DeploymentConfig,
    app_name: &str,
    prompt: &mut dyn Prompt,
) -> Result<(), prompt::Error> {
    let username = prompt.ask("Enter your DockerHub username:")?;
    let password = prompt.ask("Enter your DockerHub password:")?;
    let default_image = format!("{username}/{app_name}");
    let image = prompt.ask(&format!(
        "Enter the Docker image name without the version tag (Default: {default_image}):"
    ))?;

    config.docker.image_repo = config::DEFAULT_IMAGE_REPO.to_string();
    config.docker.image_name = if image.is_empty() { default_image } else { image };
    config.docker.set_credentials(&username, &password);
    Ok(())
}

/// Picks the tag for this rollout: an explicit option wins, otherwise the
/// user is offered a suggestion they can accept with an empty answer. A
/// first deploy suggests keeping the current tag (or v1.0.0 when there is
/// none); an update suggests the incremented one.
fn resolve_tag(
    config: &DeploymentConfig,
    options: &DeployOptions,
    mode: DeployMode,
    prompt: &mut dyn Prompt,
) -> Result<String, prompt::Error> {
    if let Some(tag) = &options.version_tag {
        return Ok(normalize_tag(tag));
    }

    let current = version::parse_tag(&config.docker.image_name);
    let suggested = match mode {
        _ if current.is_empty() => version::DEFAULT_TAG.to_string(),
        DeployMode::Create => current.to_string(),
        DeployMode::Update => version::increment(current),
    };

    let answer = prompt.ask(&format!(
        "Enter the version tag for this deployment (Default: {suggested}):"
    ))?;
    if answer.is_empty() {
        Ok(suggested)
    } else {
        Ok(normalize_tag(&answer))
    }
}

fn normalize_tag(tag: &str) -> String {
    tag.trim_start_matches(':').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryCredentials;
    use crate::prompt::test_support::Scripted;
    use std::cell::RefCell;
    use std::os::unix::process::ExitStatusExt;
    use std::path::PathBuf;
    use std::process::ExitStatus;
    use std::time::Instant;

    fn exit(code: i32) -> ExitStatus {
        ExitStatus::from_raw(code << 8)
    }

    fn file_name(path: &Path) -> String {
        path.file_name().unwrap().to_str().unwrap().to_string()
    }

    #[derive(Default)]
    struct FakeRuntime {
        calls: RefCell<Vec<String>>,
    }

    impl ContainerRuntime for FakeRuntime {
        fn build(&self, image: &str, _context: &Path) -> Result<(), docker::Error> {
            self.calls.borrow_mut().push(format!("build {image}"));
            Ok(())
        }

        fn push(
            &self,
            image: &str,
            registry: &str,
            _credentials: &RegistryCredentials,
        ) -> Result<(), docker::Error> {
            self.calls.borrow_mut().push(format!("push {image} {registry}"));
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakePlane {
        calls: RefCell<Vec<(String, Instant)>>,
        fail_create: Option<String>,
        fail_replace: bool,
        fail_disable: bool,
    }

    impl FakePlane {
        fn record(&self, call: String) {
            self.calls.borrow_mut().push((call, Instant::now()));
        }

        fn ops(&self) -> Vec<String> {
            self.calls.borrow().iter().map(|(op, _)| op.clone()).collect()
        }

        fn instant_of(&self, op: &str) -> Instant {
            self.calls
                .borrow()
                .iter()
                .find(|(recorded, _)| recorded == op)
                .map(|(_, at)| *at)
                .unwrap_or_else(|| panic!("no call recorded for {op}"))
        }
    }

    impl ControlPlane for FakePlane {
        fn create(&self, manifest: &Path) -> Result<(), kubectl::Error> {
            let name = file_name(manifest);
            self.record(format!("create {name}"));
            if self.fail_create.as_deref() == Some(name.as_str()) {
                return Err(kubectl::Error::Create(exit(1)));
            }
            Ok(())
        }

        fn replace(&self, manifest: &Path) -> Result<(), kubectl::Error> {
            self.record(format!("replace {}", file_name(manifest)));
            if self.fail_replace {
                return Err(kubectl::Error::Replace(exit(1)));
            }
            Ok(())
        }

        fn delete(&self, manifest: &Path) -> Result<(), kubectl::Error> {
            self.record(format!("delete {}", file_name(manifest)));
            Ok(())
        }

        fn autoscale_enable(
            &self,
            manifest: &Path,
            policy: &AutoscalePolicy,
        ) -> Result<(), kubectl::Error> {
            self.record(format!(
                "autoscale {} cpu={} max={}",
                file_name(manifest),
                policy.cpu_percent,
                policy.max_replicas
            ));
            Ok(())
        }

        fn autoscale_disable(&self, deployment: &str) -> Result<(), kubectl::Error> {
            self.record(format!("unscale {deployment}"));
            if self.fail_disable {
                return Err(kubectl::Error::AutoscaleDelete(exit(1)));
            }
            Ok(())
        }
    }

    fn app_fixture() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let app_dir = dir.path().join("myapp");
        std::fs::create_dir_all(&app_dir).unwrap();
        synth::materialize(&app_dir.join(manifest::MANIFEST_DIR)).unwrap();
        (dir, app_dir)
    }

    fn configured_app() -> (tempfile::TempDir, PathBuf) {
        let (guard, app_dir) = app_fixture();
        let mut config = DeploymentConfig::default();
        config.docker.image_repo = config::DEFAULT_IMAGE_REPO.to_string();
        config.docker.image_name = "alice/myapp:v1.2.3".to_string();
        config.docker.set_credentials("alice", "hunter2");
        config.save(&app_dir.join(config::CONFIG_FILE)).unwrap();
        (guard, app_dir)
    }

    fn orchestrator<'a>(
        runtime: &'a FakeRuntime,
        plane: &'a FakePlane,
    ) -> RolloutOrchestrator<'a> {
        RolloutOrchestrator {
            runtime,
            control_plane: plane,
            settle_delay: Duration::from_millis(50),
        }
    }

    fn options(version_tag: &str) -> DeployOptions {
        DeployOptions {
            version_tag: Some(version_tag.to_string()),
            workers: None,
            brokers: None,
            autoscale: Some(DEFAULT_AUTOSCALE),
        }
    }

    #[test]
    fn create_rollout_applies_resources_in_order_with_ingress_last() {
        let (_guard, app_dir) = configured_app();
        let runtime = FakeRuntime::default();
        let plane = FakePlane::default();

        orchestrator(&runtime, &plane)
            .deploy(
                &app_dir,
                "myapp",
                &options("v1.0.0"),
                DeployMode::Create,
                &mut Scripted::new([]),
            )
            .unwrap();

        assert_eq!(
            *runtime.calls.borrow(),
            vec![
                "build alice/myapp:v1.0.0".to_string(),
                format!("push alice/myapp:v1.0.0 {}", config::DEFAULT_IMAGE_REPO),
            ]
        );
        assert_eq!(
            plane.ops(),
            vec![
                "create scc-broker-service.yaml",
                "create scc-state-deployment.yaml",
                "create scc-state-service.yaml",
                "create scc-worker-service.yaml",
                "create scc-broker-deployment.yaml",
                "unscale scc-broker",
                "autoscale scc-broker-deployment.yaml cpu=50 max=10",
                "create scc-worker-deployment.yaml",
                "unscale scc-worker",
                "autoscale scc-worker-deployment.yaml cpu=50 max=10",
                "create scc-ingress.yaml",
            ]
        );
    }

    #[test]
    fn ingress_creation_waits_for_the_settle_delay() {
        let (_guard, app_dir) = configured_app();
        let runtime = FakeRuntime::default();
        let plane = FakePlane::default();

        orchestrator(&runtime, &plane)
            .deploy(
                &app_dir,
                "myapp",
                &options("v1.0.0"),
                DeployMode::Create,
                &mut Scripted::new([]),
            )
            .unwrap();

        let last_scalable = plane.instant_of("autoscale scc-worker-deployment.yaml cpu=50 max=10");
        let ingress = plane.instant_of("create scc-ingress.yaml");
        assert!(ingress.duration_since(last_scalable) >= Duration::from_millis(50));
    }

    #[test]
    fn no_autoscale_skips_policy_calls_but_still_creates_deployments() {
        let (_guard, app_dir) = configured_app();
        let runtime = FakeRuntime::default();
        let plane = FakePlane::default();

        let mut opts = options("v1.0.0");
        opts.autoscale = None;
        orchestrator(&runtime, &plane)
            .deploy(&app_dir, "myapp", &opts, DeployMode::Create, &mut Scripted::new([]))
            .unwrap();

        let ops = plane.ops();
        assert!(ops.contains(&"create scc-worker-deployment.yaml".to_string()));
        assert!(ops.contains(&"create scc-broker-deployment.yaml".to_string()));
        assert!(!ops.iter().any(|op| op.starts_with("autoscale")));
        assert!(!ops.iter().any(|op| op.starts_with("unscale")));
    }

    #[test]
    fn failed_autoscale_preclean_does_not_stop_the_rollout() {
        let (_guard, app_dir) = configured_app();
        let runtime = FakeRuntime::default();
        let plane = FakePlane {
            fail_disable: true,
            ..FakePlane::default()
        };

        orchestrator(&runtime, &plane)
            .deploy(
                &app_dir,
                "myapp",
                &options("v1.0.0"),
                DeployMode::Create,
                &mut Scripted::new([]),
            )
            .unwrap();

        let ops = plane.ops();
        assert!(ops.contains(&"autoscale scc-worker-deployment.yaml cpu=50 max=10".to_string()));
        assert!(ops.contains(&"create scc-ingress.yaml".to_string()));
    }

    #[test]
    fn a_failed_create_aborts_the_rollout() {
        let (_guard, app_dir) = configured_app();
        let runtime = FakeRuntime::default();
        let plane = FakePlane {
            fail_create: Some("scc-state-deployment.yaml".to_string()),
            ..FakePlane::default()
        };

        let result = orchestrator(&runtime, &plane).deploy(
            &app_dir,
            "myapp",
            &options("v1.0.0"),
            DeployMode::Create,
            &mut Scripted::new([]),
        );

        assert!(matches!(result, Err(Error::ControlPlane(_))));
        let ops = plane.ops();
        assert_eq!(ops.last().map(String::as_str), Some("create scc-state-deployment.yaml"));
        assert!(!ops.contains(&"create scc-ingress.yaml".to_string()));
    }

    #[test]
    fn update_rollout_replaces_only_the_primary_deployment() {
        let (_guard, app_dir) = configured_app();
        let runtime = FakeRuntime::default();
        let plane = FakePlane::default();

        // Empty answer accepts the suggested increment of v1.2.3.
        orchestrator(&runtime, &plane)
            .deploy(
                &app_dir,
                "myapp",
                &DeployOptions {
                    version_tag: None,
                    workers: None,
                    brokers: None,
                    autoscale: Some(DEFAULT_AUTOSCALE),
                },
                DeployMode::Update,
                &mut Scripted::new([""]),
            )
            .unwrap();

        assert_eq!(plane.ops(), vec!["replace scc-worker-deployment.yaml"]);
        assert_eq!(
            *runtime.calls.borrow(),
            vec![
                "build alice/myapp:v1.2.4".to_string(),
                format!("push alice/myapp:v1.2.4 {}", config::DEFAULT_IMAGE_REPO),
            ]
        );

        let config = DeploymentConfig::load(&app_dir.join(config::CONFIG_FILE));
        assert_eq!(config.docker.image_name, "alice/myapp:v1.2.4");
    }

    #[test]
    fn a_failed_replace_is_tolerated_on_update() {
        let (_guard, app_dir) = configured_app();
        let runtime = FakeRuntime::default();
        let plane = FakePlane {
            fail_replace: true,
            ..FakePlane::default()
        };

        let result = orchestrator(&runtime, &plane).deploy(
            &app_dir,
            "myapp",
            &options("v1.3.0"),
            DeployMode::Update,
            &mut Scripted::new([]),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn scaling_options_are_persisted_and_wired_into_both_deployments() {
        let (_guard, app_dir) = configured_app();
        let runtime = FakeRuntime::default();
        let plane = FakePlane::default();

        let opts = DeployOptions {
            version_tag: Some("v1.0.0".to_string()),
            workers: Some(3),
            brokers: Some(2),
            autoscale: None,
        };
        orchestrator(&runtime, &plane)
            .deploy(&app_dir, "myapp", &opts, DeployMode::Create, &mut Scripted::new([]))
            .unwrap();

        let config = DeploymentConfig::load(&app_dir.join(config::CONFIG_FILE));
        assert_eq!(config.socket_cluster.workers, 3);
        assert_eq!(config.socket_cluster.brokers, 2);
        assert_eq!(config.socket_cluster_broker.workers, 3);
        assert_eq!(config.socket_cluster_broker.brokers, 2);

        let manifest_dir = app_dir.join(manifest::MANIFEST_DIR);
        for file in [manifest::PRIMARY_DEPLOYMENT, manifest::BROKER_DEPLOYMENT] {
            let mut deployment = manifest::Manifest::load(&manifest_dir.join(file)).unwrap();
            let container = deployment.primary_container_mut().unwrap();
            assert_eq!(container.env_value(synth::WORKERS_ENV), Some("3"));
            assert_eq!(container.env_value(synth::BROKERS_ENV), Some("2"));
        }
    }

    #[test]
    fn synthesized_image_lands_on_the_source_container_only() {
        let (_guard, app_dir) = configured_app();
        let runtime = FakeRuntime::default();
        let plane = FakePlane::default();

        orchestrator(&runtime, &plane)
            .deploy(
                &app_dir,
                "myapp",
                &options("v1.0.0"),
                DeployMode::Create,
                &mut Scripted::new([]),
            )
            .unwrap();

        let primary = app_dir
            .join(manifest::MANIFEST_DIR)
            .join(manifest::PRIMARY_DEPLOYMENT);
        let mut deployment = manifest::Manifest::load(&primary).unwrap();
        assert_eq!(
            deployment.src_container_mut().unwrap().image,
            "alice/myapp:v1.0.0"
        );
        assert_eq!(
            deployment.service_container_mut().unwrap().image,
            docker::SERVICE_IMAGE
        );
    }

    #[test]
    fn interactive_setup_populates_and_persists_registry_details() {
        let (_guard, app_dir) = app_fixture();
        let runtime = FakeRuntime::default();
        let plane = FakePlane::default();

        // Username, password, accept the default image name, accept the
        // default first tag.
        let mut prompt = Scripted::new(["alice", "hunter2", "", ""]);
        orchestrator(&runtime, &plane)
            .deploy(
                &app_dir,
                "myapp",
                &DeployOptions {
                    version_tag: None,
                    workers: None,
                    brokers: None,
                    autoscale: None,
                },
                DeployMode::Create,
                &mut prompt,
            )
            .unwrap();

        let config = DeploymentConfig::load(&app_dir.join(config::CONFIG_FILE));
        assert!(config.docker.is_complete());
        assert_eq!(config.docker.image_repo, config::DEFAULT_IMAGE_REPO);
        assert_eq!(config.docker.image_name, "alice/myapp:v1.0.0");
        let credentials = config.docker.credentials().unwrap();
        assert_eq!(credentials.username, "alice");
        assert_eq!(credentials.password, "hunter2");
    }

    #[test]
    fn explicit_version_tag_skips_the_prompt_and_drops_a_leading_colon() {
        let (_guard, app_dir) = configured_app();
        let runtime = FakeRuntime::default();
        let plane = FakePlane::default();

        // Scripted::new([]) panics on any prompt, proving none happens.
        orchestrator(&runtime, &plane)
            .deploy(
                &app_dir,
                "myapp",
                &options(":v2.0.0"),
                DeployMode::Create,
                &mut Scripted::new([]),
            )
            .unwrap();

        let config = DeploymentConfig::load(&app_dir.join(config::CONFIG_FILE));
        assert_eq!(config.docker.image_name, "alice/myapp:v2.0.0");
    }

    #[test]
    fn missing_manifest_directory_fails_before_any_external_call() {
        let (_guard, app_dir) = configured_app();
        std::fs::remove_dir_all(app_dir.join(manifest::MANIFEST_DIR)).unwrap();
        let runtime = FakeRuntime::default();
        let plane = FakePlane::default();

        let result = orchestrator(&runtime, &plane).deploy(
            &app_dir,
            "myapp",
            &options("v1.0.0"),
            DeployMode::Create,
            &mut Scripted::new([]),
        );

        assert!(matches!(result, Err(Error::MissingManifestDir(_))));
        assert!(runtime.calls.borrow().is_empty());
        assert!(plane.ops().is_empty());
    }

    #[test]
    fn plan_partitions_by_filename_convention() {
        let (_guard, app_dir) = configured_app();
        let plan = RolloutPlan::from_dir(&app_dir.join(manifest::MANIFEST_DIR)).unwrap();

        assert_eq!(
            plan.apply_once,
            vec![
                "scc-broker-service.yaml",
                "scc-state-deployment.yaml",
                "scc-state-service.yaml",
                "scc-worker-service.yaml",
            ]
        );
        assert_eq!(
            plan.scalable,
            vec!["scc-broker-deployment.yaml", "scc-worker-deployment.yaml"]
        );
        assert_eq!(plan.ingress, vec!["scc-ingress.yaml"]);
    }
}
