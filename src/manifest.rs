//! Typed view of the Kubernetes manifests managed by this tool.
//!
//! Only the parts the deploy flow rewrites are modelled as fields; everything
//! else rides along in flattened `serde_yaml::Mapping` extras so a manifest
//! survives a load/save cycle without losing hand-edited content. Saving is
//! deterministic: writing the same logical manifest twice produces identical
//! bytes.

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::Path;
use thiserror::Error;
use Error::*;

#[derive(Error, Debug)]
pub enum Error {
    #[error("read {path}: {err}")]
    ReadFile { err: std::io::Error, path: String },

    #[error("write {path}: {err}")]
    WriteFile { err: std::io::Error, path: String },

    #[error("parse {path}: {err}")]
    Parse { err: serde_yaml::Error, path: String },

    #[error("serialize manifest: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("manifest has no pod template")]
    NoPodTemplate,

    #[error("no container named '{0}'")]
    MissingContainer(String),

    #[error("more than one container named '{0}'")]
    DuplicateContainer(String),
}

pub const MANIFEST_DIR: &str = "kubernetes";

/// The deployment whose pod runs the service container and the source
/// container side by side.
pub const PRIMARY_DEPLOYMENT: &str = "scc-worker-deployment.yaml";
pub const BROKER_DEPLOYMENT: &str = "scc-broker-deployment.yaml";
pub const STATE_DEPLOYMENT: &str = "scc-state-deployment.yaml";

pub const SERVICE_CONTAINER: &str = "scc-worker";
pub const SRC_CONTAINER: &str = "app-src-container";

const DEPLOYMENT_SUFFIX: &str = "-deployment.yaml";
const INGRESS_SUFFIX: &str = "-ingress.yaml";

pub fn is_manifest_file(file_name: &str) -> bool {
    file_name.ends_with(".yaml") || file_name.ends_with(".yml")
}

/// Deployments get replica scaling and autoscale policies. The state server
/// is the one deployment exempt from that treatment: it must stay a single
/// replica.
pub fn is_scalable(file_name: &str) -> bool {
    file_name.ends_with(DEPLOYMENT_SUFFIX) && file_name != STATE_DEPLOYMENT
}

pub fn is_ingress(file_name: &str) -> bool {
    file_name.ends_with(INGRESS_SUFFIX)
}

/// The cluster-side deployment name encoded in a manifest filename.
pub fn deployment_name(file_name: &str) -> Option<&str> {
    file_name.strip_suffix(DEPLOYMENT_SUFFIX)
}

/// Lists the manifest filenames in `dir`, sorted for a deterministic
/// rollout order.
pub fn manifest_files(dir: &Path) -> Result<Vec<String>, std::io::Error> {
    let mut names: Vec<String> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| is_manifest_file(name))
        .collect();
    names.sort();
    Ok(names)
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub api_version: String,
    pub kind: String,
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<ResourceSpec>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Metadata {
    pub name: String,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ResourceSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PodTemplate>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PodTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<PodSpec>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct PodSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<Container>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<Volume>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volume_mounts: Vec<VolumeMount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle: Option<Lifecycle>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct EnvVar {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VolumeMount {
    pub name: String,
    pub mount_path: String,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Volume {
    pub name: String,
    #[serde(
        default,
        deserialize_with = "empty_dir_null_as_empty",
        skip_serializing_if = "Option::is_none"
    )]
    pub empty_dir: Option<EmptyDir>,
    #[serde(flatten)]
    pub extra: Mapping,
}

/// An `emptyDir` volume source. Serializes as `{}` when it carries no
/// options, never as a bare null, because the cluster API rejects the null
/// form on replace.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct EmptyDir {
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Lifecycle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_start: Option<LifecycleHandler>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct LifecycleHandler {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exec: Option<ExecAction>,
    #[serde(flatten)]
    pub extra: Mapping,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ExecAction {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,
    #[serde(flatten)]
    pub extra: Mapping,
}

/// Hand-written templates spell the volume source as a bare `emptyDir:` key.
/// That parses as null, which must come back as an (empty) source rather
/// than be dropped on the next save.
fn empty_dir_null_as_empty<'de, D>(deserializer: D) -> Result<Option<EmptyDir>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(Some(EmptyDir::default())),
        Some(other) => serde_yaml::from_value(other)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

/// Rewrites every null `emptyDir` in a serialized manifest tree to an
/// explicit empty mapping. Runs on every save so no write path can ship the
/// null form, wherever the key sits in the tree.
pub fn sanitize_empty_dirs(value: &mut Value) {
    match value {
        Value::Mapping(mapping) => {
            for (key, entry) in mapping.iter_mut() {
                if entry.is_null() && key.as_str() == Some("emptyDir") {
                    *entry = Value::Mapping(Mapping::new());
                } else {
                    sanitize_empty_dirs(entry);
                }
            }
        }
        Value::Sequence(entries) => {
            for entry in entries {
                sanitize_empty_dirs(entry);
            }
        }
        _ => {}
    }
}

impl Manifest {
    pub fn parse(yaml_string: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml_string)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path).map_err(|err| ReadFile {
            err,
            path: path.display().to_string(),
        })?;
        Self::parse(&raw).map_err(|err| Parse {
            err,
            path: path.display().to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let mut value = serde_yaml::to_value(self)?;
        sanitize_empty_dirs(&mut value);
        let raw = serde_yaml::to_string(&value)?;
        std::fs::write(path, raw).map_err(|err| WriteFile {
            err,
            path: path.display().to_string(),
        })
    }

    pub fn pod_spec_mut(&mut self) -> Result<&mut PodSpec, Error> {
        self.spec
            .as_mut()
            .and_then(|spec| spec.template.as_mut())
            .and_then(|template| template.spec.as_mut())
            .ok_or(NoPodTemplate)
    }

    /// The container with the given name. Zero or multiple matches are
    /// errors so an injection step can never silently target the wrong
    /// container.
    pub fn container_mut(&mut self, name: &str) -> Result<&mut Container, Error> {
        let containers = &mut self.pod_spec_mut()?.containers;
        let mut found = None;
        for (i, container) in containers.iter().enumerate() {
            if container.name == name {
                if found.is_some() {
                    return Err(DuplicateContainer(name.to_string()));
                }
                found = Some(i);
            }
        }
        match found {
            Some(i) => Ok(&mut containers[i]),
            None => Err(MissingContainer(name.to_string())),
        }
    }

    pub fn service_container_mut(&mut self) -> Result<&mut Container, Error> {
        self.container_mut(SERVICE_CONTAINER)
    }

    pub fn src_container_mut(&mut self) -> Result<&mut Container, Error> {
        self.container_mut(SRC_CONTAINER)
    }

    /// The container named after the manifest itself, or the sole container
    /// when no name matches. Used by scaling wiring, which must work on any
    /// deployment regardless of its container layout.
    pub fn primary_container_mut(&mut self) -> Result<&mut Container, Error> {
        let name = self.metadata.name.clone();
        let containers = &mut self.pod_spec_mut()?.containers;
        let mut found = None;
        for (i, container) in containers.iter().enumerate() {
            if container.name == name {
                if found.is_some() {
                    return Err(DuplicateContainer(name));
                }
                found = Some(i);
            }
        }
        match found {
            Some(i) => Ok(&mut containers[i]),
            None if containers.len() == 1 => Ok(&mut containers[0]),
            None => Err(MissingContainer(name)),
        }
    }
}

impl Container {
    /// Sets an environment variable, replacing any previous entry with the
    /// same name. Repeated calls never accumulate duplicates.
    pub fn set_env(&mut self, name: &str, value: impl Into<String>) {
        self.env.retain(|entry| entry.name != name);
        self.env.push(EnvVar {
            name: name.to_string(),
            value: value.into(),
            extra: Mapping::new(),
        });
    }

    pub fn env_value(&self, name: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.value.as_str())
    }

    /// Mounts a volume at the given path, updating the path if the mount
    /// already exists.
    pub fn mount(&mut self, volume: &str, mount_path: &str) {
        if let Some(existing) = self.volume_mounts.iter_mut().find(|m| m.name == volume) {
            existing.mount_path = mount_path.to_string();
            return;
        }
        self.volume_mounts.push(VolumeMount {
            name: volume.to_string(),
            mount_path: mount_path.to_string(),
            extra: Mapping::new(),
        });
    }
}

impl PodSpec {
    /// Declares an emptyDir volume unless one with this name already exists.
    pub fn ensure_volume(&mut self, name: &str) {
        if self.volumes.iter().any(|volume| volume.name == name) {
            return;
        }
        self.volumes.push(Volume {
            name: name.to_string(),
            empty_dir: Some(EmptyDir::default()),
            extra: Mapping::new(),
        });
    }
}

impl ExecAction {
    pub fn shell(command: &str) -> Self {
        ExecAction {
            command: vec!["/bin/sh".to_string(), "-c".to_string(), command.to_string()],
            extra: Mapping::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORKER_TEMPLATE: &str =
        include_str!("../boilerplate/kubernetes/scc-worker-deployment.yaml");
    const INGRESS_TEMPLATE: &str = include_str!("../boilerplate/kubernetes/scc-ingress.yaml");

    #[test]
    fn parses_the_worker_deployment_template() {
        let mut manifest = Manifest::parse(WORKER_TEMPLATE).unwrap();
        assert_eq!(manifest.kind, "Deployment");
        assert_eq!(manifest.metadata.name, "scc-worker");

        let service = manifest.service_container_mut().unwrap();
        assert_eq!(service.image, "socketcluster/socketcluster:v5.0.0");
        assert_eq!(service.env_value("SCC_STATE_SERVER_HOST"), Some("scc-state"));

        let src = manifest.src_container_mut().unwrap();
        assert_eq!(src.image, "");
    }

    #[test]
    fn null_empty_dir_parses_as_an_empty_source() {
        let manifest = Manifest::parse(WORKER_TEMPLATE).unwrap();
        let pod = manifest
            .spec
            .as_ref()
            .and_then(|s| s.template.as_ref())
            .and_then(|t| t.spec.as_ref())
            .unwrap();
        assert_eq!(pod.volumes.len(), 1);
        assert_eq!(pod.volumes[0].empty_dir, Some(EmptyDir::default()));
    }

    #[test]
    fn saved_manifest_spells_empty_dir_as_braces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PRIMARY_DEPLOYMENT);

        let manifest = Manifest::parse(WORKER_TEMPLATE).unwrap();
        manifest.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("emptyDir: {}"), "got:\n{}", raw);
    }

    #[test]
    fn sanitize_rewrites_null_empty_dirs_anywhere_in_the_tree() {
        let mut value: Value =
            serde_yaml::from_str("spec:\n  volumes:\n    - name: v\n      emptyDir:\n").unwrap();
        sanitize_empty_dirs(&mut value);
        let raw = serde_yaml::to_string(&value).unwrap();
        assert!(raw.contains("emptyDir: {}"));
    }

    #[test]
    fn second_save_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let first_path = dir.path().join("first.yaml");
        let second_path = dir.path().join("second.yaml");

        let manifest = Manifest::parse(WORKER_TEMPLATE).unwrap();
        manifest.save(&first_path).unwrap();

        let reloaded = Manifest::load(&first_path).unwrap();
        reloaded.save(&second_path).unwrap();

        let first = std::fs::read(&first_path).unwrap();
        let second = std::fs::read(&second_path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_fields_survive_a_load_save_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PRIMARY_DEPLOYMENT);

        let manifest = Manifest::parse(WORKER_TEMPLATE).unwrap();
        manifest.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("matchLabels"));
        assert!(raw.contains("containerPort: 8000"));
        assert!(raw.contains("apiVersion: apps/v1"));
    }

    #[test]
    fn ingress_manifests_parse_without_a_pod_template() {
        let mut manifest = Manifest::parse(INGRESS_TEMPLATE).unwrap();
        assert_eq!(manifest.kind, "Ingress");
        assert!(matches!(manifest.pod_spec_mut(), Err(NoPodTemplate)));
    }

    #[test]
    fn duplicate_container_names_are_rejected() {
        let raw = "\
apiVersion: apps/v1
kind: Deployment
metadata:
  name: twin
spec:
  template:
    spec:
      containers:
        - name: twin
        - name: twin
";
        let mut manifest = Manifest::parse(raw).unwrap();
        assert!(matches!(
            manifest.container_mut("twin"),
            Err(DuplicateContainer(_))
        ));
    }

    #[test]
    fn a_missing_container_is_an_explicit_error() {
        let mut manifest = Manifest::parse(WORKER_TEMPLATE).unwrap();
        assert!(matches!(
            manifest.container_mut("nope"),
            Err(MissingContainer(_))
        ));
    }

    #[test]
    fn primary_container_falls_back_to_a_sole_container() {
        let raw = "\
apiVersion: apps/v1
kind: Deployment
metadata:
  name: custom-thing
spec:
  template:
    spec:
      containers:
        - name: worker
";
        let mut manifest = Manifest::parse(raw).unwrap();
        assert_eq!(manifest.primary_container_mut().unwrap().name, "worker");
    }

    #[test]
    fn set_env_replaces_instead_of_accumulating() {
        let mut container = Container::default();
        container.set_env("SOCKETCLUSTER_WORKERS", "1");
        container.set_env("SOCKETCLUSTER_WORKERS", "3");
        assert_eq!(container.env.len(), 1);
        assert_eq!(container.env_value("SOCKETCLUSTER_WORKERS"), Some("3"));
    }

    #[test]
    fn filename_conventions() {
        assert!(is_scalable("scc-worker-deployment.yaml"));
        assert!(is_scalable("scc-broker-deployment.yaml"));
        assert!(!is_scalable("scc-state-deployment.yaml"));
        assert!(!is_scalable("scc-worker-service.yaml"));
        assert!(is_ingress("scc-ingress.yaml"));
        assert!(!is_ingress("scc-worker-deployment.yaml"));
        assert_eq!(deployment_name("scc-broker-deployment.yaml"), Some("scc-broker"));
        assert_eq!(deployment_name("scc-ingress.yaml"), None);
    }

    #[test]
    fn manifest_files_are_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.yaml", "a.yaml", "notes.txt", "c.yml"] {
            std::fs::write(dir.path().join(name), "x: 1\n").unwrap();
        }
        let names = manifest_files(dir.path()).unwrap();
        assert_eq!(names, vec!["a.yaml", "b.yaml", "c.yml"]);
    }
}
