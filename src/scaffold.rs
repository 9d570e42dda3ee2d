//! App scaffolding: writes the embedded boilerplate for a new SCC app and
//! reads app identity back out of `package.json`.

use crate::manifest;
use crate::synth;
use log::debug;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("write {path}: {err}")]
    WriteFile { err: std::io::Error, path: String },

    #[error("read {path}: {err}")]
    ReadFile { err: std::io::Error, path: String },

    #[error("parse {path}: {err}")]
    Parse { err: serde_json::Error, path: String },

    #[error("{0} does not contain an app (no \"name\" in package.json)")]
    NoAppName(String),

    #[error("synthesize manifests: {0}")]
    Synth(#[from] synth::Error),
}

pub const PACKAGE_FILE: &str = "package.json";

const BOILERPLATE: &[(&str, &str)] = &[
    (PACKAGE_FILE, include_str!("../boilerplate/package.json")),
    ("server.js", include_str!("../boilerplate/server.js")),
    ("worker.js", include_str!("../boilerplate/worker.js")),
    ("Dockerfile", include_str!("../boilerplate/Dockerfile")),
    (".dockerignore", include_str!("../boilerplate/.dockerignore")),
];

/// Writes a fresh app named `app_name` into `dest`: the JS boilerplate, a
/// Dockerfile, and the manifest template set under `kubernetes/`.
pub fn create_app(dest: &Path, app_name: &str) -> Result<(), Error> {
    std::fs::create_dir_all(dest).map_err(|err| Error::WriteFile {
        err,
        path: dest.display().to_string(),
    })?;

    for (file_name, contents) in BOILERPLATE {
        let path = dest.join(file_name);
        debug!("Writing {}", path.display());
        std::fs::write(&path, contents).map_err(|err| Error::WriteFile {
            err,
            path: path.display().to_string(),
        })?;
    }

    synth::materialize(&dest.join(manifest::MANIFEST_DIR))?;
    set_app_name(dest, app_name)
}

/// The app's name, read from the `name` field of its `package.json`.
pub fn app_name(app_dir: &Path) -> Result<String, Error> {
    let package = read_package(app_dir)?;
    package
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::NoAppName(app_dir.display().to_string()))
}

fn read_package(app_dir: &Path) -> Result<Value, Error> {
    let path = app_dir.join(PACKAGE_FILE);
    let raw = std::fs::read_to_string(&path).map_err(|err| Error::ReadFile {
        err,
        path: path.display().to_string(),
    })?;
    serde_json::from_str(&raw).map_err(|err| Error::Parse {
        err,
        path: path.display().to_string(),
    })
}

fn set_app_name(app_dir: &Path, app_name: &str) -> Result<(), Error> {
    let mut package = read_package(app_dir)?;
    if let Some(object) = package.as_object_mut() {
        object.insert("name".to_string(), Value::String(app_name.to_string()));
    }
    let path = app_dir.join(PACKAGE_FILE);
    let mut serialized = serde_json::to_string_pretty(&package).map_err(|err| Error::Parse {
        err,
        path: path.display().to_string(),
    })?;
    serialized.push('\n');
    std::fs::write(&path, serialized).map_err(|err| Error::WriteFile {
        err,
        path: path.display().to_string(),
    })
}
