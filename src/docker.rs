use crate::config::RegistryCredentials;
use crate::docker::Error::IOError;
use crate::synth;
use log::debug;
use std::io::Write;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("docker build failed with exit code {0}")]
    Build(ExitStatus),

    #[error("docker login failed with exit code {0}")]
    Login(ExitStatus),

    #[error("docker logout failed with exit code {0}")]
    Logout(ExitStatus),

    #[error("docker push failed with exit code {0}")]
    Push(ExitStatus),

    #[error("docker run failed with exit code {0}")]
    Run(ExitStatus),

    #[error("docker start failed with exit code {0}")]
    Start(ExitStatus),

    #[error("docker stop failed with exit code {0}")]
    Stop(ExitStatus),

    #[error("docker rm failed with exit code {0}")]
    Remove(ExitStatus),

    #[error("docker logs failed with exit code {0}")]
    Logs(ExitStatus),

    #[error("docker ps failed with exit code {0}")]
    Ps(ExitStatus),

    #[error(transparent)]
    IOError(#[from] std::io::Error),
}

/// Stock runtime image used for local runs and as the service container in
/// the cluster manifests.
pub const SERVICE_IMAGE: &str = "socketcluster/socketcluster:v5.0.0";

/// Port the runtime image listens on inside the container.
pub const CONTAINER_PORT: u16 = 8000;

/// Collaborator for the image pre-step of a rollout.
pub trait ContainerRuntime {
    fn build(&self, image: &str, context: &Path) -> Result<(), Error>;
    fn push(&self, image: &str, registry: &str, credentials: &RegistryCredentials)
        -> Result<(), Error>;
}

/// The real Docker CLI.
pub struct DockerCli;

impl ContainerRuntime for DockerCli {
    fn build(&self, image: &str, context: &Path) -> Result<(), Error> {
        build(image, context)
    }

    fn push(
        &self,
        image: &str,
        registry: &str,
        credentials: &RegistryCredentials,
    ) -> Result<(), Error> {
        login(registry, credentials)?;
        push(image)?;
        if let Err(err) = logout(registry) {
            debug!("docker logout failed: {}", err);
        }
        Ok(())
    }
}

pub fn build(image: &str, context: &Path) -> Result<(), Error> {
    debug!("Building image {}", image);
    std::process::Command::new("docker")
        .arg("build")
        .arg("--tag")
        .arg(image)
        .arg(context)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map(|exit_status| {
            if exit_status.success() {
                Ok(())
            } else {
                Err(Error::Build(exit_status))
            }
        })?
}

pub fn login(registry: &str, credentials: &RegistryCredentials) -> Result<(), Error> {
    debug!("Logging in to Docker registry {}", registry);
    let mut child = std::process::Command::new("docker")
        .arg("login")
        .arg(registry)
        .arg("--username")
        .arg(&credentials.username)
        .arg("--password-stdin")
        .stdin(Stdio::piped())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(IOError)?;

    child.stdin.as_mut().unwrap().write_all(credentials.password.as_bytes())?;
    let status = child.wait_with_output()?.status;
    if status.success() {
        Ok(())
    } else {
        Err(Error::Login(status))
    }
}

pub fn logout(registry: &str) -> Result<(), Error> {
    std::process::Command::new("docker")
        .arg("logout")
        .arg(registry)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map(|exit_status| {
            if exit_status.success() {
                Ok(())
            } else {
                Err(Error::Logout(exit_status))
            }
        })?
}

pub fn push(image: &str) -> Result<(), Error> {
    debug!("Pushing image {}", image);
    std::process::Command::new("docker")
        .arg("push")
        .arg(image)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map(|exit_status| {
            if exit_status.success() {
                Ok(())
            } else {
                Err(Error::Push(exit_status))
            }
        })?
}

/// Runs the app detached on the stock runtime image, with the app directory
/// bind-mounted over the image's source path.
pub fn run_detached(name: &str, port: u16, app_dir: &Path) -> Result<(), Error> {
    debug!("Starting container {} on port {}", name, port);
    std::process::Command::new("docker")
        .arg("run")
        .arg("--detach")
        .arg("--publish")
        .arg(format!("{port}:{CONTAINER_PORT}"))
        .arg("--volume")
        .arg(format!("{}:{}", app_dir.display(), synth::APP_SOURCE_PATH))
        .arg("--env")
        .arg(format!(
            "{}={}",
            synth::WORKER_CONTROLLER_ENV,
            synth::WORKER_CONTROLLER_PATH
        ))
        .arg("--name")
        .arg(name)
        .arg(SERVICE_IMAGE)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map(|exit_status| {
            if exit_status.success() {
                Ok(())
            } else {
                Err(Error::Run(exit_status))
            }
        })?
}

pub fn start(name: &str) -> Result<(), Error> {
    std::process::Command::new("docker")
        .arg("start")
        .arg(name)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map(|exit_status| {
            if exit_status.success() {
                Ok(())
            } else {
                Err(Error::Start(exit_status))
            }
        })?
}

pub fn stop(name: &str) -> Result<(), Error> {
    std::process::Command::new("docker")
        .arg("stop")
        .arg(name)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map(|exit_status| {
            if exit_status.success() {
                Ok(())
            } else {
                Err(Error::Stop(exit_status))
            }
        })?
}

pub fn remove(name: &str) -> Result<(), Error> {
    std::process::Command::new("docker")
        .arg("rm")
        .arg(name)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map(|exit_status| {
            if exit_status.success() {
                Ok(())
            } else {
                Err(Error::Remove(exit_status))
            }
        })?
}

pub fn logs(name: &str, follow: bool) -> Result<(), Error> {
    let mut command = std::process::Command::new("docker");
    command.arg("logs");
    if follow {
        command.arg("--follow");
    }
    command
        .arg(name)
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map(|exit_status| {
            if exit_status.success() {
                Ok(())
            } else {
                Err(Error::Logs(exit_status))
            }
        })?
}

pub fn ps() -> Result<(), Error> {
    std::process::Command::new("docker")
        .arg("ps")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .map(|exit_status| {
            if exit_status.success() {
                Ok(())
            } else {
                Err(Error::Ps(exit_status))
            }
        })?
}

fn quiet(args: &[&str]) -> std::io::Result<ExitStatus> {
    std::process::Command::new("docker")
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
}

/// Best-effort stop. Returns whether a running container was stopped.
pub fn stop_quiet(name: &str) -> bool {
    quiet(&["stop", name]).map(|s| s.success()).unwrap_or(false)
}

/// Best-effort cleanup of any previous container with this name, so a fresh
/// run never collides with a stale one.
pub fn remove_existing(name: &str) {
    let _ = quiet(&["stop", name]);
    let _ = quiet(&["rm", name]);
}
