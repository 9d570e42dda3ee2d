//! Baasil: scaffold, run, and deploy SocketCluster apps on Kubernetes.
use crate::Error::*;
use clap::{Parser, Subcommand};
use kubectl::AutoscalePolicy;
use log::{error, info};
use prompt::Prompt;
use std::path::{Path, PathBuf};
use thiserror::Error;

mod config;
mod docker;
mod kubectl;
mod manifest;
mod prompt;
mod rollout;
mod scaffold;
mod synth;
mod teardown;
mod version;

/// Build realtime SocketCluster apps and run them locally or on a
/// Kubernetes cluster.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scaffold a new SocketCluster app in a directory named after it.
    Create {
        app_name: String,

        /// Overwrite an existing directory without asking.
        #[arg(long)]
        force: bool,
    },
    /// Run an app locally inside a Docker container.
    Run {
        /// Root of the app directory tree.
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Host port to expose the app on.
        #[arg(short, long, default_value_t = docker::CONTAINER_PORT)]
        port: u16,
    },
    /// Restart a locally running app.
    Restart { app_name: String },
    /// Stop a locally running app and remove its container.
    Stop { app_name: String },
    /// List active containers on this machine.
    List,
    /// Show the logs of a locally running app.
    Logs {
        app_name: String,

        /// Keep following the log stream.
        #[arg(short, long)]
        follow: bool,
    },
    /// Deploy an app to your Kubernetes cluster for the first time.
    Deploy {
        #[arg(default_value = ".")]
        path: PathBuf,

        #[command(flatten)]
        options: DeployArgs,
    },
    /// Redeploy an app that is already running on the cluster.
    DeployUpdate {
        #[arg(default_value = ".")]
        path: PathBuf,

        #[command(flatten)]
        options: DeployArgs,
    },
    /// Remove a deployed app's resources from the cluster.
    Undeploy {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct DeployArgs {
    /// Version tag for this rollout; skips the interactive prompt.
    #[arg(long)]
    version_tag: Option<String>,

    /// Worker count for both scalable tiers.
    #[arg(long)]
    workers: Option<u32>,

    /// Broker count for both scalable tiers.
    #[arg(long)]
    brokers: Option<u32>,

    /// Skip autoscale policies on the scalable deployments.
    #[arg(long)]
    no_autoscale: bool,

    /// CPU utilization target for the autoscale policy, in percent.
    #[arg(long, default_value_t = rollout::DEFAULT_AUTOSCALE.cpu_percent)]
    autoscale_cpu: u32,

    /// Replica ceiling for the autoscale policy.
    #[arg(long, default_value_t = rollout::DEFAULT_AUTOSCALE.max_replicas)]
    autoscale_max: u32,
}

impl DeployArgs {
    fn to_options(&self) -> rollout::DeployOptions {
        rollout::DeployOptions {
            version_tag: self.version_tag.clone(),
            workers: self.workers,
            brokers: self.brokers,
            autoscale: if self.no_autoscale {
                None
            } else {
                Some(AutoscalePolicy {
                    cpu_percent: self.autoscale_cpu,
                    max_replicas: self.autoscale_max,
                })
            },
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("filesystem error: {0}")]
    FilesystemError(#[from] std::io::Error),

    #[error("'create' was aborted, {0} was left untouched")]
    CreateAborted(String),

    #[error("failed to create the app: {0}")]
    Create(#[from] scaffold::Error),

    #[error("could not determine the app name: {0}")]
    AppName(scaffold::Error),

    #[error("failed to run the '{app}' app: {err}")]
    Run { app: String, err: docker::Error },

    #[error("failed to restart the '{app}' app: {err}")]
    Restart { app: String, err: docker::Error },

    #[error("failed to stop the '{app}' app: {err}")]
    Stop { app: String, err: docker::Error },

    #[error("failed to list active containers: {0}")]
    List(docker::Error),

    #[error("failed to read the logs of the '{app}' app: {err}")]
    Logs { app: String, err: docker::Error },

    #[error("failed to deploy the '{app}' app: {err}")]
    Deploy { app: String, err: rollout::Error },

    #[error("failed to undeploy the '{app}' app: {err}")]
    Undeploy { app: String, err: teardown::Error },

    #[error("interactive prompt: {0}")]
    Prompt(#[from] prompt::Error),
}

fn main() {
    match run() {
        Ok(_) => std::process::exit(0),
        Err(err) => {
            error!("fatal: {}", err.to_string());
            std::process::exit(1)
        }
    }
}

fn run() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();

    match args.command {
        Commands::Create { app_name, force } => create(&app_name, force),
        Commands::Run { path, port } => {
            let app_dir = path.canonicalize()?;
            let app_name = scaffold::app_name(&app_dir).map_err(AppName)?;
            docker::remove_existing(&app_name);
            docker::run_detached(&app_name, port, &app_dir).map_err(|err| Run {
                app: app_name.clone(),
                err,
            })?;
            println!("The '{app_name}' app is running at http://localhost:{port}");
            Ok(())
        }
        Commands::Restart { app_name } => {
            if docker::stop_quiet(&app_name) {
                println!("The '{app_name}' app was stopped.");
            }
            docker::start(&app_name).map_err(|err| Restart {
                app: app_name.clone(),
                err,
            })?;
            println!("The '{app_name}' app is running.");
            Ok(())
        }
        Commands::Stop { app_name } => {
            docker::stop(&app_name)
                .and_then(|_| docker::remove(&app_name))
                .map_err(|err| Stop {
                    app: app_name.clone(),
                    err,
                })?;
            println!("The '{app_name}' app was stopped.");
            Ok(())
        }
        Commands::List => docker::ps().map_err(List),
        Commands::Logs { app_name, follow } => {
            docker::logs(&app_name, follow).map_err(|err| Logs { app: app_name, err })
        }
        Commands::Deploy { path, options } => {
            deploy(&path, &options, rollout::DeployMode::Create)
        }
        Commands::DeployUpdate { path, options } => {
            deploy(&path, &options, rollout::DeployMode::Update)
        }
        Commands::Undeploy { path } => undeploy(&path),
    }
}

fn create(app_name: &str, force: bool) -> Result<(), Error> {
    let dest = std::env::current_dir()?.join(app_name);
    if dest.exists() {
        let message = format!(
            "There is already a directory at {}. Do you want to overwrite it? (y/n)",
            dest.display()
        );
        if !force && !prompt::Terminal.confirm(&message)? {
            return Err(CreateAborted(dest.display().to_string()));
        }
        std::fs::remove_dir_all(&dest)?;
    }

    info!("Creating app structure...");
    scaffold::create_app(&dest, app_name)?;
    println!("The '{app_name}' app was created at {}.", dest.display());
    Ok(())
}

fn deploy(path: &Path, args: &DeployArgs, mode: rollout::DeployMode) -> Result<(), Error> {
    let app_dir = path.canonicalize()?;
    let app_name = scaffold::app_name(&app_dir).map_err(AppName)?;
    info!("Deploying the '{app_name}' app to your Kubernetes cluster...");

    let orchestrator = rollout::RolloutOrchestrator {
        runtime: &docker::DockerCli,
        control_plane: &kubectl::Kubectl,
        settle_delay: rollout::SETTLE_DELAY,
    };
    orchestrator
        .deploy(
            &app_dir,
            &app_name,
            &args.to_options(),
            mode,
            &mut prompt::Terminal,
        )
        .map_err(|err| Deploy {
            app: app_name.clone(),
            err,
        })?;

    println!("The '{app_name}' app was deployed successfully.");
    Ok(())
}

fn undeploy(path: &Path) -> Result<(), Error> {
    let app_dir = path.canonicalize()?;
    let app_name = scaffold::app_name(&app_dir).map_err(AppName)?;
    info!("Undeploying the '{app_name}' app...");

    let orchestrator = teardown::TeardownOrchestrator {
        control_plane: &kubectl::Kubectl,
    };
    orchestrator
        .teardown(&app_dir.join(manifest::MANIFEST_DIR))
        .map_err(|err| Undeploy {
            app: app_name.clone(),
            err,
        })?;

    println!("The '{app_name}' app was undeployed successfully.");
    Ok(())
}
