use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::debug;

use tfrun::config::LauncherConfig;
use tfrun::logging::{self, LoggingOptions};
use tfrun::parser::{ConstraintSource, TerraformConfigParser};
use tfrun::{LaunchError, Launcher, exec};

/// Exit code for failures outside the launch pipeline (bad flags, runtime setup)
const GENERIC_FAILURE: u8 = 1;

#[derive(Parser, Debug)]
#[command(name = "tfrun")]
#[command(
    version,
    about = "Run the Terraform version required by the current project",
    after_help = "Arguments after the options are passed to terraform unchanged. \
                  Use `--` to pass arguments that look like tfrun options."
)]
struct Cli {
    /// Project directory to read `required_version` from; terraform runs there too
    #[arg(short = 'C', long, env = "TFRUN_CHDIR", value_name = "DIR")]
    chdir: Option<PathBuf>,

    /// Use this constraint instead of reading the project configuration
    #[arg(long, env = "TFRUN_CONSTRAINT")]
    constraint: Option<String>,

    /// Root of the version cache
    #[arg(long, env = "TFRUN_CACHE_DIR", value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Base URL of the release index and artifact store
    #[arg(long, env = "TFRUN_RELEASES_URL", value_name = "URL")]
    releases_url: Option<String>,

    /// JSON configuration file
    #[arg(long, env = "TFRUN_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Skip SHA256SUMS verification of downloaded archives
    #[arg(long, env = "TFRUN_NO_VERIFY")]
    no_verify: bool,

    /// Let pre-releases win even when the constraint does not name one
    #[arg(long, env = "TFRUN_ALLOW_PRERELEASE")]
    allow_prerelease: bool,

    /// Resolve and install, then print the executable path instead of running it
    #[arg(long, env = "TFRUN_PRINT_PATH")]
    print_path: bool,

    /// Log filter, e.g. `info` or `tfrun=debug` (overrides RUST_LOG)
    #[arg(long, env = "TFRUN_LOG_LEVEL", value_name = "FILTER")]
    log_level: Option<String>,

    /// Also write JSON logs to this file
    #[arg(long, env = "TFRUN_LOG_FILE", value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Arguments for terraform
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    args: Vec<OsString>,
}

impl Cli {
    fn logging_options(&self) -> LoggingOptions {
        LoggingOptions {
            level: self.log_level.clone(),
            file: self.log_file.clone(),
        }
    }

    /// Configuration file values overridden by flags and environment
    fn launcher_config(&self) -> Result<LauncherConfig, LaunchError> {
        let mut config = match &self.config {
            Some(path) => LauncherConfig::load(path)?,
            None => LauncherConfig::default(),
        };

        if let Some(dir) = &self.cache_dir {
            config.cache_dir = Some(dir.clone());
        }
        if let Some(url) = &self.releases_url {
            config.releases_url = url.clone();
        }
        if self.no_verify {
            config.verify_checksum = false;
        }
        if self.allow_prerelease {
            config.allow_prerelease = true;
        }

        Ok(config)
    }

    fn project_dir(&self) -> PathBuf {
        self.chdir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    /// The constraint to satisfy, from the flag or the project configuration
    fn constraint(&self) -> Result<String, LaunchError> {
        match &self.constraint {
            Some(constraint) => Ok(constraint.clone()),
            None => Ok(TerraformConfigParser::new().required_constraint(&self.project_dir())?),
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<u8> {
    let config = cli.launcher_config()?;
    let constraint = cli.constraint()?;
    debug!(?config, constraint = %constraint, "Starting launch");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let executable = runtime.block_on(async {
        let launcher = Launcher::from_config(&config)?;
        launcher.prepare(&constraint).await
    })?;
    drop(runtime);

    if cli.print_path {
        println!("{}", executable.display());
        return Ok(0);
    }

    let status = exec::exec_binary(&executable, &cli.args, cli.chdir.as_deref())?;
    Ok(exec::exit_code(&status))
}

fn failure_code(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<LaunchError>()
        .map(LaunchError::exit_code)
        .unwrap_or(GENERIC_FAILURE)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _log_guard = match logging::init(&cli.logging_options()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("error: {:#}", err);
            return ExitCode::from(GENERIC_FAILURE);
        }
    };

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(failure_code(&err))
        }
    }
}
