use anyhow::{bail, Context, Result};
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

use bwpdeploy::cli::{self, Invocation, Mode};
use bwpdeploy::cmd::{DryRunHost, Host, SystemHost};
use bwpdeploy::lifecycle::{Deployer, StepFailure};
use bwpdeploy::preflight;
use bwpdeploy::prompt::{AssumeYes, Confirm, TerminalConfirm};
use bwpdeploy::settings::{self, SettingsSource};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let invocation = match cli::parse(&args) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("Error: {}\n", e);
            eprint!("{}", cli::usage());
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&invocation) {
        eprintln!("\n✗ Error: {:#}", e);
        if let Some(failure) = e.downcast_ref::<StepFailure>() {
            if failure.completed.is_empty() {
                eprintln!("  No changes were applied before the failure.");
            } else {
                eprintln!("  Already applied (not rolled back):");
                for step in &failure.completed {
                    eprintln!("    - {}", step);
                }
            }
        }
        std::process::exit(1);
    }
}

fn run(invocation: &Invocation) -> Result<()> {
    let settings = settings::load(&SettingsSource::from_arg(invocation.settings.as_deref()))?;

    if !invocation.source.is_dir() {
        bail!(
            "Source directory not found: {}",
            invocation.source.display()
        );
    }
    let source = invocation
        .source
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", invocation.source.display()))?;

    if invocation.mode.is_mutating() && !invocation.dry_run {
        if !preflight::is_root() {
            bail!("bratwurstpower-deploy must be run as root (use sudo)");
        }
        preflight::check_programs(invocation.mode, &settings.python)?;
    }

    let host: Box<dyn Host> = if invocation.dry_run {
        Box::new(DryRunHost::new())
    } else {
        Box::new(SystemHost)
    };
    let deployer = Deployer::new(&*host, &settings, &source, Path::new("/"));

    match invocation.mode {
        Mode::Install => deployer.install(),
        Mode::Update => {
            let mut confirm: Box<dyn Confirm> = if invocation.assume_yes {
                Box::new(AssumeYes)
            } else {
                Box::new(TerminalConfirm)
            };
            deployer.update(&mut *confirm).map(|_| ())
        }
        Mode::Uninstall => deployer.uninstall(),
        Mode::Status => {
            let status = deployer.status()?;
            println!("{}", status);
            Ok(())
        }
    }
}
