use clap::{CommandFactory, Parser};
use std::process::ExitCode;

use vclone::cli::Args;
use vclone::config::{self, CloneConfig, ConfigError};
use vclone::error::AppError;
use vclone::{logging, pipeline};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    let config = match config::resolve(&args) {
        Ok(config) => config,
        Err(e) => {
            logging::init(args.verbose);
            if matches!(e, ConfigError::MissingRequired(_)) {
                let _ = Args::command().print_help();
                eprintln!();
            }
            return Err(e.into());
        }
    };
    logging::init(config.verbose);

    let config = ensure_password(config)?;
    tracing::debug!(?config, "resolved configuration");

    let report = pipeline::run(&config).await?;
    for vm in &report.created {
        match (&vm.vm, &vm.nic) {
            (Some(id), Some(nic)) => println!("{}\t{id}\t{nic}", vm.name),
            (Some(id), None) => println!("{}\t{id}", vm.name),
            _ => println!("{}", vm.name),
        }
    }
    Ok(())
}

fn ensure_password(config: CloneConfig) -> Result<CloneConfig, ConfigError> {
    if config.password.is_some() {
        return Ok(config);
    }
    let password = dialoguer::Password::new()
        .with_prompt(format!("Password for {}@{}", config.user, config.host))
        .allow_empty_password(true)
        .interact()
        .map_err(|e| ConfigError::Prompt(e.to_string()))?;
    Ok(config.with_password(password))
}
