//! Tolerador: run resilient scenarios against the demo webshop
//!
//! ## Usage
//!
//! ```bash
//! tolerador list                              # Show the built-in catalog
//! tolerador run                               # Run every scenario
//! tolerador run -g cart -j 4                  # One group, four sessions at once
//! tolerador run --file shop.yaml --format json
//! tolerador validate shop.yaml                # Check a scenario file
//! ```

use clap::Parser;
use std::process::ExitCode;
use tolerador::{
    logging::init_logging, runner, Cli, CliConfig, CliResult, ColorChoice, Commands,
    ProgressReporter, RunArgs, ValidateArgs, Verbosity,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let config = build_config(&cli);
    init_logging(config.verbosity);

    match cli.command {
        Commands::Run(args) => run_scenarios(&config, &args),
        Commands::List(args) => {
            print!("{}", runner::list(&args)?);
            Ok(())
        }
        Commands::Validate(args) => run_validate(&config, &args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    let color: ColorChoice = cli.color.into();
    CliConfig::new().with_verbosity(verbosity).with_color(color)
}

fn reporter(config: &CliConfig) -> ProgressReporter {
    ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet())
}

fn run_validate(config: &CliConfig, args: &ValidateArgs) -> CliResult<()> {
    let count = runner::validate(args)?;
    reporter(config).success(&format!(
        "{}: {count} scenario(s) valid",
        args.file.display()
    ));
    Ok(())
}

#[cfg(feature = "browser")]
fn run_scenarios(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    use tolerador::{CliError, RunPlan};
    use tolerar::browser::CdpDriverFactory;
    use tolerar::driver::DriverFactory;

    let plan = RunPlan::from_args(args)?;
    let mut reporter = reporter(config);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::config(format!("Failed to create runtime: {e}")))?;

    let report = rt.block_on(async {
        let factory = CdpDriverFactory::launch(plan.settings.driver.clone()).await?;
        let result = plan.execute(&factory, &mut reporter).await;
        if let Err(e) = factory.shutdown().await {
            tracing::warn!(error = %e, "browser shutdown failed");
        }
        result
    })?;

    runner::finish_run(&report, &plan.settings)
}

#[cfg(not(feature = "browser"))]
fn run_scenarios(_config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    // still reject bad selections and settings
    let _ = tolerador::RunPlan::from_args(args)?;
    Err(tolerador::CliError::config(
        "browser support not compiled in. Rebuild with --features browser",
    ))
}
