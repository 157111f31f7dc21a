//! Command handlers shared by the binary and the tests

use crate::commands::{ListArgs, RunArgs, ValidateArgs};
use crate::config::RunSettings;
use crate::error::{CliError, CliResult};
use crate::output::{render_listing, OutputFormat, ProgressReporter};
use std::path::{Path, PathBuf};
use tolerar::driver::DriverFactory;
use tolerar::report::RunReport;
use tolerar::runner::ScenarioRunner;
use tolerar::scenario::{load_scenarios, Scenario};
use tolerar::suite::{Selection, Suite};
use tracing::{debug, info};

/// Where scenarios come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioSource {
    /// The built-in webshop catalog
    Catalog,
    /// A YAML scenario file
    File(PathBuf),
}

impl ScenarioSource {
    /// Catalog unless a file was given
    #[must_use]
    pub fn from_option(file: Option<&Path>) -> Self {
        file.map_or(Self::Catalog, |path| Self::File(path.to_path_buf()))
    }

    /// Load and validate the scenarios
    pub fn load(&self) -> CliResult<Vec<Scenario>> {
        match self {
            Self::Catalog => Ok(tolerar::catalog::all()),
            Self::File(path) => {
                debug!(path = %path.display(), "loading scenario file");
                Ok(load_scenarios(path)?)
            }
        }
    }
}

/// Render the listing for `tolerador list`
pub fn list(args: &ListArgs) -> CliResult<String> {
    let suite = Suite::new(ScenarioSource::from_option(args.file.as_deref()).load()?);
    let selection = Selection::all().groups(args.groups.iter().cloned());
    let selected = suite.select(&selection)?;
    render_listing(&selected, args.format.into())
        .map_err(|e| CliError::report_generation(e.to_string()))
}

/// Check a scenario file, returning how many scenarios it holds
pub fn validate(args: &ValidateArgs) -> CliResult<usize> {
    let scenarios = load_scenarios(&args.file)?;
    Ok(scenarios.len())
}

/// A run whose scenarios and settings are resolved but not yet executed
///
/// Built before the browser launches so bad selections and bad settings
/// fail without starting Chromium.
#[derive(Debug)]
pub struct RunPlan {
    suite: Suite,
    selection: Selection,
    /// Resolved settings
    pub settings: RunSettings,
}

impl RunPlan {
    /// Resolve settings from the environment and `args`
    pub fn from_args(args: &RunArgs) -> CliResult<Self> {
        Self::with_settings(args, RunSettings::from_args(args)?)
    }

    /// Build a plan from already-resolved settings
    pub fn with_settings(args: &RunArgs, settings: RunSettings) -> CliResult<Self> {
        let scenarios = ScenarioSource::from_option(args.file.as_deref()).load()?;
        let suite = Suite::new(scenarios).with_concurrency(settings.jobs);
        let selection = Selection::all()
            .names(args.scenarios.iter().cloned())
            .groups(args.groups.iter().cloned());
        // surface unknown names and groups now
        let _ = suite.select(&selection)?;
        Ok(Self {
            suite,
            selection,
            settings,
        })
    }

    /// Number of scenarios that will run
    #[must_use]
    pub fn selected_count(&self) -> usize {
        self.suite.select(&self.selection).map_or(0, |s| s.len())
    }

    /// Run every selected scenario, one session each
    pub async fn execute(
        &self,
        factory: &dyn DriverFactory,
        reporter: &mut ProgressReporter,
    ) -> CliResult<RunReport> {
        let total = self.selected_count();
        info!(
            scenarios = total,
            jobs = self.settings.jobs,
            base_url = %self.settings.runner.base_url,
            "starting run"
        );
        reporter.header(&format!(
            "Running {total} scenario(s) against {}",
            self.settings.runner.base_url
        ));
        reporter.start_progress(total as u64, "scenarios");

        let runner = ScenarioRunner::new(self.settings.runner.clone());
        let progress: &ProgressReporter = reporter;
        let result = self
            .suite
            .run_with_progress(factory, &runner, &self.selection, &|report| {
                progress.scenario_finished(report);
            })
            .await;
        reporter.finish();
        let report = result?;

        reporter.summary(
            report.passed_count(),
            report.passed_with_skips_count(),
            report.failed_count(),
            report.duration(),
        );
        Ok(report)
    }
}

/// Print and save the run report, then turn failures into an error
pub fn finish_run(report: &RunReport, settings: &RunSettings) -> CliResult<()> {
    let json = report.to_json()?;
    if settings.format == OutputFormat::Json {
        println!("{json}");
    }
    if let Some(ref path) = settings.output {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &json)?;
        info!(path = %path.display(), "report written");
    }
    check_report(report)
}

/// Error when any scenario failed
pub fn check_report(report: &RunReport) -> CliResult<()> {
    let failed = report.failed_count();
    if failed > 0 {
        return Err(CliError::ScenariosFailed {
            failed,
            total: report.scenarios.len(),
        });
    }
    Ok(())
}
