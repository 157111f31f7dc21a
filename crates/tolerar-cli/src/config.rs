//! CLI configuration

use crate::commands::RunArgs;
use crate::error::{CliError, CliResult};
use crate::output::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tolerar::config::RunnerConfig;
use tolerar::driver::DriverConfig;

/// CLI verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verbosity {
    /// Quiet - minimal output
    Quiet,
    /// Normal - default output
    #[default]
    Normal,
    /// Verbose - extra output
    Verbose,
    /// Debug - maximum output
    Debug,
}

impl Verbosity {
    /// From the `-q` flag and the `-v` count
    #[must_use]
    pub const fn from_flags(quiet: bool, verbose: u8) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            _ => Self::Debug,
        }
    }

    /// Check if quiet mode
    #[must_use]
    pub const fn is_quiet(self) -> bool {
        matches!(self, Self::Quiet)
    }

    /// Check if verbose or higher
    #[must_use]
    pub const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose | Self::Debug)
    }

    /// Check if debug mode
    #[must_use]
    pub const fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Color output choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorChoice {
    /// Always use colors
    Always,
    /// Use colors when output is a terminal
    #[default]
    Auto,
    /// Never use colors
    Never,
}

impl ColorChoice {
    /// Should use colors based on output detection
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            // progress and verdicts go to stderr
            Self::Auto => std::io::IsTerminal::is_terminal(&std::io::stderr()),
        }
    }
}

/// Global CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Verbosity level
    pub verbosity: Verbosity,
    /// Color output choice
    pub color: ColorChoice,
}

impl CliConfig {
    /// Create new default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set verbosity
    #[must_use]
    pub const fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set color choice
    #[must_use]
    pub const fn with_color(mut self, color: ColorChoice) -> Self {
        self.color = color;
        self
    }
}

/// Everything a `run` needs, after layering defaults, environment and flags
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Scenario runner bounds and base URL
    pub runner: RunnerConfig,
    /// Browser launch options
    pub driver: DriverConfig,
    /// Scenarios run at once
    pub jobs: usize,
    /// Report format on stdout
    pub format: OutputFormat,
    /// Optional JSON report path
    pub output: Option<PathBuf>,
}

impl RunSettings {
    /// Resolve settings from the process environment and `args`
    pub fn from_args(args: &RunArgs) -> CliResult<Self> {
        Self::resolve(args, |key| std::env::var(key).ok())
    }

    /// Resolve settings with `lookup` standing in for the environment
    ///
    /// Flags win over environment variables, which win over defaults.
    pub fn resolve(args: &RunArgs, lookup: impl Fn(&str) -> Option<String>) -> CliResult<Self> {
        if args.jobs == 0 {
            return Err(CliError::invalid_argument("--jobs must be at least 1"));
        }

        let mut runner = RunnerConfig::from_lookup(lookup)?;
        if let Some(ref url) = args.base_url {
            runner = runner.with_base_url(url.clone());
        }
        if let Some(ms) = args.idle_timeout_ms {
            runner = runner.with_idle_timeout(ms);
        }
        if let Some(ms) = args.element_timeout_ms {
            runner = runner.with_element_timeout(ms);
        }
        if let Some(ms) = args.optional_timeout_ms {
            runner = runner.with_optional_timeout(ms);
        }
        if let Some(ms) = args.navigation_timeout_ms {
            runner = runner.with_navigation_timeout(ms);
        }
        runner.validate()?;

        let mut driver = DriverConfig::new()
            .headless(!args.headed)
            .no_sandbox(args.no_sandbox)
            .navigation_timeout(Duration::from_millis(runner.navigation_timeout_ms));
        if let Some(ref path) = args.chromium_path {
            driver = driver.executable(path.clone());
        }

        Ok(Self {
            runner,
            driver,
            jobs: args.jobs,
            format: args.format.into(),
            output: args.output.clone(),
        })
    }
}
