//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Tolerador: run resilient end-to-end scenarios against the demo webshop
#[derive(Parser, Debug)]
#[command(name = "tolerador")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run scenarios in a headless browser
    Run(RunArgs),

    /// List available scenarios
    List(ListArgs),

    /// Validate a scenario file without running it
    Validate(ValidateArgs),
}

/// Arguments for the run command
#[derive(Parser, Debug, Clone, Default)]
pub struct RunArgs {
    /// Run only this scenario (repeatable)
    #[arg(short, long = "scenario", value_name = "NAME")]
    pub scenarios: Vec<String>,

    /// Run only scenarios in this group (repeatable)
    #[arg(short, long = "group", value_name = "GROUP")]
    pub groups: Vec<String>,

    /// Load scenarios from a YAML file instead of the built-in catalog
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Report format on stdout
    #[arg(long, value_enum, default_value = "text")]
    pub format: FormatArg,

    /// Also write the JSON report to this path
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Scenarios to run at once, each in its own session
    #[arg(short = 'j', long, default_value = "1")]
    pub jobs: usize,

    /// Base URL of the shop (overrides TOLERAR_BASE_URL)
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Bound for the page to settle, in milliseconds
    #[arg(long, value_name = "MS")]
    pub idle_timeout_ms: Option<u64>,

    /// Bound for required elements and assertions, in milliseconds
    #[arg(long, value_name = "MS")]
    pub element_timeout_ms: Option<u64>,

    /// Bound for optional steps and branch probes, in milliseconds
    #[arg(long, value_name = "MS")]
    pub optional_timeout_ms: Option<u64>,

    /// Bound for a navigation to commit, in milliseconds
    #[arg(long, value_name = "MS")]
    pub navigation_timeout_ms: Option<u64>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Chromium executable
    #[arg(long, env = "CHROMIUM_PATH", value_name = "PATH")]
    pub chromium_path: Option<PathBuf>,

    /// Disable the Chromium sandbox (containers, CI)
    #[arg(long)]
    pub no_sandbox: bool,
}

/// Arguments for the list command
#[derive(Parser, Debug, Clone, Default)]
pub struct ListArgs {
    /// Only list scenarios in this group (repeatable)
    #[arg(short, long = "group", value_name = "GROUP")]
    pub groups: Vec<String>,

    /// List scenarios from a YAML file instead of the built-in catalog
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: FormatArg,
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone)]
pub struct ValidateArgs {
    /// Scenario file to check
    pub file: PathBuf,
}

/// Report format argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// Human-readable text
    #[default]
    Text,
    /// JSON
    Json,
}

impl From<FormatArg> for crate::output::OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}

/// Color choice argument
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::ColorChoice;
    use crate::output::OutputFormat;

    mod parse_tests {
        use super::*;

        #[test]
        fn test_run_defaults() {
            let cli = Cli::try_parse_from(["tolerador", "run"]).unwrap();
            let Commands::Run(args) = cli.command else {
                panic!("expected run");
            };
            assert!(args.scenarios.is_empty());
            assert!(args.groups.is_empty());
            assert_eq!(args.jobs, 1);
            assert_eq!(args.format, FormatArg::Text);
            assert!(!args.headed);
        }

        #[test]
        fn test_run_repeated_filters() {
            let cli = Cli::try_parse_from([
                "tolerador",
                "run",
                "--scenario",
                "empty search results",
                "-s",
                "add product to cart",
                "--group",
                "auth",
                "-j",
                "4",
                "--format",
                "json",
            ])
            .unwrap();
            let Commands::Run(args) = cli.command else {
                panic!("expected run");
            };
            assert_eq!(
                args.scenarios,
                vec!["empty search results", "add product to cart"]
            );
            assert_eq!(args.groups, vec!["auth"]);
            assert_eq!(args.jobs, 4);
            assert_eq!(args.format, FormatArg::Json);
        }

        #[test]
        fn test_timeouts_and_browser_flags() {
            let cli = Cli::try_parse_from([
                "tolerador",
                "run",
                "--base-url",
                "http://localhost:8080/",
                "--element-timeout-ms",
                "2500",
                "--headed",
                "--no-sandbox",
            ])
            .unwrap();
            let Commands::Run(args) = cli.command else {
                panic!("expected run");
            };
            assert_eq!(args.base_url.as_deref(), Some("http://localhost:8080/"));
            assert_eq!(args.element_timeout_ms, Some(2500));
            assert!(args.headed);
            assert!(args.no_sandbox);
        }

        #[test]
        fn test_global_verbosity() {
            let cli = Cli::try_parse_from(["tolerador", "list", "-vv"]).unwrap();
            assert_eq!(cli.verbose, 2);
            assert!(!cli.quiet);
        }

        #[test]
        fn test_validate_requires_file() {
            assert!(Cli::try_parse_from(["tolerador", "validate"]).is_err());
        }

        #[test]
        fn test_unknown_format_rejected() {
            assert!(Cli::try_parse_from(["tolerador", "list", "--format", "tap"]).is_err());
        }
    }

    mod conversion_tests {
        use super::*;

        #[test]
        fn test_format_conversion() {
            assert_eq!(OutputFormat::from(FormatArg::Text), OutputFormat::Text);
            assert_eq!(OutputFormat::from(FormatArg::Json), OutputFormat::Json);
        }

        #[test]
        fn test_color_conversion() {
            assert_eq!(ColorChoice::from(ColorArg::Never), ColorChoice::Never);
            assert_eq!(ColorChoice::from(ColorArg::Always), ColorChoice::Always);
            assert_eq!(ColorChoice::from(ColorArg::Auto), ColorChoice::Auto);
        }
    }
}
