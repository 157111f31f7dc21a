//! Output formatting and progress reporting

use console::{style, Style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tolerar::report::{ScenarioOutcome, ScenarioReport};
use tolerar::scenario::Scenario;

/// Output format for reports and listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// One row of `tolerador list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioSummary {
    /// Scenario name
    pub name: String,
    /// Group
    pub group: String,
    /// Starting path
    pub start: String,
    /// Steps including nested ones
    pub steps: usize,
}

impl From<&Scenario> for ScenarioSummary {
    fn from(scenario: &Scenario) -> Self {
        Self {
            name: scenario.name.clone(),
            group: scenario.group.clone(),
            start: scenario.start.clone(),
            steps: scenario.step_count(),
        }
    }
}

/// Render a scenario listing
pub fn render_listing(scenarios: &[&Scenario], format: OutputFormat) -> serde_json::Result<String> {
    let rows: Vec<ScenarioSummary> = scenarios.iter().map(|s| ScenarioSummary::from(*s)).collect();
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&rows),
        OutputFormat::Text => {
            let width = rows.iter().map(|r| r.group.len()).max().unwrap_or(0);
            let mut out = String::new();
            for row in &rows {
                out.push_str(&format!(
                    "{:<width$}  {}  ({} steps)\n",
                    row.group, row.name, row.steps
                ));
            }
            Ok(out)
        }
    }
}

/// Progress reporter for scenario execution
#[derive(Debug)]
pub struct ProgressReporter {
    term: Term,
    progress_bar: Option<ProgressBar>,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl ProgressReporter {
    /// Create a new progress reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stderr(),
            progress_bar: None,
            use_color,
            quiet,
        }
    }

    /// Start a progress bar over `total` scenarios
    pub fn start_progress(&mut self, total: u64, message: &str) {
        if self.quiet || !self.term.is_term() {
            return;
        }

        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(message.to_string());
        self.progress_bar = Some(pb);
    }

    /// Increment progress
    pub fn increment(&self, delta: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.inc(delta);
        }
    }

    /// Update progress message
    pub fn set_message(&self, message: &str) {
        if let Some(ref pb) = self.progress_bar {
            pb.set_message(message.to_string());
        }
    }

    /// Finish progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_and_clear();
        }
    }

    fn line(&self, text: &str) {
        match self.progress_bar {
            Some(ref pb) => pb.println(text),
            None => {
                let _ = self.term.write_line(text);
            }
        }
    }

    fn prefix(&self, glyph: &str, plain: &str, color: &Style) -> String {
        if self.use_color {
            color.apply_to(glyph).bold().to_string()
        } else {
            plain.to_string()
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefix("✓", "PASS", &Style::new().green());
        self.line(&format!("{prefix} {message}"));
    }

    /// Print a failure message
    pub fn failure(&self, message: &str) {
        // Always print failures, even in quiet mode
        let prefix = self.prefix("✗", "FAIL", &Style::new().red());
        self.line(&format!("{prefix} {message}"));
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefix("⚠", "WARN", &Style::new().yellow());
        self.line(&format!("{prefix} {message}"));
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.quiet {
            return;
        }
        let prefix = self.prefix("ℹ", "INFO", &Style::new().blue());
        self.line(&format!("{prefix} {message}"));
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }

        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };

        self.line("");
        self.line(&styled);
    }

    /// Report one finished scenario and advance the bar
    pub fn scenario_finished(&self, report: &ScenarioReport) {
        let label = format!("{} [{}] ({}ms)", report.name, report.group, report.duration_ms);
        match &report.outcome {
            ScenarioOutcome::Passed => self.success(&label),
            ScenarioOutcome::PassedWithSkips(skips) => {
                self.success(&format!("{label} with {} skip(s)", skips.len()));
                for skip in skips {
                    self.warning(&format!("  {skip}"));
                }
            }
            ScenarioOutcome::Failed(failure) => {
                self.failure(&label);
                self.failure(&format!("  {failure}"));
            }
        }
        self.increment(1);
    }

    /// Print run summary
    pub fn summary(&self, passed: usize, with_skips: usize, failed: usize, duration: Duration) {
        if self.quiet && failed == 0 {
            return;
        }

        self.line("");

        let total = passed + with_skips + failed;
        let duration_secs = duration.as_secs_f64();

        if self.use_color {
            let passed_style = Style::new().green().bold();
            let failed_style = Style::new().red().bold();
            let skipped_style = Style::new().yellow();

            let status = if failed > 0 {
                failed_style.apply_to("FAILED")
            } else {
                passed_style.apply_to("PASSED")
            };

            self.line(&format!(
                "{} {} scenarios in {:.2}s ({} passed, {} passed with skips, {} failed)",
                status,
                total,
                duration_secs,
                passed_style.apply_to(passed),
                skipped_style.apply_to(with_skips),
                if failed > 0 {
                    failed_style.apply_to(failed).to_string()
                } else {
                    failed.to_string()
                },
            ));
        } else {
            let status = if failed > 0 { "FAILED" } else { "PASSED" };
            self.line(&format!(
                "{status} {total} scenarios in {duration_secs:.2}s ({passed} passed, {with_skips} passed with skips, {failed} failed)"
            ));
        }
    }
}
