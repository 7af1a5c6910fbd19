//! Terminal rendering for the DocIntel CLI
//!
//! Every line is rendered to a `String` first and printed second, so the
//! plain (`--no-color`) form can be asserted on directly.

use crate::types::{TaskState, TaskSummary};
use crate::workflows::WorkflowOutput;
use owo_colors::OwoColorize;

/// Kind of a one-line status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Done,
    Note,
    Caution,
    Failure,
    Wrote,
    Kept,
}

impl Mark {
    fn glyph(self) -> &'static str {
        match self {
            Mark::Done | Mark::Wrote => "✓",
            Mark::Note => "›",
            Mark::Caution => "!",
            Mark::Failure => "✗",
            Mark::Kept => "·",
        }
    }

    /// Tag used in place of the glyph when colors are off.
    fn tag(self) -> &'static str {
        match self {
            Mark::Done => "done",
            Mark::Note => "note",
            Mark::Caution => "warn",
            Mark::Failure => "fail",
            Mark::Wrote => "wrote",
            Mark::Kept => "kept",
        }
    }
}

/// CLI printer; colors are decided once at construction.
pub struct Output {
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    fn mark_line(&self, mark: Mark, message: &str) -> String {
        if !self.colored {
            return format!("  {:<6}{}", mark.tag(), message);
        }
        let glyph = match mark {
            Mark::Done | Mark::Wrote => mark.glyph().green().bold().to_string(),
            Mark::Note => mark.glyph().blue().to_string(),
            Mark::Caution | Mark::Kept => mark.glyph().yellow().bold().to_string(),
            Mark::Failure => mark.glyph().red().bold().to_string(),
        };
        let body = match mark {
            Mark::Caution => message.yellow().to_string(),
            Mark::Failure => message.red().to_string(),
            Mark::Kept => message.dimmed().to_string(),
            _ => message.to_string(),
        };
        format!("  {} {}", glyph, body)
    }

    pub fn banner(&self) {
        let version = concat!("v", env!("CARGO_PKG_VERSION"));
        if self.colored {
            println!("\n  {} {}\n", "docintel".bright_cyan().bold(), version.dimmed());
        } else {
            println!("\n  docintel {}\n", version);
        }
    }

    pub fn success(&self, message: &str) {
        println!("{}", self.mark_line(Mark::Done, message));
    }

    pub fn info(&self, message: &str) {
        println!("{}", self.mark_line(Mark::Note, message));
    }

    pub fn warning(&self, message: &str) {
        println!("{}", self.mark_line(Mark::Caution, message));
    }

    /// Goes to stderr.
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.mark_line(Mark::Failure, message));
    }

    /// A file `init` wrote, labelled with what it holds.
    pub fn created(&self, label: &str, path: &str) {
        println!("{}", self.mark_line(Mark::Wrote, &format!("{} ({})", path, label)));
    }

    /// A file `init` left in place.
    pub fn skipped(&self, path: &str, reason: &str) {
        println!("{}", self.mark_line(Mark::Kept, &format!("{}: {}", path, reason)));
    }

    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  {}\n  {}", title, "=".repeat(title.chars().count()));
        }
    }

    pub fn subheader(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.cyan().bold());
        } else {
            println!("\n  {}:", title);
        }
    }

    fn kv_line(&self, key: &str, value: &str) -> String {
        if self.colored {
            format!("    {:<18} {}", key.dimmed(), value.bright_white())
        } else {
            format!("    {:<18} {}", key, value)
        }
    }

    pub fn kv(&self, key: &str, value: &str) {
        println!("{}", self.kv_line(key, value));
    }

    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {}", message.dimmed().italic());
        } else {
            println!("\n  hint: {}", message);
        }
    }

    /// A shell command the user can copy.
    pub fn command(&self, cmd: &str) {
        let line = format!("$ {}", cmd);
        if self.colored {
            println!("      {}", line.bright_cyan());
        } else {
            println!("      {}", line);
        }
    }

    /// One row per task, id column sized to the longest id.
    fn task_rows(&self, tasks: &[TaskSummary]) -> Vec<String> {
        let width = tasks.iter().map(|t| t.id.len()).max().unwrap_or(0).max(2);
        let mut rows = vec![format!("    {:<width$}  {:<9}  state", "id", "kind")];
        for task in tasks {
            let state = task.state.to_string();
            let state = match (self.colored, task.state) {
                (true, TaskState::Completed) => state.green().to_string(),
                (true, TaskState::Failed) => state.red().to_string(),
                (true, _) => state.yellow().to_string(),
                (false, _) => state,
            };
            rows.push(format!(
                "    {:<width$}  {:<9}  {}",
                task.id,
                task.kind.to_string(),
                state
            ));
        }
        rows
    }

    /// Run metadata, convergence history when the loop ran, task table and answer.
    pub fn workflow_report(&self, out: &WorkflowOutput) {
        self.header("Workflow");
        self.kv("id", &out.workflow_id);
        self.kv("pattern", out.pattern.as_str());
        self.kv("tasks", &out.total_tasks.to_string());
        self.kv("iterations", &out.iterations.to_string());
        self.kv("duration", &format!("{} ms", out.duration_ms));
        self.kv("sources", &out.stages.total_sources().to_string());
        self.kv(
            "citation accuracy",
            &format!("{:.2}", out.stages.citation.accuracy),
        );

        if let Some(ref report) = out.convergence {
            self.subheader("Convergence");
            let scores = report
                .quality_scores
                .iter()
                .map(|s| format!("{:.2}", s))
                .collect::<Vec<_>>()
                .join(", ");
            self.kv("scores", &format!("[{}]", scores));
            match report.convergence_iteration {
                Some(it) => self.success(&format!("Converged at iteration {}", it)),
                None => self.warning("Quality threshold not reached"),
            }
            self.kv(
                "selected",
                &format!(
                    "iteration {} (score {:.2})",
                    report.best_iteration, report.best_quality_score
                ),
            );
        }

        self.subheader("Tasks");
        for row in self.task_rows(&out.tasks) {
            println!("{}", row);
        }

        self.header("Answer");
        println!("\n{}\n", out.answer.trim());
    }
}
