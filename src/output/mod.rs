//! Report rendering for the CLI.
//!
//! Every report serializes to JSON as is. Text and Markdown renderings
//! are written by hand for each report kind.

use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use crate::core::{Error, Result};
use crate::engine::{RepairResult, SearchPhase};
use crate::eval::TestOutcome;
use crate::patch::EditDescription;

/// Output format enum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    Json,
    Markdown,
    #[default]
    Text,
}

/// A report the CLI can print in any [`Format`].
pub trait Render: Serialize {
    fn render_text<W: Write>(&self, writer: &mut W) -> Result<()>;
    fn render_markdown<W: Write>(&self, writer: &mut W) -> Result<()>;
}

impl Format {
    pub fn write<R: Render, W: Write>(&self, report: &R, writer: &mut W) -> Result<()> {
        match self {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, report)?;
                writeln!(writer)?;
                Ok(())
            }
            Format::Markdown => report.render_markdown(writer),
            Format::Text => report.render_text(writer),
        }
    }
}

/// One repair run, plus the edits of its patch spelled out.
#[derive(Debug, Clone, Serialize)]
pub struct RepairReport {
    #[serde(flatten)]
    pub result: RepairResult,
    pub edits: Vec<EditDescription>,
}

impl Render for RepairReport {
    fn render_text<W: Write>(&self, w: &mut W) -> Result<()> {
        let r = &self.result;
        let status = match r.phase {
            SearchPhase::Succeeded => format!(
                "{} {} repaired after {} generation(s)",
                "✓".green().bold(),
                r.benchmark.bold(),
                r.generations
            ),
            SearchPhase::Exhausted => format!(
                "{} {} not repaired within {} generation(s)",
                "✗".red().bold(),
                r.benchmark.bold(),
                r.generations
            ),
            SearchPhase::NoEvaluableCandidates => format!(
                "{} {}: no candidate could be evaluated",
                "✗".red().bold(),
                r.benchmark.bold()
            ),
        };
        writeln!(w, "{status}")?;
        writeln!(
            w,
            "  {} evaluations in {:.1}s",
            r.evaluations,
            r.duration().num_milliseconds() as f64 / 1000.0
        )?;
        if let Some(fitness) = r.fitness {
            writeln!(w, "  fitness {fitness}")?;
        }
        if let Some(outcome) = &r.outcome {
            writeln!(w, "  tests   {}", outcome_summary(outcome))?;
        }

        for (i, edit) in self.edits.iter().enumerate() {
            writeln!(
                w,
                "\n  Edit {}: {} {} ({})",
                i + 1,
                edit.op.to_uppercase(),
                edit.target,
                edit.kind
            )?;
            writeln!(w, "    {} {}", "-".red(), edit.before.red())?;
            if let Some(after) = &edit.after {
                writeln!(w, "    {} {}", "+".green(), after.green())?;
            }
        }

        if r.success {
            if let Some(source) = &r.realized_source {
                writeln!(w, "\n{}", "Repaired source:".bold())?;
                writeln!(w, "{source}")?;
            }
        }
        Ok(())
    }

    fn render_markdown<W: Write>(&self, w: &mut W) -> Result<()> {
        let r = &self.result;
        writeln!(w, "## {}\n", r.benchmark)?;
        writeln!(w, "**Status**: {}\n", phase_label(r.phase))?;
        writeln!(w, "**Generations**: {}\n", r.generations)?;
        writeln!(w, "**Evaluations**: {}\n", r.evaluations)?;
        if let Some(fitness) = r.fitness {
            writeln!(w, "**Fitness**: {fitness}\n")?;
        }
        if let Some(outcome) = &r.outcome {
            writeln!(w, "**Tests**: {}\n", outcome_summary(outcome))?;
        }

        if !self.edits.is_empty() {
            writeln!(w, "| Op | Target | Kind | Before | After |")?;
            writeln!(w, "| --- | --- | --- | --- | --- |")?;
            for e in &self.edits {
                writeln!(
                    w,
                    "| {} | {} | {} | `{}` | {} |",
                    e.op,
                    e.target,
                    e.kind,
                    e.before,
                    e.after.as_deref().map_or("-".to_string(), |a| format!("`{a}`"))
                )?;
            }
            writeln!(w)?;
        }

        if r.success {
            if let Some(source) = &r.realized_source {
                writeln!(w, "```java\n{}\n```\n", source.trim_end())?;
            }
        }
        Ok(())
    }
}

/// Statement and sampling statistics of one benchmark.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub benchmark: String,
    pub language: String,
    pub statements: usize,
    pub weighted_lines: usize,
    pub targets: usize,
    pub total_weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationReport {
    pub fn failed(benchmark: &str, error: &Error) -> Self {
        Self {
            benchmark: benchmark.to_string(),
            language: String::new(),
            statements: 0,
            weighted_lines: 0,
            targets: 0,
            total_weight: 0.0,
            error: Some(error.to_string()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

impl Render for ValidationReport {
    fn render_text<W: Write>(&self, w: &mut W) -> Result<()> {
        match &self.error {
            Some(e) => writeln!(w, "{} {}: {}", "✗".red().bold(), self.benchmark.bold(), e)?,
            None => writeln!(
                w,
                "{} {} ({}): {} statements, {} weighted lines -> {} targets (total weight {:.2})",
                "✓".green().bold(),
                self.benchmark.bold(),
                self.language,
                self.statements,
                self.weighted_lines,
                self.targets,
                self.total_weight
            )?,
        }
        Ok(())
    }

    fn render_markdown<W: Write>(&self, w: &mut W) -> Result<()> {
        match &self.error {
            Some(e) => writeln!(w, "- **{}**: invalid ({})", self.benchmark, e)?,
            None => writeln!(
                w,
                "- **{}** ({}): {} statements, {} targets, total weight {:.2}",
                self.benchmark, self.language, self.statements, self.targets, self.total_weight
            )?,
        }
        Ok(())
    }
}

/// Test suite run against one program version of a benchmark.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub benchmark: String,
    /// `buggy` or `fixed`.
    pub program: String,
    pub outcome: TestOutcome,
}

impl Render for SuiteReport {
    fn render_text<W: Write>(&self, w: &mut W) -> Result<()> {
        let mark = if self.outcome.is_failure() {
            "✗".red().bold()
        } else {
            "✓".green().bold()
        };
        writeln!(
            w,
            "{} {} [{}]: {}",
            mark,
            self.benchmark.bold(),
            self.program,
            outcome_summary(&self.outcome)
        )?;
        for id in &self.outcome.failed_test_ids {
            writeln!(w, "    {} {}", "failed".red(), id)?;
        }
        Ok(())
    }

    fn render_markdown<W: Write>(&self, w: &mut W) -> Result<()> {
        writeln!(
            w,
            "- **{}** [{}]: {}",
            self.benchmark,
            self.program,
            outcome_summary(&self.outcome)
        )?;
        for id in &self.outcome.failed_test_ids {
            writeln!(w, "  - `{id}`")?;
        }
        Ok(())
    }
}

fn phase_label(phase: SearchPhase) -> &'static str {
    match phase {
        SearchPhase::Succeeded => "Repaired",
        SearchPhase::Exhausted => "Not repaired",
        SearchPhase::NoEvaluableCandidates => "No evaluable candidates",
    }
}

fn outcome_summary(o: &TestOutcome) -> String {
    let mut s = format!(
        "{} run, {} passed, {} failed, {} errors, {} skipped, exit {}",
        o.tests_run,
        o.passed(),
        o.failures,
        o.errors,
        o.skipped,
        o.exit_code
    );
    if o.timed_out {
        s.push_str(", timed out");
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::Patch;
    use crate::program::{StatementId, StatementKind};
    use chrono::Utc;
    use serde_json::Value;

    fn report(phase: SearchPhase) -> RepairReport {
        let target = StatementId::new(7, 13, 7, 23);
        let donor = StatementId::new(9, 9, 9, 17);
        let now = Utc::now();
        RepairReport {
            result: RepairResult {
                benchmark: "clamp".to_string(),
                success: phase == SearchPhase::Succeeded,
                phase,
                realized_source: Some("class Clamp { /* fixed */ }".to_string()),
                outcome: Some(TestOutcome {
                    tests_run: 3,
                    all_passed: phase == SearchPhase::Succeeded,
                    ..TestOutcome::default()
                }),
                patch: Some(Patch::replace(target, donor)),
                fitness: Some(10_003.0),
                generations: 2,
                evaluations: 17,
                started_at: now,
                finished_at: now,
            },
            edits: vec![EditDescription {
                op: "replace",
                target,
                kind: StatementKind::Return,
                donor: Some(donor),
                before: "return low;".to_string(),
                after: Some("return high;".to_string()),
            }],
        }
    }

    fn render(format: Format, r: &impl Render) -> String {
        colored::control::set_override(false);
        let mut out = Vec::new();
        format.write(r, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_repair_report_json_is_flat() {
        let rendered = render(Format::Json, &report(SearchPhase::Succeeded));
        let json: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(json["benchmark"], "clamp");
        assert_eq!(json["phase"], "succeeded");
        assert_eq!(json["edits"][0]["after"], "return high;");
        assert_eq!(json["patch"][0]["op"], "replace");
    }

    #[test]
    fn test_repair_report_text() {
        let text = render(Format::Text, &report(SearchPhase::Succeeded));
        assert!(text.contains("clamp repaired after 2 generation(s)"));
        assert!(text.contains("- return low;"));
        assert!(text.contains("+ return high;"));
        assert!(text.contains("Repaired source:"));

        let text = render(Format::Text, &report(SearchPhase::Exhausted));
        assert!(text.contains("not repaired"));
        assert!(!text.contains("Repaired source:"));
    }

    #[test]
    fn test_repair_report_markdown() {
        let md = render(Format::Markdown, &report(SearchPhase::Succeeded));
        assert!(md.starts_with("## clamp\n"));
        assert!(md.contains("| replace | 7:13-7:23 | return | `return low;` | `return high;` |"));
        assert!(md.contains("```java\n"));
    }

    #[test]
    fn test_validation_report() {
        let ok = ValidationReport {
            benchmark: "clamp".to_string(),
            language: "Java".to_string(),
            statements: 6,
            weighted_lines: 2,
            targets: 2,
            total_weight: 1.1,
            error: None,
        };
        assert!(ok.is_valid());
        assert!(render(Format::Text, &ok).contains("6 statements"));

        let bad = ValidationReport::failed("clamp", &Error::fault_localization("duplicate line 4"));
        assert!(!bad.is_valid());
        let json: Value = serde_json::from_str(&render(Format::Json, &bad)).unwrap();
        assert!(json["error"].as_str().unwrap().contains("duplicate line 4"));
    }
}
