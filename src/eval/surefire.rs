//! Maven Surefire XML report summaries.
//!
//! Only the handful of attributes the fitness function needs are read:
//! `tests`, `failures`, `errors` and `skipped` on each `<testsuite>`, and
//! `classname`/`name` of every `<testcase>` carrying a `<failure>` or
//! `<error>` child.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Serialize;
use walkdir::WalkDir;

use crate::core::{Error, Result};

/// Aggregated counts over every `TEST-*.xml` in a report directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub tests_run: i32,
    pub failures: i32,
    pub errors: i32,
    pub skipped: i32,
    /// `classname#name`, first occurrence order, no duplicates.
    pub failed_test_ids: Vec<String>,
}

/// Regex-based reader for Surefire reports.
pub struct SurefireParser {
    suite: Regex,
    testcase: Regex,
    attribute: Regex,
    failed_child: Regex,
}

impl Default for SurefireParser {
    fn default() -> Self {
        Self::new()
    }
}

impl SurefireParser {
    pub fn new() -> Self {
        Self {
            suite: Regex::new(r"<testsuite\b([^>]*)>").expect("valid regex"),
            testcase: Regex::new(r"(?s)<testcase\b([^>]*?)(?:/>|>(.*?)</testcase>)")
                .expect("valid regex"),
            attribute: Regex::new(r#"([\w:.-]+)\s*=\s*"([^"]*)""#).expect("valid regex"),
            failed_child: Regex::new(r"<(?:failure|error)\b").expect("valid regex"),
        }
    }

    /// Summarize `dir`. A missing directory yields an empty summary.
    pub fn parse_dir(&self, dir: &Path) -> Result<ReportSummary> {
        let mut summary = ReportSummary::default();
        if !dir.is_dir() {
            return Ok(summary);
        }

        let reports: Vec<_> = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                let name = e.file_name().to_string_lossy();
                e.file_type().is_file() && name.starts_with("TEST-") && name.ends_with(".xml")
            })
            .map(|e| e.into_path())
            .collect();
        tracing::debug!("Found {} surefire reports in {}", reports.len(), dir.display());

        for path in reports {
            let xml = fs::read_to_string(&path)?;
            self.accumulate(&xml, &mut summary).map_err(|e| {
                Error::workspace(format!("failed to parse {}: {e}", path.display()))
            })?;
        }
        Ok(summary)
    }

    /// Summarize a single report document.
    pub fn parse_str(&self, xml: &str) -> Result<ReportSummary> {
        let mut summary = ReportSummary::default();
        self.accumulate(xml, &mut summary)?;
        Ok(summary)
    }

    fn accumulate(&self, xml: &str, summary: &mut ReportSummary) -> Result<()> {
        let suite = self
            .suite
            .captures(xml)
            .ok_or_else(|| Error::workspace("no <testsuite> element"))?;
        let attrs = self.attributes(&suite[1]);
        let count = |key: &str| {
            attrs
                .get(key)
                .and_then(|v| v.trim().parse::<i32>().ok())
                .unwrap_or(0)
        };
        summary.tests_run += count("tests");
        summary.failures += count("failures");
        summary.errors += count("errors");
        summary.skipped += count("skipped");

        for case in self.testcase.captures_iter(xml) {
            let failed = case
                .get(2)
                .is_some_and(|body| self.failed_child.is_match(body.as_str()));
            if !failed {
                continue;
            }
            let attrs = self.attributes(&case[1]);
            let id = format!(
                "{}#{}",
                attrs.get("classname").map(String::as_str).unwrap_or(""),
                attrs.get("name").map(String::as_str).unwrap_or("")
            );
            if !summary.failed_test_ids.contains(&id) {
                summary.failed_test_ids.push(id);
            }
        }
        Ok(())
    }

    fn attributes(&self, tag: &str) -> HashMap<String, String> {
        self.attribute
            .captures_iter(tag)
            .map(|c| (c[1].to_string(), unescape(&c[2])))
            .collect()
    }
}

fn unescape(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
