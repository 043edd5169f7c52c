//! Run report: severity-tagged items plus an end-of-run summary.
//!
//! The report is the single source of truth for everything that happened in
//! a run — configuration failures, degraded rules, and per-asset outcomes
//! all land here, so callers never need to catch an error to learn about an
//! unmatched asset. All three exports are pure functions of the in-memory
//! report and can be re-derived without re-running resolution.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportItem {
    pub category: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timecode: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, Value>,
}

impl ReportItem {
    pub fn info(category: impl Into<String>, message: impl Into<String>) -> ReportItem {
        ReportItem::new(category, Severity::Info, message)
    }

    pub fn warning(category: impl Into<String>, message: impl Into<String>) -> ReportItem {
        ReportItem::new(category, Severity::Warning, message)
    }

    pub fn error(category: impl Into<String>, message: impl Into<String>) -> ReportItem {
        ReportItem::new(category, Severity::Error, message)
    }

    fn new(
        category: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
    ) -> ReportItem {
        ReportItem {
            category: category.into(),
            severity,
            message: message.into(),
            timeline: None,
            clip: None,
            timecode: None,
            data: BTreeMap::new(),
        }
    }

    pub fn with_clip(mut self, clip: impl Into<String>) -> ReportItem {
        self.clip = Some(clip.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> ReportItem {
        self.data.insert(key.into(), value);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub tool_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub summary: BTreeMap<String, Value>,
    #[serde(default)]
    pub items: Vec<ReportItem>,
}

impl Report {
    pub fn new(tool_id: impl Into<String>, title: impl Into<String>) -> Report {
        Report {
            tool_id: tool_id.into(),
            title: title.into(),
            created_at: Utc::now(),
            summary: BTreeMap::new(),
            items: Vec::new(),
        }
    }

    pub fn add(&mut self, item: ReportItem) {
        self.items.push(item);
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.items
            .iter()
            .filter(|item| item.severity == severity)
            .count()
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serialize report JSON")
    }

    pub fn from_json_str(content: &str) -> Result<Report> {
        serde_json::from_str(content).context("parse report JSON")
    }

    /// Flat table of the items, one row each. An empty report renders as an
    /// empty string, not a lone header row.
    pub fn to_csv_string(&self) -> String {
        if self.items.is_empty() {
            return String::new();
        }
        let mut out = String::new();
        push_csv_row(
            &mut out,
            ["category", "severity", "message", "timeline", "clip", "timecode", "data"],
        );
        for item in &self.items {
            let data = if item.data.is_empty() {
                String::new()
            } else {
                Value::Object(item.data.clone().into_iter().collect()).to_string()
            };
            push_csv_row(
                &mut out,
                [
                    item.category.as_str(),
                    &item.severity.to_string(),
                    item.message.as_str(),
                    item.timeline.as_deref().unwrap_or(""),
                    item.clip.as_deref().unwrap_or(""),
                    item.timecode.as_deref().unwrap_or(""),
                    &data,
                ],
            );
        }
        out
    }

    /// Human-readable render of the same items.
    pub fn to_html_string(&self) -> String {
        let mut out = String::new();
        out.push_str("<html><head><meta charset='utf-8'>\n");
        out.push_str(&format!("<title>{}</title>\n", escape_html(&self.title)));
        out.push_str("</head><body>\n");
        out.push_str(&format!("<h1>{}</h1>\n", escape_html(&self.title)));
        out.push_str(&format!(
            "<p>Generated: {}</p>\n",
            self.created_at.to_rfc3339()
        ));
        out.push_str("<table border='1' cellspacing='0' cellpadding='4'>\n");
        out.push_str(
            "<tr><th>Severity</th><th>Category</th><th>Message</th>\
             <th>Timeline</th><th>Clip</th><th>Timecode</th></tr>\n",
        );
        for item in &self.items {
            out.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                item.severity,
                escape_html(&item.category),
                escape_html(&item.message),
                escape_html(item.timeline.as_deref().unwrap_or("")),
                escape_html(item.clip.as_deref().unwrap_or("")),
                escape_html(item.timecode.as_deref().unwrap_or("")),
            ));
        }
        out.push_str("</table>\n</body></html>\n");
        out
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        write_export(path, &self.to_json_string()?)
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        write_export(path, &self.to_csv_string())
    }

    pub fn write_html(&self, path: &Path) -> Result<()> {
        write_export(path, &self.to_html_string())
    }
}

fn write_export(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
    }
    std::fs::write(path, content).with_context(|| format!("write {}", path.display()))
}

fn push_csv_row<const N: usize>(out: &mut String, fields: [&str; N]) {
    for (pos, field) in fields.iter().enumerate() {
        if pos > 0 {
            out.push(',');
        }
        out.push_str(&csv_escape(field));
    }
    out.push('\n');
}

fn csv_escape(field: &str) -> String {
    if field.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
