use crate::OutputFormat;
use anyhow::{Context, bail};
use pinpoint_common::formatter::{format_grid, format_selector_result};
use pinpoint_common::protocol::{ElementHandle, RecordedElement};
use pinpoint_core::grid::locator::locate_rows;
use pinpoint_core::grid::{RowFilter, grid_selector};
use pinpoint_core::{
    PinpointConfig, ResolutionEngine, discover_grids, extract_rows, infer_grid_schema, recover,
};
use pinpoint_dom::Document;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

pub enum DocumentSource {
    Html(PathBuf),
    Snapshot(PathBuf),
}

#[derive(Serialize)]
struct GridSummary {
    selector: String,
    rows: usize,
}

/// A loaded document plus the configuration every command runs with.
pub struct Session {
    doc: Document,
    config: PinpointConfig,
}

impl Session {
    pub async fn open(source: DocumentSource, config: PinpointConfig) -> anyhow::Result<Self> {
        let doc = match source {
            DocumentSource::Html(path) => {
                let html = tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))?;
                Document::parse_html(&html)
            }
            DocumentSource::Snapshot(path) => {
                let json = tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))?;
                Document::from_snapshot_json(&json)?
            }
        };
        info!(nodes = doc.len(), "document loaded");
        Ok(Self::new(doc, config))
    }

    pub fn new(doc: Document, config: PinpointConfig) -> Self {
        Self { doc, config }
    }

    pub fn resolve(&self, target: &str, format: OutputFormat) -> anyhow::Result<String> {
        let Some(el) = self.doc.query_selector(target)? else {
            bail!("no element matches {}", target);
        };
        let result = ResolutionEngine::resolve_selector(&self.doc, el, &self.config.selector);
        match format {
            OutputFormat::Json => to_json(&result),
            OutputFormat::Text => Ok(format_selector_result(&result)),
        }
    }

    pub fn grids(&self, format: OutputFormat) -> anyhow::Result<String> {
        let grids: Vec<GridSummary> = discover_grids(&self.doc)
            .into_iter()
            .map(|grid| GridSummary {
                selector: grid_selector(&self.doc, grid, &self.config),
                rows: locate_rows(&self.doc, grid).rows.len(),
            })
            .collect();
        match format {
            OutputFormat::Json => to_json(&grids),
            OutputFormat::Text => Ok(grids
                .iter()
                .map(|g| format!("{} ({} rows)\n", g.selector, g.rows))
                .collect()),
        }
    }

    pub fn schema(&self, container: Option<&str>, format: OutputFormat) -> anyhow::Result<String> {
        let grid = self.container(container)?;
        let descriptor = infer_grid_schema(&self.doc, grid, &self.config);
        match format {
            OutputFormat::Json => to_json(&descriptor),
            OutputFormat::Text => Ok(format_grid(&descriptor)),
        }
    }

    pub fn recover(&self, step: &RecordedElement, format: OutputFormat) -> anyhow::Result<String> {
        let candidates = recover(&self.doc, step, &self.config.recovery);
        match format {
            OutputFormat::Json => to_json(&candidates),
            OutputFormat::Text => {
                if candidates.is_empty() {
                    return Ok("(no candidates)\n".to_string());
                }
                let mut output = String::new();
                for candidate in &candidates {
                    let marker = if candidate.replayable { '+' } else { '-' };
                    output.push_str(&format!(
                        "{} [{:>4}] {:<15} {}  ({:?})\n",
                        marker,
                        candidate.score,
                        serde_label(&candidate.source),
                        candidate.selector,
                        candidate.status
                    ));
                }
                Ok(output)
            }
        }
    }

    pub fn extract(
        &self,
        container: Option<&str>,
        filters: &[RowFilter],
        format: OutputFormat,
    ) -> anyhow::Result<String> {
        let grid = self.container(container)?;
        let descriptor = infer_grid_schema(&self.doc, grid, &self.config);
        let rows = extract_rows(&self.doc, grid, &descriptor, filters);
        info!(rows = rows.len(), filters = filters.len(), "rows extracted");
        match format {
            OutputFormat::Json => to_json(&rows),
            OutputFormat::Text => {
                let headers: Vec<&str> = descriptor.columns.iter().map(|c| c.header.as_str()).collect();
                let mut output = format!("{}\n", headers.join("\t"));
                for row in &rows {
                    let cells: Vec<String> = row.iter().map(|(_, v)| v.as_text()).collect();
                    output.push_str(&format!("{}\n", cells.join("\t")));
                }
                Ok(output)
            }
        }
    }

    fn container(&self, selector: Option<&str>) -> anyhow::Result<ElementHandle> {
        match selector {
            Some(selector) => self
                .doc
                .query_selector(selector)?
                .with_context(|| format!("no element matches {}", selector)),
            None => discover_grids(&self.doc)
                .first()
                .copied()
                .context("no grid found in document"),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(format!("{}\n", serde_json::to_string_pretty(value)?))
}

/// The serialized name of a unit enum variant.
fn serde_label<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(name)) => name,
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <form id="login"><label>Email <input name="email"></label>
        <button type="submit">Sign in</button></form>
        <table id="people">
          <tr><th>Name</th><th>Age</th></tr>
          <tr><td>Alice</td><td>30</td></tr>
          <tr><td>Bob</td><td>41</td></tr>
        </table>"#;

    fn session() -> Session {
        Session::new(Document::parse_html(PAGE), PinpointConfig::default())
    }

    #[test]
    fn test_resolve_reports_primary_first() {
        let text = session().resolve("button", OutputFormat::Text).unwrap();
        let primary = text.lines().next().unwrap();
        assert!(primary.starts_with("* [ 60]"));
        assert!(primary.ends_with(r#"button:has-text("Sign in")"#));
        assert!(session().resolve("video", OutputFormat::Json).is_err());
    }

    #[test]
    fn test_grids_and_schema() {
        let session = session();
        let grids: serde_json::Value =
            serde_json::from_str(&session.grids(OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(grids, serde_json::json!([{"selector": "#people", "rows": 2}]));

        let schema = session.schema(None, OutputFormat::Text).unwrap();
        assert!(schema.starts_with("Grid #people"));
        assert!(schema.contains("\"Age\" : number"));
    }

    #[test]
    fn test_extract_text_table() {
        let filters: Vec<RowFilter> =
            serde_json::from_str(r#"[{"column": "Age", "operator": ">", "value": "35"}]"#).unwrap();
        let text = session()
            .extract(Some("#people"), &filters, OutputFormat::Text)
            .unwrap();
        assert_eq!(text, "Name\tAge\nBob\t41\n");
    }

    #[test]
    fn test_recover_text_marks_replayable() {
        let step: RecordedElement =
            serde_json::from_str(r#"{"tagName": "form", "attributes": {"id": "login"}}"#).unwrap();
        let text = session().recover(&step, OutputFormat::Text).unwrap();
        assert!(text.starts_with("+ [ 120] id"));
    }
}
