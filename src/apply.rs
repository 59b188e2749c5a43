//! The per-file apply routine and the run loop over the enhancement table.
//!
//! A dashboard is read, transformed fully in memory, and only then written
//! back, so a file that fails partway is left byte-identical on disk. A
//! single file's failure is logged and skipped, never aborting the run.
use crate::cli::{ApplyArgs, PlanArgs};
use crate::config::{self, DashboardConfig, EnhancementTable};
use crate::model::{annotations_for, links_for, TemplateVariable};
use crate::query::QueryRewriter;
use anyhow::{bail, Context, Result};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;

/// Applies one enhancement table to dashboard documents.
pub struct Enhancer {
    common: Vec<TemplateVariable>,
    rewriter: QueryRewriter,
}

impl Enhancer {
    pub fn new(table: &EnhancementTable) -> Result<Self> {
        Ok(Self {
            common: config::common_variables(),
            rewriter: QueryRewriter::new(&table.metric_prefix)?,
        })
    }

    /// Enhance a single dashboard file in place.
    ///
    /// Returns whether the serialized document differs from what was on
    /// disk. With `dry_run` the file is never written.
    pub fn enhance_file(
        &self,
        path: &Path,
        config: &DashboardConfig,
        dry_run: bool,
    ) -> Result<bool> {
        let original =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let mut root: Value = serde_json::from_str(&original)
            .with_context(|| format!("parse {}", path.display()))?;

        self.enhance_value(&mut root, config)?;

        let mut text = serde_json::to_string_pretty(&root).context("serialize dashboard")?;
        text.push('\n');
        let changed = text != original;
        if changed && !dry_run {
            fs::write(path, text.as_bytes())
                .with_context(|| format!("write {}", path.display()))?;
        }
        Ok(changed)
    }

    /// Enhance a parsed dashboard document in memory.
    ///
    /// Accepts both the wrapped export form (`{"dashboard": {...}}`) and a
    /// bare dashboard object.
    pub fn enhance_value(&self, root: &mut Value, config: &DashboardConfig) -> Result<()> {
        let wrapped = root.get("dashboard").is_some_and(Value::is_object);
        let body = if wrapped { &mut root["dashboard"] } else { root };
        let Value::Object(dashboard) = body else {
            bail!("dashboard document is not a JSON object");
        };

        let mut variables = self.common.clone();
        variables.extend(config.specific_variables.iter().cloned());
        dashboard.insert(
            "templating".to_string(),
            json!({ "list": serde_json::to_value(variables)? }),
        );
        dashboard.insert(
            "links".to_string(),
            serde_json::to_value(links_for(&config.drill_down_links))?,
        );
        dashboard.insert(
            "annotations".to_string(),
            serde_json::to_value(annotations_for(&config.alert_filter))?,
        );

        if let Some(panels) = dashboard.get_mut("panels").and_then(Value::as_array_mut) {
            self.rewrite_panels(panels);
        }
        Ok(())
    }

    /// Rewrite targets and default descriptions, recursing into row panels.
    fn rewrite_panels(&self, panels: &mut [Value]) {
        for panel in panels {
            let Some(panel) = panel.as_object_mut() else {
                continue;
            };
            if let Some(targets) = panel.get_mut("targets").and_then(Value::as_array_mut) {
                for target in targets {
                    let Some(target) = target.as_object_mut() else {
                        continue;
                    };
                    if let Some(expr) = target.get("expr").and_then(Value::as_str) {
                        let rewritten = self.rewriter.rewrite(expr);
                        target.insert("expr".to_string(), Value::String(rewritten));
                        if !target.contains_key("refId") {
                            target.insert("refId".to_string(), Value::String("A".to_string()));
                        }
                    }
                }
            }
            ensure_description(panel);
            if let Some(children) = panel.get_mut("panels").and_then(Value::as_array_mut) {
                self.rewrite_panels(children);
            }
        }
    }
}

fn ensure_description(panel: &mut Map<String, Value>) {
    let missing = match panel.get("description") {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.is_empty(),
        Some(_) => false,
    };
    if !missing {
        return;
    }
    let id = panel_id(panel);
    let title = panel
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or("No title")
        .to_string();
    panel.insert(
        "description".to_string(),
        Value::String(format!("Panel {id}: {title}")),
    );
}

fn panel_id(panel: &Map<String, Value>) -> String {
    match panel.get("id") {
        Some(Value::Number(id)) => id.to_string(),
        Some(Value::String(id)) => id.clone(),
        _ => String::new(),
    }
}

/// Outcome of a run over the enhancement table, in table order.
#[derive(Debug, Default)]
pub struct ApplySummary {
    pub enhanced: Vec<String>,
    pub unchanged: Vec<String>,
    pub missing: Vec<String>,
    pub failed: Vec<String>,
}

impl ApplySummary {
    pub fn line(&self) -> String {
        format!(
            "{} enhanced, {} unchanged, {} missing, {} failed",
            self.enhanced.len(),
            self.unchanged.len(),
            self.missing.len(),
            self.failed.len()
        )
    }
}

/// Apply the table to every dashboard under `dir`, skip-and-continue.
pub fn apply_all(
    dir: &Path,
    table: &EnhancementTable,
    only: &[String],
    dry_run: bool,
) -> Result<ApplySummary> {
    if !dir.is_dir() {
        bail!("dashboards directory {} not found", dir.display());
    }
    for name in only {
        if !table.dashboards.contains_key(name) {
            eprintln!("note: {name} is not in the enhancement table");
        }
    }

    let enhancer = Enhancer::new(table)?;
    let mut summary = ApplySummary::default();
    for (name, config) in &table.dashboards {
        if !only.is_empty() && !only.contains(name) {
            continue;
        }
        let path = dir.join(name);
        if !path.is_file() {
            tracing::warn!(dashboard = %name, "dashboard file missing");
            eprintln!("warning: {name} not found, skipping");
            summary.missing.push(name.clone());
            continue;
        }
        match enhancer.enhance_file(&path, config, dry_run) {
            Ok(true) => {
                if dry_run {
                    println!("would update {name}");
                } else {
                    println!("enhanced {name}");
                }
                summary.enhanced.push(name.clone());
            }
            Ok(false) => {
                tracing::debug!(dashboard = %name, "already up to date");
                summary.unchanged.push(name.clone());
            }
            Err(err) => {
                eprintln!("error enhancing {name}: {err:#}");
                summary.failed.push(name.clone());
            }
        }
    }
    Ok(summary)
}

/// Run the apply subcommand.
pub fn run_apply(args: &ApplyArgs) -> Result<()> {
    let table = resolve_table(args.config.as_deref())?;
    tracing::info!(
        dir = %args.dashboards_dir.display(),
        dashboards = table.dashboards.len(),
        "starting enhancement run"
    );
    let summary = apply_all(&args.dashboards_dir, &table, &args.only, false)?;
    println!("{}", summary.line());
    if !summary.failed.is_empty() {
        bail!("{} dashboards failed to enhance", summary.failed.len());
    }
    Ok(())
}

/// Run the plan subcommand: the full transformation, nothing written.
pub fn run_plan(args: &PlanArgs) -> Result<()> {
    let table = resolve_table(args.config.as_deref())?;
    let summary = apply_all(&args.dashboards_dir, &table, &args.only, true)?;
    println!("{}", summary.line());
    if !summary.failed.is_empty() {
        bail!("{} dashboards failed to plan", summary.failed.len());
    }
    Ok(())
}

fn resolve_table(path: Option<&Path>) -> Result<EnhancementTable> {
    match path {
        Some(path) => config::load_table(path),
        None => Ok(config::builtin_table()),
    }
}
