//! Textual rewriting of panel query expressions.
//!
//! Queries are treated as strings, not parsed PromQL. The rewriter injects
//! the namespace/instance matchers into service metrics and swaps fixed
//! range windows for the `$interval` variable.
use anyhow::{Context, Result};
use regex::Regex;

const LABEL_INJECTION: &str = "namespace=\"$namespace\", instance=~\"$instance\", ";
const LABEL_SELECTOR: &str = "{namespace=\"$namespace\", instance=~\"$instance\"}";
const FIXED_WINDOW: &str = "[5m]";
const WINDOW_VARIABLE: &str = "[$interval]";

/// Rewrites panel expressions for one enhancement run.
///
/// Holds the compiled metric-name pattern so the per-panel path stays
/// allocation-light.
pub struct QueryRewriter {
    metric_prefix: String,
    metric_name: Regex,
}

impl QueryRewriter {
    pub fn new(metric_prefix: &str) -> Result<Self> {
        let pattern = format!("{}[A-Za-z0-9_:]*", regex::escape(metric_prefix));
        let metric_name = Regex::new(&pattern).context("compile metric name pattern")?;
        Ok(Self {
            metric_prefix: metric_prefix.to_string(),
            metric_name,
        })
    }

    /// Rewrite a single expression.
    ///
    /// Service metrics without a `namespace=` matcher get the variable
    /// filters injected exactly once; every `[5m]` window becomes
    /// `[$interval]`. Anything else passes through unchanged.
    pub fn rewrite(&self, expr: &str) -> String {
        let mut expr = expr.to_string();
        if !expr.contains("namespace=") && expr.contains(&self.metric_prefix) {
            if let Some(brace) = expr.find('{') {
                expr.insert_str(brace + 1, LABEL_INJECTION);
            } else if let Some(end) = self.metric_name.find(&expr).map(|metric| metric.end()) {
                expr.insert_str(end, LABEL_SELECTOR);
            }
        }
        expr.replace(FIXED_WINDOW, WINDOW_VARIABLE)
    }
}
