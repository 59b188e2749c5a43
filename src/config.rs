//! The declarative enhancement table.
//!
//! The builtin table mirrors the shipped dashboard set; `load_table` accepts
//! the same shape from a JSON file so deployments can override it without
//! recompiling. Validation keeps the apply routine free of per-entry checks.
use crate::model::{CurrentSelection, DrillDownLink, TemplateVariable, VariableOption};
use anyhow::{anyhow, Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Metric prefix the query rewriter keys on when no override is given.
pub const DEFAULT_METRIC_PREFIX: &str = "birthday_scheduler_";

/// Per-dashboard enhancement: extra variables, cross-links, and the
/// alert-name filter used for annotations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardConfig {
    #[serde(default)]
    pub specific_variables: Vec<TemplateVariable>,
    #[serde(default)]
    pub drill_down_links: Vec<DrillDownLink>,
    pub alert_filter: String,
}

/// The full enhancement table keyed by dashboard file name.
///
/// A `BTreeMap` keeps apply order deterministic across runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnhancementTable {
    #[serde(default = "default_metric_prefix")]
    pub metric_prefix: String,
    pub dashboards: BTreeMap<String, DashboardConfig>,
}

fn default_metric_prefix() -> String {
    DEFAULT_METRIC_PREFIX.to_string()
}

/// Render the builtin table as pretty JSON, the starting point for an
/// override file.
pub fn table_stub() -> String {
    serde_json::to_string_pretty(&builtin_table()).expect("serialize enhancement table")
}

/// Load an enhancement table override from a JSON file.
pub fn load_table(path: &Path) -> Result<EnhancementTable> {
    let bytes = fs::read(path).with_context(|| format!("read table {}", path.display()))?;
    let table: EnhancementTable =
        serde_json::from_slice(&bytes).context("parse enhancement table JSON")?;
    validate_table(&table)?;
    Ok(table)
}

/// Validate a table before it drives any file writes.
pub fn validate_table(table: &EnhancementTable) -> Result<()> {
    if table.metric_prefix.trim().is_empty() {
        return Err(anyhow!("metric_prefix must be non-empty"));
    }
    if table.dashboards.is_empty() {
        return Err(anyhow!("enhancement table has no dashboards"));
    }
    for (name, config) in &table.dashboards {
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return Err(anyhow!(
                "dashboard entries must be bare file names (got {name:?})"
            ));
        }
        if config.alert_filter.trim().is_empty() {
            return Err(anyhow!("alert_filter for {name} must be non-empty"));
        }
        Regex::new(&config.alert_filter)
            .with_context(|| format!("alert_filter for {name} is not a valid regex"))?;
    }
    Ok(())
}

/// The four variables merged into every dashboard, in merge order.
pub fn common_variables() -> Vec<TemplateVariable> {
    vec![
        TemplateVariable {
            name: "datasource".to_string(),
            kind: "datasource".to_string(),
            datasource: None,
            query: "prometheus".to_string(),
            label: None,
            description: None,
            current: Some(CurrentSelection {
                text: "Prometheus".to_string(),
                value: "Prometheus".to_string(),
            }),
            hide: Some(0),
            include_all: Some(false),
            multi: Some(false),
            options: Some(Vec::new()),
            refresh: Some(1),
            regex: Some(String::new()),
            skip_url_sync: Some(false),
            sort: None,
        },
        TemplateVariable {
            name: "namespace".to_string(),
            kind: "query".to_string(),
            datasource: Some("${datasource}".to_string()),
            query: "label_values(birthday_scheduler_api_requests_total, namespace)".to_string(),
            label: Some("Namespace".to_string()),
            description: Some("Kubernetes namespace filter".to_string()),
            current: Some(CurrentSelection {
                text: "production".to_string(),
                value: "production".to_string(),
            }),
            hide: Some(0),
            include_all: Some(false),
            multi: Some(false),
            options: Some(Vec::new()),
            refresh: Some(1),
            regex: Some(String::new()),
            skip_url_sync: Some(false),
            sort: Some(1),
        },
        TemplateVariable {
            name: "instance".to_string(),
            kind: "query".to_string(),
            datasource: Some("${datasource}".to_string()),
            query: "label_values(birthday_scheduler_api_requests_total{namespace=\"$namespace\"}, instance)"
                .to_string(),
            label: Some("Instance".to_string()),
            description: Some("Filter by instance/pod".to_string()),
            current: Some(CurrentSelection {
                text: "All".to_string(),
                value: "$__all".to_string(),
            }),
            hide: Some(0),
            include_all: Some(true),
            multi: Some(true),
            options: Some(Vec::new()),
            refresh: Some(1),
            regex: Some(String::new()),
            skip_url_sync: Some(false),
            sort: Some(1),
        },
        TemplateVariable {
            name: "interval".to_string(),
            kind: "interval".to_string(),
            datasource: None,
            query: "1m,5m,10m,30m,1h".to_string(),
            label: Some("Interval".to_string()),
            description: Some("Time aggregation interval".to_string()),
            current: Some(CurrentSelection {
                text: "5m".to_string(),
                value: "5m".to_string(),
            }),
            hide: Some(0),
            include_all: Some(false),
            multi: Some(false),
            options: Some(interval_options()),
            refresh: None,
            regex: None,
            skip_url_sync: None,
            sort: None,
        },
    ]
}

fn interval_options() -> Vec<VariableOption> {
    ["1m", "5m", "10m", "30m", "1h"]
        .iter()
        .map(|window| VariableOption {
            text: (*window).to_string(),
            value: (*window).to_string(),
            selected: *window == "5m",
        })
        .collect()
}

/// Build the fixed table for the shipped dashboard set.
pub fn builtin_table() -> EnhancementTable {
    let mut dashboards = BTreeMap::new();

    dashboards.insert(
        "message-processing.json".to_string(),
        DashboardConfig {
            specific_variables: vec![filter_variable(
                "queue",
                "label_values(birthday_scheduler_queue_depth{namespace=\"$namespace\", instance=~\"$instance\"}, queue_name)",
                "Queue",
                "Filter by queue name",
            )],
            drill_down_links: vec![
                link(
                    "Database Dashboard",
                    "/d/database?var-namespace=$namespace&var-instance=$instance&from=$__from&to=$__to",
                    "View database metrics for queue persistence",
                ),
                overview_link(),
            ],
            alert_filter: "QueueDepthCritical|DLQMessagesPresent|HighMessageRetryRate|MessageProcessingSlow|MessageDeliveryRate|MessageSuccessRate"
                .to_string(),
        },
    );

    dashboards.insert(
        "database.json".to_string(),
        DashboardConfig {
            specific_variables: vec![filter_variable(
                "table",
                "label_values(birthday_scheduler_database_query_duration_seconds_bucket{namespace=\"$namespace\", instance=~\"$instance\"}, table)",
                "Table",
                "Filter by table name",
            )],
            drill_down_links: vec![
                link(
                    "Infrastructure Dashboard",
                    "/d/infrastructure?var-namespace=$namespace&var-instance=$instance&from=$__from&to=$__to",
                    "View system resource impact on database",
                ),
                overview_link(),
            ],
            alert_filter: "DBConnectionPoolExhausted|DatabaseDown|DBConnectionPoolHigh|SlowQueries|DatabaseQueryLatency"
                .to_string(),
        },
    );

    dashboards.insert(
        "infrastructure.json".to_string(),
        DashboardConfig {
            specific_variables: vec![filter_variable(
                "node",
                "label_values(birthday_scheduler_process_cpu_seconds_total{namespace=\"$namespace\"}, instance)",
                "Node",
                "Filter by node/server",
            )],
            drill_down_links: vec![overview_link()],
            alert_filter: "ServiceDown|MemoryExhausted|CPUUsageHigh|MemoryUsageHigh|EventLoopLagHigh|HighGCPauseTime"
                .to_string(),
        },
    );

    dashboards.insert(
        "overview-dashboard.json".to_string(),
        DashboardConfig {
            specific_variables: Vec::new(),
            drill_down_links: vec![
                link(
                    "API Performance",
                    "/d/api-performance?var-namespace=$namespace&from=$__from&to=$__to",
                    "View detailed API metrics",
                ),
                link(
                    "Message Processing",
                    "/d/message-processing?var-namespace=$namespace&from=$__from&to=$__to",
                    "View message queue metrics",
                ),
                link(
                    "Database",
                    "/d/database?var-namespace=$namespace&from=$__from&to=$__to",
                    "View database performance",
                ),
                link(
                    "Infrastructure",
                    "/d/infrastructure?var-namespace=$namespace&from=$__from&to=$__to",
                    "View infrastructure health",
                ),
                link(
                    "Security",
                    "/d/security?var-namespace=$namespace&from=$__from&to=$__to",
                    "View security metrics",
                ),
            ],
            alert_filter: ".*".to_string(),
        },
    );

    dashboards.insert(
        "security.json".to_string(),
        DashboardConfig {
            specific_variables: Vec::new(),
            drill_down_links: vec![
                overview_link(),
                link(
                    "API Performance",
                    "/d/api-performance?var-namespace=$namespace&from=$__from&to=$__to",
                    "View API security details",
                ),
            ],
            alert_filter: "SecurityBreach|UnauthorizedAccess|HighFailedLogins|RateLimitExceeded"
                .to_string(),
        },
    );

    EnhancementTable {
        metric_prefix: DEFAULT_METRIC_PREFIX.to_string(),
        dashboards,
    }
}

/// A dashboard-specific multi-select query variable; everything else sparse.
fn filter_variable(
    name: &str,
    query: &str,
    label: &str,
    description: &str,
) -> TemplateVariable {
    TemplateVariable {
        name: name.to_string(),
        kind: "query".to_string(),
        datasource: None,
        query: query.to_string(),
        label: Some(label.to_string()),
        description: Some(description.to_string()),
        current: None,
        hide: None,
        include_all: Some(true),
        multi: Some(true),
        options: None,
        refresh: None,
        regex: None,
        skip_url_sync: None,
        sort: None,
    }
}

fn link(title: &str, url: &str, tooltip: &str) -> DrillDownLink {
    DrillDownLink {
        title: title.to_string(),
        url: url.to_string(),
        tooltip: tooltip.to_string(),
    }
}

fn overview_link() -> DrillDownLink {
    link(
        "Overview Dashboard",
        "/d/overview?var-namespace=$namespace&from=$__from&to=$__to",
        "Return to overview dashboard",
    )
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
