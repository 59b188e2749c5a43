//! Typed Grafana sub-structures written by the enhancer.
//!
//! Only the pieces the tool owns are typed; the surrounding dashboard
//! document stays an untyped `serde_json::Value` so fields we do not
//! manage survive the rewrite untouched.
use serde::{Deserialize, Serialize};

/// A templating (filter) variable merged into `templating.list`.
///
/// Grafana accepts a sparse object here, so every field the builtin table
/// leaves unset is skipped during serialization rather than written as null.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateVariable {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datasource: Option<String>,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<CurrentSelection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide: Option<u8>,
    #[serde(rename = "includeAll", skip_serializing_if = "Option::is_none")]
    pub include_all: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multi: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<VariableOption>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(rename = "skipUrlSync", skip_serializing_if = "Option::is_none")]
    pub skip_url_sync: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<u8>,
}

/// The currently selected value of a templating variable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CurrentSelection {
    pub text: String,
    pub value: String,
}

/// One entry in an interval variable's fixed option list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariableOption {
    pub text: String,
    pub value: String,
    pub selected: bool,
}

/// A drill-down link as declared in the enhancement table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrillDownLink {
    pub title: String,
    pub url: String,
    pub tooltip: String,
}

/// The serialized form of a dashboard link, with the fixed presentation
/// fields Grafana expects.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardLink {
    pub title: String,
    pub url: String,
    pub icon: String,
    pub tooltip: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "targetBlank")]
    pub target_blank: bool,
}

/// An alert annotation query over the `ALERTS` series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Annotation {
    pub datasource: String,
    pub enable: bool,
    pub expr: String,
    #[serde(rename = "iconColor")]
    pub icon_color: String,
    pub name: String,
    pub step: String,
    #[serde(rename = "tagKeys")]
    pub tag_keys: String,
    #[serde(rename = "textFormat")]
    pub text_format: String,
    #[serde(rename = "titleFormat")]
    pub title_format: String,
}

/// The `annotations` block written into each dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnnotationList {
    pub list: Vec<Annotation>,
}

/// Build the alert annotation block for a dashboard's alert-name filter.
pub fn annotations_for(alert_filter: &str) -> AnnotationList {
    AnnotationList {
        list: vec![Annotation {
            datasource: "${datasource}".to_string(),
            enable: true,
            expr: format!("ALERTS{{alertname=~\"{alert_filter}\", namespace=\"$namespace\"}}"),
            icon_color: "rgba(255, 96, 96, 1)".to_string(),
            name: "Alerts".to_string(),
            step: "60s".to_string(),
            tag_keys: "alertname,severity".to_string(),
            text_format: "{{alertname}}: {{severity}}".to_string(),
            title_format: "Alert".to_string(),
        }],
    }
}

/// Expand declared drill-down links into the full dashboard link objects.
pub fn links_for(links: &[DrillDownLink]) -> Vec<DashboardLink> {
    links
        .iter()
        .map(|link| DashboardLink {
            title: link.title.clone(),
            url: link.url.clone(),
            icon: "dashboard".to_string(),
            tooltip: link.tooltip.clone(),
            kind: "link".to_string(),
            target_blank: false,
        })
        .collect()
}
