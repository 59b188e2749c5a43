//! Batch enhancer for Grafana dashboard JSON definitions.
//!
//! A declarative table ([`config`]) pairs each dashboard file with extra
//! filter variables, drill-down links, and an alert-name filter; the apply
//! routine ([`apply`]) merges those into the document and rewrites panel
//! queries ([`query`]) to use the variables. Everything outside the owned
//! sub-structures is carried through untouched.
pub mod apply;
pub mod cli;
pub mod config;
pub mod model;
pub mod query;
