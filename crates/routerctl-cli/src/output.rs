//! Output formatting for routerctl (table, wide, json, yaml)

use anyhow::{Context, Result};
use clap::ValueEnum;
use routerctl_control::{Router, RouterList};
use tabled::settings::object::Rows;
use tabled::settings::{Remove, Style};
use tabled::{Table, Tabled};

/// Placeholder for empty cells.
const NONE: &str = "<none>";

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Column table (default)
    #[default]
    Table,
    /// Column table with the hosting chassis
    Wide,
    /// JSON document
    Json,
    /// YAML document
    Yaml,
}

/// A router row in table output
#[derive(Debug, Tabled)]
pub struct RouterRow {
    #[tabled(rename = "UUID")]
    pub uid: String,
    #[tabled(rename = "NAME")]
    pub name: String,
    #[tabled(rename = "EXTERNAL-IPS")]
    pub external_ips: String,
    #[tabled(rename = "ENABLED")]
    pub enabled: bool,
    #[tabled(rename = "PORTS")]
    pub ports: usize,
}

/// A router row in wide table output
#[derive(Debug, Tabled)]
pub struct WideRouterRow {
    #[tabled(inline)]
    pub base: RouterRow,
    #[tabled(rename = "AGENT")]
    pub agent: String,
}

impl From<&Router> for RouterRow {
    fn from(router: &Router) -> Self {
        let name = if router.name.is_empty() || router.name == router.uid.as_str() {
            NONE.to_string()
        } else {
            router.name.clone()
        };
        let external_ips = if router.status.external_ips.is_empty() {
            NONE.to_string()
        } else {
            router.status.external_ips.join(",")
        };
        Self {
            uid: router.uid.to_string(),
            name,
            external_ips,
            enabled: router.enabled,
            ports: router.status.ports.len(),
        }
    }
}

impl From<&Router> for WideRouterRow {
    fn from(router: &Router) -> Self {
        Self {
            base: RouterRow::from(router),
            agent: router
                .status
                .agent
                .clone()
                .unwrap_or_else(|| NONE.to_string()),
        }
    }
}

/// Render a router list in the requested format.
pub fn render_routers(list: &RouterList, format: OutputFormat, no_headers: bool) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(
            list.items.iter().map(RouterRow::from),
            no_headers,
        )),
        OutputFormat::Wide => Ok(render_table(
            list.items.iter().map(WideRouterRow::from),
            no_headers,
        )),
        OutputFormat::Json => {
            serde_json::to_string_pretty(list).context("Failed to encode router list as JSON")
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(list).context("Failed to encode router list as YAML")
        }
    }
}

fn render_table<T, I>(rows: I, no_headers: bool) -> String
where
    T: Tabled,
    I: IntoIterator<Item = T>,
{
    let mut table = Table::new(rows);
    table.with(Style::blank());
    if no_headers {
        table.with(Remove::row(Rows::first()));
    }
    table.to_string()
}
