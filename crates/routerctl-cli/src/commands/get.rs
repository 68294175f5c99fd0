//! Get command - display routers

use anyhow::{bail, Result};
use routerctl_control::{query, OpContext};
use routerctl_core::RouterUid;
use routerctl_store::NorthboundClient;

use crate::commands::split_names;
use crate::output::{render_routers, OutputFormat};

/// Resource types `get` understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Logical routers created by Neutron.
    Routers,
}

impl ResourceKind {
    /// Canonical names, for error messages.
    pub const AVAILABLE: &'static str = "routers";

    fn parse(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "routers" | "router" => Ok(Self::Routers),
            other => bail!(
                "unknown resource type: {other}. Available resources: {}",
                Self::AVAILABLE
            ),
        }
    }
}

/// A parsed `get` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    /// What to list.
    pub kind: ResourceKind,
    /// UIDs to restrict to; empty means everything.
    pub names: Vec<String>,
}

/// Parse `get` arguments in either `<type> [name...]` or `<type>/<name>`
/// form. Names may be comma-separated in both forms.
pub fn parse_resource_args(args: &[String]) -> Result<ResourceRequest> {
    let Some((first, rest)) = args.split_first() else {
        bail!(
            "you must specify the type of resource to get. Available resources: {}",
            ResourceKind::AVAILABLE
        );
    };

    let mut names = Vec::new();
    if first.contains('/') {
        let mut parts = first.split('/');
        let (Some(kind), Some(name), None) = (parts.next(), parts.next(), parts.next()) else {
            bail!("arguments in resource/name form may not have more than one slash");
        };
        if kind.is_empty() || name.is_empty() {
            bail!("arguments in resource/name form must have a single resource and name");
        }
        if !rest.is_empty() {
            bail!("there is no need to specify additional arguments when using resource/name form");
        }
        split_names(name, &mut names);
        return Ok(ResourceRequest {
            kind: ResourceKind::parse(kind)?,
            names,
        });
    }

    for arg in rest {
        split_names(arg, &mut names);
    }
    Ok(ResourceRequest {
        kind: ResourceKind::parse(first)?,
        names,
    })
}

/// Fetch routers and render them in the requested format.
pub async fn render<C>(
    client: &C,
    request: &ResourceRequest,
    format: OutputFormat,
    no_headers: bool,
) -> Result<String>
where
    C: NorthboundClient + ?Sized,
{
    match request.kind {
        ResourceKind::Routers => {
            let ctx = OpContext::background();
            let uids: Vec<RouterUid> = request.names.iter().map(RouterUid::new).collect();
            let list = query::filter_by_uids(query::list(&ctx, client).await?, &uids);
            tracing::debug!(routers = list.len(), "Listed routers");
            render_routers(&list, format, no_headers)
        }
    }
}

/// Display one or many resources
pub async fn get<C>(client: &C, args: &[String], format: OutputFormat, no_headers: bool) -> Result<()>
where
    C: NorthboundClient + ?Sized,
{
    let request = parse_resource_args(args)?;
    let out = render(client, &request, format, no_headers).await?;
    if !out.is_empty() {
        println!("{}", out.trim_end());
    }
    Ok(())
}
