//! Schema adapter: northbound records to [`Router`] values.

use routerctl_core::{naming, PortUid, RouterUid};
use routerctl_store::schema::{external_ids, status};
use routerctl_store::{LogicalRouter, LogicalRouterPort, NorthboundClient};

use crate::context::OpContext;
use crate::error::{ControlError, Result};
use crate::types::{PortInfo, Router, RouterStatus};

/// Whether a port is its router's external gateway port.
///
/// Neutron marks gateway ports with the literal string `"True"`; any other
/// value, including `"true"`, is not a gateway.
#[must_use]
pub fn is_gateway_port(port: &LogicalRouterPort) -> bool {
    port.external_ids
        .get(external_ids::IS_EXT_GW)
        .is_some_and(|flag| flag == external_ids::TRUE)
}

/// The raw `hosting-chassis` value a port reports, if the key is present.
pub(crate) fn reported_host(port: &LogicalRouterPort) -> Option<&str> {
    port.status.get(status::HOSTING_CHASSIS).map(String::as_str)
}

/// Decide which chassis hosts a router from its gateway ports' reports.
///
/// Every gateway port must report a value and all values must match. An
/// empty agreed value means northd has not placed the router anywhere.
pub(crate) fn agree_on_host<'a>(
    router: &RouterUid,
    reports: impl IntoIterator<Item = (&'a PortUid, Option<&'a str>)>,
) -> Result<String> {
    let mut hosts: Vec<&str> = Vec::new();
    for (port, host) in reports {
        let host = host.ok_or_else(|| ControlError::HostingChassisMissing {
            router: router.clone(),
            port: port.clone(),
        })?;
        if !hosts.contains(&host) {
            hosts.push(host);
        }
    }

    match hosts.as_slice() {
        [] | [""] => Err(ControlError::NoHostingChassis(router.clone())),
        [host] => Ok((*host).to_string()),
        _ => Err(ControlError::HostingChassisConflict {
            router: router.clone(),
            hosts: hosts.into_iter().map(str::to_string).collect(),
        }),
    }
}

/// Build a [`Router`] from a `Logical_Router` record.
///
/// Every referenced port is read; if any read fails the whole conversion
/// fails. The agent is only set when all gateway ports agree on a hosting
/// chassis. Disagreement is logged and leaves the agent unset.
///
/// # Errors
///
/// Returns `ControlError::InvalidRouterName` for records not named
/// `neutron-<id>`, `ControlError::PortLookup` when a port cannot be read,
/// and `ControlError::Interrupted` if the context finishes first.
pub async fn convert<C>(ctx: &OpContext, client: &C, record: &LogicalRouter) -> Result<Router>
where
    C: NorthboundClient + ?Sized,
{
    let uid = naming::router_uid_from_name(&record.name).map_err(|source| {
        ControlError::InvalidRouterName {
            name: record.name.clone(),
            source,
        }
    })?;

    let name = record
        .external_ids
        .get(external_ids::ROUTER_NAME)
        .filter(|name| !name.is_empty())
        .cloned()
        .unwrap_or_else(|| uid.to_string());

    let mut ports = Vec::with_capacity(record.ports.len());
    let mut gateway_ports = Vec::new();
    let mut external_ips = Vec::new();

    for port_uuid in &record.ports {
        let port = ctx
            .guard(client.get_logical_router_port(port_uuid))
            .await?
            .map_err(|source| ControlError::PortLookup {
                router: uid.clone(),
                port: *port_uuid,
                source,
            })?;

        let is_gateway = is_gateway_port(&port);
        let info = PortInfo {
            uid: naming::port_uid_from_name(&port.name),
            is_gateway,
            internal_uuid: port.uuid,
        };
        if is_gateway {
            external_ips.extend(port.networks.iter().cloned());
            gateway_ports.push((info.uid.clone(), port));
        }
        ports.push(info);
    }

    let reports = gateway_ports
        .iter()
        .map(|(port_uid, port)| (port_uid, reported_host(port)));
    let agent = match agree_on_host(&uid, reports) {
        Ok(host) => Some(host),
        Err(e @ ControlError::HostingChassisConflict { .. }) => {
            tracing::warn!(router = %uid, error = %e, "Gateway ports disagree on hosting chassis");
            None
        }
        Err(_) => None,
    };

    Ok(Router {
        uid,
        name,
        enabled: record.enabled.unwrap_or(true),
        status: RouterStatus {
            agent,
            external_ips,
            ports,
            internal_uuid: record.uuid,
        },
    })
}
