//! Router query service.
//!
//! Lookups by UID, listing, and strict hosting-chassis resolution. Nothing
//! here is cached; every call reads the database again.

use routerctl_core::{naming, RouterUid};
use routerctl_store::NorthboundClient;

use crate::context::OpContext;
use crate::convert::{agree_on_host, convert, reported_host};
use crate::error::{ControlError, Result};
use crate::types::{Router, RouterList};

/// Look up a router by its Neutron UID.
///
/// # Errors
///
/// Returns `ControlError::RouterNotFound` if no record is named
/// `neutron-<uid>`, or any error from [`convert`].
pub async fn get_by_uid<C>(ctx: &OpContext, client: &C, uid: &RouterUid) -> Result<Router>
where
    C: NorthboundClient + ?Sized,
{
    let name = naming::router_record_name(uid);
    let records = ctx
        .guard(client.find_logical_routers_by_name(&name))
        .await??;

    let record = records
        .first()
        .ok_or_else(|| ControlError::RouterNotFound(uid.clone()))?;
    if records.len() > 1 {
        tracing::warn!(router = %uid, count = records.len(), "Multiple records share a router name, using the first");
    }

    convert(ctx, client, record).await
}

/// List every router.
///
/// Records that fail conversion are logged and skipped; only a failure of
/// the listing itself, or the context finishing, is returned as an error.
///
/// # Errors
///
/// Returns an error if the routers cannot be listed or the context is done.
pub async fn list<C>(ctx: &OpContext, client: &C) -> Result<RouterList>
where
    C: NorthboundClient + ?Sized,
{
    let records = ctx.guard(client.list_logical_routers()).await??;

    let mut routers = Vec::with_capacity(records.len());
    for record in &records {
        match convert(ctx, client, record).await {
            Ok(router) => routers.push(router),
            Err(e @ ControlError::Interrupted { .. }) => return Err(e),
            Err(e) => {
                tracing::warn!(record = %record.name, error = %e, "Skipping router");
            }
        }
    }

    tracing::debug!(
        records = records.len(),
        routers = routers.len(),
        "Listed routers"
    );
    Ok(RouterList::new(routers))
}

/// Resolve the chassis currently hosting a router.
///
/// Re-reads every gateway port. All of them must report the same
/// `hosting-chassis`.
///
/// # Errors
///
/// - `ControlError::PortLookup` if a gateway port cannot be read
/// - `ControlError::HostingChassisMissing` if a gateway port has no status
/// - `ControlError::HostingChassisConflict` if gateway ports disagree
/// - `ControlError::NoHostingChassis` if the router has no gateway port or
///   all gateway ports report an empty value
pub async fn hosting_agent<C>(ctx: &OpContext, client: &C, router: &Router) -> Result<String>
where
    C: NorthboundClient + ?Sized,
{
    let mut reports = Vec::new();
    for port in router.gateway_ports() {
        let record = ctx
            .guard(client.get_logical_router_port(&port.internal_uuid))
            .await?
            .map_err(|source| ControlError::PortLookup {
                router: router.uid.clone(),
                port: port.internal_uuid,
                source,
            })?;
        reports.push((&port.uid, reported_host(&record).map(str::to_string)));
    }

    agree_on_host(
        &router.uid,
        reports.iter().map(|(port, host)| (*port, host.as_deref())),
    )
}

/// Keep only the routers whose UID is in `uids`, in list order.
///
/// An empty `uids` keeps everything. UIDs that match nothing are ignored.
#[must_use]
pub fn filter_by_uids(list: RouterList, uids: &[RouterUid]) -> RouterList {
    if uids.is_empty() {
        return list;
    }
    RouterList {
        items: list
            .items
            .into_iter()
            .filter(|router| uids.contains(&router.uid))
            .collect(),
        ..list
    }
}
