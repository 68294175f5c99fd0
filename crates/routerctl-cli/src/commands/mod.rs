//! Command implementations for routerctl

pub mod failover;
pub mod get;

pub use failover::failover;
pub use get::get;

/// Split a comma-separated argument, dropping empty entries and repeats.
pub(crate) fn split_names(arg: &str, names: &mut Vec<String>) {
    for name in arg.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        if !names.iter().any(|seen| seen == name) {
            names.push(name.to_string());
        }
    }
}
