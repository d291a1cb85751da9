//! Route lookup command

use crate::cli::RouteArgs;
use crate::config::HarvestConfig;
use crate::routing::route;

/// Handle `harvest route` command
///
/// Prints the slot name, or `unmatched` when no pattern applies.
pub fn handle_route(args: &RouteArgs, config: &HarvestConfig) -> String {
    match route(&args.url, &config.routing.patterns) {
        Some(slot) => slot.to_string(),
        None => "unmatched".to_string(),
    }
}
