//! Merge engine: combine per-source carrier maps into one deduplicated,
//! order-preserving result.

use std::collections::{BTreeMap, HashSet};

use edgepick_shared::{Carrier, CarrierMap, Endpoint, MergedResult};

/// Merge source maps in arrival order.
///
/// Per carrier, sequences are concatenated (no interleaving, no ranking),
/// then deduplicated keeping each endpoint's first occurrence. A later
/// source's duplicates are simply dropped.
pub fn merge(maps: impl IntoIterator<Item = CarrierMap>) -> MergedResult {
    let mut accumulated: BTreeMap<Carrier, Vec<Endpoint>> = BTreeMap::new();

    for map in maps {
        for (carrier, endpoints) in map.iter() {
            accumulated
                .entry(carrier)
                .or_default()
                .extend_from_slice(endpoints);
        }
    }

    let deduped = accumulated
        .into_iter()
        .map(|(carrier, endpoints)| (carrier, dedup_keep_order(endpoints)))
        .collect();

    MergedResult::from_deduped(deduped)
}

/// Drop duplicates, keeping the first occurrence of each endpoint in place.
fn dedup_keep_order(endpoints: Vec<Endpoint>) -> Vec<Endpoint> {
    let mut seen = HashSet::new();
    endpoints
        .into_iter()
        .filter(|endpoint| seen.insert(endpoint.clone()))
        .collect()
}
