//! Row extraction: raw table rows → (carrier, endpoint) pairs.
//!
//! Scraped tables follow a "label, address, …" convention but guarantee
//! nothing. Rows with an unrecognized carrier or no valid IPv4 cell are
//! expected noise and are dropped silently.

use edgepick_shared::{Carrier, CarrierMap, Endpoint, ipv4_shaped};

use crate::table::RawRow;

/// Classify a raw carrier label. First match wins; anything unrecognized is
/// `None` and never enters a map.
pub fn normalize_carrier(label: &str) -> Option<Carrier> {
    let trimmed = label.trim();
    let upper = trimmed.to_uppercase();

    if trimmed.contains("移动") || upper.contains("CMCC") {
        return Some(Carrier::Mobile);
    }
    if trimmed.contains("联通") || upper.contains("CUCC") || upper.contains("UNICOM") {
        return Some(Carrier::Unicom);
    }
    if trimmed.contains("电信") || upper.contains("CTCC") || upper.contains("TELECOM") {
        return Some(Carrier::Telecom);
    }
    None
}

/// Extract at most one (carrier, endpoint) pair from a row.
///
/// The carrier comes from cell 0. The address is the first cell that looks
/// IPv4-shaped, falling back to cell 1 when no cell matches the shape; the
/// chosen cell must then pass full octet-range validation or the row is
/// dropped.
pub fn extract_endpoint(row: &RawRow) -> Option<(Carrier, Endpoint)> {
    let carrier = normalize_carrier(row.first()?)?;

    let candidate = row
        .iter()
        .find(|cell| ipv4_shaped(cell))
        .or_else(|| row.get(1))?;

    let endpoint = Endpoint::parse(candidate)?;
    Some((carrier, endpoint))
}

/// Fold raw rows into a per-source carrier map, preserving row order.
pub fn rows_to_carrier_map(rows: &[RawRow]) -> CarrierMap {
    let mut map = CarrierMap::new();
    for row in rows {
        if let Some((carrier, endpoint)) = extract_endpoint(row) {
            map.push(carrier, endpoint);
        }
    }
    map
}
