//! Core domain types for edgepick.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

// ---------------------------------------------------------------------------
// Carrier
// ---------------------------------------------------------------------------

/// A network carrier category used to partition candidate endpoints.
///
/// The declaration order doubles as the fixed snapshot display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Carrier {
    Mobile,
    Unicom,
    Telecom,
}

impl Carrier {
    /// Fixed order in which carrier sections appear in the snapshot.
    pub const DISPLAY_ORDER: [Carrier; 3] = [Carrier::Mobile, Carrier::Unicom, Carrier::Telecom];

    /// Snapshot section name.
    pub fn name(&self) -> &'static str {
        match self {
            Carrier::Mobile => "Mobile",
            Carrier::Unicom => "Unicom",
            Carrier::Telecom => "Telecom",
        }
    }
}

impl std::fmt::Display for Carrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

/// Shape pattern for IPv4 candidates. Octet range is checked separately, so
/// "999.1.1.1" matches the shape but fails [`is_ipv4`].
static IPV4_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,3}\.){3}\d{1,3}$").expect("static IPv4 pattern"));

/// Whether `s` looks like an IPv4 address (four dot-separated 1-3 digit
/// groups), without range-checking the octets.
pub fn ipv4_shaped(s: &str) -> bool {
    IPV4_SHAPE.is_match(s)
}

/// Whether `s` is a valid IPv4 address: four dot-separated decimal octets,
/// each in 0..=255. Leading zeros are accepted ("01.2.3.4" is valid).
pub fn is_ipv4(s: &str) -> bool {
    ipv4_shaped(s) && s.split('.').all(|octet| matches!(octet.parse::<u16>(), Ok(n) if n <= 255))
}

/// A syntactically validated IPv4 address string.
///
/// Construction goes through [`Endpoint::parse`], so any `Endpoint` held by a
/// map has already passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint(String);

impl Endpoint {
    /// Parse and validate an IPv4 address string. Returns `None` for
    /// anything that is not four in-range dot-separated octets.
    pub fn parse(s: &str) -> Option<Self> {
        let trimmed = s.trim();
        is_ipv4(trimmed).then(|| Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// CarrierMap
// ---------------------------------------------------------------------------

/// Per-source mapping from carrier to its endpoints, in extraction order.
/// Duplicates are permitted here; deduplication happens at merge time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarrierMap {
    entries: BTreeMap<Carrier, Vec<Endpoint>>,
}

impl CarrierMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an endpoint to a carrier's sequence, preserving arrival order.
    pub fn push(&mut self, carrier: Carrier, endpoint: Endpoint) {
        self.entries.entry(carrier).or_default().push(endpoint);
    }

    pub fn get(&self, carrier: Carrier) -> &[Endpoint] {
        self.entries.get(&carrier).map(Vec::as_slice).unwrap_or_default()
    }

    /// Total endpoints across all carriers.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Carrier, &[Endpoint])> {
        self.entries.iter().map(|(c, v)| (*c, v.as_slice()))
    }
}

// ---------------------------------------------------------------------------
// MergedResult
// ---------------------------------------------------------------------------

/// The merged, deduplicated result of a run. Per-carrier sequences contain
/// no duplicate endpoint; first occurrence keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedResult {
    per_carrier: BTreeMap<Carrier, Vec<Endpoint>>,
}

impl MergedResult {
    /// Build from already-deduplicated per-carrier sequences.
    /// Callers (the merge engine) are responsible for dedup.
    pub fn from_deduped(per_carrier: BTreeMap<Carrier, Vec<Endpoint>>) -> Self {
        Self { per_carrier }
    }

    pub fn endpoints(&self, carrier: Carrier) -> &[Endpoint] {
        self.per_carrier
            .get(&carrier)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Grand total across all carriers.
    pub fn total(&self) -> usize {
        self.per_carrier.values().map(Vec::len).sum()
    }

    /// Per-carrier counts in display order. Absent carriers report 0.
    pub fn counts(&self) -> Vec<(Carrier, usize)> {
        Carrier::DISPLAY_ORDER
            .iter()
            .map(|&c| (c, self.endpoints(c).len()))
            .collect()
    }

    /// Cap each carrier's sequence to `top_n` entries, keeping the head in
    /// order. `top_n == 0` means unlimited.
    pub fn trim(&mut self, top_n: usize) {
        if top_n == 0 {
            return;
        }
        for endpoints in self.per_carrier.values_mut() {
            endpoints.truncate(top_n);
        }
    }
}
