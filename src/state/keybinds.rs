//! Lane/key model and the binding table that keeps both directions consistent.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Label returned for a lane that currently has no key.
pub const UNASSIGNED: &str = "UNASSIGNED";

/// One of the seven playable lanes of the 7-key layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Lane {
    /// Lane code 11.
    Scratch,
    /// Lane code 12.
    Key1,
    /// Lane code 13.
    Key2,
    /// Lane code 14.
    Key3,
    /// Lane code 15.
    Key4,
    /// Lane code 16.
    Key5,
    /// Lane code 17.
    Key6,
}

/// Raised when a lane code outside of 11..=17 reaches the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown lane code {0}")]
pub struct UnknownLane(pub u8);

impl Lane {
    /// Every lane in display order.
    pub const ALL: [Lane; 7] = [
        Lane::Scratch,
        Lane::Key1,
        Lane::Key2,
        Lane::Key3,
        Lane::Key4,
        Lane::Key5,
        Lane::Key6,
    ];

    /// Persisted lane code.
    pub fn code(self) -> u8 {
        match self {
            Lane::Scratch => 11,
            Lane::Key1 => 12,
            Lane::Key2 => 13,
            Lane::Key3 => 14,
            Lane::Key4 => 15,
            Lane::Key5 => 16,
            Lane::Key6 => 17,
        }
    }

    /// Resolve a persisted lane code.
    pub fn from_code(code: u8) -> Result<Self, UnknownLane> {
        Lane::ALL
            .into_iter()
            .find(|lane| lane.code() == code)
            .ok_or(UnknownLane(code))
    }

    /// Human readable lane label.
    pub fn label(self) -> &'static str {
        match self {
            Lane::Scratch => "1P SCRATCH",
            Lane::Key1 => "1P KEY 1",
            Lane::Key2 => "1P KEY 2",
            Lane::Key3 => "1P KEY 3",
            Lane::Key4 => "1P KEY 4",
            Lane::Key5 => "1P KEY 5",
            Lane::Key6 => "1P KEY 6",
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Platform key code as delivered by the input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhysicalKey(pub u32);

impl fmt::Display for PhysicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A key press observed by the input source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    /// Key code of the pressed key.
    pub key: PhysicalKey,
    /// Symbol reported by the platform for the key (e.g. `z`, ` `).
    pub symbol: String,
}

impl KeyPress {
    /// Build a key press from its code and platform symbol.
    pub fn new(code: u32, symbol: impl Into<String>) -> Self {
        Self {
            key: PhysicalKey(code),
            symbol: symbol.into(),
        }
    }

    /// Label shown for this key once bound.
    pub fn display_name(&self) -> String {
        key_display_name(&self.symbol)
    }
}

/// Turn a platform key symbol into its label: space becomes `SPACE`, letters are upper-cased.
pub fn key_display_name(symbol: &str) -> String {
    let upper = symbol.to_uppercase();
    if upper == " " { "SPACE".to_string() } else { upper }
}

/// Result of a [`KeyBindingTable::rebind`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RebindOutcome {
    /// Lane that received the key.
    pub lane: Lane,
    /// Key now bound to `lane`.
    pub key: PhysicalKey,
    /// Label stored for `lane`.
    pub display_name: String,
    /// Other lane that lost the key, if any.
    pub evicted: Option<Lane>,
    /// Key that was bound to `lane` before and is now unbound.
    pub released: Option<PhysicalKey>,
}

impl RebindOutcome {
    /// Confirmation message naming the key and lane.
    pub fn message(&self) -> String {
        let mut message = format!(
            "Assigned \"{}\" to \"{}\".",
            self.display_name,
            self.lane.label()
        );
        if let Some(evicted) = self.evicted {
            message.push_str(&format!(" (\"{}\" is now unassigned)", evicted.label()));
        }
        message
    }
}

/// Live key bindings: key → lane, plus the label of each bound lane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindingTable {
    key_to_lane: BTreeMap<PhysicalKey, Lane>,
    lane_to_key_name: BTreeMap<Lane, String>,
}

impl Default for KeyBindingTable {
    /// ZSXDCFV layout.
    fn default() -> Self {
        let defaults = [
            (90, Lane::Scratch, "Z"),
            (83, Lane::Key1, "S"),
            (88, Lane::Key2, "X"),
            (68, Lane::Key3, "D"),
            (67, Lane::Key4, "C"),
            (70, Lane::Key5, "F"),
            (86, Lane::Key6, "V"),
        ];

        let mut table = Self::empty();
        for (code, lane, name) in defaults {
            table.rebind(lane, PhysicalKey(code), name.to_string());
        }
        table
    }
}

impl KeyBindingTable {
    /// Table with every lane unassigned.
    pub fn empty() -> Self {
        Self {
            key_to_lane: BTreeMap::new(),
            lane_to_key_name: BTreeMap::new(),
        }
    }

    /// Key currently bound to `lane`.
    pub fn get(&self, lane: Lane) -> Option<PhysicalKey> {
        self.key_to_lane
            .iter()
            .find(|(_, bound)| **bound == lane)
            .map(|(key, _)| *key)
    }

    /// Lane a key drives, if any.
    pub fn lane_for(&self, key: PhysicalKey) -> Option<Lane> {
        self.key_to_lane.get(&key).copied()
    }

    /// Label of the key bound to `lane`, or [`UNASSIGNED`].
    pub fn display_name(&self, lane: Lane) -> &str {
        self.lane_to_key_name
            .get(&lane)
            .map(String::as_str)
            .unwrap_or(UNASSIGNED)
    }

    /// Lanes in code order with their key and label.
    pub fn bindings(&self) -> impl Iterator<Item = (Lane, Option<PhysicalKey>, &str)> + '_ {
        Lane::ALL
            .into_iter()
            .map(|lane| (lane, self.get(lane), self.display_name(lane)))
    }

    /// Raw key → lane view.
    pub fn key_to_lane(&self) -> &BTreeMap<PhysicalKey, Lane> {
        &self.key_to_lane
    }

    /// Raw lane → label view.
    pub fn lane_to_key_name(&self) -> &BTreeMap<Lane, String> {
        &self.lane_to_key_name
    }

    /// Bind `key` to `lane`.
    ///
    /// If `key` already drives some lane (possibly `lane` itself) that assignment and its label are
    /// removed first, so a key never drives two lanes. A different key still targeting `lane` is
    /// dropped as well; it ends up unbound while `lane` always ends with `key`.
    pub fn rebind(&mut self, lane: Lane, key: PhysicalKey, display_name: String) -> RebindOutcome {
        let evicted = self.key_to_lane.remove(&key);
        if let Some(previous) = evicted {
            self.lane_to_key_name.remove(&previous);
        }

        let released = self.get(lane);
        if let Some(stale) = released {
            self.key_to_lane.remove(&stale);
        }

        self.key_to_lane.insert(key, lane);
        self.lane_to_key_name.insert(lane, display_name.clone());

        RebindOutcome {
            lane,
            key,
            display_name,
            evicted: evicted.filter(|previous| *previous != lane),
            released,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_layout_binds_every_lane() {
        let table = KeyBindingTable::default();
        let names: Vec<_> = Lane::ALL.iter().map(|l| table.display_name(*l)).collect();
        assert_eq!(names, ["Z", "S", "X", "D", "C", "F", "V"]);
        assert_eq!(table.get(Lane::Scratch), Some(PhysicalKey(90)));
        assert_eq!(table.get(Lane::Key6), Some(PhysicalKey(86)));
    }

    #[test]
    fn lane_codes_round_trip() {
        for lane in Lane::ALL {
            assert_eq!(Lane::from_code(lane.code()), Ok(lane));
        }
        assert_eq!(Lane::from_code(18), Err(UnknownLane(18)));
        assert_eq!(Lane::from_code(10), Err(UnknownLane(10)));
    }

    #[test]
    fn display_name_normalises_symbol() {
        assert_eq!(key_display_name(" "), "SPACE");
        assert_eq!(key_display_name("z"), "Z");
        assert_eq!(key_display_name("Shift"), "SHIFT");
        assert_eq!(key_display_name(","), ",");
    }

    #[test]
    fn stealing_a_key_unassigns_the_previous_lane() {
        let mut table = KeyBindingTable::default();
        let outcome = table.rebind(Lane::Key1, PhysicalKey(90), "Z".into());

        assert_eq!(table.get(Lane::Scratch), None);
        assert_eq!(table.display_name(Lane::Scratch), UNASSIGNED);
        assert_eq!(table.get(Lane::Key1), Some(PhysicalKey(90)));
        assert_eq!(table.display_name(Lane::Key1), "Z");
        assert_eq!(outcome.evicted, Some(Lane::Scratch));
        assert_eq!(outcome.released, Some(PhysicalKey(83)));
        assert_eq!(table.lane_for(PhysicalKey(83)), None);
        assert_eq!(
            outcome.message(),
            "Assigned \"Z\" to \"1P KEY 1\". (\"1P SCRATCH\" is now unassigned)"
        );
    }

    #[test]
    fn rebinding_to_held_key_is_a_no_op() {
        let mut table = KeyBindingTable::default();
        let before = table.clone();
        let outcome = table.rebind(Lane::Key3, PhysicalKey(68), "D".into());

        assert_eq!(table, before);
        assert_eq!(outcome.evicted, None);
        assert_eq!(outcome.released, None);
        assert_eq!(outcome.message(), "Assigned \"D\" to \"1P KEY 3\".");
    }

    #[test]
    fn fresh_key_replaces_lane_binding() {
        let mut table = KeyBindingTable::default();
        table.rebind(Lane::Scratch, PhysicalKey(16), "SHIFT".into());

        assert_eq!(table.get(Lane::Scratch), Some(PhysicalKey(16)));
        assert_eq!(table.lane_for(PhysicalKey(90)), None);
        assert_eq!(table.key_to_lane().len(), 7);
    }

    fn lane_strategy() -> impl Strategy<Value = Lane> {
        (0usize..7).prop_map(|index| Lane::ALL[index])
    }

    proptest! {
        #[test]
        fn no_key_serves_two_lanes(ops in prop::collection::vec((lane_strategy(), 60u32..100), 1..64)) {
            let mut table = KeyBindingTable::empty();
            for (lane, code) in ops {
                table.rebind(lane, PhysicalKey(code), format!("K{code}"));

                prop_assert_eq!(table.get(lane), Some(PhysicalKey(code)));
                for a in Lane::ALL {
                    for b in Lane::ALL {
                        if a != b {
                            if let (Some(ka), Some(kb)) = (table.get(a), table.get(b)) {
                                prop_assert_ne!(ka, kb);
                            }
                        }
                    }
                }

                // Labels exist exactly for bound lanes and match the bound key.
                for bound_lane in Lane::ALL {
                    match table.get(bound_lane) {
                        Some(key) => prop_assert_eq!(
                            table.display_name(bound_lane).to_string(),
                            format!("K{}", key.0)
                        ),
                        None => prop_assert_eq!(table.display_name(bound_lane), UNASSIGNED),
                    }
                }
                let targets: std::collections::BTreeSet<_> = table.key_to_lane().values().collect();
                prop_assert_eq!(targets.len(), table.key_to_lane().len());
            }
        }
    }
}
