use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::state::{
    keybinds::{KeyBindingTable, Lane, PhysicalKey},
    settings::{GameplaySettings, GaugeMode, SettingsError},
};

/// Per-user settings document stored at `.../settings/gameConfig`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameConfigEntity {
    /// Note scroll speed multiplier.
    pub scroll_speed: f64,
    /// Judgment gauge mode.
    pub gauge_mode: GaugeMode,
    /// Timing offset in milliseconds.
    pub judge_offset: i32,
    /// Custom key layout; absent in documents written before bindings existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keybinds: Option<KeybindsEntity>,
}

/// Both directions of the binding table, keyed by numeric codes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KeybindsEntity {
    /// Key code to lane code.
    pub key_to_lane: BTreeMap<u32, u8>,
    /// Lane code to the label of its key.
    pub lane_to_key_name: BTreeMap<u8, String>,
}

impl GameConfigEntity {
    /// Snapshot the in-memory settings and bindings.
    pub fn from_domain(settings: &GameplaySettings, bindings: &KeyBindingTable) -> Self {
        Self {
            scroll_speed: settings.scroll_speed(),
            gauge_mode: settings.gauge_mode(),
            judge_offset: settings.judge_offset(),
            keybinds: Some(KeybindsEntity::from(bindings)),
        }
    }

    /// Validate the settings and rebuild the binding table.
    ///
    /// Without a `keybinds` field the default layout is kept.
    pub fn into_domain(self) -> Result<(GameplaySettings, KeyBindingTable), SettingsError> {
        let settings =
            GameplaySettings::new(self.scroll_speed, self.gauge_mode, self.judge_offset)?;
        let bindings = self
            .keybinds
            .map(KeybindsEntity::into_table)
            .unwrap_or_default();
        Ok((settings, bindings))
    }
}

impl From<&KeyBindingTable> for KeybindsEntity {
    fn from(table: &KeyBindingTable) -> Self {
        Self {
            key_to_lane: table
                .key_to_lane()
                .iter()
                .map(|(key, lane)| (key.0, lane.code()))
                .collect(),
            lane_to_key_name: table
                .lane_to_key_name()
                .iter()
                .map(|(lane, name)| (lane.code(), name.clone()))
                .collect(),
        }
    }
}

impl KeybindsEntity {
    /// Replay every stored pair through `rebind`, so a hand-edited document still yields a
    /// consistent table. Pairs are applied in key code order; unknown lanes are skipped.
    pub fn into_table(self) -> KeyBindingTable {
        let mut table = KeyBindingTable::empty();
        for (code, lane_code) in self.key_to_lane {
            let lane = match Lane::from_code(lane_code) {
                Ok(lane) => lane,
                Err(err) => {
                    warn!(key = code, error = %err, "skipping stored binding");
                    continue;
                }
            };
            let name = self
                .lane_to_key_name
                .get(&lane_code)
                .cloned()
                .unwrap_or_else(|| code.to_string());
            table.rebind(lane, PhysicalKey(code), name);
        }
        table
    }
}

/// Judgment breakdown of a play.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct JudgeCountsEntity {
    pub pgreat: u32,
    pub great: u32,
    pub good: u32,
    pub bad: u32,
    pub poor: u32,
}

/// One leaderboard entry, keyed by `{userId}_{musicId}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScoreEntity {
    /// Track the score was set on.
    pub music_id: String,
    pub score: u32,
    pub max_combo: u32,
    pub judge: JudgeCountsEntity,
    /// RFC 3339 submission time.
    pub timestamp: String,
    pub user_id: String,
    /// Name shown on the leaderboard.
    pub user_name: String,
    /// Scroll speed the score was played with.
    pub scroll_speed: f64,
}

impl ScoreEntity {
    /// Document id of the entry: one per user and track.
    pub fn document_id(&self) -> String {
        score_document_id(&self.user_id, &self.music_id)
    }
}

/// Document id for the score of `user_id` on `music_id`.
pub fn score_document_id(user_id: &str, music_id: &str) -> String {
    format!("{}_{}", user_id, music_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::keybinds::UNASSIGNED;
    use serde_json::json;

    #[test]
    fn config_document_uses_camel_case_shape() {
        let entity = GameConfigEntity::from_domain(
            &GameplaySettings::default(),
            &KeyBindingTable::default(),
        );
        let value = serde_json::to_value(&entity).unwrap();

        assert_eq!(value["scrollSpeed"], json!(3.5));
        assert_eq!(value["gaugeMode"], json!("NORMAL"));
        assert_eq!(value["judgeOffset"], json!(0));
        assert_eq!(value["keybinds"]["keyToLane"]["90"], json!(11));
        assert_eq!(value["keybinds"]["laneToKeyName"]["17"], json!("V"));
    }

    #[test]
    fn document_without_keybinds_keeps_default_layout() {
        let entity: GameConfigEntity = serde_json::from_value(json!({
            "scrollSpeed": 2.0,
            "gaugeMode": "HARD",
            "judgeOffset": -12
        }))
        .unwrap();

        let (settings, bindings) = entity.into_domain().unwrap();
        assert_eq!(settings.gauge_mode(), GaugeMode::Hard);
        assert_eq!(settings.judge_offset(), -12);
        assert_eq!(bindings, KeyBindingTable::default());
    }

    #[test]
    fn out_of_range_settings_are_rejected() {
        let entity: GameConfigEntity = serde_json::from_value(json!({
            "scrollSpeed": 42.0,
            "gaugeMode": "EASY",
            "judgeOffset": 0
        }))
        .unwrap();

        assert_eq!(
            entity.into_domain().unwrap_err(),
            SettingsError::ScrollSpeedOutOfRange(42.0)
        );
    }

    #[test]
    fn inconsistent_stored_table_is_reconciled() {
        let keybinds: KeybindsEntity = serde_json::from_value(json!({
            "keyToLane": {"65": 11, "66": 11, "67": 99},
            "laneToKeyName": {"11": "B", "12": "GHOST"}
        }))
        .unwrap();

        let table = keybinds.into_table();
        assert_eq!(table.get(Lane::Scratch), Some(PhysicalKey(66)));
        assert_eq!(table.lane_for(PhysicalKey(65)), None);
        assert_eq!(table.lane_for(PhysicalKey(67)), None);
        assert_eq!(table.display_name(Lane::Key1), UNASSIGNED);
        assert_eq!(table.key_to_lane().len(), 1);
    }

    #[test]
    fn table_round_trips_through_entity() {
        let mut table = KeyBindingTable::default();
        table.rebind(Lane::Key3, PhysicalKey(32), "SPACE".into());

        let rebuilt = KeybindsEntity::from(&table).into_table();
        assert_eq!(rebuilt, table);
    }

    #[test]
    fn score_document_id_joins_user_and_track() {
        assert_eq!(score_document_id("abc", "MOCK_BMS_001"), "abc_MOCK_BMS_001");
    }
}
