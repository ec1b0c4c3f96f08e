use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::state::{
    keybinds::{KeyBindingTable, Lane},
    settings::{GameplaySettings, GaugeMode},
};

#[derive(Debug, Clone, Serialize, ToSchema)]
/// Gameplay settings as exposed over HTTP.
pub struct SettingsDto {
    pub scroll_speed: f64,
    pub gauge_mode: GaugeMode,
    pub judge_offset: i32,
}

impl From<&GameplaySettings> for SettingsDto {
    fn from(value: &GameplaySettings) -> Self {
        Self {
            scroll_speed: value.scroll_speed(),
            gauge_mode: value.gauge_mode(),
            judge_offset: value.judge_offset(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
/// One lane with the key driving it.
pub struct LaneBindingDto {
    /// Lane code (11 to 17).
    pub lane: u8,
    /// Lane label, e.g. `1P KEY 3`.
    pub label: String,
    /// Key code bound to the lane.
    pub key: Option<u32>,
    /// Key label, `UNASSIGNED` when no key is bound.
    pub key_name: String,
}

impl LaneBindingDto {
    pub fn new(lane: Lane, table: &KeyBindingTable) -> Self {
        Self {
            lane: lane.code(),
            label: lane.label().to_string(),
            key: table.get(lane).map(|key| key.0),
            key_name: table.display_name(lane).to_string(),
        }
    }

    /// Every lane of `table` in code order.
    pub fn all(table: &KeyBindingTable) -> Vec<Self> {
        table
            .bindings()
            .map(|(lane, key, name)| Self {
                lane: lane.code(),
                label: lane.label().to_string(),
                key: key.map(|key| key.0),
                key_name: name.to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Current in-memory configuration of the player.
pub struct ConfigResponse {
    pub settings: SettingsDto,
    pub bindings: Vec<LaneBindingDto>,
    /// Lane waiting for a key press, if any.
    pub awaiting_lane: Option<u8>,
    /// Whether the configuration differs from the last stored document.
    pub unsaved_changes: bool,
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
/// Partial settings update; omitted fields keep their value.
pub struct UpdateSettingsRequest {
    #[validate(range(min = 0.5, max = 10.0))]
    pub scroll_speed: Option<f64>,
    pub gauge_mode: Option<GaugeMode>,
    #[validate(range(min = -100, max = 100))]
    pub judge_offset: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Generic acknowledgement carrying the status message of an action.
pub struct ActionResponse {
    pub message: String,
}
