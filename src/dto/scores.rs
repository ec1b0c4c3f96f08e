use serde::Serialize;
use utoipa::ToSchema;

use crate::dao::models::{JudgeCountsEntity, ScoreEntity};

#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
/// Judgment breakdown of a play.
pub struct JudgeCountsDto {
    pub pgreat: u32,
    pub great: u32,
    pub good: u32,
    pub bad: u32,
    pub poor: u32,
}

impl From<JudgeCountsEntity> for JudgeCountsDto {
    fn from(value: JudgeCountsEntity) -> Self {
        Self {
            pgreat: value.pgreat,
            great: value.great,
            good: value.good,
            bad: value.bad,
            poor: value.poor,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
/// Leaderboard row.
pub struct ScoreEntryDto {
    /// 1-based position.
    pub rank: usize,
    pub user_id: String,
    pub user_name: String,
    pub score: u32,
    pub max_combo: u32,
    pub judge: JudgeCountsDto,
    pub timestamp: String,
    pub scroll_speed: f64,
    /// Whether the row belongs to the signed-in user.
    pub is_current_user: bool,
}

impl ScoreEntryDto {
    pub fn new(rank: usize, entry: ScoreEntity, current_user: Option<&str>) -> Self {
        let is_current_user = current_user == Some(entry.user_id.as_str());
        Self {
            rank,
            user_id: entry.user_id,
            user_name: entry.user_name,
            score: entry.score,
            max_combo: entry.max_combo,
            judge: entry.judge.into(),
            timestamp: entry.timestamp,
            scroll_speed: entry.scroll_speed,
            is_current_user,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Ranked leaderboard of the tracked music.
pub struct LeaderboardResponse {
    pub music_id: String,
    pub entries: Vec<ScoreEntryDto>,
}

impl LeaderboardResponse {
    pub fn new(music_id: String, entries: Vec<ScoreEntity>, current_user: Option<&str>) -> Self {
        Self {
            music_id,
            entries: entries
                .into_iter()
                .enumerate()
                .map(|(index, entry)| ScoreEntryDto::new(index + 1, entry, current_user))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Reply to a demo score submission.
pub struct SubmittedScoreResponse {
    pub score: u32,
    pub message: String,
}
