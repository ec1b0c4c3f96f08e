//! Shared leaderboard documents and their ranking.

use std::sync::Arc;

use serde_json::{from_value, to_value};
use tracing::warn;

use crate::dao::{
    document_store::{CollectionPath, DocumentStore, FieldFilter},
    models::ScoreEntity,
    storage::{StorageError, StorageResult},
};

/// Reads and writes `artifacts/{appId}/public/data/highScores`.
#[derive(Clone)]
pub struct ScoreBoard {
    store: Arc<dyn DocumentStore>,
    app_id: String,
}

impl ScoreBoard {
    pub fn new(store: Arc<dyn DocumentStore>, app_id: impl Into<String>) -> Self {
        Self {
            store,
            app_id: app_id.into(),
        }
    }

    pub fn collection(&self) -> CollectionPath {
        CollectionPath::new(["artifacts", self.app_id.as_str(), "public", "data", "highScores"])
    }

    /// Store `entry`, replacing any previous entry of the same user on the same track.
    pub async fn submit(&self, entry: &ScoreEntity) -> StorageResult<()> {
        let path = self.collection().document(entry.document_id());
        let data = to_value(entry).map_err(|err| StorageError::malformed(path.to_string(), err))?;
        self.store.set_document(path, data).await
    }

    /// Best `limit` entries recorded on `music_id`.
    ///
    /// Entries that cannot be decoded are skipped.
    pub async fn top_scores(&self, music_id: &str, limit: usize) -> StorageResult<Vec<ScoreEntity>> {
        let documents = self
            .store
            .query_collection(self.collection(), FieldFilter::equals("musicId", music_id))
            .await?;

        let entries = documents
            .into_iter()
            .filter_map(|raw| match from_value::<ScoreEntity>(raw) {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(error = %err, music_id, "skipping undecodable score entry");
                    None
                }
            })
            .collect();

        Ok(rank_top(entries, limit))
    }
}

/// Sort by score, highest first, and keep the first `limit` entries.
///
/// The sort is stable: equal scores keep the order the store returned them in, which is not
/// guaranteed to be meaningful.
pub fn rank_top(mut entries: Vec<ScoreEntity>, limit: usize) -> Vec<ScoreEntity> {
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries.truncate(limit);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::{
        document_store::memory::MemoryDocumentStore, models::JudgeCountsEntity,
    };
    use serde_json::json;

    fn entry(user: &str, music: &str, score: u32) -> ScoreEntity {
        ScoreEntity {
            music_id: music.into(),
            score,
            max_combo: 500,
            judge: JudgeCountsEntity::default(),
            timestamp: "2024-01-01T00:00:00Z".into(),
            user_id: user.into(),
            user_name: format!("User_{user}"),
            scroll_speed: 3.5,
        }
    }

    #[test]
    fn ranking_sorts_descending_and_keeps_tie_order() {
        let entries = vec![
            entry("a", "m", 10),
            entry("b", "m", 500),
            entry("c", "m", 200),
            entry("d", "m", 500),
        ];

        let ranked = rank_top(entries, 10);
        let order: Vec<_> = ranked.iter().map(|e| (e.user_id.as_str(), e.score)).collect();
        assert_eq!(order, [("b", 500), ("d", 500), ("c", 200), ("a", 10)]);
    }

    #[test]
    fn ranking_truncates_to_limit() {
        let entries = (0..15).map(|i| entry(&i.to_string(), "m", i)).collect();
        let ranked = rank_top(entries, 10);
        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked[0].score, 14);
        assert_eq!(ranked[9].score, 5);
    }

    #[tokio::test]
    async fn resubmission_overwrites_single_entry() {
        let memory = MemoryDocumentStore::new();
        let board = ScoreBoard::new(Arc::new(memory.clone()), "app");

        board.submit(&entry("u1", "m", 100)).await.unwrap();
        board.submit(&entry("u1", "m", 50)).await.unwrap();

        assert_eq!(memory.len(&board.collection()), 1);
        let top = board.top_scores("m", 10).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].score, 50);
    }

    #[tokio::test]
    async fn other_tracks_and_broken_entries_are_left_out() {
        let memory = MemoryDocumentStore::new();
        let board = ScoreBoard::new(Arc::new(memory.clone()), "app");

        board.submit(&entry("u1", "m", 100)).await.unwrap();
        board.submit(&entry("u2", "other", 900)).await.unwrap();
        memory
            .set_document(
                board.collection().document("broken"),
                json!({"musicId": "m", "score": "lots"}),
            )
            .await
            .unwrap();

        let top = board.top_scores("m", 10).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].user_id, "u1");
    }
}
