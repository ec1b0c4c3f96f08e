/// Per-user settings persistence.
pub mod config_store;
/// Backend neutral document store and its implementations.
pub mod document_store;
/// Persisted document shapes.
pub mod models;
/// Leaderboard persistence and ranking.
pub mod score_board;
/// Storage error types shared by every backend.
pub mod storage;
