use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DefaultOnError, serde_as};

use crate::{
    dao::models::{PlayerEntity, ScoreEntity},
    leaderboard::model::GameId,
};

pub const PLAYER_PREFIX: &str = "player::";
pub const SCORE_PREFIX: &str = "score::";
pub const END_SUFFIX: &str = "\u{ffff}";

pub fn player_prefix(game: &GameId) -> String {
    format!("{PLAYER_PREFIX}{game}:")
}

pub fn player_doc_id(game: &GameId, player_id: &str) -> String {
    format!("{}{player_id}", player_prefix(game))
}

pub fn score_prefix(game: &GameId) -> String {
    format!("{SCORE_PREFIX}{game}:")
}

/// Prefix shared by every score document of one player.
pub fn player_scores_prefix(game: &GameId, player_id: &str) -> String {
    format!("{}{player_id}:", score_prefix(game))
}

pub fn score_doc_id(game: &GameId, player_id: &str, stop_id: &str) -> String {
    format!("{}{stop_id}", player_scores_prefix(game, player_id))
}

/// Whether a document id belongs to one of the game's collections.
pub fn belongs_to_game(doc_id: &str, game: &GameId) -> bool {
    doc_id.starts_with(&player_prefix(game)) || doc_id.starts_with(&score_prefix(game))
}

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    pub id: String,
    #[serde(default)]
    pub doc: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ChangesResponse {
    #[serde(default)]
    pub results: Vec<ChangeRow>,
    pub last_seq: Value,
}

#[derive(Debug, Deserialize)]
pub struct ChangeRow {
    pub id: String,
}

/// Minimal view of a document, enough to learn its current revision.
#[derive(Debug, Deserialize)]
pub struct RevisionOnly {
    #[serde(rename = "_rev")]
    pub rev: String,
}

#[derive(Debug, Serialize)]
pub struct BulkDocs<T> {
    pub docs: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct Tombstone {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev")]
    pub rev: String,
    #[serde(rename = "_deleted")]
    pub deleted: bool,
}

#[derive(Debug, Deserialize)]
pub struct BulkResult {
    #[serde(default)]
    pub error: Option<String>,
}

/// Player document. Every body field tolerates garbage and decodes to `None`.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchPlayerDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub player_id: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub name: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub team: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub joined_at: Option<SystemTime>,
}

impl CouchPlayerDocument {
    pub fn from_entity(game: &GameId, player: PlayerEntity) -> Self {
        let id = player_doc_id(game, player.id.as_deref().unwrap_or_default());
        Self {
            id,
            rev: None,
            player_id: player.id,
            name: player.name,
            team: player.team,
            joined_at: player.joined_at,
        }
    }

    /// Convert back to an entity; a missing `player_id` is recovered from the document id.
    pub fn into_entity(self, game: &GameId) -> PlayerEntity {
        let id = self.player_id.or_else(|| {
            self.id
                .strip_prefix(&player_prefix(game))
                .filter(|rest| !rest.is_empty())
                .map(str::to_string)
        });
        PlayerEntity {
            id,
            name: self.name,
            team: self.team,
            joined_at: self.joined_at,
        }
    }
}

/// Score document for one `(player, stop)` pair.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchScoreDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub player_id: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub stop_id: Option<String>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub strokes: Option<u32>,
    #[serde_as(as = "DefaultOnError")]
    #[serde(default)]
    pub recorded_at: Option<SystemTime>,
}

impl CouchScoreDocument {
    pub fn from_entity(game: &GameId, score: ScoreEntity) -> Self {
        let id = score_doc_id(
            game,
            score.player_id.as_deref().unwrap_or_default(),
            score.stop_id.as_deref().unwrap_or_default(),
        );
        Self {
            id,
            rev: None,
            player_id: score.player_id,
            stop_id: score.stop_id,
            strokes: score.strokes,
            recorded_at: score.recorded_at,
        }
    }
}

impl From<CouchScoreDocument> for ScoreEntity {
    fn from(doc: CouchScoreDocument) -> Self {
        ScoreEntity {
            player_id: doc.player_id,
            stop_id: doc.stop_id,
            strokes: doc.strokes,
            recorded_at: doc.recorded_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{from_value, json};

    use super::*;

    #[test]
    fn document_ids_are_scoped_by_game() {
        let game = GameId::new("drinkers-society");
        assert_eq!(
            player_doc_id(&game, "+15551234567"),
            "player::drinkers-society:+15551234567"
        );
        assert_eq!(
            score_doc_id(&game, "+15551234567", "dogs"),
            "score::drinkers-society:+15551234567:dogs"
        );
        assert!(belongs_to_game("score::drinkers-society:x:y", &game));
        assert!(!belongs_to_game("score::other:x:y", &game));
    }

    #[test]
    fn garbage_strokes_decode_as_missing() {
        let doc: CouchScoreDocument = from_value(json!({
            "_id": "score::g:p:as",
            "_rev": "1-a",
            "player_id": "p",
            "stop_id": "as",
            "strokes": "lots"
        }))
        .unwrap();

        let entity = ScoreEntity::from(doc);
        assert_eq!(entity.player_id.as_deref(), Some("p"));
        assert_eq!(entity.strokes, None);
    }

    #[test]
    fn player_id_falls_back_to_document_id() {
        let game = GameId::new("g");
        let doc: CouchPlayerDocument = from_value(json!({
            "_id": "player::g:+15550000000",
            "name": 42,
            "team": "Hawks"
        }))
        .unwrap();

        let entity = doc.into_entity(&game);
        assert_eq!(entity.id.as_deref(), Some("+15550000000"));
        assert_eq!(entity.name, None);
        assert_eq!(entity.team.as_deref(), Some("Hawks"));
    }

    #[test]
    fn new_documents_omit_the_revision() {
        let game = GameId::new("g");
        let doc = CouchScoreDocument::from_entity(
            &game,
            ScoreEntity {
                player_id: Some("p".into()),
                stop_id: Some("as".into()),
                strokes: Some(3),
                recorded_at: None,
            },
        );
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["_id"], "score::g:p:as");
        assert!(value.get("_rev").is_none());
        assert_eq!(value["strokes"], 3);
    }
}
