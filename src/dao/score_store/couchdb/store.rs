use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, from_value};
use tracing::warn;

use crate::{
    dao::{
        models::{PlayerEntity, ScoreEntity, SnapshotEntity},
        score_store::{FeedListener, ScoreStore, Subscription},
        storage::StorageResult,
    },
    leaderboard::model::GameId,
};

use super::{
    changes::{run_feed, seq_param},
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{
        AllDocsResponse, BulkDocs, BulkResult, ChangesResponse, CouchPlayerDocument,
        CouchScoreDocument, END_SUFFIX, RevisionOnly, Tombstone, player_doc_id, player_prefix,
        player_scores_prefix, score_prefix,
    },
};

const ALL_DOCS: &str = "_all_docs";
const BULK_DOCS: &str = "_bulk_docs";
const CHANGES: &str = "_changes";

#[derive(Debug, Deserialize)]
struct DatabaseInfo {
    update_seq: Value,
}

/// Score store backed by a CouchDB database shared by every game.
#[derive(Clone)]
pub struct CouchScoreStore {
    client: Client,
    database_url: Url,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
    longpoll: Duration,
    feed_retry: Duration,
}

impl CouchScoreStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let database_url = database_url(&config.base_url, &config.database)?;
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            database_url,
            database,
            auth,
            longpoll: config.longpoll,
            feed_retry: config.feed_retry,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    pub(super) fn feed_retry(&self) -> Duration {
        self.feed_retry
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth {
            Some((ref user, ref pass)) => builder.basic_auth(user.as_ref(), Some(pass.as_ref())),
            None => builder,
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = document_url(&self.database_url, path);
        self.authorize(self.client.request(method, url))
    }

    async fn send(&self, builder: reqwest::RequestBuilder, path: &str) -> CouchResult<reqwest::Response> {
        builder.send().await.map_err(|source| CouchDaoError::RequestSend {
            path: path.to_string(),
            source,
        })
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response, path: &str) -> CouchResult<T> {
        if !response.status().is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: path.to_string(),
                status: response.status(),
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|source| CouchDaoError::DecodeResponse {
                path: path.to_string(),
                source,
            })
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = self.database_url.clone();
        let response = self
            .send(self.authorize(self.client.get(url.clone())), url.as_str())
            .await?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .authorize(self.client.put(url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                // 412 means another instance created it first.
                if create.status().is_success() || create.status() == StatusCode::PRECONDITION_FAILED {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn get_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self.send(self.request(Method::GET, doc_id), doc_id).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::decode(response, doc_id).await.map(Some)
    }

    async fn current_rev(&self, doc_id: &str) -> CouchResult<Option<String>> {
        Ok(self
            .get_document::<RevisionOnly>(doc_id)
            .await?
            .map(|doc| doc.rev))
    }

    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<()>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .send(self.request(Method::PUT, doc_id).json(document), doc_id)
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status: response.status(),
            })
        }
    }

    /// List every document whose id starts with `prefix`.
    ///
    /// Documents that cannot be decoded at all are skipped with a warning.
    async fn list_documents<T>(&self, prefix: &str) -> CouchResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let query = [
            ("include_docs", "true".to_string()),
            ("startkey", format!("\"{prefix}\"")),
            ("endkey", format!("\"{prefix}{END_SUFFIX}\"")),
        ];

        let response = self
            .send(self.request(Method::GET, ALL_DOCS).query(&query), ALL_DOCS)
            .await?;
        let payload: AllDocsResponse = Self::decode(response, ALL_DOCS).await?;

        let mut documents = Vec::with_capacity(payload.rows.len());
        for row in payload.rows {
            let Some(doc) = row.doc else { continue };
            match from_value(doc) {
                Ok(parsed) => documents.push(parsed),
                Err(err) => warn!(doc_id = %row.id, error = %err, "skipping unreadable CouchDB document"),
            }
        }

        Ok(documents)
    }

    async fn snapshot(&self, game: &GameId) -> CouchResult<SnapshotEntity> {
        let players = self
            .list_documents::<CouchPlayerDocument>(&player_prefix(game))
            .await?
            .into_iter()
            .map(|doc| doc.into_entity(game))
            .collect();
        let scores = self
            .list_documents::<CouchScoreDocument>(&score_prefix(game))
            .await?
            .into_iter()
            .map(ScoreEntity::from)
            .collect();
        Ok(SnapshotEntity { players, scores })
    }

    pub(super) async fn update_seq(&self) -> CouchResult<Value> {
        let url = self.database_url.clone();
        let response = self
            .send(self.authorize(self.client.get(url.clone())), url.as_str())
            .await?;
        let info: DatabaseInfo = Self::decode(response, url.as_str()).await?;
        Ok(info.update_seq)
    }

    pub(super) async fn poll_changes(&self, since: &Value) -> CouchResult<ChangesResponse> {
        let query = [
            ("feed", "longpoll".to_string()),
            ("since", seq_param(since)),
            ("timeout", self.longpoll.as_millis().to_string()),
        ];
        let response = self
            .send(self.request(Method::GET, CHANGES).query(&query), CHANGES)
            .await?;
        Self::decode(response, CHANGES).await
    }

    async fn delete_document(&self, doc_id: &str) -> CouchResult<bool> {
        let Some(rev) = self.current_rev(doc_id).await? else {
            return Ok(false);
        };
        let response = self
            .send(
                self.request(Method::DELETE, doc_id).query(&[("rev", rev)]),
                doc_id,
            )
            .await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status,
            }),
        }
    }

    async fn delete_prefix(&self, prefix: &str) -> CouchResult<usize> {
        let tombstones: Vec<Tombstone> = self
            .list_documents::<CouchScoreDocument>(prefix)
            .await?
            .into_iter()
            .filter_map(|doc| {
                doc.rev.map(|rev| Tombstone {
                    id: doc.id,
                    rev,
                    deleted: true,
                })
            })
            .collect();
        let total = tombstones.len();
        if total == 0 {
            return Ok(0);
        }

        let response = self
            .send(
                self.request(Method::POST, BULK_DOCS)
                    .json(&BulkDocs { docs: tombstones }),
                BULK_DOCS,
            )
            .await?;
        let results: Vec<BulkResult> = Self::decode(response, BULK_DOCS).await?;
        let failed = results.iter().filter(|result| result.error.is_some()).count();
        if failed > 0 {
            return Err(CouchDaoError::BulkRejected { failed, total });
        }
        Ok(total)
    }
}

/// Resolve the database URL below `base_url`, encoding the name as one path segment.
fn database_url(base_url: &str, database: &str) -> CouchResult<Url> {
    let invalid = |reason: String| CouchDaoError::InvalidBaseUrl {
        url: base_url.to_string(),
        reason,
    };
    let mut url = Url::parse(base_url).map_err(|err| invalid(err.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    url.path_segments_mut()
        .map_err(|()| invalid("URL cannot carry a path".into()))?
        .pop_if_empty()
        .push(database);
    Ok(url)
}

/// URL of `segment` inside the database. Document ids are percent-encoded so
/// `/`, `?` or `#` in a player id stay part of the id.
fn document_url(database_url: &Url, segment: &str) -> Url {
    let mut url = database_url.clone();
    // http(s) URLs always accept path segments; checked in `database_url`.
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.push(segment);
    }
    url
}

impl ScoreStore for CouchScoreStore {
    fn fetch_snapshot(&self, game: &GameId) -> BoxFuture<'static, StorageResult<SnapshotEntity>> {
        let store = self.clone();
        let game = game.clone();
        Box::pin(async move { store.snapshot(&game).await.map_err(Into::into) })
    }

    fn find_player(
        &self,
        game: &GameId,
        player_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        let game = game.clone();
        let doc_id = player_doc_id(&game, player_id);
        Box::pin(async move {
            let maybe_doc = store.get_document::<CouchPlayerDocument>(&doc_id).await?;
            Ok(maybe_doc.map(|doc| doc.into_entity(&game)))
        })
    }

    fn save_player(
        &self,
        game: &GameId,
        player: PlayerEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let mut doc = CouchPlayerDocument::from_entity(game, player);
        Box::pin(async move {
            doc.rev = store.current_rev(&doc.id).await?;
            store.put_document(&doc.id, &doc).await.map_err(Into::into)
        })
    }

    fn delete_player(&self, game: &GameId, player_id: &str) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        let doc_id = player_doc_id(game, player_id);
        Box::pin(async move { store.delete_document(&doc_id).await.map_err(Into::into) })
    }

    fn upsert_score(
        &self,
        game: &GameId,
        score: ScoreEntity,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let mut doc = CouchScoreDocument::from_entity(game, score);
        Box::pin(async move {
            doc.rev = store.current_rev(&doc.id).await?;
            store.put_document(&doc.id, &doc).await.map_err(Into::into)
        })
    }

    fn reset_scores(&self, game: &GameId, player_id: &str) -> BoxFuture<'static, StorageResult<usize>> {
        let store = self.clone();
        let prefix = player_scores_prefix(game, player_id);
        Box::pin(async move { store.delete_prefix(&prefix).await.map_err(Into::into) })
    }

    fn subscribe(&self, game: &GameId, listener: FeedListener) -> Subscription {
        let task = tokio::spawn(run_feed(self.clone(), game.clone(), listener));
        Subscription::new(task)
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = store.database_url.clone();
            let response = store
                .send(store.authorize(store.client.get(url.clone())), url.as_str())
                .await?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(CouchDaoError::RequestStatus {
                    path: url.to_string(),
                    status: response.status(),
                }
                .into())
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_url_accepts_trailing_slash_and_nested_roots() {
        let plain = database_url("http://localhost:5984", "pubgolf").unwrap();
        assert_eq!(plain.as_str(), "http://localhost:5984/pubgolf");
        let nested = database_url("https://db.example.com/couch/", "pubgolf").unwrap();
        assert_eq!(nested.as_str(), "https://db.example.com/couch/pubgolf");
    }

    #[test]
    fn database_url_rejects_unusable_bases() {
        assert!(matches!(
            database_url("localhost:5984", "pubgolf"),
            Err(CouchDaoError::InvalidBaseUrl { .. })
        ));
        assert!(matches!(
            database_url("not a url", "pubgolf"),
            Err(CouchDaoError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn document_ids_are_encoded_as_one_segment() {
        let base = database_url("http://localhost:5984/", "pubgolf").unwrap();
        let game = GameId::new("spring");
        let url = document_url(&base, &player_doc_id(&game, "ann/b?x#1 y"));
        assert_eq!(
            url.as_str(),
            "http://localhost:5984/pubgolf/player::spring:ann%2Fb%3Fx%231%20y"
        );
        assert_eq!(url.path_segments().map(Iterator::count), Some(2));
        assert_eq!(
            document_url(&base, ALL_DOCS).as_str(),
            "http://localhost:5984/pubgolf/_all_docs"
        );
    }
}
