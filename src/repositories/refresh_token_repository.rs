use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use log::info;
use mongodb::{
    bson::{self, doc, Document},
    options::IndexOptions,
    Collection, IndexModel,
};

use crate::{
    db::Database,
    errors::{AppError, AppResult},
    models::domain::{RefreshToken, TokenStatus},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn create(&self, token: RefreshToken) -> AppResult<RefreshToken>;
    async fn find_by_id(&self, id: &str) -> AppResult<Option<RefreshToken>>;
    /// Compare-and-set `active -> to`. Returns false when the record was
    /// missing or already inactive.
    async fn deactivate(&self, id: &str, to: TokenStatus, replaced_by: Option<String>) -> AppResult<bool>;
    async fn revoke_all_for_user(&self, user_id: &str) -> AppResult<u64>;
    /// Physically removes a user's records, returning the removed ids.
    async fn delete_all_for_user(&self, user_id: &str) -> AppResult<Vec<String>>;
    async fn ensure_indexes(&self) -> AppResult<()>;
}

pub struct MongoRefreshTokenRepository {
    collection: Collection<RefreshToken>,
}

impl MongoRefreshTokenRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        let collection = db.get_collection(collection_name);
        Self { collection }
    }
}

/// Matches exactly the given records, so a record inserted after they were
/// read is left alone.
fn ids_filter(ids: &[String]) -> Document {
    doc! { "_id": { "$in": ids } }
}

#[async_trait]
impl RefreshTokenRepository for MongoRefreshTokenRepository {
    async fn create(&self, token: RefreshToken) -> AppResult<RefreshToken> {
        if token.status != TokenStatus::Active {
            return Err(AppError::InternalError(format!(
                "Refusing to persist refresh token in state '{}'",
                token.status
            )));
        }
        self.collection.insert_one(&token).await?;
        Ok(token)
    }

    async fn find_by_id(&self, id: &str) -> AppResult<Option<RefreshToken>> {
        let token = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(token)
    }

    async fn deactivate(&self, id: &str, to: TokenStatus, replaced_by: Option<String>) -> AppResult<bool> {
        let mut set = doc! {
            "status": to.as_str(),
            "deactivated_at": bson::to_bson(&Utc::now())?,
        };
        if let Some(successor) = replaced_by {
            set.insert("replaced_by", successor);
        }

        let result = self
            .collection
            .update_one(
                doc! { "_id": id, "status": TokenStatus::Active.as_str() },
                doc! { "$set": set },
            )
            .await?;

        Ok(result.modified_count == 1)
    }

    async fn revoke_all_for_user(&self, user_id: &str) -> AppResult<u64> {
        let result = self
            .collection
            .update_many(
                doc! { "user_id": user_id, "status": TokenStatus::Active.as_str() },
                doc! { "$set": {
                    "status": TokenStatus::Revoked.as_str(),
                    "deactivated_at": bson::to_bson(&Utc::now())?,
                } },
            )
            .await?;

        Ok(result.modified_count)
    }

    async fn delete_all_for_user(&self, user_id: &str) -> AppResult<Vec<String>> {
        let cursor = self.collection.find(doc! { "user_id": user_id }).await?;
        let tokens: Vec<RefreshToken> = cursor.try_collect().await?;
        let ids: Vec<String> = tokens.into_iter().map(|t| t.id).collect();
        if ids.is_empty() {
            return Ok(ids);
        }

        self.collection.delete_many(ids_filter(&ids)).await?;

        Ok(ids)
    }

    async fn ensure_indexes(&self) -> AppResult<()> {
        let token_hash_options = IndexOptions::builder().unique(true).build();
        let token_hash_model = IndexModel::builder()
            .keys(doc! { "token_hash": 1 })
            .options(token_hash_options)
            .build();
        self.collection.create_index(token_hash_model).await?;
        info!("Created unique index on refresh_tokens.token_hash");

        let user_id_model = IndexModel::builder()
            .keys(doc! { "user_id": 1, "status": 1 })
            .build();
        self.collection.create_index(user_id_model).await?;
        info!("Created index on refresh_tokens.user_id");

        let expires_at_model = IndexModel::builder()
            .keys(doc! { "expires_at": 1 })
            .build();
        self.collection.create_index(expires_at_model).await?;
        info!("Created index on refresh_tokens.expires_at");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purge_filter_targets_only_collected_ids() {
        let ids = vec!["a1".to_string(), "b2".to_string()];
        let filter = ids_filter(&ids);

        assert_eq!(filter, doc! { "_id": { "$in": ["a1", "b2"] } });
        assert!(!filter.contains_key("user_id"));
    }
}
