use chrono::{DateTime, Utc};
use game_core::{RatingConfig, StatsRecord};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, SqlErr,
    TransactionTrait,
};
use tracing::info;

use super::stats_repository::new_stats_model;
use crate::entities::{games, prelude::*, stats, users};
use crate::errors::{RepositoryError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: i32,
    pub username: String,
    pub auth_hash: String,
    pub created_at: DateTime<Utc>,
}

pub struct UserRepository {
    db: DatabaseConnection,
}

fn unique_violation(err: DbErr, username: &str) -> RepositoryError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            RepositoryError::UserExists(username.to_string())
        }
        _ => RepositoryError::Db(err),
    }
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_account(model: users::Model) -> UserAccount {
        UserAccount {
            id: model.id,
            username: model.username,
            auth_hash: model.auth,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>> {
        let user_model = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await?;

        Ok(user_model.map(Self::model_to_account))
    }

    pub async fn exists(&self, username: &str) -> Result<bool> {
        Ok(self.find_by_username(username).await?.is_some())
    }

    /// Create the account together with its empty stats row.
    pub async fn create_user(
        &self,
        username: &str,
        auth_hash: &str,
        rating: &RatingConfig,
    ) -> Result<UserAccount> {
        let now = Utc::now();
        let txn = self.db.begin().await?;

        let existing = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(RepositoryError::UserExists(username.to_string()));
        }

        let user_model = users::ActiveModel {
            id: ActiveValue::NotSet,
            username: ActiveValue::Set(username.to_string()),
            auth: ActiveValue::Set(auth_hash.to_string()),
            created_at: ActiveValue::Set(now.into()),
        };
        let inserted = Users::insert(user_model)
            .exec(&txn)
            .await
            .map_err(|err| unique_violation(err, username))?;

        let stats_model = new_stats_model(&StatsRecord::new(username, rating, now))?;
        Stats::insert(stats_model)
            .exec(&txn)
            .await
            .map_err(|err| unique_violation(err, username))?;

        txn.commit().await?;
        info!("Registered user {}", username);

        Ok(UserAccount {
            id: inserted.last_insert_id,
            username: username.to_string(),
            auth_hash: auth_hash.to_string(),
            created_at: now,
        })
    }

    pub async fn change_auth(&self, username: &str, auth_hash: &str) -> Result<()> {
        let result = Users::update_many()
            .col_expr(users::Column::Auth, Expr::value(auth_hash.to_string()))
            .filter(users::Column::Username.eq(username))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::UserNotFound(username.to_string()));
        }
        Ok(())
    }

    /// Rename an account. Games and stats follow the new name.
    pub async fn change_username(&self, username: &str, new_username: &str) -> Result<()> {
        let txn = self.db.begin().await?;

        let taken = Users::find()
            .filter(users::Column::Username.eq(new_username))
            .one(&txn)
            .await?;
        if taken.is_some() {
            return Err(RepositoryError::UserExists(new_username.to_string()));
        }

        let renamed = Users::update_many()
            .col_expr(users::Column::Username, Expr::value(new_username.to_string()))
            .filter(users::Column::Username.eq(username))
            .exec(&txn)
            .await
            .map_err(|err| unique_violation(err, new_username))?;
        if renamed.rows_affected == 0 {
            return Err(RepositoryError::UserNotFound(username.to_string()));
        }

        Games::update_many()
            .col_expr(games::Column::Username, Expr::value(new_username.to_string()))
            .filter(games::Column::Username.eq(username))
            .exec(&txn)
            .await?;
        Stats::update_many()
            .col_expr(stats::Column::Username, Expr::value(new_username.to_string()))
            .filter(stats::Column::Username.eq(username))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        info!("Renamed user {} to {}", username, new_username);
        Ok(())
    }

    /// Remove the account with all of its games and stats.
    pub async fn delete_user(&self, username: &str) -> Result<()> {
        let txn = self.db.begin().await?;

        let removed = Users::delete_many()
            .filter(users::Column::Username.eq(username))
            .exec(&txn)
            .await?;
        if removed.rows_affected == 0 {
            return Err(RepositoryError::UserNotFound(username.to_string()));
        }

        Games::delete_many()
            .filter(games::Column::Username.eq(username))
            .exec(&txn)
            .await?;
        Stats::delete_many()
            .filter(stats::Column::Username.eq(username))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        info!("Deleted user {}", username);
        Ok(())
    }
}
