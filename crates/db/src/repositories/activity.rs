//! Activity repository.

use std::sync::Arc;

use chrono::Utc;
use gather_common::{AppError, AppResult};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

use crate::entities::activity::StringList;
use crate::entities::activity_participant::ParticipantStatus;
use crate::entities::{Activity, ActivityParticipant, activity, activity_participant};

/// Repository for activity aggregate operations.
#[derive(Clone)]
pub struct ActivityRepository {
    db: Arc<DatabaseConnection>,
}

impl ActivityRepository {
    /// Create a new activity repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Get reference to the database connection.
    pub fn db(&self) -> &DatabaseConnection {
        self.db.as_ref()
    }

    // ==================== Activity Operations ====================

    /// Find activity by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<activity::Model>> {
        Activity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get activity by ID, returning error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<activity::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::ActivityNotFound(id.to_string()))
    }

    /// List all activities, newest first.
    pub async fn find_all(&self, limit: u64, offset: u64) -> AppResult<Vec<activity::Model>> {
        Activity::find()
            .order_by(activity::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new activity.
    pub async fn create(&self, model: activity::ActiveModel) -> AppResult<activity::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an activity.
    pub async fn update(&self, model: activity::ActiveModel) -> AppResult<activity::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an activity permanently.
    ///
    /// Participant rows are removed by the `ON DELETE CASCADE` foreign key.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Activity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    // ==================== Participant Operations ====================

    /// List participants of an activity in join order.
    pub async fn list_participants(
        &self,
        activity_id: &str,
    ) -> AppResult<Vec<activity_participant::Model>> {
        ActivityParticipant::find()
            .filter(activity_participant::Column::ActivityId.eq(activity_id))
            .order_by(activity_participant::Column::JoinedAt, Order::Asc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count participants of an activity.
    pub async fn count_participants(&self, activity_id: &str) -> AppResult<u64> {
        ActivityParticipant::find()
            .filter(activity_participant::Column::ActivityId.eq(activity_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user's participant entry, if any.
    pub async fn find_participant(
        &self,
        activity_id: &str,
        user_id: &str,
    ) -> AppResult<Option<activity_participant::Model>> {
        ActivityParticipant::find()
            .filter(activity_participant::Column::ActivityId.eq(activity_id))
            .filter(activity_participant::Column::UserId.eq(user_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Add a participant entry.
    pub async fn add_participant(
        &self,
        model: activity_participant::ActiveModel,
    ) -> AppResult<activity_participant::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a participant entry.
    pub async fn update_participant(
        &self,
        model: activity_participant::ActiveModel,
    ) -> AppResult<activity_participant::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove a participant entry.
    pub async fn remove_participant(&self, activity_id: &str, user_id: &str) -> AppResult<()> {
        ActivityParticipant::delete_many()
            .filter(activity_participant::Column::ActivityId.eq(activity_id))
            .filter(activity_participant::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    /// Force every participant of an activity to `not_participating`
    /// with empty availability. Used by cancellation.
    pub async fn reset_participants(&self, activity_id: &str) -> AppResult<()> {
        ActivityParticipant::update_many()
            .col_expr(
                activity_participant::Column::Status,
                Expr::value(ParticipantStatus::NotParticipating),
            )
            .col_expr(
                activity_participant::Column::AvailableTimes,
                Expr::value(StringList::new()),
            )
            .col_expr(
                activity_participant::Column::UpdatedAt,
                Expr::value(Some(sea_orm::prelude::DateTimeWithTimeZone::from(
                    Utc::now(),
                ))),
            )
            .filter(activity_participant::Column::ActivityId.eq(activity_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_activity(id: &str, created_by: &str, title: &str) -> activity::Model {
        activity::Model {
            id: id.to_string(),
            event_title: title.to_string(),
            description: String::new(),
            agenda: String::new(),
            contact_info: String::new(),
            cost: "TBD".to_string(),
            location: "Community hall".to_string(),
            what_to_bring: StringList::new(),
            whats_provided: StringList::new(),
            event_date: Utc::now().into(),
            voting_date: None,
            is_finalized: false,
            is_cancelled: false,
            is_completed: false,
            cancelled_at: None,
            created_by: created_by.to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let act = create_test_activity("a1", "u1", "Picnic");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[act.clone()]])
                .into_connection(),
        );

        let repo = ActivityRepository::new(db);
        let result = repo.find_by_id("a1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().event_title, "Picnic");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<activity::Model>::new()])
                .into_connection(),
        );

        let repo = ActivityRepository::new(db);
        let result = repo.get_by_id("missing").await;

        match result {
            Err(AppError::ActivityNotFound(id)) => assert_eq!(id, "missing"),
            _ => panic!("Expected ActivityNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_find_all() {
        let a1 = create_test_activity("a1", "u1", "Picnic");
        let a2 = create_test_activity("a2", "u1", "Hike");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[a1, a2]])
                .into_connection(),
        );

        let repo = ActivityRepository::new(db);
        let result = repo.find_all(10, 0).await.unwrap();

        assert_eq!(result.len(), 2);
    }
}
