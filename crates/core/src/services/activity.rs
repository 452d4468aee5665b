//! Activity service: creation, edit rules, participation and deletion.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use gather_common::{AppError, AppResult, IdGenerator};
use gather_db::{
    entities::{
        activity, activity::StringList, activity_participant,
        activity_participant::ParticipantStatus, user,
    },
    repositories::{ActivityRepository, UserRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Deserializer};
use validator::Validate;

use super::lifecycle::{self, LifecycleState};

/// Maximum page size for activity listings.
const MAX_LIST_LIMIT: u64 = 100;

/// Activity service for business logic.
#[derive(Clone)]
pub struct ActivityService {
    activity_repo: ActivityRepository,
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

/// An activity together with its derived state, resolved creator and
/// roster. The read model handed to the API layer.
#[derive(Debug, Clone)]
pub struct ActivityDetail {
    pub activity: activity::Model,
    pub state: LifecycleState,
    pub creator: Option<user::Model>,
    pub participants: Vec<ParticipantEntry>,
}

/// A roster entry with its resolved user.
#[derive(Debug, Clone)]
pub struct ParticipantEntry {
    pub participant: activity_participant::Model,
    pub user: Option<user::Model>,
}

/// Input for creating an activity.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivityInput {
    #[validate(length(min = 1, max = 256))]
    pub event_title: String,

    #[serde(default)]
    #[validate(length(max = 8192))]
    pub description: Option<String>,

    #[serde(default)]
    #[validate(length(max = 8192))]
    pub agenda: Option<String>,

    #[serde(default)]
    #[validate(length(max = 512))]
    pub contact_info: Option<String>,

    #[serde(default)]
    #[validate(length(max = 128))]
    pub cost: Option<String>,

    #[validate(length(min = 1, max = 512))]
    pub location: String,

    #[serde(default)]
    pub what_to_bring: Option<Vec<String>>,

    #[serde(default)]
    pub whats_provided: Option<Vec<String>>,

    pub event_date: DateTime<Utc>,

    #[serde(default)]
    pub voting_date: Option<DateTime<Utc>>,

    /// Skip the voting phase and lock the schedule immediately.
    #[serde(default)]
    pub finalize: bool,
}

/// Input for partially editing an activity. `None` fields are left
/// untouched; `voting_date` distinguishes "absent" from "set to null".
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateActivityInput {
    #[validate(length(min = 1, max = 256))]
    pub event_title: Option<String>,

    #[validate(length(max = 8192))]
    pub description: Option<String>,

    #[validate(length(max = 8192))]
    pub agenda: Option<String>,

    #[validate(length(max = 512))]
    pub contact_info: Option<String>,

    #[validate(length(max = 128))]
    pub cost: Option<String>,

    #[validate(length(min = 1, max = 512))]
    pub location: Option<String>,

    pub what_to_bring: Option<Vec<String>>,

    pub whats_provided: Option<Vec<String>>,

    pub event_date: Option<DateTime<Utc>>,

    /// `None` leaves the voting date unchanged, `Some(None)` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub voting_date: Option<Option<DateTime<Utc>>>,
}

/// Makes an explicit JSON `null` deserialize to `Some(None)` so it can
/// be told apart from an absent field.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

impl UpdateActivityInput {
    /// Whether the edit touches anything besides the description.
    fn touches_more_than_description(&self) -> bool {
        self.event_title.is_some()
            || self.agenda.is_some()
            || self.contact_info.is_some()
            || self.cost.is_some()
            || self.location.is_some()
            || self.what_to_bring.is_some()
            || self.whats_provided.is_some()
            || self.event_date.is_some()
            || self.voting_date.is_some()
    }
}

impl ActivityService {
    /// Create a new activity service.
    #[must_use]
    pub const fn new(activity_repo: ActivityRepository, user_repo: UserRepository) -> Self {
        Self {
            activity_repo,
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// List activities, newest first, with lifecycle flags refreshed.
    pub async fn list(&self, limit: Option<u64>, offset: Option<u64>) -> AppResult<Vec<ActivityDetail>> {
        let now = Utc::now();
        let limit = limit.unwrap_or(50).clamp(1, MAX_LIST_LIMIT);
        let activities = self.activity_repo.find_all(limit, offset.unwrap_or(0)).await?;

        let mut details = Vec::with_capacity(activities.len());
        for item in activities {
            let item = self.refresh(item, now).await?;
            details.push(self.detail(item).await?);
        }

        Ok(details)
    }

    /// Get a single activity with lifecycle flags refreshed.
    pub async fn show(&self, id: &str) -> AppResult<ActivityDetail> {
        let now = Utc::now();
        let activity = self.activity_repo.get_by_id(id).await?;
        let activity = self.refresh(activity, now).await?;

        self.detail(activity).await
    }

    /// Create an activity; the creator joins the roster atomically.
    pub async fn create(
        &self,
        creator_id: &str,
        input: CreateActivityInput,
    ) -> AppResult<ActivityDetail> {
        input.validate()?;

        if let Some(voting) = input.voting_date {
            if voting > input.event_date {
                return Err(AppError::BadRequest(
                    "Voting date cannot be after the event date".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let mut model = activity::Model {
            id: self.id_gen.generate(),
            event_title: input.event_title.trim().to_string(),
            description: input.description.unwrap_or_default(),
            agenda: input.agenda.unwrap_or_default(),
            contact_info: input.contact_info.unwrap_or_default(),
            cost: input.cost.unwrap_or_else(|| "TBD".to_string()),
            location: input.location.trim().to_string(),
            what_to_bring: input.what_to_bring.unwrap_or_default().into(),
            whats_provided: input.whats_provided.unwrap_or_default().into(),
            event_date: input.event_date.into(),
            voting_date: input.voting_date.map(Into::into),
            is_finalized: input.finalize,
            is_cancelled: false,
            is_completed: false,
            cancelled_at: None,
            created_by: creator_id.to_string(),
            created_at: now.into(),
            updated_at: None,
        };

        // Dates already in the past settle the lifecycle before insert.
        lifecycle::recompute(&mut model, now);

        let created = self
            .activity_repo
            .create(activity::ActiveModel {
                id: Set(model.id.clone()),
                event_title: Set(model.event_title.clone()),
                description: Set(model.description.clone()),
                agenda: Set(model.agenda.clone()),
                contact_info: Set(model.contact_info.clone()),
                cost: Set(model.cost.clone()),
                location: Set(model.location.clone()),
                what_to_bring: Set(model.what_to_bring.clone()),
                whats_provided: Set(model.whats_provided.clone()),
                event_date: Set(model.event_date),
                voting_date: Set(model.voting_date),
                is_finalized: Set(model.is_finalized),
                is_cancelled: Set(model.is_cancelled),
                is_completed: Set(model.is_completed),
                cancelled_at: Set(model.cancelled_at),
                created_by: Set(model.created_by.clone()),
                created_at: Set(model.created_at),
                updated_at: Set(None),
            })
            .await?;

        let creator_status = if created.is_cancelled {
            ParticipantStatus::NotParticipating
        } else {
            ParticipantStatus::Interested
        };

        self.activity_repo
            .add_participant(activity_participant::ActiveModel {
                id: Set(self.id_gen.generate()),
                activity_id: Set(created.id.clone()),
                user_id: Set(creator_id.to_string()),
                status: Set(creator_status),
                available_times: Set(StringList::new()),
                joined_at: Set(now.into()),
                updated_at: Set(None),
            })
            .await?;

        tracing::info!(activity_id = %created.id, creator = %creator_id, "activity created");

        self.detail(created).await
    }

    /// Partially edit an activity. Creator only; cancelled activities
    /// accept description changes only; finalized activities lock the
    /// event date, location and voting date.
    pub async fn update(
        &self,
        id: &str,
        caller_id: &str,
        input: UpdateActivityInput,
    ) -> AppResult<ActivityDetail> {
        input.validate()?;

        let now = Utc::now();
        let activity = self.activity_repo.get_by_id(id).await?;
        let activity = self.refresh(activity, now).await?;

        if activity.created_by != caller_id {
            return Err(AppError::Forbidden(
                "Only the creator can edit this activity".to_string(),
            ));
        }

        if activity.is_completed {
            return Err(AppError::InvalidState(
                "A completed activity can no longer be edited".to_string(),
            ));
        }

        if activity.is_cancelled && input.touches_more_than_description() {
            return Err(AppError::InvalidState(
                "This activity has been cancelled. Only the description may be edited."
                    .to_string(),
            ));
        }

        if activity.is_finalized {
            // Locked fields may still be sent, but only with their
            // current values.
            if let Some(date) = &input.event_date {
                if lifecycle::date_differs(Some(&activity.event_date), Some(date)) {
                    return Err(AppError::InvalidState(
                        "The event date cannot be changed after the activity is finalized"
                            .to_string(),
                    ));
                }
            }
            if let Some(location) = &input.location {
                if lifecycle::text_differs(&activity.location, location) {
                    return Err(AppError::InvalidState(
                        "The location cannot be changed after the activity is finalized"
                            .to_string(),
                    ));
                }
            }
            if let Some(voting) = &input.voting_date {
                if lifecycle::date_differs(activity.voting_date.as_ref(), voting.as_ref()) {
                    return Err(AppError::InvalidState(
                        "The voting date cannot be changed after the activity is finalized"
                            .to_string(),
                    ));
                }
            }
        }

        if let Some(date) = input.event_date {
            if lifecycle::date_differs(Some(&activity.event_date), Some(&date)) && date < now {
                return Err(AppError::BadRequest(
                    "Event date cannot be in the past".to_string(),
                ));
            }
        }
        if let Some(Some(date)) = input.voting_date {
            if lifecycle::date_differs(activity.voting_date.as_ref(), Some(&date)) && date < now {
                return Err(AppError::BadRequest(
                    "Voting date cannot be in the past".to_string(),
                ));
            }
        }

        let next_event = input
            .event_date
            .unwrap_or_else(|| activity.event_date.with_timezone(&Utc));
        let next_voting = match input.voting_date {
            Some(voting) => voting,
            None => activity.voting_date.map(|d| d.with_timezone(&Utc)),
        };
        if let Some(voting) = next_voting {
            if voting > next_event {
                return Err(AppError::BadRequest(
                    "Voting date cannot be after the event date".to_string(),
                ));
            }
        }

        let mut changed = false;
        let mut patch = activity::ActiveModel {
            id: Set(activity.id.clone()),
            ..Default::default()
        };

        if let Some(value) = &input.event_title {
            if lifecycle::text_differs(&activity.event_title, value) {
                patch.event_title = Set(value.trim().to_string());
                changed = true;
            }
        }
        if let Some(value) = &input.description {
            if lifecycle::text_differs(&activity.description, value) {
                patch.description = Set(value.trim().to_string());
                changed = true;
            }
        }
        if let Some(value) = &input.agenda {
            if lifecycle::text_differs(&activity.agenda, value) {
                patch.agenda = Set(value.trim().to_string());
                changed = true;
            }
        }
        if let Some(value) = &input.contact_info {
            if lifecycle::text_differs(&activity.contact_info, value) {
                patch.contact_info = Set(value.trim().to_string());
                changed = true;
            }
        }
        if let Some(value) = &input.cost {
            if lifecycle::text_differs(&activity.cost, value) {
                patch.cost = Set(value.trim().to_string());
                changed = true;
            }
        }
        if let Some(value) = &input.location {
            if lifecycle::text_differs(&activity.location, value) {
                patch.location = Set(value.trim().to_string());
                changed = true;
            }
        }
        if let Some(value) = &input.what_to_bring {
            if lifecycle::list_differs(&activity.what_to_bring.0, value) {
                patch.what_to_bring = Set(StringList::from(value.clone()));
                changed = true;
            }
        }
        if let Some(value) = &input.whats_provided {
            if lifecycle::list_differs(&activity.whats_provided.0, value) {
                patch.whats_provided = Set(StringList::from(value.clone()));
                changed = true;
            }
        }
        if let Some(value) = input.event_date {
            if lifecycle::date_differs(Some(&activity.event_date), Some(&value)) {
                patch.event_date = Set(value.into());
                changed = true;
            }
        }
        if let Some(value) = input.voting_date {
            if lifecycle::date_differs(activity.voting_date.as_ref(), value.as_ref()) {
                patch.voting_date = Set(value.map(Into::into));
                changed = true;
            }
        }

        // An edit that changes nothing skips persistence.
        if !changed {
            return self.detail(activity).await;
        }

        patch.updated_at = Set(Some(now.into()));
        let saved = self.activity_repo.update(patch).await?;

        // The new dates may move the lifecycle (e.g. clearing the
        // voting date finalizes immediately).
        let saved = self.refresh(saved, now).await?;
        tracing::info!(activity_id = %saved.id, "activity updated");

        self.detail(saved).await
    }

    /// Delete an activity. Creator only, and only when the creator is
    /// the sole participant or the cancellation grace period elapsed.
    pub async fn delete(&self, id: &str, caller_id: &str) -> AppResult<()> {
        let now = Utc::now();
        let activity = self.activity_repo.get_by_id(id).await?;
        let activity = self.refresh(activity, now).await?;

        if activity.created_by != caller_id {
            return Err(AppError::Forbidden(
                "Only the creator can delete this activity".to_string(),
            ));
        }

        let participants = self.activity_repo.list_participants(id).await?;
        if !lifecycle::deletion_allowed(&activity, &participants, now) {
            return Err(AppError::InvalidState(
                "An activity can be deleted only when it has been cancelled for at least \
                 7 days or the creator is the only participant"
                    .to_string(),
            ));
        }

        self.activity_repo.delete(id).await?;
        tracing::info!(activity_id = %id, "activity deleted");

        Ok(())
    }

    /// Join an activity, or reactivate a `not_participating` entry.
    pub async fn join(&self, id: &str, user_id: &str) -> AppResult<ActivityDetail> {
        let now = Utc::now();
        let activity = self.activity_repo.get_by_id(id).await?;
        let activity = self.refresh(activity, now).await?;

        if activity.is_cancelled {
            return Err(AppError::InvalidState(
                "Cannot join a cancelled activity".to_string(),
            ));
        }

        match self.activity_repo.find_participant(id, user_id).await? {
            Some(entry) if entry.status != ParticipantStatus::NotParticipating => {
                return Err(AppError::Conflict("Already participating".to_string()));
            }
            Some(entry) => {
                self.activity_repo
                    .update_participant(activity_participant::ActiveModel {
                        id: Set(entry.id),
                        status: Set(ParticipantStatus::Interested),
                        available_times: Set(StringList::new()),
                        updated_at: Set(Some(now.into())),
                        ..Default::default()
                    })
                    .await?;
            }
            None => {
                self.activity_repo
                    .add_participant(activity_participant::ActiveModel {
                        id: Set(self.id_gen.generate()),
                        activity_id: Set(id.to_string()),
                        user_id: Set(user_id.to_string()),
                        status: Set(ParticipantStatus::Interested),
                        available_times: Set(StringList::new()),
                        joined_at: Set(now.into()),
                        updated_at: Set(None),
                    })
                    .await?;
            }
        }

        tracing::debug!(activity_id = %id, user_id = %user_id, "participant joined");

        self.detail(activity).await
    }

    /// Leave an activity. The creator's entry is kept but demoted to
    /// `not_participating`; everyone else's entry is removed.
    pub async fn leave(&self, id: &str, user_id: &str) -> AppResult<ActivityDetail> {
        let now = Utc::now();
        let activity = self.activity_repo.get_by_id(id).await?;
        let activity = self.refresh(activity, now).await?;

        if activity.created_by == user_id {
            if let Some(entry) = self.activity_repo.find_participant(id, user_id).await? {
                self.activity_repo
                    .update_participant(activity_participant::ActiveModel {
                        id: Set(entry.id),
                        status: Set(ParticipantStatus::NotParticipating),
                        available_times: Set(StringList::new()),
                        updated_at: Set(Some(now.into())),
                        ..Default::default()
                    })
                    .await?;
            }
        } else {
            self.activity_repo.remove_participant(id, user_id).await?;
        }

        tracing::debug!(activity_id = %id, user_id = %user_id, "participant left");

        self.detail(activity).await
    }

    /// Set the caller's RSVP status.
    pub async fn set_status(
        &self,
        id: &str,
        user_id: &str,
        status: ParticipantStatus,
    ) -> AppResult<ActivityDetail> {
        let now = Utc::now();
        let activity = self.activity_repo.get_by_id(id).await?;
        let activity = self.refresh(activity, now).await?;

        if activity.is_cancelled {
            return Err(AppError::InvalidState(
                "Cannot change status on a cancelled activity".to_string(),
            ));
        }

        let entry = self
            .activity_repo
            .find_participant(id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User is not a participant".to_string()))?;

        if entry.status != status {
            self.activity_repo
                .update_participant(activity_participant::ActiveModel {
                    id: Set(entry.id),
                    status: Set(status),
                    updated_at: Set(Some(now.into())),
                    ..Default::default()
                })
                .await?;
        }

        self.detail(activity).await
    }

    /// Replace the caller's availability list.
    pub async fn set_availability(
        &self,
        id: &str,
        user_id: &str,
        available_times: Vec<String>,
    ) -> AppResult<ActivityDetail> {
        let now = Utc::now();
        let activity = self.activity_repo.get_by_id(id).await?;
        let activity = self.refresh(activity, now).await?;

        if activity.is_cancelled {
            return Err(AppError::InvalidState(
                "Cannot change availability on a cancelled activity".to_string(),
            ));
        }

        let entry = self
            .activity_repo
            .find_participant(id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User is not a participant".to_string()))?;

        if lifecycle::list_differs(&entry.available_times.0, &available_times) {
            self.activity_repo
                .update_participant(activity_participant::ActiveModel {
                    id: Set(entry.id),
                    available_times: Set(StringList::from(available_times)),
                    updated_at: Set(Some(now.into())),
                    ..Default::default()
                })
                .await?;
        }

        self.detail(activity).await
    }

    /// Explicitly finalize an activity. Creator only; a no-op when
    /// already finalized, rejected when cancelled.
    pub async fn finalize(&self, id: &str, caller_id: &str) -> AppResult<ActivityDetail> {
        let now = Utc::now();
        let activity = self.activity_repo.get_by_id(id).await?;
        let activity = self.refresh(activity, now).await?;

        if activity.created_by != caller_id {
            return Err(AppError::Forbidden(
                "Only the creator can finalize this activity".to_string(),
            ));
        }

        if activity.is_cancelled {
            return Err(AppError::InvalidState(
                "Cannot finalize a cancelled activity".to_string(),
            ));
        }

        if activity.is_finalized {
            return self.detail(activity).await;
        }

        let saved = self
            .activity_repo
            .update(activity::ActiveModel {
                id: Set(activity.id.clone()),
                is_finalized: Set(true),
                updated_at: Set(Some(now.into())),
                ..Default::default()
            })
            .await?;

        // Finalizing past the event date completes it immediately.
        let saved = self.refresh(saved, now).await?;
        tracing::info!(activity_id = %id, "activity finalized");

        self.detail(saved).await
    }

    /// Explicitly cancel an activity. Creator only; resets the roster.
    pub async fn cancel(&self, id: &str, caller_id: &str) -> AppResult<ActivityDetail> {
        let now = Utc::now();
        let activity = self.activity_repo.get_by_id(id).await?;
        let activity = self.refresh(activity, now).await?;

        if activity.created_by != caller_id {
            return Err(AppError::Forbidden(
                "Only the creator can cancel this activity".to_string(),
            ));
        }

        if activity.is_cancelled {
            return Err(AppError::Conflict(
                "Activity is already cancelled".to_string(),
            ));
        }

        let saved = self
            .activity_repo
            .update(activity::ActiveModel {
                id: Set(activity.id.clone()),
                is_cancelled: Set(true),
                is_finalized: Set(false),
                is_completed: Set(false),
                cancelled_at: Set(Some(now.into())),
                updated_at: Set(Some(now.into())),
                ..Default::default()
            })
            .await?;

        self.activity_repo.reset_participants(id).await?;
        tracing::info!(activity_id = %id, "activity cancelled");

        self.detail(saved).await
    }

    /// Run the lifecycle engine on a loaded model and persist any flag
    /// change. Reads stay fresh without a background scheduler.
    async fn refresh(
        &self,
        mut activity: activity::Model,
        now: DateTime<Utc>,
    ) -> AppResult<activity::Model> {
        let outcome = lifecycle::recompute(&mut activity, now);
        if !outcome.changed {
            return Ok(activity);
        }

        let saved = self
            .activity_repo
            .update(activity::ActiveModel {
                id: Set(activity.id.clone()),
                is_finalized: Set(activity.is_finalized),
                is_cancelled: Set(activity.is_cancelled),
                is_completed: Set(activity.is_completed),
                cancelled_at: Set(activity.cancelled_at),
                ..Default::default()
            })
            .await?;

        if outcome.participants_reset {
            self.activity_repo.reset_participants(&activity.id).await?;
        }

        tracing::debug!(activity_id = %activity.id, "lifecycle flags recomputed");

        Ok(saved)
    }

    /// Assemble the read model: roster in join order plus resolved
    /// creator and participant identities.
    async fn detail(&self, activity: activity::Model) -> AppResult<ActivityDetail> {
        let participants = self.activity_repo.list_participants(&activity.id).await?;

        let mut user_ids: Vec<String> = participants.iter().map(|p| p.user_id.clone()).collect();
        if !user_ids.contains(&activity.created_by) {
            user_ids.push(activity.created_by.clone());
        }

        let users: HashMap<String, user::Model> = self
            .user_repo
            .find_by_ids(&user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect();

        let creator = users.get(&activity.created_by).cloned();
        let participants = participants
            .into_iter()
            .map(|p| {
                let user = users.get(&p.user_id).cloned();
                ParticipantEntry {
                    participant: p,
                    user,
                }
            })
            .collect();

        Ok(ActivityDetail {
            state: lifecycle::state_of(&activity),
            activity,
            creator,
            participants,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn future(days: i64) -> DateTime<Utc> {
        Utc::now() + chrono::Duration::days(days)
    }

    fn test_activity(id: &str, created_by: &str) -> activity::Model {
        activity::Model {
            id: id.to_string(),
            event_title: "Picnic".to_string(),
            description: String::new(),
            agenda: String::new(),
            contact_info: String::new(),
            cost: "TBD".to_string(),
            location: "Riverside park".to_string(),
            what_to_bring: StringList::new(),
            whats_provided: StringList::new(),
            event_date: future(30).into(),
            voting_date: Some(future(20).into()),
            is_finalized: false,
            is_cancelled: false,
            is_completed: false,
            cancelled_at: None,
            created_by: created_by.to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap().into(),
            updated_at: None,
        }
    }

    fn service_with(db: sea_orm::DatabaseConnection) -> ActivityService {
        let db = Arc::new(db);
        ActivityService::new(
            ActivityRepository::new(Arc::clone(&db)),
            UserRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_show_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<activity::Model>::new()])
            .into_connection();

        let result = service_with(db).show("missing").await;

        assert!(matches!(result, Err(AppError::ActivityNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_requires_creator() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_activity("a1", "u1")]])
            .into_connection();

        let result = service_with(db)
            .update("a1", "u2", UpdateActivityInput::default())
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_cancelled_allows_description_only() {
        let mut cancelled = test_activity("a1", "u1");
        cancelled.is_cancelled = true;
        cancelled.cancelled_at = Some(Utc::now().into());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[cancelled]])
            .into_connection();

        let input = UpdateActivityInput {
            event_title: Some("New title".to_string()),
            ..Default::default()
        };
        let result = service_with(db).update("a1", "u1", input).await;

        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_update_rejected_when_completed() {
        let mut completed = test_activity("a1", "u1");
        completed.is_finalized = true;
        completed.is_completed = true;
        completed.event_date = future(-1).into();
        completed.voting_date = Some(future(-2).into());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[completed]])
            .into_connection();

        // Even a description-only edit is locked out once completed.
        let input = UpdateActivityInput {
            description: Some("changed".to_string()),
            ..Default::default()
        };
        let result = service_with(db).update("a1", "u1", input).await;

        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_update_rejects_locked_field_change_when_finalized() {
        let mut finalized = test_activity("a1", "u1");
        finalized.is_finalized = true;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[finalized]])
            .into_connection();

        let input = UpdateActivityInput {
            event_date: Some(future(60)),
            ..Default::default()
        };
        let result = service_with(db).update("a1", "u1", input).await;

        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_update_accepts_unchanged_locked_field_when_finalized() {
        let mut finalized = test_activity("a1", "u1");
        finalized.is_finalized = true;
        let same_date = finalized.event_date.with_timezone(&Utc);

        // No actual change, so no save: only roster and user lookups
        // follow the initial load.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[finalized]])
            .append_query_results([Vec::<activity_participant::Model>::new()])
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        let input = UpdateActivityInput {
            event_date: Some(same_date),
            ..Default::default()
        };
        let result = service_with(db).update("a1", "u1", input).await.unwrap();

        assert!(result.activity.is_finalized);
        assert_eq!(result.state, LifecycleState::Finalized);
    }

    #[tokio::test]
    async fn test_join_cancelled_rejected() {
        let mut cancelled = test_activity("a1", "u1");
        cancelled.is_cancelled = true;
        cancelled.cancelled_at = Some(Utc::now().into());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[cancelled]])
            .into_connection();

        let result = service_with(db).join("a1", "u2").await;

        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_join_when_already_participating() {
        let entry = activity_participant::Model {
            id: "p1".to_string(),
            activity_id: "a1".to_string(),
            user_id: "u2".to_string(),
            status: ParticipantStatus::Confirmed,
            available_times: StringList::new(),
            joined_at: Utc::now().into(),
            updated_at: None,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_activity("a1", "u1")]])
            .append_query_results([[entry]])
            .into_connection();

        let result = service_with(db).join("a1", "u2").await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_set_status_requires_participation() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_activity("a1", "u1")]])
            .append_query_results([Vec::<activity_participant::Model>::new()])
            .into_connection();

        let result = service_with(db)
            .set_status("a1", "u2", ParticipantStatus::Confirmed)
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_cancel_already_cancelled() {
        let mut cancelled = test_activity("a1", "u1");
        cancelled.is_cancelled = true;
        cancelled.cancelled_at = Some(Utc::now().into());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[cancelled]])
            .into_connection();

        let result = service_with(db).cancel("a1", "u1").await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_finalize_requires_creator() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_activity("a1", "u1")]])
            .into_connection();

        let result = service_with(db).finalize("a1", "u2").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_voting_after_event() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let input = CreateActivityInput {
            event_title: "Picnic".to_string(),
            description: None,
            agenda: None,
            contact_info: None,
            cost: None,
            location: "Riverside park".to_string(),
            what_to_bring: None,
            whats_provided: None,
            event_date: future(10),
            voting_date: Some(future(20)),
            finalize: false,
        };
        let result = service_with(db).create("u1", input).await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
