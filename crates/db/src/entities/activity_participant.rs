//! Activity participant entity - a user's membership in an activity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::activity::StringList;

/// RSVP status of a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    /// Default status on joining.
    #[sea_orm(string_value = "interested")]
    Interested,
    /// Committed to attending.
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    /// Not attending, but keeps the entry.
    #[sea_orm(string_value = "declined")]
    Declined,
    /// Disengaged; the state every entry is forced into on cancellation.
    #[sea_orm(string_value = "not_participating")]
    NotParticipating,
}

impl Default for ParticipantStatus {
    fn default() -> Self {
        Self::Interested
    }
}

/// Participant entry, at most one per user per activity.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity_participant")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(indexed)]
    pub activity_id: String,

    #[sea_orm(indexed)]
    pub user_id: String,

    pub status: ParticipantStatus,

    /// Free-text time slots, e.g. `["Mon 2PM", "Fri evening"]`.
    #[sea_orm(column_type = "JsonBinary")]
    pub available_times: StringList,

    pub joined_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::activity::Entity",
        from = "Column::ActivityId",
        to = "super::activity::Column::Id",
        on_delete = "Cascade"
    )]
    Activity,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::activity::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Activity.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
