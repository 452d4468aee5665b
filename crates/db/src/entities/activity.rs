//! Activity entity - the event aggregate root.

use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// JSON-backed ordered list of strings.
///
/// Used for `what_to_bring`, `whats_provided` and participant
/// availability. Order is preserved for display; equality for edit
/// diffing is order-independent (see the lifecycle helpers).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct StringList(pub Vec<String>);

impl StringList {
    /// Create an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Whether the list has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for StringList {
    fn from(items: Vec<String>) -> Self {
        Self(items)
    }
}

/// Activity entity - an event with a participant roster and lifecycle flags.
///
/// The three boolean flags encode four conceptual lifecycle states:
/// Active (none set), Finalized (`is_finalized`), Cancelled
/// (`is_cancelled`, terminal unless deleted) and Completed
/// (`is_finalized` + `is_completed`).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Event title.
    pub event_title: String,

    /// Free-text description.
    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Free-text agenda.
    #[sea_orm(column_type = "Text")]
    pub agenda: String,

    /// Contact information for the organizer.
    pub contact_info: String,

    /// Cost note, defaults to "TBD".
    pub cost: String,

    /// Where the event takes place.
    pub location: String,

    /// Items participants should bring.
    #[sea_orm(column_type = "JsonBinary")]
    pub what_to_bring: StringList,

    /// Items provided by the organizer.
    #[sea_orm(column_type = "JsonBinary")]
    pub whats_provided: StringList,

    /// The scheduled moment of the event.
    pub event_date: DateTimeWithTimeZone,

    /// Optional end of the voting period; must not be after `event_date`.
    #[sea_orm(nullable)]
    pub voting_date: Option<DateTimeWithTimeZone>,

    /// Schedule/location are locked once set.
    #[sea_orm(default_value = false)]
    pub is_finalized: bool,

    /// Terminal unless the row is deleted.
    #[sea_orm(default_value = false)]
    pub is_cancelled: bool,

    /// Finalized and the event date has passed.
    #[sea_orm(default_value = false)]
    pub is_completed: bool,

    /// Set exactly when `is_cancelled` becomes true.
    #[sea_orm(nullable)]
    pub cancelled_at: Option<DateTimeWithTimeZone>,

    /// User who created the activity; immutable.
    #[sea_orm(indexed)]
    pub created_by: String,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Creator,

    #[sea_orm(has_many = "super::activity_participant::Entity")]
    Participants,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::activity_participant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
