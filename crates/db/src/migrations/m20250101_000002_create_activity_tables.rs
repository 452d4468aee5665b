//! Create activity and `activity_participant` tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create activity table
        manager
            .create_table(
                Table::create()
                    .table(Activity::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Activity::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Activity::EventTitle)
                            .string_len(256)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Activity::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Activity::Agenda)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Activity::ContactInfo)
                            .string_len(512)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Activity::Cost)
                            .string_len(128)
                            .not_null()
                            .default("TBD"),
                    )
                    .col(
                        ColumnDef::new(Activity::Location)
                            .string_len(512)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Activity::WhatToBring)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Activity::WhatsProvided)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Activity::EventDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Activity::VotingDate).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Activity::IsFinalized)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Activity::IsCancelled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Activity::IsCompleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Activity::CancelledAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Activity::CreatedBy)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Activity::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Activity::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_creator")
                            .from(Activity::Table, Activity::CreatedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create indexes for activity table
        manager
            .create_index(
                Index::create()
                    .name("idx_activity_created_by")
                    .table(Activity::Table)
                    .col(Activity::CreatedBy)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_activity_event_date")
                    .table(Activity::Table)
                    .col(Activity::EventDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_activity_created_at")
                    .table(Activity::Table)
                    .col(Activity::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Create activity_participant table
        manager
            .create_table(
                Table::create()
                    .table(ActivityParticipant::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ActivityParticipant::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ActivityParticipant::ActivityId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActivityParticipant::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActivityParticipant::Status)
                            .string_len(20)
                            .not_null()
                            .default("interested"),
                    )
                    .col(
                        ColumnDef::new(ActivityParticipant::AvailableTimes)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ActivityParticipant::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(ActivityParticipant::UpdatedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_participant_activity")
                            .from(ActivityParticipant::Table, ActivityParticipant::ActivityId)
                            .to(Activity::Table, Activity::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_activity_participant_user")
                            .from(ActivityParticipant::Table, ActivityParticipant::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create indexes for activity_participant table
        manager
            .create_index(
                Index::create()
                    .name("idx_activity_participant_activity_id")
                    .table(ActivityParticipant::Table)
                    .col(ActivityParticipant::ActivityId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_activity_participant_user_id")
                    .table(ActivityParticipant::Table)
                    .col(ActivityParticipant::UserId)
                    .to_owned(),
            )
            .await?;

        // Unique constraint on (activity_id, user_id)
        manager
            .create_index(
                Index::create()
                    .name("idx_activity_participant_unique")
                    .table(ActivityParticipant::Table)
                    .col(ActivityParticipant::ActivityId)
                    .col(ActivityParticipant::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ActivityParticipant::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Activity::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Activity {
    Table,
    Id,
    EventTitle,
    Description,
    Agenda,
    ContactInfo,
    Cost,
    Location,
    WhatToBring,
    WhatsProvided,
    EventDate,
    VotingDate,
    IsFinalized,
    IsCancelled,
    IsCompleted,
    CancelledAt,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ActivityParticipant {
    Table,
    Id,
    ActivityId,
    UserId,
    Status,
    AvailableTimes,
    JoinedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
