//! Activity endpoints.

use axum::{Json, Router, extract::State, routing::post};
use gather_common::AppResult;
use gather_core::{
    ActivityDetail, CreateActivityInput, LifecycleState, ParticipantEntry, UpdateActivityInput,
};
use gather_db::entities::{activity_participant::ParticipantStatus, user};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

// ==================== Request/Response Types ====================

/// Resolved user identity embedded in activity responses.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRefResponse {
    pub id: String,
    pub username: String,
    pub name: String,
    pub email: String,
}

impl From<user::Model> for UserRefResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            name: u.name,
            email: u.email,
        }
    }
}

/// Roster entry response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantResponse {
    pub user_id: String,
    pub user: Option<UserRefResponse>,
    pub status: ParticipantStatus,
    pub available_times: Vec<String>,
    pub joined_at: String,
}

impl From<ParticipantEntry> for ParticipantResponse {
    fn from(entry: ParticipantEntry) -> Self {
        Self {
            user_id: entry.participant.user_id,
            user: entry.user.map(Into::into),
            status: entry.participant.status,
            available_times: entry.participant.available_times.0,
            joined_at: entry.participant.joined_at.to_rfc3339(),
        }
    }
}

/// Full activity response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub id: String,
    pub event_title: String,
    pub description: String,
    pub agenda: String,
    pub contact_info: String,
    pub cost: String,
    pub location: String,
    pub what_to_bring: Vec<String>,
    pub whats_provided: Vec<String>,
    pub event_date: String,
    pub voting_date: Option<String>,
    pub is_finalized: bool,
    pub is_cancelled: bool,
    pub is_completed: bool,
    pub cancelled_at: Option<String>,
    pub state: LifecycleState,
    pub created_by_id: String,
    pub created_by: Option<UserRefResponse>,
    pub participants: Vec<ParticipantResponse>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<ActivityDetail> for ActivityResponse {
    fn from(detail: ActivityDetail) -> Self {
        let a = detail.activity;
        Self {
            id: a.id,
            event_title: a.event_title,
            description: a.description,
            agenda: a.agenda,
            contact_info: a.contact_info,
            cost: a.cost,
            location: a.location,
            what_to_bring: a.what_to_bring.0,
            whats_provided: a.whats_provided.0,
            event_date: a.event_date.to_rfc3339(),
            voting_date: a.voting_date.map(|d| d.to_rfc3339()),
            is_finalized: a.is_finalized,
            is_cancelled: a.is_cancelled,
            is_completed: a.is_completed,
            cancelled_at: a.cancelled_at.map(|d| d.to_rfc3339()),
            state: detail.state,
            created_by_id: a.created_by,
            created_by: detail.creator.map(Into::into),
            participants: detail.participants.into_iter().map(Into::into).collect(),
            created_at: a.created_at.to_rfc3339(),
            updated_at: a.updated_at.map(|d| d.to_rfc3339()),
        }
    }
}

/// List activities request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListActivitiesRequest {
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
}

/// Show activity request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowActivityRequest {
    pub activity_id: String,
}

/// Update activity request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateActivityRequest {
    pub activity_id: String,
    #[serde(flatten)]
    pub changes: UpdateActivityInput,
}

/// Delete activity request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteActivityRequest {
    pub activity_id: String,
}

/// Join activity request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinActivityRequest {
    pub activity_id: String,
}

/// Leave activity request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveActivityRequest {
    pub activity_id: String,
}

/// Set RSVP status request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStatusRequest {
    pub activity_id: String,
    pub status: ParticipantStatus,
}

/// Replace availability request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAvailabilityRequest {
    pub activity_id: String,
    #[serde(default)]
    pub available_times: Vec<String>,
}

/// Finalize activity request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeActivityRequest {
    pub activity_id: String,
}

/// Cancel activity request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelActivityRequest {
    pub activity_id: String,
}

/// Delete activity response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedResponse {
    pub ok: bool,
}

// ==================== Handlers ====================

/// List activities, newest first.
async fn list(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ListActivitiesRequest>,
) -> AppResult<ApiResponse<Vec<ActivityResponse>>> {
    let details = state.activity_service.list(req.limit, req.offset).await?;

    Ok(ApiResponse::ok(
        details.into_iter().map(Into::into).collect(),
    ))
}

/// Show a single activity.
async fn show(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ShowActivityRequest>,
) -> AppResult<ApiResponse<ActivityResponse>> {
    let detail = state.activity_service.show(&req.activity_id).await?;

    Ok(ApiResponse::ok(detail.into()))
}

/// Create an activity.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateActivityInput>,
) -> AppResult<ApiResponse<ActivityResponse>> {
    let detail = state.activity_service.create(&user.id, req).await?;

    Ok(ApiResponse::ok(detail.into()))
}

/// Partially edit an activity.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateActivityRequest>,
) -> AppResult<ApiResponse<ActivityResponse>> {
    let detail = state
        .activity_service
        .update(&req.activity_id, &user.id, req.changes)
        .await?;

    Ok(ApiResponse::ok(detail.into()))
}

/// Delete an activity.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<DeleteActivityRequest>,
) -> AppResult<ApiResponse<DeletedResponse>> {
    state
        .activity_service
        .delete(&req.activity_id, &user.id)
        .await?;

    Ok(ApiResponse::ok(DeletedResponse { ok: true }))
}

/// Join an activity or reactivate a dormant entry.
async fn join(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<JoinActivityRequest>,
) -> AppResult<ApiResponse<ActivityResponse>> {
    let detail = state
        .activity_service
        .join(&req.activity_id, &user.id)
        .await?;

    Ok(ApiResponse::ok(detail.into()))
}

/// Leave an activity.
async fn leave(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<LeaveActivityRequest>,
) -> AppResult<ApiResponse<ActivityResponse>> {
    let detail = state
        .activity_service
        .leave(&req.activity_id, &user.id)
        .await?;

    Ok(ApiResponse::ok(detail.into()))
}

/// Set the caller's RSVP status.
async fn status(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SetStatusRequest>,
) -> AppResult<ApiResponse<ActivityResponse>> {
    let detail = state
        .activity_service
        .set_status(&req.activity_id, &user.id, req.status)
        .await?;

    Ok(ApiResponse::ok(detail.into()))
}

/// Replace the caller's availability list.
async fn availability(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<SetAvailabilityRequest>,
) -> AppResult<ApiResponse<ActivityResponse>> {
    let detail = state
        .activity_service
        .set_availability(&req.activity_id, &user.id, req.available_times)
        .await?;

    Ok(ApiResponse::ok(detail.into()))
}

/// Explicitly finalize an activity.
async fn finalize(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<FinalizeActivityRequest>,
) -> AppResult<ApiResponse<ActivityResponse>> {
    let detail = state
        .activity_service
        .finalize(&req.activity_id, &user.id)
        .await?;

    Ok(ApiResponse::ok(detail.into()))
}

/// Explicitly cancel an activity.
async fn cancel(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CancelActivityRequest>,
) -> AppResult<ApiResponse<ActivityResponse>> {
    let detail = state
        .activity_service
        .cancel(&req.activity_id, &user.id)
        .await?;

    Ok(ApiResponse::ok(detail.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/list", post(list))
        .route("/show", post(show))
        .route("/create", post(create))
        .route("/update", post(update))
        .route("/delete", post(delete))
        .route("/join", post(join))
        .route("/leave", post(leave))
        .route("/status", post(status))
        .route("/availability", post(availability))
        .route("/finalize", post(finalize))
        .route("/cancel", post(cancel))
}
