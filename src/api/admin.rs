use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{validate_rating, validate_record_id, validate_skill};
use super::{ApiError, ApiResponse, AppState, BootcampDto, IdentityDto, MessageResponse};
use crate::domain::{
    ApplicantRole, ApplicantStatus, Assessment, IdentityKind, InstructorRole,
};
use crate::services::{IdentityFilter, NewBootcamp, NewIdentity};

#[derive(Deserialize)]
pub struct CreateStaffRequest {
    /// `admin` (default) or `instructor`.
    #[serde(default)]
    pub role: Option<InstructorRole>,

    #[serde(flatten)]
    pub identity: NewIdentity,
}

#[derive(Deserialize)]
pub struct ChangeRoleRequest {
    pub role: ApplicantRole,
}

#[derive(Deserialize)]
pub struct RateSkillRequest {
    pub skill: String,
    pub rating: f64,
}

#[derive(Deserialize)]
pub struct AssessmentRequest {
    pub name: String,

    #[serde(default)]
    pub date: Option<DateTime<Utc>>,

    pub score: f64,
}

/// POST /admin/create
pub async fn create_staff(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateStaffRequest>,
) -> Result<Json<ApiResponse<IdentityDto>>, ApiError> {
    let service = state.identity_service();

    let identity = match payload.role.unwrap_or(InstructorRole::Admin) {
        InstructorRole::Admin => service.create_admin(payload.identity).await?,
        InstructorRole::Instructor => {
            service
                .register(IdentityKind::Instructor, payload.identity)
                .await?
        }
    };

    Ok(Json(ApiResponse::success(IdentityDto::from(&identity))))
}

async fn list_by(
    state: &AppState,
    filter: IdentityFilter,
) -> Result<Json<ApiResponse<Vec<IdentityDto>>>, ApiError> {
    let identities = state.identity_service().list(filter).await?;
    Ok(Json(ApiResponse::success(
        identities.iter().map(IdentityDto::from).collect(),
    )))
}

/// GET /admin/applicants
pub async fn list_applicants(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<IdentityDto>>>, ApiError> {
    list_by(&state, IdentityFilter::Applicants).await
}

/// GET /admin/trainees
pub async fn list_trainees(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<IdentityDto>>>, ApiError> {
    list_by(&state, IdentityFilter::Trainees).await
}

/// GET /admin/fellows
pub async fn list_fellows(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<IdentityDto>>>, ApiError> {
    list_by(&state, IdentityFilter::Fellows).await
}

/// GET /admin/instructors
pub async fn list_instructors(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<IdentityDto>>>, ApiError> {
    list_by(&state, IdentityFilter::Instructors).await
}

/// GET /admin/admins
pub async fn list_admins(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<IdentityDto>>>, ApiError> {
    list_by(&state, IdentityFilter::Admins).await
}

/// GET /admin/appt/{id}
pub async fn get_applicant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<IdentityDto>>, ApiError> {
    let id = validate_record_id(&id)?;
    let identity = state.identity_service().get(&id).await?;

    if identity.kind() != IdentityKind::Applicant {
        return Err(ApiError::not_found("Applicant", id));
    }

    Ok(Json(ApiResponse::success(IdentityDto::from(&identity))))
}

/// PUT /admin/appt/{id}
/// Update the applicant's selection status
pub async fn update_applicant_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(status): Json<ApplicantStatus>,
) -> Result<Json<ApiResponse<IdentityDto>>, ApiError> {
    let id = validate_record_id(&id)?;
    let identity = state
        .identity_service()
        .change_applicant_status(&id, status)
        .await?;

    Ok(Json(ApiResponse::success(IdentityDto::from(&identity))))
}

/// PUT /admin/appt/{id}/role
pub async fn change_applicant_role(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<ChangeRoleRequest>,
) -> Result<Json<ApiResponse<IdentityDto>>, ApiError> {
    let id = validate_record_id(&id)?;
    let identity = state
        .identity_service()
        .change_applicant_role(&id, payload.role)
        .await?;

    Ok(Json(ApiResponse::success(IdentityDto::from(&identity))))
}

/// POST /admin/trainee/{id}/rate
pub async fn rate_skill(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<RateSkillRequest>,
) -> Result<Json<ApiResponse<IdentityDto>>, ApiError> {
    let id = validate_record_id(&id)?;
    let skill = validate_skill(&payload.skill)?;
    let rating = validate_rating(payload.rating)?;

    let identity = state
        .identity_service()
        .rate_skill(&id, skill, rating)
        .await?;

    Ok(Json(ApiResponse::success(IdentityDto::from(&identity))))
}

/// POST /admin/appt/{id}/assessment
pub async fn add_assessment(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<AssessmentRequest>,
) -> Result<Json<ApiResponse<IdentityDto>>, ApiError> {
    let id = validate_record_id(&id)?;

    let assessment = Assessment {
        name: payload.name,
        date: payload.date.unwrap_or_else(Utc::now),
        applicant_id: None,
        instructor_id: Some(admin.id().clone()),
        score: payload.score,
    };

    let identity = state
        .identity_service()
        .add_assessment(&id, assessment)
        .await?;

    Ok(Json(ApiResponse::success(IdentityDto::from(&identity))))
}

/// DELETE /admin/user/{id}
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = validate_record_id(&id)?;

    if admin.id() == &id {
        return Err(ApiError::validation("You cannot delete your own account"));
    }

    state.identity_service().delete(&id).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "User deleted",
    ))))
}

/// POST /admin/camp
pub async fn create_camp(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Json(payload): Json<NewBootcamp>,
) -> Result<Json<ApiResponse<BootcampDto>>, ApiError> {
    let camp = state
        .bootcamp_service()
        .create(payload, Some(admin.id().clone()))
        .await?;

    Ok(Json(ApiResponse::success(BootcampDto::from(&camp))))
}

/// GET /admin/camp
pub async fn list_camps(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<BootcampDto>>>, ApiError> {
    let camps = state.bootcamp_service().list().await?;
    Ok(Json(ApiResponse::success(
        camps.iter().map(BootcampDto::from).collect(),
    )))
}

/// GET /admin/camp/{id}
pub async fn get_camp(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BootcampDto>>, ApiError> {
    let id = validate_record_id(&id)?;
    let camp = state.bootcamp_service().get(&id).await?;
    Ok(Json(ApiResponse::success(BootcampDto::from(&camp))))
}

/// POST /admin/camp/{id}/applicants
pub async fn enroll_applicant(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<NewIdentity>,
) -> Result<Json<ApiResponse<IdentityDto>>, ApiError> {
    let id = validate_record_id(&id)?;
    let applicant = state
        .bootcamp_service()
        .enroll_applicant(&id, payload)
        .await?;

    Ok(Json(ApiResponse::success(IdentityDto::from(&applicant))))
}
