use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use common::{LeadDto, LeadInput};

use crate::error::AppError;
use crate::extractors::AuthUser;
use crate::lead_store;
use crate::web_server::AppState;

type LeadId = WithRejection<Path<i64>, AppError>;
type LeadBody = WithRejection<Json<LeadInput>, AppError>;

/// ## List the caller's leads
#[utoipa::path(
    get,
    path = "/api/v1/leads",
    tag = "Leads",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Leads created by the caller", body = [LeadDto]),
        (status = 401, description = "Authentication required"),
    )
)]
pub async fn list_leads(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<LeadDto>>, AppError> {
    tracing::info!("Listing leads for user {}", user.id());
    let leads = lead_store::list_owned(&state.db_pool, user.id()).await?;
    Ok(Json(leads))
}

/// ## Create a lead
/// The creator is always the caller; `created_by` in the body is ignored.
#[utoipa::path(
    post,
    path = "/api/v1/leads",
    tag = "Leads",
    security(("bearer_auth" = [])),
    request_body = LeadInput,
    responses(
        (status = 201, description = "Lead created", body = LeadDto),
        (status = 400, description = "Field-level validation errors"),
        (status = 401, description = "Authentication required"),
    )
)]
pub async fn create_lead(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Json(input), _): LeadBody,
) -> Result<(StatusCode, Json<LeadDto>), AppError> {
    let fields = input.to_new_lead()?;
    let lead = lead_store::create(&state.db_pool, user.id(), &fields).await?;
    tracing::info!("User {} created lead {}", user.id(), lead.id);
    Ok((StatusCode::CREATED, Json(lead)))
}

#[utoipa::path(
    get,
    path = "/api/v1/leads/{id}",
    tag = "Leads",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Lead id")),
    responses(
        (status = 200, description = "The lead", body = LeadDto),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "No such lead among the caller's leads"),
    )
)]
pub async fn get_lead(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path(id), _): LeadId,
) -> Result<Json<LeadDto>, AppError> {
    tracing::info!("Fetching lead {} for user {}", id, user.id());
    let lead = lead_store::find_owned(&state.db_pool, user.id(), id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(lead))
}

// Ownership is checked before the body is validated, so a stranger's lead
// answers 404 whatever the payload.
async fn apply_update(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    input: &LeadInput,
    partial: bool,
) -> Result<Json<LeadDto>, AppError> {
    let existing = lead_store::find_owned(&state.db_pool, user.id(), id)
        .await?
        .ok_or(AppError::NotFound)?;

    let changes = input.to_changes(partial)?;
    let mut fields = existing.fields();
    changes.apply(&mut fields);

    let lead = lead_store::update_owned(&state.db_pool, user.id(), id, &fields)
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::info!("User {} updated lead {}", user.id(), id);
    Ok(Json(lead))
}

/// ## Replace a lead
/// `company`, `email` and `phone` are required; omitted optional fields keep their value.
#[utoipa::path(
    put,
    path = "/api/v1/leads/{id}",
    tag = "Leads",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Lead id")),
    request_body = LeadInput,
    responses(
        (status = 200, description = "Lead updated", body = LeadDto),
        (status = 400, description = "Field-level validation errors"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "No such lead among the caller's leads"),
    )
)]
pub async fn update_lead(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path(id), _): LeadId,
    WithRejection(Json(input), _): LeadBody,
) -> Result<Json<LeadDto>, AppError> {
    apply_update(&state, &user, id, &input, false).await
}

/// ## Partially update a lead
#[utoipa::path(
    patch,
    path = "/api/v1/leads/{id}",
    tag = "Leads",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Lead id")),
    request_body = LeadInput,
    responses(
        (status = 200, description = "Lead updated", body = LeadDto),
        (status = 400, description = "Field-level validation errors"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "No such lead among the caller's leads"),
    )
)]
pub async fn patch_lead(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path(id), _): LeadId,
    WithRejection(Json(input), _): LeadBody,
) -> Result<Json<LeadDto>, AppError> {
    apply_update(&state, &user, id, &input, true).await
}

#[utoipa::path(
    delete,
    path = "/api/v1/leads/{id}",
    tag = "Leads",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Lead id")),
    responses(
        (status = 204, description = "Lead deleted"),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "No such lead among the caller's leads"),
    )
)]
pub async fn delete_lead(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path(id), _): LeadId,
) -> Result<StatusCode, AppError> {
    tracing::info!("User {} deleting lead {}", user.id(), id);
    if lead_store::delete_owned(&state.db_pool, user.id(), id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}
