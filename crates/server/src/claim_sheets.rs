//! Claim sheet API endpoints.

use api_types::claim_sheet::{
    ClaimSheetListResponse, ClaimSheetNew, ClaimSheetUpdate, ClaimSheetView, ClaimStatus,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use engine::{ClaimSheetPatch, users};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn map_status(status: engine::ClaimStatus) -> ClaimStatus {
    match status {
        engine::ClaimStatus::Draft => ClaimStatus::Draft,
        engine::ClaimStatus::Submitted => ClaimStatus::Submitted,
        engine::ClaimStatus::Approved => ClaimStatus::Approved,
        engine::ClaimStatus::Rejected => ClaimStatus::Rejected,
    }
}

fn engine_status(status: ClaimStatus) -> engine::ClaimStatus {
    match status {
        ClaimStatus::Draft => engine::ClaimStatus::Draft,
        ClaimStatus::Submitted => engine::ClaimStatus::Submitted,
        ClaimStatus::Approved => engine::ClaimStatus::Approved,
        ClaimStatus::Rejected => engine::ClaimStatus::Rejected,
    }
}

fn map_claim_sheet(sheet: engine::ClaimSheet) -> ClaimSheetView {
    ClaimSheetView {
        id: sheet.id,
        name: sheet.name,
        claim_number: sheet.claim_number,
        claim_type: sheet.claim_type,
        status: map_status(sheet.status),
        total_amount_minor: sheet.total.minor(),
        total_amount: sheet.total.to_string(),
        revision: sheet.revision,
        created_at: sheet.created_at,
        updated_at: sheet.updated_at,
    }
}

/// File name for the export, reduced to characters safe in a header.
fn export_file_name(claim_number: &str) -> String {
    let stem: String = claim_number
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect();
    if stem.is_empty() {
        "claim-sheet.csv".to_string()
    } else {
        format!("claim-sheet-{stem}.csv")
    }
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<ClaimSheetListResponse>, ServerError> {
    let claim_sheets = state
        .engine
        .list_claim_sheets(&user.username)
        .await?
        .into_iter()
        .map(map_claim_sheet)
        .collect();
    Ok(Json(ClaimSheetListResponse { claim_sheets }))
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ClaimSheetNew>,
) -> Result<(StatusCode, Json<ClaimSheetView>), ServerError> {
    let sheet = state
        .engine
        .create_claim_sheet(
            &payload.name,
            &payload.claim_number,
            &payload.claim_type,
            &user.username,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(map_claim_sheet(sheet))))
}

pub async fn get(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(claim_sheet_id): Path<Uuid>,
) -> Result<Json<ClaimSheetView>, ServerError> {
    let sheet = state
        .engine
        .claim_sheet(claim_sheet_id, &user.username)
        .await?;
    Ok(Json(map_claim_sheet(sheet)))
}

pub async fn update(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(claim_sheet_id): Path<Uuid>,
    Json(payload): Json<ClaimSheetUpdate>,
) -> Result<Json<ClaimSheetView>, ServerError> {
    if payload.name.is_none()
        && payload.claim_number.is_none()
        && payload.claim_type.is_none()
        && payload.status.is_none()
    {
        return Err(ServerError::Generic(
            "provide at least one of name, claim_number, claim_type or status".to_string(),
        ));
    }

    let patch = ClaimSheetPatch {
        name: payload.name,
        claim_number: payload.claim_number,
        claim_type: payload.claim_type,
        status: payload.status.map(engine_status),
    };
    let sheet = state
        .engine
        .update_claim_sheet(claim_sheet_id, patch, &user.username)
        .await?;
    Ok(Json(map_claim_sheet(sheet)))
}

pub async fn delete(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(claim_sheet_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_claim_sheet(claim_sheet_id, &user.username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn export(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(claim_sheet_id): Path<Uuid>,
) -> Result<impl IntoResponse, ServerError> {
    let (sheet, expenses) = state
        .engine
        .claim_sheet_report(claim_sheet_id, &user.username)
        .await?;
    let body = engine::claim_sheet_csv(&sheet, &expenses)?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        export_file_name(&sheet.claim_number)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}
