//! Expense API endpoints.

use api_types::expense::{
    ExpenseBatchNew, ExpenseFields, ExpenseListResponse, ExpenseNew, ExpenseReorder,
    ExpenseUpdate, ExpenseView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{ExpensePatch, Money, users};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn map_expense(expense: engine::ExpenseItem) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        claim_sheet_id: expense.claim_sheet_id,
        serial_no: expense.serial_no,
        bill_no: expense.bill_no,
        date: expense.date,
        issued_by: expense.issued_by,
        details: expense.details,
        amount_minor: expense.amount.minor(),
        amount: expense.amount.to_string(),
        created_at: expense.created_at,
        updated_at: expense.updated_at,
    }
}

fn engine_expense(fields: ExpenseFields) -> Result<engine::ExpenseNew, ServerError> {
    Ok(engine::ExpenseNew {
        amount: fields.amount.parse::<Money>()?,
        bill_no: fields.bill_no,
        date: fields.date,
        issued_by: fields.issued_by,
        details: fields.details,
    })
}

pub async fn list_by_claim_sheet(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(claim_sheet_id): Path<Uuid>,
) -> Result<Json<ExpenseListResponse>, ServerError> {
    let expenses = state
        .engine
        .list_expenses(claim_sheet_id, &user.username)
        .await?
        .into_iter()
        .map(map_expense)
        .collect();
    Ok(Json(ExpenseListResponse { expenses }))
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseView>), ServerError> {
    let new = engine_expense(payload.fields)?;
    let expense = state
        .engine
        .create_expense(payload.claim_sheet_id, new, &user.username)
        .await?;
    Ok((StatusCode::CREATED, Json(map_expense(expense))))
}

pub async fn create_batch(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseBatchNew>,
) -> Result<(StatusCode, Json<ExpenseListResponse>), ServerError> {
    let items = payload
        .expenses
        .into_iter()
        .map(engine_expense)
        .collect::<Result<Vec<_>, _>>()?;
    let expenses = state
        .engine
        .create_expenses(payload.claim_sheet_id, items, &user.username)
        .await?
        .into_iter()
        .map(map_expense)
        .collect();
    Ok((StatusCode::CREATED, Json(ExpenseListResponse { expenses })))
}

pub async fn get(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(expense_id): Path<Uuid>,
) -> Result<Json<ExpenseView>, ServerError> {
    let expense = state.engine.expense(expense_id, &user.username).await?;
    Ok(Json(map_expense(expense)))
}

pub async fn update(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(expense_id): Path<Uuid>,
    Json(payload): Json<ExpenseUpdate>,
) -> Result<Json<ExpenseView>, ServerError> {
    let patch = ExpensePatch {
        bill_no: payload.bill_no,
        date: payload.date,
        issued_by: payload.issued_by,
        details: payload.details,
        amount: payload
            .amount
            .as_deref()
            .map(str::parse::<Money>)
            .transpose()?,
    };
    if patch.is_empty() {
        return Err(ServerError::Generic(
            "provide at least one field to update".to_string(),
        ));
    }

    let expense = state
        .engine
        .update_expense(expense_id, patch, &user.username)
        .await?;
    Ok(Json(map_expense(expense)))
}

pub async fn delete(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(expense_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state
        .engine
        .delete_expense(expense_id, &user.username)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reorder runs in its own task: once started it completes even if the
/// client goes away, so a dropped connection never leaves the sheet
/// half renumbered.
pub async fn reorder(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(claim_sheet_id): Path<Uuid>,
    Json(payload): Json<ExpenseReorder>,
) -> Result<Json<ExpenseListResponse>, ServerError> {
    let engine = state.engine.clone();
    let task = tokio::spawn(async move {
        engine
            .reorder_expenses(
                claim_sheet_id,
                &payload.expense_ids,
                payload.expected_revision,
                &user.username,
            )
            .await
    });

    let expenses = task
        .await
        .map_err(|err| {
            ServerError::Internal(format!("reorder of {claim_sheet_id} failed: {err}"))
        })??
        .into_iter()
        .map(map_expense)
        .collect();
    Ok(Json(ExpenseListResponse { expenses }))
}
