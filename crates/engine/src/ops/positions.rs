//! Serial number storage primitives.
//!
//! Every helper works on one claim sheet and never issues a write that could
//! make two of its expenses share a `serial_no`, even in the middle of a
//! statement: the unique index `(claim_sheet_id, serial_no)` is checked row by
//! row.

use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, expense_items};

/// Expenses of a claim sheet ordered by `serial_no` ascending.
pub(super) async fn find_by_claim_sheet<C: ConnectionTrait>(
    db: &C,
    claim_sheet_id: Uuid,
) -> ResultEngine<Vec<expense_items::Model>> {
    expense_items::Entity::find()
        .filter(expense_items::Column::ClaimSheetId.eq(claim_sheet_id))
        .order_by_asc(expense_items::Column::SerialNo)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Serial number for the next appended expense: `max + 1`, or 1 when the
/// sheet is empty.
pub(super) async fn next_serial_no<C: ConnectionTrait>(
    db: &C,
    claim_sheet_id: Uuid,
) -> ResultEngine<i32> {
    let max: Option<i32> = expense_items::Entity::find()
        .select_only()
        .column_as(expense_items::Column::SerialNo.max(), "max_serial_no")
        .filter(expense_items::Column::ClaimSheetId.eq(claim_sheet_id))
        .into_tuple::<Option<i32>>()
        .one(db)
        .await?
        .flatten();

    match max {
        None => Ok(1),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| EngineError::InvalidArgument("too many expenses".to_string())),
    }
}

/// Move every expense of the sheet out of the positive range in one
/// statement.
///
/// Serial numbers are negated: distinct positives map to distinct negatives,
/// and no negative value can collide with a positive one, so the statement
/// is safe even though the index is checked row by row.
pub(super) async fn displace<C: ConnectionTrait>(db: &C, claim_sheet_id: Uuid) -> ResultEngine<u64> {
    let result = expense_items::Entity::update_many()
        .col_expr(
            expense_items::Column::SerialNo,
            Expr::col(expense_items::Column::SerialNo).mul(-1),
        )
        .filter(expense_items::Column::ClaimSheetId.eq(claim_sheet_id))
        .filter(expense_items::Column::SerialNo.gt(0))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Set the serial number of one expense of the sheet.
pub(super) async fn assign<C: ConnectionTrait>(
    db: &C,
    expense_id: Uuid,
    claim_sheet_id: Uuid,
    serial_no: i32,
) -> ResultEngine<()> {
    let result = expense_items::Entity::update_many()
        .col_expr(expense_items::Column::SerialNo, Expr::value(serial_no))
        .filter(expense_items::Column::Id.eq(expense_id))
        .filter(expense_items::Column::ClaimSheetId.eq(claim_sheet_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(EngineError::NotFound(format!("expense {expense_id}")));
    }
    Ok(())
}
