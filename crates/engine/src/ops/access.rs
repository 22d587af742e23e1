use chrono::Utc;
use sea_orm::{DatabaseTransaction, QueryFilter, QuerySelect, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, claim_sheets, expense_items};

use super::Engine;

const CLAIM_SHEET_NOT_FOUND: &str = "claim sheet";
const EXPENSE_NOT_FOUND: &str = "expense";

impl Engine {
    /// Load a claim sheet owned by `user_id`.
    ///
    /// Sheets of other users are reported as missing so their ids do not
    /// leak.
    pub(super) async fn require_claim_sheet(
        &self,
        db: &DatabaseTransaction,
        claim_sheet_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<claim_sheets::Model> {
        claim_sheets::Entity::find_by_id(claim_sheet_id)
            .filter(claim_sheets::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound(CLAIM_SHEET_NOT_FOUND.to_string()))
    }

    /// Load an expense whose claim sheet is owned by `user_id`.
    pub(super) async fn require_expense(
        &self,
        db: &DatabaseTransaction,
        expense_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<(expense_items::Model, claim_sheets::Model)> {
        let (expense, sheet) = expense_items::Entity::find_by_id(expense_id)
            .find_also_related(claim_sheets::Entity)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::NotFound(EXPENSE_NOT_FOUND.to_string()))?;

        match sheet {
            Some(sheet) if sheet.user_id == user_id => Ok((expense, sheet)),
            _ => Err(EngineError::NotFound(EXPENSE_NOT_FOUND.to_string())),
        }
    }

    /// Increment the revision of a claim sheet.
    ///
    /// With `expected` set the update only applies if the stored revision
    /// still matches, otherwise the caller lost a race and gets `Conflict`.
    /// Being the first write of the transaction it also takes the store's
    /// write lock before any expense is read.
    pub(super) async fn bump_revision(
        &self,
        db: &DatabaseTransaction,
        claim_sheet_id: Uuid,
        expected: Option<i64>,
    ) -> ResultEngine<()> {
        let mut update = claim_sheets::Entity::update_many()
            .col_expr(
                claim_sheets::Column::Revision,
                Expr::col(claim_sheets::Column::Revision).add(1),
            )
            .col_expr(claim_sheets::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(claim_sheets::Column::Id.eq(claim_sheet_id));
        if let Some(expected) = expected {
            update = update.filter(claim_sheets::Column::Revision.eq(expected));
        }

        let result = update.exec(db).await?;
        if result.rows_affected == 0 {
            return Err(EngineError::Conflict(format!(
                "claim sheet {claim_sheet_id} was modified concurrently"
            )));
        }
        Ok(())
    }

    /// Store the sum of the expense amounts as the claim sheet total.
    pub(super) async fn recompute_total(
        &self,
        db: &DatabaseTransaction,
        claim_sheet_id: Uuid,
    ) -> ResultEngine<()> {
        let total: Option<i64> = expense_items::Entity::find()
            .select_only()
            .column_as(expense_items::Column::AmountMinor.sum(), "total")
            .filter(expense_items::Column::ClaimSheetId.eq(claim_sheet_id))
            .into_tuple::<Option<i64>>()
            .one(db)
            .await?
            .flatten();

        claim_sheets::Entity::update_many()
            .col_expr(
                claim_sheets::Column::TotalAmountMinor,
                Expr::value(total.unwrap_or(0)),
            )
            .col_expr(claim_sheets::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(claim_sheets::Column::Id.eq(claim_sheet_id))
            .exec(db)
            .await?;
        Ok(())
    }
}
