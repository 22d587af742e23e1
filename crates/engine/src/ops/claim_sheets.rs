use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    ClaimSheet, ClaimSheetPatch, ClaimStatus, EngineError, ExpenseItem, ResultEngine,
    claim_sheets, expense_items,
    util::{normalize_optional_text, normalize_required_text},
};

use super::{Engine, positions, with_tx};

impl Engine {
    /// Create a new `Draft` claim sheet owned by `user_id`.
    ///
    /// The claim number is unique across all users; a duplicate is reported
    /// as `Conflict`.
    pub async fn create_claim_sheet(
        &self,
        name: &str,
        claim_number: &str,
        claim_type: &str,
        user_id: &str,
    ) -> ResultEngine<ClaimSheet> {
        let name = normalize_required_text(name, "claim sheet name")?;
        let claim_number = normalize_required_text(claim_number, "claim number")?;
        let claim_type = normalize_required_text(claim_type, "claim type")?;
        let now = Utc::now();

        with_tx!(self, |db_tx| {
            self.require_unique_claim_number(&db_tx, &claim_number, None)
                .await?;

            let model = claim_sheets::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                user_id: ActiveValue::Set(user_id.to_string()),
                name: ActiveValue::Set(name),
                claim_number: ActiveValue::Set(claim_number),
                claim_type: ActiveValue::Set(claim_type),
                status: ActiveValue::Set(ClaimStatus::Draft.as_str().to_string()),
                total_amount_minor: ActiveValue::Set(0),
                revision: ActiveValue::Set(0),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(claim_sheet = %model.id, user = user_id, "claim sheet created");
            ClaimSheet::try_from(model)
        })
    }

    /// List the claim sheets of `user_id`, newest first.
    pub async fn list_claim_sheets(&self, user_id: &str) -> ResultEngine<Vec<ClaimSheet>> {
        claim_sheets::Entity::find()
            .filter(claim_sheets::Column::UserId.eq(user_id))
            .order_by_desc(claim_sheets::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(ClaimSheet::try_from)
            .collect()
    }

    /// Return a claim sheet owned by `user_id`.
    pub async fn claim_sheet(&self, claim_sheet_id: Uuid, user_id: &str) -> ResultEngine<ClaimSheet> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_claim_sheet(&db_tx, claim_sheet_id, user_id)
                .await?;
            ClaimSheet::try_from(model)
        })
    }

    /// Update the descriptive fields and/or the status of a claim sheet.
    pub async fn update_claim_sheet(
        &self,
        claim_sheet_id: Uuid,
        patch: ClaimSheetPatch,
        user_id: &str,
    ) -> ResultEngine<ClaimSheet> {
        let name = normalize_optional_text(patch.name.as_deref(), "claim sheet name")?;
        let claim_number = normalize_optional_text(patch.claim_number.as_deref(), "claim number")?;
        let claim_type = normalize_optional_text(patch.claim_type.as_deref(), "claim type")?;

        with_tx!(self, |db_tx| {
            let model = self
                .require_claim_sheet(&db_tx, claim_sheet_id, user_id)
                .await?;

            if let Some(claim_number) = &claim_number {
                self.require_unique_claim_number(&db_tx, claim_number, Some(claim_sheet_id))
                    .await?;
            }

            let mut active: claim_sheets::ActiveModel = model.into();
            if let Some(name) = name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(claim_number) = claim_number {
                active.claim_number = ActiveValue::Set(claim_number);
            }
            if let Some(claim_type) = claim_type {
                active.claim_type = ActiveValue::Set(claim_type);
            }
            if let Some(status) = patch.status {
                active.status = ActiveValue::Set(status.as_str().to_string());
            }
            active.updated_at = ActiveValue::Set(Utc::now());

            let model = active.update(&db_tx).await?;
            ClaimSheet::try_from(model)
        })
    }

    /// Delete a claim sheet together with its expenses.
    pub async fn delete_claim_sheet(&self, claim_sheet_id: Uuid, user_id: &str) -> ResultEngine<()> {
        let _guard = self.locks.acquire(claim_sheet_id).await;
        with_tx!(self, |db_tx| {
            self.require_claim_sheet(&db_tx, claim_sheet_id, user_id)
                .await?;

            let removed = expense_items::Entity::delete_many()
                .filter(expense_items::Column::ClaimSheetId.eq(claim_sheet_id))
                .exec(&db_tx)
                .await?
                .rows_affected;
            claim_sheets::Entity::delete_by_id(claim_sheet_id)
                .exec(&db_tx)
                .await?;

            tracing::info!(claim_sheet = %claim_sheet_id, removed, "claim sheet deleted");
            Ok(())
        })
    }

    /// Snapshot of a claim sheet and its expenses in serial order, read in
    /// one transaction. Used to export the sheet.
    pub async fn claim_sheet_report(
        &self,
        claim_sheet_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<(ClaimSheet, Vec<ExpenseItem>)> {
        with_tx!(self, |db_tx| {
            let model = self
                .require_claim_sheet(&db_tx, claim_sheet_id, user_id)
                .await?;
            let expenses = positions::find_by_claim_sheet(&db_tx, claim_sheet_id)
                .await?
                .into_iter()
                .map(ExpenseItem::from)
                .collect();
            Ok((ClaimSheet::try_from(model)?, expenses))
        })
    }

    async fn require_unique_claim_number(
        &self,
        db_tx: &sea_orm::DatabaseTransaction,
        claim_number: &str,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = claim_sheets::Entity::find()
            .filter(claim_sheets::Column::ClaimNumber.eq(claim_number));
        if let Some(id) = except {
            query = query.filter(claim_sheets::Column::Id.ne(id));
        }
        if query.one(db_tx).await?.is_some() {
            return Err(EngineError::Conflict(format!(
                "claim number {claim_number} already exists"
            )));
        }
        Ok(())
    }
}
