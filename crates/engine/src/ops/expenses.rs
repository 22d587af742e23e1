use chrono::Utc;
use sea_orm::{ActiveValue, DatabaseTransaction, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ExpenseItem, ExpenseNew, ExpensePatch, ResultEngine, expense_items,
    util::{normalize_optional_text, normalize_required_text, validate_amount},
};

use super::{Engine, positions, with_tx};

struct ValidExpense {
    bill_no: String,
    date: chrono::NaiveDate,
    issued_by: String,
    details: String,
    amount_minor: i64,
}

fn validate_expense(new: ExpenseNew) -> ResultEngine<ValidExpense> {
    validate_amount(new.amount)?;
    Ok(ValidExpense {
        bill_no: normalize_required_text(&new.bill_no, "bill number")?,
        date: new.date,
        issued_by: normalize_required_text(&new.issued_by, "issued by")?,
        details: normalize_required_text(&new.details, "expense details")?,
        amount_minor: new.amount.minor(),
    })
}

impl Engine {
    /// Append an expense to a claim sheet.
    ///
    /// The expense gets `serial_no = max + 1` and the sheet total is updated
    /// in the same transaction.
    pub async fn create_expense(
        &self,
        claim_sheet_id: Uuid,
        new: ExpenseNew,
        user_id: &str,
    ) -> ResultEngine<ExpenseItem> {
        let mut created = self
            .create_expenses(claim_sheet_id, vec![new], user_id)
            .await?;
        created
            .pop()
            .ok_or_else(|| EngineError::NotFound("expense".to_string()))
    }

    /// Append several expenses to a claim sheet with consecutive serial
    /// numbers. Either all of them are stored or none is.
    pub async fn create_expenses(
        &self,
        claim_sheet_id: Uuid,
        items: Vec<ExpenseNew>,
        user_id: &str,
    ) -> ResultEngine<Vec<ExpenseItem>> {
        if items.is_empty() {
            return Err(EngineError::InvalidArgument(
                "at least one expense is required".to_string(),
            ));
        }
        let items = items
            .into_iter()
            .map(validate_expense)
            .collect::<ResultEngine<Vec<_>>>()?;

        let _guard = self.locks.acquire(claim_sheet_id).await;
        with_tx!(self, |db_tx| {
            self.require_claim_sheet(&db_tx, claim_sheet_id, user_id)
                .await?;
            self.bump_revision(&db_tx, claim_sheet_id, None).await?;

            let mut serial_no = positions::next_serial_no(&db_tx, claim_sheet_id).await?;
            let now = Utc::now();
            let mut created = Vec::with_capacity(items.len());
            for item in items {
                let model = expense_items::ActiveModel {
                    id: ActiveValue::Set(Uuid::new_v4()),
                    claim_sheet_id: ActiveValue::Set(claim_sheet_id),
                    serial_no: ActiveValue::Set(serial_no),
                    bill_no: ActiveValue::Set(item.bill_no),
                    date: ActiveValue::Set(item.date),
                    issued_by: ActiveValue::Set(item.issued_by),
                    details: ActiveValue::Set(item.details),
                    amount_minor: ActiveValue::Set(item.amount_minor),
                    created_at: ActiveValue::Set(now),
                    updated_at: ActiveValue::Set(now),
                }
                .insert(&db_tx)
                .await?;
                created.push(ExpenseItem::from(model));
                serial_no += 1;
            }

            self.recompute_total(&db_tx, claim_sheet_id).await?;
            tracing::debug!(claim_sheet = %claim_sheet_id, count = created.len(), "expenses appended");
            Ok(created)
        })
    }

    /// List the expenses of a claim sheet in serial order.
    pub async fn list_expenses(
        &self,
        claim_sheet_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Vec<ExpenseItem>> {
        with_tx!(self, |db_tx| {
            self.require_claim_sheet(&db_tx, claim_sheet_id, user_id)
                .await?;
            let expenses = positions::find_by_claim_sheet(&db_tx, claim_sheet_id)
                .await?
                .into_iter()
                .map(ExpenseItem::from)
                .collect();
            Ok(expenses)
        })
    }

    /// Return one expense if its claim sheet belongs to `user_id`.
    pub async fn expense(&self, expense_id: Uuid, user_id: &str) -> ResultEngine<ExpenseItem> {
        with_tx!(self, |db_tx| {
            let (model, _) = self.require_expense(&db_tx, expense_id, user_id).await?;
            Ok(ExpenseItem::from(model))
        })
    }

    /// Update the fields of an expense. The serial number is never changed
    /// here; use [`Engine::reorder_expenses`].
    pub async fn update_expense(
        &self,
        expense_id: Uuid,
        patch: ExpensePatch,
        user_id: &str,
    ) -> ResultEngine<ExpenseItem> {
        if patch.is_empty() {
            return Err(EngineError::InvalidArgument(
                "provide at least one field to update".to_string(),
            ));
        }
        let bill_no = normalize_optional_text(patch.bill_no.as_deref(), "bill number")?;
        let issued_by = normalize_optional_text(patch.issued_by.as_deref(), "issued by")?;
        let details = normalize_optional_text(patch.details.as_deref(), "expense details")?;
        if let Some(amount) = patch.amount {
            validate_amount(amount)?;
        }

        with_tx!(self, |db_tx| {
            let (model, sheet) = self.require_expense(&db_tx, expense_id, user_id).await?;

            let mut active: expense_items::ActiveModel = model.into();
            if let Some(bill_no) = bill_no {
                active.bill_no = ActiveValue::Set(bill_no);
            }
            if let Some(date) = patch.date {
                active.date = ActiveValue::Set(date);
            }
            if let Some(issued_by) = issued_by {
                active.issued_by = ActiveValue::Set(issued_by);
            }
            if let Some(details) = details {
                active.details = ActiveValue::Set(details);
            }
            if let Some(amount) = patch.amount {
                active.amount_minor = ActiveValue::Set(amount.minor());
            }
            active.updated_at = ActiveValue::Set(Utc::now());

            let model = active.update(&db_tx).await?;
            if patch.amount.is_some() {
                self.recompute_total(&db_tx, sheet.id).await?;
            }
            Ok(ExpenseItem::from(model))
        })
    }

    /// Delete an expense.
    ///
    /// Siblings keep their serial numbers, so the sheet may have a gap until
    /// it is reordered.
    pub async fn delete_expense(&self, expense_id: Uuid, user_id: &str) -> ResultEngine<()> {
        let claim_sheet_id = with_tx!(self, |db_tx| {
            let (_, sheet) = self.require_expense(&db_tx, expense_id, user_id).await?;
            Ok::<_, EngineError>(sheet.id)
        })?;

        let _guard = self.locks.acquire(claim_sheet_id).await;
        with_tx!(self, |db_tx| {
            let (model, sheet) = self.require_expense(&db_tx, expense_id, user_id).await?;
            self.delete_expense_model(&db_tx, model, sheet.id).await
        })
    }

    async fn delete_expense_model(
        &self,
        db_tx: &DatabaseTransaction,
        model: expense_items::Model,
        claim_sheet_id: Uuid,
    ) -> ResultEngine<()> {
        self.bump_revision(db_tx, claim_sheet_id, None).await?;
        expense_items::Entity::delete_by_id(model.id)
            .exec(db_tx)
            .await?;
        self.recompute_total(db_tx, claim_sheet_id).await?;
        tracing::debug!(
            claim_sheet = %claim_sheet_id,
            expense = %model.id,
            serial_no = model.serial_no,
            "expense deleted"
        );
        Ok(())
    }
}
