//! Reordering the expenses of a claim sheet.
//!
//! Serial numbers are unique per claim sheet, so writing the new numbers in
//! place could collide with a sibling that still holds the old value. The
//! renumbering runs in two phases inside one transaction:
//!
//! 1. *displacement*: every serial number of the sheet is negated in a single
//!    statement, vacating the positive range;
//! 2. *assignment*: the submitted ids get `1..=N` in order.
//!
//! The transaction makes the negative intermediate state invisible to other
//! readers and the per-sheet lock keeps concurrent writers of the same sheet
//! from interleaving with it.

use std::collections::HashSet;

use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{EngineError, ExpenseItem, ResultEngine, expense_items};

use super::{Engine, positions, with_tx};

impl Engine {
    /// Renumber the expenses of a claim sheet so that their order matches
    /// `ordered_ids`, and return them in the new order.
    ///
    /// `ordered_ids` must list every expense of the sheet exactly once:
    /// - an empty list, a repeated id or a missing expense is
    ///   `InvalidArgument`;
    /// - an id that is not an expense of the sheet is `NotFound`.
    ///
    /// When `expected_revision` is set and the sheet changed since the caller
    /// read it, nothing is written and `Conflict` is returned.
    pub async fn reorder_expenses(
        &self,
        claim_sheet_id: Uuid,
        ordered_ids: &[Uuid],
        expected_revision: Option<i64>,
        user_id: &str,
    ) -> ResultEngine<Vec<ExpenseItem>> {
        if ordered_ids.is_empty() {
            return Err(EngineError::InvalidArgument(
                "expense order must not be empty".to_string(),
            ));
        }

        let _guard = self.locks.acquire(claim_sheet_id).await;
        with_tx!(self, |db_tx| {
            self.require_claim_sheet(&db_tx, claim_sheet_id, user_id)
                .await?;
            self.bump_revision(&db_tx, claim_sheet_id, expected_revision)
                .await?;

            let current = positions::find_by_claim_sheet(&db_tx, claim_sheet_id).await?;
            validate_order(&current, ordered_ids)?;

            let displaced = positions::displace(&db_tx, claim_sheet_id).await?;
            for (index, expense_id) in ordered_ids.iter().enumerate() {
                let serial_no = i32::try_from(index + 1).map_err(|_| {
                    EngineError::InvalidArgument("too many expenses".to_string())
                })?;
                positions::assign(&db_tx, *expense_id, claim_sheet_id, serial_no).await?;
            }

            let reordered: Vec<ExpenseItem> =
                positions::find_by_claim_sheet(&db_tx, claim_sheet_id)
                    .await?
                    .into_iter()
                    .map(ExpenseItem::from)
                    .collect();

            tracing::debug!(
                claim_sheet = %claim_sheet_id,
                displaced,
                count = reordered.len(),
                "expenses reordered"
            );
            Ok(reordered)
        })
    }
}

/// Check that `ordered_ids` is a permutation of the ids in `current`.
fn validate_order(current: &[expense_items::Model], ordered_ids: &[Uuid]) -> ResultEngine<()> {
    let live: HashSet<Uuid> = current.iter().map(|expense| expense.id).collect();

    let mut seen = HashSet::with_capacity(ordered_ids.len());
    for id in ordered_ids {
        if !live.contains(id) {
            return Err(EngineError::NotFound(format!("expense {id}")));
        }
        if !seen.insert(*id) {
            return Err(EngineError::InvalidArgument(format!(
                "expense {id} listed more than once"
            )));
        }
    }

    if seen.len() != live.len() {
        let missing = current
            .iter()
            .filter(|expense| !seen.contains(&expense.id))
            .count();
        return Err(EngineError::InvalidArgument(format!(
            "expense order omits {missing} expense(s) of the claim sheet"
        )));
    }
    Ok(())
}
