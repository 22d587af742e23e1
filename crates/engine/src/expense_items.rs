//! The module contains `ExpenseItem` struct and its implementation.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use uuid::Uuid;

use crate::Money;

/// A single bill attached to a claim sheet.
///
/// `serial_no` is the position of the item inside its claim sheet. It is
/// unique per sheet, but deletions may leave gaps until the sheet is reordered.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpenseItem {
    pub id: Uuid,
    pub claim_sheet_id: Uuid,
    pub serial_no: i32,
    pub bill_no: String,
    pub date: NaiveDate,
    pub issued_by: String,
    pub details: String,
    pub amount: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields of an expense as supplied by a caller.
#[derive(Clone, Debug)]
pub struct ExpenseNew {
    pub bill_no: String,
    pub date: NaiveDate,
    pub issued_by: String,
    pub details: String,
    pub amount: Money,
}

/// Partial update of an expense; `None` keeps the stored value.
#[derive(Clone, Debug, Default)]
pub struct ExpensePatch {
    pub bill_no: Option<String>,
    pub date: Option<NaiveDate>,
    pub issued_by: Option<String>,
    pub details: Option<String>,
    pub amount: Option<Money>,
}

impl ExpensePatch {
    pub fn is_empty(&self) -> bool {
        self.bill_no.is_none()
            && self.date.is_none()
            && self.issued_by.is_none()
            && self.details.is_none()
            && self.amount.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expense_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub claim_sheet_id: Uuid,
    pub serial_no: i32,
    pub bill_no: String,
    pub date: Date,
    pub issued_by: String,
    pub details: String,
    pub amount_minor: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::claim_sheets::Entity",
        from = "Column::ClaimSheetId",
        to = "super::claim_sheets::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    ClaimSheets,
}

impl Related<super::claim_sheets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ClaimSheets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ExpenseItem {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            claim_sheet_id: model.claim_sheet_id,
            serial_no: model.serial_no,
            bill_no: model.bill_no,
            date: model.date,
            issued_by: model.issued_by,
            details: model.details,
            amount: Money::new(model.amount_minor),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
