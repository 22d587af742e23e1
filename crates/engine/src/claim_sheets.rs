//! The module contains `ClaimSheet` struct and its implementation.

use std::fmt;

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine};

/// Review state of a claim sheet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimStatus {
    #[default]
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl ClaimStatus {
    /// Canonical value stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Submitted => "Submitted",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ClaimStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "submitted" => Ok(Self::Submitted),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(EngineError::InvalidArgument(format!(
                "invalid claim status: {other}"
            ))),
        }
    }
}

/// A claim sheet.
///
/// A claim sheet groups the bills a user wants reimbursed. Its expenses are
/// numbered by `serial_no` and `total` always equals the sum of their amounts.
#[derive(Clone, Debug, PartialEq)]
pub struct ClaimSheet {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub claim_number: String,
    pub claim_type: String,
    pub status: ClaimStatus,
    pub total: Money,
    /// Incremented by every change to the set or the order of the expenses.
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update of a claim sheet; `None` keeps the stored value.
#[derive(Clone, Debug, Default)]
pub struct ClaimSheetPatch {
    pub name: Option<String>,
    pub claim_number: Option<String>,
    pub claim_type: Option<String>,
    pub status: Option<ClaimStatus>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "claim_sheets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub claim_number: String,
    pub claim_type: String,
    pub status: String,
    pub total_amount_minor: i64,
    pub revision: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Username",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
    #[sea_orm(has_many = "super::expense_items::Entity")]
    ExpenseItems,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::expense_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for ClaimSheet {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            status: ClaimStatus::try_from(model.status.as_str())?,
            user_id: model.user_id,
            name: model.name,
            claim_number: model.claim_number,
            claim_type: model.claim_type,
            total: Money::new(model.total_amount_minor),
            revision: model.revision,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
