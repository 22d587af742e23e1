use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod claim_sheet {
    use super::*;

    /// Lifecycle of a claim sheet.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub enum ClaimStatus {
        #[default]
        Draft,
        Submitted,
        Approved,
        Rejected,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ClaimSheetNew {
        pub name: String,
        pub claim_number: String,
        pub claim_type: String,
    }

    /// Partial update: absent fields are left unchanged.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ClaimSheetUpdate {
        pub name: Option<String>,
        pub claim_number: Option<String>,
        pub claim_type: Option<String>,
        pub status: Option<ClaimStatus>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ClaimSheetView {
        pub id: Uuid,
        pub name: String,
        pub claim_number: String,
        pub claim_type: String,
        pub status: ClaimStatus,
        pub total_amount_minor: i64,
        /// Total formatted with two decimals, e.g. `"1250.50"`.
        pub total_amount: String,
        /// Changes every time the expenses of the sheet are added, removed or
        /// reordered. Send it back as `expected_revision` when reordering.
        pub revision: i64,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ClaimSheetListResponse {
        pub claim_sheets: Vec<ClaimSheetView>,
    }
}

pub mod expense {
    use super::*;

    /// Fields of an expense as typed by the user.
    ///
    /// `amount` is a decimal string (`"12.50"` or `"12,50"`) and must be
    /// greater than zero.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseFields {
        pub bill_no: String,
        pub date: NaiveDate,
        pub issued_by: String,
        pub details: String,
        pub amount: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub claim_sheet_id: Uuid,
        #[serde(flatten)]
        pub fields: ExpenseFields,
    }

    /// Several expenses appended in one request, in the given order.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseBatchNew {
        pub claim_sheet_id: Uuid,
        pub expenses: Vec<ExpenseFields>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseUpdate {
        pub bill_no: Option<String>,
        pub date: Option<NaiveDate>,
        pub issued_by: Option<String>,
        pub details: Option<String>,
        pub amount: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub claim_sheet_id: Uuid,
        pub serial_no: i32,
        pub bill_no: String,
        pub date: NaiveDate,
        pub issued_by: String,
        pub details: String,
        pub amount_minor: i64,
        pub amount: String,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseListResponse {
        pub expenses: Vec<ExpenseView>,
    }

    /// New order of the expenses of a claim sheet.
    ///
    /// `expense_ids` must list every expense of the sheet exactly once. When
    /// `expected_revision` is set the request fails with 409 if the sheet
    /// changed since it was read.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseReorder {
        pub expense_ids: Vec<Uuid>,
        #[serde(default)]
        pub expected_revision: Option<i64>,
    }
}

pub mod health {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Health {
        pub status: String,
    }
}
