//! CSV export of a claim sheet.

use csv::WriterBuilder;
use serde::Serialize;

use crate::{ClaimSheet, EngineError, ExpenseItem, Money, ResultEngine};

const HEADER: [&str; 6] = ["S.No.", "Bill No.", "Date", "Issued By", "Details", "Amount"];

#[derive(Serialize)]
struct ExportRow<'a> {
    serial_no: i32,
    bill_no: &'a str,
    date: String,
    issued_by: &'a str,
    details: &'a str,
    amount: String,
}

/// Render the expenses of `sheet` as CSV, one row per item in the given
/// order, followed by a `Total` row.
///
/// Dates use the `dd/mm/yy` layout of the printed claim form.
pub fn claim_sheet_csv(sheet: &ClaimSheet, expenses: &[ExpenseItem]) -> ResultEngine<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);

    writer.write_record(HEADER)?;
    for expense in expenses {
        writer.serialize(ExportRow {
            serial_no: expense.serial_no,
            bill_no: &expense.bill_no,
            date: expense.date.format("%d/%m/%y").to_string(),
            issued_by: &expense.issued_by,
            details: &expense.details,
            amount: expense.amount.to_string(),
        })?;
    }

    let total: Money = expenses.iter().map(|expense| expense.amount).sum();
    if total != sheet.total {
        tracing::warn!(
            claim_sheet = %sheet.id,
            stored = %sheet.total,
            computed = %total,
            "claim sheet total out of date"
        );
    }
    let total = total.to_string();
    writer.write_record(["", "", "", "", "Total", total.as_str()])?;

    writer
        .into_inner()
        .map_err(|err| EngineError::Export(err.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::ClaimStatus;

    fn sheet(total: i64) -> ClaimSheet {
        let now = Utc::now();
        ClaimSheet {
            id: Uuid::new_v4(),
            user_id: "alice".to_string(),
            name: "Conference".to_string(),
            claim_number: "CLM-7".to_string(),
            claim_type: "Travel".to_string(),
            status: ClaimStatus::Draft,
            total: Money::new(total),
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn expense(sheet: &ClaimSheet, serial_no: i32, details: &str, amount: i64) -> ExpenseItem {
        let now = Utc::now();
        ExpenseItem {
            id: Uuid::new_v4(),
            claim_sheet_id: sheet.id,
            serial_no,
            bill_no: format!("B{serial_no}"),
            date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            issued_by: "Metro Cabs".to_string(),
            details: details.to_string(),
            amount: Money::new(amount),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn writes_rows_in_given_order_with_total() {
        let sheet = sheet(1550);
        let rows = vec![
            expense(&sheet, 2, "Airport drop", 1050),
            expense(&sheet, 1, "Lunch, team", 500),
        ];

        let csv = String::from_utf8(claim_sheet_csv(&sheet, &rows).unwrap()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], "S.No.,Bill No.,Date,Issued By,Details,Amount");
        assert_eq!(lines[1], "2,B2,09/03/24,Metro Cabs,Airport drop,10.50");
        assert_eq!(lines[2], "1,B1,09/03/24,Metro Cabs,\"Lunch, team\",5.00");
        assert_eq!(lines[3], ",,,,Total,15.50");
    }

    #[test]
    fn empty_sheet_still_has_header_and_total() {
        let sheet = sheet(0);
        let csv = String::from_utf8(claim_sheet_csv(&sheet, &[]).unwrap()).unwrap();
        assert_eq!(
            csv.lines().collect::<Vec<_>>(),
            vec!["S.No.,Bill No.,Date,Issued By,Details,Amount", ",,,,Total,0.00"]
        );
    }
}
