//! Initial schema migration.
//!
//! - `users`: accounts allowed to call the API
//! - `claim_sheets`: expense claims owned by a user
//! - `expense_items`: itemized bills of a claim sheet, ordered by `serial_no`
//!
//! `(claim_sheet_id, serial_no)` is unique: the engine relies on the store to
//! reject duplicate serial numbers inside a sheet.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Users {
    Table,
    Username,
    Password,
}

#[derive(Iden)]
enum ClaimSheets {
    Table,
    Id,
    UserId,
    Name,
    ClaimNumber,
    ClaimType,
    Status,
    TotalAmountMinor,
    Revision,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ExpenseItems {
    Table,
    Id,
    ClaimSheetId,
    SerialNo,
    BillNo,
    Date,
    IssuedBy,
    Details,
    AmountMinor,
    CreatedAt,
    UpdatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Claim sheets
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ClaimSheets::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClaimSheets::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ClaimSheets::UserId).string().not_null())
                    .col(ColumnDef::new(ClaimSheets::Name).string().not_null())
                    .col(ColumnDef::new(ClaimSheets::ClaimNumber).string().not_null())
                    .col(ColumnDef::new(ClaimSheets::ClaimType).string().not_null())
                    .col(
                        ColumnDef::new(ClaimSheets::Status)
                            .string()
                            .not_null()
                            .default("Draft"),
                    )
                    .col(
                        ColumnDef::new(ClaimSheets::TotalAmountMinor)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ClaimSheets::Revision)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ClaimSheets::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(ClaimSheets::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-claim_sheets-user_id")
                            .from(ClaimSheets::Table, ClaimSheets::UserId)
                            .to(Users::Table, Users::Username),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-claim_sheets-claim_number-unique")
                    .table(ClaimSheets::Table)
                    .col(ClaimSheets::ClaimNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-claim_sheets-user_id-created_at")
                    .table(ClaimSheets::Table)
                    .col(ClaimSheets::UserId)
                    .col(ClaimSheets::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Expense items
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(ExpenseItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExpenseItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ExpenseItems::ClaimSheetId).uuid().not_null())
                    .col(ColumnDef::new(ExpenseItems::SerialNo).integer().not_null())
                    .col(ColumnDef::new(ExpenseItems::BillNo).string().not_null())
                    .col(ColumnDef::new(ExpenseItems::Date).date().not_null())
                    .col(ColumnDef::new(ExpenseItems::IssuedBy).string().not_null())
                    .col(ColumnDef::new(ExpenseItems::Details).string().not_null())
                    .col(
                        ColumnDef::new(ExpenseItems::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ExpenseItems::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(ExpenseItems::UpdatedAt).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expense_items-claim_sheet_id")
                            .from(ExpenseItems::Table, ExpenseItems::ClaimSheetId)
                            .to(ClaimSheets::Table, ClaimSheets::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expense_items-claim_sheet_id-serial_no-unique")
                    .table(ExpenseItems::Table)
                    .col(ExpenseItems::ClaimSheetId)
                    .col(ExpenseItems::SerialNo)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(ExpenseItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ClaimSheets::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}
