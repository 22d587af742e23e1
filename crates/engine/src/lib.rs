//! Claim sheet engine.
//!
//! The engine owns every rule about claim sheets and their expenses: serial
//! numbering, totals, ownership checks and the reorder operation. Callers get
//! plain domain structs back; the sea-orm entities stay an implementation
//! detail except for the users table, which the HTTP layer authenticates
//! against.

pub use claim_sheets::{ClaimSheet, ClaimSheetPatch, ClaimStatus};
pub use error::EngineError;
pub use expense_items::{ExpenseItem, ExpenseNew, ExpensePatch};
pub use export::claim_sheet_csv;
pub use money::Money;
pub use ops::{Engine, EngineBuilder};

mod claim_sheets;
mod error;
mod expense_items;
mod export;
mod money;
mod ops;
pub mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
