use sea_orm::DatabaseConnection;

use crate::ResultEngine;

mod access;
mod claim_sheets;
mod expenses;
mod locks;
mod positions;
mod reorder;

use locks::ParentLocks;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Entry point for every claim sheet and expense operation.
///
/// Operations that touch the serial numbers of a claim sheet (creating,
/// deleting and reordering expenses, deleting the sheet) are serialized per
/// sheet by an in-process lock and run inside a single DB transaction.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    locks: ParentLocks,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            locks: ParentLocks::default(),
        })
    }
}
