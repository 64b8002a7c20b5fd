use async_trait::async_trait;
use super::todo::{Todo, TodoChanges, TodoId};

/// Single-table record store. Every call is one store round trip except
/// `scan`, which reads the whole table.
#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    async fn get(&self, id: &TodoId) -> anyhow::Result<Option<Todo>>;
    /// Create or overwrite.
    async fn put(&self, todo: &Todo) -> anyhow::Result<()>;
    /// Merge `changes` into an existing record. `None` when the id is unknown.
    async fn update(&self, id: &TodoId, changes: &TodoChanges) -> anyhow::Result<Option<Todo>>;
    /// Remove and return the record, if it existed.
    async fn delete(&self, id: &TodoId) -> anyhow::Result<Option<Todo>>;
    /// Full table read, optionally keeping only records whose `is_complete` equals the filter.
    async fn scan(&self, completed: Option<bool>) -> anyhow::Result<Vec<Todo>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableState {
    Creating,
    Active,
    Other(String),
}

/// Table-level operations used by startup provisioning.
#[async_trait]
pub trait TableAdmin: Send + Sync {
    /// `None` when the table does not exist.
    async fn describe_table(&self) -> anyhow::Result<Option<TableState>>;
    /// Creates the table. Implementations treat "already being created" as success.
    async fn create_table(&self) -> anyhow::Result<()>;
    fn table_name(&self) -> &str;
}
