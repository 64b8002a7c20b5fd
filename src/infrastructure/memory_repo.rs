use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{
    repository::{TableAdmin, TableState, TodoRepository},
    todo::{Todo, TodoChanges, TodoId},
};

/// Process-local table used for development runs and tests.
#[derive(Clone, Default)]
pub struct InMemoryTodoRepository {
    items: Arc<RwLock<HashMap<TodoId, Todo>>>,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self { Self::default() }

    pub async fn len(&self) -> usize { self.items.read().await.len() }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn get(&self, id: &TodoId) -> Result<Option<Todo>> {
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn put(&self, todo: &Todo) -> Result<()> {
        self.items.write().await.insert(todo.id.clone(), todo.clone());
        Ok(())
    }

    async fn update(&self, id: &TodoId, changes: &TodoChanges) -> Result<Option<Todo>> {
        let mut items = self.items.write().await;
        let Some(todo) = items.get_mut(id) else { return Ok(None) };
        changes.apply_to(todo);
        Ok(Some(todo.clone()))
    }

    async fn delete(&self, id: &TodoId) -> Result<Option<Todo>> {
        Ok(self.items.write().await.remove(id))
    }

    async fn scan(&self, completed: Option<bool>) -> Result<Vec<Todo>> {
        Ok(self
            .items
            .read()
            .await
            .values()
            .filter(|t| completed.is_none_or(|c| t.is_complete == c))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TableAdmin for InMemoryTodoRepository {
    async fn describe_table(&self) -> Result<Option<TableState>> { Ok(Some(TableState::Active)) }
    async fn create_table(&self) -> Result<()> { Ok(()) }
    fn table_name(&self) -> &str { "memory" }
}
