use crate::domain::repository::TodoRepository;
use crate::domain::todo::{by_due_date_desc, CreateTodo, ReplaceTodo, Todo, TodoChanges, TodoId, TodoStats, UpdateTodo};
use async_trait::async_trait;
use chrono::Utc;

#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("Todo not found")]
    NotFound(TodoId),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TodoError>;

pub const REQUIRED_FIELDS: &str = "Title and description are required";
pub const NO_UPDATE_FIELDS: &str = "At least one field is required for update";
pub const EMPTY_UPDATE_FIELDS: &str = "Title and description cannot be empty";

#[async_trait]
pub trait TodoService: Send + Sync + 'static {
    async fn list(&self, completed: Option<bool>) -> Result<Vec<Todo>>;
    async fn get(&self, id: TodoId) -> Result<Todo>;
    async fn create(&self, input: CreateTodo) -> Result<Todo>;
    async fn update(&self, id: TodoId, input: UpdateTodo) -> Result<Todo>;
    async fn replace(&self, id: TodoId, input: ReplaceTodo) -> Result<Todo>;
    async fn delete(&self, id: TodoId) -> Result<Todo>;
    async fn stats(&self) -> Result<TodoStats>;
}

#[derive(Clone)]
pub struct TodoServiceImpl<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoServiceImpl<R> {
    pub fn new(repo: R) -> Self { Self { repo } }

    /// Builds a fresh record under `id` from a create/replace body.
    fn build(id: TodoId, input: CreateTodo) -> Result<Todo> {
        let (Some(title), Some(description)) = (non_blank(input.title), non_blank(input.description)) else {
            return Err(TodoError::Validation(REQUIRED_FIELDS));
        };
        let now = Utc::now();
        Ok(Todo {
            id,
            title,
            description,
            is_complete: input.is_complete.unwrap_or(false),
            due_date: input.due_date.unwrap_or(now),
            created_at: now,
            updated_at: now,
        })
    }
}

#[async_trait]
impl<R: TodoRepository> TodoService for TodoServiceImpl<R> {
    async fn list(&self, completed: Option<bool>) -> Result<Vec<Todo>> {
        let mut todos = self.repo.scan(completed).await?;
        todos.sort_by(by_due_date_desc);
        Ok(todos)
    }

    async fn get(&self, id: TodoId) -> Result<Todo> {
        self.repo.get(&id).await?.ok_or(TodoError::NotFound(id))
    }

    async fn create(&self, input: CreateTodo) -> Result<Todo> {
        let todo = Self::build(TodoId::generate(), input)?;
        self.repo.put(&todo).await?;
        tracing::debug!(id = %todo.id, "todo created");
        Ok(todo)
    }

    async fn update(&self, id: TodoId, input: UpdateTodo) -> Result<Todo> {
        if input.is_empty() {
            return Err(TodoError::Validation(NO_UPDATE_FIELDS));
        }
        let changes = TodoChanges {
            title: trimmed_if_present(input.title)?,
            description: trimmed_if_present(input.description)?,
            is_complete: input.is_complete,
            due_date: input.due_date,
            updated_at: Utc::now(),
        };
        self.repo.update(&id, &changes).await?.ok_or(TodoError::NotFound(id))
    }

    async fn replace(&self, id: TodoId, input: ReplaceTodo) -> Result<Todo> {
        let todo = Self::build(id, input)?;
        self.repo.put(&todo).await?;
        Ok(todo)
    }

    async fn delete(&self, id: TodoId) -> Result<Todo> {
        self.repo.delete(&id).await?.ok_or(TodoError::NotFound(id))
    }

    async fn stats(&self) -> Result<TodoStats> {
        let todos = self.repo.scan(None).await?;
        Ok(TodoStats::tally(&todos, Utc::now()))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn trimmed_if_present(value: Option<String>) -> Result<Option<String>> {
    match value {
        None => Ok(None),
        Some(v) => non_blank(Some(v)).map(Some).ok_or(TodoError::Validation(EMPTY_UPDATE_FIELDS)),
    }
}
