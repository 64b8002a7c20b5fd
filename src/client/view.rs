use crate::domain::todo::{parse_due_date, CreateTodo, Todo};

pub const UPDATE_FAILED: &str = "Failed to update todo. Please try again.";
pub const CREATE_FAILED: &str = "Failed to create todo. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Error(String),
    Ready,
}

/// Screen state of the todo client. Network calls happen outside; this only
/// records what the last call did to the screen.
#[derive(Debug, Clone)]
pub struct TodoView {
    pub phase: Phase,
    pub todos: Vec<Todo>,
    pub modal_open: bool,
    /// Blocking notice raised by a failed action; the list underneath is untouched.
    pub alert: Option<String>,
    pub selected: usize,
}

impl Default for TodoView {
    fn default() -> Self {
        Self { phase: Phase::Loading, todos: Vec::new(), modal_open: false, alert: None, selected: 0 }
    }
}

impl TodoView {
    pub fn begin_load(&mut self) {
        self.phase = Phase::Loading;
    }

    pub fn load_succeeded(&mut self, todos: Vec<Todo>) {
        self.todos = todos;
        self.phase = Phase::Ready;
        self.clamp_selection();
    }

    pub fn load_failed(&mut self, message: impl Into<String>) {
        self.todos.clear();
        self.selected = 0;
        self.phase = Phase::Error(message.into());
    }

    pub fn open_modal(&mut self) {
        if self.phase == Phase::Ready { self.modal_open = true; }
    }

    pub fn close_modal(&mut self) { self.modal_open = false; }

    pub fn action_failed(&mut self, message: &str) { self.alert = Some(message.to_string()); }

    pub fn dismiss_alert(&mut self) { self.alert = None; }

    pub fn selected_todo(&self) -> Option<&Todo> {
        match self.phase {
            Phase::Ready => self.todos.get(self.selected),
            _ => None,
        }
    }

    pub fn select_next(&mut self) {
        if self.selected + 1 < self.todos.len() { self.selected += 1; }
    }

    pub fn select_previous(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.todos.len().saturating_sub(1));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormField {
    #[default]
    Title,
    Description,
    DueDate,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            Self::Title => Self::Description,
            Self::Description => Self::DueDate,
            Self::DueDate => Self::Title,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Description => "Description",
            Self::DueDate => "Due date",
        }
    }
}

/// Draft of a new todo typed into the add dialog.
#[derive(Debug, Clone, Default)]
pub struct TodoForm {
    pub title: String,
    pub description: String,
    pub due_date: String,
    pub field: FormField,
}

impl TodoForm {
    pub fn input_mut(&mut self) -> &mut String {
        match self.field {
            FormField::Title => &mut self.title,
            FormField::Description => &mut self.description,
            FormField::DueDate => &mut self.due_date,
        }
    }

    pub fn clear(&mut self) { *self = Self::default(); }

    /// A blank due date is left for the server to default.
    pub fn to_input(&self) -> Result<CreateTodo, String> {
        let title = self.title.trim();
        let description = self.description.trim();
        if title.is_empty() || description.is_empty() {
            return Err("Title and description are required".to_string());
        }
        let due = self.due_date.trim();
        let due_date = if due.is_empty() { None } else { Some(parse_due_date(due).map_err(|_| format!("Unrecognised due date `{due}`; use YYYY-MM-DD"))?) };
        Ok(CreateTodo {
            title: Some(title.to_string()),
            description: Some(description.to_string()),
            is_complete: None,
            due_date,
        })
    }
}
