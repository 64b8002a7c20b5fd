use std::time::Duration;

use anyhow::Result;
use crossterm::{event::{self, Event, KeyCode, KeyEventKind}, execute, terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::{backend::CrosstermBackend, Frame, Terminal, widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap}, layout::{Constraint, Direction, Layout, Rect}, style::{Color, Modifier, Style}};

use todo_api::client::{ApiClient, view::{FormField, Phase, TodoForm, TodoView, CREATE_FAILED, UPDATE_FAILED}};

type Term = Terminal<CrosstermBackend<std::io::Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let client = ApiClient::from_env();

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let res = run_app(&mut terminal, client).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

struct App {
    client: ApiClient,
    view: TodoView,
    form: TodoForm,
    list_state: ListState,
}

impl App {
    /// Shows the loading screen, then blocks on the list call.
    async fn reload(&mut self, terminal: &mut Term) -> Result<()> {
        self.view.begin_load();
        terminal.draw(|f| draw(f, self))?;
        match self.client.list(None).await {
            Ok(todos) => self.view.load_succeeded(todos),
            Err(e) => self.view.load_failed(e.user_message()),
        }
        Ok(())
    }

    async fn complete_selected(&mut self, terminal: &mut Term) -> Result<()> {
        let Some(id) = self.view.selected_todo().map(|t| t.id.clone()) else { return Ok(()) };
        match self.client.complete(&id).await {
            Ok(_) => self.reload(terminal).await,
            Err(_) => {
                self.view.action_failed(UPDATE_FAILED);
                Ok(())
            }
        }
    }

    async fn submit_form(&mut self, terminal: &mut Term) -> Result<()> {
        let input = match self.form.to_input() {
            Ok(input) => input,
            Err(message) => {
                self.view.action_failed(&message);
                return Ok(());
            }
        };
        match self.client.create(&input).await {
            Ok(_) => {
                self.reload(terminal).await?;
                self.view.close_modal();
                self.form.clear();
            }
            Err(_) => self.view.action_failed(CREATE_FAILED),
        }
        Ok(())
    }
}

async fn run_app(terminal: &mut Term, client: ApiClient) -> Result<()> {
    let mut app = App { client, view: TodoView::default(), form: TodoForm::default(), list_state: ListState::default() };
    app.reload(terminal).await?;

    loop {
        terminal.draw(|f| draw(f, &mut app))?;

        if !event::poll(Duration::from_millis(200))? { continue; }
        let Event::Key(key) = event::read()? else { continue };
        // Only act on key presses; ignore repeats and releases to prevent duplicate input
        if key.kind != KeyEventKind::Press { continue; }

        if app.view.alert.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) { app.view.dismiss_alert(); }
            continue;
        }

        if app.view.modal_open {
            match key.code {
                KeyCode::Esc => { app.view.close_modal(); app.form.clear(); }
                KeyCode::Enter => app.submit_form(terminal).await?,
                KeyCode::Tab => app.form.field = app.form.field.next(),
                KeyCode::Backspace => { app.form.input_mut().pop(); }
                KeyCode::Char(c) => app.form.input_mut().push(c),
                _ => {}
            }
            continue;
        }

        let phase = app.view.phase.clone();
        match (phase, key.code) {
            (_, KeyCode::Char('q')) => break,
            (Phase::Error(_), KeyCode::Char('r')) | (Phase::Ready, KeyCode::Char('r')) => app.reload(terminal).await?,
            (Phase::Ready, KeyCode::Up) => app.view.select_previous(),
            (Phase::Ready, KeyCode::Down) => app.view.select_next(),
            (Phase::Ready, KeyCode::Enter | KeyCode::Char(' ')) => app.complete_selected(terminal).await?,
            (Phase::Ready, KeyCode::Char('n')) => app.view.open_modal(),
            _ => {}
        }
    }
    Ok(())
}

fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(3)])
        .split(f.size());

    let title = match app.view.phase {
        Phase::Ready => format!("Todos [{}]", app.view.todos.len()),
        _ => "Todos".to_string(),
    };
    let header = Paragraph::new("Enter/Space: complete, n: new, r: reload, q: quit")
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(header, chunks[0]);

    match &app.view.phase {
        Phase::Loading => {
            let body = Paragraph::new("Loading todos...").block(Block::default().borders(Borders::ALL));
            f.render_widget(body, chunks[1]);
        }
        Phase::Error(message) => {
            let text = format!("Connection Error\n\n{}\n\nAPI URL: {}\n\nPress r to retry", message, app.client.base_url());
            let body = Paragraph::new(text)
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title("error"));
            f.render_widget(body, chunks[1]);
        }
        Phase::Ready if app.view.todos.is_empty() => {
            let body = Paragraph::new("No todos yet!\n\nStart by adding your first todo item (press n).")
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(body, chunks[1]);
        }
        Phase::Ready => {
            let middle = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(chunks[1]);

            let items: Vec<ListItem> = app.view.todos.iter().map(|t| {
                let mark = if t.is_complete { "[x]" } else { "[ ]" };
                let style = if t.is_complete { Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT) } else { Style::default() };
                ListItem::new(format!("{} {}  (due {})", mark, t.title, t.due_date.format("%Y-%m-%d"))).style(style)
            }).collect();
            app.list_state.select(Some(app.view.selected));
            let list = List::new(items)
                .block(Block::default().borders(Borders::ALL).title("items"))
                .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD | Modifier::REVERSED))
                .highlight_symbol(">> ");
            f.render_stateful_widget(list, middle[0], &mut app.list_state);

            let detail = app.view.selected_todo().map(|t| {
                format!("Title:\n{}\n\nStatus: {}\nDue: {}\n\nDescription:\n{}", t.title, if t.is_complete { "Done" } else { "Pending" }, t.due_date.format("%Y-%m-%d %H:%M UTC"), t.description)
            }).unwrap_or_default();
            let details = Paragraph::new(detail).wrap(Wrap { trim: false }).block(Block::default().borders(Borders::ALL).title("details"));
            f.render_widget(details, middle[1]);
        }
    }

    let footer = Paragraph::new(format!("TODO_API_URL={}", app.client.base_url()))
        .block(Block::default().borders(Borders::ALL).title("info"));
    f.render_widget(footer, chunks[2]);

    if app.view.modal_open {
        let area = centered(f.size(), 60, 11);
        let form = &app.form;
        let line = |field: FormField, value: &str| {
            let cursor = if form.field == field { "_" } else { "" };
            format!("{}: {}{}", field.label(), value, cursor)
        };
        let text = [
            line(FormField::Title, &form.title),
            line(FormField::Description, &form.description),
            line(FormField::DueDate, &form.due_date),
            String::new(),
            "Due date: YYYY-MM-DD, blank for now".to_string(),
            "Tab: next field, Enter: save, Esc: cancel".to_string(),
        ]
        .join("\n");
        f.render_widget(Clear, area);
        f.render_widget(Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Add New Todo")), area);
    }

    if let Some(alert) = &app.view.alert {
        let area = centered(f.size(), 50, 5);
        f.render_widget(Clear, area);
        let popup = Paragraph::new(format!("{}\n(Enter to dismiss)", alert))
            .style(Style::default().fg(Color::Yellow))
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("alert"));
        f.render_widget(popup, area);
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect { x: area.x + (area.width - width) / 2, y: area.y + (area.height - height) / 2, width, height }
}
