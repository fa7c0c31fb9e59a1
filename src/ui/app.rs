use crate::api::{ApiError, BridgeClient};
use crate::config::AppConfig;
use crate::event::{AppEvent, EventSender, Transfer};
use crate::notify::{Notification, Notifications};
use crate::ops;
use crate::progress::{Progress, render_progress_bar};
use crate::table::{EMPTY_PLACEHOLDER, Row, TableView};
use crate::ui::centered_rect;
use chrono::{DateTime, Local};
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::{
    DefaultTerminal,
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Clear, Paragraph, Row as TableRow, Table, TableState, Widget, Wrap},
};
use std::io;
use std::path::PathBuf;
use std::time::Instant;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::{Duration, interval};
use tracing::{info, warn};

// Redraw often enough for notifications to disappear on time
const TICK: Duration = Duration::from_millis(250);

const SUCCESS_BG: Color = Color::Rgb(6, 78, 59);
const FAILURE_BG: Color = Color::Rgb(59, 10, 10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    BaseUrl,
    Database,
    File,
    RelocateFrom,
    RelocateTo,
    Filter,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::BaseUrl,
        Field::Database,
        Field::File,
        Field::RelocateFrom,
        Field::RelocateTo,
        Field::Filter,
    ];

    fn label(self) -> &'static str {
        match self {
            Field::BaseUrl => "Base URL",
            Field::Database => "Database",
            Field::File => "Upload file",
            Field::RelocateFrom => "Relocate from",
            Field::RelocateTo => "Relocate to",
            Field::Filter => "Filter",
        }
    }

    fn index(self) -> usize {
        Field::ALL.iter().position(|f| *f == self).unwrap_or(0)
    }

    fn next(self) -> Self {
        Field::ALL[(self.index() + 1) % Field::ALL.len()]
    }

    fn previous(self) -> Self {
        Field::ALL[(self.index() + Field::ALL.len() - 1) % Field::ALL.len()]
    }
}

#[derive(Debug)]
pub struct App {
    should_exit: bool,
    show_help: bool,
    config: AppConfig,
    config_path: PathBuf,
    client: BridgeClient,
    tx: EventSender,
    rx: Option<UnboundedReceiver<AppEvent>>,
    focus: Field,
    base_input: String,
    db_input: String,
    file_input: String,
    relocate_from: String,
    relocate_to: String,
    filter_input: String,
    upload: Progress,
    download: Progress,
    ops_info: Option<(String, DateTime<Local>)>,
    notifications: Notifications,
    rows: Vec<Row>,
    table: TableView,
    table_state: TableState,
    schema: Vec<String>,
    health: Option<String>,
}

impl App {
    pub fn new(config: AppConfig, config_path: PathBuf) -> Result<Self, ApiError> {
        let client = BridgeClient::new(&config.base_url(), &config.headers)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let db_input = config.databases.first().cloned().unwrap_or_default();

        Ok(Self {
            should_exit: false,
            show_help: false,
            base_input: config.base_url(),
            config,
            config_path,
            client,
            tx,
            rx: Some(rx),
            focus: Field::BaseUrl,
            db_input,
            file_input: String::new(),
            relocate_from: String::new(),
            relocate_to: String::new(),
            filter_input: String::new(),
            upload: Progress::idle(),
            download: Progress::idle(),
            ops_info: None,
            notifications: Notifications::default(),
            rows: vec![],
            table: TableView::describe(&[]),
            table_state: TableState::default(),
            schema: vec![],
            health: None,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn client(&self) -> &BridgeClient {
        &self.client
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn table(&self) -> &TableView {
        &self.table
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn progress(&self, transfer: Transfer) -> Progress {
        match transfer {
            Transfer::Upload => self.upload,
            Transfer::Download => self.download,
        }
    }

    pub fn ops_info(&self) -> Option<&str> {
        self.ops_info.as_ref().map(|(text, _)| text.as_str())
    }

    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    pub fn set_input(&mut self, field: Field, value: &str) {
        *self.input_mut(field) = value.to_string();
    }

    pub fn input(&self, field: Field) -> &str {
        match field {
            Field::BaseUrl => &self.base_input,
            Field::Database => &self.db_input,
            Field::File => &self.file_input,
            Field::RelocateFrom => &self.relocate_from,
            Field::RelocateTo => &self.relocate_to,
            Field::Filter => &self.filter_input,
        }
    }

    fn input_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::BaseUrl => &mut self.base_input,
            Field::Database => &mut self.db_input,
            Field::File => &mut self.file_input,
            Field::RelocateFrom => &mut self.relocate_from,
            Field::RelocateTo => &mut self.relocate_to,
            Field::Filter => &mut self.filter_input,
        }
    }

    /// Operation results land here and nowhere else. The row set and the table
    /// built from it are only ever replaced together.
    pub fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::Notify(n) => self.notifications.push(n),
            AppEvent::Progress(Transfer::Upload, p) => self.upload = p,
            AppEvent::Progress(Transfer::Download, p) => self.download = p,
            AppEvent::OpsInfo(text) => self.ops_info = Some((text, Local::now())),
            AppEvent::DataLoaded(rows) => {
                self.table = TableView::describe(&rows);
                self.rows = rows;
                self.table_state
                    .select(if self.rows.is_empty() { None } else { Some(0) });
            }
            AppEvent::SchemaLoaded(tables) => self.schema = tables,
            AppEvent::Health(status) => self.health = Some(status),
        }
    }

    /// Applies whatever the running operations reported so far.
    pub fn drain_events(&mut self) -> usize {
        let mut pending = vec![];
        if let Some(rx) = self.rx.as_mut() {
            while let Ok(event) = rx.try_recv() {
                pending.push(event);
            }
        }
        let count = pending.len();
        for event in pending {
            self.apply(event);
        }
        count
    }

    // Main app logic
    pub async fn run(&mut self, terminal: &mut DefaultTerminal) -> io::Result<()> {
        let Some(mut rx) = self.rx.take() else {
            return Err(io::Error::other("app is already running"));
        };
        let mut ticker = interval(TICK);
        let mut events = EventStream::new();

        info!(base_url = %self.client.base_url(), "control panel started");
        self.start_health_check();

        let result = loop {
            if let Err(e) = terminal.draw(|f| f.render_widget(&*self, f.area())) {
                break Err(e);
            }

            tokio::select! {
                _ = ticker.tick() => {
                    self.notifications.prune(Instant::now());
                }
                Some(event) = rx.recv() => self.apply(event),
                maybe_event = events.next() => match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        self.handle_key_event(key);
                    }
                    Some(Err(e)) => break Err(e),
                    None => break Ok(()),
                    _ => {}
                },
            }

            // If <Esc> is pressed break loop and exit app
            if self.should_exit {
                break Ok(());
            }
        };

        self.rx = Some(rx);
        result
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) {
        if self.show_help {
            if matches!(key.code, KeyCode::Esc | KeyCode::F(1) | KeyCode::Char('q')) {
                self.show_help = false;
            }
            return;
        }

        // AltGr arrives as CONTROL | ALT and produces plain characters
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && !key.modifiers.contains(KeyModifiers::ALT)
        {
            match key.code {
                KeyCode::Char('s') => self.save_base_url(),
                KeyCode::Char('u') => self.start_upload(),
                KeyCode::Char('d') => self.start_download(),
                KeyCode::Char('r') => self.start_relocate(),
                KeyCode::Char('y') => self.start_sync(),
                KeyCode::Char('l') => self.start_load_data(),
                KeyCode::Char('e') => {
                    self.export();
                }
                KeyCode::Char('t') => self.start_load_schema(),
                KeyCode::Char('c') => self.exit(),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.exit(),
            KeyCode::F(1) => self.show_help = true,
            KeyCode::F(5) => self.start_health_check(),
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),
            KeyCode::Down => self.next_row(),
            KeyCode::Up => self.previous_row(),
            KeyCode::Left if self.focus == Field::Database => self.cycle_database(false),
            KeyCode::Right if self.focus == Field::Database => self.cycle_database(true),
            KeyCode::Enter => match self.focus {
                Field::BaseUrl => self.save_base_url(),
                Field::Filter => self.start_load_data(),
                other => self.focus = other.next(),
            },
            KeyCode::Backspace => {
                self.input_mut(self.focus).pop();
            }
            KeyCode::Char(c) => self.input_mut(self.focus).push(c),
            // Drop every other keypresses
            _ => {}
        }
    }

    /// Persists the base URL field and points the client at it.
    pub fn save_base_url(&mut self) {
        self.config.set_base_url(&self.base_input);
        if let Err(e) = self.config.save_to(&self.config_path) {
            warn!(error = %e, "saving config failed");
            self.notifications
                .push(Notification::failure(format!("Could not save base URL: {e}")));
            return;
        }

        match BridgeClient::new(&self.config.base_url(), &self.config.headers) {
            Ok(client) => self.client = client,
            Err(e) => {
                self.notifications.push(Notification::failure(e.to_string()));
                return;
            }
        }

        self.base_input = self.config.base_url();
        info!(base_url = %self.base_input, "base url saved");
        self.notifications
            .push(Notification::success("Base URL saved"));
    }

    fn db(&self) -> String {
        self.db_input.trim().to_string()
    }

    fn cycle_database(&mut self, forward: bool) {
        let dbs = &self.config.databases;
        if dbs.is_empty() {
            return;
        }
        let next = match dbs.iter().position(|d| *d == self.db_input) {
            Some(i) if forward => (i + 1) % dbs.len(),
            Some(i) => (i + dbs.len() - 1) % dbs.len(),
            None => 0,
        };
        self.db_input = dbs[next].clone();
    }

    pub fn start_upload(&self) {
        let (client, tx) = (self.client.clone(), self.tx.clone());
        let file = Some(self.file_input.trim())
            .filter(|f| !f.is_empty())
            .map(PathBuf::from);
        let db = self.db();
        tokio::spawn(async move {
            ops::upload(&client, &tx, file.as_deref(), &db).await;
        });
    }

    pub fn start_download(&self) {
        let (client, tx) = (self.client.clone(), self.tx.clone());
        let db = self.db();
        let dir = self.config.export_dir.clone();
        tokio::spawn(async move {
            ops::download(&client, &tx, &db, &dir).await;
        });
    }

    pub fn start_relocate(&self) {
        let (client, tx) = (self.client.clone(), self.tx.clone());
        let (from, to) = (self.relocate_from.clone(), self.relocate_to.clone());
        tokio::spawn(async move {
            ops::relocate(&client, &tx, &from, &to).await;
        });
    }

    pub fn start_sync(&self) {
        let (client, tx) = (self.client.clone(), self.tx.clone());
        let db = self.db();
        tokio::spawn(async move {
            ops::sync(&client, &tx, &db).await;
        });
    }

    pub fn start_load_data(&self) {
        let (client, tx) = (self.client.clone(), self.tx.clone());
        let db = self.db();
        let filter = self.filter_input.trim().to_string();
        tokio::spawn(async move {
            let filter = Some(filter.as_str()).filter(|f| !f.is_empty());
            ops::load_data(&client, &tx, &db, filter).await;
        });
    }

    pub fn start_load_schema(&self) {
        let (client, tx) = (self.client.clone(), self.tx.clone());
        let db = self.db();
        tokio::spawn(async move {
            ops::load_schema(&client, &tx, &db).await;
        });
    }

    pub fn start_health_check(&self) {
        let (client, tx) = (self.client.clone(), self.tx.clone());
        tokio::spawn(async move {
            ops::check_health(&client, &tx).await;
        });
    }

    /// Writes the rows currently on screen as CSV.
    pub fn export(&self) -> Option<PathBuf> {
        ops::export(&self.tx, &self.rows, &self.config.export_dir)
    }

    // Next row
    pub fn next_row(&mut self) {
        let item_count = self.rows.len();
        if item_count == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) => (i + 1) % item_count,
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    // Previous row
    pub fn previous_row(&mut self) {
        let item_count = self.rows.len();
        if item_count == 0 {
            return;
        }
        let i = match self.table_state.selected() {
            Some(i) => (i + item_count - 1) % item_count,
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    fn exit(&mut self) {
        self.should_exit = true;
    }

    fn render_inputs(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title(Line::from(" dbtui - Database Control Panel ".bold().blue()))
            .title(
                Line::from(format!(" active: {} ", self.client.base_url()))
                    .right_aligned()
                    .fg(Color::Gray),
            )
            .border_set(border::ROUNDED);

        let lines = Field::ALL
            .iter()
            .map(|field| {
                let active = *field == self.focus;
                let mut value = self.input(*field).to_string();
                if *field == Field::Database {
                    value = format!("‹ {value} ›");
                }
                if active {
                    value.push('▏');
                }
                let label = Span::styled(
                    format!(" {:<14}: ", field.label()),
                    if active {
                        Style::default().fg(Color::Yellow).bold()
                    } else {
                        Style::default().fg(Color::Gray)
                    },
                );
                Line::from(vec![label, Span::raw(value)])
            })
            .collect::<Vec<_>>();

        Paragraph::new(lines).block(block).render(area, buf);
    }

    fn render_transfers(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title(" Transfers ".bold().blue())
            .border_set(border::ROUNDED);
        let inner = block.inner(area);
        block.render(area, buf);

        // label column + brackets
        let width = (inner.width as usize).saturating_sub(14);
        let lines = [
            ("Upload", self.upload),
            ("Download", self.download),
        ]
        .into_iter()
        .map(|(name, progress)| {
            let bar = render_progress_bar(progress.fill_percent(), width, &progress.label());
            let style = if progress.is_idle() {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::Green)
            };
            Line::from(vec![
                Span::raw(format!(" {name:<10} ")),
                Span::styled(bar, style),
            ])
        })
        .collect::<Vec<_>>();

        Paragraph::new(lines).render(inner, buf);
    }

    fn render_status(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title(" Status ".bold().blue())
            .border_set(border::ROUNDED);

        let ops = match &self.ops_info {
            Some((text, at)) => format!("{text}  ({})", at.format("%H:%M:%S")),
            None => "-".to_string(),
        };
        let tables = if self.schema.is_empty() {
            "-".to_string()
        } else {
            self.schema.join(", ")
        };
        let text = Text::from(vec![
            Line::from(format!(" Last operation : {ops}")),
            Line::from(format!(
                " Backend        : {}",
                self.health.as_deref().unwrap_or("-")
            )),
            Line::from(format!(" Tables         : {tables}")),
        ]);

        Paragraph::new(text)
            .block(block)
            .wrap(Wrap { trim: true })
            .render(area, buf);
    }

    fn render_table(&self, area: Rect, buf: &mut Buffer) {
        let instructions = Line::from(
            " Help: <F1> | Next field: <Tab> | Scroll: <↑/↓> | Quit: <Esc> "
                .bold()
                .yellow(),
        );
        let block = Block::bordered()
            .title(Line::from(" Data ".bold().blue()))
            .title(Line::from(format!(" {} ", self.table.stats)).right_aligned())
            .title_bottom(instructions.centered())
            .border_set(border::ROUNDED);

        if self.table.is_empty() {
            Paragraph::new(Line::from(EMPTY_PLACEHOLDER.fg(Color::DarkGray)))
                .block(block)
                .render(area, buf);
            return;
        }

        let table_height = area.height.saturating_sub(3) as usize; // 3 lines for header+block borders
        let total_items = self.table.cells.len();
        let selected_idx = self.table_state.selected().unwrap_or(0);

        // Calculate the start and end indexes for the visible window
        let start = if table_height > 0 && selected_idx >= table_height {
            selected_idx + 1 - table_height
        } else {
            0
        };
        let end = (start + table_height).min(total_items);

        let rows = self.table.cells[start..end]
            .iter()
            .enumerate()
            .map(|(i, cells)| {
                let row = TableRow::new(cells.clone());
                if Some(start + i) == self.table_state.selected() {
                    row.style(Style::default().bg(Color::LightBlue).fg(Color::DarkGray).bold())
                } else {
                    row
                }
            });

        let widths = vec![Constraint::Fill(1); self.table.columns.len()];
        let header = TableRow::new(self.table.columns.clone())
            .style(Style::default().fg(Color::White).bg(Color::DarkGray).bold());

        Table::new(rows, widths)
            .header(header)
            .block(block)
            .column_spacing(1)
            .render(area, buf);
    }

    fn render_notifications(&self, area: Rect, buf: &mut Buffer) {
        // Newest at the bottom, stacked upwards from the lower right corner
        let mut bottom = area.bottom().saturating_sub(1);
        for n in self.notifications.active().iter().rev() {
            let width = (n.message.chars().count() as u16 + 4)
                .clamp(10, 60)
                .min(area.width);
            let height = 3;
            if bottom < area.top() + height {
                break;
            }
            let rect = Rect {
                x: area.right().saturating_sub(width + 2).max(area.left()),
                y: bottom - height,
                width,
                height,
            };
            let bg = if n.success { SUCCESS_BG } else { FAILURE_BG };
            Clear.render(rect, buf);
            Paragraph::new(n.message.as_str())
                .block(Block::bordered().border_set(border::ROUNDED).fg(Color::DarkGray))
                .style(Style::default().bg(bg).fg(Color::White))
                .render(rect, buf);
            bottom -= height;
        }
    }

    fn render_help(&self, area: Rect, buf: &mut Buffer) {
        let popup_area = centered_rect(60, 70, area);
        let help_text = Text::from(vec![
            Line::from(" Shortcuts:"),
            Line::from(""),
            Line::from("  Tab / Shift-Tab - Next / previous field"),
            Line::from("  ← / →           - Pick database (on the database field)"),
            Line::from("  Enter           - Save base URL / load data / next field"),
            Line::from("  Ctrl-s          - Save base URL"),
            Line::from("  Ctrl-u          - Upload the selected file"),
            Line::from("  Ctrl-d          - Download the database export"),
            Line::from("  Ctrl-r          - Relocate"),
            Line::from("  Ctrl-y          - Sync"),
            Line::from("  Ctrl-l          - Load data"),
            Line::from("  Ctrl-e          - Export loaded data as CSV"),
            Line::from("  Ctrl-t          - Load table list"),
            Line::from("  F5              - Check backend health"),
            Line::from("  ↑ / ↓           - Scroll the data table"),
            Line::from("  Esc             - Quit (or close this help)"),
            Line::from(""),
            Line::from(format!(
                "  Downloads and exports go to {}",
                self.config.export_dir.display()
            )),
        ]);

        let help_block = Block::bordered()
            .title(Line::from(" Help ".bold()))
            .border_set(border::THICK)
            .style(Style::default().bg(Color::Black).fg(Color::White))
            .title_bottom(Line::from(" Close this panel with <Esc> ").alignment(Alignment::Center));

        Clear.render(popup_area, buf);
        Paragraph::new(help_text)
            .block(help_block)
            .wrap(Wrap { trim: false })
            .render(popup_area, buf);
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [inputs, transfers, status, table] = Layout::vertical([
            Constraint::Length(Field::ALL.len() as u16 + 2),
            Constraint::Length(4),
            Constraint::Length(5),
            Constraint::Min(5),
        ])
        .areas(area);

        self.render_inputs(inputs, buf);
        self.render_transfers(transfers, buf);
        self.render_status(status, buf);
        self.render_table(table, buf);
        self.render_notifications(area, buf);

        if self.show_help {
            self.render_help(area, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_app(dir: &std::path::Path) -> App {
        let config = AppConfig {
            export_dir: dir.to_path_buf(),
            ..AppConfig::default()
        };
        App::new(config, dir.join("config.toml")).unwrap()
    }

    fn rows(value: serde_json::Value) -> Vec<Row> {
        serde_json::from_value(value).unwrap()
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_data_loaded_replaces_rows_and_table() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        assert_eq!(app.table().stats, "0 rows");

        app.apply(AppEvent::DataLoaded(rows(json!([{"a": 1, "b": 2}, {"a": 3}]))));
        assert_eq!(app.rows().len(), 2);
        assert_eq!(app.table().columns, vec!["a", "b"]);
        assert_eq!(app.table().stats, "2 rows · 2 columns");

        // A failed load only notifies, the table stays
        app.apply(AppEvent::Notify(Notification::failure("Failed to load data")));
        assert_eq!(app.rows().len(), 2);
    }

    #[test]
    fn test_export_uses_last_loaded_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());

        assert!(app.export().is_none());
        app.drain_events();
        assert!(!app.notifications().active()[0].success);

        app.apply(AppEvent::DataLoaded(rows(json!([{"a": 1, "b": 2}, {"a": 3}]))));
        let path = app.export().unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "a,b\n1,2\n3,\"\"");
    }

    #[test]
    fn test_ctrl_e_writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.apply(AppEvent::DataLoaded(rows(json!([{"id": 7, "name": "sensor-a"}]))));

        app.handle_key_event(KeyEvent::new(KeyCode::Char('e'), KeyModifiers::CONTROL));

        let csv = std::fs::read_to_string(dir.path().join(crate::table::EXPORT_FILE_NAME)).unwrap();
        assert_eq!(csv, "id,name\n7,\"sensor-a\"");
        app.drain_events();
        assert!(app.notifications().active()[0].success);
    }

    #[test]
    fn test_altgr_characters_are_typed() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.set_input(Field::BaseUrl, "");
        let altgr = KeyModifiers::CONTROL | KeyModifiers::ALT;
        for c in ['@', '\\', '{', '[', 'e'] {
            app.handle_key_event(KeyEvent::new(KeyCode::Char(c), altgr));
        }
        assert_eq!(app.input(Field::BaseUrl), "@\\{[e");
        assert!(!dir.path().join(crate::table::EXPORT_FILE_NAME).exists());
        assert!(!app.should_exit());
    }

    #[test]
    fn test_progress_events() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.apply(AppEvent::Progress(Transfer::Upload, Progress::new(10, Some(20))));
        assert_eq!(app.progress(Transfer::Upload).percent(), 50);
        assert!(app.progress(Transfer::Download).is_idle());
        app.apply(AppEvent::Progress(Transfer::Upload, Progress::idle()));
        assert!(app.progress(Transfer::Upload).is_idle());
    }

    #[test]
    fn test_save_empty_base_url_stores_origin() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.set_input(Field::BaseUrl, "   ");
        app.save_base_url();

        let saved = AppConfig::load_from(&dir.path().join("config.toml"))
            .unwrap()
            .unwrap();
        assert_eq!(saved.base_url.as_deref(), Some(crate::config::DEFAULT_ORIGIN));
        assert_eq!(app.input(Field::BaseUrl), crate::config::DEFAULT_ORIGIN);
        assert!(app.notifications().active()[0].success);
    }

    #[test]
    fn test_save_base_url_repoints_client() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.set_input(Field::BaseUrl, " http://10.1.2.3:9000/ ");
        app.handle_key_event(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        assert_eq!(app.config().base_url(), "http://10.1.2.3:9000/");
        assert_eq!(app.client().base_url(), "http://10.1.2.3:9000");
    }

    #[test]
    fn test_typing_and_focus() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.handle_key_event(key(KeyCode::Tab));
        app.handle_key_event(key(KeyCode::Tab));
        for c in "a.db".chars() {
            app.handle_key_event(key(KeyCode::Char(c)));
        }
        app.handle_key_event(key(KeyCode::Backspace));
        assert_eq!(app.input(Field::File), "a.d");

        app.handle_key_event(key(KeyCode::BackTab));
        assert_eq!(app.input(Field::Database), "sqlite");
        app.handle_key_event(key(KeyCode::Right));
        assert_eq!(app.input(Field::Database), "mariadb");
        app.handle_key_event(key(KeyCode::Right));
        assert_eq!(app.input(Field::Database), "sqlite");

        app.handle_key_event(key(KeyCode::Esc));
        assert!(app.should_exit());
    }

    #[test]
    fn test_render_does_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.apply(AppEvent::DataLoaded(rows(json!([{"a": 1, "b": "x"}]))));
        app.apply(AppEvent::OpsInfo("Sync: 200 done".into()));
        app.apply(AppEvent::Notify(Notification::success("Data loaded")));
        app.show_help = true;

        for (w, h) in [(120, 40), (20, 10), (1, 1)] {
            let area = Rect::new(0, 0, w, h);
            let mut buf = Buffer::empty(area);
            (&app).render(area, &mut buf);
        }
    }
}
