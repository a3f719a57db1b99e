//! Application state for the TUI.
//!
//! `App` holds what the screen shows: panel focus, the connection form, the
//! question input and the chat entries. Key handling returns an [`Action`]
//! when the session has work to do; the runner performs it and feeds the
//! outcome back through `apply_*`.

use crate::chat::{Rendered, TurnOutcome};
use crate::config::Configuration;
use crate::db::{DatabaseBackend, RowSet};
use crate::error::Result;
use crate::session::{Readiness, SessionContext};
use crate::transcript::Role;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Which panel currently has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Form,
    Chat,
    Input,
}

impl Focus {
    /// Cycles to the next focus panel.
    pub fn next(self) -> Self {
        match self {
            Self::Form => Self::Chat,
            Self::Chat => Self::Input,
            Self::Input => Self::Form,
        }
    }

    /// Cycles to the previous focus panel.
    pub fn prev(self) -> Self {
        match self {
            Self::Form => Self::Input,
            Self::Chat => Self::Form,
            Self::Input => Self::Chat,
        }
    }
}

/// An entry in the chat panel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEntry {
    Human(String),
    Ai(String),
    /// The statement the model produced, shown as a code block.
    Sql(String),
    Rows(RowSet),
    Affected(u64),
    /// The statement failed; carries the model's explanation.
    QueryFailed(String),
    Error(String),
}

impl ChatEntry {
    /// Returns the label shown above the entry, if it has one.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            Self::Human(_) => Some("You"),
            Self::Ai(_) | Self::QueryFailed(_) => Some("SQLFlow"),
            Self::Sql(_) => Some("Generated SQL"),
            Self::Rows(_) | Self::Affected(_) | Self::Error(_) => None,
        }
    }
}

/// Entries for one finished turn, below the question.
pub fn turn_entries(outcome: &TurnOutcome) -> Vec<ChatEntry> {
    let mut entries = Vec::new();
    if let Some(sql) = &outcome.sql {
        entries.push(ChatEntry::Sql(sql.clone()));
    }
    entries.push(match &outcome.rendered {
        Rendered::Rows(rows) => ChatEntry::Rows(rows.clone()),
        Rendered::Affected(n) => ChatEntry::Affected(*n),
        Rendered::Explanation { explanation, .. } => ChatEntry::QueryFailed(explanation.clone()),
    });
    entries
}

/// Input state for text editing. The cursor counts characters.
#[derive(Debug, Default, Clone)]
pub struct InputState {
    /// Current input text.
    pub text: String,
    /// Cursor position (character index).
    pub cursor: usize,
}

impl InputState {
    /// Creates a new empty input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an input holding `text` with the cursor at the end.
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    fn byte_index(&self, cursor: usize) -> usize {
        self.text
            .char_indices()
            .nth(cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Inserts a character at the cursor position.
    pub fn insert(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.text.insert(at, c);
        self.cursor += 1;
    }

    /// Deletes the character before the cursor (backspace).
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    /// Deletes the character at the cursor (delete key).
    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index(self.cursor);
            self.text.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_len();
    }

    /// Clears the input and returns the previous text.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Applies an editing key. Returns false if the key is not an editing key.
    fn edit(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => self.insert(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Home => self.move_home(),
            KeyCode::End => self.move_end(),
            _ => return false,
        }
        true
    }
}

/// A field of the connection form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Host,
    Port,
    User,
    Password,
    Database,
    ApiKey,
}

impl FormField {
    pub const ALL: [FormField; 6] = [
        Self::Host,
        Self::Port,
        Self::User,
        Self::Password,
        Self::Database,
        Self::ApiKey,
    ];

    pub fn label(&self, backend: DatabaseBackend) -> &'static str {
        match self {
            Self::Host => "Host",
            Self::Port => "Port",
            Self::User => "User",
            Self::Password => "Password",
            Self::Database if backend == DatabaseBackend::Sqlite => "Database file",
            Self::Database => "Database",
            Self::ApiKey => "API key",
        }
    }

    /// Secret fields are masked on screen.
    pub fn is_secret(&self) -> bool {
        matches!(self, Self::Password | Self::ApiKey)
    }
}

/// Result of the last Connect press, shown under the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormStatus {
    Connected,
    Failed,
}

/// The sidebar form the user edits before connecting.
#[derive(Debug, Clone)]
pub struct ConfigForm {
    pub backend: DatabaseBackend,
    fields: Vec<InputState>,
    pub selected: usize,
    pub status: Option<FormStatus>,
}

impl ConfigForm {
    /// Prefills the form from a configuration.
    pub fn from_config(config: &Configuration) -> Self {
        let fields = FormField::ALL
            .iter()
            .map(|field| {
                InputState::with_text(match field {
                    FormField::Host => config.host.as_str(),
                    FormField::Port => config.port.as_str(),
                    FormField::User => config.user.as_str(),
                    FormField::Password => config.password.as_str(),
                    FormField::Database => config.database.as_str(),
                    FormField::ApiKey => config.api_key.as_str(),
                })
            })
            .collect();
        Self {
            backend: config.backend,
            fields,
            selected: 0,
            status: None,
        }
    }

    /// Builds the configuration the form currently describes.
    pub fn to_config(&self) -> Configuration {
        Configuration {
            backend: self.backend,
            host: self.value(FormField::Host).to_string(),
            port: self.value(FormField::Port).to_string(),
            user: self.value(FormField::User).to_string(),
            password: self.value(FormField::Password).to_string(),
            database: self.value(FormField::Database).to_string(),
            api_key: self.value(FormField::ApiKey).to_string(),
        }
    }

    fn index(field: FormField) -> usize {
        FormField::ALL
            .iter()
            .position(|f| *f == field)
            .unwrap_or_default()
    }

    pub fn value(&self, field: FormField) -> &str {
        self.fields
            .get(Self::index(field))
            .map(|input| input.text.as_str())
            .unwrap_or_default()
    }

    /// Value as shown on screen, with secrets masked.
    pub fn display_value(&self, field: FormField) -> String {
        let value = self.value(field);
        if field.is_secret() {
            "•".repeat(value.chars().count())
        } else {
            value.to_string()
        }
    }

    pub fn selected_field(&self) -> FormField {
        FormField::ALL[self.selected.min(FormField::ALL.len() - 1)]
    }

    /// Cursor of the selected field, in characters.
    pub fn cursor(&self) -> usize {
        self.fields
            .get(self.selected)
            .map(|input| input.cursor)
            .unwrap_or_default()
    }

    pub fn select_next(&mut self) {
        self.selected = (self.selected + 1) % FormField::ALL.len();
    }

    pub fn select_prev(&mut self) {
        self.selected = (self.selected + FormField::ALL.len() - 1) % FormField::ALL.len();
    }

    fn edit(&mut self, key: KeyEvent) -> bool {
        match self.fields.get_mut(self.selected) {
            Some(input) => input.edit(key),
            None => false,
        }
    }
}

/// Work the runner performs against the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Connect(Configuration),
    Ask(String),
}

/// Main application state.
#[derive(Debug)]
pub struct App {
    /// Whether the application is running.
    pub running: bool,
    pub focus: Focus,
    pub form: ConfigForm,
    pub input: InputState,
    pub entries: Vec<ChatEntry>,
    /// Lines scrolled up from the bottom of the chat.
    pub chat_scroll: u16,
    pub readiness: Readiness,
    pub connection_info: String,
    pub is_connected: bool,
    /// Provider and model label for the header.
    pub model_info: String,
}

impl App {
    /// Creates the UI state for a session, showing its transcript so far.
    pub fn new(session: &SessionContext) -> Self {
        let entries = session
            .transcript()
            .messages()
            .iter()
            .map(|message| match message.role {
                Role::Human => ChatEntry::Human(message.content.clone()),
                Role::Ai => ChatEntry::Ai(message.content.clone()),
            })
            .collect();
        let llm = session.llm_config();
        let model_info = match &llm.model {
            Some(model) => format!("{}/{}", llm.provider, model),
            None => llm.provider.clone(),
        };

        let mut app = Self {
            running: true,
            focus: Focus::Form,
            form: ConfigForm::from_config(session.config()),
            input: InputState::new(),
            entries,
            chat_scroll: 0,
            readiness: Readiness::NeedsApiKey,
            connection_info: String::new(),
            is_connected: false,
            model_info,
        };
        app.refresh(session);
        app
    }

    /// Copies the session state the screen depends on.
    pub fn refresh(&mut self, session: &SessionContext) {
        self.readiness = session.readiness();
        self.is_connected = session.is_connected();
        self.connection_info = session.config().display_string();
    }

    pub fn add_entry(&mut self, entry: ChatEntry) {
        self.entries.push(entry);
        self.chat_scroll = 0;
    }

    /// Handles a key press. Returns the action to run, if any.
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
        {
            self.running = false;
            return None;
        }

        match key.code {
            KeyCode::Tab => {
                self.focus = self.focus.next();
                return None;
            }
            KeyCode::BackTab => {
                self.focus = self.focus.prev();
                return None;
            }
            _ => {}
        }

        match self.focus {
            Focus::Form => self.handle_form_key(key),
            Focus::Chat => {
                self.handle_chat_key(key);
                None
            }
            Focus::Input => self.handle_input_key(key),
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Option<Action> {
        match key.code {
            KeyCode::Up => self.form.select_prev(),
            KeyCode::Down => self.form.select_next(),
            KeyCode::Enter => return Some(Action::Connect(self.form.to_config())),
            _ => {
                self.form.edit(key);
            }
        }
        None
    }

    fn handle_chat_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.chat_scroll = self.chat_scroll.saturating_add(1),
            KeyCode::Down => self.chat_scroll = self.chat_scroll.saturating_sub(1),
            KeyCode::PageUp => self.chat_scroll = self.chat_scroll.saturating_add(10),
            KeyCode::PageDown => self.chat_scroll = self.chat_scroll.saturating_sub(10),
            KeyCode::End => self.chat_scroll = 0,
            _ => {}
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) -> Option<Action> {
        if key.code != KeyCode::Enter {
            self.input.edit(key);
            return None;
        }

        // The blocking warning stays on screen until the session is ready.
        if self.readiness != Readiness::Ready || self.input.text.trim().is_empty() {
            return None;
        }
        Some(Action::Ask(self.input.take().trim().to_string()))
    }

    /// Records the result of a Connect press.
    pub fn apply_connect(&mut self, result: Result<()>) {
        match result {
            Ok(()) => self.form.status = Some(FormStatus::Connected),
            Err(e) => {
                self.form.status = Some(FormStatus::Failed);
                self.add_entry(ChatEntry::Error(format!(
                    "Database connection failed: {}",
                    e.message()
                )));
            }
        }
    }

    /// Records the result of a chat turn for `question`.
    pub fn apply_turn(&mut self, question: &str, result: Result<Option<TurnOutcome>>) {
        match result {
            Ok(None) => {}
            Ok(Some(outcome)) => {
                self.add_entry(ChatEntry::Human(outcome.question.clone()));
                for entry in turn_entries(&outcome) {
                    self.add_entry(entry);
                }
            }
            // Rejected before the turn started; the transcript is untouched.
            Err(e) if self.readiness != Readiness::Ready => {
                self.add_entry(ChatEntry::Error(e.message().to_string()));
            }
            Err(e) => {
                self.add_entry(ChatEntry::Human(question.to_string()));
                self.add_entry(ChatEntry::Error(e.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MockDatabaseGateway, Value};
    use crate::error::SqlFlowError;
    use crate::llm::MockLlmClient;
    use crossterm::event::KeyEventKind;
    use pretty_assertions::assert_eq;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: crossterm::event::KeyEventState::NONE,
        }
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn session(api_key: &str) -> SessionContext {
        SessionContext::with_client(
            Configuration {
                api_key: api_key.to_string(),
                ..Default::default()
            },
            Box::new(MockDatabaseGateway::new()),
            MockLlmClient::new(),
        )
    }

    #[test]
    fn test_input_insert_and_backspace() {
        let mut input = InputState::new();
        input.insert('h');
        input.insert('i');
        assert_eq!(input.text, "hi");
        assert_eq!(input.cursor, 2);

        input.backspace();
        assert_eq!(input.text, "h");
        assert_eq!(input.cursor, 1);
    }

    #[test]
    fn test_input_handles_multibyte_chars() {
        let mut input = InputState::with_text("café");
        assert_eq!(input.cursor, 4);
        input.move_left();
        input.insert('x');
        assert_eq!(input.text, "cafxé");
        input.move_end();
        input.backspace();
        assert_eq!(input.text, "cafx");
    }

    #[test]
    fn test_input_delete_and_movement() {
        let mut input = InputState::with_text("hello");
        input.move_home();
        input.delete();
        assert_eq!(input.text, "ello");
        input.move_right();
        assert_eq!(input.cursor, 1);

        let text = input.take();
        assert_eq!(text, "ello");
        assert!(input.is_empty());
        assert_eq!(input.cursor, 0);
    }

    #[test]
    fn test_focus_cycle() {
        let focus = Focus::Form;
        assert_eq!(focus.next(), Focus::Chat);
        assert_eq!(focus.next().next(), Focus::Input);
        assert_eq!(focus.next().next().next(), Focus::Form);
        assert_eq!(focus.prev(), Focus::Input);
    }

    #[test]
    fn test_app_new_shows_greeting_and_prefilled_form() {
        let app = App::new(&session(""));
        assert!(app.running);
        assert_eq!(app.focus, Focus::Form);
        assert_eq!(app.entries.len(), 1);
        assert_eq!(app.form.value(FormField::Host), "localhost");
        assert_eq!(app.form.value(FormField::Port), "3306");
        assert_eq!(app.readiness, Readiness::NeedsApiKey);
    }

    #[test]
    fn test_form_edit_and_connect() {
        let mut app = App::new(&session(""));
        for _ in 0..5 {
            app.handle_key(key(KeyCode::Down));
        }
        assert_eq!(app.form.selected_field(), FormField::ApiKey);
        type_text(&mut app, "secret");
        assert_eq!(app.form.display_value(FormField::ApiKey), "••••••");

        match app.handle_key(key(KeyCode::Enter)) {
            Some(Action::Connect(config)) => {
                assert_eq!(config.api_key, "secret");
                assert_eq!(config.host, "localhost");
            }
            other => panic!("expected connect, got {other:?}"),
        }
    }

    #[test]
    fn test_enter_is_blocked_until_ready() {
        let mut app = App::new(&session(""));
        app.focus = Focus::Input;
        type_text(&mut app, "list tables");

        assert_eq!(app.handle_key(key(KeyCode::Enter)), None);
        assert_eq!(app.input.text, "list tables");

        app.readiness = Readiness::Ready;
        assert_eq!(
            app.handle_key(key(KeyCode::Enter)),
            Some(Action::Ask("list tables".to_string()))
        );
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_connect_failure_adds_chat_error() {
        let mut app = App::new(&session("key"));
        app.apply_connect(Err(SqlFlowError::connection("Access denied for user 'root'")));

        assert_eq!(app.form.status, Some(FormStatus::Failed));
        assert_eq!(
            app.entries.last(),
            Some(&ChatEntry::Error(
                "Database connection failed: Access denied for user 'root'".to_string()
            ))
        );
    }

    #[test]
    fn test_apply_turn_entries() {
        let mut app = App::new(&session("key"));
        let rows = RowSet::with_data(vec!["n".to_string()], vec![vec![Value::Int(1)]]);
        app.apply_turn(
            "count",
            Ok(Some(TurnOutcome {
                question: "count".to_string(),
                sql: Some("SELECT 1 AS n".to_string()),
                rendered: Rendered::Rows(rows.clone()),
            })),
        );

        assert_eq!(
            app.entries[1..].to_vec(),
            vec![
                ChatEntry::Human("count".to_string()),
                ChatEntry::Sql("SELECT 1 AS n".to_string()),
                ChatEntry::Rows(rows),
            ]
        );
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut app = App::new(&session(""));
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!app.running);
    }

    #[test]
    fn test_chat_scroll_reset_on_new_entry() {
        let mut app = App::new(&session(""));
        app.focus = Focus::Chat;
        app.handle_key(key(KeyCode::Up));
        assert_eq!(app.chat_scroll, 1);
        app.add_entry(ChatEntry::Ai("hi".to_string()));
        assert_eq!(app.chat_scroll, 0);
    }
}
