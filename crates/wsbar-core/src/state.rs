use std::collections::VecDeque;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use thiserror::Error;

use super::config::ShellConfig;

/// Name used when the create dialog is confirmed with a blank input.
pub const DEFAULT_WORKSHEET_NAME: &str = "unnamed";

pub const DIAGNOSTICS_CAPACITY: usize = 200;

/// The signed-in user as reported by the session endpoint.
///
/// Profiles are never patched in place; a refresh replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub user_name: String,
    pub attributes: Map<String, Value>,
}

impl UserProfile {
    /// Builds a profile and merges `user_id` into the attribute set.
    pub fn new(
        user_id: impl Into<String>,
        user_name: impl Into<String>,
        mut attributes: Map<String, Value>,
    ) -> Self {
        let user_id = user_id.into();
        let user_name = user_name.into();
        attributes.insert("user_id".to_string(), Value::String(user_id.clone()));
        Self {
            user_id,
            user_name,
            attributes,
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchTicket(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("malformed profile response: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    NotLoaded,
    Loading { ticket: FetchTicket },
    Loaded(Arc<UserProfile>),
    FetchFailed,
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotLoaded => "not-loaded",
            Self::Loading { .. } => "loading",
            Self::Loaded(_) => "loaded",
            Self::FetchFailed => "fetch-failed",
        }
    }

    pub fn profile(&self) -> Option<&Arc<UserProfile>> {
        match self {
            Self::Loaded(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }
}

/// Durable state of the create-worksheet dialog.
///
/// Fields are private: the reducer drives it through `open`, `edit`,
/// `confirm` and `close`, and every close restores the initial value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DialogState {
    visible: bool,
    name_input: String,
}

impl DialogState {
    pub fn is_open(&self) -> bool {
        self.visible
    }

    pub fn name_input(&self) -> &str {
        &self.name_input
    }

    pub(crate) fn open(&mut self) {
        self.visible = true;
        self.name_input.clear();
    }

    /// Stores the raw typed value. Ignored while closed.
    pub(crate) fn edit(&mut self, value: String) -> bool {
        if !self.visible {
            return false;
        }
        self.name_input = value;
        true
    }

    /// Returns whether the dialog was open.
    pub(crate) fn close(&mut self) -> bool {
        let was_open = self.visible;
        *self = Self::default();
        was_open
    }

    /// Closes the dialog and hands back the name to create, or `None` if it
    /// was not open. The state is already reset when this returns.
    pub(crate) fn confirm(&mut self) -> Option<String> {
        if !self.visible {
            return None;
        }
        let name = effective_worksheet_name(&self.name_input);
        self.close();
        Some(name)
    }
}

/// Blank (or whitespace-only) input falls back to [`DEFAULT_WORKSHEET_NAME`].
/// Anything else is kept as typed, except that line breaks become a single
/// space so the command stays on one line.
pub fn effective_worksheet_name(input: &str) -> String {
    if input.trim().is_empty() {
        return DEFAULT_WORKSHEET_NAME.to_string();
    }

    let mut name = String::with_capacity(input.len());
    let mut in_break = false;
    for ch in input.chars() {
        if ch == '\r' || ch == '\n' {
            if !in_break {
                name.push(' ');
                in_break = true;
            }
        } else {
            name.push(ch);
            in_break = false;
        }
    }
    name
}

pub fn new_worksheet_command(name: &str) -> String {
    format!("new {name}")
}

/// Where the host drew the account toggle; the menu pops up next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuAnchor {
    pub column: u16,
    pub row: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountMenuState {
    anchor: Option<MenuAnchor>,
    open: bool,
}

impl AccountMenuState {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn anchor(&self) -> Option<MenuAnchor> {
        self.anchor
    }

    pub(crate) fn open_at(&mut self, anchor: Option<MenuAnchor>) {
        self.open = true;
        self.anchor = anchor;
    }

    pub(crate) fn close(&mut self) -> bool {
        let was_open = self.open;
        *self = Self::default();
        was_open
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthStatus {
    pub is_authenticated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifecycle {
    pub mounted: bool,
    next_ticket: u64,
    /// In-flight fetch issued for a session that has since signed out. It
    /// keeps `Loading` occupied until it completes, and its result is dropped.
    pub(crate) abandoned: Option<FetchTicket>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            mounted: false,
            next_ticket: 1,
            abandoned: None,
        }
    }
}

impl Lifecycle {
    pub(crate) fn issue_ticket(&mut self) -> FetchTicket {
        let ticket = FetchTicket(self.next_ticket);
        self.next_ticket += 1;
        ticket
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    Session,
    Dialog,
    Shell,
}

impl LogSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Dialog => "dialog",
            Self::Shell => "shell",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub seq: u64,
    pub level: LogLevel,
    pub source: LogSource,
    pub message: String,
}

impl LogEntry {
    pub fn new(level: LogLevel, source: LogSource, message: impl Into<String>) -> Self {
        Self {
            seq: 0,
            level,
            source,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogBuffer {
    cap: usize,
    next_seq: u64,
    buf: VecDeque<LogEntry>,
}

impl LogBuffer {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            next_seq: 1,
            buf: VecDeque::with_capacity(cap),
        }
    }

    pub fn append(&mut self, mut entry: LogEntry) {
        entry.seq = self.next_seq;
        self.next_seq += 1;

        if self.cap == 0 {
            return;
        }
        while self.buf.len() >= self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(entry);
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.buf.iter()
    }

    /// Entries with a sequence number greater than `seq`, oldest first.
    pub fn since(&self, seq: u64) -> impl Iterator<Item = &LogEntry> {
        self.buf.iter().filter(move |entry| entry.seq > seq)
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DIAGNOSTICS_CAPACITY)
    }
}

#[derive(Debug, Clone)]
pub struct ShellState {
    pub config: ShellConfig,
    pub(crate) auth: AuthStatus,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) session: SessionState,
    pub(crate) dialog: DialogState,
    pub(crate) account_menu: AccountMenuState,
    pub diagnostics: LogBuffer,
}

impl ShellState {
    /// A freshly constructed shell is unmounted with nothing loaded; the
    /// authentication flag comes from the external auth provider.
    pub fn new(config: ShellConfig, is_authenticated: bool) -> Self {
        Self {
            config,
            auth: AuthStatus { is_authenticated },
            lifecycle: Lifecycle::default(),
            session: SessionState::NotLoaded,
            dialog: DialogState::default(),
            account_menu: AccountMenuState::default(),
            diagnostics: LogBuffer::default(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated
    }

    pub fn is_mounted(&self) -> bool {
        self.lifecycle.mounted
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn dialog(&self) -> &DialogState {
        &self.dialog
    }

    pub fn account_menu(&self) -> &AccountMenuState {
        &self.account_menu
    }

    /// Cached display name, if a profile has been loaded.
    pub fn user_name(&self) -> Option<&str> {
        self.session
            .profile()
            .map(|profile| profile.user_name.as_str())
    }

    pub(crate) fn log(&mut self, level: LogLevel, source: LogSource, message: impl Into<String>) {
        self.diagnostics
            .append(LogEntry::new(level, source, message));
    }
}
