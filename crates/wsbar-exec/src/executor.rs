use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::trace;
use tracing::warn;
use wsbar_core::reduce;
use wsbar_core::render;
use wsbar_core::ActionBarView;
use wsbar_core::FetchTicket;
use wsbar_core::LogLevel;
use wsbar_core::RuntimeAction;
use wsbar_core::ShellAction;
use wsbar_core::ShellConfig;
use wsbar_core::ShellEffect;
use wsbar_core::ShellState;
use wsbar_core::UserAction;

use crate::ports::AuthProvider;
use crate::ports::CommandDispatcher;
use crate::ports::HttpPort;
use crate::ports::Navigator;
use crate::session::fetch_profile;

#[derive(Clone)]
pub struct ShellPorts {
    pub http: Arc<dyn HttpPort>,
    pub dispatcher: Arc<dyn CommandDispatcher>,
    pub navigator: Arc<dyn Navigator>,
    pub auth: Arc<dyn AuthProvider>,
}

/// What the host should do with the event it just forwarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventOutcome {
    pub prevent_default: bool,
    pub redraw: bool,
}

impl EventOutcome {
    fn merge(&mut self, other: EventOutcome) {
        self.prevent_default |= other.prevent_default;
        self.redraw |= other.redraw;
    }
}

/// Owns a [`ShellState`] and carries out the effects the reducer asks for.
///
/// All state changes happen on the caller's thread. Async work runs on the
/// given runtime and comes back as actions that `pump`/`settle` apply.
pub struct ShellDriver {
    state: ShellState,
    ports: ShellPorts,
    runtime: Handle,
    completions_tx: UnboundedSender<ShellAction>,
    completions_rx: UnboundedReceiver<ShellAction>,
    tasks: Vec<JoinHandle<()>>,
    logged_seq: u64,
}

impl ShellDriver {
    pub fn new(config: ShellConfig, ports: ShellPorts, runtime: Handle) -> Self {
        let is_authenticated = ports.auth.is_authenticated();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            state: ShellState::new(config, is_authenticated),
            ports,
            runtime,
            completions_tx,
            completions_rx,
            tasks: Vec::new(),
            logged_seq: 0,
        }
    }

    pub fn state(&self) -> &ShellState {
        &self.state
    }

    pub fn render(&self) -> ActionBarView {
        render(&self.state)
    }

    pub fn mount(&mut self) -> EventOutcome {
        self.apply(ShellAction::Runtime(RuntimeAction::Mount))
    }

    pub fn unmount(&mut self) -> EventOutcome {
        self.apply(ShellAction::Runtime(RuntimeAction::Unmount))
    }

    pub fn handle(&mut self, action: UserAction) -> EventOutcome {
        self.apply(ShellAction::User(action))
    }

    /// Re-reads the auth provider and forwards any change to the shell.
    pub fn sync_auth(&mut self) -> EventOutcome {
        let is_authenticated = self.ports.auth.is_authenticated();
        self.apply(ShellAction::Runtime(RuntimeAction::SetAuthenticated(
            is_authenticated,
        )))
    }

    /// Applies every completion that has arrived so far without waiting.
    pub fn pump(&mut self) -> EventOutcome {
        self.tasks.retain(|task| !task.is_finished());
        let mut outcome = EventOutcome::default();
        while let Ok(action) = self.completions_rx.try_recv() {
            outcome.merge(self.apply(action));
        }
        outcome
    }

    /// Waits for all background work and applies its completions.
    pub async fn settle(&mut self) -> EventOutcome {
        let mut outcome = EventOutcome::default();
        loop {
            let tasks = std::mem::take(&mut self.tasks);
            if tasks.is_empty() {
                break;
            }
            for task in tasks {
                if let Err(err) = task.await {
                    error!(error = %err, "shell background task failed");
                }
            }
            outcome.merge(self.pump());
        }
        outcome
    }

    fn apply(&mut self, action: ShellAction) -> EventOutcome {
        let effects = reduce(&mut self.state, action);
        self.flush_diagnostics();

        let mut outcome = EventOutcome::default();
        for effect in effects {
            self.execute(effect, &mut outcome);
        }
        outcome
    }

    fn execute(&mut self, effect: ShellEffect, outcome: &mut EventOutcome) {
        match effect {
            ShellEffect::RequestFrame => outcome.redraw = true,
            ShellEffect::PreventDefault => outcome.prevent_default = true,
            ShellEffect::FetchProfile { ticket } => self.spawn_fetch(ticket),
            ShellEffect::DispatchCommand(command_text) => self.spawn_dispatch(command_text),
            ShellEffect::Navigate(path) => {
                info!(%path, "navigating");
                self.ports.navigator.navigate(&path);
            }
            ShellEffect::SignOut => {
                info!("signing out");
                self.ports.auth.sign_out();
                outcome.merge(self.sync_auth());
            }
        }
    }

    fn spawn_fetch(&mut self, ticket: FetchTicket) {
        let http = Arc::clone(&self.ports.http);
        let path = self.state.config.api.user_path.clone();
        let completions = self.completions_tx.clone();

        let task = self.runtime.spawn(async move {
            // Failures surface through the session diagnostics.
            let result = fetch_profile(http.as_ref(), &path).await;
            let action = ShellAction::Runtime(RuntimeAction::ProfileFetched { ticket, result });
            if completions.send(action).is_err() {
                debug!(ticket = ticket.0, "shell dropped before profile response arrived");
            }
        });
        self.tasks.push(task);
    }

    fn spawn_dispatch(&mut self, command_text: String) {
        info!(command = %command_text, "dispatching command");
        let dispatcher = Arc::clone(&self.ports.dispatcher);
        let task = self.runtime.spawn(async move {
            dispatcher.dispatch(command_text).await;
        });
        self.tasks.push(task);
    }

    fn flush_diagnostics(&mut self) {
        for entry in self.state.diagnostics.since(self.logged_seq) {
            let source = entry.source.label();
            match entry.level {
                LogLevel::Trace => trace!(source, "{}", entry.message),
                LogLevel::Debug => debug!(source, "{}", entry.message),
                LogLevel::Info => info!(source, "{}", entry.message),
                LogLevel::Warn => warn!(source, "{}", entry.message),
                LogLevel::Error => error!(source, "{}", entry.message),
            }
        }
        if let Some(last) = self.state.diagnostics.iter().last() {
            self.logged_seq = last.seq;
        }
    }
}

#[cfg(test)]
mod tests;
