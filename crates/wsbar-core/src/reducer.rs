use std::sync::Arc;

use super::actions::ActionId;
use super::actions::FieldKey;
use super::actions::RuntimeAction;
use super::actions::ShellAction;
use super::actions::UserAction;
use super::auth_gate::is_action_visible;
use super::state::new_worksheet_command;
use super::state::FetchError;
use super::state::FetchTicket;
use super::state::LogLevel;
use super::state::LogSource;
use super::state::MenuAnchor;
use super::state::SessionState;
use super::state::ShellState;
use super::state::UserProfile;

/// Work the host must carry out after a reduction. Effects are returned only
/// after every state change for the action has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEffect {
    RequestFrame,
    /// Suppress the host toolkit's default handling of the current input event.
    PreventDefault,
    FetchProfile {
        ticket: FetchTicket,
    },
    DispatchCommand(String),
    Navigate(String),
    SignOut,
}

pub fn reduce(state: &mut ShellState, action: ShellAction) -> Vec<ShellEffect> {
    match action {
        ShellAction::User(user) => reduce_user(state, user),
        ShellAction::Runtime(runtime) => reduce_runtime(state, runtime),
    }
}

fn reduce_user(state: &mut ShellState, action: UserAction) -> Vec<ShellEffect> {
    match action {
        UserAction::Activate(id) => activate(state, id),
        UserAction::EditWorksheetName(value) => {
            if state.dialog.edit(value) {
                vec![ShellEffect::RequestFrame]
            } else {
                Vec::new()
            }
        }
        UserAction::NameFieldKeyDown(key) => {
            if !state.dialog.is_open() {
                return Vec::new();
            }
            match key {
                FieldKey::Enter => {
                    let mut effects = vec![ShellEffect::PreventDefault];
                    effects.extend(confirm_dialog(state));
                    effects
                }
                FieldKey::Escape => close_dialog(state),
                FieldKey::Other => Vec::new(),
            }
        }
        UserAction::ConfirmDialog => confirm_dialog(state),
        UserAction::CancelDialog | UserAction::DismissDialog => close_dialog(state),
        UserAction::ToggleAccountMenu { anchor } => toggle_account_menu(state, anchor),
        UserAction::CloseAccountMenu => {
            if state.account_menu.close() {
                vec![ShellEffect::RequestFrame]
            } else {
                Vec::new()
            }
        }
        UserAction::OpenAccountProfile => {
            if !state.is_authenticated() {
                return Vec::new();
            }
            state.account_menu.close();
            vec![
                ShellEffect::Navigate(state.config.links.account_profile.clone()),
                ShellEffect::RequestFrame,
            ]
        }
        UserAction::SignOut => {
            if !state.is_authenticated() {
                return Vec::new();
            }
            state.account_menu.close();
            vec![ShellEffect::SignOut, ShellEffect::RequestFrame]
        }
    }
}

fn activate(state: &mut ShellState, id: ActionId) -> Vec<ShellEffect> {
    if !is_action_visible(state.is_authenticated(), id) {
        state.log(
            LogLevel::Debug,
            LogSource::Shell,
            format!("ignored hidden control {:?}", id),
        );
        return Vec::new();
    }

    match id {
        ActionId::NewWorksheet => {
            state.account_menu.close();
            state.dialog.open();
            vec![ShellEffect::RequestFrame]
        }
        ActionId::AccountMenu => toggle_account_menu(state, None),
        link => match link.link_target(&state.config.links) {
            Some(path) => vec![ShellEffect::Navigate(path.to_string())],
            None => Vec::new(),
        },
    }
}

fn confirm_dialog(state: &mut ShellState) -> Vec<ShellEffect> {
    // `confirm` resets the dialog before the command leaves the reducer, so a
    // second confirm in the same frame finds it closed.
    let Some(name) = state.dialog.confirm() else {
        return Vec::new();
    };
    let command = new_worksheet_command(&name);
    state.log(
        LogLevel::Info,
        LogSource::Dialog,
        format!("dispatching `{command}`"),
    );
    vec![
        ShellEffect::DispatchCommand(command),
        ShellEffect::RequestFrame,
    ]
}

fn close_dialog(state: &mut ShellState) -> Vec<ShellEffect> {
    if state.dialog.close() {
        vec![ShellEffect::RequestFrame]
    } else {
        Vec::new()
    }
}

fn toggle_account_menu(state: &mut ShellState, anchor: Option<MenuAnchor>) -> Vec<ShellEffect> {
    if !state.is_authenticated() {
        return Vec::new();
    }
    if !state.account_menu.close() {
        state.account_menu.open_at(anchor);
    }
    vec![ShellEffect::RequestFrame]
}

fn reduce_runtime(state: &mut ShellState, action: RuntimeAction) -> Vec<ShellEffect> {
    match action {
        RuntimeAction::Mount => {
            if state.lifecycle.mounted {
                return Vec::new();
            }
            state.lifecycle.mounted = true;
            let mut effects: Vec<ShellEffect> = begin_profile_fetch(state).into_iter().collect();
            effects.push(ShellEffect::RequestFrame);
            effects
        }
        RuntimeAction::Unmount => {
            if !state.lifecycle.mounted {
                return Vec::new();
            }
            // An in-flight fetch stays `Loading`: a remount adopts it, and a
            // completion that lands while unmounted is dropped.
            state.lifecycle.mounted = false;
            state.dialog.close();
            state.account_menu.close();
            Vec::new()
        }
        RuntimeAction::SetAuthenticated(is_authenticated) => {
            if state.auth.is_authenticated == is_authenticated {
                return Vec::new();
            }
            state.auth.is_authenticated = is_authenticated;

            let mut effects = Vec::new();
            if is_authenticated {
                effects.extend(begin_profile_fetch(state));
            } else {
                match state.session {
                    SessionState::Loading { ticket } => state.lifecycle.abandoned = Some(ticket),
                    _ => state.session = SessionState::NotLoaded,
                }
                state.dialog.close();
                state.account_menu.close();
            }
            effects.push(ShellEffect::RequestFrame);
            effects
        }
        RuntimeAction::ProfileFetched { ticket, result } => {
            apply_profile_result(state, ticket, result)
        }
    }
}

/// Issues a fetch only from `NotLoaded`; `Loading`, `Loaded` and
/// `FetchFailed` all suppress it, so at most one request is ever in flight.
fn begin_profile_fetch(state: &mut ShellState) -> Option<ShellEffect> {
    if !state.lifecycle.mounted
        || !state.is_authenticated()
        || !matches!(state.session, SessionState::NotLoaded)
    {
        return None;
    }

    let ticket = state.lifecycle.issue_ticket();
    state.session = SessionState::Loading { ticket };
    state.log(
        LogLevel::Debug,
        LogSource::Session,
        format!("fetching profile (ticket {})", ticket.0),
    );
    Some(ShellEffect::FetchProfile { ticket })
}

fn apply_profile_result(
    state: &mut ShellState,
    ticket: FetchTicket,
    result: Result<UserProfile, FetchError>,
) -> Vec<ShellEffect> {
    match state.session {
        SessionState::Loading { ticket: pending } if pending == ticket => {}
        _ => {
            state.log(
                LogLevel::Debug,
                LogSource::Session,
                format!("discarded stale profile response {}", ticket.0),
            );
            return Vec::new();
        }
    }

    if state.lifecycle.abandoned == Some(ticket) {
        state.lifecycle.abandoned = None;
        state.session = SessionState::NotLoaded;
        state.log(
            LogLevel::Debug,
            LogSource::Session,
            format!("discarded profile response {} from a signed-out session", ticket.0),
        );
        // Signed back in while it was outstanding: only now may a new fetch start.
        let mut effects: Vec<ShellEffect> = begin_profile_fetch(state).into_iter().collect();
        if !effects.is_empty() {
            effects.push(ShellEffect::RequestFrame);
        }
        return effects;
    }

    if !state.lifecycle.mounted {
        state.session = SessionState::NotLoaded;
        state.log(
            LogLevel::Debug,
            LogSource::Session,
            format!("discarded profile response {} after unmount", ticket.0),
        );
        return Vec::new();
    }

    match result {
        Ok(profile) => {
            state.log(
                LogLevel::Info,
                LogSource::Session,
                format!("profile loaded for {}", profile.user_name),
            );
            state.session = SessionState::Loaded(Arc::new(profile));
        }
        Err(err) => {
            state.log(
                LogLevel::Warn,
                LogSource::Session,
                format!("profile fetch failed: {err}"),
            );
            state.session = SessionState::FetchFailed;
        }
    }
    vec![ShellEffect::RequestFrame]
}

#[cfg(test)]
mod tests;
