use pretty_assertions::assert_eq;
use serde_json::Map;
use serde_json::Value;

pub(super) use super::reduce;
pub(super) use super::ShellEffect;
pub(super) use crate::actions::ActionId;
pub(super) use crate::actions::FieldKey;
pub(super) use crate::actions::RuntimeAction;
pub(super) use crate::actions::ShellAction;
pub(super) use crate::actions::UserAction;
pub(super) use crate::config::ShellConfig;
pub(super) use crate::state::DialogState;
pub(super) use crate::state::FetchError;
pub(super) use crate::state::FetchTicket;
pub(super) use crate::state::LogLevel;
pub(super) use crate::state::LogSource;
pub(super) use crate::state::MenuAnchor;
pub(super) use crate::state::SessionState;
pub(super) use crate::state::ShellState;
pub(super) use crate::state::UserProfile;
pub(super) use crate::view::render;

mod account_menu;

fn state(is_authenticated: bool) -> ShellState {
    ShellState::new(ShellConfig::default(), is_authenticated)
}

fn mounted(is_authenticated: bool) -> (ShellState, Vec<ShellEffect>) {
    let mut state = state(is_authenticated);
    let effects = reduce(&mut state, ShellAction::Runtime(RuntimeAction::Mount));
    (state, effects)
}

fn user(state: &mut ShellState, action: UserAction) -> Vec<ShellEffect> {
    reduce(state, ShellAction::User(action))
}

fn runtime(state: &mut ShellState, action: RuntimeAction) -> Vec<ShellEffect> {
    reduce(state, ShellAction::Runtime(action))
}

fn profile(user_id: &str, user_name: &str) -> UserProfile {
    let mut attributes = Map::new();
    attributes.insert("user_name".to_string(), Value::from(user_name));
    UserProfile::new(user_id, user_name, attributes)
}

fn fetch_tickets(effects: &[ShellEffect]) -> Vec<FetchTicket> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            ShellEffect::FetchProfile { ticket } => Some(*ticket),
            _ => None,
        })
        .collect()
}

fn dispatched(effects: &[ShellEffect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            ShellEffect::DispatchCommand(command) => Some(command.clone()),
            _ => None,
        })
        .collect()
}

fn open_dialog(state: &mut ShellState) {
    let effects = user(state, UserAction::Activate(ActionId::NewWorksheet));
    assert_eq!(effects, vec![ShellEffect::RequestFrame]);
    assert!(state.dialog().is_open());
}

fn assert_dialog_initial(state: &ShellState) {
    assert_eq!(state.dialog(), &DialogState::default());
    assert!(!state.dialog().is_open());
    assert_eq!(state.dialog().name_input(), "");
}
