//! Pure projection of [`ShellState`] into what the action bar shows.
//!
//! `render` never mutates state and never asks for a fetch; hosts may call it
//! as often as they redraw.

use super::actions::ActionId;
use super::auth_gate::compute_visible_actions;
use super::config::UiTheme;
use super::state::MenuAnchor;
use super::state::SessionState;
use super::state::ShellState;
use super::state::DEFAULT_WORKSHEET_NAME;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionBarView {
    pub theme: UiTheme,
    pub items: Vec<ActionItemView>,
    pub dialog: Option<DialogView>,
    pub account_menu: Option<AccountMenuView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionItemView {
    pub id: ActionId,
    pub label: String,
    pub href: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogView {
    pub title: &'static str,
    pub name_input: String,
    /// Shown while the input is empty; not part of the stored value.
    pub placeholder: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountMenuEntry {
    Profile,
    SignOut,
}

impl AccountMenuEntry {
    pub fn label(self) -> &'static str {
        match self {
            Self::Profile => "My Account",
            Self::SignOut => "Sign Out",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMenuView {
    pub anchor: Option<MenuAnchor>,
    pub user_name: Option<String>,
    pub entries: Vec<AccountMenuEntry>,
}

pub fn render(state: &ShellState) -> ActionBarView {
    let user_name = state.user_name().map(str::to_string);

    let items = compute_visible_actions(state.is_authenticated())
        .into_iter()
        .map(|id| ActionItemView {
            id,
            label: item_label(id, state),
            href: id
                .link_target(&state.config.links)
                .map(str::to_string),
        })
        .collect();

    let dialog = state.dialog().is_open().then(|| DialogView {
        title: "New Worksheet",
        name_input: state.dialog().name_input().to_string(),
        placeholder: DEFAULT_WORKSHEET_NAME,
    });

    let account_menu = (state.is_authenticated() && state.account_menu().is_open()).then(|| {
        AccountMenuView {
            anchor: state.account_menu().anchor(),
            user_name,
            entries: vec![AccountMenuEntry::Profile, AccountMenuEntry::SignOut],
        }
    });

    ActionBarView {
        theme: state.config.theme,
        items,
        dialog,
        account_menu,
    }
}

fn item_label(id: ActionId, state: &ShellState) -> String {
    match (id, state.session()) {
        (ActionId::AccountMenu, SessionState::Loaded(profile)) => profile.user_name.clone(),
        _ => id.label().to_string(),
    }
}
