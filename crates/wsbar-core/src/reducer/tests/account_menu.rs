use super::*;
use pretty_assertions::assert_eq;

const ANCHOR: MenuAnchor = MenuAnchor { column: 64, row: 1 };

#[test]
fn toggle_opens_at_anchor_and_closes() {
    let (mut state, _) = mounted(true);

    let effects = user(
        &mut state,
        UserAction::ToggleAccountMenu {
            anchor: Some(ANCHOR),
        },
    );
    assert_eq!(effects, vec![ShellEffect::RequestFrame]);
    assert!(state.account_menu().is_open());
    assert_eq!(state.account_menu().anchor(), Some(ANCHOR));

    user(
        &mut state,
        UserAction::ToggleAccountMenu {
            anchor: Some(ANCHOR),
        },
    );
    assert!(!state.account_menu().is_open());
    assert_eq!(state.account_menu().anchor(), None);
}

#[test]
fn account_control_click_toggles_menu() {
    let (mut state, _) = mounted(true);

    user(&mut state, UserAction::Activate(ActionId::AccountMenu));
    assert!(state.account_menu().is_open());

    user(&mut state, UserAction::Activate(ActionId::AccountMenu));
    assert!(!state.account_menu().is_open());
}

#[test]
fn menu_does_not_touch_dialog_state() {
    let (mut state, _) = mounted(true);
    open_dialog(&mut state);
    user(&mut state, UserAction::EditWorksheetName("keep".to_string()));

    user(&mut state, UserAction::ToggleAccountMenu { anchor: None });
    user(&mut state, UserAction::CloseAccountMenu);

    assert!(state.dialog().is_open());
    assert_eq!(state.dialog().name_input(), "keep");
}

#[test]
fn menu_shows_cached_user_name() {
    let (mut state, _) = mounted(true);
    runtime(
        &mut state,
        RuntimeAction::ProfileFetched {
            ticket: FetchTicket(1),
            result: Ok(profile("0x5", "lin")),
        },
    );
    user(&mut state, UserAction::ToggleAccountMenu { anchor: None });

    let menu = render(&state).account_menu.expect("menu");
    assert_eq!(menu.user_name.as_deref(), Some("lin"));
}

#[test]
fn sign_out_defers_to_host_and_closes_menu() {
    let (mut state, _) = mounted(true);
    user(&mut state, UserAction::ToggleAccountMenu { anchor: None });

    let effects = user(&mut state, UserAction::SignOut);

    assert_eq!(
        effects,
        vec![ShellEffect::SignOut, ShellEffect::RequestFrame]
    );
    assert!(!state.account_menu().is_open());
    // The flag only changes when the auth provider reports it.
    assert!(state.is_authenticated());
}

#[test]
fn profile_entry_navigates_through_port() {
    let (mut state, _) = mounted(true);
    user(&mut state, UserAction::ToggleAccountMenu { anchor: None });

    let effects = user(&mut state, UserAction::OpenAccountProfile);

    assert_eq!(
        effects,
        vec![
            ShellEffect::Navigate("/account/profile".to_string()),
            ShellEffect::RequestFrame,
        ]
    );
    assert!(!state.account_menu().is_open());
}

#[test]
fn menu_is_unavailable_while_signed_out() {
    let (mut state, _) = mounted(false);

    assert!(user(&mut state, UserAction::ToggleAccountMenu { anchor: None }).is_empty());
    assert!(user(&mut state, UserAction::SignOut).is_empty());
    assert!(user(&mut state, UserAction::OpenAccountProfile).is_empty());
    assert!(!state.account_menu().is_open());
}
