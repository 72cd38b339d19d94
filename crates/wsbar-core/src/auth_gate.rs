use std::collections::BTreeSet;

use super::actions::ActionId;

pub type ActionSet = BTreeSet<ActionId>;

const SIGNED_OUT_ACTIONS: [ActionId; 5] = [
    ActionId::SignUp,
    ActionId::Login,
    ActionId::Gallery,
    ActionId::HowTo,
    ActionId::Contact,
];

const SIGNED_IN_ACTIONS: [ActionId; 6] = [
    ActionId::Dashboard,
    ActionId::NewWorksheet,
    ActionId::Gallery,
    ActionId::HowTo,
    ActionId::Contact,
    ActionId::AccountMenu,
];

pub fn compute_visible_actions(is_authenticated: bool) -> ActionSet {
    if is_authenticated {
        SIGNED_IN_ACTIONS.into_iter().collect()
    } else {
        SIGNED_OUT_ACTIONS.into_iter().collect()
    }
}

pub fn is_action_visible(is_authenticated: bool, action: ActionId) -> bool {
    let visible: &[ActionId] = if is_authenticated {
        &SIGNED_IN_ACTIONS
    } else {
        &SIGNED_OUT_ACTIONS
    };
    visible.contains(&action)
}
