use super::config::NavigationLinks;
use super::state::FetchError;
use super::state::FetchTicket;
use super::state::MenuAnchor;
use super::state::UserProfile;

#[derive(Debug, Clone)]
pub enum ShellAction {
    User(UserAction),
    Runtime(RuntimeAction),
}

#[derive(Debug, Clone)]
pub enum UserAction {
    /// Click on one of the action-bar controls.
    Activate(ActionId),
    EditWorksheetName(String),
    NameFieldKeyDown(FieldKey),
    ConfirmDialog,
    CancelDialog,
    /// Dialog closed from outside (backdrop click, window blur).
    DismissDialog,
    ToggleAccountMenu {
        anchor: Option<MenuAnchor>,
    },
    CloseAccountMenu,
    OpenAccountProfile,
    SignOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKey {
    Enter,
    Escape,
    Other,
}

#[derive(Debug, Clone)]
pub enum RuntimeAction {
    Mount,
    Unmount,
    SetAuthenticated(bool),
    ProfileFetched {
        ticket: FetchTicket,
        result: Result<UserProfile, FetchError>,
    },
}

/// Controls the action bar can show. Declaration order is render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActionId {
    Dashboard,
    NewWorksheet,
    Gallery,
    HowTo,
    Contact,
    SignUp,
    Login,
    AccountMenu,
}

impl ActionId {
    pub const ALL: [ActionId; 8] = [
        Self::Dashboard,
        Self::NewWorksheet,
        Self::Gallery,
        Self::HowTo,
        Self::Contact,
        Self::SignUp,
        Self::Login,
        Self::AccountMenu,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "My Dashboard",
            Self::NewWorksheet => "New Worksheet",
            Self::Gallery => "Gallery",
            Self::HowTo => "How-To",
            Self::Contact => "Contact",
            Self::SignUp => "Sign Up",
            Self::Login => "Login",
            Self::AccountMenu => "Account",
        }
    }

    /// Destination for link-style controls; `None` for controls that drive
    /// shell state instead of navigating.
    pub fn link_target(self, links: &NavigationLinks) -> Option<&str> {
        match self {
            Self::Dashboard => Some(links.dashboard.as_str()),
            Self::Gallery => Some(links.gallery.as_str()),
            Self::HowTo => Some(links.how_to.as_str()),
            Self::Contact => Some(links.contact.as_str()),
            Self::SignUp => Some(links.sign_up.as_str()),
            Self::Login => Some(links.login.as_str()),
            Self::NewWorksheet | Self::AccountMenu => None,
        }
    }
}
