pub mod actions;
pub mod auth_gate;
pub mod config;
pub mod reducer;
pub mod state;
pub mod view;

pub use actions::*;
pub use auth_gate::*;
pub use config::*;
pub use reducer::*;
pub use state::*;
pub use view::*;
