pub mod contracts;
pub mod dispatcher;
pub mod executor;
pub mod http;
pub mod ports;
pub mod session;

pub use contracts::*;
pub use dispatcher::*;
pub use executor::*;
pub use http::*;
pub use ports::*;
pub use session::*;
