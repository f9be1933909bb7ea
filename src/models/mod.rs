pub mod account;
pub mod api;
pub mod ledger;
pub mod proxy;
pub mod task;

pub use account::*;
pub use api::*;
pub use ledger::*;
pub use proxy::*;
pub use task::*;
