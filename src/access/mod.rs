// Visitor access management
pub mod protocol;

pub use protocol::{AccessGrantProtocol, AccessState, GrantError};
