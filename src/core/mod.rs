pub mod error;
pub mod identity;

pub use error::{ControlError, Result};
pub use identity::NodeIdentity;
