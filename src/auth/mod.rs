pub mod identity;
pub mod session;

pub use identity::{Identity, IdentityVerifier};
pub use session::{IdentityLocks, SessionSnapshot, SessionSynchronizer};
