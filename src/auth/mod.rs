pub mod context;
pub mod rbac;
pub mod session;
pub mod signal;

pub use context::{AuthState, UserContext};
pub use rbac::{authorize, can, Action, Ownership, Role};
pub use session::{Session, SessionStore};
pub use signal::{AuthRejectedListener, AuthSignal};
