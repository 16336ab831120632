pub mod manager;
pub mod multi_session;
pub mod session;
pub mod state;

pub use manager::SessionManager;
pub use multi_session::{ChildSession, MultiSessionManager};
pub use session::{DebugSession, SessionMode};
pub use state::{DebugState, SessionState};
