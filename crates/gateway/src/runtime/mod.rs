pub mod conversation;
pub mod dispatch;
pub mod prompt;
pub mod turn;

pub use conversation::Conversation;
pub use dispatch::{dispatch_all, CapabilityResult};
pub use turn::{LoopSettings, Orchestrator, Termination, TriageOutcome};
