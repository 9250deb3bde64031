// Public module exports
pub mod events;
pub mod gate;
pub mod orchestrator;
pub mod progress;

// Re-export main types for convenience
pub use events::{EventKind, StreamEvent, decode};
pub use gate::AnimationGate;
pub use orchestrator::{ProgressHooks, SearchClient, SessionHandle, SessionId};
pub use progress::{LogEntry, Phase, ProgressSettings, ProgressState};
