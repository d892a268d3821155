mod io_utils;
pub mod sync;

// Re-export core engine components
pub use sync::{
    run, EventSink, SessionHandle, SessionState, SyncError, SyncErrorKind, SyncEvent, SyncOptions,
    SyncRequest, Syncer,
};

// Re-export domain types often needed by consumers
pub use modsync_core::SyncStats;
