// ============================================================================
// ripple-signals - Core Module
// Error taxonomy, equality functions, and shared types
// ============================================================================

pub mod equality;
pub mod error;
pub mod types;

// Re-export commonly used items
pub use equality::{always_equals, equals, never_equals, safe_equals_f32, safe_equals_f64, EqualsFn};
pub use error::{ErrorHandler, SchedulerError, TaskError};
pub use types::{CleanupFn, Observable, Unsubscribe};
