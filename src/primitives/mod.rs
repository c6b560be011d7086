// ============================================================================
// ripple-signals - Reactive Primitives
// Signal, Computed, and Effect built on the deferred task scheduler
// ============================================================================

pub mod computed;
pub mod effect;
pub mod signal;

// Re-export main types and functions
pub use computed::{computed, computed_with_equals, try_computed, Computed};
pub use effect::{
    effect, effect_in, effect_with_cleanup, Effect, EffectFn, EffectOutcome, IntoEffectOutcome,
};
pub use signal::{
    forced_signal, signal, signal_f32, signal_f64, signal_with_equals, Signal,
};
