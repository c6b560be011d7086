// ============================================================================
// ripple-signals - Equality Functions
// The suppression rule: a write that compares equal stores and schedules nothing
// ============================================================================

/// Equality function used by a signal's single write path.
pub type EqualsFn<T> = fn(&T, &T) -> bool;

// =============================================================================
// DEFAULT EQUALITY
// =============================================================================

/// Default equality using `PartialEq`. This is what `signal()` and
/// `computed()` install unless told otherwise.
///
/// # Example
/// ```
/// use ripple_signals::equals;
///
/// assert!(equals(&42, &42));
/// assert!(!equals(&42, &43));
/// ```
pub fn equals<T: PartialEq>(a: &T, b: &T) -> bool {
    a == b
}

/// Treats every pair as equal, so no write ever propagates.
pub fn always_equals<T>(_a: &T, _b: &T) -> bool {
    true
}

/// Treats every pair as different, so every write propagates. Used by
/// `forced_signal()` for values mutated in place or without a meaningful
/// `PartialEq`.
pub fn never_equals<T>(_a: &T, _b: &T) -> bool {
    false
}

// =============================================================================
// NAN-SAFE FLOAT EQUALITY
// =============================================================================

/// Equality for `f64` that treats NaN as equal to NaN, unlike IEEE 754.
/// Without this, a signal stuck at NaN would notify on every write of NaN.
///
/// # Example
/// ```
/// use ripple_signals::safe_equals_f64;
///
/// assert!(safe_equals_f64(&1.0, &1.0));
/// assert!(safe_equals_f64(&f64::NAN, &f64::NAN));
/// assert!(!safe_equals_f64(&f64::NAN, &1.0));
/// ```
pub fn safe_equals_f64(a: &f64, b: &f64) -> bool {
    if a.is_nan() {
        return b.is_nan();
    }
    a == b
}

/// Equality for `f32` that treats NaN as equal to NaN.
pub fn safe_equals_f32(a: &f32, b: &f32) -> bool {
    if a.is_nan() {
        return b.is_nan();
    }
    a == b
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_equals_uses_partial_eq() {
        assert!(equals(&"hello", &"hello"));
        assert!(!equals(&vec![1, 2], &vec![1, 3]));
    }

    #[test]
    fn always_and_never() {
        assert!(always_equals(&1, &2));
        assert!(!never_equals(&1, &1));
    }

    #[test]
    fn nan_compares_equal_to_nan() {
        assert!(safe_equals_f64(&f64::NAN, &f64::NAN));
        assert!(safe_equals_f32(&f32::NAN, &f32::NAN));
    }

    #[test]
    fn nan_differs_from_numbers() {
        assert!(!safe_equals_f64(&f64::NAN, &0.0));
        assert!(!safe_equals_f64(&0.0, &f64::NAN));
        assert!(!safe_equals_f32(&f32::NAN, &0.5));
    }

    #[test]
    fn normal_floats_compare_by_value() {
        assert!(safe_equals_f64(&1.5, &1.5));
        assert!(!safe_equals_f64(&1.5, &2.5));
    }
}
