//! Structural self-checks for grid containers.
//!
//! Bulk mutations (generation, refinement, removal) finish with
//! `debug_assert_invariants()`. The check is compiled into debug builds and
//! into release builds with `check-invariants` or `strict-invariants`.

use crate::grid_error::GridError;

/// Containers that can verify their own structural invariants.
pub trait DebugInvariants {
    /// Panics on the first violated invariant when checks are compiled in.
    fn debug_assert_invariants(&self);
    /// Runs every check and reports the first violation.
    fn validate_invariants(&self) -> Result<(), GridError>;
}

/// Panics with `$context` if `$check` fails and invariant checks are
/// compiled in.
#[macro_export]
macro_rules! debug_invariants {
    ($check:expr, $context:literal) => {
        if $crate::debug_invariants::checks_enabled() {
            if let Err(err) = $check {
                panic!("[grid invariants] {}: {}", $context, err);
            }
        }
    };
}

/// True when invariant checks are compiled in; removals then also refuse to
/// strand points.
#[doc(hidden)]
#[inline]
pub const fn checks_enabled() -> bool {
    cfg!(any(
        debug_assertions,
        feature = "strict-invariants",
        feature = "check-invariants"
    ))
}
