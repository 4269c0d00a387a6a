// Compression level resolution.
//
// A requested level below zero means "use the configured default". The
// configured default is injected through the `DefaultLevel` trait; when it is
// unset (or itself negative) the built-in `DEFAULT_ZIP_LEVEL` applies.

use std::sync::atomic::{AtomicI32, Ordering};

/// Built-in zip level, used when neither the caller nor the process
/// configuration supplies one. Trades a little ratio for a lot of speed
/// compared to zlib's usual 6.
pub const DEFAULT_ZIP_LEVEL: i32 = 4;

/// Highest level the engine accepts.
pub const MAX_ZIP_LEVEL: i32 = 9;

const UNSET: i32 = -1;

static PROCESS_DEFAULT_LEVEL: AtomicI32 = AtomicI32::new(UNSET);

// ---------------------------------------------------------------------------
// Process-wide default
// ---------------------------------------------------------------------------

/// Set the process-wide default zip level. A negative value clears it.
pub fn set_default_level(level: i32) {
    PROCESS_DEFAULT_LEVEL.store(level.max(UNSET), Ordering::Relaxed);
}

/// Clear the process-wide default zip level.
pub fn clear_default_level() {
    PROCESS_DEFAULT_LEVEL.store(UNSET, Ordering::Relaxed);
}

/// The process-wide default zip level, if one has been set.
pub fn default_level() -> Option<i32> {
    let level = PROCESS_DEFAULT_LEVEL.load(Ordering::Relaxed);
    (level >= 0).then_some(level)
}

// ---------------------------------------------------------------------------
// Injected default source
// ---------------------------------------------------------------------------

/// Source of the configured default level consulted for negative requests.
pub trait DefaultLevel {
    /// The configured default, or `None` when nothing is configured.
    fn default_level(&self) -> Option<i32>;
}

/// Reads the process-wide setting managed by [`set_default_level`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessDefault;

impl DefaultLevel for ProcessDefault {
    fn default_level(&self) -> Option<i32> {
        default_level()
    }
}

/// A fixed default, mostly useful for tests and embedders that keep their
/// own configuration.
impl DefaultLevel for Option<i32> {
    fn default_level(&self) -> Option<i32> {
        *self
    }
}

impl<F> DefaultLevel for F
where
    F: Fn() -> Option<i32>,
{
    fn default_level(&self) -> Option<i32> {
        self()
    }
}

/// Resolve a requested level to the concrete level handed to the engine.
pub fn resolve_level<D: DefaultLevel + ?Sized>(requested: i32, defaults: &D) -> i32 {
    if requested >= 0 {
        return requested;
    }
    match defaults.default_level() {
        Some(level) if level >= 0 => level,
        _ => DEFAULT_ZIP_LEVEL,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_level_wins() {
        assert_eq!(resolve_level(0, &Some(7i32)), 0);
        assert_eq!(resolve_level(9, &None::<i32>), 9);
    }

    #[test]
    fn negative_uses_configured_default() {
        assert_eq!(resolve_level(-1, &Some(7i32)), 7);
        assert_eq!(resolve_level(i32::MIN, &Some(1i32)), 1);
    }

    #[test]
    fn unset_default_falls_back_to_builtin() {
        assert_eq!(resolve_level(-1, &None::<i32>), DEFAULT_ZIP_LEVEL);
    }

    #[test]
    fn negative_configured_default_counts_as_unset() {
        assert_eq!(resolve_level(-1, &Some(-3i32)), DEFAULT_ZIP_LEVEL);
    }

    #[test]
    fn closure_source() {
        let source = || Some(2);
        assert_eq!(resolve_level(-5, &source), 2);
    }

    #[test]
    fn process_default_roundtrip() {
        // The only test in this binary that touches the global.
        clear_default_level();
        assert_eq!(default_level(), None);
        assert_eq!(resolve_level(-1, &ProcessDefault), DEFAULT_ZIP_LEVEL);

        set_default_level(8);
        assert_eq!(default_level(), Some(8));
        assert_eq!(resolve_level(-1, &ProcessDefault), 8);

        set_default_level(-20);
        assert_eq!(default_level(), None);
        clear_default_level();
    }
}
