//! Foreign-call episode tracking.
//!
//! An episode spans one entry into native code through to its return,
//! including any nested re-entry (native code calling back into the
//! managed runtime, which calls native code again). All levels share one
//! [`TransientArena`]; it is drained only when the outermost level
//! exits, so blocks allocated by an inner call stay valid for the outer
//! caller that receives them.

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::transient::TransientArena;

/// Nesting counter plus the arena it scopes.
pub struct Episode {
    arena: TransientArena,
    depth: u32,
    max_depth: u32,
}

impl Episode {
    /// Create an idle episode tracker from a validated configuration.
    pub fn new(config: &ArenaConfig) -> Result<Self, ArenaError> {
        Ok(Self {
            arena: TransientArena::with_config(config)?,
            depth: 0,
            max_depth: config.max_depth,
        })
    }

    /// Record entry into a foreign call. Returns the new depth.
    ///
    /// Entering beyond `max_depth` is refused with
    /// [`ArenaError::EpisodeOverflow`]; the depth is left unchanged.
    pub fn enter(&mut self) -> Result<u32, ArenaError> {
        if self.depth >= self.max_depth {
            tracing::warn!(max_depth = self.max_depth, "foreign call nesting limit reached");
            return Err(ArenaError::EpisodeOverflow {
                max_depth: self.max_depth,
            });
        }
        self.depth += 1;
        tracing::trace!(depth = self.depth, "foreign call enter");
        Ok(self.depth)
    }

    /// Record return from a foreign call. Returns the new depth.
    ///
    /// When the depth reaches zero the arena is drained. An exit with no
    /// matching enter is reported and leaves the arena untouched.
    pub fn exit(&mut self) -> Result<u32, ArenaError> {
        if self.depth == 0 {
            tracing::warn!("foreign call exit without matching enter");
            return Err(ArenaError::EpisodeUnderflow);
        }
        self.depth -= 1;
        tracing::trace!(depth = self.depth, "foreign call exit");
        if self.depth == 0 {
            self.arena.drain();
        }
        Ok(self.depth)
    }

    /// Enter a level and return a guard that exits it on drop.
    pub fn scope(&mut self) -> Result<EpisodeGuard<'_>, ArenaError> {
        self.enter()?;
        Ok(EpisodeGuard { episode: self })
    }

    /// Current nesting depth. Zero means no foreign call is active.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Whether a foreign call is in progress.
    pub fn is_active(&self) -> bool {
        self.depth > 0
    }

    /// The arena scoped by this episode.
    pub fn arena(&self) -> &TransientArena {
        &self.arena
    }

    /// Mutable access to the arena, for allocation.
    pub fn arena_mut(&mut self) -> &mut TransientArena {
        &mut self.arena
    }
}

/// RAII guard for one level of an [`Episode`].
///
/// The guard does not expose `enter`/`exit`; nested levels are opened
/// with [`scope`](Self::scope) so every level is closed exactly once.
#[must_use]
pub struct EpisodeGuard<'a> {
    episode: &'a mut Episode,
}

impl EpisodeGuard<'_> {
    /// Open a nested level inside this one.
    pub fn scope(&mut self) -> Result<EpisodeGuard<'_>, ArenaError> {
        self.episode.scope()
    }

    /// Current nesting depth, counting this level.
    pub fn depth(&self) -> u32 {
        self.episode.depth()
    }

    /// Shortcut to the scoped arena.
    pub fn arena(&mut self) -> &mut TransientArena {
        self.episode.arena_mut()
    }
}

impl Drop for EpisodeGuard<'_> {
    fn drop(&mut self) {
        // The guard entered this level, so the depth is at least one.
        let _ = self.episode.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode() -> Episode {
        Episode::new(&ArenaConfig::default()).unwrap()
    }

    #[test]
    fn outermost_exit_drains() {
        let mut ep = episode();
        ep.enter().unwrap();
        ep.arena_mut().allocate(8, 1).unwrap();
        assert_eq!(ep.exit().unwrap(), 0);
        assert_eq!(ep.arena().live_count(), 0);
    }

    #[test]
    fn inner_exit_keeps_allocations() {
        let mut ep = episode();
        ep.enter().unwrap();
        ep.enter().unwrap();
        let inner = ep.arena_mut().zero_allocate(4, 1).unwrap();
        assert_eq!(ep.exit().unwrap(), 1);
        // Still reachable from the outer caller.
        assert!(ep.arena().owns(inner));
        assert_eq!(ep.arena().contents(inner).unwrap(), &[0, 0, 0, 0]);
        ep.exit().unwrap();
        assert!(!ep.arena().owns(inner));
    }

    #[test]
    fn underflow_is_an_error_and_does_not_drain() {
        let mut ep = episode();
        // Allocation outside any episode is kept for the next drain.
        ep.arena_mut().allocate(1, 1).unwrap();
        assert_eq!(ep.exit(), Err(ArenaError::EpisodeUnderflow));
        assert_eq!(ep.arena().live_count(), 1);
    }

    #[test]
    fn overflow_is_refused_without_changing_depth() {
        let config = ArenaConfig {
            max_depth: 2,
            ..ArenaConfig::default()
        };
        let mut ep = Episode::new(&config).unwrap();
        ep.enter().unwrap();
        ep.enter().unwrap();
        assert_eq!(ep.enter(), Err(ArenaError::EpisodeOverflow { max_depth: 2 }));
        assert_eq!(ep.depth(), 2);
        // Unwinding still drains normally.
        ep.arena_mut().allocate(1, 1).unwrap();
        assert_eq!(ep.exit().unwrap(), 1);
        assert_eq!(ep.exit().unwrap(), 0);
        assert_eq!(ep.arena().live_count(), 0);
    }

    #[test]
    fn guard_exits_on_drop() {
        let mut ep = episode();
        {
            let mut guard = ep.scope().unwrap();
            guard.arena().allocate(16, 2).unwrap();
            assert_eq!(guard.depth(), 1);
        }
        assert_eq!(ep.depth(), 0);
        assert_eq!(ep.arena().live_count(), 0);
    }

    #[test]
    fn nested_guards_drain_once_at_outermost() {
        let mut ep = episode();
        let mut outer = ep.scope().unwrap();
        outer.arena().allocate(1, 1).unwrap();
        {
            let mut inner = outer.scope().unwrap();
            assert_eq!(inner.depth(), 2);
            inner.arena().allocate(1, 1).unwrap();
        }
        assert_eq!(outer.arena().live_count(), 2);
        drop(outer);
        assert_eq!(ep.arena().live_count(), 0);
        assert_eq!(ep.arena().stats().drains, 1);
    }
}
