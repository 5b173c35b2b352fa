//! Script objects and their lifecycle
//!
//! A script is a user type implementing whichever [`Script`] hooks it needs;
//! every hook defaults to doing nothing. The runtime owns the lifecycle:
//!
//! ```text
//! Constructed -> Created -> Started -> Updating* -> Destroyed
//! ```
//!
//! `Destroyed` is terminal and reachable from any state.

use crate::context::ScriptContext;
use crate::marshal::Collision;
use crate::ScriptResult;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tether_core::{Entity, FrameTime};

/// Identity of a script instance. Never reused within a process.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScriptId(u64);

static NEXT_SCRIPT_ID: AtomicU64 = AtomicU64::new(1);

impl ScriptId {
    pub(crate) fn next() -> Self {
        Self(NEXT_SCRIPT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "script:{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Queued; `on_create` has not run
    Constructed,
    Created,
    Started,
    /// Has received at least one update tick
    Updating,
    Destroyed,
}

impl LifecycleState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (Constructed, Created)
                | (Created, Started)
                | (Started, Updating)
                | (Updating, Updating)
                | (Constructed | Created | Started | Updating, Destroyed)
        )
    }

    /// Update ticks are only delivered once the start hook has run.
    pub fn receives_updates(self) -> bool {
        matches!(self, LifecycleState::Started | LifecycleState::Updating)
    }

    pub fn is_destroyed(self) -> bool {
        self == LifecycleState::Destroyed
    }
}

/// Behaviour hooks a script may implement.
///
/// Entity scripts reach their owner through [`ScriptContext::owner`].
/// Returned errors are logged by the runtime and never stop other scripts.
#[allow(unused_variables)]
pub trait Script: 'static {
    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn on_create(&mut self, ctx: &mut ScriptContext<'_>) -> ScriptResult {
        Ok(())
    }

    fn on_start(&mut self, ctx: &mut ScriptContext<'_>) -> ScriptResult {
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut ScriptContext<'_>, time: FrameTime) -> ScriptResult {
        Ok(())
    }

    /// Runs after the script has left the update signal.
    fn on_destroy(&mut self, ctx: &mut ScriptContext<'_>) -> ScriptResult {
        Ok(())
    }

    fn on_sensor_enter(&mut self, ctx: &mut ScriptContext<'_>, other: Entity) -> ScriptResult {
        Ok(())
    }

    fn on_sensor_exit(&mut self, ctx: &mut ScriptContext<'_>, other: Entity) -> ScriptResult {
        Ok(())
    }

    fn on_collision_enter(
        &mut self,
        ctx: &mut ScriptContext<'_>,
        collision: &Collision,
    ) -> ScriptResult {
        Ok(())
    }

    fn on_collision_exit(
        &mut self,
        ctx: &mut ScriptContext<'_>,
        collision: &Collision,
    ) -> ScriptResult {
        Ok(())
    }
}
