//! What a script hook gets to work with

use crate::dispatch::Dispatcher;
use crate::physics::RaycastOptions;
use crate::script::{Script, ScriptId};
use crate::settings::RuntimeSettings;
use crate::{NativeHost, World};
use tether_core::{Entity, FrameTime};

/// Borrowed view of the runtime handed to every hook and update callback.
pub struct ScriptContext<'a> {
    host: &'a mut dyn NativeHost,
    dispatcher: &'a Dispatcher,
    commands: &'a mut Commands,
    settings: &'a RuntimeSettings,
    frame: FrameTime,
    owner: Option<Entity>,
    script: Option<ScriptId>,
}

impl<'a> ScriptContext<'a> {
    pub fn new(
        host: &'a mut dyn NativeHost,
        dispatcher: &'a Dispatcher,
        commands: &'a mut Commands,
        settings: &'a RuntimeSettings,
        frame: FrameTime,
    ) -> Self {
        Self {
            host,
            dispatcher,
            commands,
            settings,
            frame,
            owner: None,
            script: None,
        }
    }

    pub(crate) fn for_script(mut self, script: ScriptId, owner: Option<Entity>) -> Self {
        self.script = Some(script);
        self.owner = owner;
        self
    }

    /// Run `f` with a context narrowed to one script.
    pub(crate) fn scoped<R>(
        &mut self,
        script: ScriptId,
        owner: Option<Entity>,
        f: impl FnOnce(&mut ScriptContext<'_>) -> R,
    ) -> R {
        let mut inner = ScriptContext::new(
            &mut *self.host,
            self.dispatcher,
            &mut *self.commands,
            self.settings,
            self.frame,
        )
        .for_script(script, owner);
        f(&mut inner)
    }

    pub fn world(&mut self) -> World<'_> {
        World::new(&mut *self.host)
    }

    /// Entity the running script is attached to. `None` for system scripts.
    pub fn owner(&self) -> Option<Entity> {
        self.owner
    }

    pub fn script_id(&self) -> Option<ScriptId> {
        self.script
    }

    /// Subscribe or unsubscribe extra update callbacks. Changes made during a
    /// dispatch take effect from the next frame.
    pub fn dispatcher(&self) -> &Dispatcher {
        self.dispatcher
    }

    pub fn commands(&mut self) -> &mut Commands {
        &mut *self.commands
    }

    pub fn settings(&self) -> &RuntimeSettings {
        self.settings
    }

    pub fn raycast_options(&self) -> RaycastOptions {
        self.settings.physics.raycast_options()
    }

    pub fn frame(&self) -> FrameTime {
        self.frame
    }
}

pub(crate) enum Command {
    Spawn {
        id: ScriptId,
        owner: Option<Entity>,
        script: Box<dyn Script>,
    },
    DestroyScript(ScriptId),
    DestroyEntity(Entity),
}

/// Runtime changes requested from inside a hook.
///
/// Applied in order once the current hook or dispatch has returned.
#[derive(Default)]
pub struct Commands {
    queue: Vec<Command>,
}

impl Commands {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn_system(&mut self, script: impl Script) -> ScriptId {
        self.push_spawn(None, Box::new(script))
    }

    /// Attach `script` to `entity`. Dropped with a warning if the entity is
    /// gone by the time the command is applied.
    pub fn attach_script(&mut self, entity: Entity, script: impl Script) -> ScriptId {
        self.push_spawn(Some(entity), Box::new(script))
    }

    pub fn destroy_script(&mut self, id: ScriptId) {
        self.queue.push(Command::DestroyScript(id));
    }

    /// Destroy `entity` along with every script attached to it.
    pub fn destroy_entity(&mut self, entity: Entity) {
        self.queue.push(Command::DestroyEntity(entity));
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.queue)
    }

    fn push_spawn(&mut self, owner: Option<Entity>, script: Box<dyn Script>) -> ScriptId {
        let id = ScriptId::next();
        self.queue.push(Command::Spawn { id, owner, script });
        id
    }
}
