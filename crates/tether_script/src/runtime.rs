//! Script runtime
//!
//! Owns the host, the update signal and every script, and sequences each
//! script through create, start, update and destroy. The engine drives it
//! through the hook methods (`play_begin`, `frame_update`, `collision_enter`
//! and friends).
//!
//! Scripts never reach the runtime directly. Structural changes they ask
//! for go through [`Commands`] and are applied between hooks.

use crate::components::register_builtin;
use crate::context::{Command, Commands, ScriptContext};
use crate::dispatch::{run_isolated, DispatchReport, Dispatcher};
use crate::marshal::Collision;
use crate::script::{LifecycleState, Script, ScriptId};
use crate::settings::RuntimeSettings;
use crate::{BoundaryError, NativeHost, ScriptResult, World};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tether_core::{Entity, FrameClock, FrameTime};

struct ScriptSlot {
    id: ScriptId,
    owner: Option<Entity>,
    state: LifecycleState,
    script: Box<dyn Script>,
}

type SharedSlot = Rc<RefCell<ScriptSlot>>;

pub struct ScriptRuntime<H: NativeHost + 'static> {
    host: H,
    dispatcher: Dispatcher,
    settings: RuntimeSettings,
    scripts: Vec<SharedSlot>,
    commands: Commands,
    clock: FrameClock,
    frame: FrameTime,
    playing: bool,
}

impl<H: NativeHost + 'static> ScriptRuntime<H> {
    pub fn new(host: H, settings: RuntimeSettings) -> Result<Self, BoundaryError> {
        register_builtin()?;
        Ok(Self {
            host,
            dispatcher: Dispatcher::new(),
            settings,
            scripts: Vec::new(),
            commands: Commands::new(),
            clock: FrameClock::new(),
            frame: FrameTime::default(),
            playing: false,
        })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn world(&mut self) -> World<'_> {
        World::new(&mut self.host)
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn settings(&self) -> &RuntimeSettings {
        &self.settings
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    // -- script table ------------------------------------------------------

    /// Add a script with no owner entity.
    pub fn spawn_system(&mut self, script: impl Script) -> ScriptId {
        let id = ScriptId::next();
        self.insert(id, None, Box::new(script));
        id
    }

    pub fn attach_script(
        &mut self,
        entity: Entity,
        script: impl Script,
    ) -> Result<ScriptId, BoundaryError> {
        if !self.entity_valid(entity) {
            return Err(BoundaryError::InvalidEntity { entity });
        }
        let id = ScriptId::next();
        self.insert(id, Some(entity), Box::new(script));
        Ok(id)
    }

    /// Destroy one script. Returns false if it is unknown or already gone.
    pub fn destroy_script(&mut self, id: ScriptId) -> bool {
        let Some(index) = self.scripts.iter().position(|s| s.borrow().id == id) else {
            tracing::trace!(script = %id, "destroy of unknown script ignored");
            return false;
        };
        let slot = self.scripts.remove(index);
        self.teardown(&slot);
        true
    }

    /// Destroy `entity` and every script attached to it.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        for id in self.scripts_of(entity) {
            self.destroy_script(id);
        }
        self.world().destroy_entity(entity)
    }

    /// Lifecycle state of a live script. `None` once it has been destroyed.
    pub fn state(&self, id: ScriptId) -> Option<LifecycleState> {
        self.find(id).map(|s| s.borrow().state)
    }

    pub fn scripts_of(&self, entity: Entity) -> Vec<ScriptId> {
        self.scripts
            .iter()
            .map(|s| s.borrow())
            .filter(|s| s.owner == Some(entity))
            .map(|s| s.id)
            .collect()
    }

    pub fn script_count(&self) -> usize {
        self.scripts.len()
    }

    // -- driver hooks ------------------------------------------------------

    /// Enter play mode: create every pending script, then start them.
    pub fn play_begin(&mut self) {
        if self.playing {
            tracing::warn!("play_begin while already playing");
            return;
        }
        self.playing = true;
        self.apply_commands();
        self.reap_orphans();
        self.create_pending();
        self.start_pending();
        self.apply_commands();
        tracing::info!(scripts = self.scripts.len(), "play started");
    }

    /// Leave play mode, destroying every script.
    pub fn play_end(&mut self) {
        if !self.playing {
            return;
        }
        for slot in std::mem::take(&mut self.scripts) {
            self.teardown(&slot);
        }
        self.apply_commands();
        self.playing = false;
        tracing::info!(frames = self.dispatcher.frame_count(), "play ended");
    }

    /// One engine tick.
    ///
    /// Applies pending commands, destroys scripts whose owner is gone,
    /// creates and starts new scripts, then dispatches the update signal.
    /// Commands issued during the dispatch are applied before returning.
    pub fn frame_update(&mut self, delta_time: f32, time_scale: f32) -> DispatchReport {
        let frame = FrameTime::new(delta_time, time_scale);
        if !self.playing {
            tracing::trace!("frame_update outside play ignored");
            return DispatchReport {
                frame: self.dispatcher.frame_count(),
                ..Default::default()
            };
        }
        self.frame = frame;
        self.clock.advance(frame);

        self.apply_commands();
        self.reap_orphans();
        self.create_pending();
        self.start_pending();
        self.apply_commands();

        let report =
            self.dispatcher
                .dispatch_frame(&mut self.host, &mut self.commands, &self.settings, frame);
        self.apply_commands();

        if report.failed > 0 {
            tracing::debug!(
                frame = report.frame,
                failed = report.failed,
                "frame had failing scripts"
            );
        }
        report
    }

    pub fn sensor_enter(&mut self, sensor: Entity, other: Entity) {
        if !self.pair_valid(sensor, other) {
            return;
        }
        self.deliver(sensor, "on_sensor_enter", |s, ctx| s.on_sensor_enter(ctx, other));
        self.apply_commands();
    }

    pub fn sensor_exit(&mut self, sensor: Entity, other: Entity) {
        if !self.pair_valid(sensor, other) {
            return;
        }
        self.deliver(sensor, "on_sensor_exit", |s, ctx| s.on_sensor_exit(ctx, other));
        self.apply_commands();
    }

    /// Deliver a collision between `a` and `b`. `contacts` is the native
    /// contact buffer, with normals pointing from `b` into `a`.
    pub fn collision_enter(
        &mut self,
        a: Entity,
        b: Entity,
        contacts: &[u8],
    ) -> Result<(), BoundaryError> {
        let Some((for_a, for_b)) = self.decode_collision(a, b, contacts)? else {
            return Ok(());
        };
        self.deliver(a, "on_collision_enter", |s, ctx| s.on_collision_enter(ctx, &for_a));
        // `a`'s scripts may have destroyed `b`.
        if self.entity_valid(b) {
            self.deliver(b, "on_collision_enter", |s, ctx| s.on_collision_enter(ctx, &for_b));
        }
        self.apply_commands();
        Ok(())
    }

    pub fn collision_exit(
        &mut self,
        a: Entity,
        b: Entity,
        contacts: &[u8],
    ) -> Result<(), BoundaryError> {
        let Some((for_a, for_b)) = self.decode_collision(a, b, contacts)? else {
            return Ok(());
        };
        self.deliver(a, "on_collision_exit", |s, ctx| s.on_collision_exit(ctx, &for_a));
        if self.entity_valid(b) {
            self.deliver(b, "on_collision_exit", |s, ctx| s.on_collision_exit(ctx, &for_b));
        }
        self.apply_commands();
        Ok(())
    }

    // -- internals ---------------------------------------------------------

    fn entity_valid(&self, entity: Entity) -> bool {
        !entity.is_null() && self.host.is_entity_valid(entity)
    }

    fn pair_valid(&self, a: Entity, b: Entity) -> bool {
        let valid = self.entity_valid(a) && self.entity_valid(b);
        if !valid {
            tracing::trace!(a = %a, b = %b, "physics event for invalid entity ignored");
        }
        valid
    }

    fn decode_collision(
        &self,
        a: Entity,
        b: Entity,
        contacts: &[u8],
    ) -> Result<Option<(Collision, Collision)>, BoundaryError> {
        if !self.pair_valid(a, b) {
            return Ok(None);
        }
        let for_a = Collision::decode(b, contacts).map_err(|err| {
            tracing::warn!(a = %a, b = %b, error = %err, "malformed contact payload");
            BoundaryError::from(err)
        })?;
        let for_b = for_a.mirrored(a);
        Ok(Some((for_a, for_b)))
    }

    fn find(&self, id: ScriptId) -> Option<&SharedSlot> {
        self.scripts.iter().find(|s| s.borrow().id == id)
    }

    fn insert(&mut self, id: ScriptId, owner: Option<Entity>, script: Box<dyn Script>) {
        tracing::debug!(script = %id, name = script.name(), owner = ?owner, "script added");
        self.scripts.push(Rc::new(RefCell::new(ScriptSlot {
            id,
            owner,
            state: LifecycleState::Constructed,
            script,
        })));
    }

    fn in_state(&self, state: LifecycleState) -> Vec<SharedSlot> {
        self.scripts
            .iter()
            .filter(|s| s.borrow().state == state)
            .cloned()
            .collect()
    }

    fn create_pending(&mut self) {
        for slot in self.in_state(LifecycleState::Constructed) {
            self.invoke(&slot, "on_create", |s, ctx| s.on_create(ctx));
            advance(&slot, LifecycleState::Created);

            // Subscribed only once the create hook has returned.
            let id = slot.borrow().id;
            let weak = Rc::downgrade(&slot);
            if let Err(err) = self
                .dispatcher
                .subscribe_script(id, move |ctx| update_slot(&weak, ctx))
            {
                tracing::warn!(script = %id, error = %err, "script not subscribed");
            }
        }
    }

    fn start_pending(&mut self) {
        for slot in self.in_state(LifecycleState::Created) {
            self.invoke(&slot, "on_start", |s, ctx| s.on_start(ctx));
            advance(&slot, LifecycleState::Started);
        }
    }

    fn reap_orphans(&mut self) {
        let orphans: Vec<ScriptId> = self
            .scripts
            .iter()
            .map(|s| s.borrow())
            .filter(|s| s.owner.is_some_and(|e| !self.entity_valid(e)))
            .map(|s| s.id)
            .collect();
        for id in orphans {
            tracing::debug!(script = %id, "owner gone, destroying script");
            self.destroy_script(id);
        }
    }

    /// Leave the update signal first, then run the teardown hook.
    fn teardown(&mut self, slot: &SharedSlot) {
        let (id, previous) = {
            let slot = slot.borrow();
            (slot.id, slot.state)
        };
        if let Some(token) = self.dispatcher.token_of(id) {
            self.dispatcher.unsubscribe(token);
        }
        advance(slot, LifecycleState::Destroyed);
        if previous != LifecycleState::Constructed {
            self.invoke(slot, "on_destroy", |s, ctx| s.on_destroy(ctx));
        }
    }

    fn deliver(
        &mut self,
        entity: Entity,
        hook: &'static str,
        mut f: impl FnMut(&mut dyn Script, &mut ScriptContext<'_>) -> ScriptResult,
    ) {
        let targets: Vec<SharedSlot> = self
            .scripts
            .iter()
            .filter(|s| {
                let s = s.borrow();
                s.owner == Some(entity) && s.state.receives_updates()
            })
            .cloned()
            .collect();
        for slot in targets {
            self.invoke(&slot, hook, &mut f);
        }
    }

    /// Run one hook of one script with failures logged.
    fn invoke(
        &mut self,
        slot: &SharedSlot,
        hook: &'static str,
        f: impl FnOnce(&mut dyn Script, &mut ScriptContext<'_>) -> ScriptResult,
    ) {
        let Ok(mut guard) = slot.try_borrow_mut() else {
            tracing::warn!(hook, "script is already running, hook skipped");
            return;
        };
        let slot = &mut *guard;
        let mut ctx = ScriptContext::new(
            &mut self.host,
            &self.dispatcher,
            &mut self.commands,
            &self.settings,
            self.frame,
        )
        .for_script(slot.id, slot.owner);

        let script = slot.script.as_mut();
        let outcome = run_isolated(self.settings.dispatch.isolate_panics, || f(script, &mut ctx));
        if let Err(failure) = outcome {
            tracing::error!(
                script = %slot.id,
                name = slot.script.name(),
                hook,
                error = %failure,
                "script hook failed"
            );
        }
    }

    fn apply_commands(&mut self) {
        loop {
            let queued = self.commands.take();
            if queued.is_empty() {
                break;
            }
            for command in queued {
                match command {
                    Command::Spawn { id, owner, script } => {
                        if let Some(entity) = owner.filter(|&e| !self.entity_valid(e)) {
                            tracing::warn!(
                                script = %id,
                                entity = %entity,
                                "attach to invalid entity dropped"
                            );
                            continue;
                        }
                        self.insert(id, owner, script);
                    }
                    Command::DestroyScript(id) => {
                        self.destroy_script(id);
                    }
                    Command::DestroyEntity(entity) => {
                        self.destroy_entity(entity);
                    }
                }
            }
        }
    }
}

fn advance(slot: &SharedSlot, next: LifecycleState) {
    advance_in_place(&mut slot.borrow_mut(), next);
}

/// Update callback registered for each created script.
fn update_slot(slot: &Weak<RefCell<ScriptSlot>>, ctx: &mut ScriptContext<'_>) -> ScriptResult {
    let Some(shared) = slot.upgrade() else {
        return Ok(());
    };
    let Ok(mut slot) = shared.try_borrow_mut() else {
        return Ok(());
    };
    if !slot.state.receives_updates() {
        tracing::trace!(script = %slot.id, state = ?slot.state, "update skipped before start");
        return Ok(());
    }
    if let Some(owner) = slot.owner {
        if !ctx.world().is_valid(owner) {
            tracing::trace!(script = %slot.id, owner = %owner, "update skipped, owner gone");
            return Ok(());
        }
    }
    if slot.state != LifecycleState::Updating {
        advance_in_place(&mut slot, LifecycleState::Updating);
    }
    let (id, owner, frame) = (slot.id, slot.owner, ctx.frame());
    ctx.scoped(id, owner, |ctx| slot.script.on_update(ctx, frame))
}

fn advance_in_place(slot: &mut ScriptSlot, next: LifecycleState) {
    if slot.state.can_advance_to(next) {
        tracing::debug!(script = %slot.id, from = ?slot.state, to = ?next, "lifecycle");
        slot.state = next;
    }
}
