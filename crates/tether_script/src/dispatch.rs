//! Per-frame update signal
//!
//! Subscribers are invoked in subscription order. A dispatch iterates a
//! snapshot taken when it starts: callbacks subscribed or unsubscribed
//! while it runs are seen from the next frame on.
//!
//! One failing callback never stops the frame. Errors, and panics unless
//! `dispatch.isolate_panics` is off, are logged and counted in the
//! [`DispatchReport`].

use crate::context::{Commands, ScriptContext};
use crate::script::ScriptId;
use crate::settings::RuntimeSettings;
use crate::{BoundaryError, NativeHost, ScriptResult};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::Instant;
use tether_core::FrameTime;

type Callback = dyn FnMut(&mut ScriptContext<'_>) -> ScriptResult;

/// Names one subscription. Tokens are never reused.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionToken(u64);

impl fmt::Display for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub:{}", self.0)
    }
}

/// Outcome of one [`Dispatcher::dispatch_frame`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Index of the dispatched frame, starting at 1.
    pub frame: u64,
    pub invoked: usize,
    pub failed: usize,
}

#[derive(Clone)]
struct Subscriber {
    token: SubscriptionToken,
    script: Option<ScriptId>,
    callback: Rc<RefCell<Box<Callback>>>,
}

pub struct Dispatcher {
    subscribers: RefCell<Vec<Subscriber>>,
    next_token: Cell<u64>,
    frames: Cell<u64>,
    dispatching: Cell<bool>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            subscribers: RefCell::new(Vec::new()),
            next_token: Cell::new(1),
            frames: Cell::new(0),
            dispatching: Cell::new(false),
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionToken
    where
        F: FnMut(&mut ScriptContext<'_>) -> ScriptResult + 'static,
    {
        self.push(None, Box::new(callback))
    }

    /// Subscribe on behalf of a script. A script holds at most one
    /// subscription.
    pub fn subscribe_script<F>(
        &self,
        script: ScriptId,
        callback: F,
    ) -> Result<SubscriptionToken, BoundaryError>
    where
        F: FnMut(&mut ScriptContext<'_>) -> ScriptResult + 'static,
    {
        if self.token_of(script).is_some() {
            return Err(BoundaryError::DuplicateSubscription { script });
        }
        Ok(self.push(Some(script), Box::new(callback)))
    }

    /// Remove a subscription. Unknown or already removed tokens are ignored.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        match subscribers.iter().position(|s| s.token == token) {
            Some(index) => {
                subscribers.remove(index);
                tracing::trace!(token = %token, "unsubscribed");
                true
            }
            None => {
                tracing::trace!(token = %token, "unsubscribe of unknown token ignored");
                false
            }
        }
    }

    pub fn is_subscribed(&self, token: SubscriptionToken) -> bool {
        self.subscribers.borrow().iter().any(|s| s.token == token)
    }

    pub fn token_of(&self, script: ScriptId) -> Option<SubscriptionToken> {
        self.subscribers
            .borrow()
            .iter()
            .find(|s| s.script == Some(script))
            .map(|s| s.token)
    }

    pub fn len(&self) -> usize {
        self.subscribers.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.borrow().is_empty()
    }

    /// Frames dispatched so far.
    pub fn frame_count(&self) -> u64 {
        self.frames.get()
    }

    /// Invoke every subscribed callback once, in subscription order.
    ///
    /// A nested call from inside a callback is refused and reports nothing.
    pub fn dispatch_frame(
        &self,
        host: &mut dyn NativeHost,
        commands: &mut Commands,
        settings: &RuntimeSettings,
        frame: FrameTime,
    ) -> DispatchReport {
        let Some(_guard) = DispatchGuard::enter(&self.dispatching) else {
            tracing::warn!("nested dispatch_frame ignored");
            return DispatchReport {
                frame: self.frames.get(),
                ..Default::default()
            };
        };

        let index = self.frames.get() + 1;
        self.frames.set(index);
        let snapshot = self.subscribers.borrow().clone();
        let mut report = DispatchReport {
            frame: index,
            ..Default::default()
        };

        for subscriber in &snapshot {
            let mut ctx = ScriptContext::new(&mut *host, self, &mut *commands, settings, frame);
            let Ok(mut callback) = subscriber.callback.try_borrow_mut() else {
                continue;
            };
            let started = Instant::now();
            let outcome = run_isolated(settings.dispatch.isolate_panics, || (*callback)(&mut ctx));
            report.invoked += 1;

            if let Err(failure) = outcome {
                report.failed += 1;
                tracing::error!(
                    token = %subscriber.token,
                    script = ?subscriber.script,
                    frame = index,
                    error = %failure,
                    "update callback failed"
                );
            }

            if let Some(budget) = settings.dispatch.slow_callback_warn_ms {
                let elapsed = started.elapsed().as_secs_f64() * 1000.0;
                if elapsed > budget {
                    tracing::warn!(
                        token = %subscriber.token,
                        frame = index,
                        elapsed_ms = elapsed,
                        budget_ms = budget,
                        "slow update callback"
                    );
                }
            }
        }

        report
    }

    fn push(&self, script: Option<ScriptId>, callback: Box<Callback>) -> SubscriptionToken {
        let token = SubscriptionToken(self.next_token.get());
        self.next_token.set(token.0 + 1);
        self.subscribers.borrow_mut().push(Subscriber {
            token,
            script,
            callback: Rc::new(RefCell::new(callback)),
        });
        tracing::trace!(token = %token, script = ?script, "subscribed");
        token
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("subscribers", &self.len())
            .field("frames", &self.frames.get())
            .finish()
    }
}

/// Clears the dispatching flag even if a callback unwinds.
struct DispatchGuard<'a>(&'a Cell<bool>);

impl<'a> DispatchGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self(flag))
        }
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Why a hook did not complete.
#[derive(Debug)]
pub(crate) enum Failure {
    Error(Box<dyn std::error::Error>),
    Panic(String),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Error(err) => fmt::Display::fmt(err, f),
            Failure::Panic(msg) => write!(f, "panicked: {msg}"),
        }
    }
}

pub(crate) fn run_isolated(isolate: bool, f: impl FnOnce() -> ScriptResult) -> Result<(), Failure> {
    if !isolate {
        return f().map_err(Failure::Error);
    }
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result.map_err(Failure::Error),
        Err(payload) => Err(Failure::Panic(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessHost;

    struct Rig {
        host: HeadlessHost,
        commands: Commands,
        settings: RuntimeSettings,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                host: HeadlessHost::new(),
                commands: Commands::new(),
                settings: RuntimeSettings::default(),
            }
        }

        fn dispatch(&mut self, dispatcher: &Dispatcher) -> DispatchReport {
            dispatcher.dispatch_frame(
                &mut self.host,
                &mut self.commands,
                &self.settings,
                FrameTime::new(0.016, 1.0),
            )
        }
    }

    fn recorder(
        log: &Rc<RefCell<Vec<&'static str>>>,
        name: &'static str,
    ) -> impl FnMut(&mut ScriptContext<'_>) -> ScriptResult {
        let log = Rc::clone(log);
        move |_| {
            log.borrow_mut().push(name);
            Ok(())
        }
    }

    #[test]
    fn invokes_in_subscription_order() {
        let mut rig = Rig::new();
        let dispatcher = Dispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        dispatcher.subscribe(recorder(&log, "A"));
        let b = dispatcher.subscribe(recorder(&log, "B"));
        dispatcher.subscribe(recorder(&log, "C"));

        rig.dispatch(&dispatcher);
        assert_eq!(*log.borrow(), ["A", "B", "C"]);

        log.borrow_mut().clear();
        assert!(dispatcher.unsubscribe(b));
        let report = rig.dispatch(&dispatcher);
        assert_eq!(*log.borrow(), ["A", "C"]);
        assert_eq!(report.frame, 2);
        assert_eq!(report.invoked, 2);
    }

    #[test]
    fn unsubscribe_is_idempotent() {
        let dispatcher = Dispatcher::new();
        let token = dispatcher.subscribe(|_| Ok(()));
        assert!(dispatcher.unsubscribe(token));
        assert!(!dispatcher.unsubscribe(token));
        assert!(!dispatcher.unsubscribe(SubscriptionToken(999)));
        assert!(dispatcher.is_empty());
    }

    #[test]
    fn failing_callback_does_not_stop_the_frame() {
        let mut rig = Rig::new();
        let dispatcher = Dispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        dispatcher.subscribe(|_| Err("boom".into()));
        dispatcher.subscribe(recorder(&log, "after"));

        let report = rig.dispatch(&dispatcher);
        assert_eq!(*log.borrow(), ["after"]);
        assert_eq!(report.failed, 1);
        assert_eq!(report.invoked, 2);
    }

    #[test]
    fn panicking_callback_is_isolated() {
        let mut rig = Rig::new();
        let dispatcher = Dispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        dispatcher.subscribe(|_| panic!("script bug"));
        dispatcher.subscribe(recorder(&log, "after"));

        let report = rig.dispatch(&dispatcher);
        assert_eq!(*log.borrow(), ["after"]);
        assert_eq!(report.failed, 1);

        // The dispatcher is usable again afterwards.
        let report = rig.dispatch(&dispatcher);
        assert_eq!(report.frame, 2);
    }

    #[test]
    fn changes_during_dispatch_apply_next_frame() {
        let mut rig = Rig::new();
        let dispatcher = Dispatcher::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let victim = Rc::new(Cell::new(None));
        {
            let log = Rc::clone(&log);
            let victim = Rc::clone(&victim);
            dispatcher.subscribe(move |ctx| {
                log.borrow_mut().push("A");
                if let Some(token) = victim.take() {
                    ctx.dispatcher().unsubscribe(token);
                    ctx.dispatcher().subscribe(recorder(&log, "D"));
                }
                Ok(())
            });
        }
        victim.set(Some(dispatcher.subscribe(recorder(&log, "B"))));
        dispatcher.subscribe(recorder(&log, "C"));

        rig.dispatch(&dispatcher);
        assert_eq!(*log.borrow(), ["A", "B", "C"]);

        log.borrow_mut().clear();
        rig.dispatch(&dispatcher);
        assert_eq!(*log.borrow(), ["A", "C", "D"]);
    }

    #[test]
    fn one_subscription_per_script() {
        let dispatcher = Dispatcher::new();
        let script = ScriptId::next();
        let token = dispatcher.subscribe_script(script, |_| Ok(())).unwrap();
        assert_eq!(
            dispatcher.subscribe_script(script, |_| Ok(())),
            Err(BoundaryError::DuplicateSubscription { script })
        );
        assert_eq!(dispatcher.token_of(script), Some(token));

        dispatcher.unsubscribe(token);
        assert!(dispatcher.subscribe_script(script, |_| Ok(())).is_ok());
    }

    #[test]
    fn nested_dispatch_is_refused() {
        let mut rig = Rig::new();
        let dispatcher = Dispatcher::new();
        let nested = Rc::new(Cell::new(None));
        {
            let nested = Rc::clone(&nested);
            dispatcher.subscribe(move |ctx| {
                let mut commands = Commands::new();
                let settings = RuntimeSettings::default();
                let mut host = HeadlessHost::new();
                let report =
                    ctx.dispatcher()
                        .dispatch_frame(&mut host, &mut commands, &settings, ctx.frame());
                nested.set(Some(report.invoked));
                Ok(())
            });
        }

        let report = rig.dispatch(&dispatcher);
        assert_eq!(report.invoked, 1);
        assert_eq!(nested.get(), Some(0));
    }
}
