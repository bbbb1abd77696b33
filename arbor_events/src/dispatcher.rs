// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener registry and synchronous fan-out.
//!
//! ## Semantics
//!
//! - Listeners for one name are kept in descending priority order; equal priorities keep
//!   registration order.
//! - Registering a handler that is already registered for the same name and [`Listen`] is
//!   a no-op.
//! - [`EventDispatcher::emit`] takes a snapshot of the matching listeners before invoking any
//!   of them. Listeners added or removed by a handler do not change the current emission, so
//!   nothing is skipped or invoked twice.
//! - A `once` listener is unregistered right before it is invoked. If it was already
//!   unregistered (for example by an earlier handler of the same emission), it is skipped.
//! - [`Event::stop_immediate_propagation`] ends the loop before the next listener.
//!
//! ## Driving emission from outside
//!
//! When the dispatcher lives inside the context handed to its own handlers (a scene storing
//! one dispatcher per node, say), `emit` cannot borrow both. Use
//! [`EventDispatcher::matching`] to take the snapshot, then [`run`] with a `retire` callback
//! that reaches the dispatcher through the context.
//!
//! ```
//! use arbor_events::dispatcher::{EventDispatcher, Handler, Registration, run};
//! use arbor_events::types::{ListenOptions, Outcome, Phase};
//!
//! struct Ctx {
//!     events: EventDispatcher<Ctx, ()>,
//!     hits: u32,
//! }
//!
//! let mut ctx = Ctx { events: EventDispatcher::new(), hits: 0 };
//! let h: Handler<Ctx, ()> = Handler::new(|ctx: &mut Ctx, _| {
//!     ctx.hits += 1;
//!     // The handler may freely mutate the registry it was invoked from.
//!     ctx.events.remove_all(None);
//! });
//! ctx.events.once("ping", &h, ListenOptions::default());
//!
//! let snapshot = ctx.events.matching("ping", Phase::Target);
//! let retire = |ctx: &mut Ctx, reg: &Registration<Ctx, ()>| ctx.events.retire("ping", reg);
//! let outcome = run(&mut ctx, &snapshot, "ping", Phase::Target, &mut (), retire);
//! assert_eq!(outcome, Outcome::Continue);
//! assert_eq!(ctx.hits, 1);
//! assert!(!ctx.events.has_listeners("ping"));
//! ```

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::alias::expand;
use crate::types::{Event, Listen, ListenOptions, Outcome, Phase};

type HandlerFn<C, P> = dyn Fn(&mut C, &mut Event<'_, P>);

/// A shared, identity-comparable event handler.
///
/// Clones share identity: a clone passed to [`EventDispatcher::off`] removes the registration
/// made with the original.
pub struct Handler<C, P>(Rc<HandlerFn<C, P>>);

impl<C, P> Handler<C, P> {
    /// Wrap a closure.
    pub fn new(f: impl Fn(&mut C, &mut Event<'_, P>) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Whether `self` and `other` are the same handler (not merely equal behavior).
    pub fn same(&self, other: &Self) -> bool {
        core::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }

    /// Invoke the handler.
    pub fn call(&self, ctx: &mut C, event: &mut Event<'_, P>) {
        (self.0)(ctx, event);
    }
}

impl<C, P> Clone for Handler<C, P> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<C, P> fmt::Debug for Handler<C, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// One stored listener.
pub struct Registration<C, P> {
    handler: Handler<C, P>,
    listen: Listen,
    priority: i32,
    once: bool,
}

impl<C, P> Registration<C, P> {
    /// The registered handler.
    pub fn handler(&self) -> &Handler<C, P> {
        &self.handler
    }

    /// Phase(s) it listens to.
    pub fn listen(&self) -> Listen {
        self.listen
    }

    /// Ordering priority; higher runs first.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Whether it unregisters itself on first invocation.
    pub fn is_once(&self) -> bool {
        self.once
    }

    fn is(&self, handler: &Handler<C, P>, listen: Listen) -> bool {
        self.listen == listen && self.handler.same(handler)
    }
}

impl<C, P> Clone for Registration<C, P> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            listen: self.listen,
            priority: self.priority,
            once: self.once,
        }
    }
}

impl<C, P> fmt::Debug for Registration<C, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("handler", &self.handler)
            .field("listen", &self.listen)
            .field("priority", &self.priority)
            .field("once", &self.once)
            .finish()
    }
}

/// Listeners for a single name. The common case of exactly one listener stays inline.
type Slot<C, P> = SmallVec<[Registration<C, P>; 1]>;

/// Per-name, priority-ordered listener registry.
///
/// `C` is the context handed to handlers by mutable reference; `P` is the payload type.
pub struct EventDispatcher<C, P> {
    listeners: HashMap<String, Slot<C, P>>,
}

impl<C, P> fmt::Debug for EventDispatcher<C, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.listeners.iter().map(|(k, v)| (k, v.len())))
            .finish()
    }
}

impl<C, P> Default for EventDispatcher<C, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, P> EventDispatcher<C, P> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
        }
    }

    /// Register `handler` for `name` (both primitives when `name` is an alias).
    pub fn on(&mut self, name: &str, handler: &Handler<C, P>, options: ListenOptions) {
        self.register(name, handler, options, false);
    }

    /// Like [`on`](Self::on), but the listener unregisters itself before its first invocation.
    pub fn once(&mut self, name: &str, handler: &Handler<C, P>, options: ListenOptions) {
        self.register(name, handler, options, true);
    }

    /// Unregister `handler` from `name` (both primitives when `name` is an alias).
    ///
    /// With `listen` set, only the registration for that phase is removed; with `None`, every
    /// registration of `handler` under `name` is. Names left without listeners are dropped.
    pub fn off(&mut self, name: &str, handler: &Handler<C, P>, listen: Option<Listen>) {
        for primitive in expand(name) {
            let Some(slot) = self.listeners.get_mut(primitive) else {
                continue;
            };
            slot.retain(|r| !(r.handler.same(handler) && listen.is_none_or(|l| r.listen == l)));
            if slot.is_empty() {
                self.listeners.remove(primitive);
            }
            tracing::trace!(event = primitive, "listener removed");
        }
    }

    /// Drop every listener for `name`, or every listener at all with `None`.
    ///
    /// An alias name clears both of its primitives.
    pub fn remove_all(&mut self, name: Option<&str>) {
        match name {
            Some(name) => {
                for primitive in expand(name) {
                    self.listeners.remove(primitive);
                }
            }
            None => self.listeners.clear(),
        }
    }

    /// Remove a `once` registration ahead of its invocation.
    ///
    /// Returns `false` when it is no longer registered, in which case it must not be invoked.
    pub fn retire(&mut self, name: &str, registration: &Registration<C, P>) -> bool {
        let Some(slot) = self.listeners.get_mut(name) else {
            return false;
        };
        let Some(pos) = slot
            .iter()
            .position(|r| r.once && r.is(&registration.handler, registration.listen))
        else {
            return false;
        };
        slot.remove(pos);
        if slot.is_empty() {
            self.listeners.remove(name);
        }
        true
    }

    /// Number of listeners registered for the primitive `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.get(name).map_or(0, |slot| slot.len())
    }

    /// Whether anything listens to the primitive `name`.
    pub fn has_listeners(&self, name: &str) -> bool {
        self.listener_count(name) > 0
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Names with at least one listener, in unspecified order.
    pub fn event_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.listeners.keys().map(String::as_str)
    }

    /// Snapshot of the listeners an emission of `name` in `phase` would invoke, in order.
    pub fn matching(&self, name: &str, phase: Phase) -> Vec<Registration<C, P>> {
        self.listeners
            .get(name)
            .map(|slot| {
                slot.iter()
                    .filter(|r| r.listen.matches(phase))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Deliver `payload` under `name` in `phase` to the matching listeners.
    ///
    /// `name` is not alias-expanded: input layers emit primitives.
    pub fn emit(&mut self, ctx: &mut C, name: &str, phase: Phase, payload: &mut P) -> Outcome {
        let snapshot = self.matching(name, phase);
        run(ctx, &snapshot, name, phase, payload, |_, reg| self.retire(name, reg))
    }

    fn register(
        &mut self,
        name: &str,
        handler: &Handler<C, P>,
        options: ListenOptions,
        once: bool,
    ) {
        for primitive in expand(name) {
            let slot = self.listeners.entry_ref(primitive).or_default();
            if slot.iter().any(|r| r.is(handler, options.listen)) {
                continue;
            }
            let pos = slot
                .iter()
                .position(|r| r.priority < options.priority)
                .unwrap_or(slot.len());
            slot.insert(
                pos,
                Registration {
                    handler: handler.clone(),
                    listen: options.listen,
                    priority: options.priority,
                    once,
                },
            );
            tracing::trace!(
                event = primitive,
                priority = options.priority,
                once,
                "listener added"
            );
        }
    }
}

/// Invoke a snapshot of registrations in order and honor stop requests.
///
/// `retire` is called for each `once` registration right before it would run; returning
/// `false` skips it. The event is delivered with the given `name` and `phase`.
pub fn run<C, P>(
    ctx: &mut C,
    snapshot: &[Registration<C, P>],
    name: &str,
    phase: Phase,
    payload: &mut P,
    mut retire: impl FnMut(&mut C, &Registration<C, P>) -> bool,
) -> Outcome {
    let mut event = Event::new(name, phase, payload);
    for reg in snapshot {
        if reg.once && !retire(ctx, reg) {
            continue;
        }
        reg.handler.call(ctx, &mut event);
        if event.is_immediate_propagation_stopped() {
            break;
        }
    }
    event.outcome()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alias::{self, primitive};
    use alloc::vec;

    type Log = Vec<&'static str>;

    fn logger(tag: &'static str) -> Handler<Log, ()> {
        Handler::new(move |log: &mut Log, _| log.push(tag))
    }

    #[test]
    fn priority_orders_listeners_and_ties_keep_registration_order() {
        let mut d = EventDispatcher::new();
        d.on("e", &logger("low"), ListenOptions::default().with_priority(-1));
        d.on("e", &logger("first"), ListenOptions::default());
        d.on("e", &logger("high"), ListenOptions::default().with_priority(5));
        d.on("e", &logger("second"), ListenOptions::default());

        let mut log = Log::new();
        d.emit(&mut log, "e", Phase::Target, &mut ());
        assert_eq!(log, vec!["high", "first", "second", "low"]);
    }

    #[test]
    fn duplicate_registration_is_ignored() {
        let mut d = EventDispatcher::new();
        let h = logger("a");
        d.on("e", &h, ListenOptions::default());
        d.on("e", &h.clone(), ListenOptions::default());
        assert_eq!(d.listener_count("e"), 1);

        // The same handler may still listen to the other phase.
        d.on("e", &h, ListenOptions::capture());
        assert_eq!(d.listener_count("e"), 2);
    }

    #[test]
    fn single_listener_stays_inline() {
        let mut d: EventDispatcher<Log, ()> = EventDispatcher::new();
        d.on("e", &logger("a"), ListenOptions::default());
        assert!(!d.listeners["e"].spilled());
        d.on("e", &logger("b"), ListenOptions::default());
        assert!(d.listeners["e"].spilled());
    }

    #[test]
    fn capture_and_bubble_are_filtered() {
        let mut d = EventDispatcher::new();
        d.on("e", &logger("capture"), ListenOptions::capture());
        d.on("e", &logger("bubble"), ListenOptions::default());
        d.on("e", &logger("both"), ListenOptions::both());

        let mut log = Log::new();
        d.emit(&mut log, "e", Phase::Bubble, &mut ());
        assert_eq!(log, vec!["bubble", "both"]);

        log.clear();
        d.emit(&mut log, "e", Phase::Capture, &mut ());
        assert_eq!(log, vec!["capture", "both"]);

        log.clear();
        d.emit(&mut log, "e", Phase::Target, &mut ());
        assert_eq!(log, vec!["capture", "bubble", "both"]);
    }

    #[test]
    fn once_fires_a_single_time() {
        let mut d = EventDispatcher::new();
        d.once("e", &logger("once"), ListenOptions::default());
        d.on("e", &logger("always"), ListenOptions::default());

        let mut log = Log::new();
        d.emit(&mut log, "e", Phase::Target, &mut ());
        d.emit(&mut log, "e", Phase::Target, &mut ());
        assert_eq!(log, vec!["once", "always", "always"]);
        assert_eq!(d.listener_count("e"), 1);
    }

    #[test]
    fn once_removal_does_not_skip_the_next_listener() {
        let mut d = EventDispatcher::new();
        d.once("e", &logger("a"), ListenOptions::default());
        d.once("e", &logger("b"), ListenOptions::default());
        d.on("e", &logger("c"), ListenOptions::default());

        let mut log = Log::new();
        d.emit(&mut log, "e", Phase::Target, &mut ());
        assert_eq!(log, vec!["a", "b", "c"]);
        assert!(d.has_listeners("e"));
        d.remove_all(Some("e"));
        assert!(!d.has_listeners("e"));
        assert!(d.is_empty());
    }

    #[test]
    fn stop_immediate_halts_remaining_listeners() {
        let mut d = EventDispatcher::new();
        d.on(
            "e",
            &Handler::new(|log: &mut Log, ev| {
                log.push("stopper");
                ev.stop_immediate_propagation();
            }),
            ListenOptions::default().with_priority(1),
        );
        d.on("e", &logger("never"), ListenOptions::default());

        let mut log = Log::new();
        let outcome = d.emit(&mut log, "e", Phase::Target, &mut ());
        assert_eq!(outcome, Outcome::Stop);
        assert_eq!(log, vec!["stopper"]);
    }

    #[test]
    fn stop_propagation_lets_siblings_finish() {
        let mut d = EventDispatcher::new();
        d.on(
            "e",
            &Handler::new(|log: &mut Log, ev| {
                log.push("stopper");
                ev.stop_propagation();
            }),
            ListenOptions::default().with_priority(1),
        );
        d.on("e", &logger("sibling"), ListenOptions::default());

        let mut log = Log::new();
        let outcome = d.emit(&mut log, "e", Phase::Target, &mut ());
        assert_eq!(outcome, Outcome::Stop);
        assert_eq!(log, vec!["stopper", "sibling"]);
    }

    #[test]
    fn off_filters_by_handler_and_phase() {
        let mut d = EventDispatcher::new();
        let h = logger("h");
        let other = logger("other");
        d.on("e", &h, ListenOptions::capture());
        d.on("e", &h, ListenOptions::default());
        d.on("e", &other, ListenOptions::default());

        d.off("e", &h, Some(Listen::Capture));
        assert_eq!(d.listener_count("e"), 2);
        d.off("e", &h, None);
        assert_eq!(d.listener_count("e"), 1);
        d.off("e", &other, None);
        assert!(!d.has_listeners("e"));
        assert_eq!(d.event_names().count(), 0);
    }

    #[test]
    fn off_with_unknown_handler_keeps_others() {
        let mut d = EventDispatcher::new();
        d.on("e", &logger("kept"), ListenOptions::default());
        d.off("e", &logger("stranger"), None);
        d.off("missing", &logger("stranger"), None);
        assert_eq!(d.listener_count("e"), 1);
    }

    #[test]
    fn alias_registers_and_removes_both_primitives() {
        let mut d = EventDispatcher::new();
        let h = logger("tap");
        d.on(alias::TAP, &h, ListenOptions::capture().with_priority(3));
        for name in [primitive::CLICK, primitive::TAP] {
            let regs = d.matching(name, Phase::Capture);
            assert_eq!(regs.len(), 1);
            assert_eq!(regs[0].priority(), 3);
            assert_eq!(regs[0].listen(), Listen::Capture);
        }

        let mut log = Log::new();
        d.emit(&mut log, primitive::CLICK, Phase::Capture, &mut ());
        d.emit(&mut log, primitive::TAP, Phase::Capture, &mut ());
        assert_eq!(log, vec!["tap", "tap"]);

        d.off(alias::TAP, &h, None);
        assert!(d.is_empty());
    }

    #[test]
    fn payload_is_mutable_by_handlers() {
        let mut d: EventDispatcher<(), u32> = EventDispatcher::new();
        d.on(
            "e",
            &Handler::new(|_, ev| *ev.payload += 1),
            ListenOptions::both(),
        );
        let mut payload = 41;
        d.emit(&mut (), "e", Phase::Bubble, &mut payload);
        assert_eq!(payload, 42);
    }

    #[test]
    fn retired_once_registration_is_skipped() {
        let mut d = EventDispatcher::new();
        d.once("e", &logger("once"), ListenOptions::default());
        d.on("e", &logger("always"), ListenOptions::default());
        let snapshot = d.matching("e", Phase::Target);

        // Something else retired it between the snapshot and the run.
        assert!(d.retire("e", &snapshot[0]));
        let mut log = Log::new();
        let outcome = run(&mut log, &snapshot, "e", Phase::Target, &mut (), |_, reg| {
            d.retire("e", reg)
        });
        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(log, vec!["always"]);
        assert_eq!(d.listener_count("e"), 1);
    }
}
