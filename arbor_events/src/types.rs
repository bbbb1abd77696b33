// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Phase tags, registration options and the event handed to handlers.

/// The propagation phase an emission is delivered in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Downward pass, root toward target (ancestors of the target only).
    Capture,
    /// At the target itself. Reaches every listener regardless of registration.
    Target,
    /// Upward pass, target toward root (ancestors of the target only).
    Bubble,
}

/// The phase(s) a listener registers for.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Listen {
    /// Only capture-phase (and target) deliveries.
    Capture,
    /// Only bubble-phase (and target) deliveries.
    #[default]
    Bubble,
    /// Every delivery.
    Both,
}

impl Listen {
    /// Whether a listener registered this way is invoked for an emission in `phase`.
    pub fn matches(self, phase: Phase) -> bool {
        match (self, phase) {
            (Self::Both, _) | (_, Phase::Target) => true,
            (Self::Capture, Phase::Capture) | (Self::Bubble, Phase::Bubble) => true,
            (Self::Capture, Phase::Bubble) | (Self::Bubble, Phase::Capture) => false,
        }
    }
}

/// Options for registering a listener.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ListenOptions {
    /// Phase(s) to listen to. Defaults to [`Listen::Bubble`].
    pub listen: Listen,
    /// Higher priorities run first; equal priorities run in registration order.
    pub priority: i32,
}

impl ListenOptions {
    /// Capture-phase listener at priority zero.
    pub fn capture() -> Self {
        Self {
            listen: Listen::Capture,
            ..Self::default()
        }
    }

    /// Listener for every phase at priority zero.
    pub fn both() -> Self {
        Self {
            listen: Listen::Both,
            ..Self::default()
        }
    }

    /// Same options with a different priority.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

/// Propagation result of an emission.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// No handler stopped propagation.
    Continue,
    /// A handler stopped propagation (immediately or after the current dispatcher).
    Stop,
}

/// What a handler sees: the event name, the phase being delivered, and the payload.
#[derive(Debug)]
pub struct Event<'a, P> {
    name: &'a str,
    phase: Phase,
    /// Caller-owned payload; handlers may mutate it to report results.
    pub payload: &'a mut P,
    stop_propagation: bool,
    stop_immediate: bool,
}

impl<'a, P> Event<'a, P> {
    /// Wrap a payload for delivery.
    pub fn new(name: &'a str, phase: Phase, payload: &'a mut P) -> Self {
        Self {
            name,
            phase,
            payload,
            stop_propagation: false,
            stop_immediate: false,
        }
    }

    /// Name the event was emitted under.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Phase being delivered.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Let the remaining listeners of the current dispatcher run, then stop.
    pub fn stop_propagation(&mut self) {
        self.stop_propagation = true;
    }

    /// Stop before the next listener, including listeners on the current dispatcher.
    pub fn stop_immediate_propagation(&mut self) {
        self.stop_propagation = true;
        self.stop_immediate = true;
    }

    /// Whether any stop was requested.
    pub fn is_propagation_stopped(&self) -> bool {
        self.stop_propagation
    }

    /// Whether an immediate stop was requested.
    pub fn is_immediate_propagation_stopped(&self) -> bool {
        self.stop_immediate
    }

    /// Propagation result so far.
    pub fn outcome(&self) -> Outcome {
        if self.stop_propagation {
            Outcome::Stop
        } else {
            Outcome::Continue
        }
    }
}
