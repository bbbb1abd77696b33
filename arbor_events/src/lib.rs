// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=arbor_events --heading-base-level=0

//! Arbor Events: a deterministic, `no_std` listener registry with explicit propagation phases.
//!
//! ## Overview
//!
//! [`EventDispatcher`](dispatcher::EventDispatcher) stores listeners per event name, keeps them
//! ordered by descending priority, and invokes them synchronously on
//! [`emit`](dispatcher::EventDispatcher::emit).
//! It does not walk a tree by itself; a scene (or any other owner) decides which dispatchers
//! to emit on and in which [`Phase`](types::Phase).
//!
//! ## Phases
//!
//! Every registration names the phase it listens to with [`Listen`](types::Listen):
//! `Capture`, `Bubble`, or `Both`. Every emission names the phase being delivered:
//!
//! - [`Phase::Capture`](types::Phase::Capture) reaches `Capture` and `Both` listeners.
//! - [`Phase::Bubble`](types::Phase::Bubble) reaches `Bubble` and `Both` listeners.
//! - [`Phase::Target`](types::Phase::Target) reaches every listener. This is what an emission
//!   without any phase discriminator means.
//!
//! A single logical interaction can therefore be delivered twice, once per phase, and each
//! listener fires only in the phase it registered for.
//!
//! ## Handlers and identity
//!
//! Handlers are reference-counted closures ([`Handler`](dispatcher::Handler)). Cloning a
//! handler keeps its identity, which is what [`off`](dispatcher::EventDispatcher::off) and
//! duplicate detection compare. Handlers receive a caller-chosen context `C` by mutable
//! reference, so a scene can hand itself to its listeners.
//!
//! ## Aliases
//!
//! The names in [`alias`] are high-level touch/gesture names. Registering or removing one
//! applies to both of its primitive names (pointer and touch) at once.
//!
//! ```
//! use arbor_events::alias::{TAP, primitive};
//! use arbor_events::dispatcher::{EventDispatcher, Handler};
//! use arbor_events::types::{ListenOptions, Phase};
//!
//! let mut events: EventDispatcher<u32, ()> = EventDispatcher::new();
//! let count: Handler<u32, ()> = Handler::new(|taps, _| *taps += 1);
//! events.on(TAP, &count, ListenOptions::default());
//!
//! let mut taps = 0;
//! events.emit(&mut taps, primitive::CLICK, Phase::Bubble, &mut ());
//! events.emit(&mut taps, primitive::TAP, Phase::Bubble, &mut ());
//! assert_eq!(taps, 2);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod alias;
pub mod dispatcher;
pub mod types;
