//! Cooperative interrupt flag for the current OS thread.
//!
//! Rust has no built-in analogue of a JVM thread's interrupt flag, which the
//! sync pipe contract (spec.md §4.B) relies on: `peek()` must not propagate
//! `Interrupted` as an error, but instead set the calling thread's interrupt
//! flag and return end-of-stream. This module gives every thread its own
//! flag via `thread_local!` so that convention can be honored without
//! threading an extra parameter through every pipe call.

use std::cell::Cell;

thread_local! {
    static INTERRUPTED: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as interrupted.
pub fn interrupt_current_thread() {
    INTERRUPTED.with(|f| f.set(true));
}

/// Returns whether the current thread has been marked interrupted, without
/// clearing the flag.
pub fn is_current_thread_interrupted() -> bool {
    INTERRUPTED.with(|f| f.get())
}

/// Clears the current thread's interrupt flag, returning its prior value —
/// mirrors `Thread.interrupted()` semantics (test-and-clear).
pub fn take_current_thread_interrupted() -> bool {
    INTERRUPTED.with(|f| f.replace(false))
}
