// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Exception hygiene for calls into the JVM.
//
// A Java method that throws leaves the exception pending on the calling
// thread, and nearly every JNI function is illegal until it is cleared.
// Bridge threads stay attached between scans, so every bridge call clears
// whatever is pending both before it starts and after it returns.

/// The part of a JNI environment that deals with pending exceptions.
pub(crate) trait PendingException {
    /// Whether a Java exception is pending on this thread.
    fn exception_pending(&mut self) -> bool;
    /// Clear the pending exception.
    fn clear_exception(&mut self);
}

/// Run `call` against `env`, leaving no Java exception behind.
///
/// The call's own result is returned untouched; a method that threw has
/// already surfaced as an `Err` from the JNI wrapper.
pub(crate) fn run_clean<E, R>(env: &mut E, what: &str, call: impl FnOnce(&mut E) -> R) -> R
where
    E: PendingException + ?Sized,
{
    if discard_pending(env) {
        tracing::warn!(call = what, "stale Java exception cleared before call");
    }
    let result = call(env);
    if discard_pending(env) {
        tracing::debug!(call = what, "Java exception cleared after call");
    }
    result
}

fn discard_pending<E: PendingException + ?Sized>(env: &mut E) -> bool {
    if !env.exception_pending() {
        return false;
    }
    env.clear_exception();
    true
}
