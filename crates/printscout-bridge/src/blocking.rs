// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Driving an async backend from the blocking capability traits.

use std::future::Future;

use tokio::runtime::{Handle, RuntimeFlavor};

/// Run `future` to completion on `runtime` from synchronous code.
///
/// Safe from a plain thread, from `spawn_blocking`, and from a worker of a
/// multi-threaded runtime (the worker is handed off with `block_in_place`).
/// Async code on a current-thread runtime must not call this; it has no
/// worker to hand off and tokio panics.
pub(crate) fn block_on<F: Future>(runtime: &Handle, future: F) -> F::Output {
    match Handle::try_current().map(|current| current.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => {
            tokio::task::block_in_place(|| runtime.block_on(future))
        }
        _ => runtime.block_on(future),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn callable_from_async_task_on_multi_thread_runtime() {
        let handle = Handle::current();
        let value = block_on(&handle, async { 21 * 2 });
        assert_eq!(value, 42);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn callable_from_spawn_blocking() {
        let handle = Handle::current();
        let value = tokio::task::spawn_blocking(move || {
            block_on(&handle, async {
                tokio::task::yield_now().await;
                7
            })
        })
        .await
        .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn callable_from_spawn_blocking_on_current_thread_runtime() {
        let handle = Handle::current();
        let value = tokio::task::spawn_blocking(move || block_on(&handle, async { "ok" }))
            .await
            .unwrap();
        assert_eq!(value, "ok");
    }

    #[test]
    fn callable_outside_any_runtime() {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        assert_eq!(block_on(runtime.handle(), async { 3 }), 3);
    }
}
