//! Lifetime guard for anything a view starts.
//!
//! A view subscribes to shared streams and fires requests; once it is torn
//! down none of that may reach it again. [`ViewScope`] ties those tasks to
//! one owner: closing the scope (or dropping it) stops stream forwarding and
//! suppresses the delivery of requests still in flight. The requests
//! themselves are not aborted.

use std::future::Future;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

pub struct ViewScope {
    closed_tx: watch::Sender<bool>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl ViewScope {
    pub fn new() -> Self {
        let (closed_tx, _) = watch::channel(false);
        Self {
            closed_tx,
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn is_closed(&self) -> bool {
        *self.closed_tx.borrow()
    }

    /// Forward every value of `stream`, starting with the current one, to
    /// `on_value` until the scope closes or the publisher goes away.
    pub fn watch<T, F>(&self, mut stream: watch::Receiver<T>, mut on_value: F)
    where
        T: Clone + Send + Sync + 'static,
        F: FnMut(T) + Send + 'static,
    {
        let mut closed_rx = self.closed_tx.subscribe();
        if *closed_rx.borrow() {
            return;
        }

        let handle = tokio::spawn(async move {
            let first = stream.borrow_and_update().clone();
            on_value(first);
            loop {
                tokio::select! {
                    biased;
                    _ = closed_rx.changed() => break,
                    changed = stream.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let value = stream.borrow_and_update().clone();
                        if *closed_rx.borrow() {
                            break;
                        }
                        on_value(value);
                    }
                }
            }
        });
        self.track(handle);
    }

    /// Run `request` to completion and hand its output to `on_done`, unless
    /// the scope was closed in the meantime.
    pub fn deliver<Fut, F>(&self, request: Fut, on_done: F)
    where
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
        F: FnOnce(Fut::Output) + Send + 'static,
    {
        let closed_rx = self.closed_tx.subscribe();
        let handle = tokio::spawn(async move {
            let output = request.await;
            if *closed_rx.borrow() {
                debug!("view closed before the request finished, dropping result");
                return;
            }
            on_done(output);
        });
        self.track(handle);
    }

    fn track(&self, handle: JoinHandle<()>) {
        let mut handles = self.handles.lock();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Stop delivering anything to the owner. Idempotent.
    pub fn close(&self) {
        self.closed_tx.send_replace(true);
    }

    /// Wait for every task started by this scope to finish.
    pub async fn settled(&self) {
        let handles: Vec<JoinHandle<()>> = self.handles.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
    }
}

impl Default for ViewScope {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        self.close();
    }
}
