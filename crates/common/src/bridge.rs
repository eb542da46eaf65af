//! Async execution bridge
//!
//! Decouples the host's calling thread from the work behind an exported
//! call. Each call gets its own OS thread and a single-settlement
//! [`Settler`]; the caller gets back a pending handle immediately.
//!
//! Whatever happens on the worker (a resolve, a reject, a panic, or the
//! work simply returning without settling) the handle settles exactly once
//! and the completion callbacks are dropped right after.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::thread;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::error::{CallError, HostError};
use crate::value::HostValue;

pub const DEFAULT_THREAD_NAME_PREFIX: &str = "agebox-call";

/// What a call settles with
pub type Settlement = Result<HostValue, HostError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Worker threads are named `<prefix>-<call id>`
    #[serde(default = "default_thread_name_prefix")]
    pub thread_name_prefix: String,
    /// Stack size for worker threads, platform default if unset
    #[serde(default)]
    pub stack_size: Option<usize>,
}

fn default_thread_name_prefix() -> String {
    DEFAULT_THREAD_NAME_PREFIX.to_string()
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            thread_name_prefix: default_thread_name_prefix(),
            stack_size: None,
        }
    }
}

/// Identifies one invocation within a [`Bridge`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallId(pub u64);

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The host's completion primitive: exactly one of the two methods is
/// ever called, and the value is consumed by it.
///
/// Implementations are invoked from the worker thread.
pub trait Completion: Send + 'static {
    fn resolve(self: Box<Self>, value: HostValue);
    fn reject(self: Box<Self>, error: HostError);
}

/// A pair of host-supplied callbacks, shaped like a promise executor's
/// `resolve` and `reject`
pub struct Callbacks {
    resolve: Box<dyn FnOnce(HostValue) + Send>,
    reject: Box<dyn FnOnce(HostError) + Send>,
}

impl Callbacks {
    pub fn new(
        resolve: impl FnOnce(HostValue) + Send + 'static,
        reject: impl FnOnce(HostError) + Send + 'static,
    ) -> Self {
        Self {
            resolve: Box::new(resolve),
            reject: Box::new(reject),
        }
    }
}

impl Completion for Callbacks {
    fn resolve(self: Box<Self>, value: HostValue) {
        (self.resolve)(value)
    }

    fn reject(self: Box<Self>, error: HostError) {
        (self.reject)(error)
    }
}

/// Sending half of a [`Promise`]
struct PromiseSender(oneshot::Sender<Settlement>);

impl Completion for PromiseSender {
    fn resolve(self: Box<Self>, value: HostValue) {
        // the receiver may be gone; nobody is left to tell
        let _ = self.0.send(Ok(value));
    }

    fn reject(self: Box<Self>, error: HostError) {
        let _ = self.0.send(Err(error));
    }
}

/// A pending call, awaitable from async hosts or waitable from sync ones
#[derive(Debug)]
pub struct Promise {
    call_id: CallId,
    rx: oneshot::Receiver<Settlement>,
}

impl Promise {
    fn channel(call_id: CallId) -> (Box<dyn Completion>, Self) {
        let (tx, rx) = oneshot::channel();
        (Box::new(PromiseSender(tx)), Self { call_id, rx })
    }

    pub fn call_id(&self) -> CallId {
        self.call_id
    }

    /// Block the current thread until the call settles.
    ///
    /// Must not be called from within an async runtime; `.await` the
    /// promise there instead.
    pub fn wait(self) -> Settlement {
        self.rx.blocking_recv().unwrap_or_else(|_| Err(dropped()))
    }
}

impl Future for Promise {
    type Output = Settlement;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|settled| settled.unwrap_or_else(|_| Err(dropped())))
    }
}

fn dropped() -> HostError {
    HostError::internal("call was dropped without settling")
}

/// Single-settlement handle given to a call's work
///
/// Clones share the same slot; whichever settles first wins and every
/// later attempt is ignored.
#[derive(Clone)]
pub struct Settler {
    call_id: CallId,
    slot: Arc<Mutex<Option<Box<dyn Completion>>>>,
}

impl Settler {
    fn new(call_id: CallId, completion: Box<dyn Completion>) -> Self {
        Self {
            call_id,
            slot: Arc::new(Mutex::new(Some(completion))),
        }
    }

    pub fn call_id(&self) -> CallId {
        self.call_id
    }

    /// Resolve the call. Returns `false` if it had already settled.
    pub fn resolve(&self, value: HostValue) -> bool {
        match self.take() {
            Some(completion) => {
                tracing::debug!(call = %self.call_id, "call resolved");
                completion.resolve(value);
                true
            }
            None => {
                tracing::warn!(call = %self.call_id, "ignoring resolve on a settled call");
                false
            }
        }
    }

    /// Reject the call. Returns `false` if it had already settled.
    pub fn reject(&self, error: HostError) -> bool {
        match self.take() {
            Some(completion) => {
                tracing::debug!(call = %self.call_id, kind = %error.kind, "call rejected");
                completion.reject(error);
                true
            }
            None => {
                tracing::warn!(call = %self.call_id, "ignoring reject on a settled call");
                false
            }
        }
    }

    pub fn settle(&self, result: Result<HostValue, CallError>) -> bool {
        match result {
            Ok(value) => self.resolve(value),
            Err(err) => self.reject(err.into()),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.slot.lock().is_none()
    }

    // the lock is released before the host callback runs
    fn take(&self) -> Option<Box<dyn Completion>> {
        self.slot.lock().take()
    }
}

impl fmt::Debug for Settler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settler")
            .field("call_id", &self.call_id)
            .field("settled", &self.is_settled())
            .finish()
    }
}

/// Launches calls, one worker thread each
#[derive(Debug)]
pub struct Bridge {
    config: BridgeConfig,
    next_call_id: AtomicU64,
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new(BridgeConfig::default())
    }
}

impl Bridge {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            next_call_id: AtomicU64::new(1),
        }
    }

    fn next_call_id(&self) -> CallId {
        CallId(self.next_call_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Run `work` on its own thread, settling through the host's
    /// `completion`. Returns as soon as the thread is launched.
    ///
    /// `work` reports through the [`Settler`] it is handed. If it panics or
    /// returns without settling, the call is rejected with an internal fault.
    pub fn spawn<F>(&self, completion: Box<dyn Completion>, work: F) -> CallId
    where
        F: FnOnce(&Settler) + Send + 'static,
    {
        let call_id = self.next_call_id();
        self.launch(Settler::new(call_id, completion), work);
        call_id
    }

    /// Run `work` on its own thread and hand back a [`Promise`] for its result.
    pub fn invoke<F>(&self, work: F) -> Promise
    where
        F: FnOnce() -> Result<HostValue, CallError> + Send + 'static,
    {
        let call_id = self.next_call_id();
        let (completion, promise) = Promise::channel(call_id);
        self.launch(Settler::new(call_id, completion), move |settler| {
            settler.settle(work());
        });
        promise
    }

    fn launch<F>(&self, settler: Settler, work: F)
    where
        F: FnOnce(&Settler) + Send + 'static,
    {
        let call_id = settler.call_id();
        let mut builder =
            thread::Builder::new().name(format!("{}-{}", self.config.thread_name_prefix, call_id));
        if let Some(size) = self.config.stack_size {
            builder = builder.stack_size(size);
        }

        let worker = settler.clone();
        match builder.spawn(move || run_to_settlement(worker, work)) {
            Ok(_) => tracing::debug!(call = %call_id, "call spawned"),
            Err(e) => {
                tracing::error!(call = %call_id, error = %e, "failed to spawn call worker");
                settler.reject(HostError::internal(format!(
                    "failed to spawn worker thread: {}",
                    e
                )));
            }
        }
    }
}

fn run_to_settlement<F>(settler: Settler, work: F)
where
    F: FnOnce(&Settler),
{
    let result = panic::catch_unwind(AssertUnwindSafe(|| work(&settler)));
    if settler.is_settled() {
        return;
    }

    let message = match result {
        Ok(()) => "call finished without settling".to_string(),
        Err(payload) => format!("call panicked: {}", panic_message(payload.as_ref())),
    };
    tracing::error!(call = %settler.call_id(), "{}", message);
    settler.reject(HostError::internal(message));
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic payload"
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::mpsc;
    use std::time::Duration;

    const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

    fn recording_callbacks() -> (Box<dyn Completion>, mpsc::Receiver<Settlement>) {
        let (tx, rx) = mpsc::channel();
        let reject_tx = tx.clone();
        let callbacks = Callbacks::new(
            move |value| tx.send(Ok(value)).unwrap(),
            move |error| reject_tx.send(Err(error)).unwrap(),
        );
        (Box::new(callbacks), rx)
    }

    #[test]
    fn test_invoke_returns_before_work_finishes() {
        let bridge = Bridge::default();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let promise = bridge.invoke(move || {
            release_rx.recv().unwrap();
            Ok(HostValue::from("done"))
        });

        // the work is still parked, yet we already hold the handle
        release_tx.send(()).unwrap();
        assert_eq!(promise.wait().unwrap(), HostValue::from("done"));
    }

    #[test]
    fn test_work_runs_on_named_worker_thread() {
        let bridge = Bridge::new(BridgeConfig {
            thread_name_prefix: "test-worker".to_string(),
            stack_size: Some(256 * 1024),
        });
        let caller = thread::current().id();

        let promise = bridge.invoke(move || {
            assert_ne!(thread::current().id(), caller);
            let name = thread::current().name().unwrap_or_default().to_string();
            Ok(HostValue::from(name))
        });

        let id = promise.call_id();
        let name = promise.wait().unwrap();
        assert_eq!(name, HostValue::from(format!("test-worker-{}", id)));
    }

    #[test]
    fn test_second_settlement_is_ignored() {
        let bridge = Bridge::default();
        let (completion, rx) = recording_callbacks();
        let (flags_tx, flags_rx) = mpsc::channel();

        bridge.spawn(completion, move |settler| {
            let first = settler.resolve(HostValue::from("first"));
            let second = settler.reject(HostError::internal("second"));
            let third = settler.resolve(HostValue::from("third"));
            flags_tx.send((first, second, third)).unwrap();
        });

        assert_eq!(
            rx.recv_timeout(SETTLE_TIMEOUT).unwrap().unwrap(),
            HostValue::from("first")
        );
        assert_eq!(flags_rx.recv().unwrap(), (true, false, false));
        // the callbacks were consumed by the first settlement
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_panic_becomes_internal_fault() {
        let bridge = Bridge::default();
        let promise = bridge.invoke(|| panic!("boom"));

        let err = promise.wait().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InternalFault);
        assert_eq!(err.message, "call panicked: boom");
    }

    #[test]
    fn test_panic_after_settling_keeps_first_result() {
        let bridge = Bridge::default();
        let (completion, rx) = recording_callbacks();

        bridge.spawn(completion, |settler| {
            settler.resolve(HostValue::from("ok"));
            panic!("late failure");
        });

        assert_eq!(
            rx.recv_timeout(SETTLE_TIMEOUT).unwrap().unwrap(),
            HostValue::from("ok")
        );
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_unsettled_work_is_rejected() {
        let bridge = Bridge::default();
        let (completion, rx) = recording_callbacks();

        bridge.spawn(completion, |_settler| {});

        let err = rx.recv_timeout(SETTLE_TIMEOUT).unwrap().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InternalFault);
        assert_eq!(err.message, "call finished without settling");
    }

    #[test]
    fn test_callbacks_released_after_settlement() {
        let bridge = Bridge::default();
        let witness = Arc::new(());
        let held = witness.clone();
        let (done_tx, done_rx) = mpsc::channel();

        let completion = Callbacks::new(
            move |_| {
                let _keep = &held;
                done_tx.send(()).unwrap();
            },
            |_| {},
        );
        bridge.spawn(Box::new(completion), |settler| {
            settler.resolve(HostValue::Undefined);
        });

        done_rx.recv_timeout(SETTLE_TIMEOUT).unwrap();
        // the worker drops the consumed callbacks as it exits
        let deadline = std::time::Instant::now() + SETTLE_TIMEOUT;
        while Arc::strong_count(&witness) > 1 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(Arc::strong_count(&witness), 1);
    }

    #[test]
    fn test_call_ids_increase() {
        let bridge = Bridge::default();
        let a = bridge.invoke(|| Ok(HostValue::Null));
        let b = bridge.invoke(|| Ok(HostValue::Null));
        assert!(b.call_id() > a.call_id());
        a.wait().unwrap();
        b.wait().unwrap();
    }

    #[tokio::test]
    async fn test_promise_is_awaitable() {
        let bridge = Bridge::default();
        let result = bridge
            .invoke(|| Err(CallError::UnknownExport("nope".to_string())))
            .await;
        let err = result.unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownExport);
    }
}
