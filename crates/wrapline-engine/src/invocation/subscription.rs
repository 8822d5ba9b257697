// Periodic invocation exposed as an async stream

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, Stream};
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, trace};
use wrapline_types::Frequency;

use super::{InvokeOptions, InvokeResult};
use crate::client::Client;

#[derive(Debug, Clone)]
pub struct SubscribeOptions {
    pub invoke: InvokeOptions,
    /// Defaults to one invocation per minute
    pub frequency: Option<Frequency>,
}

impl SubscribeOptions {
    pub fn new(invoke: InvokeOptions) -> Self {
        SubscribeOptions {
            invoke,
            frequency: None,
        }
    }

    pub fn with_frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Active,
    Stopped,
}

#[derive(Debug)]
struct SubscriptionState {
    phase: Mutex<Phase>,
    pending_ticks: AtomicUsize,
    wake: Notify,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl SubscriptionState {
    fn new() -> Self {
        SubscriptionState {
            phase: Mutex::new(Phase::Idle),
            pending_ticks: AtomicUsize::new(0),
            wake: Notify::new(),
            timer: Mutex::new(None),
        }
    }

    /// Move from idle to active and start the timer. Only the first caller
    /// succeeds.
    fn activate(self: &Arc<Self>, period: Duration) -> bool {
        let mut phase = self.phase.lock();
        if *phase != Phase::Idle {
            return false;
        }
        *phase = Phase::Active;

        let state = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut ticks = interval_at(Instant::now() + period, period);
            loop {
                ticks.tick().await;
                state.pending_ticks.fetch_add(1, Ordering::SeqCst);
                state.wake.notify_one();
            }
        });
        *self.timer.lock() = Some(handle);
        true
    }

    fn is_active(&self) -> bool {
        *self.phase.lock() == Phase::Active
    }

    fn take_tick(&self) -> bool {
        self.pending_ticks
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |ticks| ticks.checked_sub(1))
            .is_ok()
    }

    fn shut_down(&self) {
        *self.phase.lock() = Phase::Stopped;
        // The handle stays so that `is_timer_running` observes the task end
        if let Some(timer) = self.timer.lock().as_ref() {
            timer.abort();
        }
        self.wake.notify_one();
    }
}

/// Releases the timer however the result stream ends.
struct TimerGuard(Arc<SubscriptionState>);

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.0.shut_down();
    }
}

/// A periodic invocation of one URI method.
///
/// Nothing runs until [`Subscription::results`] is polled. Each timer tick
/// produces one invocation, and failed invocations are yielded as `Err`
/// items rather than ending the stream. The stream ends once
/// [`Subscription::stop`] is called or the stream is dropped.
pub struct Subscription<'a> {
    client: &'a Client,
    options: InvokeOptions,
    frequency: Duration,
    state: Arc<SubscriptionState>,
}

impl<'a> Subscription<'a> {
    pub(crate) fn new(client: &'a Client, options: SubscribeOptions) -> Self {
        let frequency = options.frequency.unwrap_or_default().as_duration();
        Subscription {
            client,
            options: options.invoke,
            frequency,
            state: Arc::new(SubscriptionState::new()),
        }
    }

    pub fn frequency(&self) -> Duration {
        self.frequency
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Whether the background timer task is still alive. After
    /// [`Subscription::stop`] the task ends at its next scheduling point.
    pub fn is_timer_running(&self) -> bool {
        self.state
            .timer
            .lock()
            .as_ref()
            .map_or(false, |timer| !timer.is_finished())
    }

    /// Stop producing results. Safe to call any number of times.
    pub fn stop(&self) {
        debug!(uri = %self.options.uri, method = %self.options.method, "subscription stopped");
        self.state.shut_down();
    }

    /// Stream of invocation results, one per tick.
    ///
    /// A subscription yields a single result sequence; a second call returns
    /// an empty stream.
    pub fn results(&self) -> impl Stream<Item = InvokeResult> + '_ {
        struct Run<'r> {
            client: &'r Client,
            options: InvokeOptions,
            period: Duration,
            state: Arc<SubscriptionState>,
            guard: Option<TimerGuard>,
        }

        let run = Run {
            client: self.client,
            options: self.options.clone(),
            period: self.frequency,
            state: Arc::clone(&self.state),
            guard: None,
        };

        stream::unfold(run, |mut run| async move {
            if run.guard.is_none() {
                if !run.state.activate(run.period) {
                    return None;
                }
                run.guard = Some(TimerGuard(Arc::clone(&run.state)));
            }

            loop {
                if !run.state.is_active() {
                    return None;
                }
                if run.state.take_tick() {
                    trace!(uri = %run.options.uri, "subscription tick");
                    let result = run.client.invoke(run.options.clone()).await;
                    return Some((result, run));
                }
                run.state.wake.notified().await;
            }
        })
    }
}

impl Client {
    /// Invoke `options.invoke` periodically, see [`Subscription`].
    pub fn subscribe(&self, options: SubscribeOptions) -> Subscription<'_> {
        Subscription::new(self, options)
    }
}
