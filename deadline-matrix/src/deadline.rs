//! One-shot wall-clock deadline and the cancellation flag it sets.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::Error;

/// Shared, monotonic cancellation flag.
///
/// Starts out clear and can only ever be set. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    flag: Arc<AtomicBool>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    pub(crate) fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Armed,
    Fired,
    Disarmed,
}

struct Shared {
    state: Mutex<TimerState>,
    wake: Condvar,
    signal: CancellationSignal,
}

impl Shared {
    // The state is a plain enum, so a poisoned lock still holds a valid value.
    fn lock(&self) -> MutexGuard<'_, TimerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fire(&self, state: &mut TimerState) {
        *state = TimerState::Fired;
        self.signal.cancel();
    }
}

/// An armed deadline.
///
/// Whichever of the timer thread and [`Deadline::disarm`] takes the state
/// lock first decides the race: the timer moves `Armed -> Fired`, disarm
/// moves `Armed -> Disarmed`, and neither transition can be undone.
///
/// Dropping an armed deadline disarms it and joins the timer thread.
pub struct Deadline {
    shared: Arc<Shared>,
    timer: Option<JoinHandle<()>>,
}

impl Deadline {
    /// Starts a timer that cancels [`Deadline::signal`] after `duration`.
    ///
    /// A zero duration fires before returning, so the signal is already set
    /// when the caller gets the handle back.
    pub fn arm(duration: Duration) -> Result<Self, Error> {
        let shared = Arc::new(Shared {
            state: Mutex::new(TimerState::Armed),
            wake: Condvar::new(),
            signal: CancellationSignal::new(),
        });

        if duration.is_zero() {
            shared.fire(&mut shared.lock());
            tracing::debug!("deadline of zero fired at arm time");
            return Ok(Self {
                shared,
                timer: None,
            });
        }

        let expires_at = Instant::now() + duration;
        let timer_shared = Arc::clone(&shared);
        let timer = thread::Builder::new()
            .name("deadline-timer".to_string())
            .spawn(move || run_timer(&timer_shared, expires_at))?;

        tracing::trace!(?duration, "deadline armed");
        Ok(Self {
            shared,
            timer: Some(timer),
        })
    }

    /// Returns a handle to the flag this deadline sets when it fires.
    pub fn signal(&self) -> CancellationSignal {
        self.shared.signal.clone()
    }

    pub fn cancelled(&self) -> bool {
        self.shared.signal.is_cancelled()
    }

    /// Stops the timer. Returns `true` if it had not fired yet, `false` if
    /// the deadline was already exceeded.
    pub fn disarm(mut self) -> bool {
        self.stop()
    }

    fn stop(&mut self) -> bool {
        let in_time = {
            let mut state = self.shared.lock();
            if *state == TimerState::Armed {
                *state = TimerState::Disarmed;
                self.shared.wake.notify_all();
            }
            *state == TimerState::Disarmed
        };

        if let Some(timer) = self.timer.take() {
            if timer.join().is_err() {
                tracing::warn!("deadline timer thread panicked");
            }
        }

        tracing::trace!(in_time, "deadline disarmed");
        in_time
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        if self.timer.is_some() {
            self.stop();
        }
    }
}

fn run_timer(shared: &Shared, expires_at: Instant) {
    let mut state = shared.lock();
    while *state == TimerState::Armed {
        let now = Instant::now();
        if now >= expires_at {
            shared.fire(&mut state);
            tracing::debug!("deadline fired");
            return;
        }
        state = shared
            .wake
            .wait_timeout(state, expires_at - now)
            .unwrap_or_else(PoisonError::into_inner)
            .0;
    }
}
