//! Frame scheduling for the client.
//!
//! A [`RenderLoop`] runs one callback per frame on a single thread, asking a
//! [`FrameScheduler`] for each next frame. Stopping the loop cancels the
//! pending frame; no callback runs after [`RenderLoop::stop`] returns.

use core::cell::{Cell, RefCell};
use core::future::Future;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

/// Handle of a requested frame, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(u64);

impl FrameToken {
    /// Wraps a scheduler specific id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The scheduler specific id.
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Source of frame callbacks, such as `requestAnimationFrame`.
pub trait FrameScheduler {
    /// Runs `callback` once on the next frame.
    fn request_frame(&mut self, callback: Box<dyn FnOnce()>) -> FrameToken;
    /// Cancels a pending frame. Cancelling a frame that already ran is a no-op.
    fn cancel_frame(&mut self, token: FrameToken);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Running,
    Stopped,
}

struct LoopState<S> {
    scheduler: RefCell<S>,
    frame: RefCell<Box<dyn FnMut(u64)>>,
    phase: Cell<Phase>,
    pending: Cell<Option<FrameToken>>,
    frames: Cell<u64>,
}

impl<S: FrameScheduler + 'static> LoopState<S> {
    fn schedule(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        let token = self
            .scheduler
            .borrow_mut()
            .request_frame(Box::new(move || tick(&weak)));
        self.pending.set(Some(token));
    }
}

fn tick<S: FrameScheduler + 'static>(state: &Weak<LoopState<S>>) {
    let Some(state) = state.upgrade() else {
        return;
    };
    state.pending.set(None);
    if state.phase.get() != Phase::Running {
        return;
    }

    let frame = state.frames.get() + 1;
    state.frames.set(frame);
    trace!(frame, "frame");
    (state.frame.borrow_mut())(frame);

    // The callback may have stopped the loop.
    if state.phase.get() == Phase::Running {
        state.schedule();
    }
}

/// A cancellable per-frame loop.
///
/// Dropping the loop stops it.
pub struct RenderLoop<S: FrameScheduler + 'static> {
    state: Rc<LoopState<S>>,
}

impl<S: FrameScheduler + 'static> core::fmt::Debug for RenderLoop<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RenderLoop")
            .field("phase", &self.state.phase.get())
            .field("frames", &self.state.frames.get())
            .field("pending", &self.state.pending.get())
            .finish_non_exhaustive()
    }
}

impl<S: FrameScheduler + 'static> RenderLoop<S> {
    /// Creates an idle loop that will call `frame` with the frame number.
    pub fn new(scheduler: S, frame: impl FnMut(u64) + 'static) -> Self {
        Self {
            state: Rc::new(LoopState {
                scheduler: RefCell::new(scheduler),
                frame: RefCell::new(Box::new(frame)),
                phase: Cell::new(Phase::Idle),
                pending: Cell::new(None),
                frames: Cell::new(0),
            }),
        }
    }

    /// Creates a loop and starts it immediately.
    pub fn started(scheduler: S, frame: impl FnMut(u64) + 'static) -> Self {
        let render_loop = Self::new(scheduler, frame);
        render_loop.start();
        render_loop
    }

    /// Requests the first frame. Does nothing unless the loop is idle.
    pub fn start(&self) {
        if self.state.phase.get() != Phase::Idle {
            return;
        }
        self.state.phase.set(Phase::Running);
        self.state.schedule();
        debug!("render loop started");
    }

    /// Awaits `setup` and starts the loop once it succeeds.
    ///
    /// Returns `Ok(true)` if the loop started and `Ok(false)` if it was
    /// stopped while `setup` was pending, in which case no frame is ever
    /// requested.
    ///
    /// # Errors
    ///
    /// Propagates the error of `setup`; the loop is stopped in that case.
    pub async fn start_when_ready<Err>(
        &self,
        setup: impl Future<Output = Result<(), Err>>,
    ) -> Result<bool, Err> {
        if let Err(error) = setup.await {
            self.stop();
            return Err(error);
        }
        if self.state.phase.get() == Phase::Stopped {
            debug!("render loop stopped before setup completed");
            return Ok(false);
        }
        self.start();
        Ok(true)
    }

    /// Stops the loop and cancels the pending frame. Idempotent.
    pub fn stop(&self) {
        if self.state.phase.replace(Phase::Stopped) == Phase::Stopped {
            return;
        }
        if let Some(token) = self.state.pending.take() {
            self.state.scheduler.borrow_mut().cancel_frame(token);
        }
        debug!(frames = self.state.frames.get(), "render loop stopped");
    }

    /// Returns `true` while frames are being requested.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.phase.get() == Phase::Running
    }

    /// Returns `true` once the loop has been stopped.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state.phase.get() == Phase::Stopped
    }

    /// Frames run so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.state.frames.get()
    }
}

impl<S: FrameScheduler + 'static> Drop for RenderLoop<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

type Queue = VecDeque<(FrameToken, Box<dyn FnOnce()>)>;

/// Scheduler driven by hand, for tests and hosts without a display.
///
/// Clones share the same queue, so one clone can be given to a
/// [`RenderLoop`] while another calls [`advance`](Self::advance).
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Rc<RefCell<Queue>>,
    next: Rc<Cell<u64>>,
}

impl core::fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("pending", &self.pending())
            .finish()
    }
}

impl ManualScheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Runs every frame requested before this call. Returns how many ran.
    pub fn advance(&self) -> usize {
        let ready: Vec<_> = self.queue.borrow_mut().drain(..).collect();
        let count = ready.len();
        for (_, callback) in ready {
            callback();
        }
        count
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self, callback: Box<dyn FnOnce()>) -> FrameToken {
        let token = FrameToken(self.next.get());
        self.next.set(token.0 + 1);
        self.queue.borrow_mut().push_back((token, callback));
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.queue.borrow_mut().retain(|(queued, _)| *queued != token);
    }
}
