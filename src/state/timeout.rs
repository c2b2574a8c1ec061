//! Cancellable deferred callbacks used for turn deadlines and delayed prompts.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU8, AtomicU64, Ordering},
    },
    time::Duration,
};

use futures::future::BoxFuture;
use tokio::{task::AbortHandle, time::sleep};
use tracing::debug;

use crate::state::roles::Role;

const PENDING: u8 = 0;
const FIRED: u8 = 1;
const CANCELED: u8 = 2;

/// Handle to a scheduled callback.
///
/// Firing and cancelling race on a single atomic: whichever wins first decides,
/// so a canceled handle never fires and cancelling a fired one is a no-op.
#[derive(Debug)]
pub struct TimeoutHandle {
    id: u64,
    state: Arc<AtomicU8>,
    abort: AbortHandle,
}

impl TimeoutHandle {
    /// Still waiting for its deadline.
    #[cfg(test)]
    fn is_pending(&self) -> bool {
        self.state.load(Ordering::Acquire) == PENDING
    }

    /// The deadline elapsed and the callback was started.
    #[cfg(test)]
    fn has_fired(&self) -> bool {
        self.state.load(Ordering::Acquire) == FIRED
    }

    /// Cancel the callback if it has not started yet. Safe to call repeatedly.
    ///
    /// The task is only aborted while still sleeping; a callback that is already
    /// running is left alone and must detect staleness on its own.
    pub fn cancel(&self) {
        if self
            .state
            .compare_exchange(PENDING, CANCELED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.abort.abort();
            debug!(timeout_id = self.id, "timeout canceled");
        }
    }
}

/// Spawns one tokio task per scheduled callback. Each match owns its own
/// scheduler so handles never leak across matches.
#[derive(Debug, Default)]
pub struct TimeoutScheduler {
    next_id: AtomicU64,
}

impl TimeoutScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `on_fire` once `after` has elapsed unless the returned handle is canceled first.
    pub fn schedule(&self, after: Duration, on_fire: BoxFuture<'static, ()>) -> TimeoutHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let state = Arc::new(AtomicU8::new(PENDING));
        let task_state = Arc::clone(&state);

        let task = tokio::spawn(async move {
            sleep(after).await;
            if task_state
                .compare_exchange(PENDING, FIRED, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                return;
            }
            debug!(timeout_id = id, "timeout fired");
            on_fire.await;
        });

        TimeoutHandle {
            id,
            state,
            abort: task.abort_handle(),
        }
    }

    /// Cancel a handle; no-op when it already fired or was canceled.
    pub fn cancel(&self, handle: &TimeoutHandle) {
        handle.cancel();
    }
}

/// At most one outstanding deadline per role, plus the post-match prompt.
#[derive(Debug, Default)]
pub struct TurnTimers {
    shot: Option<TimeoutHandle>,
    save: Option<TimeoutHandle>,
    rematch_prompt: Option<TimeoutHandle>,
}

impl TurnTimers {
    fn slot(&mut self, role: Role) -> &mut Option<TimeoutHandle> {
        match role {
            Role::Shooter => &mut self.shot,
            Role::Goalkeeper => &mut self.save,
        }
    }

    /// Install the deadline for `role`, cancelling any previous one first.
    pub fn arm(&mut self, role: Role, handle: TimeoutHandle) {
        if let Some(previous) = self.slot(role).replace(handle) {
            previous.cancel();
        }
    }

    pub fn disarm(&mut self, role: Role) {
        if let Some(handle) = self.slot(role).take() {
            handle.cancel();
        }
    }

    pub fn arm_rematch_prompt(&mut self, handle: TimeoutHandle) {
        if let Some(previous) = self.rematch_prompt.replace(handle) {
            previous.cancel();
        }
    }

    pub fn disarm_all(&mut self) {
        self.disarm(Role::Shooter);
        self.disarm(Role::Goalkeeper);
        if let Some(handle) = self.rematch_prompt.take() {
            handle.cancel();
        }
    }

    #[cfg(test)]
    fn is_armed(&self, role: Role) -> bool {
        match role {
            Role::Shooter => self.shot.as_ref(),
            Role::Goalkeeper => self.save.as_ref(),
        }
        .is_some_and(TimeoutHandle::is_pending)
    }
}
