/// Task is suspended at an await point and not scheduled.
///
/// Only a wake-up moves it back to `QUEUED`.
pub(crate) const IDLE: usize = 0;

/// Task sits in the ready queue, waiting for a drive epoch.
pub(crate) const QUEUED: usize = 1;

/// Task frame is being resumed by the driver.
///
/// At most one resumption of a frame may be in flight.
pub(crate) const RUNNING: usize = 2;

/// Task body ran to completion (or panicked) and its frame was reclaimed.
pub(crate) const COMPLETED: usize = 3;

/// Task was woken while running.
///
/// It is re-queued for a later epoch once the current resumption returns.
pub(crate) const NOTIFIED: usize = 4;

/// Task was aborted because its owning handle was dropped.
///
/// A frame observed in this state is dropped instead of being resumed.
pub(crate) const ABORTED: usize = 5;
