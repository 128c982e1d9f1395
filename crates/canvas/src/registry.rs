//! Canvas id allocation, metadata, and per-canvas locks.

use std::sync::Arc;

use parking_lot::lock_api::{ArcRwLockReadGuard, ArcRwLockWriteGuard};
use parking_lot::{RawRwLock, RwLock};

use crate::error::CanvasError;
use crate::types::{Canvas, CanvasId};

/// Reader/writer lock guarding one canvas's tiles
pub type CanvasLock = Arc<RwLock<()>>;

type SharedGuard = ArcRwLockReadGuard<RawRwLock, ()>;
type ExclusiveGuard = ArcRwLockWriteGuard<RawRwLock, ()>;

#[derive(Debug, Clone, Copy)]
enum SlotState {
    /// Allocated, tiles still being materialized
    Reserved,
    Live(Canvas),
    /// Deleted; the id is never handed out again
    Tombstone,
}

struct Slot {
    state: SlotState,
    lock: CanvasLock,
}

/// Append-only table of every canvas id ever allocated.
///
/// The slot table has its own lock, held only for short lookups and state
/// transitions. It is never held while waiting for a canvas lock, so a
/// lookup can't deadlock against an in-flight create or delete.
pub struct CanvasRegistry {
    slots: RwLock<Vec<Slot>>,
}

impl std::fmt::Debug for CanvasRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasRegistry")
            .field("allocated", &self.allocated())
            .field("live", &self.live_count())
            .finish()
    }
}

impl Default for CanvasRegistry {
    fn default() -> Self {
        Self {
            slots: RwLock::new(Vec::new()),
        }
    }
}

/// A freshly allocated id whose canvas lock is held exclusively.
///
/// Finish with [`CanvasRegistry::publish`] or [`CanvasRegistry::abort`].
/// Dropping it without either leaves the id reserved forever.
#[must_use]
pub struct Reservation {
    id: CanvasId,
    _guard: ExclusiveGuard,
}

impl Reservation {
    pub fn id(&self) -> CanvasId {
        self.id
    }
}

/// Read access to a live canvas; the shared lock is held until drop
pub struct SharedAccess {
    canvas: Canvas,
    _guard: SharedGuard,
}

impl SharedAccess {
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }
}

/// Write access to a live canvas; the exclusive lock is held until drop
pub struct ExclusiveAccess {
    canvas: Canvas,
    _guard: ExclusiveGuard,
}

impl ExclusiveAccess {
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }
}

impl CanvasRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next id. Its lock is created already held exclusively.
    pub fn allocate(&self) -> Reservation {
        let lock: CanvasLock = Arc::new(RwLock::new(()));
        // Uncontended: nobody else can see this lock yet
        let guard = lock.write_arc();

        let mut slots = self.slots.write();
        let id = slots.len() as CanvasId;
        slots.push(Slot {
            state: SlotState::Reserved,
            lock,
        });

        Reservation { id, _guard: guard }
    }

    /// Make a reserved canvas visible and release its lock
    pub fn publish(&self, reservation: Reservation, canvas: Canvas) {
        debug_assert_eq!(reservation.id, canvas.id);
        self.set_state(reservation.id, SlotState::Live(canvas));
        drop(reservation);
    }

    /// Give up on a reserved id. It becomes a tombstone so it is not reused.
    pub fn abort(&self, reservation: Reservation) {
        self.set_state(reservation.id, SlotState::Tombstone);
        drop(reservation);
    }

    /// Metadata of a live canvas
    pub fn lookup_live(&self, id: CanvasId) -> Result<Canvas, CanvasError> {
        let slots = self.slots.read();
        match slots.get(slot_index(id)).map(|s| s.state) {
            Some(SlotState::Live(canvas)) => Ok(canvas),
            _ => Err(CanvasError::IncorrectImageId(id)),
        }
    }

    /// Lock of any allocated id, live or not
    pub fn lock(&self, id: CanvasId) -> Result<CanvasLock, CanvasError> {
        let slots = self.slots.read();
        slots
            .get(slot_index(id))
            .map(|s| Arc::clone(&s.lock))
            .ok_or(CanvasError::IncorrectImageId(id))
    }

    /// Take the canvas's shared lock, then confirm it is still live
    pub fn acquire_shared(&self, id: CanvasId) -> Result<SharedAccess, CanvasError> {
        let guard = self.lock(id)?.read_arc();
        let canvas = self.lookup_live(id)?;
        Ok(SharedAccess {
            canvas,
            _guard: guard,
        })
    }

    /// Take the canvas's exclusive lock, then confirm it is still live
    pub fn acquire_exclusive(&self, id: CanvasId) -> Result<ExclusiveAccess, CanvasError> {
        let guard = self.lock(id)?.write_arc();
        let canvas = self.lookup_live(id)?;
        Ok(ExclusiveAccess {
            canvas,
            _guard: guard,
        })
    }

    /// Mark a live canvas deleted and release its lock
    pub fn tombstone(&self, access: ExclusiveAccess) {
        self.set_state(access.canvas.id, SlotState::Tombstone);
        drop(access);
    }

    /// Number of ids ever allocated
    pub fn allocated(&self) -> usize {
        self.slots.read().len()
    }

    /// Number of live canvases
    pub fn live_count(&self) -> usize {
        self.slots
            .read()
            .iter()
            .filter(|s| matches!(s.state, SlotState::Live(_)))
            .count()
    }

    fn set_state(&self, id: CanvasId, state: SlotState) {
        let mut slots = self.slots.write();
        if let Some(slot) = slots.get_mut(slot_index(id)) {
            slot.state = state;
        }
    }
}

/// Ids beyond the address space map to an index that is never allocated
#[inline]
fn slot_index(id: CanvasId) -> usize {
    usize::try_from(id).unwrap_or(usize::MAX)
}
