//! Infinite-scroll triggering.
//!
//! [`ScrollTrigger`] turns visibility edges of a list-end sentinel into
//! next-page requests. It is edge-triggered: a sentinel that stays visible
//! fires once, and the trigger only re-arms when the sentinel leaves the
//! viewport or a load completes and grows the list. Visibility edges come from
//! any source; [`ViewportObserver`] computes them from scroll positions.

pub mod viewport;

use std::fmt;

use crate::feed::LoadGate;

pub use viewport::ViewportObserver;

/// Identity of a sentinel element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SentinelId(u64);

impl SentinelId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for SentinelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sentinel-{}", self.0)
    }
}

/// A visibility edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Entered,
    Left,
}

/// Why the trigger did not fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The event is for a sentinel that is not (or no longer) observed.
    NotObserved,
    /// Already fired for the current visibility transition.
    Disarmed,
    /// A page is being loaded.
    Loading,
    /// Every item is loaded.
    Exhausted,
    /// The sentinel is out of view.
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    LoadNext,
    Skip(SkipReason),
}

/// Edge-triggered next-page trigger for one list view.
#[derive(Debug, Default)]
pub struct ScrollTrigger {
    sentinel: Option<SentinelId>,
    visible: bool,
    armed: bool,
}

impl ScrollTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start observing `sentinel`, replacing the previous one.
    ///
    /// Returns the sentinel that was detached, if any.
    pub fn observe(&mut self, sentinel: SentinelId) -> Option<SentinelId> {
        let previous = self.sentinel.replace(sentinel);
        self.visible = false;
        self.armed = true;
        if let Some(previous) = previous
            && previous != sentinel
        {
            tracing::debug!(%previous, %sentinel, "sentinel replaced");
        }
        previous
    }

    /// Stop observing, e.g. when the list view unmounts.
    pub fn detach(&mut self) -> Option<SentinelId> {
        self.visible = false;
        self.armed = false;
        self.sentinel.take()
    }

    /// Re-arm for a list that was replaced, e.g. after a filter change.
    ///
    /// The sentinel and its visibility are kept. A visible sentinel fires
    /// right away if the gate allows it; while page 1 is still loading it
    /// stays armed and fires once that load grows the list.
    pub fn reset(&mut self, gate: LoadGate) -> TriggerDecision {
        if self.sentinel.is_none() {
            return TriggerDecision::Skip(SkipReason::NotObserved);
        }
        self.armed = true;
        if !self.visible {
            return TriggerDecision::Skip(SkipReason::Hidden);
        }
        self.try_fire(gate)
    }

    pub fn sentinel(&self) -> Option<SentinelId> {
        self.sentinel
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Handle a visibility edge of `sentinel`.
    pub fn on_visibility(
        &mut self,
        sentinel: SentinelId,
        visibility: Visibility,
        gate: LoadGate,
    ) -> TriggerDecision {
        if self.sentinel != Some(sentinel) {
            return TriggerDecision::Skip(SkipReason::NotObserved);
        }
        match visibility {
            Visibility::Left => {
                self.visible = false;
                self.armed = true;
                TriggerDecision::Skip(SkipReason::Hidden)
            }
            Visibility::Entered => {
                if self.visible {
                    // Repeated enter without a leave in between.
                    return TriggerDecision::Skip(SkipReason::Disarmed);
                }
                self.visible = true;
                self.try_fire(gate)
            }
        }
    }

    /// Handle the end of a page load.
    ///
    /// A load that grew the list re-arms the trigger, which fires again right
    /// away if the sentinel is still in view. A replaced first page counts as
    /// growth (see [`ApplyOutcome::grew`](crate::feed::ApplyOutcome::grew)).
    /// Any other outcome leaves it disarmed until the sentinel leaves and
    /// re-enters.
    pub fn on_load_complete(&mut self, grew: bool, gate: LoadGate) -> TriggerDecision {
        if self.sentinel.is_none() {
            return TriggerDecision::Skip(SkipReason::NotObserved);
        }
        if !grew {
            return TriggerDecision::Skip(SkipReason::Disarmed);
        }
        self.armed = true;
        if !self.visible {
            return TriggerDecision::Skip(SkipReason::Hidden);
        }
        self.try_fire(gate)
    }

    fn try_fire(&mut self, gate: LoadGate) -> TriggerDecision {
        if !self.armed {
            TriggerDecision::Skip(SkipReason::Disarmed)
        } else if gate.is_loading {
            TriggerDecision::Skip(SkipReason::Loading)
        } else if !gate.has_more {
            TriggerDecision::Skip(SkipReason::Exhausted)
        } else {
            self.armed = false;
            TriggerDecision::LoadNext
        }
    }
}
