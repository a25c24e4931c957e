//! Visibility edges computed from scroll positions.
//!
//! The observer models a vertical scroll container: the viewport spans
//! `scroll_top..scroll_top + viewport_height` and is widened on both ends by a
//! root margin, so a sentinel counts as visible a margin's distance before it
//! actually scrolls into view. Only transitions are reported.

use super::{SentinelId, Visibility};

/// Default pre-fetch distance in pixels.
pub const DEFAULT_ROOT_MARGIN: u64 = 900;

#[derive(Debug, Clone, Copy)]
struct Tracked {
    id: SentinelId,
    offset: u64,
    visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Viewport {
    scroll_top: u64,
    height: u64,
}

/// Tracks one sentinel against a scrolling viewport.
#[derive(Debug)]
pub struct ViewportObserver {
    root_margin: u64,
    sentinel: Option<Tracked>,
    viewport: Option<Viewport>,
}

impl Default for ViewportObserver {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_MARGIN)
    }
}

impl ViewportObserver {
    pub fn new(root_margin: u64) -> Self {
        Self {
            root_margin,
            sentinel: None,
            viewport: None,
        }
    }

    pub fn root_margin(&self) -> u64 {
        self.root_margin
    }

    /// Track the sentinel `id` at `offset` from the top of the content,
    /// replacing any tracked sentinel.
    ///
    /// A newly attached sentinel starts hidden; the returned edge, if any, is
    /// its visibility against the last known viewport.
    pub fn attach(&mut self, id: SentinelId, offset: u64) -> Option<(SentinelId, Visibility)> {
        self.sentinel = Some(Tracked {
            id,
            offset,
            visible: false,
        });
        self.evaluate()
    }

    /// The content changed height and the sentinel moved to `offset`.
    pub fn move_sentinel(&mut self, offset: u64) -> Option<(SentinelId, Visibility)> {
        self.sentinel.as_mut()?.offset = offset;
        self.evaluate()
    }

    /// Stop tracking. No further edges are reported.
    pub fn detach(&mut self) -> Option<SentinelId> {
        self.sentinel.take().map(|tracked| tracked.id)
    }

    /// The viewport scrolled or resized.
    pub fn on_scroll(
        &mut self,
        scroll_top: u64,
        viewport_height: u64,
    ) -> Option<(SentinelId, Visibility)> {
        self.viewport = Some(Viewport {
            scroll_top,
            height: viewport_height,
        });
        self.evaluate()
    }

    /// Whether the tracked sentinel is currently within the widened viewport.
    pub fn is_visible(&self) -> bool {
        self.sentinel.is_some_and(|tracked| tracked.visible)
    }

    fn evaluate(&mut self) -> Option<(SentinelId, Visibility)> {
        let viewport = self.viewport?;
        let root_margin = self.root_margin;
        let tracked = self.sentinel.as_mut()?;

        let top = viewport.scroll_top.saturating_sub(root_margin);
        let bottom = viewport
            .scroll_top
            .saturating_add(viewport.height)
            .saturating_add(root_margin);
        let visible = (top..=bottom).contains(&tracked.offset);

        if visible == tracked.visible {
            return None;
        }
        tracked.visible = visible;
        let edge = if visible {
            Visibility::Entered
        } else {
            Visibility::Left
        };
        Some((tracked.id, edge))
    }
}
