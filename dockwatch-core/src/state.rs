use std::collections::BTreeMap;

use crate::model::ServiceName;

/// Number of distinct service colors; assignment wraps around after this.
pub const PALETTE_LEN: usize = 10;

/// Color index per service, assigned on first sight and never changed.
#[derive(Clone, Debug, Default)]
pub struct ColorRegistry {
    assigned: BTreeMap<ServiceName, usize>,
}

impl ColorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the service's color, assigning the next one if it is new.
    pub fn assign(&mut self, service: &str) -> usize {
        if let Some(&color) = self.assigned.get(service) {
            return color;
        }
        // Entries are never removed, so the map length counts services seen.
        let color = self.assigned.len() % PALETTE_LEN;
        self.assigned.insert(service.to_string(), color);
        color
    }

    pub fn get(&self, service: &str) -> Option<usize> {
        self.assigned.get(service).copied()
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScrollMode {
    /// Stick to the newest log line on every refresh.
    #[default]
    Following,
    /// Hold the user's position across refreshes.
    Pinned,
}

/// Log panel scroll position. `offset` is the index of the top visible line.
#[derive(Clone, Debug, Default)]
pub struct ScrollState {
    mode: ScrollMode,
    offset: usize,
    line_count: usize,
    viewport: usize,
}

impl ScrollState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ScrollMode {
        self.mode
    }

    pub fn is_following(&self) -> bool {
        self.mode == ScrollMode::Following
    }

    /// The stored anchor. In `Pinned` mode this never moves on its own.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The anchor clamped to the current content, for drawing.
    pub fn visible_offset(&self) -> usize {
        self.offset.min(self.bottom())
    }

    fn bottom(&self) -> usize {
        self.line_count.saturating_sub(self.viewport)
    }

    /// Called with the new total line count whenever a snapshot arrives.
    pub fn on_content(&mut self, line_count: usize) {
        self.line_count = line_count;
        if self.is_following() {
            self.offset = self.bottom();
        }
    }

    /// Called by the renderer with the log panel's inner height.
    pub fn set_viewport(&mut self, height: usize) {
        self.viewport = height;
        if self.is_following() {
            self.offset = self.bottom();
        }
    }

    /// Enters `Pinned` and re-anchors on the line actually on screen, so a
    /// relative move starts from what the user sees.
    fn pin(&mut self) {
        self.mode = ScrollMode::Pinned;
        self.offset = self.visible_offset();
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.pin();
        self.offset = self.offset.saturating_sub(lines);
    }

    /// Scrolling onto the last page resumes following.
    pub fn scroll_down(&mut self, lines: usize) {
        self.pin();
        self.offset = self.offset.saturating_add(lines);
        if self.offset >= self.bottom() {
            self.follow();
        }
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.viewport.max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.viewport.max(1));
    }

    pub fn scroll_to_top(&mut self) {
        self.pin();
        self.offset = 0;
    }

    pub fn follow(&mut self) {
        self.mode = ScrollMode::Following;
        self.offset = self.bottom();
    }
}
