use listings::ListingId;
use runtime::Tick;
use serde::{Deserialize, Serialize};

use crate::sdk::{MapSdk, MarkerKey};

/// Shared hover/select/popup state.
///
/// Each slot is independently nullable; at most one listing occupies each
/// at a time. Both the list renderer and the map feed the same state, so
/// neither side ever diverges from the other.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct InteractionState {
    pub hovered: Option<ListingId>,
    pub selected: Option<ListingId>,
    pub open_popup: Option<ListingId>,
}

/// Commands for the list renderer, drained once per frame.
///
/// The list and map layers share only listing ids (no DOM traversal to
/// locate rows); the renderer keeps its own id-keyed row index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListCommand {
    /// Emphasize or de-emphasize the row; scroll only if it is
    /// off-screen, and smoothly, so the user's scroll position is not
    /// disrupted.
    EmphasizeRow { id: ListingId, on: bool },
    /// Scroll the row into view and start a transient highlight.
    ScrollIntoView { id: ListingId },
    /// The transient highlight for this row has elapsed.
    ClearHighlight { id: ListingId },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// How long the post-select row highlight lasts.
    pub highlight_ms: u64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self { highlight_ms: 1500 }
    }
}

/// Bidirectional hover/select/popup synchronization.
#[derive(Debug, Default)]
pub struct InteractionSynchronizer {
    state: InteractionState,
    commands: Vec<ListCommand>,
    highlight_deadline: Option<(ListingId, Tick)>,
    config: InteractionConfig,
}

impl InteractionSynchronizer {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    /// Hover originating from a list row; `None` means the pointer left.
    pub fn hover_from_list(&mut self, id: Option<ListingId>, sdk: &mut dyn MapSdk) {
        self.apply_hover(id, sdk);
    }

    /// Hover originating from a map marker. Symmetric with
    /// [`InteractionSynchronizer::hover_from_list`], plus row emphasis
    /// commands for the list side.
    pub fn hover_from_map(&mut self, id: Option<ListingId>, sdk: &mut dyn MapSdk) {
        let prev = self.state.hovered;
        self.apply_hover(id, sdk);
        if prev != id {
            if let Some(p) = prev {
                self.commands.push(ListCommand::EmphasizeRow { id: p, on: false });
            }
            if let Some(n) = id {
                self.commands.push(ListCommand::EmphasizeRow { id: n, on: true });
            }
        }
    }

    fn apply_hover(&mut self, id: Option<ListingId>, sdk: &mut dyn MapSdk) {
        let prev = self.state.hovered;
        if prev == id {
            return;
        }
        if let Some(p) = prev {
            sdk.set_emphasis(MarkerKey::Listing(p), false);
        }
        if let Some(n) = id {
            sdk.set_emphasis(MarkerKey::Listing(n), true);
        }
        self.state.hovered = id;
    }

    /// Select from either side: row click, marker click, or fanned-marker
    /// click. Opens this listing's popup (closing any other), scrolls the
    /// row into view and starts the transient highlight.
    pub fn select(&mut self, id: ListingId, now: Tick, sdk: &mut dyn MapSdk) {
        self.state.selected = Some(id);

        if self.state.open_popup != Some(id) {
            if let Some(prev) = self.state.open_popup {
                sdk.close_popup(MarkerKey::Listing(prev));
            }
            sdk.open_popup(MarkerKey::Listing(id));
            self.state.open_popup = Some(id);
        }

        self.commands.push(ListCommand::ScrollIntoView { id });
        self.highlight_deadline = Some((id, now.plus_ms(self.config.highlight_ms)));
    }

    /// Map background click: drop selection, close the popup.
    pub fn clear_selection(&mut self, sdk: &mut dyn MapSdk) {
        self.state.selected = None;
        if let Some(prev) = self.state.open_popup.take() {
            sdk.close_popup(MarkerKey::Listing(prev));
        }
    }

    /// Advances the transient-highlight timer.
    pub fn tick(&mut self, now: Tick) {
        if let Some((id, deadline)) = self.highlight_deadline
            && now >= deadline
        {
            self.highlight_deadline = None;
            self.commands.push(ListCommand::ClearHighlight { id });
        }
    }

    pub fn drain_commands(&mut self) -> Vec<ListCommand> {
        std::mem::take(&mut self.commands)
    }
}
