use geo::{GeoBounds, LatLng, viewport_bounds};
use runtime::{Debouncer, Tick};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewportConfig {
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f64,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,
    /// Quiet window after the last movement event before the viewport
    /// counts as settled.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

fn default_min_zoom() -> f64 {
    3.0
}

fn default_max_zoom() -> f64 {
    19.0
}

fn default_settle_ms() -> u64 {
    300
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
            settle_ms: default_settle_ms(),
        }
    }
}

/// Emitted once per user gesture, after movement has been quiet for the
/// settle window.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SettleEvent {
    pub center: LatLng,
    pub zoom: f64,
    pub bounds: GeoBounds,
}

/// Owns center/zoom/bounds and coalesces raw SDK movement into settle
/// events.
///
/// Feedback-loop guard: the `user_interacting` flag is set only by
/// SDK-originated movement (`on_move_start`), and programmatic writes
/// (`set_coordinates`/`set_zoom`) cancel any pending settle instead of
/// arming one. An engine-originated viewport write therefore never
/// re-triggers the fetch path by itself.
#[derive(Debug)]
pub struct ViewportController {
    config: ViewportConfig,
    center: LatLng,
    zoom: f64,
    width_px: f64,
    height_px: f64,
    settle: Debouncer,
    user_interacting: bool,
}

impl ViewportController {
    pub fn new(
        config: ViewportConfig,
        center: LatLng,
        zoom: f64,
        width_px: f64,
        height_px: f64,
    ) -> Self {
        let settle = Debouncer::new(config.settle_ms);
        let zoom = zoom.clamp(config.min_zoom, config.max_zoom);
        Self {
            config,
            center,
            zoom,
            width_px,
            height_px,
            settle,
            user_interacting: false,
        }
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn is_user_interacting(&self) -> bool {
        self.user_interacting
    }

    /// Bounds are always derived from center + zoom + viewport size, so
    /// they can never drift from the viewport state they describe.
    pub fn bounds(&self) -> GeoBounds {
        viewport_bounds(self.center, self.zoom, self.width_px, self.height_px)
    }

    pub fn set_size(&mut self, width_px: f64, height_px: f64) {
        self.width_px = width_px;
        self.height_px = height_px;
    }

    /// Programmatic re-center (search selection, cluster zoom).
    pub fn set_coordinates(&mut self, center: LatLng) {
        self.center = center;
        self.settle.cancel();
        self.user_interacting = false;
    }

    /// Programmatic zoom, clamped to the configured range.
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.config.min_zoom, self.config.max_zoom);
        self.settle.cancel();
        self.user_interacting = false;
    }

    /// SDK drag/zoom gesture started.
    pub fn on_move_start(&mut self, now: Tick) {
        self.user_interacting = true;
        self.settle.kick(now);
    }

    /// SDK movement frame with the live camera state.
    pub fn on_move(&mut self, now: Tick, center: LatLng, zoom: f64) {
        self.center = center;
        self.zoom = zoom.clamp(self.config.min_zoom, self.config.max_zoom);
        if self.user_interacting {
            self.settle.kick(now);
        }
    }

    /// SDK gesture ended; the settle window starts (or restarts) here.
    pub fn on_move_end(&mut self, now: Tick) {
        if self.user_interacting {
            self.settle.kick(now);
        }
    }

    /// Fires at most one settle event once movement has been quiet long
    /// enough; clears the interaction flag.
    pub fn poll(&mut self, now: Tick) -> Option<SettleEvent> {
        if !self.settle.poll(now) {
            return None;
        }
        if !self.user_interacting {
            return None;
        }
        self.user_interacting = false;
        Some(SettleEvent {
            center: self.center,
            zoom: self.zoom,
            bounds: self.bounds(),
        })
    }
}
