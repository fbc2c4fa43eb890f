//! Resolved-point assembly.
//!
//! [`SnapResolver`] combines the snap engine, the reference tracker, the
//! tracked lines and the shift chain into the single point used for both
//! live preview and committing geometry.

use crate::geometry::Segment;
use crate::snap::{SnapCandidate, SnapEngine, SnapKind};
use crate::tracking::{REFERENCE_TIMEOUT, ReferenceTracker, TwoPointConstruction};
use crate::{Duration, Instant};
use kurbo::Point;

/// Where a resolved point came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveSource {
    /// The raw point, unchanged.
    Raw,
    /// A snap target on existing geometry.
    Snap(SnapKind),
    /// A previously derived construction point offered as a target.
    ConstructionPoint,
    /// A construction point derived from the reference, which is consumed.
    Construction,
    /// The crossing of the tracked lines.
    TrackedIntersection,
    /// The second point of the shift chain.
    ShiftIntersection,
}

/// A resolved point and its source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved {
    pub point: Point,
    pub source: ResolveSource,
}

impl Resolved {
    fn raw(point: Point) -> Self {
        Self {
            point,
            source: ResolveSource::Raw,
        }
    }

    pub fn is_raw(&self) -> bool {
        self.source == ResolveSource::Raw
    }
}

/// A derived construction point kept around as a snap target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstructionPoint {
    pub point: Point,
    pub created_at: Instant,
}

/// Orchestrates snapping and construction inference.
#[derive(Debug, Clone)]
pub struct SnapResolver {
    engine: SnapEngine,
    reference: ReferenceTracker,
    tracked: TwoPointConstruction,
    shift_chain: TwoPointConstruction,
    construction_point: Option<ConstructionPoint>,
    timeout: Duration,
    bypass: bool,
    shift_held: bool,
}

impl Default for SnapResolver {
    fn default() -> Self {
        Self::new(REFERENCE_TIMEOUT)
    }
}

impl SnapResolver {
    /// Create a resolver whose transient state lives for `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            engine: SnapEngine::new(),
            reference: ReferenceTracker::new(timeout),
            tracked: TwoPointConstruction::tracked_lines(timeout),
            shift_chain: TwoPointConstruction::shift_chain(),
            construction_point: None,
            timeout,
            bypass: false,
            shift_held: false,
        }
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
        self.reference.set_timeout(timeout);
        self.tracked.set_timeout(Some(timeout));
    }

    pub fn set_on_segment_multiplier(&mut self, multiplier: f64) {
        self.engine.set_on_segment_multiplier(multiplier);
    }

    /// Refresh the engine's segment snapshot and thresholds.
    pub fn configure(&mut self, threshold_pixels: f64, zoom_scale: f64, segments: &[Segment]) {
        self.engine.configure(threshold_pixels, zoom_scale, segments);
    }

    /// Make `resolve` the identity (delete/select mode).
    pub fn set_bypass(&mut self, bypass: bool) {
        self.bypass = bypass;
        if bypass {
            self.engine.reset();
        }
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypass
    }

    pub fn engine(&self) -> &SnapEngine {
        &self.engine
    }

    pub fn reference(&self) -> &ReferenceTracker {
        &self.reference
    }

    pub fn tracked_lines(&self) -> &TwoPointConstruction {
        &self.tracked
    }

    pub fn shift_chain(&self) -> &TwoPointConstruction {
        &self.shift_chain
    }

    /// The live construction point, if it has not expired.
    pub fn construction_point(&self, now: Instant) -> Option<Point> {
        self.construction_point
            .filter(|cp| !self.is_expired(cp.created_at, now))
            .map(|cp| cp.point)
    }

    /// The active snap from the most recent resolve.
    pub fn current_snap(&self) -> SnapCandidate {
        self.engine.current()
    }

    fn is_expired(&self, created_at: Instant, now: Instant) -> bool {
        now.saturating_duration_since(created_at) > self.timeout
    }

    /// Resolve a raw world-space point.
    pub fn resolve(&mut self, raw: Point, now: Instant) -> Resolved {
        if self.bypass {
            return Resolved::raw(raw);
        }

        let radius = self.engine.effective_radius();
        let in_range = |p: Point| (p - raw).hypot() <= radius;

        if let Some(point) = self.construction_point(now).filter(|&p| in_range(p)) {
            return Resolved {
                point,
                source: ResolveSource::ConstructionPoint,
            };
        }

        let snap = self.engine.query(raw);
        if snap.is_active() {
            self.tracked.feed(snap.location, now);
            if self.shift_held {
                self.feed_shift_chain(snap.location, now);
            }

            if let Some(point) = self.tracked.intersection(now).filter(|&p| in_range(p)) {
                return Resolved {
                    point,
                    source: ResolveSource::TrackedIntersection,
                };
            }
            if let Some(point) = self.shift_chain.intersection(now).filter(|&p| in_range(p)) {
                return Resolved {
                    point,
                    source: ResolveSource::ShiftIntersection,
                };
            }

            if !self.reference.is_armed(now) {
                self.reference.set_reference(snap.location, snap.location - raw, now);
            } else {
                let construct = self.reference.derive_construction_point(snap.location, now);
                if in_range(construct) {
                    log::debug!("Reference consumed by construction point");
                    self.reference.clear();
                    return Resolved {
                        point: construct,
                        source: ResolveSource::Construction,
                    };
                }
                self.construction_point = Some(ConstructionPoint {
                    point: construct,
                    created_at: now,
                });
            }

            return Resolved {
                point: snap.location,
                source: ResolveSource::Snap(snap.kind),
            };
        }

        if let Some(point) = self.tracked.intersection(now).filter(|&p| in_range(p)) {
            return Resolved {
                point,
                source: ResolveSource::TrackedIntersection,
            };
        }

        Resolved::raw(raw)
    }

    pub fn is_shift_held(&self) -> bool {
        self.shift_held
    }

    /// Modifier pressed: the active snap, and every snap resolved while the
    /// modifier stays held, joins the shift chain.
    pub fn shift_pressed(&mut self, now: Instant) {
        self.shift_held = true;
        let snap = self.engine.current();
        if snap.is_active() {
            self.feed_shift_chain(snap.location, now);
        }
    }

    /// Modifier released: the chain is cleared unconditionally.
    pub fn shift_released(&mut self) {
        self.shift_held = false;
        self.shift_chain.clear();
    }

    /// Hovering the same target repeatedly adds it once.
    fn feed_shift_chain(&mut self, point: Point, now: Instant) {
        let last = self
            .shift_chain
            .slots()
            .iter()
            .rev()
            .find(|slot| slot.active)
            .map(|slot| slot.start);
        if last != Some(point) {
            self.shift_chain.feed(point, now);
        }
    }

    /// Start of a new, unrelated action: drop the construction point, the
    /// reference and the tracked lines.
    pub fn begin_action(&mut self) {
        self.construction_point = None;
        self.reference.clear();
        self.tracked.clear();
    }

    /// Drop every piece of transient state, including the shift chain.
    pub fn clear_all(&mut self) {
        self.begin_action();
        self.shift_chain.clear();
        self.engine.reset();
    }

    /// Evict expired state. Returns whether a redraw is needed.
    pub fn sweep(&mut self, now: Instant) -> bool {
        let mut changed = self.reference.sweep(now);
        changed |= self.tracked.sweep(now);
        let expired = self
            .construction_point
            .is_some_and(|cp| self.is_expired(cp.created_at, now));
        if expired {
            self.construction_point = None;
            changed = true;
        }
        changed
    }
}
