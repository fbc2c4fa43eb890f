//! Construction tracking: reference points and two-point constructions.
//!
//! A [`ReferenceTracker`] holds at most one reference point and derives
//! perpendicular/parallel construction points from it. A
//! [`TwoPointConstruction`] collects two snap points and offers the
//! crossing of the lines through them; its [`ChainPolicy`] decides whether
//! points alternate between slots (tracked lines) or fill them once in order
//! (the shift chain).

use crate::geometry::{direction_between, normalized, perpendicular};
use crate::kernel::intersect_rays_or_midpoint;
use crate::{Duration, Instant};
use kurbo::{Point, Vec2};

/// Default lifetime of a reference point and of tracked lines.
pub const REFERENCE_TIMEOUT: Duration = Duration::from_secs(2);

/// Distance below which the cursor is considered to sit on the reference.
const COINCIDENT_EPSILON: f64 = 1e-4;

/// A short-lived reference used to derive construction points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferencePoint {
    pub point: Point,
    /// Unit direction.
    pub direction: Vec2,
    pub created_at: Instant,
}

impl ReferencePoint {
    fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.created_at) > timeout
    }
}

/// State of the single-reference construction slot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ConstructionState {
    #[default]
    Idle,
    HasReference(ReferencePoint),
}

/// Foot of `cursor` on the line through `base` along `perpendicular(direction)`.
pub fn perpendicular_point(cursor: Point, base: Point, direction: Vec2) -> Point {
    let offset = cursor - base;
    if offset.hypot() < COINCIDENT_EPSILON {
        return cursor;
    }
    let perp = perpendicular(direction);
    base + perp * offset.dot(perp)
}

/// Foot of `cursor` on the line through `base` along `direction`.
pub fn parallel_point(cursor: Point, base: Point, direction: Vec2) -> Point {
    let perp = perpendicular(direction);
    cursor - perp * (cursor - base).dot(perp)
}

/// Holds at most one reference point and derives construction points.
#[derive(Debug, Clone)]
pub struct ReferenceTracker {
    state: ConstructionState,
    timeout: Duration,
}

impl Default for ReferenceTracker {
    fn default() -> Self {
        Self::new(REFERENCE_TIMEOUT)
    }
}

impl ReferenceTracker {
    pub fn new(timeout: Duration) -> Self {
        Self {
            state: ConstructionState::Idle,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Raw state, without applying expiry.
    pub fn state(&self) -> ConstructionState {
        self.state
    }

    /// Arm a reference. Returns `false` and stays unchanged when `direction`
    /// has no usable length.
    pub fn set_reference(&mut self, point: Point, direction: Vec2, now: Instant) -> bool {
        let Some(direction) = normalized(direction) else {
            return false;
        };
        log::debug!("Reference armed at ({:.3}, {:.3})", point.x, point.y);
        self.state = ConstructionState::HasReference(ReferencePoint {
            point,
            direction,
            created_at: now,
        });
        true
    }

    pub fn clear(&mut self) {
        self.state = ConstructionState::Idle;
    }

    /// The held reference, unless it has expired by `now`.
    pub fn reference(&self, now: Instant) -> Option<&ReferencePoint> {
        match &self.state {
            ConstructionState::HasReference(reference) if !reference.is_expired(now, self.timeout) => {
                Some(reference)
            }
            _ => None,
        }
    }

    pub fn is_armed(&self, now: Instant) -> bool {
        self.reference(now).is_some()
    }

    /// Closer of the perpendicular and parallel points for `cursor`.
    ///
    /// Identity when idle or when the reference has expired.
    pub fn derive_construction_point(&self, cursor: Point, now: Instant) -> Point {
        let Some(reference) = self.reference(now) else {
            return cursor;
        };

        let perp = perpendicular_point(cursor, reference.point, reference.direction);
        let parallel = parallel_point(cursor, reference.point, reference.direction);

        if (perp - cursor).hypot2() <= (parallel - cursor).hypot2() {
            perp
        } else {
            parallel
        }
    }

    /// Drop an expired reference. Returns whether anything was cleared.
    pub fn sweep(&mut self, now: Instant) -> bool {
        let expired = matches!(
            &self.state,
            ConstructionState::HasReference(reference) if reference.is_expired(now, self.timeout)
        );
        if expired {
            log::debug!("Reference expired");
            self.state = ConstructionState::Idle;
        }
        expired
    }
}

/// How successive points are assigned to the two slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainPolicy {
    /// Fill slot 0, then slot 1, then keep moving the end of alternating
    /// slots and recompute the crossing of both lines.
    Alternating,
    /// Fill slot 0, then slot 1; further points are ignored until cleared.
    Chained,
}

/// One slot of a two-point construction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackSlot {
    pub start: Point,
    pub end: Point,
    /// Unit direction, or zero until one is known.
    pub direction: Vec2,
    pub active: bool,
}

impl TrackSlot {
    fn at(point: Point) -> Self {
        Self {
            start: point,
            end: point,
            direction: Vec2::ZERO,
            active: true,
        }
    }

    fn has_direction(&self) -> bool {
        self.direction != Vec2::ZERO
    }

    /// Recompute the direction, keeping the previous one when start and end
    /// coincide.
    fn refresh_direction(&mut self) {
        if let Some(direction) = direction_between(self.start, self.end) {
            self.direction = direction;
        }
    }
}

/// Two slots of snap history and the intersection candidate they imply.
#[derive(Debug, Clone)]
pub struct TwoPointConstruction {
    policy: ChainPolicy,
    slots: [TrackSlot; 2],
    index: usize,
    intersection: Option<Point>,
    timeout: Option<Duration>,
    updated_at: Option<Instant>,
}

impl TwoPointConstruction {
    pub fn new(policy: ChainPolicy, timeout: Option<Duration>) -> Self {
        Self {
            policy,
            slots: [TrackSlot::default(); 2],
            index: 0,
            intersection: None,
            timeout,
            updated_at: None,
        }
    }

    /// Alternating tracked lines that expire with the snap history.
    pub fn tracked_lines(timeout: Duration) -> Self {
        Self::new(ChainPolicy::Alternating, Some(timeout))
    }

    /// Modifier-held chain with no timeout; cleared on release.
    pub fn shift_chain() -> Self {
        Self::new(ChainPolicy::Chained, None)
    }

    pub fn policy(&self) -> ChainPolicy {
        self.policy
    }

    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    pub fn slots(&self) -> &[TrackSlot; 2] {
        &self.slots
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.active).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Record a snap point according to the policy.
    pub fn feed(&mut self, point: Point, now: Instant) {
        if self.is_expired(now) {
            self.clear();
        }

        match self.policy {
            ChainPolicy::Alternating => self.feed_alternating(point),
            ChainPolicy::Chained => {
                if !self.feed_chained(point) {
                    return;
                }
            }
        }
        self.updated_at = Some(now);
    }

    fn feed_alternating(&mut self, point: Point) {
        if !self.slots[0].active {
            self.slots[0] = TrackSlot::at(point);
        } else if !self.slots[1].active {
            self.slots[1] = TrackSlot::at(point);
            self.intersection = Some(point);
        } else {
            self.slots[self.index].end = point;
            for slot in &mut self.slots {
                slot.refresh_direction();
            }
            let [a, b] = &self.slots;
            if a.has_direction() && b.has_direction() {
                self.intersection = Some(intersect_rays_or_midpoint(
                    a.start,
                    a.direction,
                    b.start,
                    b.direction,
                ));
            }
        }
        self.index ^= 1;
    }

    fn feed_chained(&mut self, point: Point) -> bool {
        if !self.slots[0].active {
            self.slots[0] = TrackSlot::at(point);
            return true;
        }
        if self.slots[1].active {
            return false;
        }

        let anchor = self.slots[0].start;
        self.slots[1] = TrackSlot::at(point);
        self.slots[0].end = point;
        if let Some(direction) = direction_between(anchor, point) {
            self.slots[0].direction = direction;
            self.slots[1].direction = direction;
        }
        self.intersection = Some(point);
        true
    }

    /// The intersection candidate, unless the construction has expired.
    pub fn intersection(&self, now: Instant) -> Option<Point> {
        if self.is_expired(now) {
            return None;
        }
        self.intersection
    }

    /// Direction between the two chained points, once both are set.
    pub fn chain_direction(&self) -> Option<Vec2> {
        let slot = &self.slots[1];
        (slot.active && slot.has_direction()).then_some(slot.direction)
    }

    pub fn clear(&mut self) {
        self.slots = [TrackSlot::default(); 2];
        self.index = 0;
        self.intersection = None;
        self.updated_at = None;
    }

    fn is_expired(&self, now: Instant) -> bool {
        match (self.timeout, self.updated_at) {
            (Some(timeout), Some(updated_at)) => now.saturating_duration_since(updated_at) > timeout,
            _ => false,
        }
    }

    /// Clear if expired. Returns whether anything was cleared.
    pub fn sweep(&mut self, now: Instant) -> bool {
        if !self.is_empty() && self.is_expired(now) {
            self.clear();
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn test_idle_derive_is_identity() {
        let tracker = ReferenceTracker::default();
        let now = Instant::now();
        let cursor = Point::new(3.0, 7.0);
        assert_eq!(tracker.derive_construction_point(cursor, now), cursor);
        assert_eq!(tracker.state(), ConstructionState::Idle);
    }

    #[test]
    fn test_set_reference_normalizes() {
        let mut tracker = ReferenceTracker::default();
        let now = Instant::now();
        assert!(tracker.set_reference(Point::ZERO, Vec2::new(0.0, 5.0), now));
        let reference = tracker.reference(now).unwrap();
        assert!(approx(reference.direction.to_point(), Point::new(0.0, 1.0)));
    }

    #[test]
    fn test_set_reference_rejects_zero_direction() {
        let mut tracker = ReferenceTracker::default();
        let now = Instant::now();
        assert!(!tracker.set_reference(Point::ZERO, Vec2::ZERO, now));
        assert!(!tracker.is_armed(now));
    }

    #[test]
    fn test_derive_picks_parallel_point() {
        let mut tracker = ReferenceTracker::default();
        let now = Instant::now();
        tracker.set_reference(Point::ZERO, Vec2::new(1.0, 0.0), now);
        // Close to the x-axis: the parallel foot (10, 0) is nearer than the
        // perpendicular foot (0, 1).
        let p = tracker.derive_construction_point(Point::new(10.0, 1.0), now);
        assert!(approx(p, Point::new(10.0, 0.0)));
    }

    #[test]
    fn test_derive_picks_perpendicular_point() {
        let mut tracker = ReferenceTracker::default();
        let now = Instant::now();
        tracker.set_reference(Point::ZERO, Vec2::new(1.0, 0.0), now);
        let p = tracker.derive_construction_point(Point::new(1.0, 10.0), now);
        assert!(approx(p, Point::new(0.0, 10.0)));
    }

    #[test]
    fn test_derive_at_reference_point() {
        let mut tracker = ReferenceTracker::default();
        let now = Instant::now();
        tracker.set_reference(Point::new(2.0, 2.0), Vec2::new(1.0, 1.0), now);
        let p = tracker.derive_construction_point(Point::new(2.0, 2.0), now);
        assert!(approx(p, Point::new(2.0, 2.0)));
    }

    #[test]
    fn test_reference_expiry() {
        let mut tracker = ReferenceTracker::default();
        let start = Instant::now();
        tracker.set_reference(Point::ZERO, Vec2::new(1.0, 0.0), start);

        let cursor = Point::new(10.0, 1.0);
        let later = start + REFERENCE_TIMEOUT + Duration::from_millis(1);
        assert_eq!(tracker.derive_construction_point(cursor, later), cursor);
        assert!(!tracker.is_armed(later));

        // Still held until swept.
        assert!(matches!(tracker.state(), ConstructionState::HasReference(_)));
        assert!(tracker.sweep(later));
        assert_eq!(tracker.state(), ConstructionState::Idle);
        assert!(!tracker.sweep(later));
    }

    #[test]
    fn test_reference_alive_at_timeout() {
        let mut tracker = ReferenceTracker::default();
        let start = Instant::now();
        tracker.set_reference(Point::ZERO, Vec2::new(1.0, 0.0), start);
        assert!(tracker.is_armed(start + REFERENCE_TIMEOUT));
        assert!(!tracker.sweep(start + REFERENCE_TIMEOUT));
    }

    #[test]
    fn test_tracked_lines_fill_then_intersect() {
        let now = Instant::now();
        let mut tracked = TwoPointConstruction::tracked_lines(REFERENCE_TIMEOUT);

        tracked.feed(Point::new(0.0, 0.0), now);
        assert_eq!(tracked.len(), 1);
        assert!(tracked.intersection(now).is_none());

        tracked.feed(Point::new(10.0, 0.0), now);
        assert_eq!(tracked.len(), 2);
        assert_eq!(tracked.intersection(now), Some(Point::new(10.0, 0.0)));

        // Slot 0 grows along +y from the origin.
        tracked.feed(Point::new(0.0, 5.0), now);
        // Slot 1 grows along +x+y from (10, 0); its line crosses x = 0 at y = -10.
        tracked.feed(Point::new(11.0, 1.0), now);

        let hit = tracked.intersection(now).unwrap();
        assert!(approx(hit, Point::new(0.0, -10.0)));
    }

    #[test]
    fn test_tracked_lines_parallel_fallback() {
        let now = Instant::now();
        let mut tracked = TwoPointConstruction::tracked_lines(REFERENCE_TIMEOUT);
        tracked.feed(Point::new(0.0, 0.0), now);
        tracked.feed(Point::new(4.0, 0.0), now);
        tracked.feed(Point::new(1.0, 0.0), now);
        tracked.feed(Point::new(5.0, 0.0), now);
        assert!(approx(tracked.intersection(now).unwrap(), Point::new(2.0, 0.0)));
    }

    #[test]
    fn test_tracked_lines_expire() {
        let start = Instant::now();
        let mut tracked = TwoPointConstruction::tracked_lines(REFERENCE_TIMEOUT);
        tracked.feed(Point::new(0.0, 0.0), start);
        tracked.feed(Point::new(1.0, 0.0), start);

        let later = start + REFERENCE_TIMEOUT + Duration::from_millis(100);
        assert!(tracked.intersection(later).is_none());
        assert!(tracked.sweep(later));
        assert!(tracked.is_empty());
    }

    #[test]
    fn test_shift_chain_caps_at_two() {
        let now = Instant::now();
        let mut chain = TwoPointConstruction::shift_chain();
        chain.feed(Point::new(0.0, 0.0), now);
        assert!(chain.chain_direction().is_none());

        chain.feed(Point::new(0.0, 3.0), now);
        assert_eq!(chain.intersection(now), Some(Point::new(0.0, 3.0)));
        assert!(approx(chain.chain_direction().unwrap().to_point(), Point::new(0.0, 1.0)));

        chain.feed(Point::new(9.0, 9.0), now);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.intersection(now), Some(Point::new(0.0, 3.0)));
    }

    #[test]
    fn test_shift_chain_never_expires() {
        let start = Instant::now();
        let mut chain = TwoPointConstruction::shift_chain();
        chain.feed(Point::new(0.0, 0.0), start);
        chain.feed(Point::new(1.0, 0.0), start);
        let much_later = start + Duration::from_secs(3600);
        assert!(!chain.sweep(much_later));
        assert_eq!(chain.intersection(much_later), Some(Point::new(1.0, 0.0)));
    }

    #[test]
    fn test_shift_chain_coincident_points_keep_zero_direction() {
        let now = Instant::now();
        let mut chain = TwoPointConstruction::shift_chain();
        chain.feed(Point::new(2.0, 2.0), now);
        chain.feed(Point::new(2.0, 2.0), now);
        assert!(chain.chain_direction().is_none());
        assert_eq!(chain.intersection(now), Some(Point::new(2.0, 2.0)));

        chain.clear();
        assert!(chain.is_empty());
        assert!(chain.intersection(now).is_none());
    }
}
