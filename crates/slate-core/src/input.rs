//! Input sampling, queueing and dispatch.
//!
//! Drivers (or the simulator) submit raw touch and key samples into a
//! fixed-depth mailbox from interrupt or task context. The dispatcher
//! drains the mailbox inside the core critical section, hit-tests touches
//! against the widget tree topmost-first, and turns raw samples into
//! widget events: touch down/move/up, synthesized clicks, focus and
//! active transitions.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embedded_graphics::prelude::*;

use crate::geometry::contains;
use crate::layout;
use crate::tree::{WidgetArena, WidgetId};
use crate::widget::{self, EventResult, WidgetEvent};

/// Depth of the raw input mailbox. Samples beyond this are dropped at the
/// producer; the newest sample loses, never queued state.
pub const INPUT_QUEUE_DEPTH: usize = 10;

/// Consecutive pressed-move samples closer than this (per axis) to the
/// previous one are discarded as sensor jitter.
const MOVE_DEDUP_PX: u16 = 2;

/// Raw touch coordinates as reported by the digitizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchPoint {
    pub x: u16,
    pub y: u16,
}

impl TouchPoint {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    pub fn to_point(self) -> Point {
        Point::new(self.x as i32, self.y as i32)
    }
}

/// Contact state carried by a touch sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchStatus {
    Pressed,
    Released,
}

/// Maximum simultaneous contacts in one digitizer report.
pub const MAX_TOUCH_POINTS: usize = 2;

/// One digitizer report: contact state plus up to [`MAX_TOUCH_POINTS`]
/// coordinates. Dispatch targets the first (primary) contact; the count
/// participates in de-duplication so a second finger landing is never
/// discarded as jitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TouchSample {
    pub points: heapless::Vec<TouchPoint, MAX_TOUCH_POINTS>,
    pub status: TouchStatus,
}

impl TouchSample {
    /// Single-contact sample, the common case.
    pub fn single(point: TouchPoint, status: TouchStatus) -> Self {
        let mut points = heapless::Vec::new();
        let _ = points.push(point);
        Self { points, status }
    }

    /// Sample from a contact slice; points beyond [`MAX_TOUCH_POINTS`]
    /// are ignored.
    pub fn multi(points: &[TouchPoint], status: TouchStatus) -> Self {
        let mut v = heapless::Vec::new();
        for &p in points.iter().take(MAX_TOUCH_POINTS) {
            let _ = v.push(p);
        }
        Self { points: v, status }
    }

    pub fn primary(&self) -> Option<TouchPoint> {
        self.points.first().copied()
    }
}

/// Opaque key identifier. Printable keys carry their character value;
/// control keys use the well-known ASCII control codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCode(pub u16);

/// Tab advances focus to the next sibling when the focused widget leaves
/// the key unhandled.
pub const KEY_TAB: KeyCode = KeyCode(0x09);

/// A raw sample as submitted by a driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSample {
    Touch(TouchSample),
    Key(KeyCode),
}

/// Fixed-depth mailbox between input drivers and the dispatcher.
///
/// Submission is wait-free and safe from interrupt context; a full queue
/// rejects the new sample rather than blocking or overwriting history.
pub struct InputQueue {
    channel: Channel<CriticalSectionRawMutex, InputSample, INPUT_QUEUE_DEPTH>,
}

impl InputQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Submit a sample. Returns `false` when the queue was full and the
    /// sample was dropped.
    pub fn submit(&self, sample: InputSample) -> bool {
        self.channel.try_send(sample).is_ok()
    }

    pub fn submit_touch(&self, point: TouchPoint, status: TouchStatus) -> bool {
        self.submit(InputSample::Touch(TouchSample::single(point, status)))
    }

    pub fn submit_touches(&self, points: &[TouchPoint], status: TouchStatus) -> bool {
        self.submit(InputSample::Touch(TouchSample::multi(points, status)))
    }

    pub fn submit_key(&self, code: KeyCode) -> bool {
        self.submit(InputSample::Key(code))
    }

    /// Take the oldest queued sample, if any.
    pub fn pop(&self) -> Option<InputSample> {
        self.channel.try_receive().ok()
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-core dispatch state: the widget currently under a held touch, the
/// focused widget and the last pressed coordinate for jitter rejection.
#[derive(Debug, Default)]
pub struct InputDispatcher {
    /// Target of the touch currently held down, with the press point.
    pressed: Option<(WidgetId, TouchPoint)>,
    /// Last pressed-state primary coordinate seen, for move deduplication.
    last_point: Option<TouchPoint>,
    /// Contact count of the last pressed sample; a change always passes
    /// de-duplication.
    last_count: usize,
    focused: Option<WidgetId>,
    active: Option<WidgetId>,
}

impl InputDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused(&self) -> Option<WidgetId> {
        self.focused
    }

    pub fn active(&self) -> Option<WidgetId> {
        self.active
    }

    /// Process one raw sample against the tree.
    pub fn process(&mut self, arena: &mut WidgetArena, sample: InputSample) {
        match sample {
            InputSample::Touch(touch) => self.process_touch(arena, touch),
            InputSample::Key(code) => self.process_key(arena, code),
        }
    }

    fn process_touch(&mut self, arena: &mut WidgetArena, touch: TouchSample) {
        match touch.status {
            TouchStatus::Pressed => {
                let Some(point) = touch.primary() else { return };
                if let Some((target, _)) = self.pressed {
                    // Held contact moving.
                    if touch.points.len() == self.last_count
                        && let Some(prev) = self.last_point
                        && prev.x.abs_diff(point.x) < MOVE_DEDUP_PX
                        && prev.y.abs_diff(point.y) < MOVE_DEDUP_PX
                    {
                        return;
                    }
                    self.last_point = Some(point);
                    self.last_count = touch.points.len();
                    widget::deliver(arena, target, &WidgetEvent::TouchMove(point));
                    return;
                }

                let Some(target) = hit_test(arena, point.to_point()) else {
                    return;
                };
                self.pressed = Some((target, point));
                self.last_point = Some(point);
                self.last_count = touch.points.len();
                raise(arena, target);
                self.set_active(arena, Some(target));
                self.set_focus(arena, Some(target));
                widget::deliver(arena, target, &WidgetEvent::TouchDown(point));
            }
            TouchStatus::Released => {
                let Some((target, _)) = self.pressed.take() else {
                    return;
                };
                // A release may report no coordinates; fall back to the
                // last pressed position.
                let point = touch
                    .primary()
                    .or(self.last_point)
                    .unwrap_or(TouchPoint::new(0, 0));
                self.last_point = None;
                self.last_count = 0;
                widget::deliver(arena, target, &WidgetEvent::TouchUp(point));
                // A release still inside the widget is a click.
                if let Ok(rect) = layout::resolve_rect(arena, target)
                    && contains(&rect, point.to_point())
                {
                    widget::deliver(arena, target, &WidgetEvent::Click(point));
                }
                self.set_active(arena, None);
            }
        }
    }

    fn process_key(&mut self, arena: &mut WidgetArena, code: KeyCode) {
        let Some(focused) = self.focused else { return };
        if !arena.contains(focused) {
            self.focused = None;
            return;
        }
        let result = widget::deliver(arena, focused, &WidgetEvent::KeyPress(code));
        if result == EventResult::NotHandled && code == KEY_TAB {
            let next = arena
                .next_sibling(None, Some(focused))
                .or_else(|| arena.parent(focused).and_then(|p| arena.first_child(p)));
            if let Some(next) = next {
                self.set_focus(arena, Some(next));
            }
        }
    }

    /// Change the focused widget, delivering leave/enter events.
    pub fn set_focus(&mut self, arena: &mut WidgetArena, id: Option<WidgetId>) {
        if self.focused == id {
            return;
        }
        if let Some(old) = self.focused.take()
            && let Ok(node) = arena.get_mut(old)
        {
            node.focused = false;
            widget::deliver(arena, old, &WidgetEvent::FocusOut);
        }
        if let Some(new) = id
            && let Ok(node) = arena.get_mut(new)
        {
            node.focused = true;
            self.focused = Some(new);
            widget::deliver(arena, new, &WidgetEvent::FocusIn);
        }
    }

    fn set_active(&mut self, arena: &mut WidgetArena, id: Option<WidgetId>) {
        if self.active == id {
            return;
        }
        if let Some(old) = self.active.take()
            && let Ok(node) = arena.get_mut(old)
        {
            node.active = false;
            widget::deliver(arena, old, &WidgetEvent::ActiveOut);
        }
        if let Some(new) = id
            && let Ok(node) = arena.get_mut(new)
        {
            node.active = true;
            self.active = Some(new);
            widget::deliver(arena, new, &WidgetEvent::ActiveIn);
        }
    }

    /// Drop references to a widget that left the tree.
    pub fn forget(&mut self, id: WidgetId) {
        if self.focused == Some(id) {
            self.focused = None;
        }
        if self.active == Some(id) {
            self.active = None;
        }
        if let Some((target, _)) = self.pressed
            && target == id
        {
            self.pressed = None;
            self.last_point = None;
        }
    }
}

/// Find the deepest visible, enabled widget under `p`, preferring later
/// (higher-Z) siblings. Hidden subtrees are transparent to touch.
pub fn hit_test(arena: &WidgetArena, p: Point) -> Option<WidgetId> {
    let root = arena.root();
    let rect = layout::resolve_rect(arena, root).ok()?;
    if !contains(&rect, p) {
        return None;
    }

    let mut target = root;
    'descend: loop {
        for child in arena.children_rev(target) {
            let Ok(node) = arena.get(child) else { continue };
            if !node.visible || !node.enabled {
                continue;
            }
            let Ok(rect) = layout::resolve_rect(arena, child) else {
                continue;
            };
            if contains(&rect, p) {
                target = child;
                continue 'descend;
            }
        }
        return Some(target);
    }
}

/// Bring a widget and each of its ancestors to the front of their
/// respective sibling lists, keeping Z bands intact.
fn raise(arena: &mut WidgetArena, id: WidgetId) {
    let mut cur = Some(id);
    while let Some(w) = cur {
        if w == arena.root() {
            break;
        }
        let _ = arena.move_to_front(w);
        cur = arena.parent(w);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Dim;
    use crate::widget::WidgetNode;
    use crate::widgets::{Button, Panel, WidgetKind};
    use embedded_graphics::pixelcolor::Rgb565;

    fn scene() -> (WidgetArena, WidgetId, WidgetId) {
        let root = WidgetNode::new(0, WidgetKind::Panel(Panel::with_background(Rgb565::BLACK)))
            .with_geometry(Dim::Px(0), Dim::Px(0), Dim::Px(100), Dim::Px(100));
        let mut arena = WidgetArena::new(root);
        let r = arena.root();
        // Two overlapping buttons; `top` is linked after `bottom` at the
        // same Z, so it paints later and wins hit tests.
        let bottom = arena
            .insert(
                r,
                WidgetNode::new(1, WidgetKind::Button(Button::new("a")))
                    .with_geometry(Dim::Px(10), Dim::Px(10), Dim::Px(40), Dim::Px(40)),
            )
            .unwrap();
        let top = arena
            .insert(
                r,
                WidgetNode::new(2, WidgetKind::Button(Button::new("b")))
                    .with_geometry(Dim::Px(30), Dim::Px(10), Dim::Px(40), Dim::Px(40)),
            )
            .unwrap();
        (arena, bottom, top)
    }

    #[test]
    fn queue_rejects_when_full() {
        let queue = InputQueue::new();
        for _ in 0..INPUT_QUEUE_DEPTH {
            assert!(queue.submit_key(KeyCode(b'x' as u16)));
        }
        assert!(!queue.submit_key(KeyCode(b'y' as u16)));
        assert_eq!(queue.len(), INPUT_QUEUE_DEPTH);
        // Oldest sample first.
        assert_eq!(queue.pop(), Some(InputSample::Key(KeyCode(b'x' as u16))));
    }

    #[test]
    fn hit_test_prefers_topmost_overlap() {
        let (arena, bottom, top) = scene();
        // Overlap area belongs to the later sibling.
        assert_eq!(hit_test(&arena, Point::new(35, 20)), Some(top));
        assert_eq!(hit_test(&arena, Point::new(15, 20)), Some(bottom));
        // Empty desktop space falls through to the root.
        assert_eq!(hit_test(&arena, Point::new(90, 90)), Some(arena.root()));
        assert_eq!(hit_test(&arena, Point::new(150, 150)), None);
    }

    #[test]
    fn hit_test_prefers_highest_z() {
        let root = WidgetNode::new(0, WidgetKind::Panel(Panel::with_background(Rgb565::BLACK)))
            .with_geometry(Dim::Px(0), Dim::Px(0), Dim::Px(100), Dim::Px(100));
        let mut arena = WidgetArena::new(root);
        let r = arena.root();
        // Three panels stacked at the same spot with distinct Z-indices,
        // inserted out of order.
        let geometry = |z| {
            WidgetNode::new(z as u16 + 1, WidgetKind::Panel(Panel::new()))
                .with_geometry(Dim::Px(10), Dim::Px(10), Dim::Px(40), Dim::Px(40))
                .with_z_index(z)
        };
        let _z1 = arena.insert(r, geometry(1)).unwrap();
        let _z0 = arena.insert(r, geometry(0)).unwrap();
        let z2 = arena.insert(r, geometry(2)).unwrap();

        let shared = Point::new(30, 30);
        assert_eq!(hit_test(&arena, shared), Some(z2));

        let mut dispatcher = InputDispatcher::new();
        dispatcher.process(
            &mut arena,
            InputSample::Touch(TouchSample::single(TouchPoint::new(30, 30), TouchStatus::Pressed)),
        );
        assert_eq!(dispatcher.focused(), Some(z2));
    }

    #[test]
    fn hidden_widgets_are_transparent_to_touch() {
        let (mut arena, bottom, top) = scene();
        arena.get_mut(top).unwrap().visible = false;
        assert_eq!(hit_test(&arena, Point::new(35, 20)), Some(bottom));
    }

    #[test]
    fn press_sets_focus_and_active_release_clicks() {
        let (mut arena, _, top) = scene();
        let mut dispatcher = InputDispatcher::new();
        dispatcher.process(
            &mut arena,
            InputSample::Touch(TouchSample::single(TouchPoint::new(35, 20), TouchStatus::Pressed)),
        );
        assert_eq!(dispatcher.focused(), Some(top));
        assert_eq!(dispatcher.active(), Some(top));
        assert!(arena.get(top).unwrap().focused);
        assert!(arena.get(top).unwrap().active);

        dispatcher.process(
            &mut arena,
            InputSample::Touch(TouchSample::single(TouchPoint::new(36, 21), TouchStatus::Released)),
        );
        assert_eq!(dispatcher.active(), None);
        assert!(!arena.get(top).unwrap().active);
        // Focus persists after release.
        assert_eq!(dispatcher.focused(), Some(top));
    }

    #[test]
    fn release_outside_widget_is_not_a_click() {
        let (mut arena, _, top) = scene();
        let mut dispatcher = InputDispatcher::new();
        dispatcher.process(
            &mut arena,
            InputSample::Touch(TouchSample::single(TouchPoint::new(35, 20), TouchStatus::Pressed)),
        );
        dispatcher.process(
            &mut arena,
            InputSample::Touch(TouchSample::single(TouchPoint::new(95, 95), TouchStatus::Released)),
        );
        // The button's press counter only advances on a click.
        let WidgetKind::Button(b) = arena.get(top).unwrap().kind() else {
            panic!("expected a button");
        };
        assert_eq!(b.click_count(), 0);
        assert_eq!(dispatcher.active(), None);
    }

    #[test]
    fn click_inside_increments_counter() {
        let (mut arena, _, top) = scene();
        let mut dispatcher = InputDispatcher::new();
        for status in [TouchStatus::Pressed, TouchStatus::Released] {
            dispatcher.process(
                &mut arena,
                InputSample::Touch(TouchSample::single(TouchPoint::new(35, 20), status)),
            );
        }
        let WidgetKind::Button(b) = arena.get(top).unwrap().kind() else {
            panic!("expected a button");
        };
        assert_eq!(b.click_count(), 1);
    }

    #[test]
    fn near_duplicate_moves_are_dropped() {
        let (mut arena, _, top) = scene();
        let mut dispatcher = InputDispatcher::new();
        dispatcher.process(
            &mut arena,
            InputSample::Touch(TouchSample::single(TouchPoint::new(35, 20), TouchStatus::Pressed)),
        );
        // 1px of jitter is discarded; last_point stays put.
        dispatcher.process(
            &mut arena,
            InputSample::Touch(TouchSample::single(TouchPoint::new(36, 20), TouchStatus::Pressed)),
        );
        assert_eq!(dispatcher.last_point, Some(TouchPoint::new(35, 20)));
        // A real move advances it.
        dispatcher.process(
            &mut arena,
            InputSample::Touch(TouchSample::single(TouchPoint::new(40, 20), TouchStatus::Pressed)),
        );
        assert_eq!(dispatcher.last_point, Some(TouchPoint::new(40, 20)));
        let _ = top;
    }

    #[test]
    fn contact_count_change_bypasses_dedup() {
        let (mut arena, _, _) = scene();
        let mut dispatcher = InputDispatcher::new();
        dispatcher.process(
            &mut arena,
            InputSample::Touch(TouchSample::single(TouchPoint::new(35, 20), TouchStatus::Pressed)),
        );
        // Same primary coordinate, but a second finger landed.
        let two = [TouchPoint::new(35, 20), TouchPoint::new(60, 60)];
        dispatcher.process(
            &mut arena,
            InputSample::Touch(TouchSample::multi(&two, TouchStatus::Pressed)),
        );
        assert_eq!(dispatcher.last_count, 2);
    }

    #[test]
    fn press_raises_target_to_front() {
        let (mut arena, bottom, top) = scene();
        let mut dispatcher = InputDispatcher::new();
        // Press the earlier sibling where it is exposed.
        dispatcher.process(
            &mut arena,
            InputSample::Touch(TouchSample::single(TouchPoint::new(15, 20), TouchStatus::Pressed)),
        );
        // It now wins the overlap area too.
        assert_eq!(hit_test(&arena, Point::new(35, 20)), Some(bottom));
        let _ = top;
    }

    #[test]
    fn tab_moves_focus_to_next_sibling() {
        let (mut arena, bottom, top) = scene();
        let mut dispatcher = InputDispatcher::new();
        dispatcher.set_focus(&mut arena, Some(bottom));
        dispatcher.process(&mut arena, InputSample::Key(KEY_TAB));
        assert_eq!(dispatcher.focused(), Some(top));
        assert!(arena.get(top).unwrap().focused);
        assert!(!arena.get(bottom).unwrap().focused);
        // Wraps to the first sibling at the end of the list.
        dispatcher.process(&mut arena, InputSample::Key(KEY_TAB));
        assert_eq!(dispatcher.focused(), Some(bottom));
    }

    #[test]
    fn key_without_focus_is_ignored() {
        let (mut arena, _, _) = scene();
        let mut dispatcher = InputDispatcher::new();
        dispatcher.process(&mut arena, InputSample::Key(KeyCode(b'q' as u16)));
        assert!(dispatcher.focused().is_none());
    }
}
