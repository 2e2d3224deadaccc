//! Widget records, control-code events and the behavior capability trait.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::geometry::Dim;
use crate::input::{KeyCode, TouchPoint};
use crate::render;
use crate::tree::{Links, WidgetArena, WidgetId};
use crate::widgets::WidgetKind;

/// A node in the widget tree: geometry, visual state and a typed state blob.
///
/// Geometry axes are stored as [`Dim`] (fixed pixels or percent of parent)
/// and resolved lazily by the layout resolver. All links to other widgets
/// are arena ids, never references.
#[derive(Debug)]
pub struct WidgetNode {
    /// Application-chosen numeric id; not required to be unique.
    pub(crate) user_id: u16,
    pub(crate) x: Dim,
    pub(crate) y: Dim,
    pub(crate) width: Dim,
    pub(crate) height: Dim,
    /// Paint/hit-test ordering key; higher paints later (on top).
    pub(crate) z_index: i16,
    /// 255 = fully opaque; anything lower composites through an
    /// offscreen buffer.
    pub(crate) alpha: u8,
    pub(crate) visible: bool,
    pub(crate) enabled: bool,
    pub(crate) focused: bool,
    pub(crate) active: bool,
    /// Needs repaint on the next redraw pass.
    pub(crate) dirty: bool,
    /// An invalidation arrived while suppressed; applied when the
    /// suppression counter returns to zero.
    pub(crate) pending_invalidate: bool,
    /// Ignore-invalidate depth. While > 0, invalidation requests merge
    /// into `pending_invalidate` instead of marking dirty.
    pub(crate) ignore_invalidate: u8,
    pub(crate) kind: WidgetKind,
    pub(crate) link: Links,
}

impl WidgetNode {
    pub fn new(user_id: u16, kind: WidgetKind) -> Self {
        // Containers fill their parent until given explicit geometry.
        let fill = if kind.allows_children() {
            Dim::Percent(100)
        } else {
            Dim::Px(0)
        };
        Self {
            user_id,
            x: Dim::Px(0),
            y: Dim::Px(0),
            width: fill,
            height: fill,
            z_index: 0,
            alpha: 255,
            visible: true,
            enabled: true,
            focused: false,
            active: false,
            dirty: true,
            pending_invalidate: false,
            ignore_invalidate: 0,
            kind,
            link: Links::default(),
        }
    }

    /// Set position and size in one go (creation-time builder).
    pub fn with_geometry(mut self, x: Dim, y: Dim, width: Dim, height: Dim) -> Self {
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_z_index(mut self, z: i16) -> Self {
        self.z_index = z;
        self
    }

    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    pub fn user_id(&self) -> u16 {
        self.user_id
    }

    pub fn z_index(&self) -> i16 {
        self.z_index
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    pub fn kind(&self) -> &WidgetKind {
        &self.kind
    }
}

/// Control codes delivered to widget behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetEvent {
    /// Widget was linked into the tree.
    Created,
    /// Widget is about to be destroyed.
    Destroy,
    TouchDown(TouchPoint),
    TouchMove(TouchPoint),
    TouchUp(TouchPoint),
    /// Press and release both landed inside the widget.
    Click(TouchPoint),
    KeyPress(KeyCode),
    FocusIn,
    FocusOut,
    ActiveIn,
    ActiveOut,
    SizeChanged,
    /// A software timer owned by this widget fired.
    Tick,
}

/// Outcome of behavior dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    NotHandled,
    Handled,
}

/// Side-channel a behavior uses to request follow-up work from the core.
#[derive(Debug, Default)]
pub struct EventCtx {
    /// Repaint this widget after the event.
    pub invalidate: bool,
    /// Remove the timer that produced a [`WidgetEvent::Tick`]. Applied by
    /// the timer manager after its scan finishes, so requesting it from
    /// inside the firing is safe.
    pub remove_timer: bool,
}

/// Immutable per-draw context handed to behaviors.
#[derive(Debug, Clone, Copy)]
pub struct DrawCtx {
    /// Resolved absolute rectangle of the widget.
    pub rect: Rectangle,
    pub focused: bool,
    pub active: bool,
    pub enabled: bool,
}

/// Capability interface implemented by every widget variant.
///
/// The default method bodies are the base implementation; a variant that
/// does not care about a control code must fall through to them (either by
/// not overriding, or by calling [`base_handle_event`] explicitly from its
/// own `handle_event` arm) so it inherits base behavior.
pub trait Behavior {
    fn draw<D: DrawTarget<Color = Rgb565>>(
        &self,
        ctx: &DrawCtx,
        target: &mut D,
    ) -> Result<(), D::Error> {
        let _ = (ctx, target);
        Ok(())
    }

    fn handle_event(&mut self, ctx: &mut EventCtx, event: &WidgetEvent) -> EventResult {
        base_handle_event(ctx, event)
    }

    fn on_property_changed(&mut self, ctx: &mut EventCtx) {
        ctx.invalidate = true;
    }
}

/// Base event handling shared by all variants: focus/active transitions
/// repaint the widget, everything else is ignored.
pub fn base_handle_event(ctx: &mut EventCtx, event: &WidgetEvent) -> EventResult {
    match event {
        WidgetEvent::FocusIn
        | WidgetEvent::FocusOut
        | WidgetEvent::ActiveIn
        | WidgetEvent::ActiveOut => {
            ctx.invalidate = true;
            EventResult::Handled
        }
        _ => EventResult::NotHandled,
    }
}

/// Dispatch one event to a widget and apply any requested invalidation.
/// Unknown or stale ids are ignored defensively. Returns the dispatch
/// result and the (already applied, except `remove_timer`) context.
pub(crate) fn dispatch(
    arena: &mut WidgetArena,
    id: WidgetId,
    event: &WidgetEvent,
) -> (EventResult, EventCtx) {
    let mut ctx = EventCtx::default();
    let result = match arena.get_mut(id) {
        Ok(node) => node.kind.handle_event(&mut ctx, event),
        Err(_) => return (EventResult::NotHandled, ctx),
    };
    if ctx.invalidate {
        let _ = render::invalidate(arena, id);
        ctx.invalidate = false;
    }
    (result, ctx)
}

/// [`dispatch`], discarding the context. For call sites that only care
/// whether the event was handled.
pub(crate) fn deliver(
    arena: &mut WidgetArena,
    id: WidgetId,
    event: &WidgetEvent,
) -> EventResult {
    dispatch(arena, id, event).0
}
