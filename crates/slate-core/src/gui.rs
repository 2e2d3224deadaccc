//! The core context and its locked entry point.
//!
//! [`Core`] owns everything mutable: the widget arena, the region
//! allocator, the timer manager, the translator, input dispatch state and
//! the framebuffer. All operations take `&mut Core`, so holding the core
//! is the lock.
//!
//! [`Gui`] wraps a `Core` in a critical-section mutex for firmware use:
//! drivers submit input samples lock-free from interrupt context, the
//! main loop calls [`Gui::process`] which drains input, advances timers
//! and runs one redraw pass atomically with respect to tree mutation.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::info;

use crate::error::Error;
use crate::framebuffer::FrameBuffer;
use crate::geometry::Dim;
use crate::input::{InputDispatcher, InputQueue, KeyCode, TouchPoint, TouchStatus};
use crate::layout;
use crate::mem::RegionHeap;
use crate::render;
use crate::timer::{TimerId, TimerManager, TimerTarget};
use crate::translate::{Language, Translator};
use crate::tree::{WidgetArena, WidgetId};
use crate::widget::{self, WidgetEvent, WidgetNode};
use crate::widgets::{Panel, WidgetKind};

/// Single-owner context for one display.
pub struct Core {
    arena: WidgetArena,
    heap: RegionHeap,
    timers: TimerManager,
    translator: Translator,
    dispatcher: InputDispatcher,
    frame: FrameBuffer,
}

impl Core {
    /// Create a core with a desktop panel covering the whole display.
    pub fn new(display_size: Size) -> Self {
        let desktop = WidgetNode::new(0, WidgetKind::Panel(Panel::new())).with_geometry(
            Dim::Px(0),
            Dim::Px(0),
            Dim::Px(display_size.width as i32),
            Dim::Px(display_size.height as i32),
        );
        let mut core = Self {
            arena: WidgetArena::new(desktop),
            heap: RegionHeap::new(),
            timers: TimerManager::new(),
            translator: Translator::new(),
            dispatcher: InputDispatcher::new(),
            frame: FrameBuffer::new(display_size),
        };
        let root = core.arena.root();
        let _ = render::invalidate(&mut core.arena, root);
        info!(
            "core initialized for a {}x{} display",
            display_size.width, display_size.height
        );
        core
    }

    /// Hand memory regions to the allocator. Must happen before the
    /// first translucent widget is painted; fails once any allocation
    /// was served.
    pub fn assign_memory(&mut self, capacities: &[usize]) -> Result<(), Error> {
        self.heap.assign(capacities)
    }

    pub fn root(&self) -> WidgetId {
        self.arena.root()
    }

    pub fn widget(&self, id: WidgetId) -> Result<&WidgetNode, Error> {
        self.arena.get(id)
    }

    /// Mutable access to a widget's variant state. Invalidate afterwards
    /// when the change affects pixels.
    pub fn widget_mut(&mut self, id: WidgetId) -> Result<&mut WidgetNode, Error> {
        self.arena.get_mut(id)
    }

    /// Resolved absolute rectangle of a widget.
    pub fn widget_rect(&self, id: WidgetId) -> Result<Rectangle, Error> {
        layout::resolve_rect(&self.arena, id)
    }

    /// Insert a widget under `parent` and deliver its `Created` event.
    pub fn create_widget(&mut self, parent: WidgetId, node: WidgetNode) -> Result<WidgetId, Error> {
        let id = self.arena.insert(parent, node)?;
        widget::deliver(&mut self.arena, id, &WidgetEvent::Created);
        render::invalidate(&mut self.arena, id)?;
        Ok(id)
    }

    /// Remove a widget and its whole subtree. Each widget receives a
    /// `Destroy` event and loses its timers and input references first.
    pub fn remove_widget(&mut self, id: WidgetId) -> Result<(), Error> {
        // Reject stale ids and the root up front; a failing call must
        // leave timers and input state untouched.
        self.arena.get(id)?;
        if id == self.arena.root() {
            return Err(Error::InvalidArgument);
        }
        // Damage the area the subtree occupied before the links go away.
        render::invalidate(&mut self.arena, id)?;
        for wid in self.arena.subtree_ids(id) {
            widget::deliver(&mut self.arena, wid, &WidgetEvent::Destroy);
            self.timers.remove_widget_timers(wid);
            self.dispatcher.forget(wid);
        }
        self.arena.remove(id)
    }

    pub fn set_position(&mut self, id: WidgetId, x: Dim, y: Dim) -> Result<(), Error> {
        render::invalidate(&mut self.arena, id)?;
        let node = self.arena.get_mut(id)?;
        node.x = x;
        node.y = y;
        render::invalidate(&mut self.arena, id)
    }

    pub fn set_size(&mut self, id: WidgetId, width: Dim, height: Dim) -> Result<(), Error> {
        render::invalidate(&mut self.arena, id)?;
        let node = self.arena.get_mut(id)?;
        node.width = width;
        node.height = height;
        widget::deliver(&mut self.arena, id, &WidgetEvent::SizeChanged);
        render::invalidate(&mut self.arena, id)
    }

    pub fn set_z_index(&mut self, id: WidgetId, z: i16) -> Result<(), Error> {
        self.arena.set_z_index(id, z)?;
        render::invalidate(&mut self.arena, id)
    }

    pub fn move_to_front(&mut self, id: WidgetId) -> Result<(), Error> {
        self.arena.move_to_front(id)?;
        render::invalidate(&mut self.arena, id)
    }

    pub fn set_visible(&mut self, id: WidgetId, visible: bool) -> Result<(), Error> {
        render::invalidate(&mut self.arena, id)?;
        self.arena.get_mut(id)?.visible = visible;
        render::invalidate(&mut self.arena, id)
    }

    pub fn set_enabled(&mut self, id: WidgetId, enabled: bool) -> Result<(), Error> {
        self.arena.get_mut(id)?.enabled = enabled;
        render::invalidate(&mut self.arena, id)
    }

    /// 255 is fully opaque; anything lower makes the widget composite
    /// through an offscreen buffer.
    pub fn set_alpha(&mut self, id: WidgetId, alpha: u8) -> Result<(), Error> {
        self.arena.get_mut(id)?.alpha = alpha;
        render::invalidate(&mut self.arena, id)
    }

    /// Replace the label/title text of a widget, translating it through
    /// the active language first.
    pub fn set_label(&mut self, id: WidgetId, text: &str) -> Result<(), Error> {
        let translated = self.translator.get(text);
        if !self.arena.get_mut(id)?.kind.set_label(translated) {
            return Err(Error::InvalidArgument);
        }
        render::invalidate(&mut self.arena, id)
    }

    pub fn set_focus(&mut self, id: WidgetId) -> Result<(), Error> {
        if !self.arena.contains(id) {
            return Err(Error::InvalidHandle);
        }
        self.dispatcher.set_focus(&mut self.arena, Some(id));
        Ok(())
    }

    pub fn focused(&self) -> Option<WidgetId> {
        self.dispatcher.focused()
    }

    pub fn invalidate(&mut self, id: WidgetId) -> Result<(), Error> {
        render::invalidate(&mut self.arena, id)
    }

    pub fn begin_ignore_invalidate(&mut self, id: WidgetId) -> Result<(), Error> {
        render::begin_ignore_invalidate(&mut self.arena, id)
    }

    pub fn end_ignore_invalidate(&mut self, id: WidgetId, force: bool) -> Result<(), Error> {
        render::end_ignore_invalidate(&mut self.arena, id, force)
    }

    pub fn create_timer(&mut self, period_ms: u32, target: TimerTarget) -> Result<TimerId, Error> {
        self.timers.create(period_ms, target)
    }

    pub fn start_timer(&mut self, id: TimerId) -> Result<(), Error> {
        self.timers.start(id)
    }

    pub fn start_timer_periodic(&mut self, id: TimerId) -> Result<(), Error> {
        self.timers.start_periodic(id)
    }

    pub fn stop_timer(&mut self, id: TimerId) -> Result<(), Error> {
        self.timers.stop(id)
    }

    pub fn remove_timer(&mut self, id: TimerId) -> Result<(), Error> {
        self.timers.remove(id)
    }

    pub fn set_source_language(&mut self, language: &'static Language) {
        self.translator.set_source(language);
    }

    pub fn set_active_language(&mut self, language: &'static Language) {
        self.translator.set_active(language);
    }

    pub fn translate<'a>(&self, text: &'a str) -> &'a str {
        self.translator.get(text)
    }

    pub fn free_memory(&self) -> usize {
        self.heap.free_bytes()
    }

    pub fn total_memory(&self) -> usize {
        self.heap.total_bytes()
    }

    pub fn min_free_memory(&self) -> usize {
        self.heap.min_free_bytes()
    }

    /// One cooperative processing pass: drain queued input, advance the
    /// timers to `now_ms`, then repaint everything invalidated. Returns
    /// the number of widgets painted.
    pub fn process(&mut self, now_ms: u64, queue: &InputQueue) -> u32 {
        while let Some(sample) = queue.pop() {
            self.dispatcher.process(&mut self.arena, sample);
        }
        self.timers.process(now_ms, &mut self.arena);
        render::run_redraw_pass(&mut self.arena, &mut self.heap, &mut self.frame)
    }

    /// Push the changed part of the framebuffer to a display.
    pub fn flush<D>(&mut self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        self.frame.flush(display)
    }

    /// Read back a framebuffer pixel.
    pub fn pixel(&self, p: Point) -> Option<Rgb565> {
        self.frame.pixel(p)
    }
}

/// Interrupt-safe wrapper: a [`Core`] behind a critical-section mutex
/// plus the raw input mailbox, which lives outside the lock so drivers
/// can feed it from interrupt handlers.
pub struct Gui {
    core: Mutex<CriticalSectionRawMutex, RefCell<Core>>,
    queue: InputQueue,
}

impl Gui {
    pub fn new(display_size: Size) -> Self {
        Self {
            core: Mutex::new(RefCell::new(Core::new(display_size))),
            queue: InputQueue::new(),
        }
    }

    /// Run `f` with exclusive access to the core.
    pub fn with<R>(&self, f: impl FnOnce(&mut Core) -> R) -> R {
        self.core.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Queue a touch sample. Safe from interrupt context; returns `false`
    /// when the mailbox is full and the sample was dropped.
    pub fn submit_touch(&self, point: TouchPoint, status: TouchStatus) -> bool {
        self.queue.submit_touch(point, status)
    }

    /// Queue a key sample. Same contract as [`Gui::submit_touch`].
    pub fn submit_key(&self, code: KeyCode) -> bool {
        self.queue.submit_key(code)
    }

    /// One processing pass under the lock.
    pub fn process(&self, now_ms: u64) -> u32 {
        self.core
            .lock(|cell| cell.borrow_mut().process(now_ms, &self.queue))
    }

    /// Flush the framebuffer to `display` under the lock.
    pub fn flush<D>(&self, display: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        self.core.lock(|cell| cell.borrow_mut().flush(display))
    }
}
