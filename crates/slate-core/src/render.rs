//! Invalidation tracking and the redraw/compositing engine.
//!
//! Widgets move through `CLEAN -> DIRTY -> (suppressed) -> painted ->
//! CLEAN`. Invalidating a widget dirties it, every overlapping ancestor
//! (bottom-up compositing forces the ancestor to rebuild) and any later
//! sibling whose rectangle overlaps it (content painted above must be
//! repainted). The accumulated bounding box of everything invalidated
//! clips the next redraw pass, so repaint work stays proportional to the
//! damaged screen area.
//!
//! Painting walks the tree in paint order: each widget before its later-Z
//! siblings and before its children. A widget with `alpha < 255`
//! composites through an offscreen buffer carved from the region
//! allocator, blended bottom-up into its parent's active target and freed
//! immediately. Offscreen allocation failure degrades that subtree to
//! direct opaque paint; a partially wrong frame beats a frozen renderer.

use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_graphics::pixelcolor::raw::RawU16;
use embedded_graphics::pixelcolor::{IntoStorage, Rgb565, Rgb888};
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;
use log::warn;

use crate::error::Error;
use crate::framebuffer::FrameBuffer;
use crate::geometry::{intersect, overlaps};
use crate::layout;
use crate::mem::{BlockRef, RegionHeap};
use crate::tree::{WidgetArena, WidgetId};
use crate::widget::DrawCtx;

/// Hard bound on paint nesting. Deeper subtrees are not painted (and a
/// warning is logged) instead of growing the call stack with the widget
/// hierarchy.
const MAX_PAINT_DEPTH: usize = 32;

/// Mark a widget as needing redraw.
///
/// While the widget's ignore-invalidate counter is above zero the request
/// is merged into a pending bit instead. Otherwise the widget, its
/// overlapping ancestors and its overlapping later siblings all go dirty,
/// and the invalid region grows to cover the widget's rectangle.
pub fn invalidate(arena: &mut WidgetArena, id: WidgetId) -> Result<(), Error> {
    let node = arena.get_mut(id)?;
    if node.ignore_invalidate > 0 {
        node.pending_invalidate = true;
        return Ok(());
    }

    let rect = layout::resolve_rect(arena, id)?;
    arena.invalid_region = Some(match arena.invalid_region {
        Some(acc) => bounding_box(&acc, &rect),
        None => rect,
    });

    mark_dirty(arena, id, &rect);
    Ok(())
}

/// Enter an ignore-invalidate scope: invalidation requests on this widget
/// are suppressed and merged until the matching `end_ignore_invalidate`.
pub fn begin_ignore_invalidate(arena: &mut WidgetArena, id: WidgetId) -> Result<(), Error> {
    let node = arena.get_mut(id)?;
    node.ignore_invalidate = node.ignore_invalidate.saturating_add(1);
    Ok(())
}

/// Leave an ignore-invalidate scope. On the transition to zero, a single
/// invalidation runs if any was pending (or `force` is set).
pub fn end_ignore_invalidate(
    arena: &mut WidgetArena,
    id: WidgetId,
    force: bool,
) -> Result<(), Error> {
    let node = arena.get_mut(id)?;
    if node.ignore_invalidate == 0 {
        return Err(Error::InvalidArgument);
    }
    node.ignore_invalidate -= 1;
    if node.ignore_invalidate == 0 {
        let pending = core::mem::replace(&mut node.pending_invalidate, false);
        if pending || force {
            invalidate(arena, id)?;
        }
    }
    Ok(())
}

fn mark_dirty(arena: &mut WidgetArena, id: WidgetId, rect: &Rectangle) {
    if let Ok(node) = arena.get_mut(id) {
        node.dirty = true;
    }

    // Later (higher-Z) siblings painted over this area must repaint.
    let mut sib = arena.node(id).and_then(|n| n.link.next);
    while let Some(s) = sib {
        if let Ok(srect) = layout::resolve_rect(arena, s)
            && overlaps(&srect, rect)
            && let Ok(n) = arena.get_mut(s)
        {
            n.dirty = true;
        }
        sib = arena.node(s).and_then(|n| n.link.next);
    }

    // Ancestors rebuild their composite whenever a descendant changes.
    let mut cur = arena.parent(id);
    while let Some(p) = cur {
        if let Ok(prect) = layout::resolve_rect(arena, p)
            && overlaps(&prect, rect)
            && let Ok(n) = arena.get_mut(p)
        {
            n.dirty = true;
        }
        cur = arena.parent(p);
    }
}

fn bounding_box(a: &Rectangle, b: &Rectangle) -> Rectangle {
    let min_x = a.top_left.x.min(b.top_left.x);
    let min_y = a.top_left.y.min(b.top_left.y);
    let max_x = (a.top_left.x + a.size.width as i32).max(b.top_left.x + b.size.width as i32);
    let max_y = (a.top_left.y + a.size.height as i32).max(b.top_left.y + b.size.height as i32);
    Rectangle::new(
        Point::new(min_x, min_y),
        Size::new((max_x - min_x) as u32, (max_y - min_y) as u32),
    )
}

fn is_empty(r: &Rectangle) -> bool {
    r.size.width == 0 || r.size.height == 0
}

/// Active paint destination: the framebuffer, or an ancestor's offscreen
/// buffer covering `rect` in absolute coordinates.
#[derive(Clone, Copy)]
enum Dst {
    Frame,
    Block { block: BlockRef, rect: Rectangle },
}

/// Run one cooperative redraw pass. Not re-entrant; the caller holds the
/// tree/allocator critical section for the whole pass. Returns the number
/// of widgets painted.
pub fn run_redraw_pass(
    arena: &mut WidgetArena,
    heap: &mut RegionHeap,
    frame: &mut FrameBuffer,
) -> u32 {
    let screen = Rectangle::new(Point::zero(), frame.size());
    let clip = match arena.invalid_region.take() {
        Some(region) => intersect(&screen, &region),
        None => screen,
    };

    let mut painted = 0;
    let mut scan: Vec<(WidgetId, Rectangle)> = Vec::new();
    scan.push((arena.root(), clip));
    while let Some((id, clip)) = scan.pop() {
        let Ok(node) = arena.get(id) else { continue };
        if !node.visible {
            clear_dirty_subtree(arena, id);
            continue;
        }
        let dirty = node.dirty;
        let Ok(rect) = layout::resolve_rect(arena, id) else {
            continue;
        };
        let wclip = intersect(&clip, &rect);
        if is_empty(&wclip) {
            clear_dirty_subtree(arena, id);
            continue;
        }
        if dirty {
            painted += paint_subtree(arena, heap, frame, id, Dst::Frame, wclip, 0);
        } else {
            for child in arena.children(id).collect::<Vec<_>>() {
                scan.push((child, wclip));
            }
        }
    }
    painted
}

/// Paint a widget and its descendants into `dst`, compositing through an
/// offscreen buffer when the widget is not fully opaque.
fn paint_subtree(
    arena: &mut WidgetArena,
    heap: &mut RegionHeap,
    frame: &mut FrameBuffer,
    id: WidgetId,
    dst: Dst,
    clip: Rectangle,
    depth: usize,
) -> u32 {
    let Ok(node) = arena.get(id) else { return 0 };
    if !node.visible {
        clear_dirty_subtree(arena, id);
        return 0;
    }
    let alpha = node.alpha;
    let Ok(rect) = layout::resolve_rect(arena, id) else {
        return 0;
    };
    let clip = intersect(&clip, &rect);
    if is_empty(&clip) {
        clear_dirty_subtree(arena, id);
        return 0;
    }

    if alpha < 255 {
        // The buffer covers only the visible part of the widget; anything
        // outside `clip` would never be blended back.
        let bytes_needed = clip.size.width as usize * clip.size.height as usize * 2;
        if let Some(block) = heap.alloc(bytes_needed) {
            seed_block(heap, frame, &dst, block, &clip, &clip);
            let painted = paint_direct(
                arena,
                heap,
                frame,
                id,
                Dst::Block { block, rect: clip },
                clip,
                depth,
            );
            blend_block(heap, frame, &dst, block, &clip, &clip, alpha);
            heap.free(Some(block));
            return painted;
        }
        warn!(
            "offscreen buffer of {} bytes unavailable, painting subtree opaque",
            bytes_needed
        );
    }
    paint_direct(arena, heap, frame, id, dst, clip, depth)
}

/// Paint a widget and descendants straight into `dst` with no further
/// compositing at this level.
fn paint_direct(
    arena: &mut WidgetArena,
    heap: &mut RegionHeap,
    frame: &mut FrameBuffer,
    id: WidgetId,
    dst: Dst,
    clip: Rectangle,
    depth: usize,
) -> u32 {
    let Ok(rect) = layout::resolve_rect(arena, id) else {
        return 0;
    };
    draw_widget(arena, heap, frame, id, &dst, &clip, &rect);
    if let Ok(node) = arena.get_mut(id) {
        node.dirty = false;
    }
    let mut painted = 1;

    if depth + 1 > MAX_PAINT_DEPTH {
        warn!("widget nesting exceeds {} levels, skipping children", MAX_PAINT_DEPTH);
        for child in arena.children(id).collect::<Vec<_>>() {
            clear_dirty_subtree(arena, child);
        }
        return painted;
    }
    for child in arena.children(id).collect::<Vec<_>>() {
        painted += paint_subtree(arena, heap, frame, child, dst, clip, depth + 1);
    }
    painted
}

fn draw_widget(
    arena: &WidgetArena,
    heap: &mut RegionHeap,
    frame: &mut FrameBuffer,
    id: WidgetId,
    dst: &Dst,
    clip: &Rectangle,
    rect: &Rectangle,
) {
    let Ok(node) = arena.get(id) else { return };
    let ctx = DrawCtx {
        rect: *rect,
        focused: node.focused,
        active: node.active,
        enabled: node.enabled,
    };
    match dst {
        Dst::Frame => {
            let mut target = frame.clipped(clip);
            let _ = node.kind.draw(&ctx, &mut target);
        }
        Dst::Block { block, rect: brect } => {
            let Some(bytes) = heap.bytes_mut(*block) else {
                return;
            };
            let mut view = OffscreenView::new(bytes, brect.size);
            let offset = Point::zero() - brect.top_left;
            let mut translated = view.translated(offset);
            let mut target = translated.clipped(clip);
            let _ = node.kind.draw(&ctx, &mut target);
        }
    }
}

fn clear_dirty_subtree(arena: &mut WidgetArena, id: WidgetId) {
    for wid in arena.subtree_ids(id) {
        if let Ok(node) = arena.get_mut(wid) {
            node.dirty = false;
        }
    }
}

/// Pre-fill an offscreen buffer with the destination pixels under the
/// widget, so blending a partially painted buffer stays neutral where the
/// widget drew nothing.
fn seed_block(
    heap: &mut RegionHeap,
    frame: &FrameBuffer,
    dst: &Dst,
    block: BlockRef,
    rect: &Rectangle,
    clip: &Rectangle,
) {
    let stride = rect.size.width as usize;
    match dst {
        Dst::Frame => {
            let Some(bytes) = heap.bytes_mut(block) else {
                return;
            };
            for_each_px(clip, |x, y| {
                let color = frame.pixel(Point::new(x, y)).unwrap_or(Rgb565::BLACK);
                put_px(
                    bytes,
                    stride,
                    (x - rect.top_left.x) as usize,
                    (y - rect.top_left.y) as usize,
                    color,
                );
            });
        }
        Dst::Block {
            block: parent,
            rect: prect,
        } => {
            let pstride = prect.size.width as usize;
            let Some((pbytes, bytes)) = heap.bytes_pair_mut(*parent, block) else {
                return;
            };
            for_each_px(clip, |x, y| {
                let color = get_px(
                    pbytes,
                    pstride,
                    (x - prect.top_left.x) as usize,
                    (y - prect.top_left.y) as usize,
                );
                put_px(
                    bytes,
                    stride,
                    (x - rect.top_left.x) as usize,
                    (y - rect.top_left.y) as usize,
                    color,
                );
            });
        }
    }
}

/// Alpha-blend a finished offscreen buffer into the destination over the
/// clip area.
fn blend_block(
    heap: &mut RegionHeap,
    frame: &mut FrameBuffer,
    dst: &Dst,
    block: BlockRef,
    rect: &Rectangle,
    clip: &Rectangle,
    alpha: u8,
) {
    let stride = rect.size.width as usize;
    match dst {
        Dst::Frame => {
            let Some(bytes) = heap.bytes(block) else {
                return;
            };
            let mut out: Vec<Pixel<Rgb565>> = Vec::new();
            for_each_px(clip, |x, y| {
                let src = get_px(
                    bytes,
                    stride,
                    (x - rect.top_left.x) as usize,
                    (y - rect.top_left.y) as usize,
                );
                let p = Point::new(x, y);
                let under = frame.pixel(p).unwrap_or(Rgb565::BLACK);
                out.push(Pixel(p, blend(src, under, alpha)));
            });
            let _ = frame.draw_iter(out);
        }
        Dst::Block {
            block: parent,
            rect: prect,
        } => {
            let pstride = prect.size.width as usize;
            let Some((pbytes, bytes)) = heap.bytes_pair_mut(*parent, block) else {
                return;
            };
            for_each_px(clip, |x, y| {
                let src = get_px(
                    bytes,
                    stride,
                    (x - rect.top_left.x) as usize,
                    (y - rect.top_left.y) as usize,
                );
                let px = (x - prect.top_left.x) as usize;
                let py = (y - prect.top_left.y) as usize;
                let under = get_px(pbytes, pstride, px, py);
                put_px(pbytes, pstride, px, py, blend(src, under, alpha));
            });
        }
    }
}

fn for_each_px(clip: &Rectangle, mut f: impl FnMut(i32, i32)) {
    let x0 = clip.top_left.x;
    let y0 = clip.top_left.y;
    let x1 = x0 + clip.size.width as i32;
    let y1 = y0 + clip.size.height as i32;
    for y in y0..y1 {
        for x in x0..x1 {
            f(x, y);
        }
    }
}

fn get_px(bytes: &[u8], stride: usize, x: usize, y: usize) -> Rgb565 {
    let i = 2 * (y * stride + x);
    if i + 1 >= bytes.len() {
        return Rgb565::BLACK;
    }
    Rgb565::from(RawU16::new(u16::from_le_bytes([bytes[i], bytes[i + 1]])))
}

fn put_px(bytes: &mut [u8], stride: usize, x: usize, y: usize, color: Rgb565) {
    let i = 2 * (y * stride + x);
    if i + 1 >= bytes.len() {
        return;
    }
    let raw = color.into_storage().to_le_bytes();
    bytes[i] = raw[0];
    bytes[i + 1] = raw[1];
}

/// `out = floor((src * alpha + dst * (255 - alpha)) / 255)` on one 8-bit
/// channel.
pub fn blend_channel(src: u8, dst: u8, alpha: u8) -> u8 {
    let a = u16::from(alpha);
    ((u16::from(src) * a + u16::from(dst) * (255 - a)) / 255) as u8
}

/// Per-channel alpha blend on 8-bit RGB.
pub fn blend_rgb888(src: Rgb888, dst: Rgb888, alpha: u8) -> Rgb888 {
    Rgb888::new(
        blend_channel(src.r(), dst.r(), alpha),
        blend_channel(src.g(), dst.g(), alpha),
        blend_channel(src.b(), dst.b(), alpha),
    )
}

/// Alpha blend on stored `Rgb565` values; the arithmetic happens on 8-bit
/// channels and the result quantizes back to the 565 store.
pub fn blend(src: Rgb565, dst: Rgb565, alpha: u8) -> Rgb565 {
    blend_rgb888(Rgb888::from(src), Rgb888::from(dst), alpha).into()
}

/// Temporary per-widget pixel buffer viewed as a draw target. Lives only
/// for one widget's paint inside a redraw pass.
struct OffscreenView<'a> {
    bytes: &'a mut [u8],
    size: Size,
}

impl<'a> OffscreenView<'a> {
    fn new(bytes: &'a mut [u8], size: Size) -> Self {
        Self { bytes, size }
    }
}

impl OriginDimensions for OffscreenView<'_> {
    fn size(&self) -> Size {
        self.size
    }
}

impl DrawTarget for OffscreenView<'_> {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        let w = self.size.width as i32;
        let h = self.size.height as i32;
        for Pixel(coord, color) in pixels {
            if coord.x >= 0 && coord.y >= 0 && coord.x < w && coord.y < h {
                put_px(
                    self.bytes,
                    w as usize,
                    coord.x as usize,
                    coord.y as usize,
                    color,
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Dim;
    use crate::widget::WidgetNode;
    use crate::widgets::{Panel, WidgetKind};

    fn desktop(size: Size) -> (WidgetArena, RegionHeap, FrameBuffer) {
        let root = WidgetNode::new(0, WidgetKind::Panel(Panel::with_background(Rgb565::WHITE)))
            .with_geometry(
                Dim::Px(0),
                Dim::Px(0),
                Dim::Px(size.width as i32),
                Dim::Px(size.height as i32),
            );
        let mut heap = RegionHeap::new();
        heap.assign(&[16 * 1024]).unwrap();
        (WidgetArena::new(root), heap, FrameBuffer::new(size))
    }

    fn black_panel(alpha: u8) -> WidgetNode {
        WidgetNode::new(1, WidgetKind::Panel(Panel::with_background(Rgb565::BLACK)))
            .with_geometry(Dim::Px(2), Dim::Px(2), Dim::Px(4), Dim::Px(4))
            .with_alpha(alpha)
    }

    #[test]
    fn blend_follows_floor_formula() {
        // Black at alpha 128 over white is exactly (127, 127, 127).
        let out = blend_rgb888(Rgb888::BLACK, Rgb888::WHITE, 128);
        assert_eq!((out.r(), out.g(), out.b()), (127, 127, 127));
        assert_eq!(blend_channel(0, 255, 0), 255);
        assert_eq!(blend_channel(0, 255, 255), 0);
    }

    #[test]
    fn opaque_child_paints_directly() {
        let (mut arena, mut heap, mut frame) = desktop(Size::new(8, 8));
        let root = arena.root();
        arena.insert(root, black_panel(255)).unwrap();
        invalidate(&mut arena, root).unwrap();
        let painted = run_redraw_pass(&mut arena, &mut heap, &mut frame);
        assert_eq!(painted, 2);
        assert_eq!(frame.pixel(Point::new(3, 3)), Some(Rgb565::BLACK));
        assert_eq!(frame.pixel(Point::new(0, 0)), Some(Rgb565::WHITE));
    }

    #[test]
    fn translucent_child_blends_into_parent() {
        let (mut arena, mut heap, mut frame) = desktop(Size::new(8, 8));
        let root = arena.root();
        arena.insert(root, black_panel(128)).unwrap();
        invalidate(&mut arena, root).unwrap();
        run_redraw_pass(&mut arena, &mut heap, &mut frame);

        let expected: Rgb565 =
            blend(Rgb565::BLACK, Rgb565::WHITE, 128);
        assert_eq!(frame.pixel(Point::new(3, 3)), Some(expected));
        // The offscreen buffer was returned to the heap.
        assert_eq!(heap.free_bytes(), heap.total_bytes());
    }

    #[test]
    fn allocation_failure_degrades_to_opaque() {
        let root_node = WidgetNode::new(0, WidgetKind::Panel(Panel::with_background(Rgb565::WHITE)))
            .with_geometry(Dim::Px(0), Dim::Px(0), Dim::Px(8), Dim::Px(8));
        let mut arena = WidgetArena::new(root_node);
        let mut heap = RegionHeap::new();
        heap.assign(&[16]).unwrap(); // far too small for a 4x4 buffer
        let mut frame = FrameBuffer::new(Size::new(8, 8));

        let root = arena.root();
        arena.insert(root, black_panel(128)).unwrap();
        invalidate(&mut arena, root).unwrap();
        let painted = run_redraw_pass(&mut arena, &mut heap, &mut frame);
        assert_eq!(painted, 2);
        // Degraded path paints fully opaque.
        assert_eq!(frame.pixel(Point::new(3, 3)), Some(Rgb565::BLACK));
    }

    #[test]
    fn offscreen_buffer_covers_visible_area_only() {
        let root_node = WidgetNode::new(0, WidgetKind::Panel(Panel::with_background(Rgb565::WHITE)))
            .with_geometry(Dim::Px(0), Dim::Px(0), Dim::Px(8), Dim::Px(8));
        let mut arena = WidgetArena::new(root_node);
        let mut heap = RegionHeap::new();
        // Room for the on-screen 8x8 slice, nowhere near the full 100x100.
        heap.assign(&[256]).unwrap();
        let mut frame = FrameBuffer::new(Size::new(8, 8));

        let root = arena.root();
        let big = WidgetNode::new(1, WidgetKind::Panel(Panel::with_background(Rgb565::BLACK)))
            .with_geometry(Dim::Px(0), Dim::Px(0), Dim::Px(100), Dim::Px(100))
            .with_alpha(128);
        arena.insert(root, big).unwrap();
        invalidate(&mut arena, root).unwrap();
        run_redraw_pass(&mut arena, &mut heap, &mut frame);

        // Blended, not the opaque fallback black.
        let expected = blend(Rgb565::BLACK, Rgb565::WHITE, 128);
        assert_eq!(frame.pixel(Point::new(3, 3)), Some(expected));
        assert_eq!(heap.free_bytes(), heap.total_bytes());
    }

    #[test]
    fn suppression_batches_invalidations() {
        let (mut arena, mut heap, mut frame) = desktop(Size::new(8, 8));
        let root = arena.root();
        let child = arena.insert(root, black_panel(255)).unwrap();
        // Settle the initial state.
        invalidate(&mut arena, root).unwrap();
        run_redraw_pass(&mut arena, &mut heap, &mut frame);
        assert_eq!(run_redraw_pass(&mut arena, &mut heap, &mut frame), 0);

        begin_ignore_invalidate(&mut arena, child).unwrap();
        for _ in 0..5 {
            invalidate(&mut arena, child).unwrap();
            // Nothing becomes dirty while suppressed.
            assert_eq!(run_redraw_pass(&mut arena, &mut heap, &mut frame), 0);
        }
        end_ignore_invalidate(&mut arena, child, false).unwrap();
        // The five requests collapsed into a single dirty transition.
        assert!(run_redraw_pass(&mut arena, &mut heap, &mut frame) > 0);
        assert_eq!(run_redraw_pass(&mut arena, &mut heap, &mut frame), 0);
    }

    #[test]
    fn nested_suppression_applies_on_outermost_end() {
        let (mut arena, mut heap, mut frame) = desktop(Size::new(8, 8));
        let root = arena.root();
        let child = arena.insert(root, black_panel(255)).unwrap();
        invalidate(&mut arena, root).unwrap();
        run_redraw_pass(&mut arena, &mut heap, &mut frame);

        begin_ignore_invalidate(&mut arena, child).unwrap();
        begin_ignore_invalidate(&mut arena, child).unwrap();
        invalidate(&mut arena, child).unwrap();
        end_ignore_invalidate(&mut arena, child, false).unwrap();
        assert_eq!(run_redraw_pass(&mut arena, &mut heap, &mut frame), 0);
        end_ignore_invalidate(&mut arena, child, false).unwrap();
        assert!(run_redraw_pass(&mut arena, &mut heap, &mut frame) > 0);
    }

    #[test]
    fn end_without_begin_is_an_error() {
        let (mut arena, _, _) = desktop(Size::new(8, 8));
        let root = arena.root();
        assert_eq!(
            end_ignore_invalidate(&mut arena, root, false),
            Err(Error::InvalidArgument)
        );
    }

    #[test]
    fn force_redraw_on_scope_end() {
        let (mut arena, mut heap, mut frame) = desktop(Size::new(8, 8));
        let root = arena.root();
        let child = arena.insert(root, black_panel(255)).unwrap();
        invalidate(&mut arena, root).unwrap();
        run_redraw_pass(&mut arena, &mut heap, &mut frame);

        begin_ignore_invalidate(&mut arena, child).unwrap();
        // No invalidation inside the scope at all.
        end_ignore_invalidate(&mut arena, child, true).unwrap();
        assert!(run_redraw_pass(&mut arena, &mut heap, &mut frame) > 0);
    }

    #[test]
    fn hidden_widgets_are_skipped() {
        let (mut arena, mut heap, mut frame) = desktop(Size::new(8, 8));
        let root = arena.root();
        let child = arena
            .insert(root, black_panel(255).with_visible(false))
            .unwrap();
        invalidate(&mut arena, root).unwrap();
        run_redraw_pass(&mut arena, &mut heap, &mut frame);
        assert_eq!(frame.pixel(Point::new(3, 3)), Some(Rgb565::WHITE));
        // The hidden widget's dirty flag was still consumed.
        assert!(!arena.get(child).unwrap().dirty());
    }
}
