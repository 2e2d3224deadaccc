//! Absolute geometry resolution for percent-or-fixed widget dimensions.
//!
//! Resolution is lazy: nothing is cached, callers resolve on demand
//! (invalidation, hit-testing, painting), so a resize can never leave
//! stale geometry behind.

use alloc::vec::Vec;

use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use crate::error::Error;
use crate::tree::{WidgetArena, WidgetId};

/// Compute the absolute pixel rectangle of a widget.
///
/// Percent dimensions resolve as `floor(percent * parent_dim / 100)`
/// against the parent's own resolved dimension, terminating at the root
/// whose dimensions are fixed pixels. Positions accumulate every
/// ancestor's absolute origin. A zero-sized result is valid; it simply
/// paints and hit-tests as empty.
pub fn resolve_rect(arena: &WidgetArena, id: WidgetId) -> Result<Rectangle, Error> {
    // Walk up to the root, then fold back down. Iterative on purpose:
    // tree depth must not become call stack depth.
    let mut chain = Vec::new();
    let mut cur = Some(id);
    while let Some(wid) = cur {
        let node = arena.get(wid)?;
        chain.push(wid);
        cur = node.link.parent;
    }

    let mut origin = Point::zero();
    let mut parent_w = 0;
    let mut parent_h = 0;
    let mut w = 0;
    let mut h = 0;
    for &wid in chain.iter().rev() {
        let node = arena.get(wid)?;
        let x = node.x.resolve(parent_w);
        let y = node.y.resolve(parent_h);
        w = node.width.resolve(parent_w).max(0);
        h = node.height.resolve(parent_h).max(0);
        origin += Point::new(x, y);
        parent_w = w;
        parent_h = h;
    }
    Ok(Rectangle::new(origin, Size::new(w as u32, h as u32)))
}
