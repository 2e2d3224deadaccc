//! Plain container filled with a solid background.

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::PrimitiveStyle;

use super::SURFACE;
use crate::widget::{Behavior, DrawCtx};

/// Borderless container. The desktop root is usually one of these.
#[derive(Debug)]
pub struct Panel {
    background: Rgb565,
}

impl Panel {
    pub fn new() -> Self {
        Self::with_background(SURFACE)
    }

    pub fn with_background(background: Rgb565) -> Self {
        Self { background }
    }

    pub fn background(&self) -> Rgb565 {
        self.background
    }

    pub fn set_background(&mut self, background: Rgb565) {
        self.background = background;
    }
}

impl Default for Panel {
    fn default() -> Self {
        Self::new()
    }
}

impl Behavior for Panel {
    fn draw<D: DrawTarget<Color = Rgb565>>(
        &self,
        ctx: &DrawCtx,
        target: &mut D,
    ) -> Result<(), D::Error> {
        ctx.rect
            .into_styled(PrimitiveStyle::with_fill(self.background))
            .draw(target)
    }
}
