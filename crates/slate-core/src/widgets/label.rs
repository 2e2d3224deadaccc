//! Static text.

use embedded_graphics::mono_font::{MonoTextStyle, ascii::FONT_6X10};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};

use super::{TEXT, TEXT_DIM};
use crate::widget::{Behavior, DrawCtx};

/// Static text, left-aligned and vertically centered in its rectangle.
#[derive(Debug)]
pub struct Label {
    text: heapless::String<64>,
}

impl Label {
    pub fn new(text: &str) -> Self {
        let mut s = heapless::String::new();
        s.push_str(text).ok();
        Self { text: s }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: &str) -> bool {
        self.text.clear();
        self.text.push_str(text).ok();
        true
    }
}

impl Behavior for Label {
    fn draw<D: DrawTarget<Color = Rgb565>>(
        &self,
        ctx: &DrawCtx,
        target: &mut D,
    ) -> Result<(), D::Error> {
        let color = if ctx.enabled { TEXT } else { TEXT_DIM };
        let style = MonoTextStyle::new(&FONT_6X10, color);
        let origin = Point::new(ctx.rect.top_left.x, ctx.rect.center().y);
        Text::with_baseline(&self.text, origin, style, Baseline::Middle).draw(target)?;
        Ok(())
    }
}
