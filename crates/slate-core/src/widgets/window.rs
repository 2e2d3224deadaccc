//! Top-level window: title bar over a client surface.

use embedded_graphics::mono_font::{MonoTextStyle, ascii::FONT_6X10};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, PrimitiveStyleBuilder, Rectangle};
use embedded_graphics::text::{Alignment, Text};

use super::{BORDER, PRIMARY, SURFACE, TEXT, darken};
use crate::widget::{Behavior, DrawCtx};

const TITLE_BAR_HEIGHT: u32 = 20;

/// Container with a title bar. The bar uses the primary color while the
/// window holds focus and a darkened variant otherwise.
#[derive(Debug)]
pub struct Window {
    title: heapless::String<32>,
}

impl Window {
    pub fn new(title: &str) -> Self {
        let mut s = heapless::String::new();
        s.push_str(title).ok();
        Self { title: s }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) -> bool {
        self.title.clear();
        self.title.push_str(title).ok();
        true
    }
}

impl Behavior for Window {
    fn draw<D: DrawTarget<Color = Rgb565>>(
        &self,
        ctx: &DrawCtx,
        target: &mut D,
    ) -> Result<(), D::Error> {
        let frame = PrimitiveStyleBuilder::new()
            .fill_color(SURFACE)
            .stroke_color(BORDER)
            .stroke_width(1)
            .build();
        ctx.rect.into_styled(frame).draw(target)?;

        let bar_height = TITLE_BAR_HEIGHT.min(ctx.rect.size.height);
        let bar = Rectangle::new(
            ctx.rect.top_left,
            Size::new(ctx.rect.size.width, bar_height),
        );
        let bar_color = if ctx.focused { PRIMARY } else { darken(PRIMARY) };
        bar.into_styled(PrimitiveStyle::with_fill(bar_color))
            .draw(target)?;

        let text_style = MonoTextStyle::new(&FONT_6X10, TEXT);
        Text::with_alignment(&self.title, bar.center(), text_style, Alignment::Center)
            .draw(target)?;
        Ok(())
    }
}
