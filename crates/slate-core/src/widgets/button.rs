//! Push button with a centered label.

use embedded_graphics::mono_font::{MonoTextStyle, ascii::FONT_6X10};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyleBuilder, RoundedRectangle};
use embedded_graphics::text::{Alignment, Text};

use super::{BORDER, PRIMARY, SURFACE, TEXT, TEXT_DIM, darken};
use crate::widget::{
    Behavior, DrawCtx, EventCtx, EventResult, WidgetEvent, base_handle_event,
};

const BORDER_RADIUS: u32 = 4;

/// Interactive button. Renders darkened while held, counts completed
/// clicks (press and release both inside the widget).
#[derive(Debug)]
pub struct Button {
    label: heapless::String<32>,
    clicks: u32,
}

impl Button {
    pub fn new(label: &str) -> Self {
        let mut s = heapless::String::new();
        s.push_str(label).ok();
        Self { label: s, clicks: 0 }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: &str) -> bool {
        self.label.clear();
        self.label.push_str(label).ok();
        true
    }

    /// Number of completed clicks since creation.
    pub fn click_count(&self) -> u32 {
        self.clicks
    }
}

impl Behavior for Button {
    fn draw<D: DrawTarget<Color = Rgb565>>(
        &self,
        ctx: &DrawCtx,
        target: &mut D,
    ) -> Result<(), D::Error> {
        let (background, text_color) = if !ctx.enabled {
            (SURFACE, TEXT_DIM)
        } else if ctx.active {
            (darken(PRIMARY), TEXT)
        } else {
            (PRIMARY, TEXT)
        };

        let mut style = PrimitiveStyleBuilder::new().fill_color(background);
        if ctx.focused {
            style = style.stroke_color(TEXT).stroke_width(1);
        } else {
            style = style.stroke_color(BORDER).stroke_width(1);
        }

        let corner = Size::new(BORDER_RADIUS, BORDER_RADIUS);
        RoundedRectangle::with_equal_corners(ctx.rect, corner)
            .into_styled(style.build())
            .draw(target)?;

        let text_style = MonoTextStyle::new(&FONT_6X10, text_color);
        Text::with_alignment(&self.label, ctx.rect.center(), text_style, Alignment::Center)
            .draw(target)?;
        Ok(())
    }

    fn handle_event(&mut self, ctx: &mut EventCtx, event: &WidgetEvent) -> EventResult {
        match event {
            WidgetEvent::TouchDown(_) | WidgetEvent::TouchUp(_) => {
                ctx.invalidate = true;
                EventResult::Handled
            }
            WidgetEvent::Click(_) => {
                self.clicks = self.clicks.wrapping_add(1);
                ctx.invalidate = true;
                EventResult::Handled
            }
            _ => base_handle_event(ctx, event),
        }
    }
}
