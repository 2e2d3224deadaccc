//! Checkbox with a label to the right of the box.

use embedded_graphics::mono_font::{MonoTextStyle, ascii::FONT_6X10};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, PrimitiveStyleBuilder, Rectangle};
use embedded_graphics::text::{Baseline, Text};

use super::{BORDER, PRIMARY, TEXT, TEXT_DIM};
use crate::widget::{
    Behavior, DrawCtx, EventCtx, EventResult, WidgetEvent, base_handle_event,
};

const BOX_SIZE: u32 = 12;
const LABEL_GAP: i32 = 6;

/// Two-state checkbox; a click toggles it.
#[derive(Debug)]
pub struct Checkbox {
    label: heapless::String<32>,
    checked: bool,
}

impl Checkbox {
    pub fn new(label: &str) -> Self {
        let mut s = heapless::String::new();
        s.push_str(label).ok();
        Self {
            label: s,
            checked: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: &str) -> bool {
        self.label.clear();
        self.label.push_str(label).ok();
        true
    }

    pub fn checked(&self) -> bool {
        self.checked
    }

    pub fn set_checked(&mut self, checked: bool) {
        self.checked = checked;
    }
}

impl Behavior for Checkbox {
    fn draw<D: DrawTarget<Color = Rgb565>>(
        &self,
        ctx: &DrawCtx,
        target: &mut D,
    ) -> Result<(), D::Error> {
        let text_color = if ctx.enabled { TEXT } else { TEXT_DIM };
        let box_y = ctx.rect.top_left.y
            + (ctx.rect.size.height as i32 - BOX_SIZE as i32) / 2;
        let box_rect = Rectangle::new(
            Point::new(ctx.rect.top_left.x, box_y),
            Size::new(BOX_SIZE, BOX_SIZE),
        );

        let outline = PrimitiveStyleBuilder::new()
            .stroke_color(if ctx.focused { TEXT } else { BORDER })
            .stroke_width(1)
            .build();
        box_rect.into_styled(outline).draw(target)?;

        if self.checked {
            let inner = Rectangle::new(
                box_rect.top_left + Point::new(3, 3),
                Size::new(BOX_SIZE - 6, BOX_SIZE - 6),
            );
            inner
                .into_styled(PrimitiveStyle::with_fill(PRIMARY))
                .draw(target)?;
        }

        let text_style = MonoTextStyle::new(&FONT_6X10, text_color);
        let origin = Point::new(
            box_rect.top_left.x + BOX_SIZE as i32 + LABEL_GAP,
            ctx.rect.center().y,
        );
        Text::with_baseline(&self.label, origin, text_style, Baseline::Middle)
            .draw(target)?;
        Ok(())
    }

    fn handle_event(&mut self, ctx: &mut EventCtx, event: &WidgetEvent) -> EventResult {
        match event {
            WidgetEvent::Click(_) => {
                self.checked = !self.checked;
                ctx.invalidate = true;
                EventResult::Handled
            }
            _ => base_handle_event(ctx, event),
        }
    }
}
