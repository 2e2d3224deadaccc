//! Built-in widget variants.
//!
//! Widget behavior is a closed set of tagged variants dispatched through
//! the [`Behavior`] capability trait. A variant that does not care about
//! a control code falls through to the shared base implementation, so
//! every widget gets focus/active repaint handling for free.

pub mod button;
pub mod checkbox;
pub mod label;
pub mod panel;
pub mod window;

pub use button::Button;
pub use checkbox::Checkbox;
pub use label::Label;
pub use panel::Panel;
pub use window::Window;

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;

use crate::widget::{Behavior, DrawCtx, EventCtx, EventResult, WidgetEvent};

// Shared theme colors.
pub(crate) const PRIMARY: Rgb565 = Rgb565::new(30 >> 3, 144 >> 2, 255 >> 3);
pub(crate) const SURFACE: Rgb565 = Rgb565::new(0x08 >> 3, 0x10 >> 2, 0x18 >> 3);
pub(crate) const TEXT: Rgb565 = Rgb565::new(31, 63, 31);
pub(crate) const TEXT_DIM: Rgb565 = Rgb565::new(21, 42, 21);
pub(crate) const BORDER: Rgb565 = Rgb565::new(16, 32, 16);

/// Darken a color for pressed visuals.
pub(crate) fn darken(color: Rgb565) -> Rgb565 {
    Rgb565::new(
        color.r().saturating_sub(4),
        color.g().saturating_sub(8),
        color.b().saturating_sub(4),
    )
}

/// All widget variants known to the toolkit.
#[derive(Debug)]
pub enum WidgetKind {
    Window(Window),
    Panel(Panel),
    Button(Button),
    Checkbox(Checkbox),
    Label(Label),
}

impl WidgetKind {
    /// Whether this variant may hold child widgets.
    pub fn allows_children(&self) -> bool {
        matches!(self, Self::Window(_) | Self::Panel(_))
    }

    /// Label or title text, for variants that carry one.
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Window(w) => Some(w.title()),
            Self::Button(b) => Some(b.label()),
            Self::Checkbox(c) => Some(c.label()),
            Self::Label(l) => Some(l.text()),
            Self::Panel(_) => None,
        }
    }

    pub(crate) fn set_label(&mut self, text: &str) -> bool {
        match self {
            Self::Window(w) => w.set_title(text),
            Self::Button(b) => b.set_label(text),
            Self::Checkbox(c) => c.set_label(text),
            Self::Label(l) => l.set_text(text),
            Self::Panel(_) => false,
        }
    }

    pub(crate) fn draw<D: DrawTarget<Color = Rgb565>>(
        &self,
        ctx: &DrawCtx,
        target: &mut D,
    ) -> Result<(), D::Error> {
        match self {
            Self::Window(w) => w.draw(ctx, target),
            Self::Panel(p) => p.draw(ctx, target),
            Self::Button(b) => b.draw(ctx, target),
            Self::Checkbox(c) => c.draw(ctx, target),
            Self::Label(l) => l.draw(ctx, target),
        }
    }

    pub(crate) fn handle_event(
        &mut self,
        ctx: &mut EventCtx,
        event: &WidgetEvent,
    ) -> EventResult {
        match self {
            Self::Window(w) => w.handle_event(ctx, event),
            Self::Panel(p) => p.handle_event(ctx, event),
            Self::Button(b) => b.handle_event(ctx, event),
            Self::Checkbox(c) => c.handle_event(ctx, event),
            Self::Label(l) => l.handle_event(ctx, event),
        }
    }
}
