//! Hardware-independent widget toolkit core for slate
//!
//! This crate contains all platform-agnostic logic for the slate embedded
//! GUI toolkit: the widget tree and arena, percentage-based layout
//! resolution, dirty-region invalidation and alpha compositing, touch/key
//! dispatch, software timers, and the region allocator backing on-demand
//! offscreen buffers.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets and desktop hosts (for the simulator and tests).

#![no_std]

extern crate alloc;

pub mod error;
pub mod framebuffer;
pub mod geometry;
pub mod gui;
pub mod input;
pub mod layout;
pub mod mem;
pub mod render;
pub mod timer;
pub mod translate;
pub mod tree;
pub mod widget;
pub mod widgets;

pub use error::Error;
pub use gui::{Core, Gui};
pub use tree::WidgetId;
