//! Desktop simulator demo for the slate widget toolkit.
//!
//! Builds a small scene (a window with buttons, a checkbox and a
//! translucent overlay) and runs the toolkit's processing loop in an
//! SDL2 window via `embedded-graphics-simulator`. Mouse input is
//! forwarded as touch samples, Tab moves focus.
//!
//! # Key bindings
//!
//! | Key | Action          |
//! |-----|-----------------|
//! | Tab | Focus next      |
//! | Q   | Quit            |

use std::time::{Duration, Instant};

use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::{
    OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window as SimWindow, sdl2::Keycode,
};
use log::info;

use slate_core::Gui;
use slate_core::geometry::Dim;
use slate_core::input::{KEY_TAB, KeyCode, TouchPoint, TouchStatus};
use slate_core::widget::WidgetNode;
use slate_core::widgets::{Button, Checkbox, Label, Panel, WidgetKind, Window};

const DISPLAY_WIDTH: u32 = 320;
const DISPLAY_HEIGHT: u32 = 240;

/// Pixel scale factor for the simulator window.
const WINDOW_SCALE: u32 = 2;

/// Target frame duration (~30 FPS).
const FRAME_DURATION: Duration = Duration::from_millis(33);

/// Offscreen compositing budget handed to the region allocator.
const COMPOSITE_REGION_BYTES: usize = 192 * 1024;

fn clamp_point(point: Point) -> TouchPoint {
    TouchPoint::new(point.x.max(0) as u16, point.y.max(0) as u16)
}

/// Build the demo scene and return it together with the ids the loop
/// needs.
fn build_scene(gui: &Gui) {
    gui.with(|core| {
        core.assign_memory(&[COMPOSITE_REGION_BYTES])
            .expect("memory regions are assigned exactly once");

        let root = core.root();
        let window = core
            .create_widget(
                root,
                WidgetNode::new(1, WidgetKind::Window(Window::new("slate demo"))).with_geometry(
                    Dim::Px(10),
                    Dim::Px(10),
                    Dim::Px(300),
                    Dim::Px(220),
                ),
            )
            .expect("desktop accepts children");

        core.create_widget(
            window,
            WidgetNode::new(2, WidgetKind::Label(Label::new("Tap a button"))).with_geometry(
                Dim::Px(12),
                Dim::Px(30),
                Dim::Percent(80),
                Dim::Px(16),
            ),
        )
        .expect("window accepts children");

        core.create_widget(
            window,
            WidgetNode::new(3, WidgetKind::Button(Button::new("OK"))).with_geometry(
                Dim::Px(12),
                Dim::Px(60),
                Dim::Percent(40),
                Dim::Px(32),
            ),
        )
        .expect("window accepts children");

        core.create_widget(
            window,
            WidgetNode::new(4, WidgetKind::Button(Button::new("Cancel"))).with_geometry(
                Dim::Percent(55),
                Dim::Px(60),
                Dim::Percent(40),
                Dim::Px(32),
            ),
        )
        .expect("window accepts children");

        core.create_widget(
            window,
            WidgetNode::new(5, WidgetKind::Checkbox(Checkbox::new("Enable overlay")))
                .with_geometry(Dim::Px(12), Dim::Px(110), Dim::Percent(80), Dim::Px(20)),
        )
        .expect("window accepts children");

        // Translucent panel compositing over the lower part of the window.
        core.create_widget(
            window,
            WidgetNode::new(6, WidgetKind::Panel(Panel::with_background(Rgb565::CSS_DARK_SLATE_BLUE)))
                .with_geometry(Dim::Px(12), Dim::Px(150), Dim::Percent(86), Dim::Px(50))
                .with_alpha(128),
        )
        .expect("window accepts children");
    });
}

fn main() {
    env_logger::init();
    info!("Starting slate simulator");
    info!(
        "Display: {}x{} (scale {}x)",
        DISPLAY_WIDTH, DISPLAY_HEIGHT, WINDOW_SCALE
    );

    let mut display =
        SimulatorDisplay::<Rgb565>::new(Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT));
    let output_settings = OutputSettingsBuilder::new().scale(WINDOW_SCALE).build();
    let mut window = SimWindow::new("Slate Simulator", &output_settings);

    let gui = Gui::new(Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT));
    build_scene(&gui);

    let started = Instant::now();

    // The SDL window is lazily initialized on the first `update()` call.
    // We must call `update()` once before `events()` or it will panic.
    gui.process(0);
    let _ = gui.flush(&mut display);
    window.update(&display);

    let mut mouse_down = false;

    'running: loop {
        let frame_start = Instant::now();

        for event in window.events() {
            match event {
                SimulatorEvent::Quit => break 'running,

                SimulatorEvent::KeyDown { keycode, .. } => match keycode {
                    Keycode::Q | Keycode::Escape => break 'running,
                    Keycode::Tab => {
                        gui.submit_key(KEY_TAB);
                    }
                    Keycode::Space => {
                        gui.submit_key(KeyCode(b' ' as u16));
                    }
                    _ => {}
                },

                SimulatorEvent::MouseButtonDown { point, .. } => {
                    mouse_down = true;
                    gui.submit_touch(clamp_point(point), TouchStatus::Pressed);
                }

                SimulatorEvent::MouseMove { point } => {
                    if mouse_down {
                        gui.submit_touch(clamp_point(point), TouchStatus::Pressed);
                    }
                }

                SimulatorEvent::MouseButtonUp { point, .. } => {
                    mouse_down = false;
                    gui.submit_touch(clamp_point(point), TouchStatus::Released);
                }

                _ => {}
            }
        }

        let now_ms = started.elapsed().as_millis() as u64;
        let painted = gui.process(now_ms);
        if painted > 0 {
            log::debug!("redraw pass painted {} widgets", painted);
        }
        let _ = gui.flush(&mut display);
        window.update(&display);

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }

    info!("Simulator exiting");
}
