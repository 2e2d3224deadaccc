//! Software timers driven from the main processing loop.
//!
//! Timers never fire from interrupt context. The manager is handed a
//! millisecond timestamp each processing pass, decrements every running
//! timer by the elapsed difference and fires the ones that reach zero,
//! delivering [`WidgetEvent::Tick`] to widget targets or calling a plain
//! function pointer. Removal requested while the scan is running is
//! deferred until the scan finishes.

use alloc::vec::Vec;

use crate::error::Error;
use crate::tree::{WidgetArena, WidgetId};
use crate::widget::{self, WidgetEvent};

/// Generational handle to a timer slot. Stale handles are rejected after
/// the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerId {
    index: u16,
    generation: u16,
}

/// What a timer drives when it fires.
#[derive(Debug, Clone, Copy)]
pub enum TimerTarget {
    /// Deliver a `Tick` event to this widget. The widget may ask for the
    /// timer's removal through its event context.
    Widget(WidgetId),
    /// Call a plain function with an opaque parameter.
    Callback { f: fn(usize), param: usize },
}

#[derive(Debug)]
struct TimerSlot {
    generation: u16,
    period_ms: u32,
    remaining_ms: u32,
    periodic: bool,
    running: bool,
    pending_remove: bool,
    target: TimerTarget,
}

/// Slot arena of software timers. One instance lives inside the core
/// context; all methods run under its critical section.
#[derive(Debug, Default)]
pub struct TimerManager {
    slots: Vec<Option<TimerSlot>>,
    generations: Vec<u16>,
    free: Vec<u16>,
    /// Timestamp of the previous `process` call.
    last_ms: Option<u64>,
}

impl TimerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stopped timer with the given period.
    pub fn create(&mut self, period_ms: u32, target: TimerTarget) -> Result<TimerId, Error> {
        if period_ms == 0 {
            return Err(Error::InvalidArgument);
        }
        let index = match self.free.pop() {
            Some(i) => i,
            None => {
                if self.slots.len() >= u16::MAX as usize {
                    return Err(Error::OutOfMemory);
                }
                self.slots.push(None);
                self.generations.push(0);
                (self.slots.len() - 1) as u16
            }
        };
        let generation = self.generations[index as usize];
        self.slots[index as usize] = Some(TimerSlot {
            generation,
            period_ms,
            remaining_ms: period_ms,
            periodic: false,
            running: false,
            pending_remove: false,
            target,
        });
        Ok(TimerId { index, generation })
    }

    fn slot_mut(&mut self, id: TimerId) -> Result<&mut TimerSlot, Error> {
        self.slots
            .get_mut(id.index as usize)
            .and_then(|s| s.as_mut())
            .filter(|s| s.generation == id.generation && !s.pending_remove)
            .ok_or(Error::InvalidHandle)
    }

    /// Arm for a single expiry.
    pub fn start(&mut self, id: TimerId) -> Result<(), Error> {
        let slot = self.slot_mut(id)?;
        slot.remaining_ms = slot.period_ms;
        slot.periodic = false;
        slot.running = true;
        Ok(())
    }

    /// Arm with automatic reload after each expiry.
    pub fn start_periodic(&mut self, id: TimerId) -> Result<(), Error> {
        self.start(id)?;
        if let Ok(slot) = self.slot_mut(id) {
            slot.periodic = true;
        }
        Ok(())
    }

    /// Stop counting without destroying the timer.
    pub fn stop(&mut self, id: TimerId) -> Result<(), Error> {
        self.slot_mut(id)?.running = false;
        Ok(())
    }

    /// Change the period. Takes effect from the next (re)start or reload.
    pub fn set_period(&mut self, id: TimerId, period_ms: u32) -> Result<(), Error> {
        if period_ms == 0 {
            return Err(Error::InvalidArgument);
        }
        self.slot_mut(id)?.period_ms = period_ms;
        Ok(())
    }

    /// Destroy the timer. Marked and swept after the current scan, so the
    /// handler of a firing timer may remove it.
    pub fn remove(&mut self, id: TimerId) -> Result<(), Error> {
        self.slot_mut(id)?.pending_remove = true;
        Ok(())
    }

    /// Destroy every timer targeting `id`. Called when a widget leaves
    /// the tree.
    pub fn remove_widget_timers(&mut self, id: WidgetId) {
        for slot in self.slots.iter_mut().flatten() {
            if let TimerTarget::Widget(w) = slot.target
                && w == id
            {
                slot.pending_remove = true;
            }
        }
    }

    /// Number of live timers.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|s| !s.pending_remove)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Advance all running timers to `now_ms` and fire the expired ones.
    /// Returns the number of timers fired.
    pub fn process(&mut self, now_ms: u64, arena: &mut WidgetArena) -> u32 {
        let elapsed = match self.last_ms.replace(now_ms) {
            Some(last) => now_ms.saturating_sub(last),
            None => 0,
        };
        let elapsed = u32::try_from(elapsed).unwrap_or(u32::MAX);

        let mut fired = 0;
        for index in 0..self.slots.len() {
            let Some(slot) = self.slots[index].as_mut() else {
                continue;
            };
            if !slot.running || slot.pending_remove || elapsed == 0 {
                continue;
            }
            if slot.remaining_ms > elapsed {
                slot.remaining_ms -= elapsed;
                continue;
            }
            // Expired. Reload or stop before dispatch so the handler sees
            // a consistent state.
            if slot.periodic {
                slot.remaining_ms = slot.period_ms;
            } else {
                slot.running = false;
                slot.remaining_ms = 0;
            }
            let target = slot.target;
            fired += 1;
            match target {
                TimerTarget::Widget(wid) => {
                    let (_, ctx) = widget::dispatch(arena, wid, &WidgetEvent::Tick);
                    if ctx.remove_timer
                        && let Some(slot) = self.slots[index].as_mut()
                    {
                        slot.pending_remove = true;
                    }
                }
                TimerTarget::Callback { f, param } => f(param),
            }
        }
        self.sweep();
        fired
    }

    fn sweep(&mut self) {
        for index in 0..self.slots.len() {
            let remove = self.slots[index]
                .as_ref()
                .is_some_and(|s| s.pending_remove);
            if remove {
                self.slots[index] = None;
                self.generations[index] = self.generations[index].wrapping_add(1);
                self.free.push(index as u16);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::WidgetNode;
    use crate::widgets::{Panel, WidgetKind};
    use core::sync::atomic::{AtomicUsize, Ordering};
    use embedded_graphics::pixelcolor::Rgb565;
    use embedded_graphics::prelude::*;

    static FIRES: AtomicUsize = AtomicUsize::new(0);

    fn count_fire(param: usize) {
        FIRES.fetch_add(param, Ordering::SeqCst);
    }

    fn arena() -> WidgetArena {
        WidgetArena::new(WidgetNode::new(
            0,
            WidgetKind::Panel(Panel::with_background(Rgb565::BLACK)),
        ))
    }

    fn callback() -> TimerTarget {
        TimerTarget::Callback {
            f: count_fire,
            param: 1,
        }
    }

    #[test]
    fn one_shot_fires_once() {
        let mut arena = arena();
        let mut timers = TimerManager::new();
        let id = timers.create(50, callback()).unwrap();
        timers.start(id).unwrap();

        assert_eq!(timers.process(0, &mut arena), 0);
        assert_eq!(timers.process(30, &mut arena), 0);
        assert_eq!(timers.process(60, &mut arena), 1);
        // Stays quiet afterwards but remains creatable/startable.
        assert_eq!(timers.process(500, &mut arena), 0);
        timers.start(id).unwrap();
        assert_eq!(timers.process(560, &mut arena), 1);
    }

    #[test]
    fn periodic_reloads_after_expiry() {
        let mut arena = arena();
        let mut timers = TimerManager::new();
        let id = timers.create(20, callback()).unwrap();
        timers.start_periodic(id).unwrap();

        timers.process(0, &mut arena);
        let mut fired = 0;
        for now in [20u64, 40, 45, 60] {
            fired += timers.process(now, &mut arena);
        }
        assert_eq!(fired, 3);
    }

    #[test]
    fn stop_halts_countdown() {
        let mut arena = arena();
        let mut timers = TimerManager::new();
        let id = timers.create(20, callback()).unwrap();
        timers.start(id).unwrap();
        timers.process(0, &mut arena);
        timers.stop(id).unwrap();
        assert_eq!(timers.process(100, &mut arena), 0);
    }

    #[test]
    fn removed_timer_rejects_stale_handle() {
        let mut arena = arena();
        let mut timers = TimerManager::new();
        let id = timers.create(20, callback()).unwrap();
        timers.remove(id).unwrap();
        assert_eq!(timers.start(id), Err(Error::InvalidHandle));
        timers.process(0, &mut arena);
        assert!(timers.is_empty());

        // The slot is reused under a new generation; the old handle stays
        // invalid.
        let fresh = timers.create(20, callback()).unwrap();
        assert_ne!(fresh, id);
        assert_eq!(timers.stop(id), Err(Error::InvalidHandle));
        timers.stop(fresh).unwrap();
    }

    #[test]
    fn widget_destruction_removes_its_timers() {
        let mut arena = arena();
        let root = arena.root();
        let child = arena
            .insert(
                root,
                WidgetNode::new(1, WidgetKind::Panel(Panel::with_background(Rgb565::BLACK))),
            )
            .unwrap();
        let mut timers = TimerManager::new();
        let id = timers.create(10, TimerTarget::Widget(child)).unwrap();
        timers.start_periodic(id).unwrap();

        timers.remove_widget_timers(child);
        timers.process(0, &mut arena);
        assert!(timers.is_empty());
    }

    #[test]
    fn zero_period_is_rejected() {
        let mut timers = TimerManager::new();
        assert_eq!(
            timers.create(0, callback()).map(|_| ()),
            Err(Error::InvalidArgument)
        );
    }
}
