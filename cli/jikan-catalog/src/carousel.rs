//! Wrapping carousel position, optionally advanced by a timer.

use std::time::Duration;

use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::trace;

pub const DEFAULT_AUTO_ADVANCE_INTERVAL: Duration = Duration::from_millis(5000);

/// Position within `item_count` items, wrapping in both directions.
///
/// With no items there is no current position and every transition is a
/// no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Carousel {
    index: usize,
    item_count: usize,
}

impl Carousel {
    pub fn new(item_count: usize) -> Self {
        Self {
            index: 0,
            item_count,
        }
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn is_empty(&self) -> bool {
        self.item_count == 0
    }

    pub fn current(&self) -> Option<usize> {
        (!self.is_empty()).then_some(self.index)
    }

    pub fn next(&mut self) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.item_count;
        Some(self.index)
    }

    pub fn prev(&mut self) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        self.index = (self.index + self.item_count - 1) % self.item_count;
        Some(self.index)
    }

    /// Jump to `index`; out of range positions are ignored.
    pub fn go_to(&mut self, index: usize) -> Option<usize> {
        if index >= self.item_count {
            return None;
        }
        self.index = index;
        Some(self.index)
    }
}

/// A [Carousel] advanced by a periodic timer.
///
/// The timer is only armed while there are items. User driven transitions
/// restart the period instead of pausing it.
#[derive(Debug)]
pub struct AutoAdvance {
    carousel: Carousel,
    period: Duration,
    timer: Option<Interval>,
}

impl AutoAdvance {
    pub fn new(item_count: usize, period: Duration) -> Self {
        let mut auto_advance = Self {
            carousel: Carousel::new(item_count),
            period,
            timer: None,
        };
        auto_advance.rearm();
        auto_advance
    }

    pub fn carousel(&self) -> &Carousel {
        &self.carousel
    }

    pub fn current(&self) -> Option<usize> {
        self.carousel.current()
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    /// Replace the items, e.g. once a feed has loaded. Starts over at the
    /// first item.
    pub fn set_item_count(&mut self, item_count: usize) {
        self.carousel = Carousel::new(item_count);
        self.rearm();
    }

    /// Wait for the timer and advance.
    ///
    /// Never completes while the timer is not armed.
    pub async fn tick(&mut self) -> usize {
        let Some(timer) = self.timer.as_mut() else {
            return std::future::pending().await;
        };
        timer.tick().await;
        let index = self.carousel.next().unwrap_or_default();
        trace!(index, "carousel advanced");
        index
    }

    pub fn next(&mut self) -> Option<usize> {
        let index = self.carousel.next();
        self.restart_period();
        index
    }

    pub fn prev(&mut self) -> Option<usize> {
        let index = self.carousel.prev();
        self.restart_period();
        index
    }

    pub fn go_to(&mut self, index: usize) -> Option<usize> {
        let index = self.carousel.go_to(index);
        self.restart_period();
        index
    }

    fn rearm(&mut self) {
        self.timer = (!self.carousel.is_empty()).then(|| {
            let mut timer = interval_at(Instant::now() + self.period, self.period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            timer
        });
    }

    fn restart_period(&mut self) {
        if let Some(timer) = self.timer.as_mut() {
            timer.reset();
        }
    }
}
