//! Millisecond tick source and bounded waits
//!
//! The firmware provides a monotonic millisecond counter incremented by a
//! periodic interrupt. Every timeout in this crate is measured against it,
//! and every busy-wait goes through [`wait_until`] so tests can inject a fake
//! clock.

/// Monotonic millisecond tick source
pub trait Clock {
    /// Current tick in milliseconds (wraps at `u32::MAX`)
    fn now_ms(&self) -> u32;

    /// Whether `budget` milliseconds have elapsed since the `since` tick
    fn elapsed(&self, since: u32, budget: u32) -> bool {
        self.now_ms().wrapping_sub(since) >= budget
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

/// The budget of a bounded wait ran out before its condition held
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Expired;

/// Poll `condition` until it holds or `budget` ms have elapsed since `since`
///
/// The condition is checked before the clock, so a condition that already
/// holds succeeds even when the budget is spent.
///
/// # Errors
///
/// Returns [`Expired`] when the budget runs out first.
pub fn wait_until<C, F>(clock: &C, since: u32, budget: u32, mut condition: F) -> Result<(), Expired>
where
    C: Clock + ?Sized,
    F: FnMut() -> bool,
{
    loop {
        if condition() {
            return Ok(());
        }
        if clock.elapsed(since, budget) {
            return Err(Expired);
        }
    }
}

/// [`Clock`] backed by the embassy time driver
#[cfg(feature = "embassy-time")]
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

#[cfg(feature = "embassy-time")]
impl Clock for EmbassyClock {
    #[allow(clippy::cast_possible_truncation)]
    fn now_ms(&self) -> u32 {
        embassy_time::Instant::now().as_millis() as u32
    }
}
