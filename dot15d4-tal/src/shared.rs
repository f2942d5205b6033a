//! Sharing the TAL between the main loop and interrupt handlers.

use core::cell::RefCell;

use critical_section::Mutex;
use rand_core::RngCore;

use crate::buffer::BufferPool;
use crate::tal::Tal;
use crate::timer::Timer;
use crate::trx::Transceiver;
use crate::upper::UpperLayer;

/// A [`Tal`] that can live in a `static` and be reached from the main loop,
/// the transceiver interrupt and the timer interrupt. Every access runs in a
/// critical section.
///
/// ```ignore
/// static TAL: SharedTal<Radio, Rtc, Pool, Rng, Mac> = SharedTal::new();
///
/// #[interrupt]
/// fn RADIO() {
///     TAL.with(|tal| tal.on_interrupt());
/// }
/// ```
pub struct SharedTal<T, TM, B, R, U>
where
    T: Transceiver,
    TM: Timer,
    B: BufferPool,
    R: RngCore,
    U: UpperLayer,
{
    inner: Mutex<RefCell<Option<Tal<T, TM, B, R, U>>>>,
}

impl<T, TM, B, R, U> SharedTal<T, TM, B, R, U>
where
    T: Transceiver,
    TM: Timer,
    B: BufferPool,
    R: RngCore,
    U: UpperLayer,
{
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Install the TAL, returning the one installed before.
    pub fn install(&self, tal: Tal<T, TM, B, R, U>) -> Option<Tal<T, TM, B, R, U>> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).replace(tal))
    }

    pub fn take(&self) -> Option<Tal<T, TM, B, R, U>> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).take())
    }

    /// Run `f` on the TAL in a critical section. Returns `None` when no TAL
    /// is installed.
    pub fn with<F, O>(&self, f: F) -> Option<O>
    where
        F: FnOnce(&mut Tal<T, TM, B, R, U>) -> O,
    {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).as_mut().map(f))
    }
}

impl<T, TM, B, R, U> Default for SharedTal<T, TM, B, R, U>
where
    T: Transceiver,
    TM: Timer,
    B: BufferPool,
    R: RngCore,
    U: UpperLayer,
{
    fn default() -> Self {
        Self::new()
    }
}
