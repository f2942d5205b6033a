//! The transceiver abstraction layer.
//!
//! [`Tal`] drives one transceiver through its operating states. Work is split
//! between three entry points called by the platform:
//!
//! - [`Tal::on_interrupt`] when the transceiver interrupt line fires. It only
//!   reads interrupt causes, uploads received frames and advances state.
//! - [`Tal::on_timer`] when a timer started by the TAL expires.
//! - [`Tal::task`] from the main loop. It completes the work the two others
//!   left pending and makes every upper layer callback.
//!
//! The three entry points take `&mut self`; on a target where interrupts
//! preempt the main loop, share the TAL through [`SharedTal`](crate::SharedTal).

mod attribute;
mod calibration;
mod csma;
mod ed;
mod init;
mod pwr;
mod rx;
mod slotted;
mod state;
mod tx;


pub use csma::SwCsmaState;
pub use rx::RX_BUFFER_SIZE;
pub use slotted::CsmaState;

use rand_core::RngCore;

use crate::buffer::{BufferHandle, BufferPool};
use crate::config::{TalConfig, INCOMING_QUEUE_CAPACITY};
use crate::error::{Error, Fault};
use crate::pib::Pib;
use crate::qmm::Queue;
use crate::time::Instant;
use crate::timer::{Timer, TimerId};
use crate::trx::{IrqFlags, TracStatus, Transceiver, TrxCommand, TrxStatus};
use crate::upper::{TxFrame, UpperLayer};

/// State of the TAL itself, as opposed to the state of the transceiver.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TalState {
    Idle,
    /// A frame is being sent, or software CSMA-CA is running for it.
    TxInProgress,
    /// The transmission ended; [`Tal::task`] reports it.
    TxDone,
    /// Slotted CSMA-CA owns the transceiver, see [`CsmaState`].
    SlottedCsma,
    EdRunning,
    /// The ED scan ended; [`Tal::task`] reports it.
    EdDone,
}

/// Channel access used for a transmission.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CsmaMode {
    /// Send right away.
    NoCsmaNoIfs,
    /// Send after an interframe spacing, e.g. for a frame answering a data
    /// request.
    NoCsmaWithIfs,
    /// Unslotted CSMA-CA, by the engine chosen in [`TalConfig`].
    Unslotted,
    /// Slotted CSMA-CA, aligned on the superframe of the last beacon.
    Slotted,
}

/// Counters of the TAL.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct TalStats {
    /// Transmissions that went on air.
    pub tx_frames: u32,
    /// Transmissions that ended with a frame buffer underrun.
    pub tx_underruns: u32,
    /// CCAs that found the channel busy.
    pub cca_busy: u32,
    /// Frames handed to the upper layer.
    pub rx_frames: u32,
    /// Frames lost because no buffer or queue entry was free.
    pub rx_dropped_no_buffer: u32,
    /// Frames dropped because of an invalid PHR.
    pub rx_dropped_bad_length: u32,
}

/// A received frame waiting for [`Tal::task`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct RxEntry {
    handle: BufferHandle,
    timestamp: Instant,
}

/// The frame being transmitted and how.
#[derive(Debug)]
pub(crate) struct TxJob {
    frame: TxFrame,
    mode: CsmaMode,
    allow_retries: bool,
}

/// The transceiver abstraction layer.
///
/// - `T` accesses the transceiver.
/// - `TM` is the timer service.
/// - `B` provides frame buffers for reception.
/// - `R` provides the random numbers of the CSMA-CA backoffs.
/// - `U` receives the completion callbacks.
pub struct Tal<T, TM, B, R, U>
where
    T: Transceiver,
    TM: Timer,
    B: BufferPool,
    R: RngCore,
    U: UpperLayer,
{
    trx: T,
    timer: TM,
    pool: B,
    rng: R,
    upper: U,
    config: TalConfig,
    pib: Pib,

    state: TalState,
    /// Last known state of the transceiver.
    trx_status: TrxStatus,
    /// Buffer the next received frame is uploaded into.
    rx_buffer: Option<BufferHandle>,
    /// The receiver was switched off for lack of a buffer and has to be
    /// switched back on.
    rx_on_required: bool,
    incoming: Queue<RxEntry, INCOMING_QUEUE_CAPACITY>,

    tx: Option<TxJob>,
    /// A frame was handed to TX_ARET; the next TRX_END ends it.
    awaiting_tx_end: bool,
    /// Length of the MPDU sent last, selecting SIFS or LIFS.
    last_frame_length: u8,
    trac_status: TracStatus,

    sw_csma: csma::SwCsma,
    slotted: slotted::SlottedCsma,
    ed: ed::EdScan,

    stats: TalStats,
}

impl<T, TM, B, R, U> Tal<T, TM, B, R, U>
where
    T: Transceiver,
    TM: Timer,
    B: BufferPool,
    R: RngCore,
    U: UpperLayer,
{
    /// Create the TAL. The transceiver is not touched before [`Tal::init`].
    pub fn new(trx: T, timer: TM, pool: B, rng: R, upper: U, config: TalConfig) -> Self {
        let capacity = config.queue_capacity.unwrap_or(INCOMING_QUEUE_CAPACITY);
        Self {
            trx,
            timer,
            pool,
            rng,
            upper,
            config,
            pib: Pib::default(),
            state: TalState::Idle,
            trx_status: TrxStatus::POn,
            rx_buffer: None,
            rx_on_required: false,
            incoming: Queue::with_capacity(capacity),
            tx: None,
            awaiting_tx_end: false,
            last_frame_length: 0,
            trac_status: TracStatus::Success,
            sw_csma: csma::SwCsma::default(),
            slotted: slotted::SlottedCsma::default(),
            ed: ed::EdScan::default(),
            stats: TalStats::default(),
        }
    }

    pub fn state(&self) -> TalState {
        self.state
    }

    /// Last known state of the transceiver.
    pub fn trx_status(&self) -> TrxStatus {
        self.trx_status
    }

    pub fn stats(&self) -> TalStats {
        self.stats
    }

    pub fn config(&self) -> &TalConfig {
        &self.config
    }

    /// State of the slotted CSMA-CA engine.
    pub fn csma_state(&self) -> CsmaState {
        self.slotted.state
    }

    /// Number of received frames waiting for [`Tal::task`].
    pub fn pending_frames(&self) -> usize {
        self.incoming.len()
    }

    pub fn upper(&self) -> &U {
        &self.upper
    }

    pub fn upper_mut(&mut self) -> &mut U {
        &mut self.upper
    }

    pub fn trx(&self) -> &T {
        &self.trx
    }

    pub fn trx_mut(&mut self) -> &mut T {
        &mut self.trx
    }

    pub fn timer(&self) -> &TM {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut TM {
        &mut self.timer
    }

    /// Run the pending work: report finished transmissions and scans,
    /// deliver one received frame and advance the CSMA-CA engines.
    pub fn task(&mut self) -> Result<(), Error> {
        if self.rx_on_required && self.state == TalState::Idle {
            self.restart_receiver()?;
        }

        if let Some(entry) = self.incoming.remove() {
            self.process_incoming_frame(entry);
        }

        match self.state {
            TalState::Idle | TalState::EdRunning => Ok(()),
            TalState::TxInProgress => self.sw_csma_task(),
            TalState::TxDone => self.tx_done_handling(),
            TalState::SlottedCsma => self.slotted_csma_state_handling(),
            TalState::EdDone => self.ed_scan_done(),
        }
    }

    /// Handle the transceiver interrupt.
    pub fn on_interrupt(&mut self) -> Result<(), Error> {
        if self.trx_status == TrxStatus::Sleep {
            // The wake-up handshake polls for its interrupt itself.
            return Ok(());
        }

        let irq = self.trx.read_irq();
        trace!("irq {:x}", irq.bits());

        if irq.contains(IrqFlags::CCA_ED_DONE) {
            if self.state == TalState::EdRunning {
                self.ed_sample();
            } else if self.sw_csma.state == SwCsmaState::Cca {
                self.cca_done();
            }
        }

        if irq.contains(IrqFlags::TRX_END) {
            if self.awaiting_tx_end {
                self.handle_tx_end(irq.contains(IrqFlags::TRX_UR))?;
            } else {
                self.handle_received_frame()?;
            }
        }

        Ok(())
    }

    /// Handle the expiry of a timer started by the TAL.
    pub fn on_timer(&mut self, id: TimerId) -> Result<(), Error> {
        trace!("timer {:?} expired", id);
        match id {
            TimerId::CsmaBackoff => self.backoff_expired(),
            TimerId::CcaTimer => self.cca_timer_expired(),
            TimerId::BeaconLoss => {
                self.beacon_loss_expired();
                Ok(())
            }
            TimerId::Calibration => self.calibration_expired(),
        }
    }

    /// Command that switches the receiver on: with automatic acknowledgment,
    /// or without it in promiscuous mode.
    pub(crate) fn rx_command(&self) -> TrxCommand {
        if self.pib.promiscuous_mode {
            TrxCommand::RxOn
        } else {
            TrxCommand::RxAackOn
        }
    }

    /// Switch the receiver back on after a transmission or a scan. Without a
    /// receive buffer the transceiver waits in PLL_ON until [`Tal::task`]
    /// finds one.
    pub(crate) fn restore_rx(&mut self) -> Result<(), Error> {
        if self.rx_buffer.is_none() {
            self.set_trx_state(TrxCommand::PllOn)?;
            self.rx_on_required = true;
        } else {
            self.set_trx_state(self.rx_command())?;
        }
        Ok(())
    }

    fn restart_receiver(&mut self) -> Result<(), Error> {
        if self.rx_buffer.is_none() {
            self.rx_buffer = self.pool.alloc(RX_BUFFER_SIZE);
        }

        if self.rx_buffer.is_some() {
            debug!("receive buffer available again");
            self.rx_on_required = false;
            self.set_trx_state(self.rx_command())?;
        }

        Ok(())
    }
}

/// Log a fault and turn it into an error.
pub(crate) fn fault(fault: Fault) -> Error {
    error!("transceiver fault: {:?}", fault);
    Error::Fault(fault)
}
