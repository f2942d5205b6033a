//! Unslotted CSMA-CA in software.
//!
//! The TAL draws the random backoffs, runs each CCA itself and only hands a
//! frame to the transceiver once the channel was found idle. NB and BE
//! follow the unslotted CSMA-CA of IEEE 802.15.4-2015, 6.2.5.1.

use rand_core::RngCore;

use super::{CsmaMode, Tal, TalState};
use crate::buffer::BufferPool;
use crate::constants::UNIT_BACKOFF_PERIOD;
use crate::error::Error;
use crate::time::Duration;
use crate::timer::{Timeout, Timer, TimerId};
use crate::trx::{Field, IrqFlags, TracStatus, Transceiver, TrxCommand, TrxStatus};
use crate::upper::UpperLayer;

/// State of the software CSMA-CA.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum SwCsmaState {
    #[default]
    Idle,
    /// Waiting for the backoff timer.
    Backoff,
    /// Waiting for the CCA to end.
    Cca,
    /// The CCA ended; [`Tal::task`] evaluates it.
    CcaDone,
    /// The channel was busy; [`Tal::task`] starts the next backoff.
    Continue,
}

#[derive(Debug, Default)]
pub(crate) struct SwCsma {
    pub(crate) state: SwCsmaState,
    /// Number of backoffs in this attempt.
    pub(crate) nb: u8,
    /// Backoff exponent.
    pub(crate) be: u8,
    /// Retransmissions done after a missing acknowledgment.
    pub(crate) retries: u8,
    /// Result of the last CCA.
    pub(crate) cca_idle: bool,
}

impl<T, TM, B, R, U> Tal<T, TM, B, R, U>
where
    T: Transceiver,
    TM: Timer,
    B: BufferPool,
    R: RngCore,
    U: UpperLayer,
{
    pub(crate) fn sw_csma_start(&mut self) -> Result<(), Error> {
        self.sw_csma.retries = 0;
        self.sw_csma_restart()
    }

    fn sw_csma_restart(&mut self) -> Result<(), Error> {
        self.sw_csma.nb = 0;
        self.sw_csma.be = self.pib.min_be;
        self.sw_csma_backoff()
    }

    /// Wait a random number of backoff periods, then run a CCA.
    fn sw_csma_backoff(&mut self) -> Result<(), Error> {
        let mask = (1u32 << self.sw_csma.be) - 1;
        let periods = self.rng.next_u32() & mask;
        trace!(
            "backoff of {} periods, NB={} BE={}",
            periods,
            self.sw_csma.nb,
            self.sw_csma.be
        );

        if periods == 0 {
            return self.start_cca();
        }

        if self.config.rx_during_backoff && self.rx_buffer.is_some() {
            self.set_trx_state(self.rx_command())?;
        } else {
            self.set_trx_state(TrxCommand::PllOn)?;
        }

        let duration = Duration::from_symbols(periods * UNIT_BACKOFF_PERIOD);
        self.timer.stop(TimerId::CsmaBackoff);
        match self
            .timer
            .start(TimerId::CsmaBackoff, Timeout::Relative(duration))
        {
            Ok(()) => {
                self.sw_csma.state = SwCsmaState::Backoff;
                Ok(())
            }
            Err(error) => {
                debug!("backoff timer not started: {:?}", error);
                self.start_cca()
            }
        }
    }

    pub(crate) fn backoff_expired(&mut self) -> Result<(), Error> {
        if self.sw_csma.state != SwCsmaState::Backoff {
            return Ok(());
        }
        self.start_cca()
    }

    fn start_cca(&mut self) -> Result<(), Error> {
        if self.set_trx_state(TrxCommand::PllOn)? != TrxStatus::PllOn {
            // Receiving a frame: the channel is busy.
            self.sw_csma.cca_idle = false;
            self.sw_csma.state = SwCsmaState::CcaDone;
            return Ok(());
        }

        self.trx.write_field(Field::RxPdtDis, 1);
        self.set_trx_state(TrxCommand::RxOn)?;
        self.trx
            .write_irq_mask(IrqFlags::TRX_END | IrqFlags::CCA_ED_DONE);

        self.sw_csma.state = SwCsmaState::Cca;
        self.trx.write_field(Field::CcaRequest, 1);
        Ok(())
    }

    /// End of the CCA, from the interrupt.
    pub(crate) fn cca_done(&mut self) {
        self.sw_csma.cca_idle = self.trx.read_field(Field::CcaStatus) == 1;
        self.sw_csma.state = SwCsmaState::CcaDone;
    }

    pub(crate) fn sw_csma_task(&mut self) -> Result<(), Error> {
        match self.sw_csma.state {
            SwCsmaState::CcaDone => self.evaluate_cca(),
            SwCsmaState::Continue => self.sw_csma_backoff(),
            SwCsmaState::Idle | SwCsmaState::Backoff | SwCsmaState::Cca => Ok(()),
        }
    }

    fn evaluate_cca(&mut self) -> Result<(), Error> {
        self.trx.write_irq_mask(IrqFlags::TRX_END);
        self.trx.write_field(Field::RxPdtDis, 0);
        self.set_trx_state(TrxCommand::PllOn)?;

        if self.sw_csma.cca_idle {
            self.sw_csma.state = SwCsmaState::Idle;
            return self.send_frame(CsmaMode::NoCsmaNoIfs, false);
        }

        self.stats.cca_busy += 1;
        self.sw_csma.nb += 1;
        if self.sw_csma.nb > self.pib.max_csma_backoffs {
            debug!("channel access failure after {} backoffs", self.sw_csma.nb);
            self.sw_csma.state = SwCsmaState::Idle;
            self.trac_status = TracStatus::ChannelAccessFailure;
            self.state = TalState::TxDone;
            return self.restore_rx();
        }

        self.sw_csma.be = (self.sw_csma.be + 1).min(self.pib.max_be);
        self.sw_csma.state = SwCsmaState::Continue;
        Ok(())
    }

    /// Start over after a missing acknowledgment. Returns `false` when no
    /// retransmission is left.
    pub(crate) fn sw_csma_retry(&mut self) -> Result<bool, Error> {
        let allowed = self.tx.as_ref().is_some_and(|job| job.allow_retries);
        if self.trac_status != TracStatus::NoAck
            || !allowed
            || self.sw_csma.retries >= self.pib.max_frame_retries
        {
            return Ok(false);
        }

        self.sw_csma.retries += 1;
        debug!("no acknowledgment, retry {}", self.sw_csma.retries);
        self.state = TalState::TxInProgress;
        self.sw_csma_restart()?;
        Ok(true)
    }
}
