//! Slotted CSMA-CA.
//!
//! Backoffs are aligned on the backoff period boundaries of the superframe
//! started by the last beacon. A transmission only starts when the remaining
//! backoff, two CCAs and the whole transaction fit before the end of the
//! contention access period (CAP); otherwise the engine waits for the next
//! beacon.

use rand_core::RngCore;

use super::{CsmaMode, Tal, TalState};
use crate::buffer::BufferPool;
use crate::config::POLL_ATTEMPTS;
use crate::constants::*;
use crate::error::{Error, TxStatus};
use crate::time::{symbols_to_us, us_to_symbols, Duration, Instant};
use crate::timer::{Timeout, Timer, TimerError, TimerId};
use crate::trx::{Field, TracStatus, Transceiver, TrxCommand, TrxStatus};
use crate::upper::{TxFrame, UpperLayer};

/// Number of CCAs before a slotted transmission.
const CONTENTION_WINDOW: u8 = 2;

/// State of the slotted CSMA-CA engine.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub enum CsmaState {
    #[default]
    Idle,
    /// Waiting for the timer that starts the CCAs.
    BackoffWaitingForCcaTimer,
    /// The transaction does not fit in this CAP.
    BackoffWaitingForBeacon,
    /// A CCA found the channel busy.
    AccessFailure,
    FrameSending,
    TxDoneSuccess,
    TxDoneFramePending,
    TxDoneNoAck,
    /// No beacon came in time.
    NoBeaconTracking,
    /// A beacon came while waiting for one.
    HandleBeacon,
}

impl CsmaState {
    /// State after the transceiver reported the end of the transaction.
    pub(crate) fn from_trac(trac: TracStatus) -> Self {
        match trac {
            TracStatus::Success => Self::TxDoneSuccess,
            TracStatus::SuccessDataPending => Self::TxDoneFramePending,
            TracStatus::NoAck => Self::TxDoneNoAck,
            TracStatus::ChannelAccessFailure
            | TracStatus::SuccessWaitForAck
            | TracStatus::Invalid => Self::AccessFailure,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct SlottedCsma {
    pub(crate) state: CsmaState,
    pub(crate) nb: u8,
    pub(crate) be: u8,
    /// Backoff periods still to wait, carried over to the next CAP when the
    /// current one ends first.
    pub(crate) remaining_backoff_periods: u32,
    pub(crate) transaction_duration_periods: u32,
    /// Retransmissions left after a missing acknowledgment.
    pub(crate) retries_left: u8,
    /// Time of the first CCA.
    pub(crate) cca_start: Instant,
}

/// Backoff periods needed for the frame, the interframe spacing and the
/// acknowledgment when one is requested, plus the two CCAs.
pub(crate) fn transaction_duration_periods(frame: &TxFrame) -> u32 {
    let length = frame.length() as u32;
    let mut octets = length + PHY_OVERHEAD;

    let mut symbols = if length > MAX_SIFS_FRAME_SIZE as u32 {
        MIN_LIFS_PERIOD
    } else {
        MIN_SIFS_PERIOD
    };

    if frame.ack_request() {
        octets += ACK_FRAME_LEN + PHY_OVERHEAD;
        symbols += TURNAROUND_TIME + UNIT_BACKOFF_PERIOD;
    }

    symbols += octets * SYMBOLS_PER_OCTET;
    symbols.div_ceil(UNIT_BACKOFF_PERIOD) + CONTENTION_WINDOW as u32
}

impl<T, TM, B, R, U> Tal<T, TM, B, R, U>
where
    T: Transceiver,
    TM: Timer,
    B: BufferPool,
    R: RngCore,
    U: UpperLayer,
{
    pub(crate) fn slotted_csma_start(&mut self, allow_retries: bool) -> Result<(), Error> {
        if !self.check_beacon_reception() {
            return Err(Error::ChannelAccessFailure);
        }

        self.state = TalState::SlottedCsma;

        self.slotted.nb = 0;
        self.slotted.be = if self.pib.batt_life_ext {
            self.pib.min_be.min(2)
        } else {
            self.pib.min_be
        };
        self.slotted.retries_left = if allow_retries {
            self.pib.max_frame_retries
        } else {
            0
        };
        self.slotted.transaction_duration_periods = self
            .tx
            .as_ref()
            .map_or(0, |job| transaction_duration_periods(&job.frame));
        self.draw_backoff();

        self.csma_backoff_calculation()
    }

    fn draw_backoff(&mut self) {
        let mask = (1u32 << self.slotted.be) - 1;
        self.slotted.remaining_backoff_periods = self.rng.next_u32() & mask;
    }

    /// Move the beacon time forward over the beacons that were missed.
    /// Returns `false` once too many beacons in a row were missed.
    fn check_beacon_reception(&mut self) -> bool {
        let interval = self.pib.beacon_interval_symbols();
        let now = self.timer.now().to_symbols();
        let mut next_beacon = self.pib.beacon_tx_time.add_symbols(interval);

        let mut lost = 0;
        while now.is_after(next_beacon) {
            self.pib.beacon_tx_time = next_beacon;
            next_beacon = next_beacon.add_symbols(interval);
            lost += 1;

            if lost == MAX_LOST_BEACONS {
                warn!("{} beacons lost", lost);
                return false;
            }
        }

        true
    }

    /// Place the remaining backoff and the transaction in the CAP.
    fn csma_backoff_calculation(&mut self) -> Result<(), Error> {
        let beacon = self.pib.beacon_tx_time;
        let guard = (RADIO_WAKEUP_TIME_SYM << (self.pib.beacon_order.min(14) + 2))
            + us_to_symbols(PRE_BEACON_GUARD_TIME_US);
        let cap_end = beacon
            .add_symbols(self.pib.superframe_duration_symbols())
            .sub_symbols(guard);

        let now = self.timer.now().to_symbols();
        let boundary = now.since(beacon).div_ceil(UNIT_BACKOFF_PERIOD);
        let next_boundary = beacon.add_symbols(boundary * UNIT_BACKOFF_PERIOD);

        if !cap_end.is_after(next_boundary) {
            trace!("CAP over, waiting for the next beacon");
            return self.wait_for_beacon();
        }

        let periods_left = cap_end.since(next_boundary) / UNIT_BACKOFF_PERIOD;
        if self.slotted.remaining_backoff_periods > periods_left {
            self.slotted.remaining_backoff_periods -= periods_left;
            trace!(
                "backoff continues in the next CAP, {} periods",
                self.slotted.remaining_backoff_periods
            );
            return self.wait_for_beacon();
        }

        let backoff = self.slotted.remaining_backoff_periods * UNIT_BACKOFF_PERIOD;
        let transaction = self.slotted.transaction_duration_periods * UNIT_BACKOFF_PERIOD
            + us_to_symbols(SLEEP_TO_TRX_OFF_TYP_US + CCA_GUARD_DURATION_US);
        let transaction_end = next_boundary.add_symbols(backoff + transaction);

        if !cap_end.is_after(transaction_end) {
            debug!("transaction does not fit in the CAP");
            self.slotted.nb = 0;
            self.draw_backoff();
            return self.wait_for_beacon();
        }

        // The CCAs start on a backoff boundary far enough ahead to wake the
        // radio and prepare them.
        let period = Duration::from_symbols(UNIT_BACKOFF_PERIOD);
        let lead = Duration::from_us(SLEEP_TO_TRX_OFF_TYP_US + CCA_GUARD_DURATION_US);
        let now_us = self.timer.now();
        let mut cca_start = next_boundary.add_symbols(backoff).to_instant();
        while !cca_start.is_after(now_us + lead) {
            cca_start = cca_start + period;
        }
        self.slotted.cca_start = cca_start;

        let prepare = Duration::from_us(SLEEP_TO_TRX_OFF_TYP_US + CCA_PREPARATION_DURATION_US);
        self.slotted.state = CsmaState::BackoffWaitingForCcaTimer;
        self.timer.stop(TimerId::CcaTimer);
        match self
            .timer
            .start(TimerId::CcaTimer, Timeout::Absolute(cca_start - prepare))
        {
            Ok(()) => Ok(()),
            Err(TimerError::InvalidTimeout) => self.cca_timer_expired(),
            Err(TimerError::AlreadyRunning) => {
                self.slotted.state = CsmaState::AccessFailure;
                Ok(())
            }
        }
    }

    fn wait_for_beacon(&mut self) -> Result<(), Error> {
        self.slotted.state = CsmaState::BackoffWaitingForBeacon;

        let interval = symbols_to_us(self.pib.beacon_interval_symbols());
        let timeout = Duration::from_us(interval) * MAX_LOST_BEACONS
            + Duration::from_us(CSMA_BEACON_LOSS_GUARD_TIME_US);

        self.timer.stop(TimerId::BeaconLoss);
        if let Err(error) = self
            .timer
            .start(TimerId::BeaconLoss, Timeout::Relative(timeout))
        {
            warn!("beacon loss timer not started: {:?}", error);
        }
        Ok(())
    }

    pub(crate) fn beacon_loss_expired(&mut self) {
        if self.slotted.state == CsmaState::BackoffWaitingForBeacon {
            warn!("no beacon while waiting for the next CAP");
            self.slotted.state = CsmaState::NoBeaconTracking;
        }
    }

    /// A beacon was received or sent: the PIB holds its time.
    pub(crate) fn beacon_received(&mut self) {
        if self.state == TalState::SlottedCsma
            && self.slotted.state == CsmaState::BackoffWaitingForBeacon
        {
            self.slotted.state = CsmaState::HandleBeacon;
        }
    }

    pub(crate) fn cca_timer_expired(&mut self) -> Result<(), Error> {
        if self.slotted.state != CsmaState::BackoffWaitingForCcaTimer {
            return Ok(());
        }

        if self.perform_cca_twice()? {
            self.slotted.state = CsmaState::FrameSending;
            self.send_frame(CsmaMode::NoCsmaNoIfs, false)
        } else {
            self.slotted.state = CsmaState::AccessFailure;
            Ok(())
        }
    }

    /// Run the CCAs of the contention window, one backoff period apart.
    /// Returns `true` when every CCA found the channel idle.
    fn perform_cca_twice(&mut self) -> Result<bool, Error> {
        if self.set_trx_state(TrxCommand::PllOn)? != TrxStatus::PllOn {
            return Ok(false);
        }

        self.trx.write_field(Field::RxPdtDis, 1);

        let mut idle = true;
        for cw in 0..CONTENTION_WINDOW {
            if cw > 0 {
                self.trx
                    .delay_us(symbols_to_us(UNIT_BACKOFF_PERIOD) - CCA_DURATION_US);
            }

            self.set_trx_state(TrxCommand::RxOn)?;
            self.trx.write_field(Field::CcaRequest, 1);
            self.trx.delay_us(CCA_DURATION_US);

            let mut done = false;
            for _ in 0..POLL_ATTEMPTS {
                if self.trx.read_field(Field::CcaDone) == 1 {
                    done = true;
                    break;
                }
                self.trx.delay_us(1);
            }

            self.set_trx_state(TrxCommand::PllOn)?;

            if !done || self.trx.read_field(Field::CcaStatus) != 1 {
                idle = false;
                self.stats.cca_busy += 1;
                break;
            }

            let period = Duration::from_symbols(UNIT_BACKOFF_PERIOD);
            self.slotted.cca_start = self.slotted.cca_start + period;
        }

        // The CCA interrupts are masked; drop their status.
        self.trx.read_irq();
        self.trx.write_field(Field::RxPdtDis, 0);

        if !idle {
            trace!("slotted CCA found the channel busy");
            self.set_trx_state(self.rx_command())?;
        }

        Ok(idle)
    }

    pub(crate) fn slotted_csma_state_handling(&mut self) -> Result<(), Error> {
        match self.slotted.state {
            CsmaState::Idle
            | CsmaState::BackoffWaitingForCcaTimer
            | CsmaState::BackoffWaitingForBeacon
            | CsmaState::FrameSending => Ok(()),
            CsmaState::HandleBeacon => {
                self.timer.stop(TimerId::BeaconLoss);
                self.csma_backoff_calculation()
            }
            CsmaState::AccessFailure => {
                self.slotted.nb += 1;
                self.slotted.be = (self.slotted.be + 1).min(self.pib.max_be);
                if self.slotted.nb > self.pib.max_csma_backoffs {
                    self.slotted_tx_done(TxStatus::ChannelAccessFailure);
                    return Ok(());
                }
                self.draw_backoff();
                self.csma_backoff_calculation()
            }
            CsmaState::NoBeaconTracking => {
                self.slotted_tx_done(TxStatus::NoBeaconTracking);
                Ok(())
            }
            CsmaState::TxDoneSuccess => {
                self.slotted_tx_done(TxStatus::Success);
                Ok(())
            }
            CsmaState::TxDoneFramePending => {
                self.slotted_tx_done(TxStatus::FramePending);
                Ok(())
            }
            CsmaState::TxDoneNoAck => {
                if self.slotted.retries_left == 0 {
                    self.slotted_tx_done(TxStatus::NoAck);
                    return Ok(());
                }

                self.slotted.retries_left -= 1;
                self.set_trx_state(self.rx_command())?;
                self.slotted.be = (self.slotted.be + 1).min(self.pib.max_be);
                self.slotted.nb = 0;
                self.draw_backoff();
                self.csma_backoff_calculation()
            }
        }
    }

    fn slotted_tx_done(&mut self, status: TxStatus) {
        self.timer.stop(TimerId::BeaconLoss);
        self.timer.stop(TimerId::CcaTimer);
        self.slotted.state = CsmaState::Idle;
        self.finish_tx(status);
    }
}
