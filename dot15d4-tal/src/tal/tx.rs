//! Frame transmission.

use dot15d4_tal_frame::FCS_LEN;
use rand_core::RngCore;

use super::{slotted, CsmaMode, Tal, TalState, TxJob};
use crate::buffer::BufferPool;
use crate::config::CsmaEngine;
use crate::constants::*;
use crate::error::{Error, TxStatus};
use crate::time::{frame_duration, symbols_to_us, Duration, Instant};
use crate::timer::Timer;
use crate::trx::{Field, TracStatus, Transceiver, TrxCommand, TrxStatus};
use crate::upper::{TxFrame, UpperLayer};

/// `MAX_CSMA_RETRIES` value that makes TX_ARET skip CCA.
const NO_CSMA: u8 = 7;

impl<T, TM, B, R, U> Tal<T, TM, B, R, U>
where
    T: Transceiver,
    TM: Timer,
    B: BufferPool,
    R: RngCore,
    U: UpperLayer,
{
    /// Transmit a frame.
    ///
    /// The outcome is reported once through [`UpperLayer::tx_done`], which
    /// hands the frame back. When the transmission cannot start, the frame is
    /// returned with the error and no callback follows.
    ///
    /// `allow_retries` enables retransmissions when no acknowledgment comes.
    pub fn tx_frame(
        &mut self,
        frame: TxFrame,
        mode: CsmaMode,
        allow_retries: bool,
    ) -> Result<(), (Error, TxFrame)> {
        if self.state != TalState::Idle {
            return Err((Error::Busy, frame));
        }
        if self.trx_status == TrxStatus::Sleep {
            return Err((Error::TrxAsleep, frame));
        }

        if self.pib.beacon_enabled()
            && mode == CsmaMode::NoCsmaWithIfs
            && !allow_retries
            && !self.fits_before_next_beacon(&frame)
        {
            debug!("transaction would overlap the next beacon");
            return Err((Error::ChannelAccessFailure, frame));
        }

        self.last_frame_length = frame.length().saturating_sub(FCS_LEN as u8);
        self.tx = Some(TxJob {
            frame,
            mode,
            allow_retries,
        });

        let started = match mode {
            CsmaMode::Slotted => self.slotted_csma_start(allow_retries),
            CsmaMode::Unslotted if self.config.csma_engine == CsmaEngine::Software => {
                self.state = TalState::TxInProgress;
                self.sw_csma_start()
            }
            _ => {
                self.state = TalState::TxInProgress;
                self.send_frame(mode, allow_retries)
            }
        };

        match started {
            Ok(()) => Ok(()),
            Err(error) => {
                self.state = TalState::Idle;
                self.awaiting_tx_end = false;
                self.slotted.state = slotted::CsmaState::Idle;
                match self.tx.take() {
                    Some(job) => Err((error, job.frame)),
                    None => unreachable!("the job is stored before starting"),
                }
            }
        }
    }

    /// Hand the frame to TX_ARET and trigger the transmission. With
    /// `NoCsmaNoIfs` and `NoCsmaWithIfs` the transceiver skips its CCA.
    pub(crate) fn send_frame(&mut self, mode: CsmaMode, allow_retries: bool) -> Result<(), Error> {
        let retries = if allow_retries {
            self.pib.max_frame_retries
        } else {
            0
        };
        self.trx.write_field(Field::MaxFrameRetries, retries);

        let csma_retries = match mode {
            CsmaMode::NoCsmaNoIfs | CsmaMode::NoCsmaWithIfs => NO_CSMA,
            CsmaMode::Unslotted | CsmaMode::Slotted => self.pib.max_csma_backoffs,
        };
        self.trx.write_field(Field::MaxCsmaRetries, csma_retries);

        self.wait_for_state(TrxCommand::TxAretOn, TrxStatus::TxAretOn)?;

        self.trx.irq_disable();

        if mode == CsmaMode::NoCsmaWithIfs {
            let ifs = if self.last_frame_length > MAX_SIFS_FRAME_SIZE {
                MIN_LIFS_PERIOD
            } else {
                MIN_SIFS_PERIOD
            };
            self.trx.delay_us(symbols_to_us(ifs));
            self.last_frame_length = 0;
        }

        // A pulse on SLP_TR starts the transmission; the frame buffer is
        // written while the preamble is sent.
        self.trx.set_slp_tr(true);
        self.trx.set_slp_tr(false);
        if let Some(job) = &self.tx {
            self.trx.write_frame_buffer(job.frame.upload());
        }
        self.awaiting_tx_end = true;

        self.trx.irq_enable();

        trace!("frame sent to the transceiver");
        Ok(())
    }

    /// End of a transmission, from the interrupt.
    pub(crate) fn handle_tx_end(&mut self, underrun: bool) -> Result<(), Error> {
        let end = self.timer.now();
        self.awaiting_tx_end = false;
        self.stats.tx_frames += 1;

        if let Some(job) = self.tx.as_mut() {
            let start = frame_start(&job.frame, end);
            job.frame.set_timestamp(start);
        }

        self.trac_status = if underrun {
            warn!("frame buffer underrun");
            self.stats.tx_underruns += 1;
            TracStatus::Invalid
        } else {
            TracStatus::from(self.trx.read_field(Field::TracStatus))
        };
        trace!("transmission ended, {:?}", self.trac_status);

        if self.state == TalState::SlottedCsma
            && self.slotted.state == slotted::CsmaState::FrameSending
        {
            self.slotted.state = slotted::CsmaState::from_trac(self.trac_status);
        } else {
            self.state = TalState::TxDone;
        }

        self.restore_rx()
    }

    /// Report the end of an unslotted transmission.
    pub(crate) fn tx_done_handling(&mut self) -> Result<(), Error> {
        let software = self
            .tx
            .as_ref()
            .is_some_and(|job| job.mode == CsmaMode::Unslotted)
            && self.config.csma_engine == CsmaEngine::Software;

        if software && self.sw_csma_retry()? {
            return Ok(());
        }

        let status = match self.trac_status {
            TracStatus::Success => TxStatus::Success,
            TracStatus::SuccessDataPending => TxStatus::FramePending,
            TracStatus::ChannelAccessFailure => TxStatus::ChannelAccessFailure,
            TracStatus::NoAck => TxStatus::NoAck,
            TracStatus::SuccessWaitForAck | TracStatus::Invalid => TxStatus::Invalid,
        };

        self.finish_tx(status);
        Ok(())
    }

    /// Go back to idle and hand the frame back to the upper layer.
    pub(crate) fn finish_tx(&mut self, status: TxStatus) {
        self.state = TalState::Idle;
        debug!("transmission done, {:?}", status);
        if let Some(job) = self.tx.take() {
            self.upper.tx_done(status, job.frame);
        }
    }

    /// An indirect transmission without CSMA-CA has to end before the next
    /// beacon.
    fn fits_before_next_beacon(&self, frame: &TxFrame) -> bool {
        let duration = slotted::transaction_duration_periods(frame) * UNIT_BACKOFF_PERIOD;
        let next_beacon = self
            .pib
            .beacon_tx_time
            .add_symbols(self.pib.beacon_interval_symbols());
        let now = self.timer.now().to_symbols();

        next_beacon.is_after(now) && duration <= next_beacon.since(now)
    }
}

/// Start of a frame on air, from the TRX_END interrupt of its transaction.
/// TX_ARET signals the end after the acknowledgment.
fn frame_start(frame: &TxFrame, end: Instant) -> Instant {
    let mut on_air = frame_duration(frame.length() as u32) + Duration::from_us(TRX_IRQ_DELAY_US);
    if frame.ack_request() {
        on_air = on_air + Duration::from_symbols(TURNAROUND_TIME) + frame_duration(ACK_FRAME_LEN);
    }
    end - on_air
}
