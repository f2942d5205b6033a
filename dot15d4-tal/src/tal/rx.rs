//! Frame reception.

use dot15d4_tal_frame::{PhyFrame, FCS_LEN, MAX_PHY_PACKET_SIZE, PHR_LEN, PHY_BUFFER_SIZE};
use rand_core::RngCore;

use super::{RxEntry, Tal, TalState};
use crate::buffer::BufferPool;
use crate::constants::TRX_IRQ_DELAY_US;
use crate::error::Error;
use crate::time::{frame_duration, Duration};
use crate::timer::Timer;
use crate::trx::{Transceiver, TrxCommand, TrxStatus, Variant};
use crate::upper::{RxFrame, UpperLayer};

/// Size of a receive buffer: PHR, PSDU, and the LQI and ED octets appended
/// by the transceiver.
pub const RX_BUFFER_SIZE: usize = PHY_BUFFER_SIZE + 2;

impl<T, TM, B, R, U> Tal<T, TM, B, R, U>
where
    T: Transceiver,
    TM: Timer,
    B: BufferPool,
    R: RngCore,
    U: UpperLayer,
{
    /// Switch the receiver on or off.
    ///
    /// Switching off waits for a frame in progress to end. Without a free
    /// receive buffer, switching on leaves the transceiver in PLL_ON until
    /// [`Tal::task`] finds one.
    pub fn rx_enable(&mut self, on: bool) -> Result<(), Error> {
        if self.state != TalState::Idle {
            return Err(Error::Busy);
        }

        if !on {
            self.rx_on_required = false;
            if self.trx_status == TrxStatus::Sleep {
                return Ok(());
            }
            return self.wait_for_state(TrxCommand::TrxOff, TrxStatus::TrxOff);
        }

        if self.trx_status == TrxStatus::Sleep {
            return Err(Error::TrxAsleep);
        }

        if self.rx_buffer.is_none() {
            self.rx_buffer = self.pool.alloc(RX_BUFFER_SIZE);
        }
        self.restore_rx()
    }

    /// Upload a received frame into the receive buffer and queue it, from
    /// the interrupt.
    pub(crate) fn handle_received_frame(&mut self) -> Result<(), Error> {
        let end = self.timer.now();
        let Some(handle) = self.rx_buffer else {
            // Reading releases the frame buffer protection.
            let mut drain = [0u8; 1];
            self.trx.read_frame_buffer(&mut drain);
            self.stats.rx_dropped_no_buffer += 1;
            debug!("frame dropped, no receive buffer");
            return Ok(());
        };

        let mut phr = [0u8; PHR_LEN];
        self.trx.read_frame_buffer(&mut phr);
        let length = phr[0] as usize;
        if !(FCS_LEN..=MAX_PHY_PACKET_SIZE).contains(&length) {
            self.stats.rx_dropped_bad_length += 1;
            debug!("frame dropped, length {}", length);
            return Ok(());
        }

        let buffer = self.pool.buffer_mut(handle);
        let upload = PHR_LEN + length + 2;
        if buffer.len() < upload {
            self.stats.rx_dropped_bad_length += 1;
            return Ok(());
        }
        self.trx.read_frame_buffer(&mut buffer[..upload]);

        let entry = RxEntry {
            handle,
            timestamp: end - frame_duration(length as u32) - Duration::from_us(TRX_IRQ_DELAY_US),
        };
        if self.incoming.append(entry).is_err() {
            // The buffer stays the receive buffer.
            self.stats.rx_dropped_no_buffer += 1;
            debug!("frame dropped, incoming queue full");
            return Ok(());
        }

        self.rx_buffer = self.pool.alloc(RX_BUFFER_SIZE);
        if self.rx_buffer.is_none() {
            debug!("no receive buffer left, receiver off");
            self.set_trx_state(TrxCommand::PllOn)?;
            self.rx_on_required = true;
        }

        Ok(())
    }

    /// Hand a queued frame to the upper layer and free its buffer.
    pub(crate) fn process_incoming_frame(&mut self, entry: RxEntry) {
        let buffer = self.pool.buffer(entry.handle);

        match PhyFrame::new(buffer) {
            Ok(frame) => {
                let raw_lqi = frame.lqi().unwrap_or(0);
                let ed = frame.ed().unwrap_or(0);
                let lqi = T::Variant::normalize_lqi(raw_lqi, ed);

                self.stats.rx_frames += 1;
                self.upper
                    .rx_frame(RxFrame::new(frame, lqi, ed, entry.timestamp));
            }
            Err(_) => {
                self.stats.rx_dropped_bad_length += 1;
            }
        }

        self.pool.free(entry.handle);
    }
}
