//! Energy detection scan.

use rand_core::RngCore;

use super::{Tal, TalState};
use crate::buffer::BufferPool;
use crate::constants::*;
use crate::error::Error;
use crate::timer::Timer;
use crate::trx::{Field, IrqFlags, Register, Transceiver, TrxCommand, TrxStatus, Variant};
use crate::upper::UpperLayer;

#[derive(Debug, Default)]
pub(crate) struct EdScan {
    /// Measurements still to take.
    pub(crate) samples_left: u32,
    /// Highest raw level seen so far.
    pub(crate) max_level: u8,
}

/// Number of 8-symbol measurements in a scan of
/// `aBaseSuperframeDuration * (2^duration + 1)` symbols.
pub(crate) fn ed_samples(duration: u8) -> u32 {
    BASE_SUPERFRAME_DURATION * ((1 << duration) + 1) / ED_SAMPLE_DURATION_SYM
}

impl<T, TM, B, R, U> Tal<T, TM, B, R, U>
where
    T: Transceiver,
    TM: Timer,
    B: BufferPool,
    R: RngCore,
    U: UpperLayer,
{
    /// Start an energy detection scan on the current channel. The highest
    /// level measured is reported through [`UpperLayer::ed_done`].
    pub fn ed_start(&mut self, duration: u8) -> Result<(), Error> {
        if self.state != TalState::Idle {
            return Err(Error::Busy);
        }
        if self.trx_status == TrxStatus::Sleep {
            return Err(Error::TrxAsleep);
        }
        if duration > MAX_SCAN_DURATION {
            return Err(Error::InvalidParameter);
        }

        self.ed.samples_left = ed_samples(duration);
        self.ed.max_level = 0;
        debug!(
            "ED scan of {} samples on channel {}",
            self.ed.samples_left,
            self.pib.current_channel
        );

        self.trx.write_field(Field::RxPdtDis, 1);
        self.wait_for_state(TrxCommand::PllOn, TrxStatus::PllOn)?;
        self.set_trx_state(TrxCommand::RxOn)?;
        self.trx
            .write_irq_mask(IrqFlags::TRX_END | IrqFlags::CCA_ED_DONE);

        self.state = TalState::EdRunning;
        // Writing the ED register starts a measurement.
        self.trx.write_reg(Register::PhyEdLevel, 0);
        Ok(())
    }

    /// End of a measurement, from the interrupt.
    pub(crate) fn ed_sample(&mut self) {
        let level = self.trx.read_reg(Register::PhyEdLevel);
        self.ed.max_level = self.ed.max_level.max(level);
        self.ed.samples_left = self.ed.samples_left.saturating_sub(1);

        if self.ed.samples_left > 0 {
            self.trx.write_reg(Register::PhyEdLevel, 0);
        } else {
            self.state = TalState::EdDone;
        }
    }

    pub(crate) fn ed_scan_done(&mut self) -> Result<(), Error> {
        self.trx.write_irq_mask(IrqFlags::TRX_END);
        self.trx.write_field(Field::RxPdtDis, 0);
        self.state = TalState::Idle;
        self.restore_rx()?;

        let level = T::Variant::scale_ed(self.ed.max_level);
        debug!("ED scan done, level {}", level);
        self.upper.ed_done(level);
        Ok(())
    }
}
