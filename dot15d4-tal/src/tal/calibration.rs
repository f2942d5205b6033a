//! Periodic filter tuning and PLL calibration.

use rand_core::RngCore;

use super::{Tal, TalState};
use crate::buffer::BufferPool;
use crate::config::CALIBRATION_INTERVAL_US;
use crate::constants::FTN_CALIBRATION_DURATION_US;
use crate::error::Error;
use crate::time::Duration;
use crate::timer::{Timeout, Timer, TimerId};
use crate::trx::{Field, Transceiver, TrxCommand, TrxStatus};
use crate::upper::UpperLayer;

/// Duration of a PLL center frequency calibration.
const PLL_CF_CALIBRATION_DURATION_US: u32 = 35;

impl<T, TM, B, R, U> Tal<T, TM, B, R, U>
where
    T: Transceiver,
    TM: Timer,
    B: BufferPool,
    R: RngCore,
    U: UpperLayer,
{
    pub(crate) fn start_calibration_timer(&mut self) {
        if !self.config.periodic_calibration {
            return;
        }

        self.timer.stop(TimerId::Calibration);
        let interval = Duration::from_us(CALIBRATION_INTERVAL_US);
        if let Err(error) = self
            .timer
            .start(TimerId::Calibration, Timeout::Relative(interval))
        {
            warn!("calibration timer not started: {:?}", error);
        }
    }

    pub(crate) fn calibration_expired(&mut self) -> Result<(), Error> {
        match self.trx_status {
            TrxStatus::Sleep => (),
            // Wait for the next round rather than interrupt a transaction.
            _ if self.state != TalState::Idle => {
                debug!("calibration skipped, TAL busy");
            }
            TrxStatus::TrxOff => self.filter_tuning(),
            previous => {
                self.wait_for_state(TrxCommand::TrxOff, TrxStatus::TrxOff)?;
                self.filter_tuning();
                let command = if previous == TrxStatus::PllOn {
                    TrxCommand::PllOn
                } else {
                    self.rx_command()
                };
                self.set_trx_state(command)?;
                self.pll_calibration();
            }
        }

        self.start_calibration_timer();
        Ok(())
    }

    fn filter_tuning(&mut self) {
        trace!("filter tuning");
        self.trx.write_field(Field::FtnStart, 1);
        self.trx.delay_us(FTN_CALIBRATION_DURATION_US);
    }

    /// Only possible while the PLL runs.
    fn pll_calibration(&mut self) {
        if self.trx_status.is_pll_active() {
            trace!("PLL calibration");
            self.trx.write_field(Field::PllCfStart, 1);
            self.trx.delay_us(PLL_CF_CALIBRATION_DURATION_US);
        }
    }
}
