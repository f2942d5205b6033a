//! Transceiver sleep.

use rand_core::RngCore;

use super::{Tal, TalState};
use crate::buffer::BufferPool;
use crate::error::Error;
use crate::timer::Timer;
use crate::trx::{Transceiver, TrxCommand, TrxStatus};
use crate::upper::UpperLayer;

impl<T, TM, B, R, U> Tal<T, TM, B, R, U>
where
    T: Transceiver,
    TM: Timer,
    B: BufferPool,
    R: RngCore,
    U: UpperLayer,
{
    /// Put the transceiver to sleep. A frame in progress is received first.
    pub fn sleep(&mut self) -> Result<(), Error> {
        if self.state != TalState::Idle {
            return Err(Error::Busy);
        }
        if self.trx_status == TrxStatus::Sleep {
            return Err(Error::TrxAsleep);
        }

        self.wait_for_state(TrxCommand::TrxOff, TrxStatus::TrxOff)?;
        // The backoff generator restarts from the seed after sleep.
        self.write_csma_seed(0);
        self.set_trx_state(TrxCommand::Sleep)?;
        Ok(())
    }

    /// Wake the transceiver. It is left in TRX_OFF.
    pub fn wakeup(&mut self) -> Result<(), Error> {
        if self.trx_status != TrxStatus::Sleep {
            return Err(Error::TrxAwake);
        }

        self.set_trx_state(TrxCommand::TrxOff)?;
        Ok(())
    }
}
