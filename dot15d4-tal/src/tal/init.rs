//! Initialization and reset.

use rand_core::RngCore;

use super::{Tal, TalState, RX_BUFFER_SIZE};
use crate::buffer::BufferPool;
use crate::config::POLL_ATTEMPTS;
use crate::constants::*;
use crate::error::Error;
use crate::pib::Pib;
use crate::timer::{Timer, TimerId};
use crate::trx::{Field, IrqFlags, Register, Transceiver, TrxCommand, TrxStatus, Variant};
use crate::upper::UpperLayer;

impl<T, TM, B, R, U> Tal<T, TM, B, R, U>
where
    T: Transceiver,
    TM: Timer,
    B: BufferPool,
    R: RngCore,
    U: UpperLayer,
{
    /// Bring up the transceiver and the TAL.
    ///
    /// The transceiver is reset and identified, configured and loaded with
    /// the default PIB. It is left in TRX_OFF; call
    /// [`Tal::rx_enable`](Tal::rx_enable) to start receiving.
    pub fn init(&mut self) -> Result<(), Error> {
        self.trx.irq_disable();
        self.trx_init()?;
        self.internal_reset(true)?;

        self.trx.read_irq();
        self.trx.irq_clear();

        self.rx_buffer = self.pool.alloc(RX_BUFFER_SIZE);
        if self.rx_buffer.is_none() {
            warn!("no receive buffer at init");
            self.rx_on_required = true;
        }

        self.trx.irq_enable();
        self.start_calibration_timer();

        info!("TAL initialized on {}", T::Variant::NAME);
        Ok(())
    }

    /// Reset the transceiver and the TAL.
    ///
    /// Pending transmissions, scans and queued frames are dropped without a
    /// callback. With `restore_defaults` the PIB returns to its defaults;
    /// otherwise the current PIB is written back to the transceiver.
    pub fn reset(&mut self, restore_defaults: bool) -> Result<(), Error> {
        self.trx.irq_disable();
        for id in TimerId::ALL {
            self.timer.stop(id);
        }

        self.internal_reset(restore_defaults)?;

        let pool = &mut self.pool;
        self.incoming.flush(|entry| pool.free(entry.handle));

        if self.rx_buffer.is_none() {
            self.rx_buffer = self.pool.alloc(RX_BUFFER_SIZE);
        }
        self.rx_on_required = self.rx_buffer.is_none();

        self.trx.read_irq();
        self.trx.irq_clear();
        self.trx.irq_enable();
        self.start_calibration_timer();

        debug!("TAL reset");
        Ok(())
    }

    /// Reset pulse and identification of the transceiver.
    fn trx_init(&mut self) -> Result<(), Error> {
        self.reset_pulse();

        let mut found = false;
        for _ in 0..POLL_ATTEMPTS {
            if self.trx.read_reg(Register::PartNum) == T::Variant::PART_NUM {
                found = true;
                break;
            }
            self.trx.delay_us(TRX_POLL_WAIT_TIME_US);
        }

        if !found {
            error!(
                "transceiver is not a {}, part number {:x}",
                T::Variant::NAME,
                self.trx.read_reg(Register::PartNum)
            );
            return Err(Error::Failure);
        }

        self.force_trx_off()
    }

    fn reset_pulse(&mut self) {
        self.trx.set_slp_tr(false);
        self.trx.set_reset(true);
        self.trx.delay_us(P_ON_TO_CLKM_AVAILABLE_MAX_US);
        self.trx.delay_us(RST_PULSE_WIDTH_US);
        self.trx.set_reset(false);
    }

    fn force_trx_off(&mut self) -> Result<(), Error> {
        self.trx
            .write_reg(Register::TrxState, TrxCommand::ForceTrxOff as u8);

        for _ in 0..POLL_ATTEMPTS {
            if self.trx.read_field(Field::TrxStatus) == TrxStatus::TrxOff as u8 {
                self.trx_status = TrxStatus::TrxOff;
                return Ok(());
            }
            self.trx.delay_us(TRX_POLL_WAIT_TIME_US);
        }

        error!("transceiver does not reach TRX_OFF");
        Err(Error::Failure)
    }

    pub(crate) fn internal_reset(&mut self, restore_defaults: bool) -> Result<(), Error> {
        self.reset_pulse();
        self.force_trx_off()?;

        let entropy = self.generate_rand_seed()?;
        self.trx_config(entropy);

        if restore_defaults {
            self.pib = Pib::default();
        }
        self.write_all_pib_to_trx();

        self.state = TalState::Idle;
        self.tx = None;
        self.awaiting_tx_end = false;
        self.last_frame_length = 0;
        self.sw_csma = Default::default();
        self.slotted = Default::default();
        self.ed = Default::default();

        Ok(())
    }

    /// Collect 16 random bits from the receiver noise. The receiver has to
    /// run, with preamble detection disabled.
    fn generate_rand_seed(&mut self) -> Result<u16, Error> {
        self.set_trx_state(TrxCommand::RxOn)?;
        self.trx.write_field(Field::RxPdtDis, 1);

        let mut seed = 0u16;
        for i in 0..8 {
            seed |= (self.trx.read_field(Field::RndValue) as u16 & 0x03) << (2 * i);
            self.trx.delay_us(1);
        }

        self.trx.write_field(Field::RxPdtDis, 0);
        self.set_trx_state(TrxCommand::ForceTrxOff)?;

        trace!("random seed {:x}", seed);
        Ok(seed)
    }

    /// Seed the backoff generator of the extended operating mode.
    pub(crate) fn write_csma_seed(&mut self, entropy: u16) {
        let seed = (self.rng.next_u32() as u16) ^ entropy;
        self.trx.write_reg(Register::CsmaSeed0, seed as u8);
        self.trx.write_field(Field::CsmaSeed1, (seed >> 8) as u8 & 0x07);
    }

    fn trx_config(&mut self, entropy: u16) {
        // Acknowledgments of data requests announce pending data.
        self.trx.write_field(Field::AackSetPd, 1);
        self.trx.write_field(Field::RxSafeMode, 1);
        self.trx.write_field(Field::IrqMaskMode, 1);
        self.trx.write_irq_mask(IrqFlags::TRX_END);
        self.trx.write_field(Field::TxAutoCrcOn, 1);
        self.write_csma_seed(entropy);
    }
}
