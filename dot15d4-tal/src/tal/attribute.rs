//! PIB access.

use rand_core::RngCore;

use super::{Tal, TalState};
use crate::buffer::BufferPool;
use crate::error::Error;
use crate::pib::{PibAttribute, PibId};
use crate::timer::Timer;
use crate::trx::{Field, Register, Transceiver, TrxCommand, TrxStatus, Variant};
use crate::upper::UpperLayer;

impl<T, TM, B, R, U> Tal<T, TM, B, R, U>
where
    T: Transceiver,
    TM: Timer,
    B: BufferPool,
    R: RngCore,
    U: UpperLayer,
{
    /// Read a PIB attribute.
    pub fn pib_get(&self, id: PibId) -> PibAttribute {
        self.pib.get(id, T::Variant::SUPPORTED_CHANNELS)
    }

    /// Write a PIB attribute, and the transceiver registers it maps to.
    ///
    /// Attributes kept by the TAL alone can be written at any time but
    /// during an ED scan. The others need an awake transceiver; the channel
    /// also needs an idle TAL.
    pub fn pib_set(&mut self, attribute: PibAttribute) -> Result<(), Error> {
        if matches!(self.state, TalState::EdRunning | TalState::EdDone) {
            return Err(Error::Busy);
        }

        if let PibAttribute::SupportedChannels(_) = attribute {
            return Err(Error::ReadOnly);
        }

        if attribute.is_local() {
            self.pib.apply(attribute)?;
            if let PibAttribute::BeaconTxTime(_) = attribute {
                self.beacon_received();
            }
            return Ok(());
        }

        if self.trx_status == TrxStatus::Sleep {
            return Err(Error::TrxAsleep);
        }

        match attribute {
            PibAttribute::CurrentChannel(channel) => self.set_channel(channel),
            PibAttribute::TransmitPower(dbm) => {
                let register = T::Variant::tx_power_register(dbm);
                self.trx.write_field(Field::TxPwr, register);
                self.pib.transmit_power = T::Variant::tx_power_dbm(register);
                Ok(())
            }
            PibAttribute::PromiscuousMode(enabled) => {
                self.pib.apply(attribute)?;
                self.trx.write_field(Field::AackPromMode, enabled as u8);
                if matches!(self.trx_status, TrxStatus::RxOn | TrxStatus::RxAackOn) {
                    self.set_trx_state(self.rx_command())?;
                }
                Ok(())
            }
            other => {
                self.pib.apply(other)?;
                self.write_pib_to_trx(other.id());
                Ok(())
            }
        }
    }

    fn set_channel(&mut self, channel: u8) -> Result<(), Error> {
        if self.state != TalState::Idle {
            return Err(Error::Busy);
        }
        if !T::Variant::supports_channel(channel) {
            return Err(Error::InvalidParameter);
        }

        let previous = self.trx_status;
        self.pib.apply(PibAttribute::CurrentChannel(channel))?;

        // The channel is changed in TRX_OFF.
        self.wait_for_state(TrxCommand::TrxOff, TrxStatus::TrxOff)?;
        self.trx.write_field(Field::Channel, channel);

        let command = match previous {
            TrxStatus::PllOn => Some(TrxCommand::PllOn),
            TrxStatus::RxOn | TrxStatus::RxAackOn => Some(self.rx_command()),
            TrxStatus::BusyRx | TrxStatus::BusyRxAack => Some(self.rx_command()),
            _ => None,
        };
        if let Some(command) = command {
            self.set_trx_state(command)?;
        }

        debug!("channel {}", channel);
        Ok(())
    }

    /// Write every transceiver-side attribute of the PIB.
    pub(crate) fn write_all_pib_to_trx(&mut self) {
        for id in [
            PibId::PanId,
            PibId::ShortAddress,
            PibId::IeeeAddress,
            PibId::CurrentChannel,
            PibId::CcaMode,
            PibId::TransmitPower,
            PibId::MinBe,
            PibId::MaxBe,
            PibId::PanCoordinator,
            PibId::PromiscuousMode,
        ] {
            self.write_pib_to_trx(id);
        }
    }

    fn write_pib_to_trx(&mut self, id: PibId) {
        let pib = &self.pib;
        match id {
            PibId::PanId => {
                let [low, high] = pib.pan_id.to_le_bytes();
                self.trx.write_reg(Register::PanId0, low);
                self.trx.write_reg(Register::PanId1, high);
            }
            PibId::ShortAddress => {
                let [low, high] = pib.short_address.to_le_bytes();
                self.trx.write_reg(Register::ShortAddr0, low);
                self.trx.write_reg(Register::ShortAddr1, high);
            }
            PibId::IeeeAddress => {
                for (i, octet) in pib.ieee_address.to_le_bytes().into_iter().enumerate() {
                    self.trx.write_reg(Register::IeeeAddr(i as u8), octet);
                }
            }
            PibId::CurrentChannel => self.trx.write_field(Field::Channel, pib.current_channel),
            PibId::CcaMode => self.trx.write_field(Field::CcaMode, pib.cca_mode),
            PibId::TransmitPower => {
                let register = T::Variant::tx_power_register(pib.transmit_power);
                self.trx.write_field(Field::TxPwr, register);
                self.pib.transmit_power = T::Variant::tx_power_dbm(register);
            }
            PibId::MinBe | PibId::MaxBe => {
                self.trx.write_field(Field::MinBe, pib.min_be);
                self.trx.write_field(Field::MaxBe, pib.max_be);
            }
            PibId::PanCoordinator => self
                .trx
                .write_field(Field::AackIAmCoord, pib.pan_coordinator as u8),
            PibId::PromiscuousMode => self
                .trx
                .write_field(Field::AackPromMode, pib.promiscuous_mode as u8),
            PibId::CurrentPage
            | PibId::MaxCsmaBackoffs
            | PibId::MaxFrameRetries
            | PibId::BattLifeExt
            | PibId::BeaconOrder
            | PibId::SuperframeOrder
            | PibId::BeaconTxTime
            | PibId::SupportedChannels => (),
        }
    }
}
