//! Chip variants: register map and per-chip parameters.

use super::{Field, IrqFlags, Register, SubRegister};

/// How a received frame's raw LQI and ED bytes become a 0..=255 link
/// quality.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LqiNormalization {
    /// Scale the energy level, weighted by the correlator based LQI. The
    /// two upper bits of the raw LQI select one of four weights.
    EdWeighted {
        /// Raw ED level at and above which the energy counts as full scale.
        ed_max: u8,
    },
    /// Scale the energy level alone and ignore the raw LQI.
    RssiOnly {
        /// Raw ED level at and above which the energy counts as full scale.
        ed_max: u8,
    },
}

impl LqiNormalization {
    pub fn normalize(&self, lqi: u8, ed: u8) -> u8 {
        match *self {
            Self::EdWeighted { ed_max } => {
                let ed_max = ed_max.max(1) as u32;
                let ed = (ed as u32).min(ed_max);
                let weight = (lqi >> 6) as u32 + 1;
                (weight * ed * 0xff / (4 * ed_max)) as u8
            }
            Self::RssiOnly { ed_max } => {
                let ed_max = ed_max.max(1) as u32;
                let ed = (ed as u32).min(ed_max);
                (ed * 0xff / ed_max) as u8
            }
        }
    }
}

/// Per-chip description used by the TAL.
pub trait Variant {
    const NAME: &'static str;
    /// Expected content of the PART_NUM register.
    const PART_NUM: u8;
    /// Channels supported on page 0, one bit per channel.
    const SUPPORTED_CHANNELS: u32;
    /// Energy in dBm for an ED register value of zero.
    const RSSI_BASE_VAL_DBM: i8;
    /// ED register value mapped to the top of the 0..=255 scan scale.
    const ED_CLIP_LEVEL: u8;
    /// Output power in dBm for each value of the TX_PWR field.
    const TX_POWER_TABLE_DBM: [i8; 16];
    const LQI_NORMALIZATION: LqiNormalization;

    /// Address of a register.
    fn register(register: Register) -> u16;

    /// Location of a bit field.
    fn field(field: Field) -> SubRegister;

    /// Decode the IRQ status register.
    fn irq_from_raw(raw: u8) -> IrqFlags;

    /// Encode an IRQ mask.
    fn irq_to_raw(flags: IrqFlags) -> u8;

    /// Rescale the maximum raw ED level of a scan to 0..=255. Levels above
    /// the clip level saturate.
    fn scale_ed(raw: u8) -> u8 {
        if raw > Self::ED_CLIP_LEVEL {
            0xff
        } else {
            (raw as u16 * 0xff / Self::ED_CLIP_LEVEL.max(1) as u16) as u8
        }
    }

    /// Convert a raw ED register value to dBm.
    fn ed_to_dbm(raw: u8) -> i8 {
        (Self::RSSI_BASE_VAL_DBM as i16 + raw as i16).clamp(i8::MIN as i16, i8::MAX as i16) as i8
    }

    /// Link quality of a received frame on a 0..=255 scale.
    fn normalize_lqi(lqi: u8, ed: u8) -> u8 {
        Self::LQI_NORMALIZATION.normalize(lqi, ed)
    }

    /// Output power in dBm of a TX_PWR field value.
    fn tx_power_dbm(register_value: u8) -> i8 {
        Self::TX_POWER_TABLE_DBM[(register_value & 0x0f) as usize]
    }

    /// TX_PWR field value giving the highest power not above `dbm`. Requests
    /// below the table's range get the lowest power.
    fn tx_power_register(dbm: i8) -> u8 {
        Self::TX_POWER_TABLE_DBM
            .iter()
            .position(|&p| p <= dbm)
            .unwrap_or(Self::TX_POWER_TABLE_DBM.len() - 1) as u8
    }

    /// Returns `true` when `channel` is supported on page 0.
    fn supports_channel(channel: u8) -> bool {
        channel < 32 && Self::SUPPORTED_CHANNELS & (1 << channel) != 0
    }
}

/// Register map of the AT86RF232 SPI register file.
fn at86rf232_register(register: Register) -> u8 {
    match register {
        Register::TrxStatus => 0x01,
        Register::TrxState => 0x02,
        Register::TrxCtrl1 => 0x04,
        Register::PhyTxPwr => 0x05,
        Register::PhyRssi => 0x06,
        Register::PhyEdLevel => 0x07,
        Register::PhyCcCca => 0x08,
        Register::TrxCtrl2 => 0x0c,
        Register::IrqMask => 0x0e,
        Register::IrqStatus => 0x0f,
        Register::RxSyn => 0x15,
        Register::XahCtrl1 => 0x17,
        Register::FtnCtrl => 0x18,
        Register::PllCf => 0x1a,
        Register::PartNum => 0x1c,
        Register::ShortAddr0 => 0x20,
        Register::ShortAddr1 => 0x21,
        Register::PanId0 => 0x22,
        Register::PanId1 => 0x23,
        Register::IeeeAddr(n) => 0x24 + (n & 0x07),
        Register::XahCtrl0 => 0x2c,
        Register::CsmaSeed0 => 0x2d,
        Register::CsmaSeed1 => 0x2e,
        Register::CsmaBe => 0x2f,
    }
}

/// Bit fields of the AT86RF232, relative to its register map.
fn at86rf232_field(field: Field) -> (Register, u8, u8) {
    match field {
        Field::TrxStatus => (Register::TrxStatus, 0x1f, 0),
        Field::CcaDone => (Register::TrxStatus, 0x80, 7),
        Field::CcaStatus => (Register::TrxStatus, 0x40, 6),
        Field::TrxCmd => (Register::TrxState, 0x1f, 0),
        Field::TracStatus => (Register::TrxState, 0xe0, 5),
        Field::TxAutoCrcOn => (Register::TrxCtrl1, 0x20, 5),
        Field::IrqMaskMode => (Register::TrxCtrl1, 0x02, 1),
        Field::TxPwr => (Register::PhyTxPwr, 0x0f, 0),
        Field::RndValue => (Register::PhyRssi, 0x60, 5),
        Field::Channel => (Register::PhyCcCca, 0x1f, 0),
        Field::CcaMode => (Register::PhyCcCca, 0x60, 5),
        Field::CcaRequest => (Register::PhyCcCca, 0x80, 7),
        Field::RxSafeMode => (Register::TrxCtrl2, 0x80, 7),
        Field::RxPdtDis => (Register::RxSyn, 0x80, 7),
        Field::AackPromMode => (Register::XahCtrl1, 0x02, 1),
        Field::FtnStart => (Register::FtnCtrl, 0x80, 7),
        Field::PllCfStart => (Register::PllCf, 0x80, 7),
        Field::MaxCsmaRetries => (Register::XahCtrl0, 0x0e, 1),
        Field::MaxFrameRetries => (Register::XahCtrl0, 0xf0, 4),
        Field::CsmaSeed1 => (Register::CsmaSeed1, 0x07, 0),
        Field::AackIAmCoord => (Register::CsmaSeed1, 0x08, 3),
        Field::AackSetPd => (Register::CsmaSeed1, 0x20, 5),
        Field::MinBe => (Register::CsmaBe, 0x0f, 0),
        Field::MaxBe => (Register::CsmaBe, 0xf0, 4),
    }
}

/// Atmel AT86RF232, 2.4 GHz transceiver on SPI.
#[derive(Debug, Clone, Copy)]
pub struct At86rf232;

impl Variant for At86rf232 {
    const NAME: &'static str = "AT86RF232";
    const PART_NUM: u8 = 0x0a;
    const SUPPORTED_CHANNELS: u32 = 0x07ff_f800;
    const RSSI_BASE_VAL_DBM: i8 = -91;
    // -35 dBm
    const ED_CLIP_LEVEL: u8 = 56;
    const TX_POWER_TABLE_DBM: [i8; 16] = [3, 3, 2, 2, 1, 1, 0, -1, -2, -3, -4, -5, -7, -9, -12, -17];
    // -60 dBm
    const LQI_NORMALIZATION: LqiNormalization = LqiNormalization::EdWeighted { ed_max: 31 };

    fn register(register: Register) -> u16 {
        at86rf232_register(register) as u16
    }

    fn field(field: Field) -> SubRegister {
        let (register, mask, shift) = at86rf232_field(field);
        SubRegister::new(Self::register(register), mask, shift)
    }

    fn irq_from_raw(raw: u8) -> IrqFlags {
        let mut flags = IrqFlags::from_bits_truncate(raw as u16);
        // AWAKE_END shares its bit with CCA_ED_DONE.
        if flags.contains(IrqFlags::CCA_ED_DONE) {
            flags |= IrqFlags::AWAKE;
        }
        flags
    }

    fn irq_to_raw(flags: IrqFlags) -> u8 {
        let mut raw = (flags.bits() & 0xff) as u8;
        if flags.contains(IrqFlags::AWAKE) {
            raw |= IrqFlags::CCA_ED_DONE.bits() as u8;
        }
        raw
    }
}

/// Atmel ATmega256RFR2 family, 2.4 GHz transceiver integrated in the MCU and
/// memory mapped at 0x140.
#[derive(Debug, Clone, Copy)]
pub struct AtmegaRfr2;

const RFR2_IRQ_RX_END: u8 = 0x08;
const RFR2_IRQ_TX_END: u8 = 0x40;
const RFR2_IRQ_AWAKE: u8 = 0x80;

impl Variant for AtmegaRfr2 {
    const NAME: &'static str = "ATmegaRFR2";
    const PART_NUM: u8 = 0x94;
    const SUPPORTED_CHANNELS: u32 = 0x07ff_f800;
    const RSSI_BASE_VAL_DBM: i8 = -90;
    // -35 dBm
    const ED_CLIP_LEVEL: u8 = 55;
    const TX_POWER_TABLE_DBM: [i8; 16] = [4, 3, 3, 2, 2, 1, 1, -1, -2, -3, -4, -5, -7, -9, -12, -17];
    // -60 dBm
    const LQI_NORMALIZATION: LqiNormalization = LqiNormalization::EdWeighted { ed_max: 30 };

    fn register(register: Register) -> u16 {
        0x140 + at86rf232_register(register) as u16
    }

    fn field(field: Field) -> SubRegister {
        let (register, mask, shift) = at86rf232_field(field);
        SubRegister::new(Self::register(register), mask, shift)
    }

    fn irq_from_raw(raw: u8) -> IrqFlags {
        let mut flags = IrqFlags::from_bits_truncate((raw & 0x37) as u16);
        if raw & (RFR2_IRQ_RX_END | RFR2_IRQ_TX_END) != 0 {
            flags |= IrqFlags::TRX_END;
        }
        if raw & RFR2_IRQ_AWAKE != 0 {
            flags |= IrqFlags::AWAKE;
        }
        flags
    }

    fn irq_to_raw(flags: IrqFlags) -> u8 {
        let mut raw = (flags.bits() & 0x37) as u8;
        if flags.contains(IrqFlags::TRX_END) {
            raw |= RFR2_IRQ_RX_END | RFR2_IRQ_TX_END;
        }
        if flags.contains(IrqFlags::AWAKE) {
            raw |= RFR2_IRQ_AWAKE;
        }
        raw
    }
}

#[cfg(test)]
mod tests {
    use std::vec::Vec;

    use super::*;

    #[test]
    fn register_maps() {
        assert_eq!(At86rf232::register(Register::IrqStatus), 0x0f);
        assert_eq!(AtmegaRfr2::register(Register::IrqStatus), 0x14f);
        assert_eq!(At86rf232::register(Register::IeeeAddr(7)), 0x2b);
        assert_eq!(
            At86rf232::field(Field::TracStatus),
            SubRegister::new(0x02, 0xe0, 5)
        );
        assert_eq!(
            AtmegaRfr2::field(Field::MaxBe),
            SubRegister::new(0x16f, 0xf0, 4)
        );
    }

    #[test]
    fn irq_layouts() {
        let flags = At86rf232::irq_from_raw(0x48);
        assert!(flags.contains(IrqFlags::TRX_END | IrqFlags::TRX_UR));
        assert!(At86rf232::irq_from_raw(0x10).contains(IrqFlags::AWAKE));

        assert_eq!(AtmegaRfr2::irq_from_raw(0x40), IrqFlags::TRX_END);
        assert_eq!(AtmegaRfr2::irq_from_raw(0x80), IrqFlags::AWAKE);
        assert_eq!(AtmegaRfr2::irq_to_raw(IrqFlags::TRX_END), 0x48);
        assert!(!AtmegaRfr2::irq_from_raw(0x48).contains(IrqFlags::TRX_UR));
    }

    #[test]
    fn ed_scaling() {
        assert_eq!(At86rf232::scale_ed(0), 0);
        assert_eq!(At86rf232::scale_ed(28), 127);
        assert_eq!(At86rf232::scale_ed(56), 0xff);
        assert_eq!(At86rf232::scale_ed(57), 0xff);
        assert_eq!(AtmegaRfr2::scale_ed(55), 0xff);

        let scaled: Vec<u8> = (0..=u8::MAX).map(At86rf232::scale_ed).collect();
        assert!(scaled.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(At86rf232::ed_to_dbm(0), -91);
        assert_eq!(AtmegaRfr2::ed_to_dbm(30), -60);
    }

    #[test]
    fn tx_power() {
        assert_eq!(At86rf232::tx_power_register(3), 0);
        assert_eq!(At86rf232::tx_power_register(10), 0);
        assert_eq!(At86rf232::tx_power_register(0), 6);
        assert_eq!(At86rf232::tx_power_register(-6), 12);
        assert_eq!(At86rf232::tx_power_register(-30), 15);
        assert_eq!(At86rf232::tx_power_dbm(6), 0);
        assert_eq!(AtmegaRfr2::tx_power_dbm(0), 4);
    }

    #[test]
    fn lqi_normalization() {
        let norm = LqiNormalization::EdWeighted { ed_max: 31 };
        assert_eq!(norm.normalize(0xff, 31), 0xff);
        assert_eq!(norm.normalize(0xff, 200), 0xff);
        assert_eq!(norm.normalize(0x00, 31), 63);
        assert_eq!(norm.normalize(0xff, 0), 0);

        let norm = LqiNormalization::RssiOnly { ed_max: 30 };
        assert_eq!(norm.normalize(0, 15), 127);
        assert_eq!(norm.normalize(0xff, 30), 0xff);

        assert_eq!(At86rf232::normalize_lqi(0xff, 40), 0xff);
    }

    #[test]
    fn channels() {
        assert!(At86rf232::supports_channel(11));
        assert!(At86rf232::supports_channel(26));
        assert!(!At86rf232::supports_channel(10));
        assert!(!At86rf232::supports_channel(27));
        assert!(!At86rf232::supports_channel(40));
    }
}
