//! Transceiver state, command and completion codes, and interrupt causes.

/// Operating state of the transceiver, as read back from its status
/// register.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TrxStatus {
    POn = 0x00,
    BusyRx = 0x01,
    BusyTx = 0x02,
    RxOn = 0x06,
    TrxOff = 0x08,
    PllOn = 0x09,
    Sleep = 0x0f,
    BusyRxAack = 0x11,
    BusyTxAret = 0x12,
    RxAackOn = 0x16,
    TxAretOn = 0x19,
    StateTransitionInProgress = 0x1f,
}

impl TrxStatus {
    /// Returns `true` while a frame or an acknowledgment is on air.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::BusyRx | Self::BusyTx | Self::BusyRxAack | Self::BusyTxAret
        )
    }

    /// Returns `true` in the states where the PLL is locked and the radio is
    /// ready to receive or transmit.
    pub fn is_pll_active(&self) -> bool {
        matches!(
            self,
            Self::PllOn | Self::RxOn | Self::RxAackOn | Self::TxAretOn
        )
    }
}

impl TryFrom<u8> for TrxStatus {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x00 => Self::POn,
            0x01 => Self::BusyRx,
            0x02 => Self::BusyTx,
            0x06 => Self::RxOn,
            0x08 => Self::TrxOff,
            0x09 => Self::PllOn,
            0x0f => Self::Sleep,
            0x11 => Self::BusyRxAack,
            0x12 => Self::BusyTxAret,
            0x16 => Self::RxAackOn,
            0x19 => Self::TxAretOn,
            0x1f => Self::StateTransitionInProgress,
            other => return Err(other),
        })
    }
}

/// Command written to the transceiver state register. `Sleep` is never
/// written; it is executed with the SLP_TR line.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TrxCommand {
    Nop = 0x00,
    TxStart = 0x02,
    ForceTrxOff = 0x03,
    ForcePllOn = 0x04,
    RxOn = 0x06,
    TrxOff = 0x08,
    PllOn = 0x09,
    Sleep = 0x0f,
    RxAackOn = 0x16,
    TxAretOn = 0x19,
}

/// Completion code of an extended operating mode transaction.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TracStatus {
    Success = 0,
    SuccessDataPending = 1,
    SuccessWaitForAck = 2,
    ChannelAccessFailure = 3,
    NoAck = 5,
    Invalid = 7,
}

impl From<u8> for TracStatus {
    /// Reserved codes are reported as `Invalid`.
    fn from(value: u8) -> Self {
        match value {
            0 => Self::Success,
            1 => Self::SuccessDataPending,
            2 => Self::SuccessWaitForAck,
            3 => Self::ChannelAccessFailure,
            5 => Self::NoAck,
            _ => Self::Invalid,
        }
    }
}

bitflags::bitflags! {
    /// Interrupt causes, independent of how a variant lays them out in its
    /// IRQ status register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IrqFlags: u16 {
        const PLL_LOCK = 1 << 0;
        const PLL_UNLOCK = 1 << 1;
        const RX_START = 1 << 2;
        /// End of a received or transmitted frame.
        const TRX_END = 1 << 3;
        const CCA_ED_DONE = 1 << 4;
        const AMI = 1 << 5;
        /// Frame buffer underrun (TX) or overrun (RX).
        const TRX_UR = 1 << 6;
        const BAT_LOW = 1 << 7;
        /// Wake-up from SLEEP completed.
        const AWAKE = 1 << 8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trip_and_unknown() {
        for raw in 0u8..=0x1f {
            if let Ok(status) = TrxStatus::try_from(raw) {
                assert_eq!(status as u8, raw);
            }
        }
        assert_eq!(TrxStatus::try_from(0x1c), Err(0x1c));
        assert!(TrxStatus::BusyTxAret.is_busy());
        assert!(!TrxStatus::RxAackOn.is_busy());
        assert!(TrxStatus::TxAretOn.is_pll_active());
        assert!(!TrxStatus::TrxOff.is_pll_active());
    }

    #[test]
    fn trac_reserved_is_invalid() {
        assert_eq!(TracStatus::from(4), TracStatus::Invalid);
        assert_eq!(TracStatus::from(6), TracStatus::Invalid);
        assert_eq!(TracStatus::from(5), TracStatus::NoAck);
    }

    #[cfg(feature = "fuzz")]
    #[test]
    fn arbitrary_status_is_a_known_code() {
        use arbitrary::{Arbitrary, Unstructured};

        let bytes: std::vec::Vec<u8> = (0..=u8::MAX).rev().collect();
        let mut u = Unstructured::new(&bytes);
        for _ in 0..64 {
            let status = TrxStatus::arbitrary(&mut u).unwrap();
            assert_eq!(TrxStatus::try_from(status as u8), Ok(status));
        }
    }
}
