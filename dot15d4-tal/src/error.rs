use crate::trx::{TrxCommand, TrxStatus};

/// Errors returned by the TAL entry points.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The TAL is busy with a transmission, a CSMA-CA sequence or an ED scan.
    Busy,
    /// The transceiver sleeps.
    TrxAsleep,
    /// The transceiver is already awake.
    TrxAwake,
    /// Slotted CSMA-CA could not start because beacon tracking was lost, or
    /// an indirect transmission would collide with the next beacon.
    ChannelAccessFailure,
    InvalidParameter,
    ReadOnly,
    /// The transceiver could not be identified.
    Failure,
    /// The transceiver or the driver is in a state it cannot continue from.
    Fault(Fault),
}

impl From<Fault> for Error {
    fn from(fault: Fault) -> Self {
        Self::Fault(fault)
    }
}

/// Hardware faults.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Fault {
    /// A command that is not allowed in the current state.
    IllegalTransition {
        status: TrxStatus,
        command: TrxCommand,
    },
    /// The PLL did not lock.
    PllLockTimeout,
    /// The status register kept reporting a state transition.
    TransitionTimeout,
    /// The transceiver did not signal the end of its wake-up.
    WakeupTimeout,
    /// The transceiver stayed busy with a frame.
    BusyTimeout,
    /// The status register holds a code that is not a state.
    UnknownStatus(u8),
}

/// Outcome of a transmission, reported to [`UpperLayer::tx_done`].
///
/// [`UpperLayer::tx_done`]: crate::UpperLayer::tx_done
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TxStatus {
    Success,
    /// Acknowledged, and the acknowledgment announced pending data.
    FramePending,
    ChannelAccessFailure,
    NoAck,
    /// Frame buffer underrun during transmission.
    Invalid,
    /// Slotted CSMA-CA lost the beacon.
    NoBeaconTracking,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Busy => write!(f, "busy"),
            Self::TrxAsleep => write!(f, "transceiver asleep"),
            Self::TrxAwake => write!(f, "transceiver awake"),
            Self::ChannelAccessFailure => write!(f, "channel access failure"),
            Self::InvalidParameter => write!(f, "invalid parameter"),
            Self::ReadOnly => write!(f, "read-only attribute"),
            Self::Failure => write!(f, "failure"),
            Self::Fault(fault) => write!(f, "fault: {:?}", fault),
        }
    }
}
