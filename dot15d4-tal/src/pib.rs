#![allow(dead_code)]

use crate::config::*;
use crate::constants::*;
use crate::error::Error;
use crate::time::SymbolTime;

/// Subset of the PAN Information Base owned by the TAL.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, PartialEq)]
pub struct Pib {
    /// The RF channel used for transmissions and receptions.
    pub(crate) current_channel: u8,
    /// The channel page. Only page 0 (2.4 GHz O-QPSK) is supported.
    pub(crate) current_page: u8,
    /// The identifier of the PAN on which the device is operating.
    pub(crate) pan_id: u16,
    /// The short address of the device in its PAN.
    pub(crate) short_address: u16,
    /// The extended address of the device.
    pub(crate) ieee_address: u64,
    /// Output power in dBm, as achieved by the transceiver.
    pub(crate) transmit_power: i8,
    /// CCA mode, 0 to 3.
    pub(crate) cca_mode: u8,
    /// The minimum value of the backoff exponent (BE) in the CSMA-CA
    /// algorithm.
    pub(crate) min_be: u8,
    /// The maximum value of the backoff exponent, BE, in the CSMA-CA
    /// algorithm.
    pub(crate) max_be: u8,
    /// The maximum number of backoffs the CSMA-CA algorithm will attempt
    /// before declaring a channel access failure.
    pub(crate) max_csma_backoffs: u8,
    /// The maximum number of retries allowed after a transmission failure.
    pub(crate) max_frame_retries: u8,
    /// The device is the coordinator of its PAN.
    pub(crate) pan_coordinator: bool,
    /// Battery life extension: slotted CSMA-CA caps its first backoff
    /// exponent at 2.
    pub(crate) batt_life_ext: bool,
    /// How often the coordinator transmits a beacon. 15 means no beacons.
    pub(crate) beacon_order: u8,
    /// Length of the active portion of the superframe.
    pub(crate) superframe_order: u8,
    /// Time of the last transmitted or received beacon.
    pub(crate) beacon_tx_time: SymbolTime,
    /// Receive every frame, without filtering or acknowledgment.
    pub(crate) promiscuous_mode: bool,
}

impl Default for Pib {
    fn default() -> Self {
        Self {
            current_channel: DEFAULT_CHANNEL,
            current_page: 0,
            pan_id: DEFAULT_PAN_ID,
            short_address: DEFAULT_SHORT_ADDRESS,
            ieee_address: 0,
            transmit_power: TRANSMIT_POWER_DBM,
            cca_mode: 1,
            min_be: MIN_BE.min(MAX_BE),
            max_be: MAX_BE,
            max_csma_backoffs: MAX_CSMA_BACKOFFS,
            max_frame_retries: MAX_FRAME_RETRIES,
            pan_coordinator: false,
            batt_life_ext: false,
            beacon_order: NON_BEACON_ORDER,
            superframe_order: NON_BEACON_ORDER,
            beacon_tx_time: SymbolTime::from_symbols(0),
            promiscuous_mode: false,
        }
    }
}

impl Pib {
    /// Beacon interval in symbols.
    pub(crate) fn beacon_interval_symbols(&self) -> u32 {
        BASE_SUPERFRAME_DURATION << self.beacon_order.min(14)
    }

    /// Superframe duration in symbols.
    pub(crate) fn superframe_duration_symbols(&self) -> u32 {
        BASE_SUPERFRAME_DURATION << self.superframe_order.min(14)
    }

    /// Returns `true` on a beacon-enabled network.
    pub(crate) fn beacon_enabled(&self) -> bool {
        self.beacon_order < NON_BEACON_ORDER
    }

    /// Store an attribute that needs no transceiver access, after checking
    /// its range.
    pub(crate) fn apply(&mut self, attribute: PibAttribute) -> Result<(), Error> {
        match attribute {
            PibAttribute::CurrentChannel(channel) => self.current_channel = channel,
            PibAttribute::CurrentPage(0) => self.current_page = 0,
            PibAttribute::CurrentPage(_) => return Err(Error::InvalidParameter),
            PibAttribute::PanId(pan_id) => self.pan_id = pan_id,
            PibAttribute::ShortAddress(address) => self.short_address = address,
            PibAttribute::IeeeAddress(address) => self.ieee_address = address,
            PibAttribute::TransmitPower(dbm) => self.transmit_power = dbm,
            PibAttribute::CcaMode(mode) if mode <= MAX_CCA_MODE => self.cca_mode = mode,
            PibAttribute::CcaMode(_) => return Err(Error::InvalidParameter),
            PibAttribute::MinBe(min_be) => self.min_be = min_be.min(self.max_be),
            PibAttribute::MaxBe(max_be) if (MIN_MAX_BE..=MAX_MAX_BE).contains(&max_be) => {
                self.max_be = max_be;
                self.min_be = self.min_be.min(max_be);
            }
            PibAttribute::MaxBe(_) => return Err(Error::InvalidParameter),
            PibAttribute::MaxCsmaBackoffs(n) if n <= MAX_MAX_CSMA_BACKOFFS => {
                self.max_csma_backoffs = n
            }
            PibAttribute::MaxCsmaBackoffs(_) => return Err(Error::InvalidParameter),
            PibAttribute::MaxFrameRetries(n) if n <= MAX_MAX_FRAME_RETRIES => {
                self.max_frame_retries = n
            }
            PibAttribute::MaxFrameRetries(_) => return Err(Error::InvalidParameter),
            PibAttribute::PanCoordinator(coordinator) => self.pan_coordinator = coordinator,
            PibAttribute::BattLifeExt(enabled) => self.batt_life_ext = enabled,
            PibAttribute::BeaconOrder(order) if order <= NON_BEACON_ORDER => {
                self.beacon_order = order
            }
            PibAttribute::SuperframeOrder(order) if order <= NON_BEACON_ORDER => {
                self.superframe_order = order
            }
            PibAttribute::BeaconOrder(_) | PibAttribute::SuperframeOrder(_) => {
                return Err(Error::InvalidParameter)
            }
            PibAttribute::BeaconTxTime(time) => self.beacon_tx_time = time,
            PibAttribute::PromiscuousMode(enabled) => self.promiscuous_mode = enabled,
            PibAttribute::SupportedChannels(_) => return Err(Error::ReadOnly),
        }

        Ok(())
    }

    /// Read an attribute. `supported_channels` comes from the chip variant.
    pub(crate) fn get(&self, id: PibId, supported_channels: u32) -> PibAttribute {
        match id {
            PibId::CurrentChannel => PibAttribute::CurrentChannel(self.current_channel),
            PibId::CurrentPage => PibAttribute::CurrentPage(self.current_page),
            PibId::PanId => PibAttribute::PanId(self.pan_id),
            PibId::ShortAddress => PibAttribute::ShortAddress(self.short_address),
            PibId::IeeeAddress => PibAttribute::IeeeAddress(self.ieee_address),
            PibId::TransmitPower => PibAttribute::TransmitPower(self.transmit_power),
            PibId::CcaMode => PibAttribute::CcaMode(self.cca_mode),
            PibId::MinBe => PibAttribute::MinBe(self.min_be),
            PibId::MaxBe => PibAttribute::MaxBe(self.max_be),
            PibId::MaxCsmaBackoffs => PibAttribute::MaxCsmaBackoffs(self.max_csma_backoffs),
            PibId::MaxFrameRetries => PibAttribute::MaxFrameRetries(self.max_frame_retries),
            PibId::PanCoordinator => PibAttribute::PanCoordinator(self.pan_coordinator),
            PibId::BattLifeExt => PibAttribute::BattLifeExt(self.batt_life_ext),
            PibId::BeaconOrder => PibAttribute::BeaconOrder(self.beacon_order),
            PibId::SuperframeOrder => PibAttribute::SuperframeOrder(self.superframe_order),
            PibId::BeaconTxTime => PibAttribute::BeaconTxTime(self.beacon_tx_time),
            PibId::PromiscuousMode => PibAttribute::PromiscuousMode(self.promiscuous_mode),
            PibId::SupportedChannels => PibAttribute::SupportedChannels(supported_channels),
        }
    }
}

/// Attributes that may be written by an upper layer, with their value.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PibAttribute {
    CurrentChannel(u8),
    CurrentPage(u8),
    PanId(u16),
    ShortAddress(u16),
    IeeeAddress(u64),
    /// Output power in dBm. The closest power the transceiver supports, not
    /// above the request, is used.
    TransmitPower(i8),
    CcaMode(u8),
    MinBe(u8),
    MaxBe(u8),
    MaxCsmaBackoffs(u8),
    MaxFrameRetries(u8),
    PanCoordinator(bool),
    BattLifeExt(bool),
    BeaconOrder(u8),
    SuperframeOrder(u8),
    BeaconTxTime(SymbolTime),
    PromiscuousMode(bool),
    /// Read-only.
    SupportedChannels(u32),
}

/// Identifier of a [`PibAttribute`], used to read it.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PibId {
    CurrentChannel,
    CurrentPage,
    PanId,
    ShortAddress,
    IeeeAddress,
    TransmitPower,
    CcaMode,
    MinBe,
    MaxBe,
    MaxCsmaBackoffs,
    MaxFrameRetries,
    PanCoordinator,
    BattLifeExt,
    BeaconOrder,
    SuperframeOrder,
    BeaconTxTime,
    PromiscuousMode,
    SupportedChannels,
}

impl PibAttribute {
    pub fn id(&self) -> PibId {
        match self {
            Self::CurrentChannel(_) => PibId::CurrentChannel,
            Self::CurrentPage(_) => PibId::CurrentPage,
            Self::PanId(_) => PibId::PanId,
            Self::ShortAddress(_) => PibId::ShortAddress,
            Self::IeeeAddress(_) => PibId::IeeeAddress,
            Self::TransmitPower(_) => PibId::TransmitPower,
            Self::CcaMode(_) => PibId::CcaMode,
            Self::MinBe(_) => PibId::MinBe,
            Self::MaxBe(_) => PibId::MaxBe,
            Self::MaxCsmaBackoffs(_) => PibId::MaxCsmaBackoffs,
            Self::MaxFrameRetries(_) => PibId::MaxFrameRetries,
            Self::PanCoordinator(_) => PibId::PanCoordinator,
            Self::BattLifeExt(_) => PibId::BattLifeExt,
            Self::BeaconOrder(_) => PibId::BeaconOrder,
            Self::SuperframeOrder(_) => PibId::SuperframeOrder,
            Self::BeaconTxTime(_) => PibId::BeaconTxTime,
            Self::PromiscuousMode(_) => PibId::PromiscuousMode,
            Self::SupportedChannels(_) => PibId::SupportedChannels,
        }
    }

    /// Returns `true` for attributes that are only kept by the TAL and never
    /// written to the transceiver.
    pub(crate) fn is_local(&self) -> bool {
        matches!(
            self,
            Self::MaxCsmaBackoffs(_)
                | Self::MaxFrameRetries(_)
                | Self::BattLifeExt(_)
                | Self::BeaconOrder(_)
                | Self::SuperframeOrder(_)
                | Self::BeaconTxTime(_)
        )
    }
}
