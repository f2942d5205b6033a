#![allow(dead_code)]

// Constants from section 11.3, Table 11-1, PHY constants
/// The maximum PSDU size (in octets) the PHY shall be able to receive.
pub const MAX_PHY_PACKET_SIZE: u8 = 127;
/// RX-to-TX or TX-to-RX turnaround time (in symbol periods).
pub const TURNAROUND_TIME: u32 = 12;
/// The time required to perform CCA detection in symbol periods.
pub const CCA_TIME: u32 = 8;

// Constants of section 8.4.2, Table 8-93, MAC constants
/// The number of symbols forming a superframe slot when the superframe order is
/// equal to zero.
pub const BASE_SLOT_DURATION: u32 = 60;
/// The number of slots contained in any superframe.
pub const NUM_SUPERFRAME_SLOTS: u32 = 16;
/// The number of symbols forming a superframe when the superframe order is
/// equal to zero.
pub const BASE_SUPERFRAME_DURATION: u32 = BASE_SLOT_DURATION * NUM_SUPERFRAME_SLOTS;
/// The number of consecutive lost beacons that will cause the MAC sublayer of a
/// receiving device to declare a loss of synchronization.
pub const MAX_LOST_BEACONS: u32 = 4;
/// The maximum size of an MPDU, in octets, that can be followed by a SIFS
/// period.
pub const MAX_SIFS_FRAME_SIZE: u8 = 18;
/// The number of symbols forming the basic time period used by the CSMA-CA
/// algorithm.
pub const UNIT_BACKOFF_PERIOD: u32 = TURNAROUND_TIME + CCA_TIME;

// PHY PIB attribute values for the 2.4 GHz O-QPSK PHY
/// Minimum number of symbols forming a LIFS period.
pub const MIN_LIFS_PERIOD: u32 = 40;
/// Minimum number of symbols forming a SIFS period.
pub const MIN_SIFS_PERIOD: u32 = 12;
/// Number of symbols per octet.
pub const SYMBOLS_PER_OCTET: u32 = 2;
/// Symbol duration in µs.
pub const SYMBOL_DURATION_US: u32 = 16;
/// Preamble (4 octets), SFD (1 octet) and PHR (1 octet) minus the PHR counted
/// in the frame length.
pub const PHY_OVERHEAD: u32 = 5;
/// Length of an immediate acknowledgment PSDU.
pub const ACK_FRAME_LEN: u32 = 5;
/// Beacon order meaning "no beacons".
pub const NON_BEACON_ORDER: u8 = 15;
/// Largest CCA mode value.
pub const MAX_CCA_MODE: u8 = 3;

/// Bounds of the PIB CSMA parameters.
pub const MIN_MAX_BE: u8 = 3;
pub const MAX_MAX_BE: u8 = 8;
pub const MAX_MAX_CSMA_BACKOFFS: u8 = 5;
pub const MAX_MAX_FRAME_RETRIES: u8 = 7;

// Transceiver timing (µs)
/// Maximum time the PLL needs to lock.
pub const PLL_LOCK_DURATION_MAX_US: u32 = 250;
/// Typical time to wake from SLEEP to TRX_OFF.
pub const SLEEP_TO_TRX_OFF_TYP_US: u32 = 210;
/// Maximum time to wake from SLEEP to TRX_OFF.
pub const SLEEP_TO_TRX_OFF_MAX_US: u32 = 1000;
/// Maximum time between power on and an available clock.
pub const P_ON_TO_CLKM_AVAILABLE_MAX_US: u32 = 1000;
/// Width of the reset pulse.
pub const RST_PULSE_WIDTH_US: u32 = 10;
/// Time needed to prepare a CCA measurement ahead of its slot.
pub const CCA_PREPARATION_DURATION_US: u32 = 50;
/// Duration of one CCA measurement (8 symbols).
pub const CCA_DURATION_US: u32 = CCA_TIME * SYMBOL_DURATION_US;
/// Wait between two polls of a transceiver status register.
pub const TRX_POLL_WAIT_TIME_US: u32 = 100;
/// Filter tuning duration.
pub const FTN_CALIBRATION_DURATION_US: u32 = 25;
/// Wait before driving SLP_TR high after requesting SLEEP.
pub const TRX_OFF_TO_SLEEP_TIME_US: u32 = 1;
/// Delay between the end of a frame on air and the TRX_END interrupt.
pub const TRX_IRQ_DELAY_US: u32 = 9;
/// Longest frame on air: preamble, SFD, PHR and 127 octets.
pub const MAX_FRAME_DURATION_US: u32 =
    (PHY_OVERHEAD + 1 + MAX_PHY_PACKET_SIZE as u32) * SYMBOLS_PER_OCTET * SYMBOL_DURATION_US;

// Slotted CSMA guard times (µs)
/// Guard time before a CCA that has to be prepared.
pub const CCA_GUARD_DURATION_US: u32 = 1000;
/// Margin added to the beacon-loss timeout.
pub const CSMA_BEACON_LOSS_GUARD_TIME_US: u32 = 2000;
/// Guard time at the end of the CAP before the next beacon.
pub const PRE_BEACON_GUARD_TIME_US: u32 = 1000;
/// Time the radio needs to wake before a beacon, in symbols.
pub const RADIO_WAKEUP_TIME_SYM: u32 = 300 / SYMBOL_DURATION_US;

// ED scan
/// Duration of a single ED measurement, in symbols.
pub const ED_SAMPLE_DURATION_SYM: u32 = 8;
/// Largest scan duration code accepted by the ED scan.
pub const MAX_SCAN_DURATION: u8 = 14;

// Symbol time
/// Mask keeping symbol times within 28 bits.
pub const SYMBOL_MASK: u32 = 0x0FFF_FFFF;
