//! Build-time defaults and runtime switches of the TAL.
//!
//! The defaults are generated by `build.rs` and can be overridden with `TAL_*`
//! environment variables at build time, e.g. `TAL_MAX_FRAME_RETRIES=5`. Tests
//! always see the values of the fallback module so that they do not depend on
//! the environment of the build.

#[cfg(not(test))]
mod generated {
    include!(concat!(env!("OUT_DIR"), "/config.rs"));
}


pub use generated::*;

/// Which engine performs unslotted CSMA-CA.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[derive(Debug, PartialEq, Clone, Copy, Default)]
pub enum CsmaEngine {
    /// The transceiver's extended operating mode (TX_ARET) performs backoff,
    /// CCA and retransmissions.
    #[default]
    Hardware,
    /// The TAL draws backoffs, triggers CCAs and retries in software, and
    /// only uses the transceiver to send a single attempt.
    Software,
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct TalConfig {
    /// Engine used for unslotted CSMA-CA.
    pub csma_engine: CsmaEngine,
    /// Keep the receiver on while a software backoff is running.
    pub rx_during_backoff: bool,
    /// Periodically run filter tuning and PLL calibration.
    pub periodic_calibration: bool,
    /// Bound of the incoming frame queue, below its static capacity.
    pub queue_capacity: Option<usize>,
}

impl Default for TalConfig {
    fn default() -> Self {
        Self {
            csma_engine: CsmaEngine::default(),
            rx_during_backoff: true,
            periodic_calibration: false,
            queue_capacity: None,
        }
    }
}
