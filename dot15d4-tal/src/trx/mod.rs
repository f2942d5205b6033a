//! Register-level access to the transceiver.
//!
//! The TAL never deals with addresses or bit positions directly. It names a
//! [`Register`] or a [`Field`], and the chip [`Variant`] of the
//! [`Transceiver`] maps it to an address, mask and shift.

mod status;
mod variant;

pub use status::*;
pub use variant::*;

#[cfg(test)]
pub mod test;

/// Registers accessed by the TAL.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Register {
    TrxStatus,
    TrxState,
    TrxCtrl1,
    PhyTxPwr,
    PhyRssi,
    PhyEdLevel,
    PhyCcCca,
    TrxCtrl2,
    IrqMask,
    IrqStatus,
    RxSyn,
    XahCtrl1,
    FtnCtrl,
    PllCf,
    PartNum,
    ShortAddr0,
    ShortAddr1,
    PanId0,
    PanId1,
    /// One of the eight octets of the extended address, least significant
    /// first.
    IeeeAddr(u8),
    XahCtrl0,
    CsmaSeed0,
    CsmaSeed1,
    CsmaBe,
}

/// Bit fields accessed by the TAL.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Field {
    TrxStatus,
    CcaDone,
    CcaStatus,
    TrxCmd,
    TracStatus,
    TxAutoCrcOn,
    IrqMaskMode,
    TxPwr,
    RndValue,
    Channel,
    CcaMode,
    CcaRequest,
    RxSafeMode,
    RxPdtDis,
    AackPromMode,
    FtnStart,
    PllCfStart,
    MaxCsmaRetries,
    MaxFrameRetries,
    CsmaSeed1,
    AackIAmCoord,
    AackSetPd,
    MinBe,
    MaxBe,
}

/// Location of a bit field: register address, mask and shift.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SubRegister {
    pub address: u16,
    pub mask: u8,
    pub shift: u8,
}

impl SubRegister {
    pub const fn new(address: u16, mask: u8, shift: u8) -> Self {
        Self {
            address,
            mask,
            shift,
        }
    }
}

/// Hardware access the TAL needs from the platform: the SPI (or memory
/// mapped) register file, the frame buffer and the control lines.
///
/// Implementations are expected to be cheap, non-blocking accessors; every
/// wait the TAL performs is bounded by the TAL itself.
pub trait Transceiver {
    type Variant: Variant;

    /// Read a register.
    fn read(&mut self, address: u16) -> u8;

    /// Write a register.
    fn write(&mut self, address: u16, value: u8);

    /// Read `buffer.len()` octets from the frame buffer, starting with the
    /// PHR. Reading releases the dynamic frame buffer protection.
    fn read_frame_buffer(&mut self, buffer: &mut [u8]);

    /// Write a frame, PHR first, to the frame buffer.
    fn write_frame_buffer(&mut self, frame: &[u8]);

    /// Drive the reset line. `true` holds the transceiver in reset.
    fn set_reset(&mut self, asserted: bool);

    /// Drive the SLP_TR line, used both to start a transmission and to enter
    /// or leave SLEEP.
    fn set_slp_tr(&mut self, high: bool);

    /// Enable the transceiver interrupt line at the host.
    fn irq_enable(&mut self);

    /// Disable the transceiver interrupt line at the host.
    fn irq_disable(&mut self);

    /// Returns whether the interrupt line is enabled at the host.
    fn irq_is_enabled(&self) -> bool;

    /// Clear a latched interrupt at the host.
    fn irq_clear(&mut self);

    /// Returns whether the interrupt line is currently asserted.
    fn irq_pending(&mut self) -> bool;

    /// Busy-wait for `us` microseconds.
    fn delay_us(&mut self, us: u32);

    /// Read a named register.
    fn read_reg(&mut self, register: Register) -> u8 {
        let address = Self::Variant::register(register);
        self.read(address)
    }

    /// Write a named register.
    fn write_reg(&mut self, register: Register, value: u8) {
        let address = Self::Variant::register(register);
        self.write(address, value);
    }

    /// Read a bit field.
    fn read_field(&mut self, field: Field) -> u8 {
        let sr = Self::Variant::field(field);
        (self.read(sr.address) & sr.mask) >> sr.shift
    }

    /// Read-modify-write a bit field.
    fn write_field(&mut self, field: Field, value: u8) {
        let sr = Self::Variant::field(field);
        let current = self.read(sr.address) & !sr.mask;
        self.write(sr.address, current | ((value << sr.shift) & sr.mask));
    }

    /// Read and clear the interrupt causes.
    fn read_irq(&mut self) -> IrqFlags {
        let raw = self.read_reg(Register::IrqStatus);
        Self::Variant::irq_from_raw(raw)
    }

    /// Program the interrupt mask.
    fn write_irq_mask(&mut self, flags: IrqFlags) {
        let raw = Self::Variant::irq_to_raw(flags);
        self.write_reg(Register::IrqMask, raw);
    }
}
