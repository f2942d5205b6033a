//! IEEE 802.15.4 Frame Control field reader and representation.

use super::{AddressingMode, Error, Result};

/// IEEE 802.15.4 frame type.
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum FrameType {
    /// Beacon frame.
    Beacon = 0b000,
    /// Data frame.
    Data = 0b001,
    /// Acknowledgment frame.
    Ack = 0b010,
    /// MAC command frame.
    MacCommand = 0b011,
    /// Multipurpose frame.
    Multipurpose = 0b101,
    /// Fragment or FRAK frame.
    FragmentOrFrak = 0b110,
    /// Extended frame.
    Extended = 0b111,
    /// Reserved value.
    Unknown,
}

impl From<u8> for FrameType {
    fn from(value: u8) -> Self {
        match value {
            0b000 => Self::Beacon,
            0b001 => Self::Data,
            0b010 => Self::Ack,
            0b011 => Self::MacCommand,
            0b101 => Self::Multipurpose,
            0b110 => Self::FragmentOrFrak,
            0b111 => Self::Extended,
            _ => Self::Unknown,
        }
    }
}

/// IEEE 802.15.4 frame version.
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum FrameVersion {
    /// IEEE 802.15.4-2003.
    Ieee802154_2003 = 0b00,
    /// IEEE 802.15.4-2006.
    Ieee802154_2006 = 0b01,
    /// IEEE 802.15.4-2015 and later.
    Ieee802154_2020 = 0b10,
    /// Reserved value.
    Unknown,
}

impl From<u8> for FrameVersion {
    fn from(value: u8) -> Self {
        match value {
            0b00 => Self::Ieee802154_2003,
            0b01 => Self::Ieee802154_2006,
            0b10 => Self::Ieee802154_2020,
            _ => Self::Unknown,
        }
    }
}

/// A reader for the IEEE 802.15.4 Frame Control field.
pub struct FrameControl<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> FrameControl<T> {
    /// Create a new [`FrameControl`] reader from a given buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is too short.
    pub fn new(buffer: T) -> Result<Self> {
        let fc = Self::new_unchecked(buffer);

        if !fc.check_len() {
            return Err(Error);
        }

        Ok(fc)
    }

    /// Returns `false` if the buffer is too short to contain the Frame Control field.
    pub fn check_len(&self) -> bool {
        self.buffer.as_ref().len() >= 2
    }

    /// Create a new [`FrameControl`] reader from a given buffer without length checking.
    pub fn new_unchecked(buffer: T) -> Self {
        Self { buffer }
    }

    fn raw(&self) -> u16 {
        let b = &self.buffer.as_ref()[..2];
        u16::from_le_bytes([b[0], b[1]])
    }

    /// Return the [`FrameType`] field.
    pub fn frame_type(&self) -> FrameType {
        FrameType::from((self.raw() & 0b111) as u8)
    }

    /// Returns `true` when the security enabled field is set.
    pub fn security_enabled(&self) -> bool {
        (self.raw() >> 3) & 0b1 == 1
    }

    /// Returns `true` when the frame pending field is set.
    pub fn frame_pending(&self) -> bool {
        (self.raw() >> 4) & 0b1 == 1
    }

    /// Returns `true` when the acknowledgement request field is set.
    pub fn ack_request(&self) -> bool {
        (self.raw() >> 5) & 0b1 == 1
    }

    /// Returns `true` when the PAN ID compression field is set.
    pub fn pan_id_compression(&self) -> bool {
        (self.raw() >> 6) & 0b1 == 1
    }

    /// Returns `true` when the sequence number suppression field is set.
    pub fn sequence_number_suppression(&self) -> bool {
        (self.raw() >> 8) & 0b1 == 1
    }

    /// Returns `true` when the information element field is set.
    pub fn information_elements_present(&self) -> bool {
        (self.raw() >> 9) & 0b1 == 1
    }

    /// Return the destination [`AddressingMode`].
    pub fn dst_addressing_mode(&self) -> AddressingMode {
        AddressingMode::from(((self.raw() >> 10) & 0b11) as u8)
    }

    /// Return the [`FrameVersion`].
    pub fn frame_version(&self) -> FrameVersion {
        FrameVersion::from(((self.raw() >> 12) & 0b11) as u8)
    }

    /// Return the source [`AddressingMode`].
    pub fn src_addressing_mode(&self) -> AddressingMode {
        AddressingMode::from(((self.raw() >> 14) & 0b11) as u8)
    }

    /// Returns `true` when a sequence number follows the Frame Control field.
    pub fn has_sequence_number(&self) -> bool {
        !(self.frame_version() == FrameVersion::Ieee802154_2020
            && self.sequence_number_suppression())
    }

    /// Return the length of the addressing fields (PAN identifiers and
    /// addresses) following the sequence number.
    ///
    /// For 2003 and 2006 frames the source PAN identifier is elided when the
    /// PAN ID compression field is set and both addresses are present.
    pub fn addressing_fields_len(&self) -> usize {
        let dst = self.dst_addressing_mode();
        let src = self.src_addressing_mode();

        let dst_pan_id = if dst != AddressingMode::Absent { 2 } else { 0 };
        let src_pan_id = if src != AddressingMode::Absent
            && !(self.pan_id_compression() && dst != AddressingMode::Absent)
        {
            2
        } else {
            0
        };

        dst_pan_id + dst.size() + src_pan_id + src.size()
    }
}

impl<T: AsRef<[u8]>> core::fmt::Display for FrameControl<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{:?} (version {:?}) ar={} fp={} sec={} panc={} dst={:?} src={:?}",
            self.frame_type(),
            self.frame_version(),
            self.ack_request() as u8,
            self.frame_pending() as u8,
            self.security_enabled() as u8,
            self.pan_id_compression() as u8,
            self.dst_addressing_mode(),
            self.src_addressing_mode(),
        )
    }
}

/// A high-level representation of the IEEE 802.15.4 Frame Control field.
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameControlRepr {
    /// Frame type field
    pub frame_type: FrameType,
    /// Security enabled field
    pub security_enabled: bool,
    /// Frame pending field
    pub frame_pending: bool,
    /// Acknowledgement request field
    pub ack_request: bool,
    /// PAN ID compression field
    pub pan_id_compression: bool,
    /// Sequence number suppression field
    pub sequence_number_suppression: bool,
    /// Information element present field
    pub information_elements_present: bool,
    /// Destination addressing mode field
    pub dst_addressing_mode: AddressingMode,
    /// Source addressing mode field
    pub src_addressing_mode: AddressingMode,
    /// Frame version field
    pub frame_version: FrameVersion,
}

impl FrameControlRepr {
    /// A 2006 data frame without acknowledgement request. The PAN ID
    /// compression field is set when both addresses are present.
    pub fn data(dst: AddressingMode, src: AddressingMode) -> Self {
        Self {
            frame_type: FrameType::Data,
            security_enabled: false,
            frame_pending: false,
            ack_request: false,
            pan_id_compression: dst != AddressingMode::Absent && src != AddressingMode::Absent,
            sequence_number_suppression: false,
            information_elements_present: false,
            dst_addressing_mode: dst,
            src_addressing_mode: src,
            frame_version: FrameVersion::Ieee802154_2006,
        }
    }

    /// Parse the Frame Control field.
    pub fn parse(fc: &FrameControl<&'_ [u8]>) -> Self {
        Self {
            frame_type: fc.frame_type(),
            security_enabled: fc.security_enabled(),
            frame_pending: fc.frame_pending(),
            ack_request: fc.ack_request(),
            pan_id_compression: fc.pan_id_compression(),
            sequence_number_suppression: fc.sequence_number_suppression(),
            information_elements_present: fc.information_elements_present(),
            dst_addressing_mode: fc.dst_addressing_mode(),
            src_addressing_mode: fc.src_addressing_mode(),
            frame_version: fc.frame_version(),
        }
    }

    /// Return the two on-air octets of the Frame Control field.
    ///
    /// # Errors
    ///
    /// Returns an error for reserved frame types, frame versions or
    /// addressing modes.
    pub fn emit(&self) -> Result<[u8; 2]> {
        if self.frame_type == FrameType::Unknown
            || self.frame_version == FrameVersion::Unknown
            || self.dst_addressing_mode == AddressingMode::Unknown
            || self.src_addressing_mode == AddressingMode::Unknown
        {
            return Err(Error);
        }

        let raw = (self.frame_type as u16)
            | (self.security_enabled as u16) << 3
            | (self.frame_pending as u16) << 4
            | (self.ack_request as u16) << 5
            | (self.pan_id_compression as u16) << 6
            | (self.sequence_number_suppression as u16) << 8
            | (self.information_elements_present as u16) << 9
            | (self.dst_addressing_mode as u16) << 10
            | (self.frame_version as u16) << 12
            | (self.src_addressing_mode as u16) << 14;

        Ok(raw.to_le_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_data_frame_control() {
        let fc = FrameControl::new(&[0x61, 0x88][..]).unwrap();
        assert_eq!(fc.frame_type(), FrameType::Data);
        assert!(fc.ack_request());
        assert!(fc.pan_id_compression());
        assert!(!fc.frame_pending());
        assert!(!fc.security_enabled());
        assert_eq!(fc.dst_addressing_mode(), AddressingMode::Short);
        assert_eq!(fc.src_addressing_mode(), AddressingMode::Short);
        assert_eq!(fc.frame_version(), FrameVersion::Ieee802154_2003);
        assert!(fc.has_sequence_number());
        assert_eq!(fc.addressing_fields_len(), 6);
    }

    #[test]
    fn addressing_len_without_compression() {
        // Extended destination and source, 2006, no PAN ID compression.
        let fc = FrameControl::new(&[0x01, 0xdc][..]).unwrap();
        assert_eq!(fc.dst_addressing_mode(), AddressingMode::Extended);
        assert_eq!(fc.src_addressing_mode(), AddressingMode::Extended);
        assert_eq!(fc.frame_version(), FrameVersion::Ieee802154_2006);
        assert_eq!(fc.addressing_fields_len(), 2 + 8 + 2 + 8);
    }

    #[test]
    fn imm_ack_has_no_addressing() {
        let fc = FrameControl::new(&[0x02, 0x00][..]).unwrap();
        assert_eq!(fc.frame_type(), FrameType::Ack);
        assert_eq!(fc.addressing_fields_len(), 0);
    }

    #[test]
    fn sequence_number_suppression_only_from_2015() {
        let fc = FrameControl::new(&[0x02, 0x11][..]).unwrap();
        assert!(fc.sequence_number_suppression());
        assert_eq!(fc.frame_version(), FrameVersion::Ieee802154_2006);
        assert!(fc.has_sequence_number());

        let fc = FrameControl::new(&[0x02, 0x21][..]).unwrap();
        assert_eq!(fc.frame_version(), FrameVersion::Ieee802154_2020);
        assert!(!fc.has_sequence_number());
    }

    #[test]
    fn too_short() {
        assert!(FrameControl::new(&[0x41][..]).is_err());
    }

    #[test]
    fn emit_parse() {
        let mut repr = FrameControlRepr::data(AddressingMode::Short, AddressingMode::Extended);
        repr.ack_request = true;
        let bytes = repr.emit().unwrap();
        let fc = FrameControl::new(&bytes[..]).unwrap();
        assert_eq!(FrameControlRepr::parse(&fc), repr);

        repr.src_addressing_mode = AddressingMode::Unknown;
        assert!(repr.emit().is_err());
    }
}
