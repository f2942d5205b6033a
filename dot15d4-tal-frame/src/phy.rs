//! Reader for PHY frames as stored in a transceiver frame buffer.

use super::{Error, Result};
use super::{FrameControl, FCS_LEN, MAX_PHY_PACKET_SIZE, PHR_LEN};

/// The FCS field contains a 16-bit ITU-T CRC, using the x^16 + x^12 + x^5 + 1
/// polynomial. Unlike most CRCs, the initial and final values are both 0x0000.
const CRC_16_IEEE802154: crc::Algorithm<u16> = crc::Algorithm {
    width: 16,
    poly: 0x1021,
    init: 0x0000,
    refin: true,
    refout: true,
    xorout: 0x0000,
    check: 0x2189,
    residue: 0x0000,
};

/// Calculate the Frame Check Sequence over an MPDU (excluding the FCS field).
#[inline]
pub fn calculate_fcs(mpdu: &[u8]) -> u16 {
    crc::Crc::<u16>::new(&CRC_16_IEEE802154).checksum(mpdu)
}

/// A reader for a PHY frame: the PHR, the PSDU and, for uploaded frames, the
/// LQI and ED bytes appended by the receiver.
#[derive(Debug, Clone)]
pub struct PhyFrame<T: AsRef<[u8]>> {
    buffer: T,
}

impl<T: AsRef<[u8]>> PhyFrame<T> {
    /// Create a new [`PhyFrame`] reader from a given buffer.
    ///
    /// # Errors
    ///
    /// Returns an error when the PHR announces more than
    /// [`MAX_PHY_PACKET_SIZE`] octets, fewer octets than the FCS, or more
    /// octets than the buffer holds.
    pub fn new(buffer: T) -> Result<Self> {
        let frame = Self::new_unchecked(buffer);

        if !frame.check_len() {
            return Err(Error);
        }

        Ok(frame)
    }

    /// Check that the PHR holds a valid length and that the buffer is long
    /// enough to contain the announced PSDU.
    pub fn check_len(&self) -> bool {
        let buffer = self.buffer.as_ref();
        if buffer.len() < PHR_LEN {
            return false;
        }

        let len = buffer[0] as usize;
        (FCS_LEN..=MAX_PHY_PACKET_SIZE).contains(&len) && buffer.len() >= PHR_LEN + len
    }

    /// Create a new [`PhyFrame`] reader without checking the buffer.
    pub fn new_unchecked(buffer: T) -> Self {
        Self { buffer }
    }

    /// Consume the reader and return the underlying buffer.
    pub fn into_inner(self) -> T {
        self.buffer
    }

    /// Return the PSDU length announced by the PHR.
    pub fn length(&self) -> usize {
        self.buffer.as_ref()[0] as usize
    }

    /// Return the PSDU: the MPDU followed by the FCS.
    pub fn psdu(&self) -> &[u8] {
        &self.buffer.as_ref()[PHR_LEN..PHR_LEN + self.length()]
    }

    /// Return the MPDU, excluding the FCS.
    pub fn mpdu(&self) -> &[u8] {
        let psdu = self.psdu();
        &psdu[..psdu.len() - FCS_LEN]
    }

    /// Return the PHR and PSDU, the part of the buffer written to a
    /// transceiver for transmission.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer.as_ref()[..PHR_LEN + self.length()]
    }

    /// Return the Frame Check Sequence of the frame.
    pub fn fcs(&self) -> u16 {
        let psdu = self.psdu();
        let len = psdu.len();
        u16::from_le_bytes([psdu[len - 2], psdu[len - 1]])
    }

    /// Calculate the Frame Check Sequence of the frame.
    pub fn calculate_fcs(&self) -> u16 {
        calculate_fcs(self.mpdu())
    }

    /// Check the Frame Check Sequence of the frame.
    pub fn check_fcs(&self) -> bool {
        self.calculate_fcs() == self.fcs()
    }

    /// Return a [`FrameControl`] reader, if the MPDU is long enough.
    pub fn frame_control(&self) -> Option<FrameControl<&'_ [u8]>> {
        FrameControl::new(self.mpdu()).ok()
    }

    /// Return the sequence number, if present.
    pub fn sequence_number(&self) -> Option<u8> {
        let fc = self.frame_control()?;
        if fc.has_sequence_number() {
            self.mpdu().get(2).copied()
        } else {
            None
        }
    }

    /// Return the length of the MAC header up to and including the addressing
    /// fields.
    pub fn header_len(&self) -> Option<usize> {
        let fc = self.frame_control()?;
        let len = 2 + fc.has_sequence_number() as usize + fc.addressing_fields_len();
        (len <= self.mpdu().len()).then_some(len)
    }

    /// Return the addressing fields (PAN identifiers and addresses).
    pub fn addressing(&self) -> Option<&[u8]> {
        let fc = self.frame_control()?;
        let end = self.header_len()?;
        Some(&self.mpdu()[end - fc.addressing_fields_len()..end])
    }

    /// Return everything following the addressing fields. For secured frames
    /// or frames with information elements, this includes the auxiliary
    /// security header and the IEs.
    pub fn payload(&self) -> Option<&[u8]> {
        let start = self.header_len()?;
        Some(&self.mpdu()[start..])
    }

    /// Return the link quality byte appended by the receiver, if present.
    pub fn lqi(&self) -> Option<u8> {
        self.buffer.as_ref().get(PHR_LEN + self.length()).copied()
    }

    /// Return the energy level byte appended by the receiver, if present.
    pub fn ed(&self) -> Option<u8> {
        self.buffer.as_ref().get(PHR_LEN + self.length() + 1).copied()
    }
}

impl<T: AsRef<[u8]> + AsMut<[u8]>> PhyFrame<T> {
    /// Return a mutable reference to the PSDU.
    pub fn psdu_mut(&mut self) -> &mut [u8] {
        let len = self.length();
        &mut self.buffer.as_mut()[PHR_LEN..PHR_LEN + len]
    }

    /// Recalculate and write the Frame Check Sequence.
    pub fn fill_fcs(&mut self) {
        let fcs = self.calculate_fcs();
        let psdu = self.psdu_mut();
        let len = psdu.len();
        psdu[len - 2..].copy_from_slice(&fcs.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AddressingMode, FrameType};

    fn with_phr(psdu: &[u8]) -> std::vec::Vec<u8> {
        let mut buffer = vec![psdu.len() as u8];
        buffer.extend_from_slice(psdu);
        buffer
    }

    #[test]
    fn fcs() {
        let psdu = [
            0x02, 0x2e, 0x8d, 0xcd, 0xab, 0x02, 0x00, 0x02, 0x00, 0x02, 0x00, 0x02, 0x00, 0x02,
            0x0f, 0x00, 0x00, 0x7d, 0xd4,
        ];
        let buffer = with_phr(&psdu);
        let frame = PhyFrame::new(&buffer[..]).unwrap();
        assert_eq!(frame.length(), 19);
        assert_eq!(frame.fcs(), 0xd47d);
        assert!(frame.check_fcs());
    }

    #[test]
    fn check_len() {
        // PHR larger than aMaxPHYPacketSize.
        let mut buffer = [0u8; 140];
        buffer[0] = 128;
        assert!(PhyFrame::new(&buffer[..]).is_err());

        // PSDU shorter than the FCS.
        assert!(PhyFrame::new(&[1u8, 0][..]).is_err());

        // Buffer shorter than announced.
        assert!(PhyFrame::new(&[5u8, 0, 0][..]).is_err());

        assert!(PhyFrame::new(&[][..]).is_err());
        assert!(PhyFrame::new(&[2u8, 0, 0][..]).is_ok());
    }

    #[test]
    fn uploaded_frame() {
        let bytes = hex::decode("0c41882acdabffff010055a36ef0c4").unwrap();
        let frame = PhyFrame::new(&bytes[..]).unwrap();
        let fc = frame.frame_control().unwrap();
        assert_eq!(fc.frame_type(), FrameType::Data);
        assert_eq!(fc.dst_addressing_mode(), AddressingMode::Short);
        assert_eq!(frame.sequence_number(), Some(0x2a));
        assert_eq!(frame.addressing(), Some(&[0xcd, 0xab, 0xff, 0xff, 0x01, 0x00][..]));
        assert_eq!(frame.payload(), Some(&[0x55][..]));
        assert_eq!(frame.lqi(), Some(0xf0));
        assert_eq!(frame.ed(), Some(0xc4));
    }

    #[test]
    fn transmitted_frame_has_no_link_metrics() {
        let buffer = with_phr(&[0x02, 0x00, 0x07, 0x00, 0x00]);
        let frame = PhyFrame::new(&buffer[..]).unwrap();
        assert_eq!(frame.lqi(), None);
        assert_eq!(frame.ed(), None);
        assert_eq!(frame.payload(), Some(&[][..]));
    }

    #[test]
    fn truncated_header() {
        // Data frame announcing short addresses but carrying none.
        let buffer = with_phr(&[0x41, 0x88, 0x01, 0x00, 0x00]);
        let frame = PhyFrame::new(&buffer[..]).unwrap();
        assert_eq!(frame.header_len(), None);
        assert_eq!(frame.payload(), None);
    }

    #[test]
    fn fill_fcs() {
        let mut buffer = with_phr(&[0x02, 0x00, 0x07, 0x00, 0x00]);
        let mut frame = PhyFrame::new(&mut buffer[..]).unwrap();
        assert!(!frame.check_fcs());
        frame.fill_fcs();
        assert!(frame.check_fcs());
    }
}
