use super::{calculate_fcs, Address, FrameControlRepr};
use super::{Error, Result};
use super::{FCS_LEN, MAX_PHY_PACKET_SIZE, PHR_LEN};

/// A helper for writing a PHY frame front to back into a fixed buffer.
///
/// Every field is bounds checked against both the buffer and
/// [`MAX_PHY_PACKET_SIZE`], with room reserved for the FCS. [`finish`]
/// appends the FCS and writes the PHR.
///
/// [`finish`]: FrameBuilder::finish
pub struct FrameBuilder<'b> {
    buffer: &'b mut [u8],
    offset: usize,
}

impl<'b> FrameBuilder<'b> {
    /// Create a new builder writing into `buffer`, which starts with the PHR.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer cannot even hold an empty frame.
    pub fn new(buffer: &'b mut [u8]) -> Result<Self> {
        if buffer.len() < PHR_LEN + FCS_LEN {
            return Err(Error);
        }

        Ok(Self {
            buffer,
            offset: PHR_LEN,
        })
    }

    fn capacity(&self) -> usize {
        self.buffer.len().min(PHR_LEN + MAX_PHY_PACKET_SIZE) - FCS_LEN
    }

    fn put(mut self, bytes: &[u8]) -> Result<Self> {
        let end = self.offset + bytes.len();
        if end > self.capacity() {
            return Err(Error);
        }

        self.buffer[self.offset..end].copy_from_slice(bytes);
        self.offset = end;
        Ok(self)
    }

    /// Write the Frame Control field.
    pub fn frame_control(self, fc: &FrameControlRepr) -> Result<Self> {
        let bytes = fc.emit()?;
        self.put(&bytes)
    }

    /// Write the sequence number.
    pub fn sequence_number(self, sequence_number: u8) -> Result<Self> {
        self.put(&[sequence_number])
    }

    /// Write a PAN identifier.
    pub fn pan_id(self, pan_id: u16) -> Result<Self> {
        self.put(&pan_id.to_le_bytes())
    }

    /// Write an address. [`Address::Absent`] writes nothing.
    pub fn address(self, address: Address) -> Result<Self> {
        self.put(address.as_bytes())
    }

    /// Write the frame payload.
    pub fn payload(self, payload: &[u8]) -> Result<Self> {
        self.put(payload)
    }

    /// Return the number of MPDU octets written so far.
    pub fn len(&self) -> usize {
        self.offset - PHR_LEN
    }

    /// Returns `true` if nothing but the PHR has been reserved.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append the FCS, write the PHR and return the number of octets used in
    /// the buffer, PHR included.
    pub fn finish(self) -> Result<usize> {
        let fcs = calculate_fcs(&self.buffer[PHR_LEN..self.offset]);
        let end = self.offset + FCS_LEN;
        self.buffer[self.offset..end].copy_from_slice(&fcs.to_le_bytes());
        self.buffer[0] = (end - PHR_LEN) as u8;
        Ok(end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AddressingMode, FrameType, PhyFrame};

    #[test]
    fn build_and_read_back() {
        let mut buffer = [0u8; 128];
        let mut fc = FrameControlRepr::data(AddressingMode::Short, AddressingMode::Extended);
        fc.ack_request = true;

        let payload = [0xde, 0xad, 0xbe, 0xef];
        let len = FrameBuilder::new(&mut buffer)
            .unwrap()
            .frame_control(&fc)
            .unwrap()
            .sequence_number(0x11)
            .unwrap()
            .pan_id(0xabcd)
            .unwrap()
            .address(Address::Short([0x34, 0x12]))
            .unwrap()
            .address(Address::Extended([1, 2, 3, 4, 5, 6, 7, 8]))
            .unwrap()
            .payload(&payload)
            .unwrap()
            .finish()
            .unwrap();

        // PHR + FCF + seq + PAN ID + short + extended + payload + FCS
        assert_eq!(len, 1 + 2 + 1 + 2 + 2 + 8 + 4 + 2);

        let frame = PhyFrame::new(&buffer[..len]).unwrap();
        assert!(frame.check_fcs());
        assert_eq!(frame.length(), len - 1);
        let read_fc = frame.frame_control().unwrap();
        assert_eq!(read_fc.frame_type(), FrameType::Data);
        assert!(read_fc.ack_request());
        assert_eq!(frame.sequence_number(), Some(0x11));
        assert_eq!(frame.payload(), Some(&payload[..]));
    }

    #[test]
    fn payload_too_large() {
        let mut buffer = [0u8; 200];
        let fc = FrameControlRepr::data(AddressingMode::Short, AddressingMode::Short);
        let builder = FrameBuilder::new(&mut buffer)
            .unwrap()
            .frame_control(&fc)
            .unwrap()
            .sequence_number(0)
            .unwrap();

        // 3 octets of header and 2 of FCS leave 122 octets.
        assert!(builder.payload(&[0u8; 123]).is_err());

        let mut buffer = [0u8; 200];
        let len = FrameBuilder::new(&mut buffer)
            .unwrap()
            .frame_control(&fc)
            .unwrap()
            .sequence_number(0)
            .unwrap()
            .payload(&[0u8; 122])
            .unwrap()
            .finish()
            .unwrap();
        assert_eq!(len, 128);
        assert_eq!(buffer[0], 127);
    }

    #[test]
    fn small_buffer() {
        let mut buffer = [0u8; 2];
        assert!(FrameBuilder::new(&mut buffer).is_err());

        let mut buffer = [0u8; 6];
        let builder = FrameBuilder::new(&mut buffer).unwrap();
        assert!(builder.is_empty());
        assert!(builder.payload(&[1, 2, 3, 4]).is_err());
    }
}
