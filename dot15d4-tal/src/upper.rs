use dot15d4_tal_frame::{FrameBuilder, PhyFrame, FCS_LEN, MAX_PHY_PACKET_SIZE, PHR_LEN, PHY_BUFFER_SIZE};

use crate::error::TxStatus;
use crate::time::Instant;

/// This trait provides the interactions of the TAL with the layer above it.
/// All callbacks are made from [`Tal::task`](crate::Tal::task).
pub trait UpperLayer {
    /// A transmission started with [`Tal::tx_frame`](crate::Tal::tx_frame)
    /// ended. The frame is handed back.
    fn tx_done(&mut self, status: TxStatus, frame: TxFrame);

    /// A frame was received. The frame is only borrowed; its buffer returns
    /// to the pool when the callback returns.
    fn rx_frame(&mut self, frame: RxFrame<'_>);

    /// An energy detection scan ended with the given maximum level, scaled
    /// to 0..=255.
    fn ed_done(&mut self, level: u8);
}

/// A frame to transmit: PHR, MPDU and room for the FCS, which the
/// transceiver computes.
#[derive(Clone)]
pub struct TxFrame {
    buffer: [u8; PHY_BUFFER_SIZE],
    timestamp: Option<Instant>,
}

impl TxFrame {
    /// Build a frame with a [`FrameBuilder`].
    ///
    /// ```
    /// # use dot15d4_tal::TxFrame;
    /// # use dot15d4_tal::frame::*;
    /// let frame = TxFrame::build(|b| {
    ///     b.frame_control(&FrameControlRepr::data(
    ///         AddressingMode::Short,
    ///         AddressingMode::Short,
    ///     ))?
    ///     .sequence_number(1)?
    ///     .pan_id(0xabcd)?
    ///     .address(Address::BROADCAST)?
    ///     .address(Address::Short([0x01, 0x00]))?
    ///     .payload(b"hello")?
    ///     .finish()
    /// })
    /// .unwrap();
    /// assert_eq!(frame.length(), 2 + 1 + 2 + 2 + 2 + 5 + 2);
    /// ```
    pub fn build(
        f: impl FnOnce(FrameBuilder<'_>) -> dot15d4_tal_frame::Result<usize>,
    ) -> dot15d4_tal_frame::Result<Self> {
        let mut buffer = [0u8; PHY_BUFFER_SIZE];
        f(FrameBuilder::new(&mut buffer)?)?;
        PhyFrame::new(&buffer[..])?;
        Ok(Self {
            buffer,
            timestamp: None,
        })
    }

    /// Create a frame from an MPDU without FCS.
    pub fn from_mpdu(mpdu: &[u8]) -> Option<Self> {
        if mpdu.is_empty() || mpdu.len() + FCS_LEN > MAX_PHY_PACKET_SIZE {
            return None;
        }

        let mut buffer = [0u8; PHY_BUFFER_SIZE];
        buffer[0] = (mpdu.len() + FCS_LEN) as u8;
        buffer[PHR_LEN..PHR_LEN + mpdu.len()].copy_from_slice(mpdu);
        let mut frame = Self {
            buffer,
            timestamp: None,
        };
        frame.phy_mut().fill_fcs();
        Some(frame)
    }

    /// PSDU length, as written into the PHR.
    pub fn length(&self) -> u8 {
        self.buffer[0]
    }

    pub fn phy(&self) -> PhyFrame<&[u8]> {
        PhyFrame::new_unchecked(&self.buffer[..])
    }

    fn phy_mut(&mut self) -> PhyFrame<&mut [u8]> {
        PhyFrame::new_unchecked(&mut self.buffer[..])
    }

    pub fn mpdu(&self) -> &[u8] {
        let end = PHR_LEN + self.length() as usize - FCS_LEN;
        &self.buffer[PHR_LEN..end]
    }

    /// Returns `true` when the frame requests an acknowledgment.
    pub fn ack_request(&self) -> bool {
        self.phy()
            .frame_control()
            .map(|fc| fc.ack_request())
            .unwrap_or(false)
    }

    /// Start of the last transmission of the frame on air. Set when the
    /// transmission ends, before the frame is handed back.
    pub fn timestamp(&self) -> Option<Instant> {
        self.timestamp
    }

    pub(crate) fn set_timestamp(&mut self, timestamp: Instant) {
        self.timestamp = Some(timestamp);
    }

    /// The octets written to the frame buffer: PHR and MPDU. The FCS is
    /// appended by the transceiver.
    pub(crate) fn upload(&self) -> &[u8] {
        let end = PHR_LEN + self.length() as usize - FCS_LEN;
        &self.buffer[..end]
    }
}

impl core::fmt::Debug for TxFrame {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TxFrame")
            .field("length", &self.length())
            .field("mpdu", &self.mpdu())
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

impl PartialEq for TxFrame {
    fn eq(&self, other: &Self) -> bool {
        self.length() == other.length() && self.mpdu() == other.mpdu()
    }
}

/// A received frame, as uploaded from the transceiver.
pub struct RxFrame<'a> {
    frame: PhyFrame<&'a [u8]>,
    /// Link quality on a 0..=255 scale.
    pub lqi: u8,
    /// Energy level of the frame, raw register units.
    pub ed: u8,
    /// Start of the frame on air.
    pub timestamp: Instant,
}

impl<'a> RxFrame<'a> {
    pub(crate) fn new(frame: PhyFrame<&'a [u8]>, lqi: u8, ed: u8, timestamp: Instant) -> Self {
        Self {
            frame,
            lqi,
            ed,
            timestamp,
        }
    }

    pub fn phy(&self) -> &PhyFrame<&'a [u8]> {
        &self.frame
    }

    pub fn mpdu(&self) -> &[u8] {
        self.frame.mpdu()
    }

    pub fn psdu(&self) -> &[u8] {
        self.frame.psdu()
    }
}
