//! Zero-copy readers and a bounds-checked writer for IEEE 802.15.4 frames as
//! they are moved in and out of a transceiver frame buffer.
//!
//! A transceiver frame buffer holds a PHY frame:
//!
//! ```text
//! +-----+---------------------------+-----+-----+----+
//! | PHR |           MPDU            | FCS | LQI | ED |
//! +-----+---------------------------+-----+-----+----+
//!    1              PHR - 2             2     1    1
//! ```
//!
//! The PHR holds the length of the PSDU (MPDU and FCS). The LQI and ED bytes
//! are only present on frames uploaded by the receiver.
//!
//! Each reader contains the following functions:
//! - [`new`]: Create a new reader, checking the buffer.
//! - [`check_len`]: Check if the buffer is long enough.
//! - [`new_unchecked`]: Create a new reader without checking the buffer.
//!
//! ## Reading a frame
//! ```
//! # use dot15d4_tal_frame::{PhyFrame, FrameType};
//! let buffer = [
//!     0x0c, 0x41, 0x88, 0x2a, 0xcd, 0xab, 0xff, 0xff, 0x01, 0x00, 0x55, 0xa3, 0x6e,
//! ];
//! let frame = PhyFrame::new(&buffer[..]).unwrap();
//! let fc = frame.frame_control().unwrap();
//!
//! assert_eq!(fc.frame_type(), FrameType::Data);
//! assert_eq!(frame.sequence_number(), Some(0x2a));
//! assert_eq!(frame.payload(), Some(&[0x55][..]));
//! ```
//!
//! ## Writing a frame
//! ```
//! # use dot15d4_tal_frame::*;
//! let mut buffer = [0u8; 128];
//! let len = FrameBuilder::new(&mut buffer)
//!     .unwrap()
//!     .frame_control(&FrameControlRepr::data(
//!         AddressingMode::Short,
//!         AddressingMode::Short,
//!     ))
//!     .unwrap()
//!     .sequence_number(0x2a)
//!     .unwrap()
//!     .pan_id(0xabcd)
//!     .unwrap()
//!     .address(Address::BROADCAST)
//!     .unwrap()
//!     .address(Address::Short([0x01, 0x00]))
//!     .unwrap()
//!     .payload(&[0x55])
//!     .unwrap()
//!     .finish()
//!     .unwrap();
//!
//! let frame = PhyFrame::new(&buffer[..len]).unwrap();
//! assert!(frame.check_fcs());
//! ```
//!
//! [`new`]: PhyFrame::new
//! [`check_len`]: PhyFrame::check_len
//! [`new_unchecked`]: PhyFrame::new_unchecked

#![no_std]
#![deny(missing_docs)]
#![deny(unsafe_code)]

#[cfg(any(feature = "std", test))]
#[macro_use]
extern crate std;

mod addressing;
pub use addressing::*;

mod frame_control;
pub use frame_control::*;

mod phy;
pub use phy::*;

mod builder;
pub use builder::*;

/// An error that can occur when reading or writing an IEEE 802.15.4 frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Error;

/// A type alias for `Result<T, frame::Error>`.
pub type Result<T> = core::result::Result<T, Error>;

/// Maximum size of a PSDU, in octets (aMaxPHYPacketSize).
pub const MAX_PHY_PACKET_SIZE: usize = 127;

/// Length of the PHY header holding the frame length.
pub const PHR_LEN: usize = 1;

/// Length of the Frame Check Sequence.
pub const FCS_LEN: usize = 2;

/// Size of a buffer able to hold any PHY frame, including the PHR.
pub const PHY_BUFFER_SIZE: usize = PHR_LEN + MAX_PHY_PACKET_SIZE;
