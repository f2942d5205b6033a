//! Addressing fields of an IEEE 802.15.4 MAC header.

/// An IEEE 802.15.4 address, in the octet order used on air.
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
    /// The address field is not present.
    Absent,
    /// A 16-bit short address.
    Short([u8; 2]),
    /// A 64-bit extended address.
    Extended([u8; 8]),
}

impl Address {
    /// The broadcast address.
    pub const BROADCAST: Address = Address::Short([0xff; 2]);

    /// Query whether this address is the broadcast address.
    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    /// Create an [`Address`] from its on-air octets. Slices that are not 0, 2
    /// or 8 octets long are rejected.
    pub fn from_bytes(a: &[u8]) -> Option<Self> {
        match a.len() {
            0 => Some(Address::Absent),
            2 => Some(Address::Short([a[0], a[1]])),
            8 => {
                let mut b = [0u8; 8];
                b.copy_from_slice(a);
                Some(Address::Extended(b))
            }
            _ => None,
        }
    }

    /// Return the on-air octets of the address.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Address::Absent => &[],
            Address::Short(value) => &value[..],
            Address::Extended(value) => &value[..],
        }
    }

    /// Return the [`AddressingMode`] matching this address.
    pub fn mode(&self) -> AddressingMode {
        match self {
            Address::Absent => AddressingMode::Absent,
            Address::Short(_) => AddressingMode::Short,
            Address::Extended(_) => AddressingMode::Extended,
        }
    }
}

impl core::fmt::Display for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Address::Absent => write!(f, "absent"),
            Address::Short(value) => write!(f, "{:02x}:{:02x}", value[1], value[0]),
            Address::Extended(value) => {
                for (i, b) in value.iter().rev().enumerate() {
                    if i != 0 {
                        write!(f, ":")?;
                    }
                    write!(f, "{b:02x}")?;
                }
                Ok(())
            }
        }
    }
}

/// IEEE 802.15.4 addressing mode.
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    /// No address.
    Absent = 0b00,
    /// Short (16-bit) address.
    Short = 0b10,
    /// Extended (64-bit) address.
    Extended = 0b11,
    /// Reserved value.
    Unknown,
}

impl AddressingMode {
    /// Return the size of the address in octets.
    pub fn size(&self) -> usize {
        match self {
            Self::Absent => 0,
            Self::Short => 2,
            Self::Extended => 8,
            Self::Unknown => 0,
        }
    }
}

impl From<u8> for AddressingMode {
    fn from(value: u8) -> Self {
        match value {
            0b00 => Self::Absent,
            0b10 => Self::Short,
            0b11 => Self::Extended,
            _ => Self::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes() {
        assert_eq!(Address::from_bytes(&[]), Some(Address::Absent));
        assert_eq!(
            Address::from_bytes(&[0xff, 0xff]),
            Some(Address::BROADCAST)
        );
        assert_eq!(
            Address::from_bytes(&[1, 2, 3, 4, 5, 6, 7, 8]),
            Some(Address::Extended([1, 2, 3, 4, 5, 6, 7, 8]))
        );
        assert_eq!(Address::from_bytes(&[1, 2, 3]), None);
    }

    #[test]
    fn display() {
        assert_eq!(
            format!("{}", Address::Short([0x01, 0x02])),
            "02:01"
        );
        assert_eq!(
            format!("{}", Address::Extended([1, 2, 3, 4, 5, 6, 7, 8])),
            "08:07:06:05:04:03:02:01"
        );
    }

    #[test]
    fn mode_size() {
        assert_eq!(Address::Absent.mode().size(), 0);
        assert_eq!(Address::BROADCAST.mode().size(), 2);
        assert_eq!(Address::Extended([0; 8]).mode().size(), 8);
        assert_eq!(AddressingMode::from(0b01), AddressingMode::Unknown);
    }
}
