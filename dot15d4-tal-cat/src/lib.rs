use colored::*;
use dot15d4_tal_frame::*;

struct Writer<'b> {
    buffer: &'b mut String,
    indent: usize,
}

impl<'b> Writer<'b> {
    fn new(buffer: &'b mut String) -> Self {
        Self { buffer, indent: 0 }
    }

    fn increase_indent(&mut self) {
        self.indent += 2;
    }

    fn decrease_indent(&mut self) {
        self.indent -= 2;
    }

    fn write(&mut self, s: String) {
        self.buffer.push_str(&" ".repeat(self.indent));
        self.buffer.push_str(&s);
    }

    fn writeln(&mut self, s: String) {
        self.write(s);
        self.buffer.push('\n');
    }

    fn section(&mut self, title: &str) {
        self.writeln(title.underline().bold().to_string());
    }
}

/// The PAN identifiers and addresses of a MAC header.
#[derive(Debug, Default)]
struct AddressingFields {
    dst_pan_id: Option<u16>,
    dst_address: Option<Address>,
    src_pan_id: Option<u16>,
    src_address: Option<Address>,
}

impl AddressingFields {
    /// Split the addressing fields returned by [`PhyFrame::addressing`].
    fn parse(fc: &FrameControl<&[u8]>, mut bytes: &[u8]) -> Self {
        let dst = fc.dst_addressing_mode();
        let src = fc.src_addressing_mode();
        let mut fields = Self::default();

        if dst != AddressingMode::Absent {
            fields.dst_pan_id = Some(pan_id(take(&mut bytes, 2)));
            fields.dst_address = Address::from_bytes(take(&mut bytes, dst.size()));
        }

        if src != AddressingMode::Absent {
            if !(fc.pan_id_compression() && dst != AddressingMode::Absent) {
                fields.src_pan_id = Some(pan_id(take(&mut bytes, 2)));
            }
            fields.src_address = Address::from_bytes(take(&mut bytes, src.size()));
        }

        fields
    }
}

fn take<'a>(bytes: &mut &'a [u8], len: usize) -> &'a [u8] {
    let remaining: &'a [u8] = *bytes;
    let (field, rest) = remaining.split_at(len.min(remaining.len()));
    *bytes = rest;
    field
}

fn pan_id(field: &[u8]) -> u16 {
    match field {
        [low, high] => u16::from_le_bytes([*low, *high]),
        _ => 0,
    }
}

/// Pretty-printer for transceiver frame buffers: a PHR, the PSDU and, for
/// frames uploaded by a receiver, the LQI and ED bytes.
pub struct FrameParser {}

impl FrameParser {
    pub fn parse_hex(input: &str) -> Result<String> {
        let data = hex::decode(input).map_err(|_| Error)?;
        Self::parse(&data)
    }

    pub fn parse(input: &[u8]) -> Result<String> {
        let frame = PhyFrame::new(input)?;
        let mut buffer = String::new();

        let mut w = Writer::new(&mut buffer);

        // -----------------------------------------------------------------
        // PHY Header
        // -----------------------------------------------------------------
        w.section("PHY Header");
        w.increase_indent();
        w.writeln(format!("{}: {}", "length".bold(), frame.length()));
        w.decrease_indent();

        // -----------------------------------------------------------------
        // Frame Control
        // -----------------------------------------------------------------
        if let Some(fc) = frame.frame_control() {
            w.section("Frame Control");
            w.increase_indent();
            w.writeln(format!(
                "{}: {}",
                "frame type".bold(),
                format!(
                    "{}{:?}",
                    if fc.frame_version() == FrameVersion::Ieee802154_2020
                        && (fc.frame_type() == FrameType::Beacon
                            || fc.frame_type() == FrameType::Ack)
                    {
                        "Enhanced "
                    } else {
                        ""
                    },
                    fc.frame_type()
                )
                .bright_blue(),
            ));
            w.writeln(format!(
                "{}: {}",
                "security".bold(),
                fc.security_enabled() as usize
            ));
            w.writeln(format!(
                "{}: {}",
                "frame pending".bold(),
                fc.frame_pending() as usize
            ));
            w.writeln(format!(
                "{}: {}",
                "ack request".bold(),
                fc.ack_request() as usize
            ));
            w.writeln(format!(
                "{}: {}",
                "pan id compression".bold(),
                fc.pan_id_compression() as usize
            ));
            w.writeln(format!(
                "{}: {:?}",
                "dst addressing mode".bold(),
                fc.dst_addressing_mode()
            ));
            w.writeln(format!(
                "{}: {:?}",
                "src addressing mode".bold(),
                fc.src_addressing_mode()
            ));
            w.writeln(format!(
                "{}: {} ({:?})",
                "frame version".bold(),
                fc.frame_version() as usize,
                fc.frame_version()
            ));
            w.decrease_indent();

            // -------------------------------------------------------------
            // Sequence Number
            // -------------------------------------------------------------
            if let Some(seq) = frame.sequence_number() {
                w.section("Sequence Number");
                w.increase_indent();
                w.writeln(format!("{}: {}", "sequence number".bold(), seq));
                w.decrease_indent();
            }

            // -------------------------------------------------------------
            // Addressing
            // -------------------------------------------------------------
            match frame.addressing() {
                Some([]) => (),
                Some(bytes) => {
                    let addr = AddressingFields::parse(&fc, bytes);
                    w.section("Addressing");
                    w.increase_indent();

                    if let Some(dst_pan_id) = addr.dst_pan_id {
                        w.writeln(format!("{}: {:x}", "dst pan id".bold(), dst_pan_id));
                    }

                    if let Some(dst_addr) = addr.dst_address {
                        w.writeln(format!(
                            "{}: {}{}",
                            "dst addr".bold(),
                            dst_addr,
                            if dst_addr.is_broadcast() {
                                " (broadcast)"
                            } else {
                                ""
                            }
                        ));
                    }

                    if let Some(src_pan_id) = addr.src_pan_id {
                        w.writeln(format!("{}: {:x}", "src pan id".bold(), src_pan_id));
                    }

                    if let Some(src_addr) = addr.src_address {
                        w.writeln(format!("{}: {}", "src addr".bold(), src_addr));
                    }
                    w.decrease_indent();
                }
                None => {
                    w.section("Addressing");
                    w.increase_indent();
                    w.writeln("truncated".red().to_string());
                    w.decrease_indent();
                }
            }

            // -------------------------------------------------------------
            // Payload
            // -------------------------------------------------------------
            if let Some(payload) = frame.payload().filter(|p| !p.is_empty()) {
                w.section("Payload");
                w.increase_indent();
                w.writeln(format!("{:x?}", payload));
                w.decrease_indent();
            }
        }

        // -----------------------------------------------------------------
        // Frame Check Sequence
        // -----------------------------------------------------------------
        w.section("Frame Check Sequence");
        w.increase_indent();
        w.writeln(format!(
            "{}: {:04x} {}",
            "fcs".bold(),
            frame.fcs(),
            if frame.check_fcs() {
                "(valid)".green()
            } else {
                format!("(invalid, expected {:04x})", frame.calculate_fcs()).red()
            }
        ));
        w.decrease_indent();

        // -----------------------------------------------------------------
        // Link Metrics
        // -----------------------------------------------------------------
        if frame.lqi().is_some() || frame.ed().is_some() {
            w.section("Link Metrics");
            w.increase_indent();
            if let Some(lqi) = frame.lqi() {
                w.writeln(format!("{}: {}", "lqi".bold(), lqi));
            }
            if let Some(ed) = frame.ed() {
                w.writeln(format!("{}: {}", "ed".bold(), ed));
            }
            w.decrease_indent();
        }

        Ok(buffer)
    }
}
