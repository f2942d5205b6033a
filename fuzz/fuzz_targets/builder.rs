#![no_main]

use arbitrary::Arbitrary;
use dot15d4_tal_frame::{Address, FrameBuilder, FrameControlRepr, PhyFrame};

use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    fc: FrameControlRepr,
    sequence_number: u8,
    pan_id: u16,
    dst: Address,
    src: Address,
    payload: Vec<u8>,
    buffer_len: u8,
}

fuzz_target!(|input: Input| {
    let mut buffer = vec![0; input.buffer_len as usize];

    let Ok(len) = FrameBuilder::new(&mut buffer[..])
        .and_then(|b| b.frame_control(&input.fc))
        .and_then(|b| b.sequence_number(input.sequence_number))
        .and_then(|b| b.pan_id(input.pan_id))
        .and_then(|b| b.address(input.dst))
        .and_then(|b| b.address(input.src))
        .and_then(|b| b.payload(&input.payload))
        .and_then(|b| b.finish())
    else {
        return;
    };

    let frame = PhyFrame::new(&buffer[..len]).unwrap();
    assert!(frame.check_fcs());
});
