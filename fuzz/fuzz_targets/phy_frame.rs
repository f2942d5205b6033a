#![no_main]

use dot15d4_tal_frame::PhyFrame;

use libfuzzer_sys::{fuzz_target, Corpus};

fuzz_target!(|data: &[u8]| -> Corpus {
    // PHR, aMaxPHYPacketSize octets, LQI and ED.
    if data.len() > 130 {
        return Corpus::Reject;
    }

    let Ok(frame) = PhyFrame::new(data) else {
        return Corpus::Keep;
    };

    let _ = frame.check_fcs();
    let _ = frame.sequence_number();
    let _ = frame.addressing();
    let _ = frame.payload();
    let _ = frame.lqi();
    let _ = frame.ed();

    if let Some(fc) = frame.frame_control() {
        let _ = fc.addressing_fields_len();
    }

    Corpus::Keep
});
