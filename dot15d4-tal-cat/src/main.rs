use clap::Parser;
use dot15d4_tal_cat::FrameParser;

/// `cat` for IEEE 802.15.4 transceiver frame buffers.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The frame buffer to parse, in hex: PHR, PSDU and optionally the LQI
    /// and ED bytes of an uploaded frame.
    #[clap(value_parser(clap::builder::NonEmptyStringValueParser::new()))]
    input: String,
}

fn main() {
    let args = Args::parse();
    match FrameParser::parse_hex(args.input.trim()) {
        Ok(output) => print!("{output}"),
        Err(_) => {
            eprintln!("invalid frame buffer: {}", args.input);
            std::process::exit(1);
        }
    }
}
