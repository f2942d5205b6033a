use std::collections::HashMap;
use std::env;
use std::fmt::Write;
use std::path::PathBuf;

fn main() {
    // (Variable, Type, Default value)
    let mut configs: HashMap<&str, (&str, &str)> = HashMap::from([
        ("MIN_BE", ("u8", "3")),
        ("MAX_BE", ("u8", "5")),
        ("MAX_CSMA_BACKOFFS", ("u8", "4")),
        ("MAX_FRAME_RETRIES", ("u8", "3")),
        ("TRANSMIT_POWER_DBM", ("i8", "3")),
        ("DEFAULT_CHANNEL", ("u8", "11")),
        ("DEFAULT_PAN_ID", ("u16", "0xffff")),
        ("DEFAULT_SHORT_ADDRESS", ("u16", "0xffff")),
        ("INCOMING_QUEUE_CAPACITY", ("usize", "8")),
        ("CALIBRATION_INTERVAL_US", ("u32", "300_000_000")),
        ("PLL_LOCK_ATTEMPTS", ("u8", "3")),
        ("POLL_ATTEMPTS", ("u32", "100")),
    ]);

    // Make sure we get rerun if needed
    println!("cargo:rerun-if-changed=build.rs");
    for name in configs.keys() {
        println!("cargo:rerun-if-env-changed=TAL_{name}");
    }

    let mut data = String::new();
    writeln!(data, "// Generated by build.rs from TAL_* environment variables.").unwrap();

    for (var, value) in std::env::vars() {
        if let Some(name) = var.strip_prefix("TAL_") {
            // discard from hashmap as a way of consuming the setting
            let Some((_, (ty, _))) = configs.remove_entry(name) else {
                panic!("Wrong configuration name {name}");
            };

            writeln!(data, "pub const {name}: {ty} = {value};").unwrap();
        }
    }

    // Take the remaining configs and write the default value to the file
    for (name, (ty, value)) in configs.iter() {
        writeln!(data, "pub const {name}: {ty} = {value};").unwrap();
    }

    let out_dir = PathBuf::from(env::var_os("OUT_DIR").unwrap());
    let out_file = out_dir.join("config.rs");
    std::fs::write(out_file, data).unwrap();
}
