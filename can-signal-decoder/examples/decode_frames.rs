//! Decode a handful of frames against a small in-memory schema
//!
//! Frames are given on the command line as `<id>#<hex payload>` in candump
//! notation; without arguments a built-in sample is used.
//!
//! Usage:
//!   decode_frames [1F0#A5B6D90000000000] [7A0#0239300000000000] ...
//!
//! Set `RUST_LOG=debug` to see why signals are skipped.

use can_signal_decoder::{
    ByteOrder, CanFrame, DecodedEvent, Decoder, MessageDefinition, SignalDatabase,
    SignalDefinition, ValueKind,
};
use std::env;

fn build_database() -> can_signal_decoder::Result<SignalDatabase> {
    let mut db = SignalDatabase::new();

    let example = db.add_message(MessageDefinition::new(0x1F0, "ExampleMessage", 8))?;
    db.add_signal(
        example,
        SignalDefinition::new("Enable", 7, 1)
            .with_byte_order(ByteOrder::Motorola)
            .with_value(0, "Disabled")
            .with_value(1, "Enabled"),
    )?;
    db.add_signal(
        example,
        SignalDefinition::new("AverageRadius", 6, 6)
            .with_byte_order(ByteOrder::Motorola)
            .with_scaling(0.1, 0.0)
            .with_unit("m"),
    )?;
    db.add_signal(
        example,
        SignalDefinition::new("Temperature", 0, 12)
            .with_byte_order(ByteOrder::Motorola)
            .with_kind(ValueKind::SignedInt)
            .with_scaling(0.01, 250.0)
            .with_unit("degK"),
    )?;

    let diag = db.add_message(MessageDefinition::new(0x7A0, "Diagnostics", 8))?;
    let page = db.add_signal(diag, SignalDefinition::new("Page", 0, 4))?;
    db.add_signal(
        diag,
        SignalDefinition::new("Voltage", 8, 16)
            .with_scaling(0.001, 0.0)
            .with_unit("V")
            .multiplexed_on(1),
    )?;
    db.add_signal(
        diag,
        SignalDefinition::new("Current", 8, 16)
            .with_kind(ValueKind::SignedInt)
            .with_scaling(0.01, 0.0)
            .with_unit("A")
            .multiplexed_on(2),
    )?;
    db.set_multiplexor(diag, page)?;

    Ok(db)
}

/// Parse `<id>#<hex>` into a frame
fn parse_frame(text: &str) -> Option<CanFrame> {
    let (id, hex) = text.split_once('#')?;
    let can_id = u32::from_str_radix(id, 16).ok()?;
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return None;
    }
    let data = (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect::<Option<Vec<u8>>>()?;

    Some(CanFrame::new(can_id, data))
}

fn main() {
    env_logger::init();

    let db = match build_database() {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Error building schema: {}", e);
            std::process::exit(1);
        }
    };
    let decoder = Decoder::new(db);

    let args: Vec<String> = env::args().skip(1).collect();
    let inputs: Vec<String> = if args.is_empty() {
        ["1F0#A5B6D90000000000", "7A0#0139300000000000", "7A0#0206FF0000000000", "123#00"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    } else {
        args
    };

    let mut frames: Vec<can_signal_decoder::Result<CanFrame>> = Vec::new();
    for input in &inputs {
        match parse_frame(input) {
            Some(frame) => frames.push(Ok(frame)),
            None => eprintln!("Skipping malformed frame '{}'", input),
        }
    }

    for event in decoder.decode_frames(frames) {
        match event {
            Ok(DecodedEvent::Message {
                can_id,
                message_name,
                signals,
                multiplexer_value,
                ..
            }) => {
                print!("0x{:03X} {}", can_id, message_name);
                if let Some(mux) = multiplexer_value {
                    print!(" [mux {}]", mux);
                }
                println!();
                for signal in signals {
                    let unit = signal.unit.as_deref().unwrap_or("");
                    match &signal.value_description {
                        Some(description) => println!("  {} = {} ({})", signal.name, signal.value, description),
                        None => println!("  {} = {} {}", signal.name, signal.value, unit),
                    }
                }
            }
            Ok(DecodedEvent::RawFrame { can_id, data, .. }) => {
                println!("0x{:03X} raw {:02X?}", can_id, data);
            }
            Err(e) => eprintln!("Decode error: {}", e),
        }
    }
}
