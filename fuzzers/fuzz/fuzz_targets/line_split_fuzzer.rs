#![no_main]
use libfuzzer_sys::fuzz_target;
use linestream::{Encoding, LineReader, ReaderConfig};
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    let Some((&knobs, rest)) = data.split_first() else {
        return;
    };
    let encoding = match knobs & 0b11 {
        0 => Encoding::Utf8,
        1 => Encoding::Utf16Le,
        _ => Encoding::Latin1,
    };
    let buffer_size = usize::from(knobs >> 2) + 1;
    let mut config = ReaderConfig::default().encoding(encoding).buffer_size(buffer_size);
    if knobs & 0b10 != 0 {
        config = config.separator("\r\n");
    }

    let Ok(mut reader) = LineReader::from_reader(Cursor::new(rest), config) else {
        return;
    };
    while reader.has_next_line() {
        if reader.next_line().is_err() {
            break;
        }
    }
    assert!(reader.is_closed());
});
