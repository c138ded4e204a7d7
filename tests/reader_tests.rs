use linestream::*;
use std::io::Cursor;

#[allow(dead_code)]
mod harness {
    pub mod faulty_source;
    pub mod fixtures;
}
use harness::faulty_source::{FaultMode, FaultySource};
use harness::fixtures::{poem, Fixture, POEM_LINES};

const HAIKU: &str = "ふうりうの初やおくの田植うた";

#[test]
fn multibyte_characters_on_buffer_boundary() {
    let fixture = Fixture::new(format!("{HAIKU}\n{HAIKU}"));
    for buffer_size in 1..=7 {
        let config = ReaderConfig::default().buffer_size(buffer_size);
        let mut reader = LineReader::open_path(fixture.path(), config).unwrap();
        assert_eq!(reader.next_line().unwrap(), HAIKU, "buffer size {buffer_size}");
        let last = reader.next_entry().unwrap();
        assert_eq!(last.text, HAIKU);
        assert!(last.last);
    }
}

#[test]
fn has_next_line_tracks_remaining_lines() {
    let fixture = Fixture::new("This is line one.\nThis is line two.\nThis is line three.\n");
    let mut reader = LineReader::open_path(fixture.path(), ReaderConfig::default()).unwrap();
    let mut count = 0;
    while reader.has_next_line() {
        reader.next_line().unwrap();
        count += 1;
    }
    assert_eq!(count, 3);
    assert!(!reader.has_next_line());
    assert!(reader.is_closed());
    assert!(matches!(reader.next_line(), Err(Error::Exhausted)));
}

#[test]
fn next_line_on_closed_reader_fails() {
    let fixture = Fixture::new(poem("\n"));
    let mut reader = LineReader::open_path(fixture.path(), ReaderConfig::default()).unwrap();
    assert_eq!(reader.next_line().unwrap(), POEM_LINES[0]);
    reader.close().unwrap();
    assert!(reader.is_closed());
    assert_eq!(reader.state(), StreamState::Closed);
    assert!(!reader.has_next_line());
    assert!(matches!(reader.next_line(), Err(Error::Closed)));
}

#[test]
fn reads_from_already_open_stream() {
    let fixture = Fixture::new(poem("\r\n"));
    let file = std::fs::File::open(fixture.path()).unwrap();
    let mut reader = LineReader::from_reader(file, ReaderConfig::default().buffer_size(3)).unwrap();
    let lines: Vec<String> = reader.lines().collect::<Result<_>>().unwrap();
    assert_eq!(lines, POEM_LINES);
    assert!(reader.is_closed());
}

#[test]
fn missing_file_fails_to_open() {
    let dir = tempfile::tempdir().unwrap();
    let err = LineReader::open_path(dir.path().join("missing.txt"), ReaderConfig::default())
        .unwrap_err();
    let Error::Open { source } = err else {
        panic!("expected an open error, got {err:?}");
    };
    assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
}

#[test]
fn zero_buffer_size_is_rejected() {
    let err = LineReader::from_reader(Cursor::new("a\n"), ReaderConfig::default().buffer_size(0))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfig { .. }));
}

#[test]
fn empty_separator_is_rejected() {
    let err = LineReader::from_reader(Cursor::new("a\n"), ReaderConfig::default().separator(""))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidConfig { .. }));
}

#[test]
fn separator_split_across_every_read() {
    let input = "alpha<=>beta<=><=>gamma<=>";
    let source = FaultySource::new(Cursor::new(input), FaultMode::ChunksOf(1));
    let config = ReaderConfig::default().separator("<=>");
    let mut reader = LineReader::open(source, config).unwrap();
    let lines: Vec<String> = reader.lines().collect::<Result<_>>().unwrap();
    assert_eq!(lines, ["alpha", "beta", "", "gamma"]);
    // One read per byte plus the end-of-input read.
    assert_eq!(reader.get_ref().reads(), input.len() + 1);
}

#[test]
fn mixed_line_endings_in_auto_mode() {
    let source = FaultySource::new(
        Cursor::new("a\r\nb\rc\nd\r\r\ne"),
        FaultMode::ChunkPattern(vec![2, 1, 3]),
    );
    let mut reader = LineReader::open(source, ReaderConfig::default()).unwrap();
    let lines: Vec<String> = reader.lines().collect::<Result<_>>().unwrap();
    assert_eq!(lines, ["a", "b", "c", "d", "", "e"]);
}

#[test]
fn latin1_and_utf16_sources() {
    let latin1: &[u8] = b"caf\xe9\nna\xefve";
    let mut reader = LineReader::from_reader(
        latin1,
        ReaderConfig::default().encoding(Encoding::Latin1).buffer_size(2),
    )
    .unwrap();
    assert_eq!(reader.next_line().unwrap(), "café");
    assert_eq!(reader.next_line().unwrap(), "naïve");

    let utf16: Vec<u8> = "hé\nwörld".encode_utf16().flat_map(u16::to_le_bytes).collect();
    let mut reader = LineReader::from_reader(
        Cursor::new(utf16),
        ReaderConfig::default().encoding(Encoding::Utf16Le).buffer_size(3),
    )
    .unwrap();
    let lines: Vec<String> = reader.lines().collect::<Result<_>>().unwrap();
    assert_eq!(lines, ["hé", "wörld"]);
}

#[test]
fn invalid_utf8_reports_offset_and_closes() {
    let input: &[u8] = b"ok\nbad \xff byte\n";
    let mut reader = LineReader::from_reader(input, ReaderConfig::default().buffer_size(4)).unwrap();
    assert_eq!(reader.next_line().unwrap(), "ok");
    let err = reader.next_line().unwrap_err();
    assert!(
        matches!(err, Error::Decoding { encoding: Encoding::Utf8, offset: 7 }),
        "{err:?}"
    );
    assert!(reader.is_closed());
    assert_eq!(reader.state(), StreamState::Errored);
    assert!(matches!(reader.next_line(), Err(Error::Closed)));
}

#[test]
fn truncated_character_at_end_of_input() {
    let input = &"ok\nふ".as_bytes()[..5];
    let mut reader = LineReader::from_reader(input, ReaderConfig::default()).unwrap();
    assert_eq!(reader.next_line().unwrap(), "ok");
    assert!(matches!(reader.next_line(), Err(Error::Decoding { offset: 3, .. })));
}

#[test]
fn lines_before_invalid_bytes_do_not_depend_on_buffer_size() {
    for buffer_size in [1, 2, 1024] {
        let input: &[u8] = b"a\nb\nc\n\xff";
        let mut reader =
            LineReader::from_reader(input, ReaderConfig::default().buffer_size(buffer_size)).unwrap();
        let mut lines = Vec::new();
        let err = loop {
            match reader.next_line() {
                Ok(line) => lines.push(line),
                Err(e) => break e,
            }
        };
        assert_eq!(lines, ["a", "b", "c"], "buffer size {buffer_size}");
        assert!(
            matches!(err, Error::Decoding { encoding: Encoding::Utf8, offset: 6 }),
            "{err:?}"
        );
        assert_eq!(err.to_string(), "invalid utf-8 byte sequence at offset 6");
        assert!(reader.is_closed());
    }
}
