use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const POEM_LINES: [&str; 6] = [
    "Jabberwocky",
    "",
    "’Twas brillig, and the slithy toves",
    "Did gyre and gimble in the wabe;",
    "",
    "",
];

pub const SEPARATED_LINES: [&str; 3] = ["foo", "bar\n", "baz\n"];

/// The poem joined with `ending`, including a trailing `ending`.
pub fn poem(ending: &str) -> String {
    let mut out = POEM_LINES.join(ending);
    out.push_str(ending);
    out
}

/// A file on disk that lives as long as the fixture.
pub struct Fixture {
    _file: NamedTempFile,
    path: PathBuf,
}

impl Fixture {
    pub fn new(content: impl AsRef<[u8]>) -> Self {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_ref()).unwrap();
        file.flush().unwrap();
        let path = file.path().to_path_buf();
        Self { _file: file, path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
