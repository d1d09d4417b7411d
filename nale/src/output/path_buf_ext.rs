use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

/// Adds a one-line `open` convenience to `Path`/`PathBuf` for the output
/// files the `mmoreseqs` pipeline writes (results tables, seed files):
/// create-or-truncate, or create-and-append.
pub trait PathBufExt {
    /// Opens `self` for writing. `truncate = true` recreates the file
    /// from scratch; `truncate = false` appends to an existing file.
    fn open(&self, truncate: bool) -> io::Result<File>;
}

impl<P: AsRef<Path>> PathBufExt for P {
    fn open(&self, truncate: bool) -> io::Result<File> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(truncate)
            .append(!truncate)
            .open(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "nale-pathbufext-test-{}-{}-{name}",
            std::process::id(),
            std::thread::current().name().unwrap_or("main")
        ))
    }

    #[test]
    fn truncate_overwrites_existing_contents() {
        let path = temp_path("truncate");
        path.open(true).unwrap().write_all(b"first").unwrap();
        path.open(true).unwrap().write_all(b"second").unwrap();

        let mut contents = String::new();
        File::open(&path).unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "second");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn append_preserves_existing_contents() {
        let path = temp_path("append");
        path.open(true).unwrap().write_all(b"first-").unwrap();
        path.open(false).unwrap().write_all(b"second").unwrap();

        let mut contents = String::new();
        File::open(&path).unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "first-second");
        let _ = std::fs::remove_file(&path);
    }
}
