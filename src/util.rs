use std::fs::File;
use std::io;
use std::path::Path;

/// Opens `path`, annotating any error with the file's `kind` and location.
pub fn open(path: &Path, kind: &str) -> io::Result<File> {
    File::open(path).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("Opening {} file `{}`: {}", kind, path.display(), e),
        )
    })
}
