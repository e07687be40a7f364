use std::{
    fs,
    io::{self, Write as _},
    path::Path,
};

const TEMP_PREFIX: &str = ".tmp-";

/// Write `data` to `path` without ever exposing a partially written file.
///
/// The bytes land in a temporary file next to `path` which is then renamed
/// over it. If any step fails the temporary file is removed.
pub fn write_file(path: impl AsRef<Path>, data: &[u8]) -> io::Result<()> {
    write_file_checked(path.as_ref(), data, |_| Ok(()))
}

/// Same as [`write_file`], running `before_rename` on the fully written
/// temporary file right before it is moved into place.
fn write_file_checked(
    path: &Path,
    data: &[u8],
    before_rename: impl FnOnce(&Path) -> io::Result<()>,
) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    // dropping `tmp` on any early return deletes the file
    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .tempfile_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;

    before_rename(tmp.path())?;

    tmp.persist(path).map_err(|err| err.error)?;

    Ok(())
}
