use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::{StoreError, StoreErrorCode};

pub(crate) fn io_error(context: &str, path: &Path, err: &std::io::Error) -> StoreError {
    let code = if err.kind() == std::io::ErrorKind::NotFound {
        StoreErrorCode::NotFound
    } else {
        StoreErrorCode::Io
    };
    StoreError::new(code, format!("{context} {}: {err}", path.display()))
}

pub(crate) fn write_and_sync(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut f = File::create(path).map_err(|e| io_error("create", path, &e))?;
    f.write_all(bytes).map_err(|e| io_error("write", path, &e))?;
    f.sync_all().map_err(|e| io_error("sync", path, &e))?;
    Ok(())
}

pub(crate) fn sync_dir(dir: &Path) -> Result<(), StoreError> {
    let f = OpenOptions::new()
        .read(true)
        .open(dir)
        .map_err(|e| io_error("open dir", dir, &e))?;
    f.sync_all().map_err(|e| io_error("sync dir", dir, &e))?;
    Ok(())
}
