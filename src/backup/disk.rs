//! Free disk space at the backup location

use std::io;
use std::path::Path;

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Free space available to unprivileged users, in GiB
///
/// Returns 0 when the path does not exist or cannot be queried.
pub fn free_space_gib(path: &Path) -> f64 {
    if !path.exists() {
        return 0.0;
    }

    match available_bytes(path) {
        Ok(bytes) => bytes as f64 / GIB,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "could not query free space");
            0.0
        }
    }
}

/// Wraps a return value from a `libc` function into an `io::Result`.
#[cfg(unix)]
fn check_error_int(ret: libc::c_int) -> io::Result<libc::c_int> {
    if ret == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(ret)
}

/// A safe wrapper for `libc::statvfs`.
#[cfg(unix)]
pub fn available_bytes(path: &Path) -> io::Result<u64> {
    use std::ffi::CString;
    use std::mem::MaybeUninit;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let mut stat = MaybeUninit::<libc::statvfs>::uninit();
    check_error_int(unsafe { libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) })?;
    // SAFETY: statvfs returned success, so the struct is fully initialized
    let stat = unsafe { stat.assume_init() };

    #[allow(clippy::unnecessary_cast)]
    let bytes = (stat.f_bavail as u64).saturating_mul(stat.f_frsize as u64);
    Ok(bytes)
}

#[cfg(not(unix))]
pub fn available_bytes(_path: &Path) -> io::Result<u64> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "free space query is only implemented on unix",
    ))
}
