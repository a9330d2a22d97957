//! Durable flush of medium image files
//!
//! An image stands in for non-volatile cells, so a WRITE frame that the
//! simulated device applied must be on stable storage before the next frame
//! is answered. Plain `flush` only empties user-space buffers; this module
//! maps to the strongest data sync each platform offers.

use std::fs::File;
use std::io;

/// Block until data written to `file` reaches stable storage.
///
/// - Linux: `fdatasync`, file data only
/// - macOS/iOS: `fcntl(F_FULLFSYNC)`, also drains the drive cache
/// - Windows: `FlushFileBuffers`
/// - Elsewhere: `File::sync_data`
pub fn durable_sync(file: &File) -> io::Result<()> {
    #[cfg(target_os = "linux")]
    {
        use std::os::unix::io::AsRawFd;
        // SAFETY: the descriptor belongs to a live `File` borrowed for the call.
        let rc = unsafe { libc::fdatasync(file.as_raw_fd()) };
        if rc == 0 { Ok(()) } else { Err(io::Error::last_os_error()) }
    }

    #[cfg(any(target_os = "macos", target_os = "ios"))]
    {
        use std::os::unix::io::AsRawFd;
        // SAFETY: the descriptor belongs to a live `File` borrowed for the call.
        let rc = unsafe { libc::fcntl(file.as_raw_fd(), libc::F_FULLFSYNC) };
        if rc == 0 { Ok(()) } else { Err(io::Error::last_os_error()) }
    }

    #[cfg(target_os = "windows")]
    {
        use std::os::windows::io::AsRawHandle;
        use winapi::um::fileapi::FlushFileBuffers;
        // SAFETY: the handle belongs to a live `File` borrowed for the call.
        let ok = unsafe { FlushFileBuffers(file.as_raw_handle() as *mut _) };
        if ok != 0 { Ok(()) } else { Err(io::Error::last_os_error()) }
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "ios", target_os = "windows")))]
    {
        file.sync_data()
    }
}
