//! Administrator check for the commands that change the SCM database.

use anyhow::Result;

/// Whether the process token carries the elevated (admin) flag.
#[cfg(target_os = "windows")]
pub fn is_elevated() -> bool {
    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::Security::{GetTokenInformation, TokenElevation, TOKEN_ELEVATION, TOKEN_QUERY};
    use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

    let mut token = HANDLE::default();
    // SAFETY: the pseudo handle from GetCurrentProcess needs no cleanup and
    // `token` is closed below once the query is done.
    if unsafe { OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token) }.is_err() {
        return false;
    }

    let mut elevation = TOKEN_ELEVATION::default();
    let mut written = 0u32;
    // SAFETY: the buffer is a live TOKEN_ELEVATION and its exact size is passed.
    let queried = unsafe {
        GetTokenInformation(
            token,
            TokenElevation,
            Some(std::ptr::addr_of_mut!(elevation).cast()),
            std::mem::size_of::<TOKEN_ELEVATION>() as u32,
            &mut written,
        )
    };
    // SAFETY: `token` was opened above and is not used after this point.
    let _ = unsafe { CloseHandle(token) };

    queried.is_ok() && elevation.TokenIsElevated != 0
}

#[cfg(not(target_os = "windows"))]
pub fn is_elevated() -> bool {
    false
}

pub fn ensure_elevated() -> Result<()> {
    if !is_elevated() {
        anyhow::bail!("this command must be run as Administrator (use an elevated command prompt)");
    }
    Ok(())
}

#[cfg(all(test, not(target_os = "windows")))]
mod tests {
    use super::*;

    #[test]
    fn test_never_elevated_off_windows() {
        assert!(!is_elevated());
        let err = ensure_elevated().unwrap_err();
        assert!(err.to_string().contains("Administrator"));
    }
}
