//! C ABI for host applications.
//!
//! ```c
//! char *fp = audiosig_get_signature("/music/song.flac");
//! if (fp == NULL) {
//!     const char *error = audiosig_last_error();
//!     fprintf(stderr, "no fingerprint: %s\n", error ? error : "unknown error");
//! } else {
//!     puts(fp);
//!     audiosig_free_signature(fp);
//! }
//! ```

use crate::signature::audio_signature;
use std::cell::RefCell;
use std::ffi::{CStr, CString, c_char};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::ptr;

thread_local! {
    /// Message of the last failed call on this thread.
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(message: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(message.replace('\0', " ")).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Computes the fingerprint of the first 120 seconds of a file.
///
/// Returns an owned NUL-terminated string that must be released with
/// [`audiosig_free_signature`], or null on failure. Audio too short or too
/// quiet to fingerprint also returns null.
///
/// # Safety
///
/// `path` must be null or point to a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn audiosig_get_signature(path: *const c_char) -> *mut c_char {
    clear_last_error();

    if path.is_null() {
        set_last_error("path is null");
        return ptr::null_mut();
    }

    // SAFETY: caller guarantees a valid NUL-terminated string.
    let path = match unsafe { CStr::from_ptr(path) }.to_str() {
        Ok(path) => path.to_owned(),
        Err(_) => {
            set_last_error("path is not valid UTF-8");
            return ptr::null_mut();
        }
    };

    let outcome = catch_unwind(AssertUnwindSafe(|| audio_signature(&path)));
    match outcome {
        Ok(Ok(Some(fingerprint))) => match CString::new(fingerprint) {
            Ok(c) => c.into_raw(),
            Err(_) => {
                set_last_error("fingerprint contains a NUL byte");
                ptr::null_mut()
            }
        },
        Ok(Ok(None)) => {
            set_last_error("not enough audio to fingerprint");
            ptr::null_mut()
        }
        Ok(Err(e)) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
        Err(_) => {
            set_last_error("internal error while fingerprinting");
            ptr::null_mut()
        }
    }
}

/// Releases a string returned by [`audiosig_get_signature`].
///
/// # Safety
///
/// `signature` must be null or a pointer returned by
/// `audiosig_get_signature` that has not been freed yet.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn audiosig_free_signature(signature: *mut c_char) {
    if !signature.is_null() {
        // SAFETY: the pointer came from CString::into_raw.
        drop(unsafe { CString::from_raw(signature) });
    }
}

/// Message describing why the last call on this thread returned null, or
/// null. The pointer stays valid until the next call on the same thread.
#[unsafe(no_mangle)]
pub extern "C" fn audiosig_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match e.borrow().as_ref() {
        Some(message) => message.as_ptr(),
        None => ptr::null(),
    })
}
