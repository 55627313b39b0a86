//! C ABI for embedding the hasher and signer (feature `ffi`)
//!
//! Every function returns a heap string owned by the caller, released with
//! [`free_string`]. Failures come back as the error message string.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use crate::error::{Result, SignerError};
use crate::signer::sign_message;
use crate::snip12::{compute_order_hash, StarknetDomain};

/// Borrow a C string argument as UTF-8
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string valid for the call.
unsafe fn arg<'a>(name: &str, ptr: *const c_char) -> Result<&'a str> {
    if ptr.is_null() {
        return Err(SignerError::parse(name, "null pointer"));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map_err(|_| SignerError::parse(name, "not valid UTF-8"))
}

fn into_c_string(result: Result<String>) -> *mut c_char {
    let text = result.unwrap_or_else(|e| e.to_string());
    // Neither hex output nor error messages built from UTF-8 `&str` inputs
    // contain interior NULs
    CString::new(text)
        .unwrap_or_else(|_| CString::from(c"invalid output"))
        .into_raw()
}

/// Order hash from 10 order fields and 4 domain fields
///
/// # Safety
/// Every pointer must be null or a valid NUL-terminated string.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn get_order_hash_ffi(
    position_id: *const c_char,
    base_asset_id_hex: *const c_char,
    base_amount: *const c_char,
    quote_asset_id_hex: *const c_char,
    quote_amount: *const c_char,
    fee_asset_id_hex: *const c_char,
    fee_amount: *const c_char,
    expiration: *const c_char,
    salt: *const c_char,
    user_pubkey_hex: *const c_char,
    domain_name: *const c_char,
    domain_version: *const c_char,
    domain_chain_id: *const c_char,
    domain_revision: *const c_char,
) -> *mut c_char {
    let result = (|| {
        let fields = [
            arg("position_id", position_id)?,
            arg("base_asset_id", base_asset_id_hex)?,
            arg("base_amount", base_amount)?,
            arg("quote_asset_id", quote_asset_id_hex)?,
            arg("quote_amount", quote_amount)?,
            arg("fee_asset_id", fee_asset_id_hex)?,
            arg("fee_amount", fee_amount)?,
            arg("expiration", expiration)?,
            arg("salt", salt)?,
            arg("user_public_key", user_pubkey_hex)?,
        ];
        let domain = StarknetDomain::new(
            arg("domain_name", domain_name)?,
            arg("domain_version", domain_version)?,
            arg("domain_chain_id", domain_chain_id)?,
            arg("domain_revision", domain_revision)?,
        );
        compute_order_hash(&fields, &domain)
    })();
    into_c_string(result)
}

/// Signature string for a hex message hash and hex private key
///
/// # Safety
/// Both pointers must be null or valid NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn sign_message_ffi(
    msg_hex: *const c_char,
    priv_hex: *const c_char,
) -> *mut c_char {
    let result = (|| sign_message(arg("msg_hex", msg_hex)?, arg("priv_hex", priv_hex)?))();
    into_c_string(result)
}

/// Release a string returned by this module
///
/// # Safety
/// `s` must be null or a pointer previously returned by this module and not
/// yet freed.
#[no_mangle]
pub unsafe extern "C" fn free_string(s: *mut c_char) {
    if s.is_null() {
        return;
    }
    drop(CString::from_raw(s));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn take(ptr: *mut c_char) -> String {
        let text = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string();
        unsafe { free_string(ptr) };
        text
    }

    #[test]
    fn test_order_hash_and_sign() {
        let args: Vec<CString> = [
            "100", "0x2", "100", "0x1", "-156", "0x1", "74", "100", "123",
            "0x5d05989e9302dcebc74e241001e3e3ac3f4402ccf2f8e6f74b034b07ad6a904",
            "Perpetuals", "v0", "SN_SEPOLIA", "1",
        ]
        .iter()
        .map(|s| CString::new(*s).unwrap())
        .collect();
        let p: Vec<*const c_char> = args.iter().map(|s| s.as_ptr()).collect();

        let hash = take(unsafe {
            get_order_hash_ffi(
                p[0], p[1], p[2], p[3], p[4], p[5], p[6], p[7], p[8], p[9], p[10], p[11], p[12],
                p[13],
            )
        });
        assert_eq!(hash, "0x4de4c009e0d0c5a70a7da0e2039fb2b99f376d53496f89d9f437e736add6b48");

        let hash_c = CString::new(hash).unwrap();
        let key_c =
            CString::new("0x1234def56789012345678901234567890123456789012345678901234567890")
                .unwrap();
        let signature = take(unsafe { sign_message_ffi(hash_c.as_ptr(), key_c.as_ptr()) });
        assert_eq!(signature.len(), 192);
    }

    #[test]
    fn test_null_pointer_is_error_string() {
        let key_c = CString::new("0x1").unwrap();
        let out = take(unsafe { sign_message_ffi(std::ptr::null(), key_c.as_ptr()) });
        assert!(out.contains("null pointer"));
        unsafe { free_string(std::ptr::null_mut()) };
    }
}
