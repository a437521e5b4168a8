// common/src/wallet.rs
//! Wallet login verification.
//!
//! A login payload is accepted when it was issued for our domain, is inside
//! its validity window, and its `personal_sign` signature recovers to the
//! address it claims.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use ethers::types::{Address, Signature};
use ethers::utils::to_checksum;
use thiserror::Error;

use crate::models::login::LoginPayload;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),
    #[error("malformed signature: {0}")]
    MalformedSignature(String),
    #[error("payload domain {found} does not match {expected}")]
    DomainMismatch { expected: String, found: String },
    #[error("payload expired at {0}")]
    Expired(DateTime<Utc>),
    #[error("payload not valid before {0}")]
    NotYetValid(DateTime<Utc>),
    #[error("signature recovers to {recovered}, payload claims {claimed}")]
    AddressMismatch { claimed: String, recovered: String },
}

/// Parse a 0x-prefixed, 20-byte hex address
pub fn parse_address(address: &str) -> Result<Address, VerifyError> {
    let hex_part = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .filter(|digits| digits.len() == 40)
        .ok_or_else(|| VerifyError::InvalidAddress(address.to_string()))?;

    Address::from_str(hex_part).map_err(|_| VerifyError::InvalidAddress(address.to_string()))
}

/// Validate an address and return its EIP-55 checksummed form
pub fn normalize_address(address: &str) -> Result<String, VerifyError> {
    parse_address(address).map(|parsed| to_checksum(&parsed, None))
}

/// Recover the address that produced a `personal_sign` signature over `message`
pub fn recover_address(message: &str, signature: &str) -> Result<Address, VerifyError> {
    let signature = Signature::from_str(signature)
        .map_err(|e| VerifyError::MalformedSignature(e.to_string()))?;
    signature
        .recover(message)
        .map_err(|e| VerifyError::MalformedSignature(e.to_string()))
}

/// Verify a signed login payload and return the checksummed wallet address
pub fn verify_login_payload(
    login: &LoginPayload,
    expected_domain: &str,
    now: DateTime<Utc>,
) -> Result<String, VerifyError> {
    let payload = &login.payload;

    if payload.domain != expected_domain {
        return Err(VerifyError::DomainMismatch {
            expected: expected_domain.to_string(),
            found: payload.domain.clone(),
        });
    }
    if now < payload.invalid_before {
        return Err(VerifyError::NotYetValid(payload.invalid_before));
    }
    if now > payload.expiration_time {
        return Err(VerifyError::Expired(payload.expiration_time));
    }

    let claimed = parse_address(&payload.address)?;
    let recovered = recover_address(&payload.message(), &login.signature)?;

    if recovered != claimed {
        return Err(VerifyError::AddressMismatch {
            claimed: to_checksum(&claimed, None),
            recovered: to_checksum(&recovered, None),
        });
    }

    Ok(to_checksum(&recovered, None))
}
