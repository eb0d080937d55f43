use std::io::Write;
use tracing::debug;
use crate::keygen::error::KeyError;

pub const DER_TAG_INTEGER: u8 = 0x02;
pub const DER_TAG_SEQUENCE: u8 = 0x30;

/// Unsigned big-endian integer as ASN.1 INTEGER content: a `0x00` byte is
/// prepended when the top bit of the first byte is set.
pub fn pad_sign(bytes: &[u8]) -> Vec<u8> {
    match bytes.first() {
        Some(b) if b & 0x80 != 0 => {
            let mut res = Vec::with_capacity(bytes.len() + 1);
            res.push(0);
            res.extend_from_slice(bytes);
            res
        }
        _ => bytes.to_vec(),
    }
}

fn checked_length(length: usize) -> Result<u32, KeyError> {
    u32::try_from(length).map_err(|_| KeyError::FormatError(format!("field of {} bytes is too long", length)))
}

/// Definite length: short form below 0x80, then `0x82` + 2 bytes up to
/// 0x7fff, otherwise `0x84` + 4 bytes.
pub fn encode_der_length(writer: &mut impl Write, length: usize) -> Result<(), KeyError> {
    let length = checked_length(length)?;
    if length < 0x80 {
        writer.write_all(&[length as u8])?;
    } else if length <= 0x7fff {
        writer.write_all(&[0x82])?;
        writer.write_all(&(length as u16).to_be_bytes())?;
    } else {
        writer.write_all(&[0x84])?;
        writer.write_all(&length.to_be_bytes())?;
    }
    Ok(())
}

/// DER SEQUENCE of INTEGERs, one per field, in order.
pub fn encode_der_sequence<T: AsRef<[u8]>>(fields: &[T]) -> Result<Vec<u8>, KeyError> {
    let mut payload = Vec::new();
    for field in fields {
        let content = pad_sign(field.as_ref());
        payload.push(DER_TAG_INTEGER);
        encode_der_length(&mut payload, content.len())?;
        payload.extend_from_slice(&content);
    }
    let mut res = Vec::with_capacity(payload.len() + 6);
    res.push(DER_TAG_SEQUENCE);
    encode_der_length(&mut res, payload.len())?;
    res.extend_from_slice(&payload);
    debug!("encoded {} integers into {} DER bytes", fields.len(), res.len());
    Ok(res)
}

pub fn encode_ssh_length(writer: &mut impl Write, length: usize) -> Result<(), KeyError> {
    writer.write_all(&checked_length(length)?.to_be_bytes())?;
    Ok(())
}

/// SSH wire blob: every field as a 4-byte big-endian length and its
/// sign-padded content.
pub fn encode_ssh_fields<T: AsRef<[u8]>>(fields: &[T]) -> Result<Vec<u8>, KeyError> {
    let mut res = Vec::new();
    for field in fields {
        let content = pad_sign(field.as_ref());
        encode_ssh_length(&mut res, content.len())?;
        res.extend_from_slice(&content);
    }
    Ok(res)
}
