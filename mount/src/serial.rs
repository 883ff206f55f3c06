use crate::error::MountError;
use md5::{Digest, Md5};
use uuid::Uuid;

/// Derive the device serial from a mount identifier. Separator dashes are
/// stripped before decoding, so identifiers differing only in dash placement
/// map to the same serial. A UUID identifier yields 16 bytes and therefore a
/// 20-character serial, which fits the virtio serial limit.
pub fn identifier_serial(identifier: &str) -> Result<String, MountError> {
    let stripped: String = identifier.chars().filter(|c| *c != '-').collect();
    if !stripped.is_ascii() {
        return Err(MountError::InvalidIdentifier(identifier.to_string()));
    }
    // A trailing odd nibble carries no byte; drop it.
    let even = &stripped[..stripped.len() & !1];
    let bytes =
        hex::decode(even).map_err(|_| MountError::InvalidIdentifier(identifier.to_string()))?;
    Ok(base85(&bytes))
}

/// Serial for an auxiliary volume: a digest of the file path rather than a
/// request identifier, so the same path always lands on the same serial.
pub fn content_serial(path: &str) -> String {
    base85(Md5::digest(path.as_bytes()).as_slice())
}

/// Random node-name/device-id tag: 16 lowercase alphabetic characters.
pub fn device_tag() -> String {
    Uuid::new_v4()
        .into_bytes()
        .iter()
        .map(|b| char::from(b'a' + (b % 26)))
        .collect()
}

/// Plain base-85 over the `!`..`u` alphabet, most significant digit first,
/// with no all-zero shorthand and no frame delimiters, so output length is a
/// pure function of input length.
fn base85(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() / 4 * 5 + 5);
    for chunk in data.chunks(4) {
        let mut group = [0u8; 4];
        group[..chunk.len()].copy_from_slice(chunk);
        let mut value = u32::from_be_bytes(group);
        let mut digits = [0u8; 5];
        for digit in digits.iter_mut().rev() {
            *digit = (value % 85) as u8;
            value /= 85;
        }
        for digit in &digits[..chunk.len() + 1] {
            out.push(char::from(b'!' + digit));
        }
    }
    out
}
