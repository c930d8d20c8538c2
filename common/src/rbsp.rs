use std::borrow::Cow;

use crate::nal_unit::NalUnit;

/// Appends `rbsp` to `out`, inserting an `EMULATION_PREVENTION_BYTE` wherever two zero bytes are
/// followed by a byte in `0x00..=0x03` (clause 7.4.1).
///
/// `out` is assumed to end on a byte boundary that cannot itself be part of a zero run, e.g. the
/// NAL header.
pub fn escape_into(out: &mut Vec<u8>, rbsp: &[u8]) {
    let mut zeros = 0usize;

    for &byte in rbsp {
        if zeros >= 2 && byte <= NalUnit::EMULATION_PREVENTION_BYTE {
            out.push(NalUnit::EMULATION_PREVENTION_BYTE);
            zeros = 0;
        }

        out.push(byte);
        zeros = if byte == 0x00 { zeros + 1 } else { 0 };
    }
}

/// Removes every `EMULATION_PREVENTION_BYTE` that follows two zero bytes. Borrows when there is
/// nothing to remove.
pub fn unescape(data: &[u8]) -> Cow<'_, [u8]> {
    if !data
        .windows(3)
        .any(|w| w == [0x00, 0x00, NalUnit::EMULATION_PREVENTION_BYTE])
    {
        return Cow::Borrowed(data);
    }

    let mut out = Vec::with_capacity(data.len());
    let mut zeros = 0usize;

    for &byte in data {
        if zeros >= 2 && byte == NalUnit::EMULATION_PREVENTION_BYTE {
            zeros = 0;
            continue;
        }

        out.push(byte);
        zeros = if byte == 0x00 { zeros + 1 } else { 0 };
    }

    Cow::Owned(out)
}
