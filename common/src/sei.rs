use crate::nal_unit::NalUnit;
use crate::rbsp;
use crate::stream_uuid::StreamUuid;

/// NAL header of every SEI unit written here: `forbidden_zero_bit` 0, `nal_ref_idc` 0,
/// `nal_unit_type` 6.
pub const SEI_NAL_HEADER: u8 = 0x06;

/// `payloadType` of the `user_data_unregistered` SEI message (Annex D).
pub const USER_DATA_UNREGISTERED: usize = 5;

/// `rbsp_stop_one_bit` followed by the alignment zero bits.
pub const RBSP_STOP_BYTE: u8 = 0x80;

/// Each `0xFF` byte of a `payloadType` or `payloadSize` field is worth 255.
const CONTINUATION_BYTE: u8 = 0xff;

/// Appends `value` in the `ff_byte* last_byte` form shared by `payloadType` and `payloadSize`.
pub fn write_sei_value(out: &mut Vec<u8>, mut value: usize) {
    while value >= CONTINUATION_BYTE as usize {
        out.push(CONTINUATION_BYTE);
        value -= CONTINUATION_BYTE as usize;
    }
    out.push(value as u8);
}

/// Reads a `payloadType` or `payloadSize` starting at `*pos`, leaving `*pos` past its last byte.
///
/// Returns `None` when `data` ends before the terminating (non-`0xFF`) byte.
pub fn read_sei_value(data: &[u8], pos: &mut usize) -> Option<usize> {
    let mut value = 0usize;

    loop {
        let byte = *data.get(*pos)?;
        *pos += 1;
        value += byte as usize;

        if byte != CONTINUATION_BYTE {
            return Some(value);
        }
    }
}

/// One `sei_message()` of an SEI RBSP.
///
/// `payload_size` counts the body only. `body` is shorter than `payload_size` when the unit was
/// cut off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeiMessage<'a> {
    pub payload_type: usize,
    pub payload_size: usize,
    /// Offset of the first `payloadType` byte within the RBSP.
    pub offset: usize,
    pub body: &'a [u8],
}

impl<'a> SeiMessage<'a> {
    pub fn is_truncated(&self) -> bool {
        self.body.len() < self.payload_size
    }

    pub fn is_user_data_unregistered(&self) -> bool {
        self.payload_type == USER_DATA_UNREGISTERED
    }

    /// Splits a `user_data_unregistered` body into its UUID and user data. The user data is
    /// whatever follows the UUID, up to `payload_size`.
    pub fn user_data_unregistered(&self) -> Option<(StreamUuid, &'a [u8])> {
        if !self.is_user_data_unregistered() || self.body.len() < StreamUuid::LEN {
            return None;
        }

        let (uuid, user_data) = self.body.split_at(StreamUuid::LEN);
        StreamUuid::from_slice(uuid).ok().map(|uuid| (uuid, user_data))
    }
}

/// Iterates over the `sei_message()`s of an SEI RBSP (the NAL payload after the header, with
/// emulation prevention already removed).
///
/// Iteration stops at the trailing bits, at a header that runs past the end of the data, or
/// after a message whose body was cut off.
#[derive(Debug, Clone)]
pub struct SeiMessages<'a> {
    rbsp: &'a [u8],
    cursor: usize,
    done: bool,
}

impl<'a> SeiMessages<'a> {
    pub fn new(rbsp: &'a [u8]) -> Self {
        Self {
            rbsp,
            cursor: 0,
            done: false,
        }
    }

    fn at_trailing_bits(&self) -> bool {
        match self.rbsp[self.cursor..].split_first() {
            Some((&RBSP_STOP_BYTE, rest)) => rest.iter().all(|&b| b == 0x00),
            Some(_) => false,
            None => true,
        }
    }
}

impl<'a> Iterator for SeiMessages<'a> {
    type Item = SeiMessage<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.at_trailing_bits() {
            return None;
        }

        let offset = self.cursor;
        let mut pos = self.cursor;
        let payload_type = read_sei_value(self.rbsp, &mut pos);
        let payload_size = read_sei_value(self.rbsp, &mut pos);

        let (Some(payload_type), Some(payload_size)) = (payload_type, payload_size) else {
            self.done = true;
            return None;
        };

        let end = pos.saturating_add(payload_size).min(self.rbsp.len());
        let message = SeiMessage {
            payload_type,
            payload_size,
            offset,
            body: &self.rbsp[pos..end],
        };

        self.cursor = end;
        self.done = message.is_truncated();
        Some(message)
    }
}

/// Exact length of the unit `build_sei_nal` produces for a payload of `payload_len` bytes, before
/// any emulation prevention bytes.
pub fn sei_nal_len(payload_len: usize) -> usize {
    let body_len = StreamUuid::LEN + payload_len;

    NalUnit::LONG_START_CODE.len()
        + 1
        + encoded_value_len(USER_DATA_UNREGISTERED)
        + encoded_value_len(body_len)
        + body_len
        + 1
}

fn encoded_value_len(value: usize) -> usize {
    value / CONTINUATION_BYTE as usize + 1
}

/// Builds a complete SEI NAL unit, start code included, holding one `user_data_unregistered`
/// message made of `uuid` followed by `payload`.
///
/// Everything after the NAL header goes through emulation prevention, so the unit never contains
/// a start code no matter what `payload` holds.
pub fn build_sei_nal(uuid: &StreamUuid, payload: &[u8]) -> Vec<u8> {
    let body_len = StreamUuid::LEN + payload.len();

    let mut sei_rbsp = Vec::with_capacity(sei_nal_len(payload.len()));
    write_sei_value(&mut sei_rbsp, USER_DATA_UNREGISTERED);
    write_sei_value(&mut sei_rbsp, body_len);
    sei_rbsp.extend_from_slice(uuid.as_bytes());
    sei_rbsp.extend_from_slice(payload);
    sei_rbsp.push(RBSP_STOP_BYTE);

    let mut nal = Vec::with_capacity(NalUnit::LONG_START_CODE.len() + 1 + sei_rbsp.len());
    nal.extend_from_slice(&NalUnit::LONG_START_CODE);
    nal.push(SEI_NAL_HEADER);
    rbsp::escape_into(&mut nal, &sei_rbsp);
    nal
}
