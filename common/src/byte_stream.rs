use crate::nal_unit::NalUnit;

/// Returns the offset and length of the earliest start code at or after `from`.
///
/// A four-byte `0x00000001` is preferred over the three-byte `0x000001` it contains, since it
/// begins one byte earlier.
pub fn find_start_code(data: &[u8], from: usize) -> Option<(usize, usize)> {
    let mut cursor = from;

    while cursor + NalUnit::START_CODE_PREFIX.len() <= data.len() {
        /*
        Every start code has a 0x00 or 0x01 at its third byte. If the byte at cursor + 2 is
        anything else, no start code can begin at cursor, cursor + 1 or cursor + 2:

            [.., 0x00, 0x00, 0x42, ..]
                 | <-- cursor     | <-- next candidate
         */
        if data[cursor + 2] > 0x01 {
            cursor += 3;
            continue;
        }

        if data[cursor..].starts_with(&NalUnit::LONG_START_CODE) {
            return Some((cursor, NalUnit::LONG_START_CODE.len()));
        }

        if data[cursor..].starts_with(&NalUnit::START_CODE_PREFIX) {
            return Some((cursor, NalUnit::START_CODE_PREFIX.len()));
        }

        cursor += 1;
    }

    None
}

/// Finds the first NAL unit whose start code begins at or after `from`.
///
/// The unit runs from its header byte up to the next start code or the end of `data`. A start
/// code with nothing after it is not a unit.
pub fn find_next_nal(data: &[u8], from: usize) -> Option<NalUnit<'_>> {
    let (start_code, start_code_len) = find_start_code(data, from)?;
    let header = start_code + start_code_len;

    if header >= data.len() {
        return None;
    }

    let end = find_start_code(data, header + 1).map_or(data.len(), |(next, _)| next);

    Some(NalUnit::new(header, start_code_len, &data[header..end]))
}

/// Whether any unit in `data` is a coded slice of an IDR picture.
pub fn contains_idr(data: &[u8]) -> bool {
    ByteStream::new(data).any(|nal| nal.is_idr())
}

/// `ByteStream` is an encapsulation of a NAL unit stream containing `START_CODE_PREFIX` and `NalUnit`.
///
/// Iterating yields every unit in byte order. After each unit the scan resumes one byte past its
/// header, so malformed input is re-scanned by at most one byte and never loops.
#[derive(Debug, Clone)]
pub struct ByteStream<'a> {
    cursor: usize,
    data: &'a [u8],
}

impl<'a> ByteStream<'a> {
    /// `data` should be an ordered stream of bytes consisting of a sequence of byte stream
    /// `NalUnit` syntax structures. Bytes before the first start code are ignored.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, cursor: 0 }
    }
}

impl<'a> Iterator for ByteStream<'a> {
    type Item = NalUnit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let nal = find_next_nal(self.data, self.cursor)?;
        self.cursor = nal.offset() + 1;
        Some(nal)
    }
}
