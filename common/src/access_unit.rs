use crate::byte_stream::ByteStream;
use crate::nal_unit::NalUnitType;

/// Splits an Annex-B elementary stream into access units.
///
/// Each item is a contiguous slice of the input, start codes included. A new access unit begins
/// at an access unit delimiter, or, once the current one holds a slice, at a unit that may only
/// precede a primary coded picture (SPS, PPS, SEI, ...) or at a slice with `first_mb_in_slice`
/// equal to 0. Bytes before the first start code are dropped.
#[derive(Debug, Clone)]
pub struct AccessUnits<'a> {
    data: &'a [u8],
    nals: ByteStream<'a>,
    start: Option<usize>,
    seen_vcl: bool,
}

impl<'a> AccessUnits<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            nals: ByteStream::new(data),
            start: None,
            seen_vcl: false,
        }
    }
}

impl<'a> Iterator for AccessUnits<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        for nal in self.nals.by_ref() {
            let kind = nal.kind();
            let unit_start = nal.start_code_offset();

            let Some(start) = self.start else {
                self.start = Some(unit_start);
                self.seen_vcl = kind.is_vcl();
                continue;
            };

            let boundary = kind == NalUnitType::AccessUnitDelimiter
                || (self.seen_vcl && (kind.opens_access_unit() || nal.starts_picture()));

            if boundary {
                self.start = Some(unit_start);
                self.seen_vcl = kind.is_vcl();
                return Some(&self.data[start..unit_start]);
            }

            self.seen_vcl |= kind.is_vcl();
        }

        let start = self.start.take()?;
        Some(&self.data[start..])
    }
}
