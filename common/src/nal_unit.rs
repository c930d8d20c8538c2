/// `NalUnit` is a syntax structure containing an indication of the type of data to follow and bytes
/// containing that data in the form of an `RBSP` interspersed as necessary with
/// `EMULATION_PREVENTION_BYTE`.
///
/// A `NalUnit` is a view into a scanned buffer: it starts at the header byte right after a start
/// code and runs up to the next start code (or the end of the buffer).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct NalUnit<'a> {
    /// Offset of the header byte in the scanned buffer.
    offset: usize,

    /// Length of the start code that precedes the header, either 3 or 4.
    start_code_len: usize,

    /// Header byte followed by the (still escaped) payload.
    data: &'a [u8],
}

impl<'a> NalUnit<'a> {
    /// A unique sequence of three bytes equal to `0x000001` embedded in the byte stream as a prefix
    /// to each `NalUnit`. The location of a `START_CODE_PREFIX` can be used by a decoder to identify
    /// the beginning of a new `NAL unit` and the end of a previous NAL unit. Emulation of start code
    /// prefixes is prevented within NAL units by the inclusion of `EMULATION_PREVENTION_BYTE`.
    pub const START_CODE_PREFIX: [u8; 3] = [0x00, 0x00, 0x01];

    /// The `zero_byte` followed by `START_CODE_PREFIX`. Every unit written by this crate uses it.
    pub const LONG_START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

    /// A byte equal to 0x03 that may be present within a `NalUnit`.
    /// The presence of this byte ensures no sequence of consecutive byte-aligned bytes in the
    /// `NALUnit` contains a `START_CODE_PREFIX`.
    pub const EMULATION_PREVENTION_BYTE: u8 = 0x03;

    /// `data` must be non-empty and begin with the header byte.
    pub(crate) fn new(offset: usize, start_code_len: usize, data: &'a [u8]) -> Self {
        debug_assert!(!data.is_empty(), "a NAL unit always carries its header byte");
        Self {
            offset,
            start_code_len,
            data,
        }
    }

    pub fn header(&self) -> u8 {
        self.data[0]
    }

    /// `forbidden_zero_bit` shall be equal to 0.
    pub fn forbidden_zero_bit(&self) -> bool {
        self.header() >> 7 == 1
    }

    /// `nal_ref_idc` not equal to 0 specifies that the content of the NAL unit contains a
    /// sequence parameter set, a picture parameter set or a slice of a reference picture.
    ///
    /// `nal_ref_idc` shall be equal to 0 for all NAL units having nal_unit_type equal to 6, 9, 10,
    /// 11, or 12.
    pub fn nal_ref_idc(&self) -> u8 {
        (self.header() >> 5) & 0b11
    }

    /// `nal_unit_type` specifies the type of `RBSP` data structure contained in the NAL unit.
    pub fn nal_unit_type(&self) -> u8 {
        self.header() & 0b0001_1111
    }

    pub fn kind(&self) -> NalUnitType {
        NalUnitType::from_nal_unit_type(self.nal_unit_type())
    }

    /// Offset of the header byte in the scanned buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Offset of the start code that introduced this unit.
    pub fn start_code_offset(&self) -> usize {
        self.offset - self.start_code_len
    }

    pub fn start_code_len(&self) -> usize {
        self.start_code_len
    }

    /// Offset one past the last byte of this unit.
    pub fn end(&self) -> usize {
        self.offset + self.data.len()
    }

    /// Header byte plus payload, exactly as found in the buffer.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Bytes after the header byte.
    pub fn payload(&self) -> &'a [u8] {
        &self.data[1..]
    }

    pub fn is_idr(&self) -> bool {
        self.kind() == NalUnitType::CodedSliceIDRPicture
    }

    pub fn is_sei(&self) -> bool {
        self.kind() == NalUnitType::SupplementalEnhancementInformation
    }

    /// For slice units, `first_mb_in_slice` is the first `ue(v)` of the slice header. It is 0
    /// exactly when the first payload bit is set.
    pub fn starts_picture(&self) -> bool {
        self.kind().is_vcl() && self.data.get(1).is_some_and(|b| b & 0x80 != 0)
    }
}

/// `nal_unit_type` values pulled from Table 7-1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NalUnitType {
    Unspecified,
    CodedSliceNonIDRPicture,
    CodedSliceDataPartitionA,
    CodedSliceDataPartitionB,
    CodedSliceDataPartitionC,
    CodedSliceIDRPicture,
    SupplementalEnhancementInformation,
    SequenceParameterSet,
    PictureParameterSet,
    AccessUnitDelimiter,
    SequenceEnd,
    StreamEnd,
    FillerData,
    SequenceParameterSetExtension,
    PrefixNALUnit,
    SubsetSequenceParameterSet,
    DepthParameterSet,
    Reserved,
    CodedSliceAuxiliaryCodedPictureNonPartitioning,
    CodedSliceExtension,
    CodedSliceExtensionDepthViewComponent,
}

impl NalUnitType {
    /// Only the low five bits are looked at, so every header byte maps to a variant.
    pub fn from_nal_unit_type(nal_unit_type: u8) -> Self {
        match nal_unit_type & 0b0001_1111 {
            1 => NalUnitType::CodedSliceNonIDRPicture,
            2 => NalUnitType::CodedSliceDataPartitionA,
            3 => NalUnitType::CodedSliceDataPartitionB,
            4 => NalUnitType::CodedSliceDataPartitionC,
            5 => NalUnitType::CodedSliceIDRPicture,
            6 => NalUnitType::SupplementalEnhancementInformation,
            7 => NalUnitType::SequenceParameterSet,
            8 => NalUnitType::PictureParameterSet,
            9 => NalUnitType::AccessUnitDelimiter,
            10 => NalUnitType::SequenceEnd,
            11 => NalUnitType::StreamEnd,
            12 => NalUnitType::FillerData,
            13 => NalUnitType::SequenceParameterSetExtension,
            14 => NalUnitType::PrefixNALUnit,
            15 => NalUnitType::SubsetSequenceParameterSet,
            16 => NalUnitType::DepthParameterSet,
            17 | 18 | 22 | 23 => NalUnitType::Reserved,
            19 => NalUnitType::CodedSliceAuxiliaryCodedPictureNonPartitioning,
            20 => NalUnitType::CodedSliceExtension,
            21 => NalUnitType::CodedSliceExtensionDepthViewComponent,
            _ => NalUnitType::Unspecified,
        }
    }

    /// Slices of the primary coded picture (types 1 to 5).
    pub fn is_vcl(&self) -> bool {
        matches!(
            self,
            NalUnitType::CodedSliceNonIDRPicture
                | NalUnitType::CodedSliceDataPartitionA
                | NalUnitType::CodedSliceDataPartitionB
                | NalUnitType::CodedSliceDataPartitionC
                | NalUnitType::CodedSliceIDRPicture
        )
    }

    /// Units that, once a picture has been seen, can only belong to the next access unit
    /// (clause 7.4.1.2.3).
    pub fn opens_access_unit(&self) -> bool {
        matches!(
            self,
            NalUnitType::AccessUnitDelimiter
                | NalUnitType::SequenceParameterSet
                | NalUnitType::PictureParameterSet
                | NalUnitType::SupplementalEnhancementInformation
                | NalUnitType::PrefixNALUnit
                | NalUnitType::SubsetSequenceParameterSet
                | NalUnitType::DepthParameterSet
                | NalUnitType::Reserved
        )
    }
}
