pub mod access_unit;
pub mod byte_stream;
pub mod errors;
pub mod metadata;
pub mod nal_unit;
pub mod rbsp;
pub mod sei;
pub mod stream_uuid;

pub use access_unit::AccessUnits;
pub use byte_stream::{contains_idr, find_next_nal, find_start_code, ByteStream};
pub use errors::UuidError;
pub use metadata::{Detection, MetadataRecord, METADATA_VERSION, RESERVED_KEYS};
pub use nal_unit::{NalUnit, NalUnitType};
pub use sei::{build_sei_nal, SeiMessage, SeiMessages};
pub use stream_uuid::{StreamUuid, X264_UUID};
