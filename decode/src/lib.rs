mod decoder;
mod errors;
mod json_span;
mod sei_reader;

pub use decoder::H264File;
pub use errors::DecodingError;
pub use json_span::find_json_object;
pub use sei_reader::{
    decode_sei_metadata, inspect_sei, SeiMetadata, SeiOutcome, SeiReport, SeiReports,
};
