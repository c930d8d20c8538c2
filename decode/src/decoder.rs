use std::fs::File;
use std::path::Path;

use common::{AccessUnits, StreamUuid};
use memmap::Mmap;

use crate::errors::DecodingError;
use crate::sei_reader::{decode_sei_metadata, inspect_sei, SeiMetadata, SeiReport};

/// A memory-mapped Annex-B elementary stream.
pub struct H264File {
    data: Mmap,
}

impl H264File {
    pub fn from_file(file: File) -> Result<Self, DecodingError> {
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(Self { data: mmap })
    }

    pub fn from_file_path(file_path: impl AsRef<Path>) -> Result<Self, DecodingError> {
        let file_path = file_path.as_ref();
        let file = File::open(file_path)?;

        // mapping a zero-length file fails with EINVAL, report it by name instead
        if file.metadata()?.len() == 0 {
            return Err(DecodingError::EmptyFile(file_path.to_path_buf()));
        }

        H264File::from_file(file)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn metadata(&self, uuid: StreamUuid) -> SeiMetadata<'_> {
        decode_sei_metadata(&self.data, uuid)
    }

    pub fn inspect(&self, uuid: StreamUuid) -> Vec<SeiReport> {
        inspect_sei(&self.data, uuid)
    }

    pub fn access_units(&self) -> AccessUnits<'_> {
        AccessUnits::new(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use common::{build_sei_nal, MetadataRecord};

    use super::*;

    #[test]
    fn test_reading_from_file() -> Result<(), DecodingError> {
        let record = MetadataRecord::new(3, 100, vec![]);
        let payload = record.to_json_bytes().unwrap();

        let mut file = tempfile::NamedTempFile::new()?;
        file.write_all(&build_sei_nal(&StreamUuid::DEFAULT, &payload))?;
        file.write_all(&[0x00, 0x00, 0x00, 0x01, 0x65, 0x88, 0x84])?;
        file.flush()?;

        let h264 = H264File::from_file_path(file.path())?;
        assert_eq!(h264.metadata(StreamUuid::DEFAULT).collect::<Vec<_>>(), vec![record]);
        assert_eq!(h264.inspect(StreamUuid::DEFAULT).len(), 1);
        assert_eq!(h264.access_units().count(), 1);

        Ok(())
    }

    #[test]
    fn test_empty_file() -> Result<(), DecodingError> {
        let file = tempfile::NamedTempFile::new()?;

        assert!(matches!(
            H264File::from_file_path(file.path()),
            Err(DecodingError::EmptyFile(_))
        ));
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            H264File::from_file_path("./does-not-exist.h264"),
            Err(DecodingError::FileError(_))
        ));
    }
}
