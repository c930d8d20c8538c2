use std::collections::VecDeque;

use common::rbsp;
use common::{ByteStream, MetadataRecord, SeiMessage, SeiMessages, StreamUuid};
use tracing::trace;

use crate::json_span::find_json_object;

/// What became of one SEI message.
#[derive(Debug, Clone, PartialEq)]
pub enum SeiOutcome {
    /// Our UUID and a well-formed metadata document.
    Matched(MetadataRecord),
    /// `payloadType` other than `user_data_unregistered`; never looked into.
    NotUserData,
    /// Fewer than 16 bytes left for the UUID.
    Truncated,
    /// Somebody else's `user_data_unregistered`.
    ForeignUuid,
    /// No balanced `{ ... }` in the user data.
    NoJsonObject,
    /// A balanced span that is not UTF-8 or not a metadata document.
    InvalidJson(String),
}

/// One SEI message found in a buffer, with the reason it was or was not extracted.
#[derive(Debug, Clone, PartialEq)]
pub struct SeiReport {
    /// Offset of the header byte of the SEI NAL unit holding the message.
    pub nal_offset: usize,
    pub payload_type: usize,
    pub payload_size: usize,
    pub uuid: Option<StreamUuid>,
    pub outcome: SeiOutcome,
}

impl SeiReport {
    fn from_message(nal_offset: usize, message: &SeiMessage<'_>, expected: &StreamUuid) -> Self {
        let mut report = SeiReport {
            nal_offset,
            payload_type: message.payload_type,
            payload_size: message.payload_size,
            uuid: None,
            outcome: SeiOutcome::NotUserData,
        };

        if !message.is_user_data_unregistered() {
            return report;
        }

        let Some((uuid, user_data)) = message.user_data_unregistered() else {
            report.outcome = SeiOutcome::Truncated;
            return report;
        };
        report.uuid = Some(uuid);

        report.outcome = if uuid != *expected {
            SeiOutcome::ForeignUuid
        } else {
            parse_user_data(user_data)
        };
        report
    }

    pub fn is_match(&self) -> bool {
        matches!(self.outcome, SeiOutcome::Matched(_))
    }
}

fn parse_user_data(user_data: &[u8]) -> SeiOutcome {
    let Some(span) = find_json_object(user_data) else {
        return SeiOutcome::NoJsonObject;
    };

    match MetadataRecord::from_json_slice(span) {
        Ok(record) => SeiOutcome::Matched(record),
        Err(e) => SeiOutcome::InvalidJson(e.to_string()),
    }
}

/// Lazily walks every SEI message of every SEI NAL unit in a buffer, in byte order.
#[derive(Debug, Clone)]
pub struct SeiReports<'a> {
    nals: ByteStream<'a>,
    expected: StreamUuid,
    pending: VecDeque<SeiReport>,
}

impl<'a> SeiReports<'a> {
    pub fn new(data: &'a [u8], expected: StreamUuid) -> Self {
        Self {
            nals: ByteStream::new(data),
            expected,
            pending: VecDeque::new(),
        }
    }
}

impl<'a> Iterator for SeiReports<'a> {
    type Item = SeiReport;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(report) = self.pending.pop_front() {
                return Some(report);
            }

            let nal = self.nals.find(|nal| nal.is_sei())?;
            let sei_rbsp = rbsp::unescape(nal.payload());

            for message in SeiMessages::new(&sei_rbsp) {
                self.pending
                    .push_back(SeiReport::from_message(nal.offset(), &message, &self.expected));
            }
        }
    }
}

/// The metadata records carried under `expected` in `data`, in the order they appear.
///
/// Anything that is not a complete, well-formed message with the right UUID is skipped.
#[derive(Debug, Clone)]
pub struct SeiMetadata<'a> {
    reports: SeiReports<'a>,
}

impl<'a> Iterator for SeiMetadata<'a> {
    type Item = MetadataRecord;

    fn next(&mut self) -> Option<Self::Item> {
        for report in self.reports.by_ref() {
            match report.outcome {
                SeiOutcome::Matched(record) => return Some(record),
                outcome => trace!(
                    nal_offset = report.nal_offset,
                    payload_type = report.payload_type,
                    payload_size = report.payload_size,
                    ?outcome,
                    "skipping SEI message"
                ),
            }
        }

        None
    }
}

pub fn decode_sei_metadata(data: &[u8], expected: StreamUuid) -> SeiMetadata<'_> {
    SeiMetadata {
        reports: SeiReports::new(data, expected),
    }
}

/// Every SEI message in `data`, matched or not.
pub fn inspect_sei(data: &[u8], expected: StreamUuid) -> Vec<SeiReport> {
    SeiReports::new(data, expected).collect()
}

#[cfg(test)]
mod tests {
    use common::{build_sei_nal, Detection, X264_UUID};

    use super::*;

    const SLICE: &[u8] = &[0x00, 0x00, 0x00, 0x01, 0x41, 0x9a, 0x24, 0x6c];

    fn sample_record() -> MetadataRecord {
        MetadataRecord::new(
            42,
            1_733_000_000_123_456_789,
            vec![
                Detection::new(0, "person", 0.9134521484375, [12.5, 40.0, 311.25, 700.75]),
                Detection::new(56, "chair", 0.31, [800.0, 420.0, 960.0, 719.0]),
            ],
        )
    }

    #[test]
    fn test_round_trip() -> serde_json::Result<()> {
        let record = sample_record();
        let nal = build_sei_nal(&StreamUuid::DEFAULT, &record.to_json_bytes()?);

        let decoded: Vec<_> = decode_sei_metadata(&nal, StreamUuid::DEFAULT).collect();
        assert_eq!(decoded, vec![record]);
        Ok(())
    }

    #[test]
    fn test_concrete_scenario() {
        let uuid: StreamUuid = "6c4b8b0443c341a293b73a7b70f7ef00".parse().unwrap();
        let mut data = build_sei_nal(&uuid, br#"{"frame":0,"yolo":[]}"#);
        data.extend_from_slice(SLICE);

        let decoded: Vec<_> = decode_sei_metadata(&data, uuid).collect();
        let expected = MetadataRecord::from_json_slice(br#"{"frame":0,"yolo":[]}"#).unwrap();
        assert_eq!(decoded, vec![expected]);
        assert_eq!(decoded[0].version, 0);
        assert_eq!(decoded[0].timestamp_ns, 0);

        let types: Vec<_> = ByteStream::new(&data).map(|n| n.nal_unit_type()).collect();
        assert_eq!(types, vec![6, 1]);
    }

    #[test]
    fn test_foreign_uuid_is_ignored() -> serde_json::Result<()> {
        let payload = sample_record().to_json_bytes()?;
        let mut data = build_sei_nal(&X264_UUID, b"x264 - core 164 - H.264/MPEG-4 AVC codec {}");
        data.extend_from_slice(&build_sei_nal(&X264_UUID, &payload));
        data.extend_from_slice(SLICE);

        assert_eq!(decode_sei_metadata(&data, StreamUuid::DEFAULT).count(), 0);

        let reports = inspect_sei(&data, StreamUuid::DEFAULT);
        assert_eq!(reports.len(), 2);
        assert!(reports
            .iter()
            .all(|r| r.outcome == SeiOutcome::ForeignUuid && r.uuid == Some(X264_UUID)));
        Ok(())
    }

    #[test]
    fn test_noise_tolerance() -> serde_json::Result<()> {
        let record = sample_record();
        let nal = build_sei_nal(&StreamUuid::DEFAULT, &record.to_json_bytes()?);

        let mut data = vec![0xde, 0xad, 0xbe, 0xef, 0x7b, 0x7d, 0x00, 0x42];
        data.extend_from_slice(&nal);
        data.extend_from_slice(&[0x13, 0x37, 0x7b, 0xff, 0x01]);

        let decoded: Vec<_> = decode_sei_metadata(&data, StreamUuid::DEFAULT).collect();
        assert_eq!(decoded, vec![record]);
        Ok(())
    }

    #[test]
    fn test_truncation_never_yields() -> serde_json::Result<()> {
        let nal = build_sei_nal(&StreamUuid::DEFAULT, &sample_record().to_json_bytes()?);

        for cut in 0..nal.len() - 1 {
            let partial = &nal[..cut];
            assert_eq!(
                decode_sei_metadata(partial, StreamUuid::DEFAULT).count(),
                0,
                "cut at {cut}"
            );
        }

        let reports = inspect_sei(&nal[..4 + 1 + 2 + 10], StreamUuid::DEFAULT);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].outcome, SeiOutcome::Truncated);
        Ok(())
    }

    #[test]
    fn test_multiple_units_in_order() -> serde_json::Result<()> {
        let mut data = Vec::new();
        let mut expected = Vec::new();

        for frame in 0..3 {
            let record = MetadataRecord::new(frame, frame * 33_333_333, vec![]);
            data.extend_from_slice(&build_sei_nal(&StreamUuid::DEFAULT, &record.to_json_bytes()?));
            data.extend_from_slice(SLICE);
            expected.push(record);
        }

        let decoded: Vec<_> = decode_sei_metadata(&data, StreamUuid::DEFAULT).collect();
        assert_eq!(decoded, expected);

        let again: Vec<_> = decode_sei_metadata(&data, StreamUuid::DEFAULT).collect();
        assert_eq!(again, decoded);
        Ok(())
    }

    #[test]
    fn test_bad_payloads_are_skipped() {
        let uuid = StreamUuid::DEFAULT;
        let mut data = build_sei_nal(&uuid, b"no braces at all");
        data.extend_from_slice(&build_sei_nal(&uuid, br#"{"frame":1,"yolo":[]"#));
        data.extend_from_slice(&build_sei_nal(&uuid, br#"{"frame":"one"}"#));
        data.extend_from_slice(&build_sei_nal(&uuid, b"{\xff\xfe}"));
        data.extend_from_slice(&build_sei_nal(&uuid, br#"{"frame":2,"yolo":[]}"#));

        let outcomes: Vec<_> = inspect_sei(&data, uuid).into_iter().map(|r| r.outcome).collect();
        assert_eq!(outcomes.len(), 5);
        assert_eq!(outcomes[0], SeiOutcome::NoJsonObject);
        assert_eq!(outcomes[1], SeiOutcome::NoJsonObject);
        assert!(matches!(outcomes[2], SeiOutcome::InvalidJson(_)));
        assert!(matches!(outcomes[3], SeiOutcome::InvalidJson(_)));

        let decoded: Vec<_> = decode_sei_metadata(&data, uuid).collect();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].frame_id, 2);
    }

    #[test]
    fn test_other_payload_types_are_not_inspected() {
        // pic_timing followed by our message in the same SEI unit
        let mut data = vec![0x00, 0x00, 0x00, 0x01, 0x06, 0x01, 0x02, 0x11, 0x22];
        let json = br#"{"frame":9}"#;
        data.push(0x05);
        data.push((16 + json.len()) as u8);
        data.extend_from_slice(StreamUuid::DEFAULT.as_bytes());
        data.extend_from_slice(json);
        data.push(0x80);

        let reports = inspect_sei(&data, StreamUuid::DEFAULT);
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].outcome, SeiOutcome::NotUserData);
        assert_eq!(reports[0].uuid, None);

        let decoded: Vec<_> = decode_sei_metadata(&data, StreamUuid::DEFAULT).collect();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].frame_id, 9);
    }

    #[test]
    fn test_unescaped_legacy_unit() {
        // Written without emulation prevention, as older producers do.
        let json = br#"{"frame":5,"yolo":[]}"#;
        let mut data = vec![0x00, 0x00, 0x00, 0x01, 0x06, 0x05, (16 + json.len()) as u8];
        data.extend_from_slice(StreamUuid::DEFAULT.as_bytes());
        data.extend_from_slice(json);
        data.push(0x80);

        let decoded: Vec<_> = decode_sei_metadata(&data, StreamUuid::DEFAULT).collect();
        assert_eq!(decoded[0].frame_id, 5);
    }
}
