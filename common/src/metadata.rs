use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Schema version written into `v` by this crate.
pub const METADATA_VERSION: i64 = 1;

/// Wire names of the fields `MetadataRecord` serializes itself. `extra` may not reuse them.
pub const RESERVED_KEYS: [&str; 4] = ["v", "ts_ns", "frame", "yolo"];

/// Per-frame detection metadata, as carried in the SEI payload.
///
/// Field names follow the wire format: `{"v":1,"ts_ns":..,"frame":..,"yolo":[..]}`. Missing fields
/// take their default value and unknown fields are kept in `extra`, so any JSON object survives
/// a round trip. Keys of `extra` must not be one of [`RESERVED_KEYS`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    #[serde(rename = "v", default)]
    pub version: i64,

    #[serde(rename = "ts_ns", default)]
    pub timestamp_ns: i64,

    #[serde(rename = "frame", default)]
    pub frame_id: i64,

    #[serde(rename = "yolo", default)]
    pub detections: Vec<Detection>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Detection {
    #[serde(rename = "cls")]
    pub class_id: i64,

    pub name: String,

    /// In `[0, 1]`.
    #[serde(rename = "conf")]
    pub confidence: f64,

    /// `[x1, y1, x2, y2]` in pixels.
    #[serde(rename = "xyxy")]
    pub bbox: [f64; 4],
}

impl MetadataRecord {
    pub fn new(frame_id: i64, timestamp_ns: i64, detections: Vec<Detection>) -> Self {
        Self {
            version: METADATA_VERSION,
            timestamp_ns,
            frame_id,
            detections,
            extra: Map::new(),
        }
    }

    /// Minified JSON, the form embedded in SEI payloads.
    ///
    /// Fails when `extra` holds one of the [`RESERVED_KEYS`], since the output would repeat that
    /// key and no reader would accept it.
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        if let Some(key) = RESERVED_KEYS.iter().find(|key| self.extra.contains_key(**key)) {
            return Err(<serde_json::Error as serde::ser::Error>::custom(format_args!(
                "extra field `{key}` collides with a record field"
            )));
        }

        serde_json::to_vec(self)
    }

    pub fn from_json_slice(data: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(data)
    }
}

impl Detection {
    pub fn new(class_id: i64, name: impl Into<String>, confidence: f64, bbox: [f64; 4]) -> Self {
        Self {
            class_id,
            name: name.into(),
            confidence,
            bbox,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() -> serde_json::Result<()> {
        let record = MetadataRecord::new(
            7,
            1_700_000_000_000_000_000,
            vec![Detection::new(0, "person", 0.5, [1.0, 2.0, 3.0, 4.0])],
        );
        let json = String::from_utf8(record.to_json_bytes()?).unwrap();

        assert_eq!(
            json,
            r#"{"v":1,"ts_ns":1700000000000000000,"frame":7,"yolo":[{"cls":0,"name":"person","conf":0.5,"xyxy":[1.0,2.0,3.0,4.0]}]}"#
        );
        Ok(())
    }

    #[test]
    fn test_minimal_document() -> serde_json::Result<()> {
        let record = MetadataRecord::from_json_slice(br#"{"frame":0,"yolo":[]}"#)?;

        assert_eq!(record, MetadataRecord::default());
        Ok(())
    }

    #[test]
    fn test_unknown_fields_survive() -> serde_json::Result<()> {
        let source = br#"{"v":1,"frame":3,"test":"direct_file_test","yolo":[{"cls":0,"name":"person","conf":0.95,"xyxy":[100,100,200,200]}]}"#;
        let record = MetadataRecord::from_json_slice(source)?;

        assert_eq!(record.frame_id, 3);
        assert_eq!(record.extra["test"], "direct_file_test");
        assert_eq!(record.detections[0].bbox, [100.0, 100.0, 200.0, 200.0]);

        let again = MetadataRecord::from_json_slice(&record.to_json_bytes()?)?;
        assert_eq!(again, record);
        Ok(())
    }

    #[test]
    fn test_reserved_extra_key_is_refused() -> serde_json::Result<()> {
        for key in RESERVED_KEYS {
            let mut record = MetadataRecord::new(3, 10, vec![]);
            record.extra.insert(key.to_string(), Value::from(99));

            let err = record.to_json_bytes().unwrap_err();
            assert!(err.to_string().contains(key));
        }

        let mut record = MetadataRecord::new(3, 10, vec![]);
        record.extra.insert("frames".to_string(), Value::from(99));
        let again = MetadataRecord::from_json_slice(&record.to_json_bytes()?)?;
        assert_eq!(again, record);
        Ok(())
    }

    #[test]
    fn test_negative_integers_are_kept() -> serde_json::Result<()> {
        let source = br#"{"v":-1,"ts_ns":-5,"frame":-2,"yolo":[{"cls":-1,"name":"?","conf":0.1,"xyxy":[0,0,1,1]}]}"#;
        let record = MetadataRecord::from_json_slice(source)?;

        assert_eq!(record.version, -1);
        assert_eq!(record.timestamp_ns, -5);
        assert_eq!(record.frame_id, -2);
        assert_eq!(record.detections[0].class_id, -1);
        Ok(())
    }
}
