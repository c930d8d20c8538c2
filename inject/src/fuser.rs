use std::borrow::Cow;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use common::sei::build_sei_nal;
use common::{contains_idr, MetadataRecord, StreamUuid};
use tracing::{debug, info, warn};

use crate::config::{InjectionMode, InjectorConfig};
use crate::errors::FuseError;
use crate::slot::LatestMetadata;

/// Room for the start code, NAL header, `payloadType`, `payloadSize` and stop byte of the SEI
/// unit, on top of its UUID and payload.
pub const SEI_OVERHEAD: usize = 20;

/// Timing and position attributes of a buffer. The fuser copies them from input to output
/// untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BufferTiming {
    pub pts: Option<u64>,
    pub dts: Option<u64>,
    pub duration: Option<u64>,
    pub offset: Option<u64>,
    pub offset_end: Option<u64>,
    pub flags: u32,
}

/// One encoded access unit in Annex-B form, plus its timing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessUnit {
    pub data: Vec<u8>,
    pub timing: BufferTiming,
}

impl AccessUnit {
    pub fn new(data: Vec<u8>, timing: BufferTiming) -> Self {
        Self { data, timing }
    }
}

/// Size reserved for an access unit of `access_unit_len` bytes fused with a payload of
/// `payload_len` bytes.
pub fn output_capacity(access_unit_len: usize, payload_len: usize) -> usize {
    access_unit_len + StreamUuid::LEN + payload_len + SEI_OVERHEAD
}

/// Returns a new buffer holding an SEI unit that carries `payload`, followed by `access_unit`.
pub fn prepend_sei(
    access_unit: &[u8],
    payload: &[u8],
    uuid: &StreamUuid,
) -> Result<Vec<u8>, FuseError> {
    let sei = build_sei_nal(uuid, payload);
    let requested =
        output_capacity(access_unit.len(), payload.len()).max(sei.len() + access_unit.len());

    let mut out = Vec::new();
    out.try_reserve_exact(requested)
        .map_err(|source| FuseError::Allocation { requested, source })?;

    out.extend_from_slice(&sei);
    out.extend_from_slice(access_unit);
    Ok(out)
}

/// Prepends `latest` to `access_unit` when `mode` says this access unit should carry it.
///
/// The access unit comes back borrowed and byte for byte unchanged when nothing is injected.
pub fn fuse<'a>(
    access_unit: &'a [u8],
    latest: Option<&MetadataRecord>,
    uuid: &StreamUuid,
    mode: InjectionMode,
) -> Result<Cow<'a, [u8]>, FuseError> {
    match latest {
        Some(record) if mode.should_inject(access_unit) => {
            let payload = record.to_json_bytes()?;
            Ok(Cow::Owned(prepend_sei(access_unit, &payload, uuid)?))
        }
        _ => Ok(Cow::Borrowed(access_unit)),
    }
}

/// Per-stream injector: holds the configuration and the latest-metadata slot, and fuses every
/// access unit handed to it.
///
/// The slot is shared with whoever produces metadata, see [`SeiInjector::slot`].
#[derive(Debug)]
pub struct SeiInjector {
    config: InjectorConfig,
    slot: Arc<LatestMetadata>,
    injected: AtomicU64,
    explained_skip: AtomicBool,
}

impl SeiInjector {
    pub fn new(config: InjectorConfig, slot: Arc<LatestMetadata>) -> Self {
        Self {
            config,
            slot,
            injected: AtomicU64::new(0),
            explained_skip: AtomicBool::new(false),
        }
    }

    pub fn with_config(config: InjectorConfig) -> Self {
        Self::new(config, Arc::new(LatestMetadata::new()))
    }

    pub fn configure(&mut self, uuid: StreamUuid, mode: InjectionMode) {
        self.config.uuid = uuid;
        self.config.mode = mode;
    }

    /// Like [`SeiInjector::configure`], for a UUID given as raw bytes.
    pub fn configure_bytes(&mut self, uuid: &[u8], mode: InjectionMode) -> Result<(), FuseError> {
        self.configure(StreamUuid::from_slice(uuid)?, mode);
        Ok(())
    }

    pub fn config(&self) -> &InjectorConfig {
        &self.config
    }

    pub fn slot(&self) -> Arc<LatestMetadata> {
        Arc::clone(&self.slot)
    }

    pub fn set_latest(&self, record: MetadataRecord) {
        self.slot.set(record);
    }

    pub fn injected_count(&self) -> u64 {
        self.injected.load(Ordering::Relaxed)
    }

    /// Produces the output buffer for `input`: the access unit, preceded by an SEI unit when the
    /// mode allows it and there is metadata to send. Timing is copied from `input`.
    pub fn fuse(&self, input: &AccessUnit) -> Result<AccessUnit, FuseError> {
        let inject_now = self.config.mode.should_inject(&input.data);
        let latest = if inject_now {
            self.slot.read(self.config.slot_read)
        } else {
            None
        };

        let data = match latest {
            Some(record) => self.inject(&input.data, &record)?,
            None => {
                self.explain_skip(&input.data, inject_now);
                let mut data = Vec::new();
                data.try_reserve_exact(input.data.len())
                    .map_err(|source| FuseError::Allocation {
                        requested: input.data.len(),
                        source,
                    })?;
                data.extend_from_slice(&input.data);
                data
            }
        };

        Ok(AccessUnit {
            data,
            timing: input.timing,
        })
    }

    fn inject(&self, access_unit: &[u8], record: &MetadataRecord) -> Result<Vec<u8>, FuseError> {
        let payload = record.to_json_bytes().map_err(|e| {
            warn!(frame = record.frame_id, error = %e, "failed to serialize metadata");
            e
        })?;

        let data = prepend_sei(access_unit, &payload, &self.config.uuid).map_err(|e| {
            warn!(frame = record.frame_id, error = %e, "failed to build the output buffer");
            e
        })?;

        let count = self.injected.fetch_add(1, Ordering::Relaxed) + 1;
        if self.config.verbose && (count - 1) % self.config.log_interval.max(1) == 0 {
            let sei_len = data.len() - access_unit.len();
            info!(
                count,
                frame = record.frame_id,
                payload_len = payload.len(),
                sei_len,
                total_len = data.len(),
                uuid = %self.config.uuid,
                "injected SEI"
            );
            debug!(sei_prefix = ?&data[..sei_len.min(40)], "SEI head");
        }

        Ok(data)
    }

    fn explain_skip(&self, access_unit: &[u8], inject_now: bool) {
        if !self.config.verbose || self.injected_count() > 0 {
            return;
        }

        if self.explained_skip.swap(true, Ordering::Relaxed) {
            return;
        }

        debug!(
            len = access_unit.len(),
            mode = %self.config.mode,
            is_idr = contains_idr(access_unit),
            inject_now,
            has_latest = self.slot.get().is_some(),
            "not injecting into access unit"
        );
    }
}
