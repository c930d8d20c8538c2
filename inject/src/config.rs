use std::fmt;
use std::str::FromStr;

use common::{contains_idr, StreamUuid};

use crate::errors::ConfigError;

/// When an access unit gets the latest metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InjectionMode {
    /// Every access unit.
    Always,
    /// Only access units holding a coded slice of an IDR picture.
    #[default]
    IdrGated,
}

impl InjectionMode {
    pub fn should_inject(&self, access_unit: &[u8]) -> bool {
        match self {
            InjectionMode::Always => true,
            InjectionMode::IdrGated => contains_idr(access_unit),
        }
    }
}

impl FromStr for InjectionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "always" => Ok(InjectionMode::Always),
            "idr" | "idr-only" | "idr-gated" => Ok(InjectionMode::IdrGated),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for InjectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InjectionMode::Always => f.write_str("always"),
            InjectionMode::IdrGated => f.write_str("idr"),
        }
    }
}

/// What reading the latest-metadata slot does to it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SlotRead {
    /// The record stays and is sent again until a newer one replaces it.
    #[default]
    Keep,
    /// The record is removed, so it is sent at most once.
    Take,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectorConfig {
    pub uuid: StreamUuid,
    pub mode: InjectionMode,
    pub slot_read: SlotRead,
    /// Log injections at `info` level, one line every `log_interval` injections.
    pub verbose: bool,
    pub log_interval: u64,
}

impl Default for InjectorConfig {
    fn default() -> Self {
        Self {
            uuid: StreamUuid::DEFAULT,
            mode: InjectionMode::default(),
            slot_read: SlotRead::default(),
            verbose: false,
            log_interval: 30,
        }
    }
}

impl InjectorConfig {
    pub fn with_uuid(mut self, uuid: StreamUuid) -> Self {
        self.uuid = uuid;
        self
    }

    pub fn with_mode(mut self, mode: InjectionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_slot_read(mut self, slot_read: SlotRead) -> Self {
        self.slot_read = slot_read;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_log_interval(mut self, log_interval: u64) -> Self {
        self.log_interval = log_interval;
        self
    }
}
