mod config;
mod errors;
mod fuser;
mod slot;

pub use config::{InjectionMode, InjectorConfig, SlotRead};
pub use errors::{ConfigError, FuseError};
pub use fuser::{
    fuse, output_capacity, prepend_sei, AccessUnit, BufferTiming, SeiInjector, SEI_OVERHEAD,
};
pub use slot::LatestMetadata;
