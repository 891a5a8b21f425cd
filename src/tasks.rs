//! Domain tasks run by leaf commands through the task runner.

pub mod checksum;
pub mod encode;

pub use checksum::ChecksumTask;
pub use encode::{EncodeSettings, EncodeTask, Profile, ProfileError, QueryError, StreamInfo};
