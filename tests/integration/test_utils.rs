//! Shared test utilities for integration tests

use cdrip::cli;
use cdrip::command::DispatchContext;
use cdrip::config::ConfigStore;
use cdrip::device::DeviceEnumerator;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Serializes tests that touch process environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Holds the environment lock and restores the listed variables on drop.
pub struct EnvGuard {
    saved: Vec<(&'static str, Option<String>)>,
    _lock: MutexGuard<'static, ()>,
}

impl EnvGuard {
    pub fn new(vars: &[&'static str]) -> Self {
        let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let saved = vars.iter().map(|v| (*v, std::env::var(v).ok())).collect();
        Self { saved, _lock: lock }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (var, value) in &self.saved {
            match value {
                Some(value) => std::env::set_var(var, value),
                None => std::env::remove_var(var),
            }
        }
    }
}

pub fn argv(args: &[&str]) -> Vec<String> {
    args.iter().map(|a| a.to_string()).collect()
}

/// Run the CLI in-process and capture stdout.
pub fn run_cli(
    config: &dyn ConfigStore,
    devices: &dyn DeviceEnumerator,
    args: &[&str],
) -> (i32, String) {
    let ctx = DispatchContext { config, devices };
    let mut out = Vec::new();
    let code = cli::run(&argv(args), &ctx, &mut out);
    (code, String::from_utf8(out).unwrap())
}

/// Write a 16-bit stereo 44.1 kHz PCM WAV file holding `payload`.
pub fn write_wav(path: &Path, payload: &[u8]) {
    let mut bytes = Vec::with_capacity(44 + payload.len());
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + payload.len() as u32).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&44_100u32.to_le_bytes());
    bytes.extend_from_slice(&(44_100u32 * 4).to_le_bytes());
    bytes.extend_from_slice(&4u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    bytes.extend_from_slice(payload);
    std::fs::write(path, bytes).unwrap();
}
