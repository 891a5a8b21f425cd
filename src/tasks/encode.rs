//! Encoding task: queries a RIFF/WAVE input and writes its PCM payload to a
//! new file for the selected profile.

use crate::task::{Task, TaskError, TaskStep};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Bytes copied per step.
const COPY_CHUNK: usize = 64 * 1024;

/// The input stream could not be queried for its format or length.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not query {}: {reason}", path.display())]
pub struct QueryError {
    pub path: PathBuf,
    pub reason: String,
}

impl QueryError {
    fn new(path: &Path, reason: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown encoding profile '{0}' (available: wav)")]
pub struct ProfileError(pub String);

/// Output profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Wav,
}

impl Profile {
    pub fn from_name(name: &str) -> Result<Self, ProfileError> {
        match name.to_ascii_lowercase().as_str() {
            "wav" | "wave" => Ok(Profile::Wav),
            _ => Err(ProfileError(name.to_string())),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Profile::Wav => "wav",
        }
    }

    /// Whether the profile is lossy and honors a target bitrate.
    pub fn uses_bitrate(self) -> bool {
        match self {
            Profile::Wav => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSettings {
    /// Target bitrate in kbit/s for lossy profiles.
    pub bitrate: u32,
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self { bitrate: 320 }
    }
}

/// Format of a queried PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub data_offset: u64,
    pub data_len: u64,
}

impl StreamInfo {
    /// Bytes per sample frame. Saturates for layouts [`query_wav`] rejects.
    pub fn block_align(&self) -> u16 {
        self.channels.saturating_mul(self.bits_per_sample / 8)
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate.saturating_mul(u32::from(self.block_align()))
    }

    pub fn duration_secs(&self) -> f64 {
        match self.byte_rate() {
            0 => 0.0,
            rate => self.data_len as f64 / f64::from(rate),
        }
    }

    /// Canonical 44-byte header for a PCM stream of `data_len` bytes.
    fn wav_header(&self) -> [u8; 44] {
        let data_len = self.data_len as u32;
        let mut h = [0u8; 44];
        h[0..4].copy_from_slice(b"RIFF");
        h[4..8].copy_from_slice(&data_len.saturating_add(36).to_le_bytes());
        h[8..12].copy_from_slice(b"WAVE");
        h[12..16].copy_from_slice(b"fmt ");
        h[16..20].copy_from_slice(&16u32.to_le_bytes());
        h[20..22].copy_from_slice(&self.format_tag.to_le_bytes());
        h[22..24].copy_from_slice(&self.channels.to_le_bytes());
        h[24..28].copy_from_slice(&self.sample_rate.to_le_bytes());
        h[28..32].copy_from_slice(&self.byte_rate().to_le_bytes());
        h[32..34].copy_from_slice(&self.block_align().to_le_bytes());
        h[34..36].copy_from_slice(&self.bits_per_sample.to_le_bytes());
        h[36..40].copy_from_slice(b"data");
        h[40..44].copy_from_slice(&data_len.to_le_bytes());
        h
    }
}

/// Fill `buf` as far as the reader allows, returning the byte count.
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Query the format and payload location of a RIFF/WAVE stream.
///
/// Malformed or empty streams fail with [`QueryError`]; read failures keep
/// their `std::io::Error`.
pub fn query_wav<R: Read + Seek>(reader: &mut R, path: &Path) -> Result<StreamInfo, TaskError> {
    let stream_len = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(0))?;

    let mut riff = [0u8; 12];
    match read_fully(reader, &mut riff)? {
        0 => return Err(QueryError::new(path, "stream is empty").into()),
        n if n < riff.len() => return Err(QueryError::new(path, "truncated RIFF header").into()),
        _ => {}
    }
    if &riff[0..4] != b"RIFF" || &riff[8..12] != b"WAVE" {
        return Err(QueryError::new(path, "not a RIFF/WAVE stream").into());
    }

    let mut format: Option<(u16, u16, u32, u16)> = None;
    loop {
        let mut chunk = [0u8; 8];
        if read_fully(reader, &mut chunk)? < chunk.len() {
            return Err(QueryError::new(path, "no data chunk").into());
        }
        let size = u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);

        match &chunk[0..4] {
            b"fmt " => {
                if size < 16 {
                    return Err(QueryError::new(path, "fmt chunk too short").into());
                }
                let available = stream_len.saturating_sub(reader.stream_position()?);
                if u64::from(size) > available {
                    return Err(QueryError::new(path, "truncated fmt chunk").into());
                }
                let mut fmt = vec![0u8; size as usize];
                if read_fully(reader, &mut fmt)? < fmt.len() {
                    return Err(QueryError::new(path, "truncated fmt chunk").into());
                }
                format = Some((
                    u16::from_le_bytes([fmt[0], fmt[1]]),
                    u16::from_le_bytes([fmt[2], fmt[3]]),
                    u32::from_le_bytes([fmt[4], fmt[5], fmt[6], fmt[7]]),
                    u16::from_le_bytes([fmt[14], fmt[15]]),
                ));
                if size % 2 == 1 {
                    reader.seek(SeekFrom::Current(1))?;
                }
            }
            b"data" => {
                let Some((format_tag, channels, sample_rate, bits_per_sample)) = format else {
                    return Err(QueryError::new(path, "data chunk before fmt chunk").into());
                };
                let byte_rate = channels
                    .checked_mul(bits_per_sample / 8)
                    .and_then(|align| sample_rate.checked_mul(u32::from(align)));
                if channels == 0
                    || bits_per_sample == 0
                    || bits_per_sample % 8 != 0
                    || byte_rate.is_none()
                {
                    return Err(QueryError::new(path, "unsupported sample layout").into());
                }
                let data_offset = reader.stream_position()?;
                // Ripped files may be cut short; trust the file length.
                let data_len = u64::from(size).min(stream_len.saturating_sub(data_offset));
                return Ok(StreamInfo {
                    format_tag,
                    channels,
                    sample_rate,
                    bits_per_sample,
                    data_offset,
                    data_len,
                });
            }
            _ => {
                let skip = i64::from(size) + i64::from(size % 2);
                reader.seek(SeekFrom::Current(skip))?;
            }
        }
    }
}

struct Transcode {
    reader: BufReader<File>,
    writer: BufWriter<File>,
    remaining: u64,
}

/// Re-encodes one file. Queries the input in `start`, then copies the payload
/// in fixed-size steps.
pub struct EncodeTask {
    input: PathBuf,
    output: PathBuf,
    profile: Profile,
    settings: EncodeSettings,
    description: String,
    info: Option<StreamInfo>,
    active: Option<Transcode>,
    output_created: bool,
    copied: u64,
}

impl EncodeTask {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>, profile: Profile) -> Self {
        Self::with_settings(input, output, profile, EncodeSettings::default())
    }

    pub fn with_settings(
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        profile: Profile,
        settings: EncodeSettings,
    ) -> Self {
        let input = input.into();
        let description = format!(
            "Encoding {}",
            input
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| input.display().to_string())
        );
        Self {
            input,
            output: output.into(),
            profile,
            settings,
            description,
            info: None,
            active: None,
            output_created: false,
            copied: 0,
        }
    }

    /// Stream format, available once the task has started.
    pub fn info(&self) -> Option<&StreamInfo> {
        self.info.as_ref()
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

impl Task for EncodeTask {
    fn description(&self) -> &str {
        &self.description
    }

    fn start(&mut self) -> Result<(), TaskError> {
        let mut reader = BufReader::new(File::open(&self.input)?);
        let info = query_wav(&mut reader, &self.input)?;
        debug!(
            input = %self.input.display(),
            profile = self.profile.name(),
            bitrate = self.settings.bitrate,
            uses_bitrate = self.profile.uses_bitrate(),
            channels = info.channels,
            sample_rate = info.sample_rate,
            duration_secs = info.duration_secs(),
            "input queried"
        );

        reader.seek(SeekFrom::Start(info.data_offset))?;
        let mut writer = BufWriter::new(File::create(&self.output)?);
        self.output_created = true;
        if let Err(e) = writer.write_all(&info.wav_header()) {
            drop(writer);
            self.discard_output();
            return Err(e.into());
        }

        self.active = Some(Transcode {
            reader,
            writer,
            remaining: info.data_len,
        });
        self.info = Some(info);
        Ok(())
    }

    fn step(&mut self) -> Result<TaskStep, TaskError> {
        let result = self.copy_chunk();
        if result.is_err() {
            self.discard_output();
        }
        result
    }

    fn progress(&self) -> Option<f64> {
        let total = self.info.as_ref()?.data_len;
        Some(if total == 0 {
            1.0
        } else {
            self.copied as f64 / total as f64
        })
    }
}

impl EncodeTask {
    fn copy_chunk(&mut self) -> Result<TaskStep, TaskError> {
        let Some(active) = self.active.as_mut() else {
            return Ok(TaskStep::Done);
        };

        if active.remaining > 0 {
            let want = active.remaining.min(COPY_CHUNK as u64) as usize;
            let mut buf = vec![0u8; want];
            let got = read_fully(&mut active.reader, &mut buf)?;
            if got < want {
                return Err(QueryError::new(&self.input, "stream ended before its data chunk").into());
            }
            active.writer.write_all(&buf)?;
            active.remaining -= got as u64;
            self.copied += got as u64;
        }

        if active.remaining == 0 {
            active.writer.flush()?;
            self.active = None;
            return Ok(TaskStep::Done);
        }
        Ok(TaskStep::Continue)
    }

    /// Remove a partially written output after a failure.
    fn discard_output(&mut self) {
        self.active = None;
        if !self.output_created {
            return;
        }
        self.output_created = false;
        match std::fs::remove_file(&self.output) {
            Ok(()) => debug!(output = %self.output.display(), "partial output removed"),
            Err(e) => warn!(output = %self.output.display(), error = %e, "could not remove partial output"),
        }
    }
}
