//! # Symphonia Clip Decoder
//!
//! [`ClipDecoder`] implementation backed by Symphonia.

use crate::clip::ClipDecoder;
use crate::decoder::format_detector::{AudioCodec, FormatDetector};
use crate::decoder::sample_converter::SampleConverter;
use crate::error::{PlaybackError, Result};
use crate::format::TrackInfo;
use bytes::Bytes;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;
use symphonia::core::codecs::{CodecType, Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, SeekMode, SeekTo};
use symphonia::core::io::{MediaSource, MediaSourceStream};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, error, info, instrument, trace, warn};

/// Consecutive bad packets tolerated before the stream is declared corrupt.
const MAX_CONSECUTIVE_ERRORS: usize = 10;

/// Where a clip's bytes come from. Kept so the clip can be reopened.
#[derive(Debug, Clone)]
enum ClipSource {
    File(PathBuf),
    Memory {
        data: Bytes,
        codec_hint: Option<AudioCodec>,
    },
}

impl ClipSource {
    fn open_stream(&self) -> Result<(MediaSourceStream, Hint)> {
        match self {
            ClipSource::File(path) => {
                let file = std::fs::File::open(path).map_err(|e| {
                    error!("Failed to open file {:?}: {}", path, e);
                    PlaybackError::SourceError(format!("Failed to open file: {}", e))
                })?;

                let hint = FormatDetector::hint_from_path(path);
                let media_source = Box::new(file) as Box<dyn MediaSource>;
                Ok((MediaSourceStream::new(media_source, Default::default()), hint))
            }
            ClipSource::Memory { data, codec_hint } => {
                let hint = codec_hint
                    .map(FormatDetector::hint_from_codec)
                    .unwrap_or_else(Hint::new);
                let media_source = Box::new(Cursor::new(data.clone())) as Box<dyn MediaSource>;
                Ok((MediaSourceStream::new(media_source, Default::default()), hint))
            }
        }
    }

    fn describe(&self) -> String {
        match self {
            ClipSource::File(path) => path.display().to_string(),
            ClipSource::Memory { data, .. } => format!("memory buffer ({} bytes)", data.len()),
        }
    }
}

/// Clip decoded from any container Symphonia can probe.
///
/// Decoded packets are converted to interleaved i16 LE and kept in a pending
/// buffer until the channel reads them, so reads of any size are served
/// regardless of packet boundaries.
///
/// Containers that do not declare a channel count are probed by decoding
/// their first packet; if even that yields nothing the mono / 44.1kHz
/// fallback applies.
pub struct SymphoniaClip {
    source: ClipSource,
    format_reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    codec_type: CodecType,
    info: TrackInfo,
    duration: Option<Duration>,
    pending: Vec<u8>,
    pending_offset: usize,
    position_frames: u64,
    eof: bool,
    layout_mismatch_logged: bool,
}

impl SymphoniaClip {
    /// Open a clip from a file. The extension is used as a probe hint.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_source(ClipSource::File(path.as_ref().to_path_buf()))
    }

    /// Open a clip from an in-memory container.
    pub fn from_bytes(data: impl Into<Bytes>, codec_hint: Option<AudioCodec>) -> Result<Self> {
        Self::from_source(ClipSource::Memory {
            data: data.into(),
            codec_hint,
        })
    }

    #[instrument(skip(source), fields(source = %source.describe()))]
    fn from_source(source: ClipSource) -> Result<Self> {
        let (media_source, hint) = source.open_stream()?;

        let probe_result = symphonia::default::get_probe()
            .format(
                &hint,
                media_source,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| {
                error!("Format probe failed: {}", e);
                PlaybackError::InvalidFormat(format!("Failed to probe format: {}", e))
            })?;

        let format_reader = probe_result.format;

        let track = format_reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| {
                error!("No supported audio tracks found");
                PlaybackError::FormatNotDecodable("No supported audio tracks".to_string())
            })?;

        let track_id = track.id;
        let codec_type = track.codec_params.codec;
        let declared_channels = track.codec_params.channels.map(|ch| ch.count() as u16);
        let info = TrackInfo::from_declared(declared_channels, track.codec_params.sample_rate);
        let duration = track
            .codec_params
            .n_frames
            .map(|frames| Duration::from_secs_f64(frames as f64 / info.sample_rate as f64));

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| {
                error!("Failed to create decoder: {}", e);
                PlaybackError::DecoderError(format!("Failed to create codec decoder: {}", e))
            })?;

        let mut clip = Self {
            source,
            format_reader,
            decoder,
            track_id,
            codec_type,
            info,
            duration,
            pending: Vec::new(),
            pending_offset: 0,
            position_frames: 0,
            eof: false,
            layout_mismatch_logged: false,
        };

        if declared_channels.is_none() {
            match clip.decode_next_packet()? {
                Some(channels) => {
                    debug!("Channel count {} detected from first packet", channels);
                    clip.info.channels = channels;
                }
                None => clip.eof = true,
            }
        }

        info!(
            codec = ?FormatDetector::detect_codec(codec_type),
            channels = clip.info.channels,
            sample_rate = clip.info.sample_rate,
            "Clip opened"
        );

        Ok(clip)
    }

    /// Declared (or detected) layout of the selected track.
    pub fn track_info(&self) -> TrackInfo {
        self.info
    }

    pub fn codec(&self) -> AudioCodec {
        FormatDetector::detect_codec(self.codec_type)
    }

    /// Track duration, when the container declares a frame count.
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    /// Decode the next packet of the selected track into `pending`.
    ///
    /// Returns the packet's channel count, or `None` at end of stream.
    /// Recoverable packet errors are skipped up to [`MAX_CONSECUTIVE_ERRORS`].
    fn decode_next_packet(&mut self) -> Result<Option<u16>> {
        let mut consecutive_errors = 0;

        loop {
            let packet = match self.format_reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::ResetRequired) => {
                    warn!("Decoder reset required for track list change");
                    return Err(PlaybackError::DecoderError(
                        "Track list changed, reset required".to_string(),
                    ));
                }
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    debug!("Reached end of stream at {} frames", self.position_frames);
                    return Ok(None);
                }
                Err(SymphoniaError::IoError(e)) => {
                    consecutive_errors += 1;
                    warn!(
                        "I/O error reading packet (attempt {}/{}): {}",
                        consecutive_errors, MAX_CONSECUTIVE_ERRORS, e
                    );

                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        error!("Too many consecutive I/O errors, giving up");
                        return Err(PlaybackError::SourceError(format!(
                            "Stream I/O failure after {} attempts: {}",
                            MAX_CONSECUTIVE_ERRORS, e
                        )));
                    }
                    continue;
                }
                Err(e) => {
                    error!("Fatal format reader error: {}", e);
                    return Err(PlaybackError::DecodingError(format!(
                        "Failed to read packet: {}",
                        e
                    )));
                }
            };

            while !self.format_reader.metadata().is_latest() {
                self.format_reader.metadata().pop();
            }

            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    let channels = decoded.spec().channels.count() as u16;
                    self.position_frames += decoded.frames() as u64;
                    let bytes = SampleConverter::append_i16_le(&decoded, &mut self.pending);
                    trace!(bytes, position = self.position_frames, "Decoded packet");
                    return Ok(Some(channels));
                }
                Err(SymphoniaError::DecodeError(err)) => {
                    consecutive_errors += 1;
                    warn!(
                        "Skipping packet with decode error (attempt {}/{}): {}",
                        consecutive_errors, MAX_CONSECUTIVE_ERRORS, err
                    );

                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        error!("Too many consecutive decode errors, stream may be corrupted");
                        return Err(PlaybackError::CorruptedStream(format!(
                            "Stream corruption after {} failed packets: {}",
                            MAX_CONSECUTIVE_ERRORS, err
                        )));
                    }
                    continue;
                }
                Err(e) => {
                    error!("Fatal decode error: {}", e);
                    return Err(PlaybackError::DecoderError(format!(
                        "Failed to decode packet: {}",
                        e
                    )));
                }
            }
        }
    }

    fn rewind(&mut self) -> Result<()> {
        self.format_reader
            .seek(
                SeekMode::Accurate,
                SeekTo::TimeStamp {
                    ts: 0,
                    track_id: self.track_id,
                },
            )
            .map_err(|e| PlaybackError::DecoderError(format!("Seek failed: {}", e)))?;
        self.decoder.reset();
        self.pending.clear();
        self.pending_offset = 0;
        self.position_frames = 0;
        self.eof = false;
        Ok(())
    }
}

impl ClipDecoder for SymphoniaClip {
    fn reset(&mut self) {
        if self.position_frames == 0 && self.pending_offset == 0 {
            return;
        }

        if let Err(e) = self.rewind() {
            debug!("{}, reopening source", e);
            match Self::from_source(self.source.clone()) {
                Ok(fresh) => *self = fresh,
                Err(e) => warn!("Clip could not be rewound: {}", e),
            }
        }
    }

    fn read(&mut self, dest: &mut [u8]) -> Result<usize> {
        let mut written = 0;

        while written < dest.len() {
            if self.pending_offset < self.pending.len() {
                let count = (dest.len() - written).min(self.pending.len() - self.pending_offset);
                dest[written..written + count]
                    .copy_from_slice(&self.pending[self.pending_offset..self.pending_offset + count]);
                self.pending_offset += count;
                written += count;
                continue;
            }

            if self.eof {
                break;
            }

            self.pending.clear();
            self.pending_offset = 0;
            match self.decode_next_packet()? {
                Some(channels) if channels != self.info.channels => {
                    if !self.layout_mismatch_logged {
                        warn!(
                            declared = self.info.channels,
                            decoded = channels,
                            "Decoded channel layout differs from the declared one"
                        );
                        self.layout_mismatch_logged = true;
                    }
                }
                Some(_) => {}
                None => self.eof = true,
            }
        }

        Ok(written)
    }

    fn channel_count(&self) -> u16 {
        self.info.channels
    }

    fn sample_rate(&self) -> u32 {
        self.info.sample_rate
    }

    fn rewinds_on_stop(&self) -> bool {
        FormatDetector::is_uncompressed(self.codec_type)
    }
}
