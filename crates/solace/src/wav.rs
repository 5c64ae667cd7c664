// SPDX-FileCopyrightText: 2026 Solace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Joins the per-sentence WAV files of a spoken reply into one file.

use std::io::Cursor;

use solace_core::error::SolaceError;

fn speech_error(message: impl Into<String>, e: hound::Error) -> SolaceError {
    SolaceError::Speech {
        message: message.into(),
        source: Some(Box::new(e)),
    }
}

/// Splits back-to-back RIFF files using each header's size field.
fn split_riff(bytes: &[u8]) -> Result<Vec<&[u8]>, SolaceError> {
    let mut parts = Vec::new();
    let mut rest = bytes;
    while !rest.is_empty() {
        if rest.len() < 8 || &rest[..4] != b"RIFF" {
            return Err(SolaceError::Speech {
                message: format!("audio is not a RIFF stream ({} trailing bytes)", rest.len()),
                source: None,
            });
        }
        let size = u32::from_le_bytes([rest[4], rest[5], rest[6], rest[7]]) as usize;
        let end = size.saturating_add(8).min(rest.len());
        parts.push(&rest[..end]);
        rest = &rest[end..];
    }
    Ok(parts)
}

/// Merges concatenated WAV files into a single WAV with one header.
///
/// Every part must share the first part's format.
pub fn merge_wavs(bytes: &[u8]) -> Result<Vec<u8>, SolaceError> {
    let parts = split_riff(bytes)?;
    let mut readers = Vec::with_capacity(parts.len());
    for part in parts {
        let reader = hound::WavReader::new(Cursor::new(part))
            .map_err(|e| speech_error("failed to read sentence audio", e))?;
        readers.push(reader);
    }
    let Some(spec) = readers.first().map(|r| r.spec()) else {
        return Ok(Vec::new());
    };
    if let Some(odd) = readers.iter().map(|r| r.spec()).find(|s| *s != spec) {
        return Err(SolaceError::Speech {
            message: format!(
                "sentence audio formats differ: {}Hz/{}ch vs {}Hz/{}ch",
                spec.sample_rate, spec.channels, odd.sample_rate, odd.channels
            ),
            source: None,
        });
    }

    let mut out = Cursor::new(Vec::new());
    let mut writer = hound::WavWriter::new(&mut out, spec)
        .map_err(|e| speech_error("failed to start merged audio", e))?;
    for mut reader in readers {
        match spec.sample_format {
            hound::SampleFormat::Int => {
                for sample in reader.samples::<i32>() {
                    let sample = sample.map_err(|e| speech_error("bad sample in sentence audio", e))?;
                    writer
                        .write_sample(sample)
                        .map_err(|e| speech_error("failed to write merged audio", e))?;
                }
            }
            hound::SampleFormat::Float => {
                for sample in reader.samples::<f32>() {
                    let sample = sample.map_err(|e| speech_error("bad sample in sentence audio", e))?;
                    writer
                        .write_sample(sample)
                        .map_err(|e| speech_error("failed to write merged audio", e))?;
                }
            }
        }
    }
    writer
        .finalize()
        .map_err(|e| speech_error("failed to finalize merged audio", e))?;
    Ok(out.into_inner())
}
