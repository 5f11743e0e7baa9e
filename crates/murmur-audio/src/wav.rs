//! WAV encoding for captured utterances.
//!
//! Produces a standard uncompressed linear-PCM container: 44-byte header
//! followed by the raw little-endian samples in capture order. The declared
//! chunk sizes must equal the actual payload exactly; the round-trip tests
//! pin both.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};

use murmur_core::error::{MurmurError, Result};

/// WAV spec for the fixed capture configuration (16-bit signed PCM).
pub fn wav_spec(sample_rate: u32, channels: u16) -> WavSpec {
    WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Encode captured sample blocks into WAV bytes.
///
/// Blocks are written in order, preserving the original sample sequence.
/// Zero blocks yield the empty sentinel (a zero-length `Vec`, not a bare
/// header) meaning "no audio captured".
pub fn encode_wav(blocks: &[Vec<i16>], sample_rate: u32, channels: u16) -> Result<Vec<u8>> {
    if blocks.iter().all(|b| b.is_empty()) {
        return Ok(Vec::new());
    }

    let mut buffer = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut buffer, wav_spec(sample_rate, channels))
            .map_err(|e| MurmurError::Audio(format!("Failed to create WAV writer: {}", e)))?;

        for block in blocks {
            for &sample in block {
                writer
                    .write_sample(sample)
                    .map_err(|e| MurmurError::Audio(format!("Failed to write sample: {}", e)))?;
            }
        }

        writer
            .finalize()
            .map_err(|e| MurmurError::Audio(format!("Failed to finalize WAV: {}", e)))?;
    }

    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavReader;

    const RATE: u32 = 24_000;

    fn decode(bytes: &[u8]) -> (WavSpec, Vec<i16>) {
        let reader = WavReader::new(Cursor::new(bytes)).unwrap();
        let spec = reader.spec();
        let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        (spec, samples)
    }

    #[test]
    fn test_roundtrip_preserves_samples_in_order() {
        let blocks = vec![vec![0i16, 1, -1, 100], vec![-32768, 32767], vec![7]];
        let bytes = encode_wav(&blocks, RATE, 1).unwrap();

        let (spec, samples) = decode(&bytes);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, RATE);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, SampleFormat::Int);
        assert_eq!(samples, vec![0, 1, -1, 100, -32768, 32767, 7]);
    }

    #[test]
    fn test_roundtrip_frame_count() {
        let blocks = vec![vec![5i16; 480]; 10];
        let bytes = encode_wav(&blocks, RATE, 1).unwrap();

        let reader = WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.len(), 4800);
    }

    #[test]
    fn test_header_size_invariants() {
        let blocks = vec![vec![1i16, 2, 3, 4, 5]];
        let bytes = encode_wav(&blocks, RATE, 1).unwrap();

        // 44-byte header + 2 bytes per sample.
        assert_eq!(bytes.len(), 44 + 5 * 2);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(&bytes[36..40], b"data");

        // Outer chunk size field == total length - 8.
        let riff_size = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        assert_eq!(riff_size as usize, bytes.len() - 8);

        // Data chunk size field == total sample bytes.
        let data_size = u32::from_le_bytes(bytes[40..44].try_into().unwrap());
        assert_eq!(data_size, 5 * 2);
    }

    #[test]
    fn test_format_subchunk_fields() {
        let bytes = encode_wav(&[vec![0i16; 8]], RATE, 1).unwrap();

        // fmt chunk: size 16, PCM (1), mono, rate, byte rate, block align, 16 bits.
        let fmt_size = u32::from_le_bytes(bytes[16..20].try_into().unwrap());
        assert_eq!(fmt_size, 16);
        let format = u16::from_le_bytes(bytes[20..22].try_into().unwrap());
        assert_eq!(format, 1);
        let channels = u16::from_le_bytes(bytes[22..24].try_into().unwrap());
        assert_eq!(channels, 1);
        let rate = u32::from_le_bytes(bytes[24..28].try_into().unwrap());
        assert_eq!(rate, RATE);
        let byte_rate = u32::from_le_bytes(bytes[28..32].try_into().unwrap());
        assert_eq!(byte_rate, RATE * 2);
        let block_align = u16::from_le_bytes(bytes[32..34].try_into().unwrap());
        assert_eq!(block_align, 2);
        let bits = u16::from_le_bytes(bytes[34..36].try_into().unwrap());
        assert_eq!(bits, 16);
    }

    #[test]
    fn test_little_endian_sample_bytes() {
        let bytes = encode_wav(&[vec![0x0102i16]], RATE, 1).unwrap();
        assert_eq!(&bytes[44..46], &[0x02, 0x01]);
    }

    #[test]
    fn test_empty_blocks_yield_empty_sentinel() {
        assert!(encode_wav(&[], RATE, 1).unwrap().is_empty());
        assert!(encode_wav(&[Vec::new(), Vec::new()], RATE, 1).unwrap().is_empty());
    }
}
