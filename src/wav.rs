//! Canonical 44-byte-header PCM16 WAV serialization

use std::io::{self, Write};

/// Size of the RIFF/WAVE header written by [`write_wav`]
pub const HEADER_LEN: usize = 44;

/// PCM stream layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl WavFormat {
    pub fn mono_pcm16(sample_rate: u32) -> Self {
        Self {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
        }
    }

    pub fn block_align(&self) -> u16 {
        self.channels * self.bits_per_sample / 8
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }
}

/// Largest PCM payload whose RIFF size field still fits in 32 bits
pub const MAX_DATA_LEN: usize = (u32::MAX - 36) as usize;

/// The three chunk headers (`RIFF`, `fmt `, `data`) for `data_len` payload bytes
pub fn header(format: &WavFormat, data_len: u32) -> [u8; HEADER_LEN] {
    let fields: [&[u8]; 13] = [
        b"RIFF",
        &(36 + data_len).to_le_bytes(),
        b"WAVE",
        b"fmt ",
        &16u32.to_le_bytes(),
        &1u16.to_le_bytes(), // PCM
        &format.channels.to_le_bytes(),
        &format.sample_rate.to_le_bytes(),
        &format.byte_rate().to_le_bytes(),
        &format.block_align().to_le_bytes(),
        &format.bits_per_sample.to_le_bytes(),
        b"data",
        &data_len.to_le_bytes(),
    ];

    let mut out = [0u8; HEADER_LEN];
    let mut at = 0;
    for field in fields {
        out[at..at + field.len()].copy_from_slice(field);
        at += field.len();
    }
    out
}

fn data_len(pcm_data: &[u8]) -> io::Result<u32> {
    if pcm_data.len() > MAX_DATA_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} bytes of PCM exceed the RIFF size limit", pcm_data.len()),
        ));
    }
    Ok(pcm_data.len() as u32)
}

/// Stream a complete file into `writer`
pub fn write_wav<W: Write>(writer: &mut W, format: &WavFormat, pcm_data: &[u8]) -> io::Result<()> {
    writer.write_all(&header(format, data_len(pcm_data)?))?;
    writer.write_all(pcm_data)?;
    writer.flush()
}

/// A complete file as one buffer
pub fn encode_wav(format: &WavFormat, pcm_data: &[u8]) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(HEADER_LEN + pcm_data.len());
    buffer.extend_from_slice(&header(format, data_len(pcm_data)?));
    buffer.extend_from_slice(pcm_data);
    Ok(buffer)
}

/// Convert one sample in [-1, 1] to signed 16-bit.
///
/// Negative values scale by 32768 and positive by 32767 so that both ends of
/// the range map without overflow; the product truncates toward zero.
pub fn sample_to_i16(sample: f32) -> i16 {
    let clipped = sample.clamp(-1.0, 1.0);
    if clipped < 0.0 {
        (clipped * 32768.0) as i16
    } else {
        (clipped * 32767.0) as i16
    }
}

/// Little-endian 16-bit PCM bytes
pub fn samples_to_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut pcm = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        pcm.extend_from_slice(&sample_to_i16(sample).to_le_bytes());
    }
    pcm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let format = WavFormat::mono_pcm16(44100);
        let bytes = encode_wav(&format, &[1, 2, 3, 4]).unwrap();

        assert_eq!(bytes.len(), HEADER_LEN + 4);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 40);
        assert_eq!(&bytes[8..16], b"WAVEfmt ");
        assert_eq!(u32::from_le_bytes(bytes[16..20].try_into().unwrap()), 16);
        assert_eq!(u16::from_le_bytes(bytes[20..22].try_into().unwrap()), 1);
        assert_eq!(u16::from_le_bytes(bytes[22..24].try_into().unwrap()), 1);
        assert_eq!(u32::from_le_bytes(bytes[24..28].try_into().unwrap()), 44100);
        assert_eq!(u32::from_le_bytes(bytes[28..32].try_into().unwrap()), 88200);
        assert_eq!(u16::from_le_bytes(bytes[32..34].try_into().unwrap()), 2);
        assert_eq!(u16::from_le_bytes(bytes[34..36].try_into().unwrap()), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32::from_le_bytes(bytes[40..44].try_into().unwrap()), 4);
    }

    #[test]
    fn test_streamed_matches_buffer() {
        let format = WavFormat::mono_pcm16(8000);
        let pcm = samples_to_pcm16(&[0.0, 0.5, -0.5, 1.0]);
        let mut streamed = Vec::new();
        write_wav(&mut streamed, &format, &pcm).unwrap();
        assert_eq!(streamed, encode_wav(&format, &pcm).unwrap());
        assert_eq!(&header(&format, 8)[..], &streamed[..HEADER_LEN]);
    }

    #[test]
    fn test_asymmetric_scaling() {
        assert_eq!(sample_to_i16(1.0), 32767);
        assert_eq!(sample_to_i16(-1.0), -32768);
        assert_eq!(sample_to_i16(0.0), 0);
        assert_eq!(sample_to_i16(2.0), 32767);
        assert_eq!(sample_to_i16(-0.5), -16384);
        assert_eq!(sample_to_i16(0.5), 16383);
    }
}
