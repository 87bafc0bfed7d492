//! Minimal WAV container assembly.
//!
//! The TTS endpoint returns raw PCM plus a MIME type carrying the sample
//! rate (`audio/L16;codec=pcm;rate=24000`). Players need a RIFF header, so
//! we wrap the PCM before storing it.

/// Sample rate assumed when the MIME type doesn't carry one.
pub const DEFAULT_TTS_SAMPLE_RATE: u32 = 24_000;

/// Parse the `rate=` parameter out of an audio MIME type.
pub fn parse_rate_from_mime(mime: &str) -> Option<u32> {
    mime.split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("rate="))
        .and_then(|rate| rate.parse().ok())
}

/// Sniff for an MP3 payload by magic bytes (frame sync or ID3 tag).
pub fn looks_like_mp3(data: &[u8]) -> bool {
    if data.len() < 3 {
        return false;
    }
    if &data[..3] == b"ID3" {
        return true;
    }
    data[0] == 0xff && (data[1] == 0xfb || data[1] == 0xf3)
}

/// Wrap raw PCM in a standard 44-byte RIFF/WAVE header.
pub fn wrap_pcm_in_wav(pcm: &[u8], sample_rate: u32, channels: u16, bits_per_sample: u16) -> Vec<u8> {
    let byte_rate = sample_rate * channels as u32 * bits_per_sample as u32 / 8;
    let block_align = channels * bits_per_sample / 8;
    let data_len = pcm.len() as u32;

    let mut wav = Vec::with_capacity(44 + pcm.len());
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes()); // PCM fmt chunk size
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM format tag
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bits_per_sample.to_le_bytes());

    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(pcm);

    wav
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rate_from_mime() {
        assert_eq!(
            parse_rate_from_mime("audio/L16;codec=pcm;rate=24000"),
            Some(24_000)
        );
        assert_eq!(parse_rate_from_mime("audio/L16; rate=16000"), Some(16_000));
        assert_eq!(parse_rate_from_mime("audio/mpeg"), None);
        assert_eq!(parse_rate_from_mime("audio/L16;rate=abc"), None);
    }

    #[test]
    fn test_mp3_sniffing() {
        assert!(looks_like_mp3(b"ID3\x04\x00"));
        assert!(looks_like_mp3(&[0xff, 0xfb, 0x90, 0x00]));
        assert!(looks_like_mp3(&[0xff, 0xf3, 0x44, 0x00]));
        assert!(!looks_like_mp3(b"RIFF"));
        assert!(!looks_like_mp3(&[0xff]));
    }

    #[test]
    fn test_wav_header_layout() {
        let pcm = vec![0u8; 480];
        let wav = wrap_pcm_in_wav(&pcm, 24_000, 1, 16);

        assert_eq!(wav.len(), 44 + 480);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");

        // Chunk size = 36 + data length
        assert_eq!(u32::from_le_bytes(wav[4..8].try_into().unwrap()), 36 + 480);
        // Sample rate at offset 24
        assert_eq!(u32::from_le_bytes(wav[24..28].try_into().unwrap()), 24_000);
        // Byte rate = rate * channels * bits / 8
        assert_eq!(u32::from_le_bytes(wav[28..32].try_into().unwrap()), 48_000);
        // Data length at offset 40
        assert_eq!(u32::from_le_bytes(wav[40..44].try_into().unwrap()), 480);
    }
}
