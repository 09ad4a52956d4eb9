//! Raw-transmit command encoding.
//!
//! The device accepts one IR transmission per CLI command:
//!
//! ```text
//! ir tx RAW F:38000 DC:33 1280 400 1280 400 ...\r\n
//! ```
//!
//! Its per-call sample buffer is limited, so waveforms longer than
//! [`CHUNK_SAMPLES`] durations are split into several commands sent in
//! order. The device is stateless across calls: each chunk is a complete,
//! self-contained transmission request.

use crate::signal::IrSignal;

/// Maximum number of samples the device accepts per command (512 bits / 8).
pub const CHUNK_SAMPLES: usize = 64;

/// Command terminator expected by the device CLI.
pub const COMMAND_TERMINATOR: &str = "\r\n";

/// Number of commands needed to transmit `sample_count` durations.
pub fn chunk_count(sample_count: usize) -> usize {
    sample_count.div_ceil(CHUNK_SAMPLES)
}

/// Encode one raw-transmit command carrying the given slice of samples.
///
/// The carrier parameters are repeated on every chunk because each command
/// is an independent transmission request to the device.
pub fn encode_raw_tx(signal: &IrSignal, samples: &[u32]) -> Vec<u8> {
    let mut cmd = format!(
        "ir tx RAW F:{} DC:{}",
        signal.frequency_hz(),
        signal.duty_cycle()
    );
    for sample in samples {
        cmd.push(' ');
        cmd.push_str(&sample.to_string());
    }
    cmd.push_str(COMMAND_TERMINATOR);
    cmd.into_bytes()
}

/// Encode a full signal as an ordered sequence of chunk commands.
pub fn encode_chunks(signal: &IrSignal) -> Vec<Vec<u8>> {
    signal
        .samples()
        .chunks(CHUNK_SAMPLES)
        .map(|chunk| encode_raw_tx(signal, chunk))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(samples: Vec<u32>) -> IrSignal {
        IrSignal::new("test", 38000, 33.0, samples).unwrap()
    }

    #[test]
    fn test_encode_raw_tx_format() {
        let signal = signal(vec![1280, 400, 1280]);
        let encoded = encode_raw_tx(&signal, signal.samples());
        assert_eq!(
            String::from_utf8(encoded).unwrap(),
            "ir tx RAW F:38000 DC:33 1280 400 1280\r\n"
        );
    }

    #[test]
    fn test_fractional_duty_cycle() {
        let signal = IrSignal::new("test", 36000, 49.5, vec![100]).unwrap();
        let encoded = encode_raw_tx(&signal, signal.samples());
        assert_eq!(
            String::from_utf8(encoded).unwrap(),
            "ir tx RAW F:36000 DC:49.5 100\r\n"
        );
    }

    #[test]
    fn test_chunk_count() {
        assert_eq!(chunk_count(1), 1);
        assert_eq!(chunk_count(64), 1);
        assert_eq!(chunk_count(65), 2);
        assert_eq!(chunk_count(130), 3);
    }

    #[test]
    fn test_encode_chunks_splits_at_64() {
        // 130 samples -> chunks of 64, 64 and 2.
        let samples: Vec<u32> = (0..130).collect();
        let signal = signal(samples);
        let chunks = encode_chunks(&signal);
        assert_eq!(chunks.len(), 3);

        let counts: Vec<usize> = chunks
            .iter()
            .map(|c| {
                // five fixed tokens ("ir tx RAW F:.. DC:..") precede the samples
                String::from_utf8(c.clone()).unwrap().split_whitespace().count() - 5
            })
            .collect();
        assert_eq!(counts, vec![64, 64, 2]);
    }

    #[test]
    fn test_chunks_preserve_order() {
        let samples: Vec<u32> = (0..70).collect();
        let signal = signal(samples);
        let chunks = encode_chunks(&signal);

        let first = String::from_utf8(chunks[0].clone()).unwrap();
        let second = String::from_utf8(chunks[1].clone()).unwrap();
        assert!(first.contains(" 0 1 2 "));
        assert!(first.trim_end().ends_with(" 63"));
        assert!(second.trim_end().ends_with("64 65 66 67 68 69"));
    }

    #[test]
    fn test_every_chunk_terminated() {
        let signal = signal((0..130).collect());
        for chunk in encode_chunks(&signal) {
            assert!(chunk.ends_with(b"\r\n"));
        }
    }
}
