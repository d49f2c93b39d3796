/// Bitrates (kbps) accepted for MPEG-1/2 layer III CBR output.
pub const STANDARD_BITRATES_KBPS: [u32; 18] = [
    8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 192, 224, 256, 320,
];

/// Returns `kbps` if it is a standard bitrate, otherwise the smallest standard
/// bitrate above it. Values outside the table clamp to its ends.
pub fn standard_bitrate(kbps: u32) -> u32 {
    let rates = &STANDARD_BITRATES_KBPS;
    match rates.binary_search(&kbps) {
        Ok(i) => rates[i],
        Err(i) => rates[i.min(rates.len() - 1)],
    }
}

/// Target bitrate for a PCM stream of `byte_rate` bytes per second.
///
/// The byte rate is divided by 1000 with truncation before snapping to the
/// table, so e.g. 44.1 kHz 16-bit mono (88200 B/s) maps to 96 kbps.
pub fn bitrate_for_byte_rate(byte_rate: u32) -> u32 {
    standard_bitrate(byte_rate / 1000)
}
