#![no_main]

use libfuzzer_sys::fuzz_target;
use perfstats::histogram::{BinLayout, Interpolation, SemilogLayout};
use perfstats::{BoundedHistogram, SemilogHistogram};

fuzz_target!(|data: &[u8]| {
    // First byte picks the layout, the rest is a stream of 9-byte ops:
    // one tag byte followed by a little-endian u64 payload
    let Some((&header, ops)) = data.split_first() else {
        return;
    };

    let ndb = u32::from(header % 13);
    let Ok(mut semilog) = SemilogHistogram::new(ndb) else {
        return;
    };
    let Ok(mut bounded) = BoundedHistogram::bounded(0, 1 << 20, 64) else {
        return;
    };
    let layout = SemilogLayout::new(ndb).ok();

    for op in ops.chunks_exact(9) {
        let mut payload = [0u8; 8];
        payload.copy_from_slice(&op[1..]);
        let value = u64::from_le_bytes(payload);

        match op[0] % 4 {
            0 | 1 => {
                semilog.add(value);
                bounded.add(value);
                if let Some(layout) = &layout {
                    // Every value must fall inside the range of its own bin
                    assert!(layout.range(layout.calcbin(value)).contains(value));
                }
            }
            2 => {
                // Payload reinterpreted as any f64, including NaN and infinities
                let pct = f64::from_bits(value);
                let interpolation = if op[0] & 0x80 == 0 {
                    Interpolation::Linear
                } else {
                    Interpolation::Gaussian
                };
                let a = semilog.percentile_with(pct, interpolation);
                let b = bounded.percentile_with(pct, interpolation);
                if semilog.is_empty() {
                    assert!(a.is_nan());
                    assert!(b.is_nan());
                }
            }
            _ => {
                if value % 16 == 0 {
                    semilog.clear();
                    bounded.clear();
                }
                let _ = semilog.spread();
                let _ = semilog.mean();
            }
        }
    }
});
