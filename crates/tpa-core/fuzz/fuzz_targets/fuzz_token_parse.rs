#![no_main]

use libfuzzer_sys::fuzz_target;
use tpa_core::EspView;

fuzz_target!(|data: &[u8]| {
    for hash_len in [1usize, 20, 32] {
        for cumul_items in [0usize, 1, 3] {
            if let Ok(view) = EspView::new(data, hash_len, cumul_items) {
                let _ = view.spi();
                let _ = view.seq();
                let _ = view.token();
                for item in view.cumulative_items() {
                    let _ = item.seq;
                }
                let _ = view.payload();
            }
        }
    }
});
