#![no_main]

use libfuzzer_sys::fuzz_target;
use seqpoints::seqpoints::{SeqPointData, SeqPointInfo};

fuzz_target!(|data: &[u8]| {
    if let Ok(info) = SeqPointInfo::from_bytes(data) {
        for entry in info.iter() {
            let _ = info.next_ids(&entry);
        }
        let _ = info.find_prev_by_native_offset(i32::MAX);
    }
    let _ = SeqPointData::from_bytes(data);
});
