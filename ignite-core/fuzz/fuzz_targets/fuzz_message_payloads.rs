#![no_main]

use libfuzzer_sys::fuzz_target;

use ignite_core::affinity::parse_partitions_response;
use ignite_core::binary::parse_binary_type_response;
use ignite_core::cache::parse_cache_names;
use ignite_core::query::{parse_first_page, parse_page};

fuzz_target!(|data: &[u8]| {
    let _ = parse_partitions_response(data, &[1, 2, 3]);
    let _ = parse_binary_type_response(data);
    let _ = parse_cache_names(data);
    let _ = parse_first_page(data, true);
    let _ = parse_first_page(data, false);
    let _ = parse_page(data, 3);
});
