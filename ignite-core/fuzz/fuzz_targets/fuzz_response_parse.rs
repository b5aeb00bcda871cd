#![no_main]

use bytes::Bytes;
use libfuzzer_sys::fuzz_target;

use ignite_core::protocol::{HandshakeResponse, ProtocolVersion, Response};

fuzz_target!(|data: &[u8]| {
    for version in [
        ProtocolVersion::V1_2_0,
        ProtocolVersion::V1_4_0,
        ProtocolVersion::V1_7_0,
    ] {
        if let Ok(response) = Response::parse(Bytes::copy_from_slice(data), version) {
            let _ = response.request_id();
            let _ = response.topology_version();
            let _ = response.into_result();
        }
        let _ = HandshakeResponse::parse(data, version);
    }
});
