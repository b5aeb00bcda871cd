#![no_main]

use bytes::BytesMut;
use libfuzzer_sys::fuzz_target;
use tokio_util::codec::Decoder;

use ignite_core::protocol::MessageCodec;

fuzz_target!(|data: &[u8]| {
    let mut codec = MessageCodec::with_max_message_size(1 << 20);
    let mut buf = BytesMut::from(data);

    loop {
        match codec.decode(&mut buf) {
            Ok(Some(body)) => {
                let _ = body.len();
            }
            Ok(None) | Err(_) => break,
        }
    }
});
