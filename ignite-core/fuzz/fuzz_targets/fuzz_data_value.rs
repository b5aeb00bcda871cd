#![no_main]

use libfuzzer_sys::fuzz_target;

use ignite_core::serialization::{read_data_value, write_data_value};
use ignite_core::{ObjectDataInput, ObjectDataOutput};

fuzz_target!(|data: &[u8]| {
    let mut input = ObjectDataInput::new(data);
    if let Ok(value) = read_data_value(&mut input) {
        let mut output = ObjectDataOutput::new();
        write_data_value(&mut output, &value).expect("decoded value must encode");
    }
});
