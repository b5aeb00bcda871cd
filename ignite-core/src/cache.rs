//! Cache listing messages.

use crate::error::{IgniteError, Result};
use crate::protocol::{Request, OP_CACHE_GET_NAMES};
use crate::serialization::{read_string_object, DataInput, ObjectDataInput};

/// Builds a request listing every cache name.
pub fn cache_names_request() -> Request {
    Request::new(OP_CACHE_GET_NAMES)
}

/// Parses a cache name listing. Null names are skipped.
pub fn parse_cache_names(payload: &[u8]) -> Result<Vec<String>> {
    let mut input = ObjectDataInput::new(payload);
    let count = input.read_int()?;
    if count < 0 {
        return Err(IgniteError::Protocol(format!(
            "negative cache name count: {}",
            count
        )));
    }
    input.ensure_remaining(count as usize)?;
    let mut names = Vec::with_capacity(count as usize);
    for _ in 0..count {
        if let Some(name) = read_string_object(&mut input)? {
            names.push(name);
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialization::{write_string_object, DataOutput, ObjectDataOutput};

    #[test]
    fn test_parse_cache_names() {
        let mut out = ObjectDataOutput::new();
        out.write_int(3).unwrap();
        write_string_object(&mut out, Some("a")).unwrap();
        write_string_object(&mut out, None).unwrap();
        write_string_object(&mut out, Some("b")).unwrap();
        assert_eq!(parse_cache_names(out.as_bytes()).unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn test_request_has_empty_payload() {
        let request = cache_names_request();
        assert_eq!(request.op_code(), OP_CACHE_GET_NAMES);
        assert!(request.payload().is_empty());
    }

    #[test]
    fn test_count_past_buffer() {
        let bytes = 10i32.to_le_bytes();
        assert!(parse_cache_names(&bytes).is_err());
    }
}
