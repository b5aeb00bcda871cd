//! Descriptor-driven encode and decode.

use super::descriptor::{Descriptor, Field, Primitive};
use super::value::{Record, Value};
use crate::error::{IgniteError, Result};
use crate::serialization::{
    read_string_object, read_uuid_object, write_string_object, write_uuid_object, DataInput,
    DataOutput, ObjectDataInput, ObjectDataOutput,
};

/// Decodes one value laid out as `descriptor`.
///
/// Fails with [`IgniteError::Protocol`] on truncated input or an impossible
/// array count. On failure nothing is returned and the input position is
/// unspecified.
pub fn decode(descriptor: &Descriptor, input: &mut ObjectDataInput<'_>) -> Result<Value> {
    decode_in(descriptor, input, &Record::new())
}

/// Encodes `value` laid out as `descriptor`, returning the number of bytes written.
///
/// Fails with [`IgniteError::Serialization`] if the value does not have the
/// shape the descriptor requires.
pub fn encode(descriptor: &Descriptor, value: &Value, output: &mut ObjectDataOutput) -> Result<usize> {
    let start = output.len();
    encode_in(descriptor, value, output, &Record::new())?;
    Ok(output.len() - start)
}

fn decode_in(descriptor: &Descriptor, input: &mut ObjectDataInput<'_>, context: &Record) -> Result<Value> {
    match descriptor {
        Descriptor::Primitive(p) => decode_primitive(*p, input),
        Descriptor::Struct(fields) => decode_struct(fields, input).map(Value::Record),
        Descriptor::StructArray(fields) => {
            let count = input.read_int()?;
            if count < 0 {
                return Err(IgniteError::Protocol(format!(
                    "negative array count: {}",
                    count
                )));
            }
            let count = count as usize;
            let element_size = fields
                .iter()
                .map(|f| f.descriptor().min_size())
                .sum::<usize>()
                .max(1);
            if count.saturating_mul(element_size) > input.remaining() {
                return Err(IgniteError::Protocol(format!(
                    "array count {} exceeds remaining {} bytes",
                    count,
                    input.remaining()
                )));
            }
            let mut elements = Vec::with_capacity(count);
            for _ in 0..count {
                elements.push(decode_struct(fields, input)?);
            }
            Ok(Value::Array(elements))
        }
        Descriptor::Conditional {
            predicate,
            then,
            otherwise,
        } => {
            let branch = if predicate(context) { then } else { otherwise };
            decode_in(branch, input, context)
        }
    }
}

fn decode_struct(fields: &[Field], input: &mut ObjectDataInput<'_>) -> Result<Record> {
    let mut record = Record::with_capacity(fields.len());
    for field in fields {
        let value = decode_in(field.descriptor(), input, &record)?;
        record.push(field.name(), value);
    }
    Ok(record)
}

fn decode_primitive(primitive: Primitive, input: &mut ObjectDataInput<'_>) -> Result<Value> {
    Ok(match primitive {
        Primitive::Byte => Value::Byte(input.read_byte()?),
        Primitive::UByte => Value::UByte(input.read_ubyte()?),
        Primitive::Short => Value::Short(input.read_short()?),
        Primitive::Int => Value::Int(input.read_int()?),
        Primitive::Long => Value::Long(input.read_long()?),
        Primitive::Float => Value::Float(input.read_float()?),
        Primitive::Double => Value::Double(input.read_double()?),
        Primitive::Bool => Value::Bool(input.read_bool()?),
        Primitive::Uuid => Value::Uuid(input.read_uuid()?),
        Primitive::String => Value::String(read_string_object(input)?),
        Primitive::UuidObject => Value::UuidObject(read_uuid_object(input)?),
    })
}

fn encode_in(
    descriptor: &Descriptor,
    value: &Value,
    output: &mut ObjectDataOutput,
    context: &Record,
) -> Result<()> {
    match descriptor {
        Descriptor::Primitive(p) => encode_primitive(*p, value, output),
        Descriptor::Struct(fields) => match value {
            Value::Record(record) => encode_struct(fields, record, output),
            other => Err(shape_mismatch("record", other)),
        },
        Descriptor::StructArray(fields) => match value {
            Value::Array(elements) => {
                output.write_int(elements.len() as i32)?;
                elements
                    .iter()
                    .try_for_each(|record| encode_struct(fields, record, output))
            }
            other => Err(shape_mismatch("array", other)),
        },
        Descriptor::Conditional {
            predicate,
            then,
            otherwise,
        } => {
            let branch = if predicate(context) { then } else { otherwise };
            encode_in(branch, value, output, context)
        }
    }
}

fn encode_struct(fields: &[Field], record: &Record, output: &mut ObjectDataOutput) -> Result<()> {
    for field in fields {
        let value = record.get(field.name()).ok_or_else(|| {
            IgniteError::Serialization(format!("missing field `{}`", field.name()))
        })?;
        encode_in(field.descriptor(), value, output, record)?;
    }
    Ok(())
}

fn encode_primitive(primitive: Primitive, value: &Value, output: &mut ObjectDataOutput) -> Result<()> {
    match (primitive, value) {
        (Primitive::Byte, Value::Byte(v)) => output.write_byte(*v),
        (Primitive::UByte, Value::UByte(v)) => output.write_ubyte(*v),
        (Primitive::Short, Value::Short(v)) => output.write_short(*v),
        (Primitive::Int, Value::Int(v)) => output.write_int(*v),
        (Primitive::Long, Value::Long(v)) => output.write_long(*v),
        (Primitive::Float, Value::Float(v)) => output.write_float(*v),
        (Primitive::Double, Value::Double(v)) => output.write_double(*v),
        (Primitive::Bool, Value::Bool(v)) => output.write_bool(*v),
        (Primitive::Uuid, Value::Uuid(v)) => output.write_uuid(v),
        (Primitive::String, Value::String(v)) => write_string_object(output, v.as_deref()),
        (Primitive::UuidObject, Value::UuidObject(v)) => write_uuid_object(output, v.as_ref()),
        (p, other) => Err(IgniteError::Serialization(format!(
            "expected {:?}, found {}",
            p,
            other.kind()
        ))),
    }
}

fn shape_mismatch(expected: &str, found: &Value) -> IgniteError {
    IgniteError::Serialization(format!("expected {}, found {}", expected, found.kind()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::field;
    use uuid::Uuid;

    fn is_flagged(record: &Record) -> bool {
        matches!(record.get("flag"), Some(Value::Bool(true)))
    }

    fn tagged() -> Descriptor {
        Descriptor::structure(vec![
            field("flag", Descriptor::BOOL),
            field(
                "body",
                Descriptor::conditional(
                    is_flagged,
                    Descriptor::struct_array(vec![field("id", Descriptor::INT)]),
                    Descriptor::structure(vec![]),
                ),
            ),
        ])
    }

    fn roundtrip(descriptor: &Descriptor, value: &Value) -> Value {
        let mut out = ObjectDataOutput::new();
        let written = encode(descriptor, value, &mut out).unwrap();
        assert_eq!(written, out.len());
        let bytes = out.into_bytes();
        let mut input = ObjectDataInput::new(&bytes);
        let decoded = decode(descriptor, &mut input).unwrap();
        assert_eq!(input.remaining(), 0);
        decoded
    }

    #[test]
    fn test_struct_roundtrip() {
        let descriptor = Descriptor::structure(vec![
            field("a", Descriptor::INT),
            field("b", Descriptor::STRING),
            field("c", Descriptor::UUID_OBJECT),
            field("d", Descriptor::Primitive(Primitive::Uuid)),
        ]);
        let uuid = Uuid::new_v4();
        let value = Value::Record(
            Record::new()
                .with("a", 5)
                .with("b", Value::String(None))
                .with("c", Value::UuidObject(Some(uuid)))
                .with("d", Value::Uuid(uuid)),
        );
        assert_eq!(roundtrip(&descriptor, &value), value);
    }

    #[test]
    fn test_struct_array_roundtrip() {
        let descriptor = Descriptor::struct_array(vec![
            field("id", Descriptor::INT),
            field("name", Descriptor::STRING),
        ]);
        let value = Value::Array(vec![
            Record::new().with("id", 1).with("name", "one"),
            Record::new().with("id", 2).with("name", "two"),
        ]);
        assert_eq!(roundtrip(&descriptor, &value), value);
    }

    #[test]
    fn test_conditional_roundtrip_both_branches() {
        let descriptor = tagged();
        let taken = Value::Record(
            Record::new()
                .with("flag", true)
                .with("body", vec![Record::new().with("id", 9)]),
        );
        assert_eq!(roundtrip(&descriptor, &taken), taken);

        let skipped = Value::Record(Record::new().with("flag", false).with("body", Record::new()));
        assert_eq!(roundtrip(&descriptor, &skipped), skipped);
    }

    #[test]
    fn test_conditional_unselected_branch_not_read() {
        let descriptor = tagged();
        // flag = false, nothing else: the array branch would need 4 more bytes
        let bytes = [0u8];
        let mut input = ObjectDataInput::new(&bytes);
        let value = decode(&descriptor, &mut input).unwrap();
        let record = value.as_record().unwrap();
        assert_eq!(record.record("body").unwrap(), &Record::new());
    }

    #[test]
    fn test_decoder_is_reusable() {
        let descriptor = tagged();
        let bytes = [1u8, 1, 0, 0, 0, 3, 0, 0, 0];
        for _ in 0..2 {
            let mut input = ObjectDataInput::new(&bytes);
            let value = decode(&descriptor, &mut input).unwrap();
            let body = value.as_record().unwrap().array("body").unwrap();
            assert_eq!(body[0].int("id").unwrap(), 3);
        }
    }

    #[test]
    fn test_truncated_input_is_protocol_error() {
        let descriptor = Descriptor::structure(vec![
            field("a", Descriptor::INT),
            field("b", Descriptor::LONG),
        ]);
        let bytes = [1u8, 0, 0, 0, 2, 0];
        let mut input = ObjectDataInput::new(&bytes);
        assert!(matches!(
            decode(&descriptor, &mut input),
            Err(IgniteError::Protocol(_))
        ));
    }

    #[test]
    fn test_negative_count_is_protocol_error() {
        let descriptor = Descriptor::struct_array(vec![field("id", Descriptor::INT)]);
        let bytes = (-1i32).to_le_bytes();
        let mut input = ObjectDataInput::new(&bytes);
        let err = decode(&descriptor, &mut input).unwrap_err();
        assert!(err.to_string().contains("negative array count"));
    }

    #[test]
    fn test_count_past_buffer_is_protocol_error() {
        let descriptor = Descriptor::struct_array(vec![field("id", Descriptor::INT)]);
        let mut bytes = 3i32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0; 8]);
        let mut input = ObjectDataInput::new(&bytes);
        assert!(matches!(
            decode(&descriptor, &mut input),
            Err(IgniteError::Protocol(_))
        ));
    }

    #[test]
    fn test_encode_missing_field() {
        let descriptor = Descriptor::structure(vec![field("a", Descriptor::INT)]);
        let mut out = ObjectDataOutput::new();
        let err = encode(&descriptor, &Value::Record(Record::new()), &mut out).unwrap_err();
        assert!(matches!(err, IgniteError::Serialization(_)));
    }

    #[test]
    fn test_encode_wrong_scalar_kind() {
        let descriptor = Descriptor::structure(vec![field("a", Descriptor::INT)]);
        let value = Value::Record(Record::new().with("a", 1i64));
        let mut out = ObjectDataOutput::new();
        assert!(matches!(
            encode(&descriptor, &value, &mut out),
            Err(IgniteError::Serialization(_))
        ));
    }
}
