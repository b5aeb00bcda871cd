//! Binary type query and registration messages.

use std::collections::HashMap;

use super::descriptor::{BinaryField, BinaryTypeDescriptor};
use crate::error::{IgniteError, Result};
use crate::protocol::{Request, OP_GET_BINARY_TYPE, OP_PUT_BINARY_TYPE};
use crate::serialization::{DataOutput, ObjectDataInput};
use crate::wire::{decode, encode, field, Descriptor, Record, Value};

fn type_exists(record: &Record) -> bool {
    matches!(record.get("type_exists"), Some(Value::Bool(true)))
}

fn is_enum(record: &Record) -> bool {
    matches!(record.get("is_enum"), Some(Value::Bool(true)))
}

/// Layout of a type description, shared by the query response and the
/// registration request.
fn type_body() -> Descriptor {
    Descriptor::structure(vec![
        field("type_id", Descriptor::INT),
        field("type_name", Descriptor::STRING),
        field("affinity_key_field", Descriptor::STRING),
        field(
            "binary_fields",
            Descriptor::struct_array(vec![
                field("field_name", Descriptor::STRING),
                field("type_id", Descriptor::INT),
                field("field_id", Descriptor::INT),
            ]),
        ),
        field("is_enum", Descriptor::BOOL),
        field(
            "enums",
            Descriptor::conditional(
                is_enum,
                Descriptor::struct_array(vec![
                    field("literal", Descriptor::STRING),
                    field("type", Descriptor::INT),
                ]),
                Descriptor::structure(vec![]),
            ),
        ),
        field(
            "schema",
            Descriptor::struct_array(vec![
                field("schema_id", Descriptor::INT),
                field(
                    "schema_fields",
                    Descriptor::struct_array(vec![field("schema_field_id", Descriptor::INT)]),
                ),
            ]),
        ),
    ])
}

/// Layout of the type query response payload.
pub fn binary_type_response_descriptor() -> Descriptor {
    Descriptor::structure(vec![
        field("type_exists", Descriptor::BOOL),
        field(
            "body",
            Descriptor::conditional(type_exists, type_body(), Descriptor::structure(vec![])),
        ),
    ])
}

/// Builds a type query request.
pub fn get_binary_type_request(type_id: i32) -> Result<Request> {
    let mut request = Request::new(OP_GET_BINARY_TYPE);
    request.payload_mut().write_int(type_id)?;
    Ok(request)
}

/// Builds a registration request for one schema of a type.
pub fn put_binary_type_request(descriptor: &BinaryTypeDescriptor) -> Result<Request> {
    let binary_fields = descriptor
        .fields()
        .iter()
        .map(|f| {
            Record::new()
                .with("field_name", f.name())
                .with("type_id", f.type_code())
                .with("field_id", f.field_id())
        })
        .collect::<Vec<_>>();

    let enums = if descriptor.is_enum() {
        Value::Array(
            descriptor
                .enum_values()
                .iter()
                .map(|(literal, ordinal)| {
                    Record::new()
                        .with("literal", literal.as_str())
                        .with("type", *ordinal)
                })
                .collect(),
        )
    } else {
        Value::Record(Record::new())
    };

    let schema_fields = descriptor
        .fields()
        .iter()
        .map(|f| Record::new().with("schema_field_id", f.field_id()))
        .collect::<Vec<_>>();

    let body = Record::new()
        .with("type_id", descriptor.type_id())
        .with("type_name", descriptor.type_name())
        .with(
            "affinity_key_field",
            Value::String(descriptor.affinity_key_field().map(str::to_string)),
        )
        .with("binary_fields", binary_fields)
        .with("is_enum", descriptor.is_enum())
        .with("enums", enums)
        .with(
            "schema",
            vec![Record::new()
                .with("schema_id", descriptor.schema_id())
                .with("schema_fields", schema_fields)],
        );

    let mut request = Request::new(OP_PUT_BINARY_TYPE);
    encode(&type_body(), &Value::Record(body), request.payload_mut())?;
    Ok(request)
}

/// Parses a type query response into one descriptor per reported schema.
///
/// Returns `None` when the server does not know the type. A type without
/// schemas (an enum, or a type registered with no fields) yields a single
/// descriptor holding every field.
pub fn parse_binary_type_response(payload: &[u8]) -> Result<Option<Vec<BinaryTypeDescriptor>>> {
    let mut input = ObjectDataInput::new(payload);
    let value = decode(&binary_type_response_descriptor(), &mut input)?;
    let record = value
        .as_record()
        .ok_or_else(|| IgniteError::Protocol("type response is not a record".to_string()))?;
    if !record.bool("type_exists")? {
        return Ok(None);
    }
    let body = record.record("body")?;

    let type_id = body.int("type_id")?;
    let type_name = body.string("type_name")?.unwrap_or_default().to_string();
    let affinity_key_field = body.string("affinity_key_field")?.map(str::to_string);

    let fields = body
        .array("binary_fields")?
        .iter()
        .map(|f| {
            Ok(BinaryField::with_id(
                f.string("field_name")?.unwrap_or_default(),
                f.int("type_id")?,
                f.int("field_id")?,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    let enum_values = if body.bool("is_enum")? {
        Some(
            body.array("enums")?
                .iter()
                .map(|e| Ok((e.string("literal")?.unwrap_or_default().to_string(), e.int("type")?)))
                .collect::<Result<Vec<_>>>()?,
        )
    } else {
        None
    };

    let schemas = body.array("schema")?;
    if schemas.is_empty() {
        let schema_id = super::hash::schema_id(fields.iter().map(BinaryField::field_id));
        return Ok(Some(vec![BinaryTypeDescriptor::from_parts(
            type_id,
            type_name,
            affinity_key_field,
            enum_values,
            fields,
            schema_id,
        )]));
    }

    let by_id: HashMap<i32, &BinaryField> = fields.iter().map(|f| (f.field_id(), f)).collect();
    let mut descriptors = Vec::with_capacity(schemas.len());
    for schema in schemas {
        let schema_fields = schema
            .array("schema_fields")?
            .iter()
            .map(|s| {
                let id = s.int("schema_field_id")?;
                by_id.get(&id).map(|f| (*f).clone()).ok_or_else(|| {
                    IgniteError::Protocol(format!(
                        "schema of type {} references unknown field id {}",
                        type_id, id
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        descriptors.push(BinaryTypeDescriptor::from_parts(
            type_id,
            type_name.clone(),
            affinity_key_field.clone(),
            enum_values.clone(),
            schema_fields,
            schema.int("schema_id")?,
        ));
    }
    Ok(Some(descriptors))
}
