//! Protocol constants for the Ignite binary client protocol.

/// Size of the message length field in bytes.
pub const SIZE_OF_LENGTH_FIELD: usize = 4;

/// Size of the request header after the length field (op code + request id).
pub const REQUEST_HEADER_SIZE: usize = 2 + 8;

/// Largest message the codec accepts before declaring the stream corrupted.
pub const MAX_MESSAGE_SIZE: usize = 256 * 1024 * 1024;

/// Handshake request marker byte.
pub const HANDSHAKE_CODE: i8 = 1;

/// Client type code sent in the handshake (thin client).
pub const THIN_CLIENT_CODE: i8 = 2;

/// Response header flag: the request failed and a status/message follows.
pub const RESPONSE_FLAG_ERROR: i16 = 1;

/// Response header flag: the affinity topology changed and its new version follows.
pub const RESPONSE_FLAG_TOPOLOGY_CHANGED: i16 = 2;

/// Status code for a successful operation.
pub const STATUS_SUCCESS: i32 = 0;

/// Generic failure status used when the server does not report one.
pub const STATUS_FAILED: i32 = 1;

// Operation codes.

/// Releases a server-side resource such as a query cursor.
pub const OP_RESOURCE_CLOSE: i16 = 0;
/// Keeps an idle connection alive.
pub const OP_HEARTBEAT: i16 = 1;
/// Lists the names of all caches.
pub const OP_CACHE_GET_NAMES: i16 = 1050;
/// Requests the partition-to-node mapping for a set of caches.
pub const OP_CACHE_PARTITIONS: i16 = 1101;
/// Runs an SQL fields query.
pub const OP_QUERY_SQL_FIELDS: i16 = 2004;
/// Fetches the next page of an SQL fields query cursor.
pub const OP_QUERY_SQL_FIELDS_CURSOR_GET_PAGE: i16 = 2005;
/// Fetches a binary type description.
pub const OP_GET_BINARY_TYPE: i16 = 3002;
/// Registers a binary type description.
pub const OP_PUT_BINARY_TYPE: i16 = 3003;

// Data object type codes.

/// Signed byte.
pub const TC_BYTE: u8 = 1;
/// Signed 16-bit integer.
pub const TC_SHORT: u8 = 2;
/// Signed 32-bit integer.
pub const TC_INT: u8 = 3;
/// Signed 64-bit integer.
pub const TC_LONG: u8 = 4;
/// 32-bit float.
pub const TC_FLOAT: u8 = 5;
/// 64-bit float.
pub const TC_DOUBLE: u8 = 6;
/// UTF-16 code unit.
pub const TC_CHAR: u8 = 7;
/// Boolean.
pub const TC_BOOL: u8 = 8;
/// UTF-8 string.
pub const TC_STRING: u8 = 9;
/// UUID.
pub const TC_UUID: u8 = 10;
/// Milliseconds since the epoch.
pub const TC_DATE: u8 = 11;
/// Byte array.
pub const TC_BYTE_ARRAY: u8 = 12;
/// Short array.
pub const TC_SHORT_ARRAY: u8 = 13;
/// Int array.
pub const TC_INT_ARRAY: u8 = 14;
/// Long array.
pub const TC_LONG_ARRAY: u8 = 15;
/// Float array.
pub const TC_FLOAT_ARRAY: u8 = 16;
/// Double array.
pub const TC_DOUBLE_ARRAY: u8 = 17;
/// Char array.
pub const TC_CHAR_ARRAY: u8 = 18;
/// Bool array.
pub const TC_BOOL_ARRAY: u8 = 19;
/// String array.
pub const TC_STRING_ARRAY: u8 = 20;
/// UUID array.
pub const TC_UUID_ARRAY: u8 = 21;
/// Date array.
pub const TC_DATE_ARRAY: u8 = 22;
/// Array of arbitrary objects.
pub const TC_OBJECT_ARRAY: u8 = 23;
/// Collection.
pub const TC_COLLECTION: u8 = 24;
/// Map.
pub const TC_MAP: u8 = 25;
/// Binary object wrapped in a byte array with an offset.
pub const TC_WRAPPED_BINARY: u8 = 27;
/// Enum value.
pub const TC_ENUM: u8 = 28;
/// Enum array.
pub const TC_ENUM_ARRAY: u8 = 29;
/// Arbitrary-precision decimal.
pub const TC_DECIMAL: u8 = 30;
/// Decimal array.
pub const TC_DECIMAL_ARRAY: u8 = 31;
/// Timestamp (millis + nanos).
pub const TC_TIMESTAMP: u8 = 33;
/// Timestamp array.
pub const TC_TIMESTAMP_ARRAY: u8 = 34;
/// Time of day in milliseconds.
pub const TC_TIME: u8 = 36;
/// Time array.
pub const TC_TIME_ARRAY: u8 = 37;
/// Binary enum.
pub const TC_BINARY_ENUM: u8 = 38;
/// Null value.
pub const TC_NULL: u8 = 101;
/// Complex (binary) object.
pub const TC_COMPLEX_OBJECT: u8 = 103;

/// Size of the complex object header preceding the field data.
pub const COMPLEX_OBJECT_HEADER_SIZE: usize = 24;

/// Default thin client port.
pub const DEFAULT_PORT: u16 = 10800;

/// Default host.
pub const DEFAULT_HOST: &str = "127.0.0.1";
