//! Identifier hashes shared with the server.

const FNV1_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV1_PRIME: u32 = 0x0100_0193;

/// Java `String.hashCode` over the UTF-16 code units of `s`.
pub fn java_hashcode(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32))
}

/// Id of a type or field name: the hash of its lower-cased form.
pub fn entity_id(name: &str) -> i32 {
    java_hashcode(&name.to_lowercase())
}

/// Id of a cache: the hash of its name, case preserved.
pub fn cache_id(name: &str) -> i32 {
    java_hashcode(name)
}

/// Schema id of an ordered list of field ids.
///
/// FNV-1 over the little-endian bytes of each id. The empty schema is 0.
pub fn schema_id<I>(field_ids: I) -> i32
where
    I: IntoIterator<Item = i32>,
{
    let mut ids = field_ids.into_iter().peekable();
    if ids.peek().is_none() {
        return 0;
    }
    let hash = ids.fold(FNV1_OFFSET_BASIS, |hash, id| {
        id.to_le_bytes()
            .iter()
            .fold(hash, |h, b| (h ^ *b as u32).wrapping_mul(FNV1_PRIME))
    });
    hash as i32
}

/// Schema id of an ordered list of field names.
pub fn schema_id_of_names<'a, I>(names: I) -> i32
where
    I: IntoIterator<Item = &'a str>,
{
    schema_id(names.into_iter().map(entity_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_java_hashcode_known_values() {
        assert_eq!(java_hashcode(""), 0);
        assert_eq!(java_hashcode("id"), 3355);
        assert_eq!(java_hashcode("hello"), 99_162_322);
        assert_eq!(java_hashcode("SQL_PUBLIC_PERSON"), -1_447_683_814);
    }

    #[test]
    fn test_entity_id_lowercases() {
        assert_eq!(entity_id("Person"), java_hashcode("person"));
        assert_eq!(entity_id("Person"), -991_716_523);
        assert_eq!(cache_id("Person"), -1_907_849_355);
    }

    #[test]
    fn test_schema_id_known_values() {
        assert_eq!(schema_id(Vec::new()), 0);
        assert_eq!(schema_id([3355]), 1_664_353_245);
        assert_eq!(schema_id_of_names(["id", "name"]), 970_781_171);
    }

    #[test]
    fn test_schema_id_is_order_sensitive() {
        let forward = schema_id_of_names(["id", "name"]);
        let reverse = schema_id_of_names(["name", "id"]);
        assert_ne!(forward, reverse);
        assert_eq!(reverse, 1_516_282_639);
    }

    #[test]
    fn test_schema_id_is_pure() {
        let ids = [entity_id("a"), entity_id("b"), entity_id("c")];
        assert_eq!(schema_id(ids), schema_id(ids));
    }
}
