//! Client-side cache of complex-object type descriptions.

use std::collections::HashMap;

use async_trait::async_trait;
use ignite_core::binary::{BinaryTypeDescriptor, SchemaRef};
use ignite_core::Result;
use tokio::sync::RwLock;

/// Where the registry fetches and registers type descriptions.
#[async_trait]
pub trait TypeSource: Send + Sync {
    /// Fetches every schema the server knows for `type_id`, or `None`.
    async fn get_binary_type(&self, type_id: i32) -> Result<Option<Vec<BinaryTypeDescriptor>>>;

    /// Registers `descriptor` with the server.
    async fn put_binary_type(&self, descriptor: &BinaryTypeDescriptor) -> Result<()>;
}

/// Type descriptors keyed by type id, then schema id.
///
/// Lookups through [`get`](Self::get) are local. [`resolve`](Self::resolve)
/// consults the server on a miss and caches what it learns.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: RwLock<HashMap<i32, Vec<BinaryTypeDescriptor>>>,
}

fn select(
    schemas: &[BinaryTypeDescriptor],
    schema: Option<SchemaRef<'_>>,
) -> Option<Vec<BinaryTypeDescriptor>> {
    // an empty field list means no schema
    let schema = schema.filter(|s| !matches!(s, SchemaRef::Fields(fields) if fields.is_empty()));
    match schema {
        None if schemas.is_empty() => None,
        None => Some(schemas.to_vec()),
        Some(schema) => {
            let id = schema.schema_id();
            schemas
                .iter()
                .find(|d| d.schema_id() == id)
                .map(|d| vec![d.clone()])
        }
    }
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Local lookup.
    ///
    /// Without a schema, returns every known schema of the type; with one,
    /// the single matching descriptor. `None` if nothing matches.
    pub async fn get(
        &self,
        type_id: i32,
        schema: Option<SchemaRef<'_>>,
    ) -> Option<Vec<BinaryTypeDescriptor>> {
        let types = self.types.read().await;
        types.get(&type_id).and_then(|s| select(s, schema))
    }

    /// Like [`get`](Self::get), but fetches the type from `source` on a miss.
    ///
    /// Fetched schemas are added without replacing ones already known. A
    /// key that resolved once is served locally afterwards.
    pub async fn resolve<S>(
        &self,
        source: &S,
        type_id: i32,
        schema: Option<SchemaRef<'_>>,
    ) -> Result<Option<Vec<BinaryTypeDescriptor>>>
    where
        S: TypeSource + ?Sized,
    {
        if let Some(found) = self.get(type_id, schema).await {
            return Ok(Some(found));
        }

        let fetched = match source.get_binary_type(type_id).await? {
            Some(fetched) => fetched,
            None => {
                tracing::debug!(type_id, "type unknown to server");
                return Ok(None);
            }
        };

        let mut types = self.types.write().await;
        let schemas = types.entry(type_id).or_default();
        for descriptor in fetched {
            if !schemas.iter().any(|d| d.schema_id() == descriptor.schema_id()) {
                schemas.push(descriptor);
            }
        }
        tracing::debug!(type_id, schemas = schemas.len(), "type resolved");
        Ok(select(schemas, schema))
    }

    /// Registers `descriptor` with the server unless it already knows the
    /// (type id, schema id) pair, then stores it locally.
    ///
    /// The local copy always replaces an existing one with the same key.
    pub async fn register<S>(
        &self,
        source: &S,
        descriptor: BinaryTypeDescriptor,
        affinity_key_field: Option<&str>,
    ) -> Result<BinaryTypeDescriptor>
    where
        S: TypeSource + ?Sized,
    {
        let descriptor = match affinity_key_field {
            Some(field) => descriptor.with_affinity_key_field(field),
            None => descriptor,
        };

        let known = self
            .resolve(
                source,
                descriptor.type_id(),
                Some(SchemaRef::Id(descriptor.schema_id())),
            )
            .await?
            .is_some();
        if !known {
            source.put_binary_type(&descriptor).await?;
            tracing::debug!(
                type_id = descriptor.type_id(),
                schema_id = descriptor.schema_id(),
                type_name = descriptor.type_name(),
                "type registered"
            );
        }

        self.insert(descriptor.clone()).await;
        Ok(descriptor)
    }

    /// Stores `descriptor`, replacing any with the same type and schema id.
    pub async fn insert(&self, descriptor: BinaryTypeDescriptor) {
        let mut types = self.types.write().await;
        let schemas = types.entry(descriptor.type_id()).or_default();
        match schemas
            .iter_mut()
            .find(|d| d.schema_id() == descriptor.schema_id())
        {
            Some(existing) => *existing = descriptor,
            None => schemas.push(descriptor),
        }
    }

    /// Number of cached (type id, schema id) entries.
    pub async fn len(&self) -> usize {
        self.types.read().await.values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing is cached.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drops every cached descriptor.
    pub async fn clear(&self) {
        self.types.write().await.clear();
    }
}
