//! Blocking facade over the async client.
//!
//! Each [`IgniteClient`] owns a current-thread Tokio runtime and drives the
//! async client on it, suspending the calling thread until the call is done.
//! Do not call these methods from inside another Tokio runtime.

use std::sync::Arc;

use ignite_core::affinity::PartitionTopology;
use ignite_core::binary::{BinaryTypeDescriptor, SchemaRef};
use ignite_core::query::Row;
use ignite_core::{ProtocolVersion, Result, SqlFieldsQuery};
use tokio::runtime::Runtime;

use crate::config::ClientConfig;
use crate::cursor::CursorState;

/// Blocking Ignite client.
#[derive(Debug)]
pub struct IgniteClient {
    runtime: Arc<Runtime>,
    inner: crate::IgniteClient,
}

impl IgniteClient {
    /// Connects to the nodes listed in `config`.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let inner = runtime.block_on(crate::IgniteClient::connect(config))?;
        Ok(Self {
            runtime: Arc::new(runtime),
            inner,
        })
    }

    /// The async client this facade drives.
    pub fn as_async(&self) -> &crate::IgniteClient {
        &self.inner
    }

    /// Version negotiated with the cluster.
    pub fn protocol_version(&self) -> Option<ProtocolVersion> {
        self.runtime.block_on(self.inner.protocol_version())
    }

    /// See [`crate::IgniteClient::get_partitions`].
    pub fn get_partitions(&self, cache_ids: &[i32]) -> Result<PartitionTopology> {
        self.runtime.block_on(self.inner.get_partitions(cache_ids))
    }

    /// See [`crate::IgniteClient::get_type`].
    pub fn get_type(
        &self,
        type_id: i32,
        schema: Option<SchemaRef<'_>>,
    ) -> Option<Vec<BinaryTypeDescriptor>> {
        self.runtime.block_on(self.inner.get_type(type_id, schema))
    }

    /// See [`crate::IgniteClient::resolve_type`].
    pub fn resolve_type(
        &self,
        type_id: i32,
        schema: Option<SchemaRef<'_>>,
    ) -> Result<Option<Vec<BinaryTypeDescriptor>>> {
        self.runtime.block_on(self.inner.resolve_type(type_id, schema))
    }

    /// See [`crate::IgniteClient::register_type`].
    pub fn register_type(
        &self,
        descriptor: BinaryTypeDescriptor,
        affinity_key_field: Option<&str>,
    ) -> Result<BinaryTypeDescriptor> {
        self.runtime
            .block_on(self.inner.register_type(descriptor, affinity_key_field))
    }

    /// See [`crate::IgniteClient::sql`].
    pub fn sql(&self, query: SqlFieldsQuery) -> Result<QueryCursor> {
        let inner = self.runtime.block_on(self.inner.sql(query))?;
        Ok(QueryCursor {
            runtime: Arc::clone(&self.runtime),
            inner,
        })
    }

    /// See [`crate::IgniteClient::cache_names`].
    pub fn cache_names(&self) -> Result<Vec<String>> {
        self.runtime.block_on(self.inner.cache_names())
    }

    /// Closes every connection.
    pub fn close(&self) {
        self.runtime.block_on(self.inner.close());
    }
}

/// Blocking query cursor.
#[derive(Debug)]
pub struct QueryCursor {
    runtime: Arc<Runtime>,
    inner: crate::QueryCursor,
}

impl QueryCursor {
    /// Current state.
    pub fn state(&self) -> CursorState {
        self.inner.state()
    }

    /// Column names, if the query asked for them.
    pub fn field_names(&self) -> &[String] {
        self.inner.field_names()
    }

    /// Rows of the current page.
    pub fn rows(&self) -> &[Row] {
        self.inner.rows()
    }

    /// Fetches the next page; see [`crate::QueryCursor::advance`].
    pub fn advance(&mut self) -> Result<&[Row]> {
        self.runtime.block_on(self.inner.advance())
    }

    /// Releases the server cursor if it is still open.
    pub fn close(&mut self) -> Result<()> {
        self.runtime.block_on(self.inner.close())
    }
}

impl Iterator for QueryCursor {
    type Item = Result<Vec<Row>>;

    /// Yields the current page, then each later page, until exhausted.
    fn next(&mut self) -> Option<Self::Item> {
        let rows = self.inner.take_rows();
        if !rows.is_empty() {
            return Some(Ok(rows));
        }
        if self.inner.state() != CursorState::Open {
            return None;
        }
        match self.runtime.block_on(self.inner.advance()) {
            Ok(_) => Some(Ok(self.inner.take_rows())),
            Err(e) => Some(Err(e)),
        }
    }
}
