//! Forward-only cursor over server-paginated SQL results.

use std::sync::Arc;

use async_trait::async_trait;
use ignite_core::query::{cursor_page_request, parse_page, resource_close_request, FirstPage, Page, Row};
use ignite_core::Result;

use crate::affinity::AffinityMap;
use crate::connection::NodeEndpoint;

/// Where a cursor reads its pages from.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetches the next page of `cursor_id`.
    async fn next_page(&self, cursor_id: i64, field_count: usize) -> Result<Page>;

    /// Releases `cursor_id` on the server.
    async fn close_cursor(&self, cursor_id: i64) -> Result<()>;
}

/// Pages of an SQL fields query, read from the node that holds the cursor.
#[derive(Debug, Clone)]
pub struct SqlFieldsPages {
    endpoint: Arc<NodeEndpoint>,
    affinity: Arc<AffinityMap>,
}

impl SqlFieldsPages {
    /// Binds page requests to `endpoint`; response headers feed `affinity`.
    pub fn new(endpoint: Arc<NodeEndpoint>, affinity: Arc<AffinityMap>) -> Self {
        Self { endpoint, affinity }
    }
}

#[async_trait]
impl PageSource for SqlFieldsPages {
    async fn next_page(&self, cursor_id: i64, field_count: usize) -> Result<Page> {
        let response = self.endpoint.request(&cursor_page_request(cursor_id)?).await?;
        if let Some(version) = response.topology_version() {
            self.affinity.observe(version).await;
        }
        let response = response.into_result()?;
        self.endpoint
            .check_payload(parse_page(response.payload(), field_count))
            .await
    }

    async fn close_cursor(&self, cursor_id: i64) -> Result<()> {
        self.endpoint
            .request(&resource_close_request(cursor_id)?)
            .await?
            .into_result()?;
        Ok(())
    }
}

/// Cursor lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// More pages remain on the server.
    Open,
    /// The final page was read; the server released the cursor.
    Exhausted,
    /// Closed by the client before the final page.
    Closed,
}

/// Forward-only, single-pass cursor.
///
/// Holds one page of rows at a time. The first [`advance`](Self::advance)
/// yields the page the query returned; each later call replaces it with the
/// next page from the server. Once the final page has been yielded every
/// further call returns no rows.
pub struct QueryCursor {
    source: Box<dyn PageSource>,
    cursor_id: i64,
    field_names: Vec<String>,
    field_count: usize,
    rows: Vec<Row>,
    // The first page has not been handed out by `advance` yet.
    first_pending: bool,
    state: CursorState,
}

impl std::fmt::Debug for QueryCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCursor")
            .field("cursor_id", &self.cursor_id)
            .field("field_count", &self.field_count)
            .field("rows", &self.rows.len())
            .field("state", &self.state)
            .finish()
    }
}

impl QueryCursor {
    /// Creates a cursor positioned on the first page.
    pub fn new(source: Box<dyn PageSource>, first: FirstPage) -> Self {
        let state = if first.page.has_more {
            CursorState::Open
        } else {
            CursorState::Exhausted
        };
        Self {
            source,
            cursor_id: first.cursor_id,
            field_names: first.field_names,
            field_count: first.field_count,
            rows: first.page.rows,
            first_pending: true,
            state,
        }
    }

    /// Current state.
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Server-side cursor id.
    pub fn cursor_id(&self) -> i64 {
        self.cursor_id
    }

    /// Column names, if the query asked for them.
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Number of columns per row.
    pub fn field_count(&self) -> usize {
        self.field_count
    }

    /// Rows of the current page.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Moves the current page out, leaving it empty.
    pub fn take_rows(&mut self) -> Vec<Row> {
        self.first_pending = false;
        std::mem::take(&mut self.rows)
    }

    /// Returns the next page of rows.
    ///
    /// The first call yields the page returned with the query; later calls
    /// fetch from the server. Once the final page has been returned, or the
    /// cursor is closed, this returns no rows and no error.
    pub async fn advance(&mut self) -> Result<&[Row]> {
        if self.first_pending {
            self.first_pending = false;
            return Ok(&self.rows);
        }
        if self.state != CursorState::Open {
            self.rows.clear();
            return Ok(&self.rows);
        }

        let page = self.source.next_page(self.cursor_id, self.field_count).await?;
        if !page.has_more {
            self.state = CursorState::Exhausted;
            tracing::trace!(cursor_id = self.cursor_id, "cursor exhausted");
        }
        self.rows = page.rows;
        Ok(&self.rows)
    }

    /// Drains the cursor, returning the current page and every later one.
    pub async fn fetch_all(mut self) -> Result<Vec<Row>> {
        let mut all = self.take_rows();
        while self.state == CursorState::Open {
            self.advance().await?;
            all.append(&mut self.rows);
        }
        Ok(all)
    }

    /// Releases the server cursor if it is still open. Safe to call repeatedly.
    pub async fn close(&mut self) -> Result<()> {
        self.rows.clear();
        self.first_pending = false;
        if self.state != CursorState::Open {
            return Ok(());
        }
        self.state = CursorState::Closed;
        self.source.close_cursor(self.cursor_id).await
    }
}
