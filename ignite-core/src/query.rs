//! SQL fields query messages and server-side cursor paging.

use crate::error::{IgniteError, Result};
use crate::protocol::{
    Request, OP_QUERY_SQL_FIELDS, OP_QUERY_SQL_FIELDS_CURSOR_GET_PAGE, OP_RESOURCE_CLOSE,
};
use crate::serialization::{
    read_data_value, read_string_object, write_data_value, write_string_object, DataInput,
    DataOutput, DataValue, ObjectDataInput,
};

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: i32 = 1024;

/// Kind of statement a query is allowed to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum StatementType {
    /// Either a select or an update.
    #[default]
    Any = 0,
    /// Only `SELECT`.
    Select = 1,
    /// Only DML.
    Update = 2,
}

/// An SQL fields query.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFieldsQuery {
    sql: String,
    args: Vec<DataValue>,
    cache_id: i32,
    schema: Option<String>,
    page_size: i32,
    max_rows: i32,
    statement_type: StatementType,
    distributed_joins: bool,
    local: bool,
    replicated_only: bool,
    enforce_join_order: bool,
    collocated: bool,
    lazy: bool,
    timeout_ms: i64,
    include_field_names: bool,
}

impl SqlFieldsQuery {
    /// Creates a query with default options.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            args: Vec::new(),
            cache_id: 0,
            schema: None,
            page_size: DEFAULT_PAGE_SIZE,
            max_rows: -1,
            statement_type: StatementType::Any,
            distributed_joins: false,
            local: false,
            replicated_only: false,
            enforce_join_order: false,
            collocated: false,
            lazy: false,
            timeout_ms: 0,
            include_field_names: false,
        }
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<DataValue>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Runs the query in the context of a cache.
    pub fn cache_id(mut self, cache_id: i32) -> Self {
        self.cache_id = cache_id;
        self
    }

    /// Sets the SQL schema.
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Sets the number of rows fetched per page.
    pub fn page_size(mut self, page_size: i32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Caps the total number of rows; negative means unlimited.
    pub fn max_rows(mut self, max_rows: i32) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Restricts the kind of statement accepted.
    pub fn statement_type(mut self, statement_type: StatementType) -> Self {
        self.statement_type = statement_type;
        self
    }

    /// Enables non-collocated joins.
    pub fn distributed_joins(mut self, enabled: bool) -> Self {
        self.distributed_joins = enabled;
        self
    }

    /// Runs the query on the receiving node only.
    pub fn local(mut self, enabled: bool) -> Self {
        self.local = enabled;
        self
    }

    /// Hints that only replicated caches are involved.
    pub fn replicated_only(mut self, enabled: bool) -> Self {
        self.replicated_only = enabled;
        self
    }

    /// Keeps the join order as written.
    pub fn enforce_join_order(mut self, enabled: bool) -> Self {
        self.enforce_join_order = enabled;
        self
    }

    /// Hints that grouped data is collocated.
    pub fn collocated(mut self, enabled: bool) -> Self {
        self.collocated = enabled;
        self
    }

    /// Streams results instead of materializing them on the server.
    pub fn lazy(mut self, enabled: bool) -> Self {
        self.lazy = enabled;
        self
    }

    /// Server-enforced timeout in milliseconds; zero disables it.
    pub fn timeout_ms(mut self, timeout_ms: i64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Asks the server to return column names with the first page.
    pub fn include_field_names(mut self, enabled: bool) -> Self {
        self.include_field_names = enabled;
        self
    }

    /// Returns the SQL text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns `true` if column names were requested.
    pub fn includes_field_names(&self) -> bool {
        self.include_field_names
    }

    /// Builds the query request.
    pub fn to_request(&self) -> Result<Request> {
        if self.page_size <= 0 {
            return Err(IgniteError::Configuration(format!(
                "page size must be positive, got {}",
                self.page_size
            )));
        }
        let mut request = Request::new(OP_QUERY_SQL_FIELDS);
        let out = request.payload_mut();
        out.write_int(self.cache_id)?;
        out.write_byte(0)?;
        write_string_object(out, self.schema.as_deref())?;
        out.write_int(self.page_size)?;
        out.write_int(self.max_rows)?;
        write_string_object(out, Some(self.sql.as_str()))?;
        out.write_int(self.args.len() as i32)?;
        for arg in &self.args {
            write_data_value(out, arg)?;
        }
        out.write_ubyte(self.statement_type as u8)?;
        out.write_bool(self.distributed_joins)?;
        out.write_bool(self.local)?;
        out.write_bool(self.replicated_only)?;
        out.write_bool(self.enforce_join_order)?;
        out.write_bool(self.collocated)?;
        out.write_bool(self.lazy)?;
        out.write_long(self.timeout_ms)?;
        out.write_bool(self.include_field_names)?;
        Ok(request)
    }
}

/// One row of data objects.
pub type Row = Vec<DataValue>;

/// A page of rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    /// Rows in server order.
    pub rows: Vec<Row>,
    /// Whether the server holds more pages for this cursor.
    pub has_more: bool,
}

/// The first page of a query, with cursor metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct FirstPage {
    /// Server-side cursor id.
    pub cursor_id: i64,
    /// Column names, when requested.
    pub field_names: Vec<String>,
    /// Number of columns per row.
    pub field_count: usize,
    /// The page itself.
    pub page: Page,
}

fn read_rows(input: &mut ObjectDataInput<'_>, field_count: usize) -> Result<Vec<Row>> {
    let row_count = input.read_int()?;
    if row_count < 0 {
        return Err(IgniteError::Protocol(format!(
            "negative row count: {}",
            row_count
        )));
    }
    let cells = (row_count as usize).saturating_mul(field_count);
    // every cell carries at least its type code
    input.ensure_remaining(cells.max(row_count as usize))?;
    let mut rows = Vec::with_capacity(row_count as usize);
    for _ in 0..row_count {
        let mut row = Vec::with_capacity(field_count);
        for _ in 0..field_count {
            row.push(read_data_value(input)?);
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Parses the response to a query request.
pub fn parse_first_page(payload: &[u8], include_field_names: bool) -> Result<FirstPage> {
    let mut input = ObjectDataInput::new(payload);
    let cursor_id = input.read_long()?;
    let field_count = input.read_int()?;
    if field_count < 0 {
        return Err(IgniteError::Protocol(format!(
            "negative field count: {}",
            field_count
        )));
    }
    let field_count = field_count as usize;
    let mut field_names = Vec::new();
    if include_field_names {
        input.ensure_remaining(field_count)?;
        field_names.reserve(field_count);
        for _ in 0..field_count {
            field_names.push(read_string_object(&mut input)?.unwrap_or_default());
        }
    }
    let rows = read_rows(&mut input, field_count)?;
    let has_more = input.read_bool()?;
    Ok(FirstPage {
        cursor_id,
        field_names,
        field_count,
        page: Page { rows, has_more },
    })
}

/// Builds a request for the next page of `cursor_id`.
pub fn cursor_page_request(cursor_id: i64) -> Result<Request> {
    let mut request = Request::new(OP_QUERY_SQL_FIELDS_CURSOR_GET_PAGE);
    request.payload_mut().write_long(cursor_id)?;
    Ok(request)
}

/// Parses a page response.
pub fn parse_page(payload: &[u8], field_count: usize) -> Result<Page> {
    let mut input = ObjectDataInput::new(payload);
    let rows = read_rows(&mut input, field_count)?;
    let has_more = input.read_bool()?;
    Ok(Page { rows, has_more })
}

/// Builds a request releasing a server-side resource such as a cursor.
pub fn resource_close_request(resource_id: i64) -> Result<Request> {
    let mut request = Request::new(OP_RESOURCE_CLOSE);
    request.payload_mut().write_long(resource_id)?;
    Ok(request)
}
