//! Query model: term trees, module handles, result sets.
//!
//! A [`Term`] builds the boolean expression a search runs over.
//! [`Module::find_terms`] runs the search and hands back a [`QueryResult`]
//! addressing the server-side result set, which `sort`, `fetch`, and
//! `fetch_all` then operate on. None of these hold a connection; every
//! operation borrows the [`Session`] for the duration of its round trip.

use crate::error::ClientError;
use crate::session::Session;
use curio_protocol::{FetchFlag, FetchRequest, FindTermsRequest, ResponseEnvelope, SortRequest};
use serde_json::{json, Value};

/// Default page size for [`QueryResult::fetch_all`].
pub const DEFAULT_PAGE_SIZE: i64 = 100;

/// Boolean combinator for term groups.
///
/// The members are kept distinct so call sites state their intent, but the
/// server's dialect only defines the one wire spelling for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TermOperator {
    #[default]
    And,
    Or,
}

impl TermOperator {
    /// Wire name of the combinator. The dialect spells both as "or".
    pub fn as_str(&self) -> &'static str {
        match self {
            TermOperator::And => "or",
            TermOperator::Or => "or",
        }
    }
}

/// One entry in a term tree.
#[derive(Debug, Clone)]
enum TermEntry {
    /// A `[field, value, operator]` clause. The operator is a server match
    /// verb such as "contains" and is sent as `null` when absent.
    Clause {
        field: String,
        value: Value,
        operator: Option<String>,
    },
    /// A nested `[operator, [entries...]]` group.
    Group(Term),
}

/// A boolean-combinator expression tree over query clauses.
#[derive(Debug, Clone, Default)]
pub struct Term {
    operator: TermOperator,
    entries: Vec<TermEntry>,
}

impl Term {
    pub fn new(operator: TermOperator) -> Self {
        Self {
            operator,
            entries: Vec::new(),
        }
    }

    /// Appends a clause matching `field` against `value`.
    pub fn add(
        &mut self,
        field: impl Into<String>,
        value: impl Into<Value>,
        operator: Option<&str>,
    ) {
        self.entries.push(TermEntry::Clause {
            field: field.into(),
            value: value.into(),
            operator: operator.map(str::to_string),
        });
    }

    /// Appends a nested group and returns a handle to it, so the subtree is
    /// built in place and stays visible from this term.
    pub fn add_nested_term(&mut self, operator: TermOperator) -> &mut Term {
        self.entries.push(TermEntry::Group(Term::new(operator)));
        match self.entries.last_mut() {
            Some(TermEntry::Group(term)) => term,
            _ => unreachable!("entry pushed above is a group"),
        }
    }

    pub fn operator(&self) -> TermOperator {
        self.operator
    }

    /// Serializes the entry list into its wire form.
    pub fn to_terms(&self) -> Value {
        Value::Array(
            self.entries
                .iter()
                .map(|entry| match entry {
                    TermEntry::Clause {
                        field,
                        value,
                        operator,
                    } => json!([field, value, operator]),
                    TermEntry::Group(term) => json!([term.operator.as_str(), term.to_terms()]),
                })
                .collect(),
        )
    }
}

/// Handle binding a table name to the search operation.
#[derive(Debug, Clone)]
pub struct Module {
    table: String,
}

impl Module {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Runs a term search, returning a handle to the server-side result
    /// set.
    pub async fn find_terms(
        &self,
        session: &mut Session,
        term: &Term,
    ) -> Result<QueryResult, ClientError> {
        tracing::debug!("finding terms on {}: {:?}", self.table, term);
        let request =
            FindTermsRequest::new(self.table.clone(), term.operator().as_str(), term.to_terms());
        let envelope = session.send(&request).await?;
        QueryResult::new(self.table.clone(), envelope)
    }
}

/// A server-side result set, addressed by the `id` its creating reply
/// carried.
#[derive(Debug, Clone)]
pub struct QueryResult {
    table: String,
    id: Value,
    data: ResponseEnvelope,
}

impl QueryResult {
    fn new(table: String, envelope: ResponseEnvelope) -> Result<Self, ClientError> {
        match envelope.id.clone() {
            Some(id) => Ok(Self {
                table,
                id,
                data: envelope,
            }),
            None => Err(ClientError::MissingResultId { envelope }),
        }
    }

    /// The server-side result-set identifier.
    pub fn id(&self) -> &Value {
        &self.id
    }

    /// The reply this result wraps.
    pub fn data(&self) -> &ResponseEnvelope {
        &self.data
    }

    /// Total match count, when the reply carried one.
    pub fn result_count(&self) -> Option<u64> {
        self.data.result_count()
    }

    /// Row objects, when the reply carried a fetched page.
    pub fn rows(&self) -> Option<&Vec<Value>> {
        self.data.rows()
    }

    /// Sorts the result set server-side, returning the re-sorted view.
    pub async fn sort(
        &self,
        session: &mut Session,
        columns: &[&str],
        flags: Option<&[&str]>,
    ) -> Result<QueryResult, ClientError> {
        if columns.is_empty() {
            return Err(ClientError::EmptySortColumns);
        }

        let request = SortRequest::new(
            self.id.clone(),
            columns.iter().map(|c| c.to_string()).collect(),
            flags.map(|flags| flags.iter().map(|f| f.to_string()).collect()),
        );
        let envelope = session.send(&request).await?;
        QueryResult::new(self.table.clone(), envelope)
    }

    /// Fetches one page of rows from the result set.
    pub async fn fetch(
        &self,
        session: &mut Session,
        flag: FetchFlag,
        offset: i64,
        count: i64,
        columns: Option<&[&str]>,
    ) -> Result<QueryResult, ClientError> {
        let request = FetchRequest::new(
            self.id.clone(),
            flag,
            offset,
            count,
            columns.map(|columns| columns.iter().map(|c| c.to_string()).collect()),
        );
        let envelope = session.send(&request).await?;
        QueryResult::new(self.table.clone(), envelope)
    }

    /// Fetches every row of the result set, page by page.
    ///
    /// The server repeats the final page instead of returning an empty one,
    /// so termination tracks the last fetched row number against the total
    /// match count rather than counting pages or offsets. An empty page
    /// also terminates, in case the server stops advancing the cursor.
    /// `result_count_threshold` stops the walk early once the last fetched
    /// row number reaches it.
    pub async fn fetch_all(
        &self,
        session: &mut Session,
        columns: Option<&[&str]>,
        page_size: i64,
        result_count_threshold: Option<u64>,
    ) -> Result<Vec<Value>, ClientError> {
        let result_count = match self.data.result_count() {
            Some(count) => count,
            None => {
                return Err(ClientError::MissingResultCount {
                    envelope: self.data.clone(),
                });
            }
        };

        match result_count_threshold {
            Some(threshold) => {
                tracing::info!("fetching {} of {} records", threshold, result_count)
            }
            None => tracing::info!("fetching {} records", result_count),
        }

        let mut records: Vec<Value> = Vec::new();

        loop {
            let page = self
                .fetch(session, FetchFlag::Current, 0, page_size, columns)
                .await?;
            let rows = match page.data.rows() {
                Some(rows) => rows,
                None => {
                    return Err(ClientError::MissingRows {
                        envelope: page.data.clone(),
                    });
                }
            };
            if rows.is_empty() {
                break;
            }

            let first = row_number(&rows[0])?;
            let last = row_number(&rows[rows.len() - 1])?;
            tracing::info!(
                "fetched {}-{} of {} {}",
                first,
                last,
                result_count_threshold.unwrap_or(result_count),
                self.table
            );
            records.extend(rows.iter().cloned());

            if let Some(threshold) = result_count_threshold {
                if last >= threshold {
                    break;
                }
            }
            if last >= result_count {
                break;
            }
        }

        Ok(records)
    }
}

/// Row numbers are 1-based and drive `fetch_all` termination.
fn row_number(row: &Value) -> Result<u64, ClientError> {
    row.get("rownum")
        .and_then(Value::as_u64)
        .ok_or(ClientError::MissingRowNumber)
}
