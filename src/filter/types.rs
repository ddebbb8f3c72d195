use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    ILike,
    In,
    IsNull,
    NotNull,
}

impl FilterOp {
    pub fn to_sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Neq => "<>",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
            FilterOp::ILike => "ILIKE",
            FilterOp::In => "= ANY",
            FilterOp::IsNull => "IS NULL",
            FilterOp::NotNull => "IS NOT NULL",
        }
    }
}

/// A typed bind parameter. Nullable variants carry the SQL type so a NULL
/// can still be bound against a typed column.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Bool(bool),
    Int(i32),
    BigInt(i64),
    Decimal(Option<Decimal>),
    Text(Option<String>),
    TextArray(Vec<String>),
    Uuid(Option<Uuid>),
    UuidArray(Vec<Uuid>),
    Timestamp(Option<DateTime<Utc>>),
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(Some(v.to_string()))
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(Some(v))
    }
}

impl From<Uuid> for SqlValue {
    fn from(v: Uuid) -> Self {
        SqlValue::Uuid(Some(v))
    }
}

impl From<Vec<Uuid>> for SqlValue {
    fn from(v: Vec<Uuid>) -> Self {
        SqlValue::UuidArray(v)
    }
}

/// Right-hand side of a predicate: either a bound value or another column
/// of the same row (e.g. `inventory_quantity <= low_stock_threshold`).
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Value(SqlValue),
    Column(String),
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column: String,
    pub op: FilterOp,
    pub operand: Operand,
}

impl Predicate {
    pub fn new(column: impl Into<String>, op: FilterOp, value: impl Into<SqlValue>) -> Self {
        Self {
            column: column.into(),
            op,
            operand: Operand::Value(value.into()),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::new(column, FilterOp::Eq, value)
    }

    pub fn columns(column: impl Into<String>, op: FilterOp, other: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op,
            operand: Operand::Column(other.into()),
        }
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            op: FilterOp::IsNull,
            operand: Operand::None,
        }
    }

    /// Case-insensitive substring match. `%`, `_` and `\` in the needle are escaped.
    pub fn contains(column: impl Into<String>, needle: &str) -> Self {
        Self::new(column, FilterOp::ILike, format!("%{}%", escape_like(needle)))
    }
}

/// Boolean tree of predicates. Top-level conditions on a `Filter` are AND-ed.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Predicate(Predicate),
    All(Vec<Condition>),
    Any(Vec<Condition>),
}

impl From<Predicate> for Condition {
    fn from(p: Predicate) -> Self {
        Condition::Predicate(p)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlValue>,
}

pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Reverse of `escape_like` for a `%needle%` pattern; used by in-process evaluation.
pub fn unescape_contains_pattern(pattern: &str) -> String {
    let inner = pattern.strip_prefix('%').unwrap_or(pattern);
    let inner = inner.strip_suffix('%').unwrap_or(inner);
    let mut out = String::with_capacity(inner.len());
    let mut escaped = false;
    for c in inner.chars() {
        if c == '\\' && !escaped {
            escaped = true;
            continue;
        }
        escaped = false;
        out.push(c);
    }
    out
}
