use sqlx::{
    postgres::{PgArguments, PgRow},
    query::{Query, QueryAs},
    FromRow, PgPool, Postgres, Row,
};

use crate::database::manager::DatabaseError;
use crate::filter::{Filter, SqlResult, SqlValue};

/// Runs a compiled `Filter` against a pool, decoding rows as `T`.
pub struct QueryBuilder<T> {
    filter: Filter,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> QueryBuilder<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(filter: Filter) -> Self {
        Self { filter, _phantom: std::marker::PhantomData }
    }

    pub async fn select_all(&self, pool: &PgPool) -> Result<Vec<T>, DatabaseError> {
        let sql = self.filter.to_sql()?;
        let rows = bind_query_as::<T>(&sql).fetch_all(pool).await?;
        Ok(rows)
    }

    pub async fn select_optional(&self, pool: &PgPool) -> Result<Option<T>, DatabaseError> {
        let sql = self.filter.to_sql()?;
        let row = bind_query_as::<T>(&sql).fetch_optional(pool).await?;
        Ok(row)
    }

    pub async fn count(&self, pool: &PgPool) -> Result<i64, DatabaseError> {
        let sql = self.filter.to_count_sql()?;
        let row = bind_query(&sql).fetch_one(pool).await?;
        let count: i64 = row.try_get("count")?;
        Ok(count)
    }
}

/// Binds every parameter of `sql` onto a typed `query_as`.
pub fn bind_query_as<'q, T>(sql: &'q SqlResult) -> QueryAs<'q, Postgres, T, PgArguments>
where
    T: for<'r> FromRow<'r, PgRow>,
{
    let mut q = sqlx::query_as::<_, T>(&sql.query);
    for p in &sql.params {
        q = match p {
            SqlValue::Bool(v) => q.bind(*v),
            SqlValue::Int(v) => q.bind(*v),
            SqlValue::BigInt(v) => q.bind(*v),
            SqlValue::Decimal(v) => q.bind(*v),
            SqlValue::Text(v) => q.bind(v.as_deref()),
            SqlValue::TextArray(v) => q.bind(v.as_slice()),
            SqlValue::Uuid(v) => q.bind(*v),
            SqlValue::UuidArray(v) => q.bind(v.as_slice()),
            SqlValue::Timestamp(v) => q.bind(*v),
        };
    }
    q
}

/// Binds every parameter of `sql` onto an untyped `query`.
pub fn bind_query(sql: &SqlResult) -> Query<'_, Postgres, PgArguments> {
    let mut q = sqlx::query(&sql.query);
    for p in &sql.params {
        q = match p {
            SqlValue::Bool(v) => q.bind(*v),
            SqlValue::Int(v) => q.bind(*v),
            SqlValue::BigInt(v) => q.bind(*v),
            SqlValue::Decimal(v) => q.bind(*v),
            SqlValue::Text(v) => q.bind(v.as_deref()),
            SqlValue::TextArray(v) => q.bind(v.as_slice()),
            SqlValue::Uuid(v) => q.bind(*v),
            SqlValue::UuidArray(v) => q.bind(v.as_slice()),
            SqlValue::Timestamp(v) => q.bind(*v),
        };
    }
    q
}
