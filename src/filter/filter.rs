use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::is_valid_identifier;
use super::types::{Condition, FilterOrderInfo, Predicate, SortDirection, SqlResult};

/// A typed SELECT: conjunctive conditions, ordering and a page window.
#[derive(Debug, Clone)]
pub struct Filter {
    table_name: String,
    conditions: Vec<Condition>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        if !is_valid_identifier(&table_name) {
            return Err(FilterError::InvalidTableName(table_name));
        }
        Ok(Self {
            table_name,
            conditions: vec![],
            order_data: vec![],
            limit: None,
            offset: None,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn order_data(&self) -> &[FilterOrderInfo] {
        &self.order_data
    }

    pub fn limit_value(&self) -> Option<i64> {
        self.limit
    }

    pub fn offset_value(&self) -> Option<i64> {
        self.offset
    }

    pub fn where_clause(mut self, condition: impl Into<Condition>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    pub fn where_eq(self, column: &str, value: impl Into<super::SqlValue>) -> Self {
        self.where_clause(Predicate::eq(column, value))
    }

    /// OR-group; an empty group is ignored.
    pub fn where_any(self, conditions: Vec<Condition>) -> Self {
        if conditions.is_empty() {
            return self;
        }
        self.where_clause(Condition::Any(conditions))
    }

    pub fn order(mut self, column: impl Into<String>, sort: SortDirection) -> Self {
        self.order_data.push(FilterOrderInfo { column: column.into(), sort });
        self
    }

    pub fn limit(mut self, limit: i64, offset: Option<i64>) -> Result<Self, FilterError> {
        if limit < 0 {
            return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string()));
        }
        if let Some(off) = offset {
            if off < 0 {
                return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string()));
            }
        }
        self.limit = Some(limit);
        self.offset = offset;
        Ok(self)
    }

    /// 1-based page window.
    pub fn paginate(self, page: u32, per_page: u32) -> Result<Self, FilterError> {
        let page = i64::from(page.max(1));
        let per_page = i64::from(per_page);
        self.limit(per_page, Some((page - 1) * per_page))
    }

    pub fn to_sql(&self) -> Result<SqlResult, FilterError> {
        let (where_clause, params) = FilterWhere::generate(&self.conditions)?;
        let order_clause = FilterOrder::generate(&self.order_data)?;
        let limit_clause = self.build_limit_clause();

        let query = [
            "SELECT *".to_string(),
            format!("FROM \"{}\"", self.table_name),
            if where_clause.is_empty() { String::new() } else { format!("WHERE {}", where_clause) },
            order_clause,
            limit_clause,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params })
    }

    pub fn to_count_sql(&self) -> Result<SqlResult, FilterError> {
        let (where_clause, params) = FilterWhere::generate(&self.conditions)?;
        let query = if where_clause.is_empty() {
            format!("SELECT COUNT(*) AS count FROM \"{}\"", self.table_name)
        } else {
            format!("SELECT COUNT(*) AS count FROM \"{}\" WHERE {}", self.table_name, where_clause)
        };
        Ok(SqlResult { query, params })
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterOp, SqlValue};

    #[test]
    fn rejects_bad_table_names() {
        assert!(Filter::new("products").is_ok());
        assert!(Filter::new("products; DROP TABLE x").is_err());
        assert!(Filter::new("").is_err());
    }

    #[test]
    fn builds_conjunctive_where_with_or_group() {
        let filter = Filter::new("products")
            .unwrap()
            .where_eq("status", "active")
            .where_any(vec![
                Predicate::contains("title", "hat").into(),
                Predicate::contains("sku", "hat").into(),
            ])
            .order("created_at", SortDirection::Desc)
            .paginate(2, 20)
            .unwrap();

        let sql = filter.to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT * FROM \"products\" WHERE \"status\" = $1 AND (\"title\" ILIKE $2 OR \"sku\" ILIKE $3) \
             ORDER BY \"created_at\" DESC, \"id\" ASC LIMIT 20 OFFSET 20"
        );
        assert_eq!(sql.params.len(), 3);
        assert_eq!(sql.params[1], SqlValue::Text(Some("%hat%".to_string())));
    }

    #[test]
    fn count_sql_shares_params_and_drops_window() {
        let filter = Filter::new("products")
            .unwrap()
            .where_eq("visibility", "visible")
            .paginate(3, 10)
            .unwrap();
        let sql = filter.to_count_sql().unwrap();
        assert_eq!(sql.query, "SELECT COUNT(*) AS count FROM \"products\" WHERE \"visibility\" = $1");
        assert_eq!(sql.params, vec![SqlValue::Text(Some("visible".to_string()))]);
    }

    #[test]
    fn column_operand_is_not_bound() {
        let filter = Filter::new("products")
            .unwrap()
            .where_clause(Predicate::columns("inventory_quantity", FilterOp::Lte, "low_stock_threshold"));
        let sql = filter.to_sql().unwrap();
        assert_eq!(
            sql.query,
            "SELECT * FROM \"products\" WHERE \"inventory_quantity\" <= \"low_stock_threshold\""
        );
        assert!(sql.params.is_empty());
    }

    #[test]
    fn user_text_never_reaches_the_query_string() {
        let filter = Filter::new("products")
            .unwrap()
            .where_clause(Predicate::contains("title", "'; DROP TABLE products; --"));
        let sql = filter.to_sql().unwrap();
        assert!(!sql.query.contains("DROP"));
    }

    #[test]
    fn negative_window_is_rejected() {
        assert!(Filter::new("products").unwrap().limit(-1, None).is_err());
        assert!(Filter::new("products").unwrap().limit(10, Some(-5)).is_err());
    }
}
