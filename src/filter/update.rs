use uuid::Uuid;

use super::error::FilterError;
use super::is_valid_identifier;
use super::types::{SqlResult, SqlValue};

/// A single column assignment in an UPDATE.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnValue {
    pub column: &'static str,
    pub value: SqlValue,
}

impl ColumnValue {
    pub fn new(column: &'static str, value: impl Into<SqlValue>) -> Self {
        Self { column, value: value.into() }
    }
}

/// `UPDATE <table> SET <changed columns> WHERE id = $n RETURNING *`
#[derive(Debug, Clone)]
pub struct UpdateStatement {
    table_name: String,
    assignments: Vec<ColumnValue>,
}

impl UpdateStatement {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        if !is_valid_identifier(&table_name) {
            return Err(FilterError::InvalidTableName(table_name));
        }
        Ok(Self { table_name, assignments: vec![] })
    }

    pub fn set_all(mut self, changes: &[ColumnValue]) -> Self {
        self.assignments.extend(changes.iter().cloned());
        self
    }

    pub fn to_sql_by_id(&self, id: Uuid) -> Result<SqlResult, FilterError> {
        if self.assignments.is_empty() {
            return Err(FilterError::EmptyUpdate(self.table_name.clone()));
        }
        let mut params = Vec::with_capacity(self.assignments.len() + 1);
        let mut sets = Vec::with_capacity(self.assignments.len());
        for assignment in &self.assignments {
            if !is_valid_identifier(assignment.column) {
                return Err(FilterError::InvalidColumn(assignment.column.to_string()));
            }
            params.push(assignment.value.clone());
            sets.push(format!("\"{}\" = ${}", assignment.column, params.len()));
        }
        params.push(SqlValue::Uuid(Some(id)));
        let query = format!(
            "UPDATE \"{}\" SET {} WHERE \"id\" = ${} RETURNING *",
            self.table_name,
            sets.join(", "),
            params.len()
        );
        Ok(SqlResult { query, params })
    }
}
