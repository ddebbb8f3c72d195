use super::error::FilterError;
use super::is_valid_identifier;
use super::types::{Condition, FilterOp, Operand, Predicate, SqlValue};

/// Compiles a condition tree into a `$n`-parameterised WHERE body.
pub struct FilterWhere {
    param_values: Vec<SqlValue>,
}

impl FilterWhere {
    fn new() -> Self {
        Self { param_values: vec![] }
    }

    /// Top-level conditions are AND-ed. Returns an empty string when there are none.
    pub fn generate(conditions: &[Condition]) -> Result<(String, Vec<SqlValue>), FilterError> {
        let mut filter_where = Self::new();
        let mut parts = Vec::with_capacity(conditions.len());
        for condition in conditions {
            parts.push(filter_where.build_condition(condition)?);
        }
        Ok((parts.join(" AND "), filter_where.param_values))
    }

    fn build_condition(&mut self, condition: &Condition) -> Result<String, FilterError> {
        match condition {
            Condition::Predicate(p) => self.build_predicate(p),
            Condition::All(children) => self.build_group(children, " AND ", "1=1"),
            Condition::Any(children) => self.build_group(children, " OR ", "1=0"),
        }
    }

    fn build_group(&mut self, children: &[Condition], joiner: &str, empty: &str) -> Result<String, FilterError> {
        if children.is_empty() {
            return Ok(empty.to_string());
        }
        let mut parts = Vec::with_capacity(children.len());
        for child in children {
            parts.push(self.build_condition(child)?);
        }
        Ok(format!("({})", parts.join(joiner)))
    }

    fn build_predicate(&mut self, predicate: &Predicate) -> Result<String, FilterError> {
        let column = Self::quote(&predicate.column)?;

        match (&predicate.op, &predicate.operand) {
            (FilterOp::IsNull, _) => Ok(format!("{} IS NULL", column)),
            (FilterOp::NotNull, _) => Ok(format!("{} IS NOT NULL", column)),
            (_, Operand::None) => Err(FilterError::InvalidOperatorData(format!(
                "operator {:?} on '{}' requires an operand",
                predicate.op, predicate.column
            ))),
            (FilterOp::In, Operand::Value(value)) => match value {
                SqlValue::UuidArray(v) if v.is_empty() => Ok("1=0".to_string()),
                SqlValue::TextArray(v) if v.is_empty() => Ok("1=0".to_string()),
                SqlValue::UuidArray(_) | SqlValue::TextArray(_) => {
                    Ok(format!("{} = ANY({})", column, self.param(value.clone())))
                }
                _ => Err(FilterError::InvalidOperatorData(format!(
                    "IN on '{}' requires an array value",
                    predicate.column
                ))),
            },
            (FilterOp::In, Operand::Column(_)) => Err(FilterError::InvalidOperatorData(
                "IN cannot compare against a column".to_string(),
            )),
            (op, Operand::Column(other)) => {
                let other = Self::quote(other)?;
                Ok(format!("{} {} {}", column, op.to_sql(), other))
            }
            (op, Operand::Value(value)) => {
                Ok(format!("{} {} {}", column, op.to_sql(), self.param(value.clone())))
            }
        }
    }

    fn quote(column: &str) -> Result<String, FilterError> {
        if !is_valid_identifier(column) {
            return Err(FilterError::InvalidColumn(column.to_string()));
        }
        Ok(format!("\"{}\"", column))
    }

    fn param(&mut self, value: SqlValue) -> String {
        self.param_values.push(value);
        format!("${}", self.param_values.len())
    }
}
