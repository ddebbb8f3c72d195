use super::error::FilterError;
use super::is_valid_identifier;
use super::types::{FilterOrderInfo, SortDirection};

/// Column appended to every ORDER BY so rows with equal sort keys page deterministically.
pub const TIEBREAK_COLUMN: &str = "id";

pub struct FilterOrder;

impl FilterOrder {
    pub fn parse_direction(s: &str) -> Option<SortDirection> {
        if s.eq_ignore_ascii_case("asc") {
            Some(SortDirection::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Some(SortDirection::Desc)
        } else {
            None
        }
    }

    pub fn generate(infos: &[FilterOrderInfo]) -> Result<String, FilterError> {
        if infos.is_empty() {
            return Ok(String::new());
        }
        let mut parts = Vec::with_capacity(infos.len() + 1);
        for info in infos {
            if !is_valid_identifier(&info.column) {
                return Err(FilterError::InvalidColumn(info.column.clone()));
            }
            parts.push(format!("\"{}\" {}", info.column, info.sort.to_sql()));
        }
        if !infos.iter().any(|i| i.column == TIEBREAK_COLUMN) {
            parts.push(format!("\"{}\" ASC", TIEBREAK_COLUMN));
        }
        Ok(format!("ORDER BY {}", parts.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_id_tiebreak_once() {
        let sql = FilterOrder::generate(&[FilterOrderInfo { column: "price".into(), sort: SortDirection::Asc }])
            .unwrap();
        assert_eq!(sql, "ORDER BY \"price\" ASC, \"id\" ASC");

        let sql = FilterOrder::generate(&[FilterOrderInfo { column: "id".into(), sort: SortDirection::Desc }])
            .unwrap();
        assert_eq!(sql, "ORDER BY \"id\" DESC");
    }

    #[test]
    fn parses_directions_case_insensitively() {
        assert_eq!(FilterOrder::parse_direction("DESC"), Some(SortDirection::Desc));
        assert_eq!(FilterOrder::parse_direction("asc"), Some(SortDirection::Asc));
        assert_eq!(FilterOrder::parse_direction("sideways"), None);
    }
}
