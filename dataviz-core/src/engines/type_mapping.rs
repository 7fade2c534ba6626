//! Native column type to generic category mapping.
//!
//! Rules are case-insensitive prefix matches against the raw type string as
//! the database reports it (`VARCHAR(50)`, `timestamp with time zone`, ...).
//! Engine rules are tried before the shared defaults; the first match wins.

use crate::models::{ColumnSpec, ColumnType, GenericDataType};
use crate::{DataVizError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// One `(pattern, target type, generic category)` rule.
#[derive(Debug, Clone)]
pub struct ColumnTypeRule {
    pattern: Regex,
    column_type: ColumnType,
    generic_type: GenericDataType,
}

impl ColumnTypeRule {
    /// Compiles a rule; the pattern is anchored and made case-insensitive.
    ///
    /// # Errors
    /// Returns [`DataVizError::Configuration`] for an invalid pattern.
    pub fn new(
        pattern: &str,
        column_type: ColumnType,
        generic_type: GenericDataType,
    ) -> Result<Self> {
        let pattern = Regex::new(&format!("(?i)^(?:{})", pattern)).map_err(|e| {
            DataVizError::configuration(format!("Invalid column type pattern '{}': {}", pattern, e))
        })?;
        Ok(Self {
            pattern,
            column_type,
            generic_type,
        })
    }

    /// Returns the resolved spec if the rule matches the native type.
    pub fn apply(&self, native_type: &str) -> Option<ColumnSpec> {
        self.pattern
            .is_match(native_type)
            .then(|| ColumnSpec::new(self.column_type, self.generic_type))
    }
}

/// Compiles a static rule table.
///
/// Only used for literal tables in this crate, so a bad pattern is a
/// programming error.
#[allow(clippy::expect_used)]
pub(crate) fn compile_rules(
    table: &[(&str, ColumnType, GenericDataType)],
) -> Vec<ColumnTypeRule> {
    table
        .iter()
        .map(|(pattern, column_type, generic_type)| {
            ColumnTypeRule::new(pattern, *column_type, *generic_type)
                .expect("Invalid built-in column type pattern")
        })
        .collect()
}

/// Shared fallback rules, checked after any engine-specific rule.
pub fn default_rules() -> &'static [ColumnTypeRule] {
    static RULES: OnceLock<Vec<ColumnTypeRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        use ColumnType as C;
        use GenericDataType as G;
        compile_rules(&[
            (r"string", C::String, G::String),
            (r"n((var)?char|text)", C::UnicodeText, G::String),
            (r"(var)?char", C::String, G::String),
            (r"(tiny|medium|long)?text", C::String, G::String),
            (r"smallint", C::SmallInteger, G::Numeric),
            (r"int(eger)?(\d+)?\b", C::Integer, G::Numeric),
            (r"bigint", C::BigInteger, G::Numeric),
            (r"long", C::Float, G::Numeric),
            (r"decimal", C::Numeric, G::Numeric),
            (r"numeric", C::Numeric, G::Numeric),
            (r"float", C::Float, G::Numeric),
            (r"double", C::Float, G::Numeric),
            (r"real", C::Real, G::Numeric),
            (r"smallserial", C::SmallInteger, G::Numeric),
            (r"serial", C::Integer, G::Numeric),
            (r"bigserial", C::BigInteger, G::Numeric),
            (r"money", C::Numeric, G::Numeric),
            (r"timestamp", C::Timestamp, G::Temporal),
            (r"datetime", C::DateTime, G::Temporal),
            (r"date", C::Date, G::Temporal),
            (r"time", C::Time, G::Temporal),
            (r"interval", C::Interval, G::Temporal),
            (r"bool(ean)?", C::Boolean, G::Boolean),
        ])
    })
}

/// Resolves a native type against engine rules, then the shared defaults.
pub fn resolve_column_spec(rules: &[ColumnTypeRule], native_type: &str) -> Option<ColumnSpec> {
    if native_type.is_empty() {
        return None;
    }
    rules
        .iter()
        .chain(default_rules())
        .find_map(|rule| rule.apply(native_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generic(native: &str) -> Option<GenericDataType> {
        resolve_column_spec(&[], native).map(|spec| spec.generic_type)
    }

    #[test]
    fn test_default_string_types() {
        assert_eq!(generic("VARCHAR(50)"), Some(GenericDataType::String));
        assert_eq!(generic("char"), Some(GenericDataType::String));
        assert_eq!(generic("TEXT"), Some(GenericDataType::String));
        assert_eq!(generic("LONGTEXT"), Some(GenericDataType::String));
        assert_eq!(
            resolve_column_spec(&[], "NVARCHAR(10)").map(|s| s.column_type),
            Some(ColumnType::UnicodeText)
        );
    }

    #[test]
    fn test_default_numeric_types() {
        assert_eq!(generic("BIGINT"), Some(GenericDataType::Numeric));
        assert_eq!(generic("INTEGER"), Some(GenericDataType::Numeric));
        assert_eq!(generic("int4"), Some(GenericDataType::Numeric));
        assert_eq!(generic("INT(11)"), Some(GenericDataType::Numeric));
        assert_eq!(generic("DECIMAL(10, 2)"), Some(GenericDataType::Numeric));
        assert_eq!(generic("bigserial"), Some(GenericDataType::Numeric));
        assert_eq!(generic("money"), Some(GenericDataType::Numeric));
    }

    #[test]
    fn test_default_temporal_types() {
        let spec = resolve_column_spec(&[], "TIMESTAMP").unwrap();
        assert_eq!(spec.generic_type, GenericDataType::Temporal);
        assert_eq!(spec.column_type, ColumnType::Timestamp);
        assert!(spec.is_dttm);

        assert_eq!(
            resolve_column_spec(&[], "DATETIME").map(|s| s.column_type),
            Some(ColumnType::DateTime)
        );
        assert_eq!(
            resolve_column_spec(&[], "date").map(|s| s.column_type),
            Some(ColumnType::Date)
        );
        assert_eq!(
            resolve_column_spec(&[], "INTERVAL DAY").map(|s| s.column_type),
            Some(ColumnType::Interval)
        );
    }

    #[test]
    fn test_default_boolean_and_unknown() {
        assert_eq!(generic("BOOLEAN"), Some(GenericDataType::Boolean));
        assert_eq!(generic("bool"), Some(GenericDataType::Boolean));
        assert_eq!(generic("GEOMETRY"), None);
        assert_eq!(generic(""), None);
    }

    #[test]
    fn test_engine_rules_take_precedence() {
        let rules = vec![
            ColumnTypeRule::new(r"text\[\]", ColumnType::Json, GenericDataType::String).unwrap(),
        ];
        assert_eq!(
            resolve_column_spec(&rules, "TEXT[]").map(|s| s.column_type),
            Some(ColumnType::Json)
        );
        assert_eq!(
            resolve_column_spec(&rules, "TEXT").map(|s| s.column_type),
            Some(ColumnType::String)
        );
    }

    #[test]
    fn test_invalid_pattern_is_configuration_error() {
        let result = ColumnTypeRule::new("(unclosed", ColumnType::String, GenericDataType::String);
        assert!(matches!(result, Err(DataVizError::Configuration { .. })));
    }

    #[test]
    fn test_default_rules_singleton() {
        assert!(std::ptr::eq(default_rules(), default_rules()));
    }
}
