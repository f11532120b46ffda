/// Key-predicate rules for filtered reads and keyed writes
///
/// A SELECT with a WHERE clause must either constrain every partition and
/// clustering key column and nothing else, or constrain the table's secondary
/// index column without touching the key.

use crate::config::SessionConfig;
use crate::cql::ast::{InsertStatement, SelectStatement};
use crate::schema::SchemaRegistry;
use crate::{Error, Result};

pub struct QueryValidator;

impl QueryValidator {
    /// Check a SELECT against the registered key structure of its table
    pub fn validate_select(
        select: &SelectStatement,
        registry: &SchemaRegistry,
        config: &SessionConfig,
    ) -> Result<()> {
        if select.tables.len() != 1 {
            return Err(Error::InvalidQuery("implicit joins not supported".into()));
        }
        if !select.has_where() {
            return Ok(());
        }

        let table = &select.tables[0].name;
        let schema = registry.get(table)?;

        if select.allow_filtering && config.honor_allow_filtering {
            tracing::debug!(table = %table, "ALLOW FILTERING, skipping key checks");
            return Ok(());
        }

        let mut matched_keys: Vec<&str> = Vec::new();
        let mut key_predicates = 0usize;
        let mut extra_predicates = 0usize;
        let mut index_matched = false;

        for predicate in &select.predicates {
            let key = schema
                .key_columns()
                .find(|k| k.eq_ignore_ascii_case(&predicate.column));
            match key {
                Some(key) => {
                    key_predicates += 1;
                    if !matched_keys.contains(&key) {
                        matched_keys.push(key);
                    }
                }
                None if schema.is_indexed_column(&predicate.column) => index_matched = true,
                None => extra_predicates += 1,
            }
        }

        if index_matched {
            if key_predicates > 0 {
                return Err(Error::InvalidQuery("query requires explicit filtering".into()));
            }
            return Ok(());
        }

        let missing: Vec<&str> = schema
            .key_columns()
            .filter(|k| !matched_keys.contains(k))
            .collect();
        if !missing.is_empty() {
            return Err(Error::InvalidQuery(format!(
                "primary key(s) {{{}}} missing from where clause",
                missing.join(", ")
            )));
        }
        if extra_predicates > 0 {
            return Err(Error::InvalidQuery(
                "non-primary-key column present in where clause".into(),
            ));
        }

        Ok(())
    }

    /// Every key column of a registered table must be written
    pub fn validate_insert(insert: &InsertStatement, registry: &SchemaRegistry) -> Result<()> {
        let schema = match registry.lookup(&insert.table.name) {
            Some(schema) => schema,
            None => return Ok(()),
        };

        let missing: Vec<&str> = schema
            .key_columns()
            .filter(|k| !insert.columns.iter().any(|c| c.eq_ignore_ascii_case(k)))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidQuery(format!(
                "missing key column(s) {} in INSERT into {}",
                missing.join(", "),
                schema.name
            )))
        }
    }
}
