/// Statement forms accepted by [`Session::execute`](crate::Session::execute)

use cassmock_core::cql::lexer::render_tokens;
use cassmock_core::cql::{Lexer, Placeholder, Token};
use cassmock_core::{Error, Parameters, Result, Value};

/// Anything a session can execute
#[derive(Debug, Clone)]
pub enum Statement {
    Simple(String),
    Prepared(PreparedStatement),
    Bound(BoundStatement),
}

impl From<&str> for Statement {
    fn from(text: &str) -> Self {
        Statement::Simple(text.to_string())
    }
}

impl From<String> for Statement {
    fn from(text: String) -> Self {
        Statement::Simple(text)
    }
}

impl From<&String> for Statement {
    fn from(text: &String) -> Self {
        Statement::Simple(text.clone())
    }
}

impl From<PreparedStatement> for Statement {
    fn from(prepared: PreparedStatement) -> Self {
        Statement::Prepared(prepared)
    }
}

impl From<&PreparedStatement> for Statement {
    fn from(prepared: &PreparedStatement) -> Self {
        Statement::Prepared(prepared.clone())
    }
}

impl From<BoundStatement> for Statement {
    fn from(bound: BoundStatement) -> Self {
        Statement::Bound(bound)
    }
}

/// Statement template with placeholders
#[derive(Debug, Clone)]
pub struct PreparedStatement {
    text: String,
    tokens: Vec<Token>,
}

impl PreparedStatement {
    pub(crate) fn new(text: &str) -> Result<Self> {
        let tokens = Lexer::tokenize(text)?;
        Ok(Self {
            text: text.to_string(),
            tokens,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn placeholder_count(&self) -> usize {
        self.tokens
            .iter()
            .filter(|t| matches!(t, Token::Placeholder(_)))
            .count()
    }

    /// Substitute literal values for the placeholders
    pub fn bind(&self, params: impl Into<Parameters>) -> Result<BoundStatement> {
        let params = params.into();
        let mut positional = match &params {
            Parameters::Positional(values) => {
                let expected = self.placeholder_count();
                if values.len() != expected {
                    return Err(Error::InvalidArgument(format!(
                        "prepared statement expects {} value(s), got {}",
                        expected,
                        values.len()
                    )));
                }
                Some(values.iter())
            }
            Parameters::Named(_) => None,
        };

        let mut bound = Vec::with_capacity(self.tokens.len());
        for token in &self.tokens {
            let value = match token {
                Token::Placeholder(placeholder) => match (&mut positional, placeholder) {
                    (Some(values), _) => values.next(),
                    (None, Placeholder::Named(name)) => params.get_named(name),
                    (None, Placeholder::Positional) => {
                        return Err(Error::InvalidArgument(
                            "positional placeholder bound with named values".into(),
                        ));
                    }
                },
                other => {
                    bound.push(other.clone());
                    continue;
                }
            };

            let value = value.ok_or_else(|| {
                Error::InvalidArgument(format!("no value supplied for placeholder {}", token))
            })?;
            if let Value::Double(f) = value {
                if !f.is_finite() {
                    return Err(Error::InvalidArgument(format!(
                        "cannot bind non-finite double {} to placeholder {}",
                        f, token
                    )));
                }
            }
            bound.extend(Lexer::tokenize(&value.to_cql_literal())?);
        }

        Ok(BoundStatement {
            text: render_tokens(&bound),
        })
    }
}

/// Prepared statement with every placeholder replaced by a literal
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    text: String,
}

impl BoundStatement {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cassmock_core::Value;
    use uuid::Uuid;

    #[test]
    fn test_bind_positional() {
        let prepared =
            PreparedStatement::new("INSERT INTO users (id, name, active) VALUES (?, ?, ?)").unwrap();
        assert_eq!(prepared.placeholder_count(), 3);

        let bound = prepared
            .bind(vec![Value::from(1), Value::from("O'Brien"), Value::from(true)])
            .unwrap();
        assert_eq!(
            bound.text(),
            "INSERT INTO users (id, name, active) VALUES (1, 'O''Brien', 1)"
        );
    }

    #[test]
    fn test_bind_named_with_uuid() {
        let id = Uuid::new_v4();
        let prepared = PreparedStatement::new("SELECT * FROM users WHERE id = %(id)s").unwrap();
        let bound = prepared.bind(Parameters::named().bind("id", id)).unwrap();
        assert_eq!(
            bound.text(),
            format!("SELECT * FROM users WHERE id = '{}'", id.hyphenated())
        );
    }

    #[test]
    fn test_bind_mismatches() {
        let prepared = PreparedStatement::new("SELECT * FROM t WHERE a = ? AND b = ?").unwrap();
        assert!(matches!(
            prepared.bind(vec![Value::from(1)]),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            prepared.bind(Parameters::named().bind("a", 1)),
            Err(Error::InvalidArgument(_))
        ));

        let named = PreparedStatement::new("SELECT * FROM t WHERE a = :a").unwrap();
        assert!(matches!(
            named.bind(Parameters::named().bind("b", 1)),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_bind_rejects_non_finite_doubles() {
        let prepared = PreparedStatement::new("INSERT INTO t (k, v) VALUES (?, ?)").unwrap();
        for v in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                prepared.bind(vec![Value::from(1), Value::from(v)]),
                Err(Error::InvalidArgument(_))
            ));
        }
        let bound = prepared.bind(vec![Value::from(1), Value::from(-2.5)]).unwrap();
        assert_eq!(bound.text(), "INSERT INTO t (k, v) VALUES (1, -2.5)");
    }

    #[test]
    fn test_bind_blob_and_null() {
        let prepared = PreparedStatement::new("INSERT INTO t (k, v) VALUES (?, ?)").unwrap();
        let bound = prepared
            .bind(vec![Value::from(vec![0xca, 0xfe]), Value::Null])
            .unwrap();
        assert_eq!(bound.text(), "INSERT INTO t (k, v) VALUES (X'cafe', NULL)");
    }
}
