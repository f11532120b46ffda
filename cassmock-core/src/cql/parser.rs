/// Recursive-descent CQL parser
///
/// Turns a token stream into a [`CqlStatement`]. Rejects joins outright and
/// resolves keyspace-qualified table names while parsing.

use crate::cql::ast::*;
use crate::cql::lexer::{Lexer, Token};
use crate::schema::{validate_identifier, ColumnDef};
use crate::{Error, Result};

/// Clauses that may follow WHERE, as keyword pairs
const WHERE_TERMINATORS: &[(&str, &str)] = &[
    ("ORDER", "BY"),
    ("GROUP", "BY"),
    ("PER", "PARTITION"),
    ("ALLOW", "FILTERING"),
];

/// Element of a PRIMARY KEY clause
#[derive(Debug, Clone, PartialEq)]
enum KeyElement {
    Column(String),
    Group(Vec<String>),
}

/// Where the primary key was declared
#[derive(Debug, Clone, PartialEq)]
enum KeyClause {
    /// `col type PRIMARY KEY`
    Inline(String),
    /// `PRIMARY KEY (...)`
    Table(Vec<KeyElement>),
}

/// CQL statement parser
pub struct CqlParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl CqlParser {
    /// Parse a single CQL statement
    pub fn parse(sql: &str) -> Result<CqlStatement> {
        if sql.trim().is_empty() {
            return Err(Error::Syntax("statement cannot be empty".into()));
        }

        let mut tokens = Lexer::tokenize(sql)?;
        while tokens.last() == Some(&Token::Semicolon) {
            tokens.pop();
        }
        if tokens.is_empty() {
            return Err(Error::Syntax("statement cannot be empty".into()));
        }

        if tokens.iter().any(|t| t.is_keyword("JOIN")) {
            return Err(Error::UnsupportedOperation("joins not supported".into()));
        }

        let mut parser = Self { tokens, pos: 0 };
        parser.parse_statement()
    }

    fn parse_statement(&mut self) -> Result<CqlStatement> {
        if self.at_keyword("SELECT") {
            return Ok(CqlStatement::Select(self.parse_select()?));
        }
        if self.at_keyword("INSERT") {
            return Ok(CqlStatement::Insert(self.parse_insert()?));
        }
        if self.at_keyword("CREATE") {
            let mut offset = 1;
            if self.keyword_at(offset, "CUSTOM") {
                offset += 1;
            }
            if self.keyword_at(offset, "TABLE") || self.keyword_at(offset, "COLUMNFAMILY") {
                return Ok(CqlStatement::CreateTable(self.parse_create_table()?));
            }
            if self.keyword_at(offset, "INDEX") {
                return Ok(CqlStatement::CreateIndex(self.parse_create_index()?));
            }
        }
        if (self.at_keyword("CREATE") || self.at_keyword("ALTER") || self.at_keyword("DROP"))
            && self.keyword_at(1, "KEYSPACE")
        {
            return Ok(CqlStatement::Keyspace(self.parse_keyspace()?));
        }
        if self.at_keyword("TRUNCATE") {
            return self.parse_truncate();
        }
        if self.at_keyword("USE") {
            self.advance();
            let keyspace = self.parse_identifier()?;
            self.expect_end()?;
            return Ok(CqlStatement::Use(keyspace));
        }

        let tokens = std::mem::take(&mut self.tokens);
        Ok(CqlStatement::Other(collapse_table_refs(tokens)))
    }

    // ---- cursor helpers ----

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        self.keyword_at(0, keyword)
    }

    fn keyword_at(&self, offset: usize, keyword: &str) -> bool {
        self.peek(offset).map_or(false, |t| t.is_keyword(keyword))
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.at_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> Result<()> {
        if self.eat_keyword(keyword) {
            Ok(())
        } else {
            Err(Error::Syntax(format!("expected {}, got {}", keyword, self.describe_current())))
        }
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.current() == Some(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(Error::Syntax(format!("expected {}, got {}", token, self.describe_current())))
        }
    }

    fn expect_end(&self) -> Result<()> {
        if self.at_end() {
            Ok(())
        } else {
            Err(Error::Syntax(format!("unexpected {}", self.describe_current())))
        }
    }

    fn describe_current(&self) -> String {
        match self.current() {
            Some(token) => format!("'{}'", token),
            None => "end of statement".to_string(),
        }
    }

    fn parse_identifier(&mut self) -> Result<String> {
        match self.current().and_then(Token::identifier) {
            Some(name) => {
                let name = name.to_string();
                self.advance();
                Ok(name)
            }
            None => Err(Error::Syntax(format!(
                "expected identifier, got {}",
                self.describe_current()
            ))),
        }
    }

    /// `name` or `keyspace.name`
    fn parse_table_ref(&mut self) -> Result<TableRef> {
        let first = self.parse_identifier()?;
        if self.eat(&Token::Dot) {
            let name = self.parse_identifier()?;
            Ok(TableRef::qualified(first, name))
        } else {
            Ok(TableRef::new(first))
        }
    }

    fn eat_if_not_exists(&mut self) -> bool {
        if self.at_keyword("IF") && self.keyword_at(1, "NOT") && self.keyword_at(2, "EXISTS") {
            self.pos += 3;
            true
        } else {
            false
        }
    }

    fn eat_if_exists(&mut self) -> bool {
        if self.at_keyword("IF") && self.keyword_at(1, "EXISTS") {
            self.pos += 2;
            true
        } else {
            false
        }
    }

    /// Whether the cursor opens a clause that ends the WHERE list. Checked as
    /// keyword pairs so a column named `per` or `limit` stays a column.
    fn at_select_tail(&self) -> bool {
        if WHERE_TERMINATORS
            .iter()
            .any(|(first, second)| self.at_keyword(first) && self.keyword_at(1, second))
        {
            return true;
        }
        self.at_keyword("LIMIT")
            && matches!(self.peek(1), Some(Token::Number(_) | Token::Placeholder(_)))
    }

    /// Collect a bracketed group, delimiters included; the cursor must sit on
    /// the opening delimiter
    fn take_balanced(&mut self) -> Result<Vec<Token>> {
        let mut depth = 0usize;
        let mut group = Vec::new();
        while let Some(token) = self.current().cloned() {
            match token {
                Token::LeftParen | Token::LeftBracket | Token::LeftBrace => depth += 1,
                Token::RightParen | Token::RightBracket | Token::RightBrace => {
                    depth = depth.saturating_sub(1);
                }
                _ => {}
            }
            group.push(token);
            self.advance();
            if depth == 0 {
                return Ok(group);
            }
        }
        Err(Error::Syntax("unbalanced brackets".into()))
    }

    // ---- SELECT ----

    fn parse_select(&mut self) -> Result<SelectStatement> {
        self.expect_keyword("SELECT")?;

        let mut projection = Vec::new();
        let mut depth = 0usize;
        loop {
            match self.current() {
                None => return Err(Error::Syntax("SELECT requires FROM clause".into())),
                Some(token) if depth == 0 && token.is_keyword("FROM") => break,
                Some(token) => {
                    match token {
                        Token::LeftParen => depth += 1,
                        Token::RightParen => depth = depth.saturating_sub(1),
                        _ => {}
                    }
                    projection.push(token.clone());
                    self.advance();
                }
            }
        }
        if projection.is_empty() {
            return Err(Error::Syntax("empty SELECT list".into()));
        }
        self.expect_keyword("FROM")?;

        let mut tables = vec![self.parse_table_ref()?];
        while self.eat(&Token::Comma) {
            tables.push(self.parse_table_ref()?);
        }

        if !self.at_end() && !self.at_keyword("WHERE") && !self.at_select_tail() {
            return Err(Error::Syntax(format!(
                "unexpected {} after FROM clause",
                self.describe_current()
            )));
        }

        let mut where_tokens = None;
        let mut predicates = Vec::new();
        if self.eat_keyword("WHERE") {
            let mut clause = Vec::new();
            let mut depth = 0usize;
            while let Some(token) = self.current() {
                if depth == 0 && self.at_select_tail() {
                    break;
                }
                match token {
                    Token::LeftParen => depth += 1,
                    Token::RightParen => depth = depth.saturating_sub(1),
                    _ => {}
                }
                clause.push(token.clone());
                self.advance();
            }
            if clause.is_empty() {
                return Err(Error::Syntax("empty WHERE clause".into()));
            }
            predicates = Self::parse_where(clause.clone())?;
            where_tokens = Some(clause);
        }

        let mut tail = Vec::new();
        let mut allow_filtering = false;
        while let Some(token) = self.current() {
            if token.is_keyword("ALLOW") && self.keyword_at(1, "FILTERING") {
                allow_filtering = true;
                self.pos += 2;
                continue;
            }
            if token.is_keyword("WHERE") {
                return Err(Error::Syntax("WHERE clause out of place".into()));
            }
            tail.push(token.clone());
            self.advance();
        }

        Ok(SelectStatement {
            projection,
            tables,
            where_tokens,
            predicates,
            tail,
            allow_filtering,
        })
    }

    /// Flatten a WHERE clause into its relations. AND/OR connectors,
    /// NOT and parentheses are not analyzed beyond that.
    fn parse_where(tokens: Vec<Token>) -> Result<Vec<Predicate>> {
        let mut parser = Self { tokens, pos: 0 };
        let mut predicates = Vec::new();
        parser.parse_conditions(&mut predicates)?;
        parser.expect_end()?;
        Ok(predicates)
    }

    fn parse_conditions(&mut self, out: &mut Vec<Predicate>) -> Result<()> {
        loop {
            self.parse_condition_term(out)?;
            if self.eat_keyword("AND") || self.eat_keyword("OR") {
                continue;
            }
            return Ok(());
        }
    }

    fn parse_condition_term(&mut self, out: &mut Vec<Predicate>) -> Result<()> {
        if self.eat_keyword("NOT") {
            return self.parse_condition_term(out);
        }

        if self.current() == Some(&Token::LeftParen) {
            let is_tuple = self.peek(1).and_then(Token::identifier).is_some()
                && self.peek(2) == Some(&Token::Comma);
            self.advance();

            if is_tuple {
                // (c1, c2) > (v1, v2)
                let mut columns = vec![self.parse_identifier()?];
                while self.eat(&Token::Comma) {
                    columns.push(self.parse_identifier()?);
                }
                self.expect(&Token::RightParen)?;
                return self.parse_relation(columns, out);
            }

            self.parse_conditions(out)?;
            return self.expect(&Token::RightParen);
        }

        let mut columns = Vec::new();
        let name = self.parse_identifier()?;
        if self.current() == Some(&Token::LeftParen) {
            // token(pk, ...) and similar: the relation constrains the arguments
            self.advance();
            while !self.eat(&Token::RightParen) {
                if self.at_end() {
                    return Err(Error::Syntax(format!("unterminated call to {}", name)));
                }
                if !self.eat(&Token::Comma) {
                    columns.push(self.parse_identifier()?);
                }
            }
        } else if self.eat(&Token::Dot) {
            columns.push(self.parse_identifier()?);
        } else {
            columns.push(name);
        }

        self.parse_relation(columns, out)
    }

    fn parse_relation(&mut self, columns: Vec<String>, out: &mut Vec<Predicate>) -> Result<()> {
        let operator = self.parse_operator()?;
        let operand = match operator {
            CompareOp::IsNull | CompareOp::IsNotNull => Vec::new(),
            _ => self.parse_operand()?,
        };

        for column in columns {
            out.push(Predicate {
                column,
                operator: operator.clone(),
                operand: operand.clone(),
            });
        }
        Ok(())
    }

    fn parse_operator(&mut self) -> Result<CompareOp> {
        let op = match self.current() {
            Some(Token::Op(op)) => match op.as_str() {
                "=" => CompareOp::Equal,
                "!=" | "<>" => CompareOp::NotEqual,
                "<" => CompareOp::LessThan,
                "<=" => CompareOp::LessThanOrEqual,
                ">" => CompareOp::GreaterThan,
                ">=" => CompareOp::GreaterThanOrEqual,
                other => {
                    return Err(Error::Syntax(format!("unsupported operator {}", other)));
                }
            },
            Some(t) if t.is_keyword("IN") => CompareOp::In,
            Some(t) if t.is_keyword("LIKE") => CompareOp::Like,
            Some(t) if t.is_keyword("CONTAINS") => {
                if self.keyword_at(1, "KEY") {
                    self.advance();
                    CompareOp::ContainsKey
                } else {
                    CompareOp::Contains
                }
            }
            Some(t) if t.is_keyword("IS") => {
                self.advance();
                let negated = self.eat_keyword("NOT");
                if !self.at_keyword("NULL") {
                    return Err(Error::Syntax(format!(
                        "expected NULL, got {}",
                        self.describe_current()
                    )));
                }
                if negated {
                    CompareOp::IsNotNull
                } else {
                    CompareOp::IsNull
                }
            }
            _ => {
                return Err(Error::Syntax(format!(
                    "expected relation operator, got {}",
                    self.describe_current()
                )));
            }
        };
        self.advance();
        Ok(op)
    }

    fn parse_operand(&mut self) -> Result<Vec<Token>> {
        match self.current() {
            None => Err(Error::Syntax("missing value in WHERE clause".into())),
            Some(Token::LeftParen | Token::LeftBracket | Token::LeftBrace) => self.take_balanced(),
            Some(name @ Token::Word(_)) if self.peek(1) == Some(&Token::LeftParen) => {
                let mut call = vec![name.clone()];
                self.advance();
                call.extend(self.take_balanced()?);
                Ok(call)
            }
            Some(
                token @ (Token::Word(_)
                | Token::QuotedIdent(_)
                | Token::StringLit(_)
                | Token::Number(_)
                | Token::HexBlob(_)
                | Token::Placeholder(_)),
            ) => {
                let mut operand = vec![token.clone()];
                self.advance();
                // qualified column reference on the right-hand side
                while self.current() == Some(&Token::Dot)
                    && self.peek(1).and_then(Token::identifier).is_some()
                {
                    operand.extend(self.tokens[self.pos..self.pos + 2].iter().cloned());
                    self.pos += 2;
                }
                Ok(operand)
            }
            Some(other) => Err(Error::Syntax(format!("unexpected '{}' in WHERE clause", other))),
        }
    }

    // ---- INSERT ----

    fn parse_insert(&mut self) -> Result<InsertStatement> {
        self.expect_keyword("INSERT")?;
        self.expect_keyword("INTO")?;
        let table = self.parse_table_ref()?;

        if self.at_keyword("JSON") {
            return Err(Error::UnsupportedOperation("INSERT JSON not supported".into()));
        }

        self.expect(&Token::LeftParen)?;
        let mut columns = vec![self.parse_identifier()?];
        while self.eat(&Token::Comma) {
            columns.push(self.parse_identifier()?);
        }
        self.expect(&Token::RightParen)?;

        self.expect_keyword("VALUES")?;
        self.expect(&Token::LeftParen)?;
        let mut values = Vec::new();
        let mut value = Vec::new();
        loop {
            match self.current() {
                None => return Err(Error::Syntax("unterminated VALUES list".into())),
                Some(Token::Comma) | Some(Token::RightParen) => {
                    if value.is_empty() {
                        return Err(Error::Syntax("empty value in VALUES list".into()));
                    }
                    values.push(std::mem::take(&mut value));
                    let done = self.current() == Some(&Token::RightParen);
                    self.advance();
                    if done {
                        break;
                    }
                }
                Some(Token::LeftParen | Token::LeftBracket | Token::LeftBrace) => {
                    value.extend(self.take_balanced()?);
                }
                Some(token) => {
                    value.push(token.clone());
                    self.advance();
                }
            }
        }

        if columns.len() != values.len() {
            return Err(Error::InvalidQuery(format!(
                "unmatched column names/values: {} columns, {} values",
                columns.len(),
                values.len()
            )));
        }

        let mut if_not_exists = false;
        while !self.at_end() {
            if self.eat_if_not_exists() {
                if_not_exists = true;
            } else if self.eat_keyword("USING") {
                // TTL / TIMESTAMP have no engine counterpart
                while !self.at_end() && !self.at_keyword("IF") {
                    self.advance();
                }
            } else {
                return Err(Error::Syntax(format!("unexpected {}", self.describe_current())));
            }
        }

        Ok(InsertStatement {
            table,
            columns,
            values,
            if_not_exists,
        })
    }

    // ---- CREATE TABLE ----

    fn parse_create_table(&mut self) -> Result<CreateTableStatement> {
        self.expect_keyword("CREATE")?;
        if !self.eat_keyword("TABLE") {
            self.expect_keyword("COLUMNFAMILY")?;
        }
        let if_not_exists = self.eat_if_not_exists();
        let table = self.parse_table_ref()?;
        validate_identifier(&table.name)?;

        self.expect(&Token::LeftParen)?;
        let mut columns = Vec::new();
        let mut key_clause = None;
        loop {
            if self.at_keyword("PRIMARY") {
                self.advance();
                self.expect_keyword("KEY")?;
                self.expect(&Token::LeftParen)?;
                key_clause = Some(KeyClause::Table(self.parse_key_elements()?));
            } else {
                let name = self.parse_identifier()?;
                let cql_type = self.parse_type()?;
                loop {
                    if self.eat_keyword("STATIC") {
                        continue;
                    }
                    if self.at_keyword("PRIMARY") {
                        self.advance();
                        self.expect_keyword("KEY")?;
                        key_clause = Some(KeyClause::Inline(name.clone()));
                        continue;
                    }
                    break;
                }
                columns.push(ColumnDef::new(name, cql_type));
            }

            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(&Token::RightParen)?;
            break;
        }
        // Table options (WITH ...) have no engine counterpart
        self.pos = self.tokens.len();

        let key_clause = key_clause.ok_or_else(|| {
            Error::Schema(format!("primary key not present for table {}", table.name))
        })?;
        let (partition_keys, clustering_key) = match key_clause {
            KeyClause::Inline(column) => (vec![column], None),
            KeyClause::Table(elements) => resolve_key(elements, &table.name)?,
        };

        let statement = CreateTableStatement {
            table,
            if_not_exists,
            columns,
            partition_keys,
            clustering_key,
        };
        statement.to_schema()?;
        Ok(statement)
    }

    /// `text`, `map<text, int>`, `frozen<list<int>>`
    fn parse_type(&mut self) -> Result<String> {
        let base = self.parse_identifier()?;
        if self.current() != Some(&Token::Op("<".into())) {
            return Ok(base);
        }
        self.advance();
        let mut args = vec![self.parse_type()?];
        while self.eat(&Token::Comma) {
            args.push(self.parse_type()?);
        }
        self.expect(&Token::Op(">".into()))?;
        Ok(format!("{}<{}>", base, args.join(", ")))
    }

    /// Elements of `PRIMARY KEY (...)`; the opening parenthesis is consumed
    fn parse_key_elements(&mut self) -> Result<Vec<KeyElement>> {
        let mut elements = Vec::new();
        loop {
            if self.eat(&Token::LeftParen) {
                let mut group = vec![self.parse_identifier()?];
                while self.eat(&Token::Comma) {
                    group.push(self.parse_identifier()?);
                }
                self.expect(&Token::RightParen)?;
                elements.push(KeyElement::Group(group));
            } else {
                elements.push(KeyElement::Column(self.parse_identifier()?));
            }

            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(&Token::RightParen)?;
            return Ok(elements);
        }
    }

    // ---- CREATE INDEX ----

    fn parse_create_index(&mut self) -> Result<CreateIndexStatement> {
        self.expect_keyword("CREATE")?;
        self.eat_keyword("CUSTOM");
        self.expect_keyword("INDEX")?;
        let if_not_exists = self.eat_if_not_exists();

        let name = if self.at_keyword("ON") {
            None
        } else {
            Some(self.parse_identifier()?)
        };

        self.expect_keyword("ON")?;
        let table = self.parse_table_ref()?;
        self.expect(&Token::LeftParen)?;

        let wraps_collection = ["KEYS", "VALUES", "ENTRIES", "FULL"]
            .iter()
            .any(|k| self.at_keyword(k))
            && self.peek(1) == Some(&Token::LeftParen);
        let column = if wraps_collection {
            self.pos += 2;
            let column = self.parse_identifier()?;
            self.expect(&Token::RightParen)?;
            column
        } else {
            self.parse_identifier()?
        };
        self.expect(&Token::RightParen)?;
        // USING 'class' / WITH options are ignored
        self.pos = self.tokens.len();

        Ok(CreateIndexStatement {
            name,
            if_not_exists,
            table,
            column,
        })
    }

    // ---- keyspace / truncate ----

    fn parse_keyspace(&mut self) -> Result<KeyspaceStatement> {
        let action = match self.current().and_then(Token::identifier) {
            Some(word) => word.to_ascii_uppercase(),
            None => return Err(Error::Syntax("expected keyspace statement".into())),
        };
        self.advance();
        self.expect_keyword("KEYSPACE")?;
        if !self.eat_if_not_exists() {
            self.eat_if_exists();
        }
        let name = self.parse_identifier()?;
        validate_identifier(&name)?;
        // replication options are accepted as-is
        self.pos = self.tokens.len();

        Ok(KeyspaceStatement { action, name })
    }

    fn parse_truncate(&mut self) -> Result<CqlStatement> {
        self.expect_keyword("TRUNCATE")?;
        self.eat_keyword("TABLE");
        let table = self.parse_table_ref()?;
        self.expect_end()?;
        Ok(CqlStatement::Truncate(table))
    }
}

/// Apply the key-clause rules:
/// - no nested group: every column is a partition key
/// - trailing group `(a, b, (c))` or `(a, (b, c))`: the last declared column
///   clusters, every column before it partitions
/// - leading group `((a, b), c)`: grouped columns plus all but the last
///   following column partition, the last following column clusters
fn resolve_key(elements: Vec<KeyElement>, table: &str) -> Result<(Vec<String>, Option<String>)> {
    let group_at = elements.iter().position(|e| matches!(e, KeyElement::Group(_)));
    let last = elements.len().saturating_sub(1);

    let mut partition = Vec::new();
    let mut clustering = None;

    match group_at {
        None => {
            for element in elements {
                if let KeyElement::Column(c) = element {
                    partition.push(c);
                }
            }
        }
        Some(0) => {
            let mut trailing = Vec::new();
            for (i, element) in elements.into_iter().enumerate() {
                match element {
                    KeyElement::Group(group) if i == 0 => partition.extend(group),
                    KeyElement::Column(c) => trailing.push(c),
                    KeyElement::Group(_) => {
                        return Err(Error::Schema(format!(
                            "unexpected nested group in primary key of table {}",
                            table
                        )));
                    }
                }
            }
            clustering = trailing.pop();
            partition.extend(trailing);
        }
        Some(i) if i == last => {
            for element in elements {
                match element {
                    KeyElement::Column(c) => partition.push(c),
                    KeyElement::Group(group) => partition.extend(group),
                }
            }
            clustering = partition.pop();
        }
        Some(_) => {
            return Err(Error::Schema(format!(
                "unexpected column after clustering group in primary key of table {}",
                table
            )));
        }
    }

    Ok((partition, clustering))
}

/// Drop keyspace qualifiers from table references in a raw token stream
/// (`UPDATE ks.t`, `DELETE FROM ks.t`, `DROP TABLE IF EXISTS ks.t`, ...)
fn collapse_table_refs(tokens: Vec<Token>) -> Vec<Token> {
    const TABLE_INTRODUCERS: &[&str] = &["FROM", "INTO", "UPDATE", "TABLE", "TRUNCATE", "INDEX"];

    let mut out = Vec::with_capacity(tokens.len());
    let mut expect_table = false;
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        if expect_table {
            if token.is_keyword("IF") || token.is_keyword("NOT") || token.is_keyword("EXISTS") {
                out.push(token.clone());
                i += 1;
                continue;
            }
            expect_table = false;
            let qualified = token.identifier().is_some()
                && tokens.get(i + 1) == Some(&Token::Dot)
                && tokens.get(i + 2).and_then(Token::identifier).is_some();
            if qualified {
                out.push(tokens[i + 2].clone());
                i += 3;
                continue;
            }
        }
        if TABLE_INTRODUCERS.iter().any(|k| token.is_keyword(k)) {
            expect_table = true;
        }
        out.push(token.clone());
        i += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cql::lexer::{render_tokens, Placeholder};

    fn select(sql: &str) -> SelectStatement {
        match CqlParser::parse(sql).unwrap() {
            CqlStatement::Select(s) => s,
            other => panic!("Expected SELECT, got {:?}", other),
        }
    }

    fn create_table(sql: &str) -> CreateTableStatement {
        match CqlParser::parse(sql).unwrap() {
            CqlStatement::CreateTable(s) => s,
            other => panic!("Expected CREATE TABLE, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_simple_select() {
        let stmt = select("SELECT * FROM users WHERE id = ?");
        assert_eq!(stmt.tables, vec![TableRef::new("users")]);
        assert_eq!(stmt.predicates.len(), 1);
        assert_eq!(stmt.predicates[0].column, "id");
        assert_eq!(stmt.predicates[0].operator, CompareOp::Equal);
        assert_eq!(
            stmt.predicates[0].operand,
            vec![Token::Placeholder(Placeholder::Positional)]
        );
        assert!(!stmt.allow_filtering);
    }

    #[test]
    fn test_parse_select_without_where() {
        let stmt = select("select name, email from app.users limit 10;");
        assert_eq!(stmt.tables, vec![TableRef::qualified("app", "users")]);
        assert!(!stmt.has_where());
        assert_eq!(render_tokens(&stmt.tail), "LIMIT 10");
        assert_eq!(render_tokens(&stmt.projection), "name, email");
    }

    #[test]
    fn test_parse_select_implicit_join_tables() {
        let stmt = select("SELECT * FROM a, b WHERE a.id = b.id");
        assert_eq!(stmt.tables.len(), 2);
    }

    #[test]
    fn test_parse_select_flattens_boolean_structure() {
        let stmt = select(
            "SELECT * FROM t WHERE (a = 1 OR b IN (1, 2)) AND NOT c > 3 AND d IS NOT NULL",
        );
        let columns: Vec<&str> = stmt.predicates.iter().map(|p| p.column.as_str()).collect();
        assert_eq!(columns, vec!["a", "b", "c", "d"]);
        assert_eq!(stmt.predicates[1].operator, CompareOp::In);
        assert_eq!(stmt.predicates[3].operator, CompareOp::IsNotNull);
    }

    #[test]
    fn test_parse_select_tuple_and_token_relations() {
        let stmt = select("SELECT * FROM t WHERE token(pk) > ? AND (c1, c2) > (1, 2)");
        let columns: Vec<&str> = stmt.predicates.iter().map(|p| p.column.as_str()).collect();
        assert_eq!(columns, vec!["pk", "c1", "c2"]);
    }

    #[test]
    fn test_parse_select_allow_filtering_and_order() {
        let stmt = select("SELECT * FROM t WHERE a = 1 ORDER BY b DESC ALLOW FILTERING");
        assert!(stmt.allow_filtering);
        assert_eq!(render_tokens(&stmt.tail), "ORDER BY b DESC");
        assert_eq!(stmt.predicates.len(), 1);
    }

    #[test]
    fn test_terminator_words_as_columns() {
        let stmt = select("SELECT * FROM t WHERE per = 1 AND order_id = 2 LIMIT 5");
        let columns: Vec<&str> = stmt.predicates.iter().map(|p| p.column.as_str()).collect();
        assert_eq!(columns, vec!["per", "order_id"]);
        assert_eq!(render_tokens(&stmt.tail), "LIMIT 5");

        let stmt = select("SELECT * FROM t WHERE a = 1 PER PARTITION LIMIT 2");
        assert_eq!(stmt.predicates.len(), 1);
        assert_eq!(render_tokens(&stmt.tail), "PER PARTITION LIMIT 2");
    }

    #[test]
    fn test_select_rejects_tokens_after_from() {
        for cql in [
            "SELECT * FROM users u WHERE name = 'x'",
            "SELECT * FROM users AS u WHERE u.name = 'x'",
            "SELECT * FROM users u",
            "SELECT * FROM users LIMIT 1 WHERE id = 1",
        ] {
            assert!(
                matches!(CqlParser::parse(cql), Err(Error::Syntax(_))),
                "{} should be rejected",
                cql
            );
        }
    }

    #[test]
    fn test_parse_contains_key() {
        let stmt = select("SELECT * FROM t WHERE tags CONTAINS KEY 'x'");
        assert_eq!(stmt.predicates[0].operator, CompareOp::ContainsKey);
    }

    #[test]
    fn test_reject_join() {
        let err = CqlParser::parse("SELECT * FROM a JOIN b ON a.id = b.id").unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation(msg) if msg == "joins not supported"));

        let err = CqlParser::parse("select * from a inner join b").unwrap_err();
        assert!(matches!(err, Error::UnsupportedOperation(_)));
    }

    #[test]
    fn test_join_inside_literal_is_not_rejected() {
        assert!(CqlParser::parse("SELECT * FROM t WHERE note = 'JOIN us'").is_ok());
    }

    #[test]
    fn test_select_requires_from() {
        assert!(matches!(CqlParser::parse("SELECT 1"), Err(Error::Syntax(_))));
    }

    #[test]
    fn test_parse_insert() {
        let stmt = match CqlParser::parse(
            "INSERT INTO ks.users (id, name, tags) VALUES (?, 'Alice', {'a', 'b'}) USING TTL 60",
        )
        .unwrap()
        {
            CqlStatement::Insert(s) => s,
            other => panic!("Expected INSERT, got {:?}", other),
        };
        assert_eq!(stmt.table, TableRef::qualified("ks", "users"));
        assert_eq!(stmt.columns, vec!["id", "name", "tags"]);
        assert_eq!(stmt.values.len(), 3);
        assert_eq!(render_tokens(&stmt.values[2]), "{'a', 'b'}");
        assert!(!stmt.if_not_exists);
    }

    #[test]
    fn test_parse_insert_if_not_exists() {
        match CqlParser::parse("INSERT INTO t (id) VALUES (1) IF NOT EXISTS").unwrap() {
            CqlStatement::Insert(s) => assert!(s.if_not_exists),
            other => panic!("Expected INSERT, got {:?}", other),
        }
    }

    #[test]
    fn test_insert_column_value_mismatch() {
        let err = CqlParser::parse("INSERT INTO t (a, b) VALUES (1)").unwrap_err();
        assert!(matches!(err, Error::InvalidQuery(_)));
    }

    #[test]
    fn test_create_table_single_key() {
        let stmt = create_table("CREATE TABLE users (id uuid, name text, PRIMARY KEY (id))");
        assert_eq!(stmt.partition_keys, vec!["id"]);
        assert_eq!(stmt.clustering_key, None);
        assert_eq!(stmt.columns.len(), 2);
    }

    #[test]
    fn test_create_table_inline_key() {
        let stmt = create_table("CREATE TABLE IF NOT EXISTS users (id uuid PRIMARY KEY, name text)");
        assert!(stmt.if_not_exists);
        assert_eq!(stmt.partition_keys, vec!["id"]);
    }

    #[test]
    fn test_create_table_trailing_group_is_clustering() {
        let stmt = create_table(
            "CREATE TABLE ks.events (a text, b text, c timestamp, v int, PRIMARY KEY (a, b, (c)))",
        );
        assert_eq!(stmt.table, TableRef::qualified("ks", "events"));
        assert_eq!(stmt.partition_keys, vec!["a", "b"]);
        assert_eq!(stmt.clustering_key.as_deref(), Some("c"));
    }

    #[test]
    fn test_create_table_wide_trailing_group_keeps_every_column() {
        let stmt = create_table("CREATE TABLE m (a int, b int, c int, v text, PRIMARY KEY (a, (b, c)))");
        assert_eq!(stmt.partition_keys, vec!["a", "b"]);
        assert_eq!(stmt.clustering_key.as_deref(), Some("c"));
        assert_eq!(stmt.primary_key(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_create_table_leading_group_is_partition() {
        let stmt = create_table(
            "CREATE TABLE t (a int, b int, c int, d int, PRIMARY KEY ((a, b), c, d)) WITH CLUSTERING ORDER BY (d DESC)",
        );
        assert_eq!(stmt.partition_keys, vec!["a", "b", "c"]);
        assert_eq!(stmt.clustering_key.as_deref(), Some("d"));
    }

    #[test]
    fn test_create_table_without_key_group_has_no_clustering() {
        let stmt = create_table("CREATE TABLE t (a int, b int, PRIMARY KEY (a, b))");
        assert_eq!(stmt.partition_keys, vec!["a", "b"]);
        assert_eq!(stmt.clustering_key, None);
    }

    #[test]
    fn test_create_table_collection_types() {
        let stmt = create_table(
            "CREATE TABLE t (id int PRIMARY KEY, m map<text, frozen<list<int>>>, s set<text>)",
        );
        assert_eq!(stmt.columns[1].cql_type, "map<text, frozen<list<int>>>");
        assert_eq!(stmt.columns[2].cql_type, "set<text>");
    }

    #[test]
    fn test_create_table_missing_primary_key() {
        let err = CqlParser::parse("CREATE TABLE users (id uuid, name text)").unwrap_err();
        assert!(
            matches!(err, Error::Schema(msg) if msg == "primary key not present for table users")
        );
    }

    #[test]
    fn test_create_table_last_key_clause_wins() {
        let stmt = create_table("CREATE TABLE t (a int PRIMARY KEY, b int, PRIMARY KEY (b))");
        assert_eq!(stmt.partition_keys, vec!["b"]);
    }

    #[test]
    fn test_create_index_forms() {
        match CqlParser::parse("CREATE INDEX ON ks.users (email)").unwrap() {
            CqlStatement::CreateIndex(s) => {
                assert_eq!(s.name, None);
                assert_eq!(s.table, TableRef::qualified("ks", "users"));
                assert_eq!(s.column, "email");
            }
            other => panic!("Expected CREATE INDEX, got {:?}", other),
        }

        match CqlParser::parse("CREATE INDEX IF NOT EXISTS tag_idx ON posts (keys(tags))").unwrap() {
            CqlStatement::CreateIndex(s) => {
                assert_eq!(s.name.as_deref(), Some("tag_idx"));
                assert!(s.if_not_exists);
                assert_eq!(s.column, "tags");
            }
            other => panic!("Expected CREATE INDEX, got {:?}", other),
        }
    }

    #[test]
    fn test_keyspace_and_use() {
        let stmt = CqlParser::parse(
            "CREATE KEYSPACE IF NOT EXISTS app WITH replication = {'class': 'SimpleStrategy', 'replication_factor': 1}",
        )
        .unwrap();
        assert_eq!(
            stmt,
            CqlStatement::Keyspace(KeyspaceStatement {
                action: "CREATE".into(),
                name: "app".into(),
            })
        );
        assert_eq!(CqlParser::parse("USE app;").unwrap(), CqlStatement::Use("app".into()));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(
            CqlParser::parse("TRUNCATE TABLE ks.t").unwrap(),
            CqlStatement::Truncate(TableRef::qualified("ks", "t"))
        );
    }

    #[test]
    fn test_other_statements_collapse_keyspace() {
        match CqlParser::parse("UPDATE ks.users SET name = 'x' WHERE id = 1").unwrap() {
            CqlStatement::Other(tokens) => {
                assert_eq!(render_tokens(&tokens), "UPDATE users SET name = 'x' WHERE id = 1");
            }
            other => panic!("Expected passthrough, got {:?}", other),
        }
        match CqlParser::parse("DROP TABLE IF EXISTS ks.users").unwrap() {
            CqlStatement::Other(tokens) => {
                assert_eq!(render_tokens(&tokens), "DROP TABLE IF EXISTS users");
            }
            other => panic!("Expected passthrough, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_statement() {
        assert!(matches!(CqlParser::parse("   "), Err(Error::Syntax(_))));
        assert!(matches!(CqlParser::parse(";"), Err(Error::Syntax(_))));
    }
}
