use crate::database::manager::DatabaseError;

/// Rendered statement with its positional parameters, in bind order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlResult<'a> {
    pub query: String,
    pub params: Vec<&'a str>,
}

/// Builds `UPDATE <table> SET ... WHERE id = $n RETURNING ...` from the
/// columns that were actually supplied. Values are never interpolated; the
/// key is always the last parameter.
pub struct UpdateBuilder<'a> {
    table_name: String,
    assignments: Vec<(&'a str, &'a str)>,
    returning: Vec<&'a str>,
}

impl<'a> UpdateBuilder<'a> {
    pub fn new(table_name: impl Into<String>) -> Result<Self, DatabaseError> {
        let name = table_name.into();
        if !is_valid_identifier(&name) {
            return Err(DatabaseError::InvalidArgument(format!("invalid table name: {}", name)));
        }
        Ok(Self {
            table_name: name,
            assignments: Vec::new(),
            returning: Vec::new(),
        })
    }

    pub fn set(mut self, column: &'a str, value: &'a str) -> Self {
        self.assignments.push((column, value));
        self
    }

    pub fn returning(mut self, columns: &[&'a str]) -> Self {
        self.returning.extend_from_slice(columns);
        self
    }

    /// Renders the statement; `id` binds after every SET value.
    pub fn build(self) -> Result<SqlResult<'a>, DatabaseError> {
        if self.assignments.is_empty() {
            return Err(DatabaseError::InvalidArgument("no fields to update".to_string()));
        }

        let mut params = Vec::with_capacity(self.assignments.len());
        let mut sets = Vec::with_capacity(self.assignments.len());
        for (column, value) in &self.assignments {
            if !is_valid_identifier(column) {
                return Err(DatabaseError::InvalidArgument(format!(
                    "invalid column name: {}",
                    column
                )));
            }
            params.push(*value);
            sets.push(format!("{} = ${}", quote_identifier(column), params.len()));
        }

        let mut query = format!(
            "UPDATE {} SET {} WHERE \"id\" = ${}",
            quote_identifier(&self.table_name),
            sets.join(", "),
            params.len() + 1
        );

        if !self.returning.is_empty() {
            let columns: Vec<String> = self.returning.iter().map(|c| quote_identifier(c)).collect();
            query.push_str(" RETURNING ");
            query.push_str(&columns.join(", "));
        }

        Ok(SqlResult { query, params })
    }
}

/// Quote SQL identifier to prevent injection
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
