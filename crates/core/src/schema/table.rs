//! Table definition for the Tabula schema.

use super::column::Column;
use crate::error::{Error, Result};
use crate::row::Row;
use crate::types::DataType;
use crate::value::Value;

/// A table definition: ordered columns, one primary-key column and any
/// number of single-column secondary indexes.
#[derive(Clone, Debug)]
pub struct Table {
    /// Table name.
    name: String,
    /// Column definitions.
    columns: Vec<Column>,
    /// Position of the primary-key column.
    primary_key: usize,
    /// Positions of declared secondary indexes, in declaration order.
    indexes: Vec<usize>,
}

impl Table {
    /// Returns the table name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the columns.
    #[inline]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the number of columns.
    #[inline]
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Gets a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Gets a column position by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    /// Gets a column position by name, failing with a schema violation.
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| Error::unknown_column(&self.name, name))
    }

    /// Returns the primary-key column.
    pub fn primary_key(&self) -> &Column {
        &self.columns[self.primary_key]
    }

    /// Returns the primary-key column position.
    #[inline]
    pub fn primary_key_index(&self) -> usize {
        self.primary_key
    }

    /// Returns the primary-key column name.
    pub fn primary_key_name(&self) -> &str {
        self.primary_key().name()
    }

    /// Returns true if the primary key is assigned from the table counter.
    pub fn is_auto_increment(&self) -> bool {
        self.primary_key().data_type().is_auto_increment()
    }

    /// Returns every indexed column: the primary key first, then the declared
    /// secondary indexes.
    pub fn indexed_columns(&self) -> impl Iterator<Item = &Column> + '_ {
        core::iter::once(self.primary_key)
            .chain(self.indexes.iter().copied().filter(|&i| i != self.primary_key))
            .map(move |i| &self.columns[i])
    }

    /// Returns true if the column carries an index.
    pub fn is_indexed(&self, name: &str) -> bool {
        self.indexed_columns().any(|c| c.name() == name)
    }

    /// Builds a new record from named fields. Fields not listed are `Null`
    /// until defaults are applied at commit.
    pub fn record(&self, fields: &[(&str, Value)]) -> Result<Row> {
        let mut row = Row::empty(self.width());
        for (name, value) in fields {
            let index = self.require_column(name)?;
            row.set(index, value.clone());
        }
        Ok(row)
    }
}

/// Builder for creating table definitions.
pub struct TableBuilder {
    name: String,
    columns: Vec<Column>,
    primary_key: Vec<String>,
    indexes: Vec<String>,
}

impl TableBuilder {
    /// Creates a new table builder.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        Self::check_naming_rules(&name)?;
        Ok(Self {
            name,
            columns: Vec::new(),
            primary_key: Vec::new(),
            indexes: Vec::new(),
        })
    }

    /// Validates a name follows naming rules.
    fn check_naming_rules(name: &str) -> Result<()> {
        let first = match name.chars().next() {
            Some(c) => c,
            None => return Err(Error::schema("name cannot be empty")),
        };
        if !first.is_ascii_alphabetic() && first != '_' {
            return Err(Error::schema(format!(
                "name must start with letter or underscore: {}",
                name
            )));
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::schema(format!(
                "name contains invalid characters: {}",
                name
            )));
        }
        Ok(())
    }

    /// Adds a column with the given type and no default.
    pub fn add_column(self, name: impl Into<String>, data_type: DataType) -> Result<Self> {
        self.column(Column::new(name, data_type))
    }

    /// Adds a fully configured column.
    pub fn column(mut self, column: Column) -> Result<Self> {
        Self::check_naming_rules(column.name())?;
        if self.columns.iter().any(|c| c.name() == column.name()) {
            return Err(Error::schema(format!(
                "column already exists: {}",
                column.name()
            )));
        }
        self.columns.push(column);
        Ok(self)
    }

    /// Marks existing columns as nullable.
    pub fn add_nullable(mut self, columns: &[&str]) -> Self {
        for name in columns {
            if let Some(col) = self.columns.iter_mut().find(|c| c.name() == *name) {
                *col = col.clone().nullable(true);
            }
        }
        self
    }

    /// Sets a single-column primary key.
    pub fn primary_key(self, column: &str) -> Result<Self> {
        self.add_primary_key(&[column])
    }

    /// Sets the primary key. Only single-column keys are supported.
    pub fn add_primary_key(mut self, columns: &[&str]) -> Result<Self> {
        if columns.len() != 1 {
            return Err(Error::schema(format!(
                "table {} must have exactly one primary-key column, got {}",
                self.name,
                columns.len()
            )));
        }
        self.validate_indexable(columns[0])?;
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        Ok(self)
    }

    /// Declares a single-column secondary index.
    pub fn add_index(self, column: &str) -> Result<Self> {
        self.add_compound_index(&[column])
    }

    /// Declares a secondary index. Multi-column indexes are rejected.
    pub fn add_compound_index(mut self, columns: &[&str]) -> Result<Self> {
        if columns.len() != 1 {
            return Err(Error::schema(format!(
                "table {}: only single-column indexes are supported",
                self.name
            )));
        }
        self.validate_indexable(columns[0])?;
        if !self.indexes.iter().any(|c| c == columns[0]) {
            self.indexes.push(columns[0].to_string());
        }
        Ok(self)
    }

    fn validate_indexable(&self, name: &str) -> Result<()> {
        match self.columns.iter().find(|c| c.name() == name) {
            None => Err(Error::unknown_column(&self.name, name)),
            Some(c) if !c.is_indexable() => Err(Error::schema(format!(
                "column is not indexable: {}",
                name
            ))),
            Some(_) => Ok(()),
        }
    }

    /// Builds the table definition.
    pub fn build(self) -> Result<Table> {
        let pk_name = match self.primary_key.as_slice() {
            [name] => name,
            _ => {
                return Err(Error::schema(format!(
                    "table {} has no primary key",
                    self.name
                )))
            }
        };

        let columns: Vec<Column> = self
            .columns
            .into_iter()
            .enumerate()
            .map(|(i, c)| c.with_index(i))
            .collect();

        let position = |name: &str| columns.iter().position(|c| c.name() == name);
        let primary_key =
            position(pk_name.as_str()).ok_or_else(|| Error::unknown_column(&self.name, pk_name))?;
        let indexes = self.indexes.iter().filter_map(|n| position(n.as_str())).collect();

        Ok(Table {
            name: self.name,
            columns,
            primary_key,
            indexes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Table {
        TableBuilder::new("items")
            .unwrap()
            .add_column("id", DataType::Integer)
            .unwrap()
            .add_column("name", DataType::String)
            .unwrap()
            .column(Column::new("active", DataType::Boolean).server_default(true))
            .unwrap()
            .primary_key("id")
            .unwrap()
            .add_index("active")
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_table_builder() {
        let table = items();
        assert_eq!(table.name(), "items");
        assert_eq!(table.width(), 3);
        assert_eq!(table.primary_key_name(), "id");
        assert_eq!(table.primary_key_index(), 0);
        assert!(table.is_auto_increment());
        assert_eq!(table.column("active").map(Column::index), Some(2));
    }

    #[test]
    fn test_indexed_columns_include_primary_key() {
        let table = items();
        let names: Vec<&str> = table.indexed_columns().map(Column::name).collect();
        assert_eq!(names, vec!["id", "active"]);
        assert!(table.is_indexed("id"));
        assert!(!table.is_indexed("name"));
    }

    #[test]
    fn test_missing_primary_key() {
        let result = TableBuilder::new("t")
            .unwrap()
            .add_column("id", DataType::Integer)
            .unwrap()
            .build();
        assert!(matches!(result, Err(Error::SchemaViolation { .. })));
    }

    #[test]
    fn test_composite_primary_key_rejected() {
        let result = TableBuilder::new("t")
            .unwrap()
            .add_column("a", DataType::Integer)
            .unwrap()
            .add_column("b", DataType::Integer)
            .unwrap()
            .add_primary_key(&["a", "b"]);
        assert!(matches!(result, Err(Error::SchemaViolation { .. })));
    }

    #[test]
    fn test_compound_index_rejected() {
        let result = TableBuilder::new("t")
            .unwrap()
            .add_column("a", DataType::Integer)
            .unwrap()
            .add_column("b", DataType::Integer)
            .unwrap()
            .add_compound_index(&["a", "b"]);
        assert!(matches!(result, Err(Error::SchemaViolation { .. })));
    }

    #[test]
    fn test_index_on_unknown_or_unindexable_column() {
        let builder = TableBuilder::new("t")
            .unwrap()
            .add_column("blob", DataType::Bytes)
            .unwrap();
        assert!(builder.add_index("blob").is_err());

        let builder = TableBuilder::new("t").unwrap();
        assert!(builder.add_index("nope").is_err());
    }

    #[test]
    fn test_naming_rules() {
        assert!(TableBuilder::new("").is_err());
        assert!(TableBuilder::new("1abc").is_err());
        assert!(TableBuilder::new("has space").is_err());
        assert!(TableBuilder::new("_ok_1").is_ok());
    }

    #[test]
    fn test_duplicate_column() {
        let result = TableBuilder::new("t")
            .unwrap()
            .add_column("a", DataType::Integer)
            .unwrap()
            .add_column("a", DataType::String);
        assert!(result.is_err());
    }

    #[test]
    fn test_record() {
        let table = items();
        let row = table.record(&[("name", Value::from("foo"))]).unwrap();
        assert_eq!(row.values(), &[Value::Null, Value::from("foo"), Value::Null]);

        let err = table.record(&[("colour", Value::from("red"))]);
        assert!(matches!(err, Err(Error::SchemaViolation { .. })));
    }
}
