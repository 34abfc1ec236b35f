use std::fmt;

type Accessor<R> = Box<dyn Fn(&R) -> String>;

/// Describes one column of a table: its id, the label shown in the header and
/// how to read the (stringified) value out of a record.
pub struct ColumnDef<R> {
    id: String,
    header: Option<String>,
    accessor: Accessor<R>,
}

impl<R> ColumnDef<R> {
    pub fn new(id: impl Into<String>, accessor: impl Fn(&R) -> String + 'static) -> Self {
        Self {
            id: id.into(),
            header: None,
            accessor: Box::new(accessor),
        }
    }

    /// Sets the header label. Without one the id is displayed.
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn header(&self) -> &str {
        self.header.as_deref().unwrap_or(&self.id)
    }

    /// Stringified field value of `record` for this column.
    pub fn value(&self, record: &R) -> String {
        (self.accessor)(record)
    }
}

impl<R> fmt::Debug for ColumnDef<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDef")
            .field("id", &self.id)
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Person {
        name: &'static str,
        age: u32,
    }

    #[test]
    fn header_falls_back_to_id() {
        let age = ColumnDef::new("age", |p: &Person| p.age.to_string());
        assert_eq!(age.header(), "age");

        let name = ColumnDef::new("name", |p: &Person| p.name.to_string()).with_header("Name");
        assert_eq!(name.header(), "Name");
        assert_eq!(name.id(), "name");
    }

    #[test]
    fn value_uses_the_accessor() {
        let age = ColumnDef::new("age", |p: &Person| p.age.to_string());
        let bob = Person { name: "Bob", age: 42 };
        assert_eq!(age.value(&bob), "42");
    }
}
