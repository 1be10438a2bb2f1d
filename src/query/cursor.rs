use bson::Document as BsonDocument;

/// Materialized result set of a `find`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cursor {
    docs: Vec<BsonDocument>,
    pos: usize,
}

impl Cursor {
    #[must_use]
    pub const fn new(docs: Vec<BsonDocument>) -> Self {
        Self { docs, pos: 0 }
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Total number of records in the result set, regardless of position.
    #[must_use]
    pub fn total(&self) -> usize {
        self.docs.len()
    }

    pub fn advance(&mut self) -> Option<BsonDocument> {
        let d = self.docs.get(self.pos).cloned()?;
        self.pos += 1;
        Some(d)
    }

    #[must_use]
    pub fn to_vec(mut self) -> Vec<BsonDocument> {
        if self.pos == 0 {
            return self.docs;
        }
        self.docs.split_off(self.pos.min(self.docs.len()))
    }
}

impl Iterator for Cursor {
    type Item = BsonDocument;
    fn next(&mut self) -> Option<Self::Item> {
        self.advance()
    }
}
