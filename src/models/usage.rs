/// One row of the usage aggregate: an identifier and how often it occurred
/// within the query window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UsageRecord {
    pub identifier: i64,
    pub count: i64,
}

impl UsageRecord {
    pub fn new(identifier: i64, count: i64) -> Self {
        Self { identifier, count }
    }
}

impl From<(i64, i64)> for UsageRecord {
    fn from((identifier, count): (i64, i64)) -> Self {
        Self::new(identifier, count)
    }
}
