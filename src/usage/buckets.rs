use std::fmt;

use crate::error::InvalidRecordError;
use crate::models::UsageRecord;

/// Smallest count that lands in the open-ended bucket
const OPEN_BUCKET_FLOOR: i64 = 7;

/// Usage-frequency class of an identifier, in export order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UsageCategory {
    Two,
    Three,
    Four,
    Five,
    Six,
    SevenPlus,
}

impl UsageCategory {
    pub const ALL: [UsageCategory; 6] = [
        Self::Two,
        Self::Three,
        Self::Four,
        Self::Five,
        Self::Six,
        Self::SevenPlus,
    ];

    /// Map a usage count to its category, `None` for counts below 2
    pub fn from_count(count: i64) -> Option<Self> {
        match count {
            2 => Some(Self::Two),
            3 => Some(Self::Three),
            4 => Some(Self::Four),
            5 => Some(Self::Five),
            6 => Some(Self::Six),
            c if c >= OPEN_BUCKET_FLOOR => Some(Self::SevenPlus),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Two => "2",
            Self::Three => "3",
            Self::Four => "4",
            Self::Five => "5",
            Self::Six => "6",
            Self::SevenPlus => "7+",
        }
    }
}

impl fmt::Display for UsageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a single record
pub fn classify(record: &UsageRecord) -> Result<UsageCategory, InvalidRecordError> {
    UsageCategory::from_count(record.count).ok_or(InvalidRecordError {
        identifier: record.identifier,
        count: record.count,
    })
}

/// How many identifiers fall into each usage category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketHistogram {
    pub two: u64,
    pub three: u64,
    pub four: u64,
    pub five: u64,
    pub six: u64,
    pub seven_plus: u64,
}

impl BucketHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one record. The histogram is left untouched on error.
    pub fn record(&mut self, record: &UsageRecord) -> Result<UsageCategory, InvalidRecordError> {
        let category = classify(record)?;
        *self.slot_mut(category) += 1;
        Ok(category)
    }

    pub fn get(&self, category: UsageCategory) -> u64 {
        match category {
            UsageCategory::Two => self.two,
            UsageCategory::Three => self.three,
            UsageCategory::Four => self.four,
            UsageCategory::Five => self.five,
            UsageCategory::Six => self.six,
            UsageCategory::SevenPlus => self.seven_plus,
        }
    }

    fn slot_mut(&mut self, category: UsageCategory) -> &mut u64 {
        match category {
            UsageCategory::Two => &mut self.two,
            UsageCategory::Three => &mut self.three,
            UsageCategory::Four => &mut self.four,
            UsageCategory::Five => &mut self.five,
            UsageCategory::Six => &mut self.six,
            UsageCategory::SevenPlus => &mut self.seven_plus,
        }
    }

    /// Sum over all buckets
    pub fn total(&self) -> u64 {
        UsageCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }

    /// Buckets in export order: 2, 3, 4, 5, 6, 7+
    pub fn iter(&self) -> impl Iterator<Item = (UsageCategory, u64)> + '_ {
        UsageCategory::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

/// Build the histogram for a batch, failing on the first out-of-domain count
pub fn build_histogram(records: &[UsageRecord]) -> Result<BucketHistogram, InvalidRecordError> {
    let mut histogram = BucketHistogram::new();
    for record in records {
        histogram.record(record)?;
    }
    Ok(histogram)
}

/// Build the histogram for a batch, setting aside out-of-domain records
pub fn build_histogram_skipping(
    records: &[UsageRecord],
) -> (BucketHistogram, Vec<InvalidRecordError>) {
    let mut histogram = BucketHistogram::new();
    let mut rejected = Vec::new();

    for record in records {
        if let Err(e) = histogram.record(record) {
            rejected.push(e);
        }
    }

    (histogram, rejected)
}
