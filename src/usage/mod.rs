pub mod buckets;

pub use buckets::{
    build_histogram, build_histogram_skipping, classify, BucketHistogram, UsageCategory,
};
