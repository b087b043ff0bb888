//! Splits an id space into bounded-size buckets for bulk submission.

use ledger_core::DatagenError;
use std::ops::Range;

/// Contiguous half-open ranges covering `[0, total)`.
///
/// Every bucket holds `bucket_size` indices except possibly the last, which is
/// clipped to `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketPlan {
    total: i64,
    bucket_size: i64,
}

impl BucketPlan {
    /// Plan buckets of `bucket_size` over `[0, total)`.
    pub fn new(total: i64, bucket_size: i64) -> Result<Self, DatagenError> {
        if bucket_size <= 0 {
            return Err(DatagenError::InvalidArgument(format!(
                "bucket size must be positive, got {bucket_size}"
            )));
        }
        if total < 0 {
            return Err(DatagenError::InvalidArgument(format!(
                "bucket total must not be negative, got {total}"
            )));
        }
        Ok(Self { total, bucket_size })
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn bucket_size(&self) -> i64 {
        self.bucket_size
    }

    /// Number of buckets in the plan.
    pub fn len(&self) -> usize {
        let full = self.total / self.bucket_size;
        let partial = i64::from(self.total % self.bucket_size != 0);
        (full + partial) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn iter(&self) -> Buckets {
        Buckets {
            next_start: 0,
            total: self.total,
            bucket_size: self.bucket_size,
        }
    }
}

impl IntoIterator for BucketPlan {
    type Item = Range<i64>;
    type IntoIter = Buckets;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the buckets of a [`BucketPlan`], in increasing order.
#[derive(Debug, Clone)]
pub struct Buckets {
    next_start: i64,
    total: i64,
    bucket_size: i64,
}

impl Iterator for Buckets {
    type Item = Range<i64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_start >= self.total {
            return None;
        }

        let start = self.next_start;
        let end = start.saturating_add(self.bucket_size).min(self.total);
        self.next_start = end;

        Some(start..end)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.next_start;
        let count = if remaining <= 0 {
            0
        } else {
            (remaining / self.bucket_size + i64::from(remaining % self.bucket_size != 0)) as usize
        };
        (count, Some(count))
    }
}

impl ExactSizeIterator for Buckets {}
