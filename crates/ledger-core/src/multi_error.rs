//! Aggregate error for batch operations that can fail in more than one place at once.

use std::fmt;

/// An ordered collection of failures reported by a single batch operation.
///
/// The rendering is deterministic: a header with the number of failures,
/// followed by one line per failure in the order they were collected.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiError<E> {
    errors: Vec<E>,
}

impl<E> MultiError<E> {
    pub fn new(errors: Vec<E>) -> Self {
        Self { errors }
    }

    /// Merge the per-row results and the call-level error of a batch operation.
    ///
    /// The call-level error comes first, followed by the per-row failures in their
    /// original order. Successful rows (`None`) are skipped. Returns `None` when
    /// nothing failed.
    pub fn merge<I>(per_row: I, overall: Option<E>) -> Option<Self>
    where
        I: IntoIterator<Item = Option<E>>,
    {
        let mut errors: Vec<E> = overall.into_iter().collect();
        errors.extend(per_row.into_iter().flatten());

        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.errors.iter()
    }

    pub fn into_inner(self) -> Vec<E> {
        self.errors
    }
}

impl<E: fmt::Display> fmt::Display for MultiError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "multiple errors ({}):", self.errors.len())?;
        for err in &self.errors {
            write!(f, "\n{err}")?;
        }
        Ok(())
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for MultiError<E> {}

impl<'a, E> IntoIterator for &'a MultiError<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
