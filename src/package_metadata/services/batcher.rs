use crate::shared::Result;

/// Batches - slices a fallible iterator into fixed-size chunks
///
/// Pull-based: a batch is only assembled when the caller asks for it, so
/// the caller can await between batches. The last batch may be short.
/// The first error ends the sequence; items collected for the unfinished
/// batch are dropped with it.
pub struct Batches<I> {
    inner: I,
    size: usize,
    done: bool,
}

impl<I, T> Batches<I>
where
    I: Iterator<Item = Result<T>>,
{
    /// Wraps `inner`; a `size` of zero is treated as one
    pub fn new(inner: I, size: usize) -> Self {
        Self {
            inner,
            size: size.max(1),
            done: false,
        }
    }

    /// The wrapped iterator, e.g. to read counters it keeps
    pub fn inner(&self) -> &I {
        &self.inner
    }
}

impl<I, T> Iterator for Batches<I>
where
    I: Iterator<Item = Result<T>>,
{
    type Item = Result<Vec<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut batch = Vec::with_capacity(self.size);
        while batch.len() < self.size {
            match self.inner.next() {
                Some(Ok(item)) => batch.push(item),
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    break;
                }
            }
        }

        if batch.is_empty() {
            None
        } else {
            Some(Ok(batch))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(count: usize) -> impl Iterator<Item = Result<usize>> {
        (0..count).map(Ok)
    }

    #[test]
    fn test_exact_multiple() {
        let batches: Vec<Vec<usize>> = Batches::new(items(4), 2).map(|b| b.unwrap()).collect();
        assert_eq!(batches, vec![vec![0, 1], vec![2, 3]]);
    }

    #[test]
    fn test_short_last_batch() {
        let batches: Vec<Vec<usize>> = Batches::new(items(5), 2).map(|b| b.unwrap()).collect();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[2], vec![4]);
    }

    #[test]
    fn test_empty_input_yields_nothing() {
        assert_eq!(Batches::new(items(0), 200).count(), 0);
    }

    #[test]
    fn test_zero_size_is_one() {
        assert_eq!(Batches::new(items(3), 0).count(), 3);
    }

    #[test]
    fn test_error_ends_sequence() {
        let input = vec![Ok(1), Ok(2), Err(anyhow::anyhow!("boom")), Ok(3)];
        let mut batches = Batches::new(input.into_iter(), 10);

        let first = batches.next().unwrap();
        assert_eq!(first.unwrap_err().to_string(), "boom");
        assert!(batches.next().is_none());
    }

    #[test]
    fn test_pulls_lazily() {
        let mut pulled = 0;
        let counting = std::iter::from_fn(|| {
            pulled += 1;
            Some(Ok::<usize, anyhow::Error>(pulled))
        });
        let mut batches = Batches::new(counting, 3);
        let first = batches.next().unwrap().unwrap();
        assert_eq!(first, vec![1, 2, 3]);
    }
}
