//! Joining several deferred results into one.

use std::{
    convert::Infallible,
    sync::{Arc, Mutex, PoisonError},
};

use crate::deferred::DeferredResult;

/// Fulfils with every value, in input order, once all inputs fulfil. Rejects with the first
/// rejection observed. An empty input fulfils immediately with an empty vector.
pub fn all<T, E, I>(items: I) -> DeferredResult<Vec<T>, E>
where
    I: IntoIterator<Item = DeferredResult<T, E>>,
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    let items: Vec<_> = items.into_iter().collect();
    if items.is_empty() {
        return DeferredResult::fulfilled(vec![]);
    }
    let (joined, resolver) = DeferredResult::pending();
    let slots = Arc::new(Mutex::new(Slots::new(items.len())));
    for (index, item) in items.into_iter().enumerate() {
        let slots = slots.clone();
        let resolver = resolver.share();
        item.on_settled(move |outcome| match outcome {
            Ok(value) => {
                let values = slots
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .fill(index, value);
                if let Some(values) = values {
                    resolver.resolve(values);
                }
            }
            Err(error) => {
                resolver.reject(error);
            }
        });
    }
    joined
}

/// Fulfils with every outcome, in input order, once all inputs settle. Never rejects.
pub fn all_settled<T, E, I>(items: I) -> DeferredResult<Vec<Result<T, E>>, Infallible>
where
    I: IntoIterator<Item = DeferredResult<T, E>>,
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    let items: Vec<_> = items.into_iter().collect();
    if items.is_empty() {
        return DeferredResult::fulfilled(vec![]);
    }
    let (joined, resolver) = DeferredResult::pending();
    let slots = Arc::new(Mutex::new(Slots::new(items.len())));
    for (index, item) in items.into_iter().enumerate() {
        let slots = slots.clone();
        let resolver = resolver.share();
        item.on_settled(move |outcome| {
            let outcomes = slots
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .fill(index, outcome);
            if let Some(outcomes) = outcomes {
                resolver.resolve(outcomes);
            }
        });
    }
    joined
}

/// Settles like the first input to settle. With no inputs the result stays pending forever.
pub fn race<T, E, I>(items: I) -> DeferredResult<T, E>
where
    I: IntoIterator<Item = DeferredResult<T, E>>,
    T: Clone + Send + 'static,
    E: Clone + Send + 'static,
{
    let (winner, resolver) = DeferredResult::pending();
    for item in items {
        let resolver = resolver.share();
        item.on_settled(move |outcome| {
            resolver.settle(outcome);
        });
    }
    winner
}

struct Slots<T> {
    values: Vec<Option<T>>,
    remaining: usize,
}

impl<T> Slots<T> {
    fn new(len: usize) -> Self {
        Self {
            values: (0..len).map(|_| None).collect(),
            remaining: len,
        }
    }

    /// Store a value; returns every value once the last slot is filled
    fn fill(&mut self, index: usize, value: T) -> Option<Vec<T>> {
        if self.values[index].replace(value).is_none() {
            self.remaining -= 1;
        }
        if self.remaining > 0 {
            return None;
        }
        self.values.iter_mut().map(Option::take).collect()
    }
}
