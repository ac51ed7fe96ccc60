/// Outcome of one resolution strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
}

impl<T> Lookup<T> {
    /// Try `next` only when this strategy found nothing.
    pub fn or_else(self, next: impl FnOnce() -> Lookup<T>) -> Lookup<T> {
        match self {
            Lookup::Found(value) => Lookup::Found(value),
            Lookup::NotFound => next(),
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Lookup::Found(value),
            None => Lookup::NotFound,
        }
    }
}

/// Run `strategies` in order, returning the first hit.
pub fn first_found<T, C, F>(context: &C, strategies: &[F]) -> Lookup<T>
where
    C: ?Sized,
    F: Fn(&C) -> Lookup<T>,
{
    for strategy in strategies {
        if let Lookup::Found(value) = strategy(context) {
            return Lookup::Found(value);
        }
    }
    Lookup::NotFound
}
