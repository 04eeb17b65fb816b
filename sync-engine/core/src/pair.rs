/// The two sides of a diff.
///
/// `previous` is the schema as it is (the target database), `next` is the
/// schema as it should become (the source database). Swapping the sides
/// yields the revert direction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pair<T> {
    pub previous: T,
    pub next: T,
}

impl<T> Pair<T> {
    pub fn new(previous: T, next: T) -> Self {
        Pair { previous, next }
    }

    pub fn as_ref(&self) -> Pair<&T> {
        Pair {
            previous: &self.previous,
            next: &self.next,
        }
    }

    pub fn as_tuple(&self) -> (&T, &T) {
        (&self.previous, &self.next)
    }

    pub fn into_tuple(self) -> (T, T) {
        (self.previous, self.next)
    }

    pub fn map<U>(self, f: impl Fn(T) -> U) -> Pair<U> {
        Pair {
            previous: f(self.previous),
            next: f(self.next),
        }
    }

    pub fn previous(&self) -> &T {
        &self.previous
    }

    pub fn next(&self) -> &T {
        &self.next
    }
}

impl<T> Pair<Option<T>> {
    pub fn transpose(self) -> Option<Pair<T>> {
        match (self.previous, self.next) {
            (Some(previous), Some(next)) => Some(Pair { previous, next }),
            _ => None,
        }
    }
}

impl<T> From<(T, T)> for Pair<T> {
    fn from((previous, next): (T, T)) -> Self {
        Pair { previous, next }
    }
}
