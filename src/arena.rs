use std::{marker::PhantomData, ops::Index};

use serde::{Deserialize, Serialize};

/// An append-only collection of values with stable, ordered,
/// index-based ids. Ids handed out by [`Arena::push`] remain valid for
/// the lifetime of the arena and compare by position, which gives
/// catalog entries a cheap identity independent of their contents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arena<Id: IdLike, T> {
    inner: Vec<T>,
    #[serde(skip)]
    _phantom: PhantomData<Id>,
}

impl<Id: IdLike, T> Arena<Id, T> {
    pub fn new() -> Self {
        Self {
            inner: Vec::new(),
            _phantom: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn push(&mut self, x: T) -> Id {
        let id = Id::from_raw(self.inner.len());
        self.inner.push(x);
        id
    }

    pub fn get(&self, id: Id) -> Option<&T> {
        self.inner.get(id.into_raw())
    }

    pub fn contains(&self, id: Id) -> bool {
        id.into_raw() < self.inner.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Id, &T)> {
        self.inner
            .iter()
            .enumerate()
            .map(|(i, v)| (Id::from_raw(i), v))
    }
}

impl<Id: IdLike, T> Default for Arena<Id, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Id: IdLike, T> Index<Id> for Arena<Id, T> {
    type Output = T;

    fn index(&self, index: Id) -> &Self::Output {
        &self.inner[index.into_raw()]
    }
}

pub trait IdLike: Copy + Eq {
    fn from_raw(index: usize) -> Self;
    fn into_raw(self) -> usize;
}
