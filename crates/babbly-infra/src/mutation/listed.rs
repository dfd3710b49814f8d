//! Edits applied to cached list pages.

use babbly_core::domain::{Comment, Page, Post};

/// A list item the optimistic helpers can find by id.
pub trait Listed: Clone {
    fn id(&self) -> &str;
}

impl Listed for Post {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Listed for Comment {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Insert at the head, bumping `total`.
pub(crate) fn prepend<T: Listed>(page: &Page<T>, item: T) -> Page<T> {
    let mut next = page.clone();
    next.items.insert(0, item);
    next.total = next.total.map(|t| t + 1);
    next
}

/// Swap the item with `id` for `item`. `None` when it is not on the page.
pub(crate) fn replace<T: Listed>(page: &Page<T>, id: &str, item: T) -> Option<Page<T>> {
    update(page, id, |slot| *slot = item.clone())
}

pub(crate) fn update<T, F>(page: &Page<T>, id: &str, edit: F) -> Option<Page<T>>
where
    T: Listed,
    F: FnOnce(&mut T),
{
    let index = page.items.iter().position(|i| i.id() == id)?;
    let mut next = page.clone();
    edit(&mut next.items[index]);
    Some(next)
}

/// Drop the item with `id`, lowering `total`.
pub(crate) fn remove<T: Listed>(page: &Page<T>, id: &str) -> Option<Page<T>> {
    let index = page.items.iter().position(|i| i.id() == id)?;
    let mut next = page.clone();
    next.items.remove(index);
    next.total = next.total.map(|t| t.saturating_sub(1));
    Some(next)
}

/// Drop the item with `id` from whichever page holds it. Every page
/// carries the list total, so pages without the item still shrink it.
pub(crate) fn remove_from_list<T: Listed>(page: &Page<T>, id: &str) -> Option<Page<T>> {
    remove(page, id).or_else(|| {
        let total = page.total?;
        let mut next = page.clone();
        next.total = Some(total.saturating_sub(1));
        Some(next)
    })
}

pub(crate) fn find<'a, T: Listed>(page: &'a Page<T>, id: &str) -> Option<&'a T> {
    page.items.iter().find(|i| i.id() == id)
}

/// Undo [`remove_from_list`]: put the item back where `before` had it and
/// raise `total` again.
pub(crate) fn restore_removed<T: Listed>(before: &Page<T>, current: &Page<T>, id: &str) -> Option<Page<T>> {
    if find(current, id).is_some() {
        return None;
    }
    let mut next = current.clone();
    if let Some(index) = before.items.iter().position(|i| i.id() == id) {
        next.items
            .insert(index.min(next.items.len()), before.items[index].clone());
    }
    next.total = next.total.map(|t| t + 1);
    Some(next)
}
