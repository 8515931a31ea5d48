//! Tree walks shared by the engine: depth-first for construction,
//! breadth-first for lookup, and a pre-order iterator for whole-tree queries.

use std::collections::VecDeque;

use tracing::instrument;

/// A tree element that owns an ordered sequence of children.
pub trait Branching: Sized {
    fn branches(&self) -> &[Self];
    fn branches_mut(&mut self) -> &mut [Self];
}

/// Pre-order, left-to-right recursive walk.
///
/// `visit` runs on a node before any of its children and may rewrite them;
/// the walk then descends into whatever children the node holds after the
/// visit. An error from `visit` aborts the walk.
///
/// `stop` is checked after each visit. Once it holds, every sibling loop that
/// is still running ends before its next child; ancestors' loops included.
#[instrument(level = "trace", skip_all)]
pub fn depth_first<T, E, F>(
    root: &mut T,
    mut visit: F,
    stop: Option<&dyn Fn(&T) -> bool>,
) -> Result<(), E>
where
    T: Branching,
    F: FnMut(&mut T) -> Result<(), E>,
{
    let mut stopped = false;
    recurse(root, &mut visit, stop, &mut stopped)
}

fn recurse<T, E, F>(
    current: &mut T,
    visit: &mut F,
    stop: Option<&dyn Fn(&T) -> bool>,
    stopped: &mut bool,
) -> Result<(), E>
where
    T: Branching,
    F: FnMut(&mut T) -> Result<(), E>,
{
    visit(current)?;

    if let Some(stop) = stop {
        if stop(current) {
            *stopped = true;
        }
    }

    for child in current.branches_mut() {
        if *stopped {
            break;
        }
        recurse(child, visit, stop, stopped)?;
    }
    Ok(())
}

/// Level-order walk with a FIFO queue.
///
/// Returns `map` of the first node satisfying `matches`, or `None` once the
/// queue drains.
#[instrument(level = "trace", skip_all)]
pub fn breadth_first<'a, T, R, M, P>(root: &'a T, mut map: M, mut matches: P) -> Option<R>
where
    T: Branching,
    M: FnMut(&'a T) -> R,
    P: FnMut(&T) -> bool,
{
    let mut queue = VecDeque::from([root]);

    while let Some(current) = queue.pop_front() {
        let value = map(current);
        if matches(current) {
            return Some(value);
        }
        queue.extend(current.branches());
    }
    None
}

/// Level-order search yielding the first match mutably.
#[instrument(level = "trace", skip_all)]
pub fn breadth_first_mut<'a, T, P>(root: &'a mut T, mut matches: P) -> Option<&'a mut T>
where
    T: Branching,
    P: FnMut(&T) -> bool,
{
    let mut queue: VecDeque<&'a mut T> = VecDeque::from([root]);

    while let Some(current) = queue.pop_front() {
        if matches(current) {
            return Some(current);
        }
        queue.extend(current.branches_mut().iter_mut());
    }
    None
}

/// Level of the first node satisfying `matches` in level order, the root
/// being level 1.
#[instrument(level = "trace", skip_all)]
pub fn level_of<T, P>(root: &T, mut matches: P) -> Option<usize>
where
    T: Branching,
    P: FnMut(&T) -> bool,
{
    let mut queue = VecDeque::from([(root, 1)]);

    while let Some((current, level)) = queue.pop_front() {
        if matches(current) {
            return Some(level);
        }
        queue.extend(current.branches().iter().map(|child| (child, level + 1)));
    }
    None
}

/// Stack based pre-order iterator.
pub struct PreOrder<'a, T> {
    stack: Vec<&'a T>,
}

impl<'a, T: Branching> PreOrder<'a, T> {
    pub fn new(root: &'a T) -> Self {
        Self { stack: vec![root] }
    }
}

impl<'a, T: Branching> Iterator for PreOrder<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        // Push children in reverse order for left-to-right traversal
        for child in current.branches().iter().rev() {
            self.stack.push(child);
        }
        Some(current)
    }
}
