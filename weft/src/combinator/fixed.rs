use super::node::{Node, Policy, Slot};
use crate::error::Error;
use crate::future::Future;
use crate::runtime::Manager;

/// The first child to settle in a [`race`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Winner<T> {
    /// Position of the child in the input sequence.
    pub index: usize,

    /// What the child settled with.
    pub outcome: Result<T, Error>,
}

/// Races a set of futures.
///
/// The returned future is fulfilled as soon as one child settles, with the
/// child's position and outcome. A rejected child wins like any other:
/// the race itself only rejects if it has no child at all
/// ([`Error::BrokenPromise`]). Later settlements are ignored.
///
/// If several children are already settled, the first one in iteration
/// order wins.
///
/// # Examples
///
/// ```rust,ignore
/// let first = combinator::race(&manager, vec![
///     manager.make_clock(Duration::from_secs(1)),
///     manager.make_clock(Duration::from_secs(2)),
/// ]);
///
/// assert_eq!(manager.run_until(first)?.index, 0);
/// ```
pub fn race<T: 'static>(
    manager: &Manager,
    children: impl IntoIterator<Item = Future<T>>,
) -> Future<Winner<T>> {
    let children: Vec<Future<T>> = children.into_iter().collect();
    let slots: Vec<Slot<T>> = children.iter().map(|_| Slot::new()).collect();

    let (node, parent) = Node::new(manager, Policy::Race, children.len());

    let readers = slots.clone();
    node.on_finish(move |index| {
        let outcome = readers[index].outcome();
        Ok(Winner { index, outcome })
    });

    attach(&node, &slots, children);
    parent
}

/// Waits for every future in a set.
///
/// The returned future is fulfilled with every value, in input order, once
/// all children fulfilled. It is rejected with the first rejection as soon
/// as it happens; the remaining children are not cancelled, their
/// outcomes are dropped when they settle.
pub fn all<T: 'static>(
    manager: &Manager,
    children: impl IntoIterator<Item = Future<T>>,
) -> Future<Vec<T>> {
    let children: Vec<Future<T>> = children.into_iter().collect();
    let slots: Vec<Slot<T>> = children.iter().map(|_| Slot::new()).collect();

    let (node, parent) = Node::new(manager, Policy::All, children.len());

    let readers = slots.clone();
    node.on_finish(move |_| readers.iter().map(Slot::outcome).collect());

    attach(&node, &slots, children);
    parent
}

/// Waits for every future in a set to settle.
///
/// The returned future is fulfilled with one outcome per child, in input
/// order, once every child settled. It never rejects.
pub fn all_settled<T: 'static>(
    manager: &Manager,
    children: impl IntoIterator<Item = Future<T>>,
) -> Future<Vec<Result<T, Error>>> {
    let children: Vec<Future<T>> = children.into_iter().collect();
    let slots: Vec<Slot<T>> = children.iter().map(|_| Slot::new()).collect();

    let (node, parent) = Node::new(manager, Policy::AllSettled, children.len());

    let readers = slots.clone();
    node.on_finish(move |_| Ok(readers.iter().map(Slot::outcome).collect()));

    attach(&node, &slots, children);
    parent
}

fn attach<T: 'static, O: 'static>(
    node: &std::rc::Rc<Node<O>>,
    slots: &[Slot<T>],
    children: Vec<Future<T>>,
) {
    for (index, (slot, child)) in slots.iter().zip(children).enumerate() {
        slot.attach(node, index, child);
    }
}
