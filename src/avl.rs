//! Order-statistic AVL tree over the node arena, backing the liquidation
//! queue.
//!
//! Every branch caches the height and total collateral of both children, so
//! the queue can be cut by a prefix collateral sum (`split`) or stitched
//! back together (`join`) in logarithmic time. Nodes carry parent
//! back-handles; parent links are handle-valued and never owning.
//!
//! Mutating operations keep three invariants on every exit path:
//! - balance: `|left_height - right_height| <= 1` at every branch;
//! - aggregates: each branch's cached side height/collateral equals the
//!   recomputed value of the referenced child, and each child's parent link
//!   points back at its actual parent;
//! - reachability: the handles reachable from the declared roots are exactly
//!   the arena's live handles.

use std::collections::BTreeSet;

use crate::arena::{Arena, Handle};
use crate::tez::Tez;

// ============================================================================
// Items and nodes
// ============================================================================

/// A queue entry: totally ordered by `id`, weighted by `collateral`.
/// The payload is opaque to the tree; no ordering on it is required.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item<P> {
    pub id: i64,
    pub payload: P,
    pub collateral: Tez,
}

/// Interior node. `key` is the id of the minimum element of the right
/// subtree at the time the branch was formed; lookups steer left on
/// `id < key` and right on `id >= key`. Deletions and rotations keep `key`
/// a valid separator (`max(left) < key <= min(right)`) without updating it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Branch {
    pub left: Handle,
    pub left_height: u32,
    pub left_tez: Tez,
    pub key: i64,
    pub right_tez: Tez,
    pub right_height: u32,
    pub right: Handle,
    pub parent: Option<Handle>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node<P> {
    Leaf { item: Item<P>, parent: Option<Handle> },
    Branch(Branch),
}

// ============================================================================
// Aggregate readers
// ============================================================================

/// Height of the subtree rooted at `h`. Leaves have height 1.
pub fn height<P>(arena: &Arena<Node<P>>, h: Handle) -> u32 {
    match arena.get(h) {
        Node::Leaf { .. } => 1,
        Node::Branch(b) => 1 + b.left_height.max(b.right_height),
    }
}

/// Total collateral of the subtree rooted at `h`.
pub fn collateral<P>(arena: &Arena<Node<P>>, h: Handle) -> Tez {
    match arena.get(h) {
        Node::Leaf { item, .. } => item.collateral,
        Node::Branch(b) => b.left_tez + b.right_tez,
    }
}

fn parent_of<P>(arena: &Arena<Node<P>>, h: Handle) -> Option<Handle> {
    match arena.get(h) {
        Node::Leaf { parent, .. } => *parent,
        Node::Branch(b) => b.parent,
    }
}

fn set_parent<P>(arena: &mut Arena<Node<P>>, h: Handle, parent: Option<Handle>) {
    match arena.get_mut(h) {
        Node::Leaf { parent: p, .. } => *p = parent,
        Node::Branch(b) => b.parent = parent,
    }
}

fn as_branch<P>(arena: &Arena<Node<P>>, h: Handle) -> &Branch {
    match arena.get(h) {
        Node::Branch(b) => b,
        Node::Leaf { .. } => panic!("expected a branch at {:?}", h),
    }
}

fn as_branch_mut<P>(arena: &mut Arena<Node<P>>, h: Handle) -> &mut Branch {
    match arena.get_mut(h) {
        Node::Branch(b) => b,
        Node::Leaf { .. } => panic!("expected a branch at {:?}", h),
    }
}

/// Recompute a branch's cached side aggregates from its actual children.
fn sync_branch<P>(arena: &mut Arena<Node<P>>, h: Handle) {
    let (left, right) = {
        let b = as_branch(arena, h);
        (b.left, b.right)
    };
    let lh = height(arena, left);
    let lt = collateral(arena, left);
    let rh = height(arena, right);
    let rt = collateral(arena, right);
    let b = as_branch_mut(arena, h);
    b.left_height = lh;
    b.left_tez = lt;
    b.right_height = rh;
    b.right_tez = rt;
}

/// Point `parent`'s child slot at `child` (left or right side), fix the
/// child's back-link, and refresh the parent's aggregates.
fn attach<P>(arena: &mut Arena<Node<P>>, parent: Handle, child: Handle, left_side: bool) {
    {
        let b = as_branch_mut(arena, parent);
        if left_side {
            b.left = child;
        } else {
            b.right = child;
        }
    }
    set_parent(arena, child, Some(parent));
    sync_branch(arena, parent);
}

// ============================================================================
// Rotations and balancing
// ============================================================================

/// Standard single right rotation. `h` and its left child must both be
/// branches. Returns the new subtree root (the former left child), wired to
/// `h`'s former parent. The caller re-attaches the returned handle into the
/// grandparent.
fn rotate_right<P>(arena: &mut Arena<Node<P>>, h: Handle) -> Handle {
    let old_parent = parent_of(arena, h);
    let l = as_branch(arena, h).left;
    let lr = as_branch(arena, l).right;

    attach(arena, h, lr, true);
    attach(arena, l, h, false);
    set_parent(arena, l, old_parent);
    l
}

/// Standard single left rotation, mirror of [`rotate_right`].
fn rotate_left<P>(arena: &mut Arena<Node<P>>, h: Handle) -> Handle {
    let old_parent = parent_of(arena, h);
    let r = as_branch(arena, h).right;
    let rl = as_branch(arena, r).left;

    attach(arena, h, rl, false);
    attach(arena, r, h, true);
    set_parent(arena, r, old_parent);
    r
}

/// Restore the balance invariant at `h` after a single add/del/join step.
/// The height difference is at most 2 here; on return it is at most 1.
fn balance<P>(arena: &mut Arena<Node<P>>, h: Handle) -> Handle {
    let (lh, rh, left, right) = match arena.get(h) {
        Node::Leaf { .. } => return h,
        Node::Branch(b) => (b.left_height, b.right_height, b.left, b.right),
    };
    debug_assert!(lh.abs_diff(rh) <= 2, "balance precondition violated");
    if lh > rh + 1 {
        // A child two levels taller is necessarily a branch.
        let lb = as_branch(arena, left);
        if lb.right_height > lb.left_height {
            let nl = rotate_left(arena, left);
            attach(arena, h, nl, true);
        }
        rotate_right(arena, h)
    } else if rh > lh + 1 {
        let rb = as_branch(arena, right);
        if rb.left_height > rb.right_height {
            let nr = rotate_right(arena, right);
            attach(arena, h, nr, false);
        }
        rotate_left(arena, h)
    } else {
        h
    }
}

// ============================================================================
// Insertion
// ============================================================================

/// Insert `item` into the tree rooted at `root`, returning the new root.
/// Inserting an id that is already present overwrites that leaf's payload
/// and collateral in place.
pub fn add<P>(arena: &mut Arena<Node<P>>, root: Option<Handle>, item: Item<P>) -> Handle {
    match root {
        None => arena.alloc(Node::Leaf { item, parent: None }),
        Some(h) => insert_at(arena, h, item),
    }
}

enum InsertProbe {
    Overwrite(Option<Handle>),
    SplitLeaf { leaf_id: i64, parent: Option<Handle> },
    Recurse { child: Handle, left_side: bool },
}

fn insert_at<P>(arena: &mut Arena<Node<P>>, h: Handle, item: Item<P>) -> Handle {
    let probe = match arena.get(h) {
        Node::Leaf { item: existing, parent } => {
            if existing.id == item.id {
                InsertProbe::Overwrite(*parent)
            } else {
                InsertProbe::SplitLeaf { leaf_id: existing.id, parent: *parent }
            }
        }
        Node::Branch(b) => {
            let left_side = item.id < b.key;
            InsertProbe::Recurse { child: if left_side { b.left } else { b.right }, left_side }
        }
    };
    match probe {
        InsertProbe::Overwrite(parent) => {
            arena.set(h, Node::Leaf { item, parent });
            h
        }
        InsertProbe::SplitLeaf { leaf_id, parent } => {
            let new_id = item.id;
            let new_h = arena.alloc(Node::Leaf { item, parent: None });
            // Smaller id to the left; the branch key is the larger id, which
            // is exactly the minimum of the new right subtree.
            let (left, right, key) =
                if new_id < leaf_id { (new_h, h, leaf_id) } else { (h, new_h, new_id) };
            let branch_h = arena.alloc(Node::Branch(Branch {
                left,
                left_height: 1,
                left_tez: collateral(arena, left),
                key,
                right_tez: collateral(arena, right),
                right_height: 1,
                right,
                parent,
            }));
            set_parent(arena, left, Some(branch_h));
            set_parent(arena, right, Some(branch_h));
            branch_h
        }
        InsertProbe::Recurse { child, left_side } => {
            let new_child = insert_at(arena, child, item);
            attach(arena, h, new_child, left_side);
            balance(arena, h)
        }
    }
}

// ============================================================================
// Deletion
// ============================================================================

/// Delete the item with the given `id`, returning the new root (`None` when
/// the tree becomes empty). Deleting an absent id is a no-op.
pub fn del<P>(arena: &mut Arena<Node<P>>, root: Option<Handle>, id: i64) -> Option<Handle> {
    match root {
        None => None,
        Some(h) => delete_at(arena, h, id),
    }
}

enum DeleteProbe {
    Hit,
    Miss,
    Recurse { child: Handle, other: Handle, left_side: bool },
}

fn delete_at<P>(arena: &mut Arena<Node<P>>, h: Handle, id: i64) -> Option<Handle> {
    let probe = match arena.get(h) {
        Node::Leaf { item, .. } => {
            if item.id == id {
                DeleteProbe::Hit
            } else {
                DeleteProbe::Miss
            }
        }
        Node::Branch(b) => {
            let left_side = id < b.key;
            DeleteProbe::Recurse {
                child: if left_side { b.left } else { b.right },
                other: if left_side { b.right } else { b.left },
                left_side,
            }
        }
    };
    match probe {
        DeleteProbe::Hit => {
            arena.del(h);
            None
        }
        DeleteProbe::Miss => Some(h),
        DeleteProbe::Recurse { child, other, left_side } => {
            match delete_at(arena, child, id) {
                None => {
                    // The emptied side's sibling is promoted into the
                    // branch's place.
                    let parent = parent_of(arena, h);
                    set_parent(arena, other, parent);
                    arena.del(h);
                    Some(other)
                }
                Some(new_child) => {
                    attach(arena, h, new_child, left_side);
                    Some(balance(arena, h))
                }
            }
        }
    }
}

// ============================================================================
// Extrema and listing
// ============================================================================

/// Leftmost item of a non-empty subtree.
pub fn min<P>(arena: &Arena<Node<P>>, h: Handle) -> &Item<P> {
    match arena.get(h) {
        Node::Leaf { item, .. } => item,
        Node::Branch(b) => min(arena, b.left),
    }
}

/// Rightmost item of a non-empty subtree.
pub fn max<P>(arena: &Arena<Node<P>>, h: Handle) -> &Item<P> {
    match arena.get(h) {
        Node::Leaf { item, .. } => item,
        Node::Branch(b) => max(arena, b.right),
    }
}

/// In-order listing: strictly increasing by id.
pub fn to_list<P: Clone>(arena: &Arena<Node<P>>, root: Option<Handle>) -> Vec<Item<P>> {
    let mut out = Vec::new();
    if let Some(h) = root {
        walk(arena, h, &mut out);
    }
    out
}

fn walk<P: Clone>(arena: &Arena<Node<P>>, h: Handle, out: &mut Vec<Item<P>>) {
    match arena.get(h) {
        Node::Leaf { item, .. } => out.push(item.clone()),
        Node::Branch(b) => {
            walk(arena, b.left, out);
            walk(arena, b.right, out);
        }
    }
}

// ============================================================================
// Join and split
// ============================================================================

/// Concatenate two trees. Requires `max(left).id < min(right).id`.
pub fn join<P>(arena: &mut Arena<Node<P>>, left: Handle, right: Handle) -> Handle {
    debug_assert!(
        max(arena, left).id < min(arena, right).id,
        "join requires disjoint, ordered trees"
    );
    join_rec(arena, left, right)
}

fn join_rec<P>(arena: &mut Arena<Node<P>>, left: Handle, right: Handle) -> Handle {
    let lh = height(arena, left);
    let rh = height(arena, right);
    if lh.abs_diff(rh) < 2 {
        let key = min(arena, right).id;
        let branch_h = arena.alloc(Node::Branch(Branch {
            left,
            left_height: lh,
            left_tez: collateral(arena, left),
            key,
            right_tez: collateral(arena, right),
            right_height: rh,
            right,
            parent: None,
        }));
        set_parent(arena, left, Some(branch_h));
        set_parent(arena, right, Some(branch_h));
        branch_h
    } else if lh > rh {
        let inner = as_branch(arena, left).right;
        let joined = join_rec(arena, inner, right);
        attach(arena, left, joined, false);
        balance(arena, left)
    } else {
        let inner = as_branch(arena, right).left;
        let joined = join_rec(arena, left, inner);
        attach(arena, right, joined, true);
        balance(arena, right)
    }
}

enum SplitProbe {
    Leaf(Tez),
    Br { left: Handle, right: Handle, left_tez: Tez, total: Tez },
}

/// Cut the longest in-order prefix whose total collateral does not exceed
/// `limit`. Returns `(prefix, remainder)`; both roots are orphaned and the
/// arena is left without dangling handles.
pub fn split<P>(
    arena: &mut Arena<Node<P>>,
    root: Option<Handle>,
    limit: Tez,
) -> (Option<Handle>, Option<Handle>) {
    let h = match root {
        None => return (None, None),
        Some(h) => h,
    };
    let probe = match arena.get(h) {
        Node::Leaf { item, .. } => SplitProbe::Leaf(item.collateral),
        Node::Branch(b) => SplitProbe::Br {
            left: b.left,
            right: b.right,
            left_tez: b.left_tez,
            total: b.left_tez + b.right_tez,
        },
    };
    match probe {
        SplitProbe::Leaf(c) => {
            set_parent(arena, h, None);
            if c <= limit {
                (Some(h), None)
            } else {
                (None, Some(h))
            }
        }
        SplitProbe::Br { left, right, left_tez, total } => {
            if total <= limit {
                set_parent(arena, h, None);
                (Some(h), None)
            } else if left_tez == limit {
                set_parent(arena, left, None);
                set_parent(arena, right, None);
                arena.del(h);
                (Some(left), Some(right))
            } else if limit < left_tez {
                let (prefix, rest) = split(arena, Some(left), limit);
                let rest = match rest {
                    Some(r) => r,
                    // The left subtree alone exceeds the limit, so cutting
                    // it must leave a remainder.
                    None => unreachable!("split of an over-limit subtree left no remainder"),
                };
                set_parent(arena, right, None);
                arena.del(h);
                let joined = join_rec(arena, rest, right);
                (prefix, Some(joined))
            } else {
                // left_tez < limit < total: the cut lands in the right
                // subtree, with the whole left subtree in the prefix.
                let (prefix, rest) = split(arena, Some(right), limit - left_tez);
                set_parent(arena, left, None);
                arena.del(h);
                match prefix {
                    Some(p) => (Some(join_rec(arena, left, p)), rest),
                    None => (Some(left), rest),
                }
            }
        }
    }
}

// ============================================================================
// Debug surface: invariant audits
// ============================================================================

/// Walk the whole tree and abort on any violation of the balance, aggregate,
/// parent-link, or ordering invariants. Test/debug use.
pub fn assert_invariants<P>(arena: &Arena<Node<P>>, root: Option<Handle>) {
    if let Some(h) = root {
        assert!(parent_of(arena, h).is_none(), "root {:?} must not have a parent", h);
        check_subtree(arena, h);
    }
}

/// Returns (height, collateral, min id, max id) while checking the subtree.
fn check_subtree<P>(arena: &Arena<Node<P>>, h: Handle) -> (u32, Tez, i64, i64) {
    match arena.get(h) {
        Node::Leaf { item, .. } => (1, item.collateral, item.id, item.id),
        Node::Branch(b) => {
            let (lh, lt, lmin, lmax) = check_subtree(arena, b.left);
            let (rh, rt, rmin, rmax) = check_subtree(arena, b.right);
            assert_eq!(b.left_height, lh, "stale left height at {:?}", h);
            assert_eq!(b.right_height, rh, "stale right height at {:?}", h);
            assert_eq!(b.left_tez, lt, "stale left collateral at {:?}", h);
            assert_eq!(b.right_tez, rt, "stale right collateral at {:?}", h);
            assert!(lh.abs_diff(rh) <= 1, "unbalanced branch at {:?}", h);
            assert_eq!(parent_of(arena, b.left), Some(h), "broken parent link at {:?}", b.left);
            assert_eq!(parent_of(arena, b.right), Some(h), "broken parent link at {:?}", b.right);
            assert!(lmax < b.key && b.key <= rmin, "key is not a separator at {:?}", h);
            (1 + lh.max(rh), lt + rt, lmin, rmax)
        }
    }
}

/// Abort unless the handles reachable from `roots` are exactly the arena's
/// live handles. Test/debug use.
pub fn assert_no_dangling<P>(arena: &Arena<Node<P>>, roots: &[Option<Handle>]) {
    let mut reachable = BTreeSet::new();
    for root in roots.iter().flatten() {
        collect(arena, *root, &mut reachable);
    }
    let live: BTreeSet<Handle> = arena.handles().collect();
    assert_eq!(reachable, live, "arena and reachable handle sets differ");
}

fn collect<P>(arena: &Arena<Node<P>>, h: Handle, out: &mut BTreeSet<Handle>) {
    assert!(out.insert(h), "handle {:?} reachable twice", h);
    if let Node::Branch(b) = arena.get(h) {
        collect(arena, b.left, out);
        collect(arena, b.right, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: i64, collateral: u64) -> Item<&'static str> {
        Item { id, payload: "burrow", collateral: Tez::of_tez(collateral) }
    }

    fn add_all(
        arena: &mut Arena<Node<&'static str>>,
        items: &[(i64, u64)],
    ) -> Option<Handle> {
        let mut root = None;
        for &(id, c) in items {
            root = Some(add(arena, root, item(id, c)));
            assert_invariants(arena, root);
            assert_no_dangling(arena, &[root]);
        }
        root
    }

    #[test]
    fn empty_tree_lists_nothing() {
        let arena: Arena<Node<&'static str>> = Arena::new();
        assert!(to_list(&arena, None).is_empty());
    }

    #[test]
    fn single_leaf() {
        let mut arena = Arena::new();
        let root = add(&mut arena, None, item(42, 7));
        assert_invariants(&arena, Some(root));
        assert_eq!(min(&arena, root).id, 42);
        assert_eq!(max(&arena, root).id, 42);
        assert_eq!(height(&arena, root), 1);
        assert_eq!(collateral(&arena, root), Tez::of_tez(7));
    }

    #[test]
    fn in_order_regardless_of_insertion_order() {
        let mut arena = Arena::new();
        let root = add_all(&mut arena, &[(5, 1), (1, 1), (9, 1), (3, 1), (7, 1)]);
        let ids: Vec<i64> = to_list(&arena, root).iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 3, 5, 7, 9]);
        assert_eq!(min(&arena, root.unwrap()).id, 1);
        assert_eq!(max(&arena, root.unwrap()).id, 9);
    }

    #[test]
    fn same_id_overwrites_in_place() {
        let mut arena = Arena::new();
        let mut root = add_all(&mut arena, &[(1, 10), (2, 20)]);
        let before = arena.len();
        root = Some(add(
            &mut arena,
            root,
            Item { id: 2, payload: "updated", collateral: Tez::of_tez(99) },
        ));
        assert_eq!(arena.len(), before, "overwrite must not allocate");
        let items = to_list(&arena, root);
        assert_eq!(items[1].payload, "updated");
        assert_eq!(items[1].collateral, Tez::of_tez(99));
        assert_invariants(&arena, root);
    }

    #[test]
    fn deleting_to_empty_frees_the_arena() {
        let mut arena = Arena::new();
        let mut root = add_all(&mut arena, &[(2, 1), (4, 1), (6, 1), (8, 1)]);
        for id in [4, 8, 2, 6] {
            root = del(&mut arena, root, id);
            assert_invariants(&arena, root);
            assert_no_dangling(&arena, &[root]);
        }
        assert!(root.is_none());
        assert!(arena.is_empty());
    }

    #[test]
    fn deleting_absent_id_is_a_noop() {
        let mut arena = Arena::new();
        let root = add_all(&mut arena, &[(1, 1), (2, 1)]);
        let after = del(&mut arena, root, 99);
        assert_eq!(after, root);
        assert_eq!(to_list(&arena, after).len(), 2);
    }

    #[test]
    fn join_concatenates() {
        let mut arena = Arena::new();
        let left = add_all(&mut arena, &[(1, 1), (2, 1), (3, 1)]).unwrap();
        let right = add_all(&mut arena, &[(10, 1), (11, 1)]).unwrap();
        let joined = join(&mut arena, left, right);
        assert_invariants(&arena, Some(joined));
        assert_no_dangling(&arena, &[Some(joined)]);
        let ids: Vec<i64> = to_list(&arena, Some(joined)).iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 10, 11]);
    }

    #[test]
    fn split_cuts_by_prefix_collateral() {
        let mut arena = Arena::new();
        let root = add_all(&mut arena, &[(1, 5), (2, 5), (3, 5), (4, 5)]);
        // Limit lands mid-list: prefix is items 1 and 2.
        let (a, b) = split(&mut arena, root, Tez::of_tez(12));
        assert_invariants(&arena, a);
        assert_invariants(&arena, b);
        assert_no_dangling(&arena, &[a, b]);
        let left_ids: Vec<i64> = to_list(&arena, a).iter().map(|i| i.id).collect();
        let right_ids: Vec<i64> = to_list(&arena, b).iter().map(|i| i.id).collect();
        assert_eq!(left_ids, vec![1, 2]);
        assert_eq!(right_ids, vec![3, 4]);
    }

    #[test]
    fn split_extremes() {
        let mut arena = Arena::new();
        let root = add_all(&mut arena, &[(1, 5), (2, 5)]);
        let (a, b) = split(&mut arena, root, Tez::ZERO);
        assert!(a.is_none());
        let (c, d) = split(&mut arena, b, Tez::of_tez(100));
        assert!(d.is_none());
        assert_eq!(to_list(&arena, c).len(), 2);
        assert_no_dangling(&arena, &[c]);
    }
}
