//! Tree reduction over a directory hierarchy
//!
//! Each node is mapped with `branch` (directories with children) or `leaf`
//! (everything else, empty directories included). Sibling results are folded
//! with `reduce`, which must be associative since listing order is whatever
//! the OS returns, and a directory's own value is combined with its folded
//! children through `merge`.
//!
//! Directories are descended through handles opened relative to their
//! parent. Every such handle is closed before its parent's merge returns,
//! whether the subtree succeeded, failed or was pruned, so descriptor use is
//! bounded by depth, not by tree size. The only cancellation is the
//! `descend_if` predicate.

use crate::error::Result;
use crate::handle::{Handle, OpenFlags};
use crate::metadata::FileKind;
use crate::paths::PosixPath;

/// A node handed to the reduction callbacks
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    path: &'a PosixPath,
    kind: FileKind,
    depth: usize,
    handle: Option<&'a Handle>,
}

impl<'a> Node<'a> {
    /// Traversal root joined with the entry names leading here
    pub fn path(&self) -> &'a PosixPath {
        self.path
    }

    pub fn name(&self) -> Option<&'a str> {
        self.path.basename()
    }

    /// Type after symlink resolution, when links are followed
    pub fn kind(&self) -> FileKind {
        self.kind
    }

    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }

    /// Zero for the traversal root
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The open directory handle while a directory is being visited
    pub fn handle(&self) -> Option<&'a Handle> {
        self.handle
    }
}

struct Callbacks<B, L, M, F, D> {
    branch: B,
    leaf: L,
    merge: M,
    reduce: F,
    descend_if: D,
}

/// Traversal settings
///
/// # Examples
/// ```no_run
/// use handlepath::{PosixPath, TreeReducer};
///
/// let root = PosixPath::parse("/var/log").unwrap();
/// let total_bytes = TreeReducer::new()
///     .max_depth(Some(2))
///     .reduce_path(
///         &root,
///         |_| 0u64,
///         |node| {
///             node.path()
///                 .to_std_path()
///                 .metadata()
///                 .map(|m| m.len())
///                 .unwrap_or(0)
///         },
///         |a, b| a + b,
///         |a, b| a + b,
///         |_| true,
///     )
///     .unwrap();
/// println!("{total_bytes}");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeReducer {
    follow_links: bool,
    max_depth: Option<usize>,
}

impl TreeReducer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descend into symlinks that point at directories
    ///
    /// Loop detection is the caller's job, through `descend_if` or
    /// [`max_depth`](Self::max_depth).
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Treat directories deeper than `depth` as leaves; the root is always
    /// expanded
    pub fn max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    fn within_depth(&self, depth: usize) -> bool {
        self.max_depth.map_or(true, |max| depth <= max)
    }

    /// Reduce the tree under an open handle
    ///
    /// Node paths start from the handle's reflected location.
    pub fn reduce<R, B, L, M, F, D>(
        &self,
        root: &Handle,
        branch: B,
        leaf: L,
        merge: M,
        reduce: F,
        descend_if: D,
    ) -> Result<R>
    where
        B: FnMut(&Node<'_>) -> R,
        L: FnMut(&Node<'_>) -> R,
        M: FnMut(R, R) -> R,
        F: FnMut(R, R) -> R,
        D: FnMut(&Node<'_>) -> bool,
    {
        let path = root.to_path()?;
        let mut callbacks = Callbacks {
            branch,
            leaf,
            merge,
            reduce,
            descend_if,
        };
        self.reduce_root(root, &path, &mut callbacks)
    }

    /// Reduce the tree at `root`, opening it for the duration of the call
    pub fn reduce_path<R, B, L, M, F, D>(
        &self,
        root: &PosixPath,
        branch: B,
        leaf: L,
        merge: M,
        reduce: F,
        descend_if: D,
    ) -> Result<R>
    where
        B: FnMut(&Node<'_>) -> R,
        L: FnMut(&Node<'_>) -> R,
        M: FnMut(R, R) -> R,
        F: FnMut(R, R) -> R,
        D: FnMut(&Node<'_>) -> bool,
    {
        let mut handle = Handle::open(root, OpenFlags::PATH)?;
        let mut callbacks = Callbacks {
            branch,
            leaf,
            merge,
            reduce,
            descend_if,
        };
        let reduced = self.reduce_root(&handle, root, &mut callbacks);
        let closed = handle.close();
        let reduced = reduced?;
        closed?;
        Ok(reduced)
    }

    /// Single mapping function and single associative operator
    pub fn mapreduce<R, G, O, D>(&self, root: &Handle, map: G, op: O, descend_if: D) -> Result<R>
    where
        G: Fn(&Node<'_>) -> R,
        O: Fn(R, R) -> R,
        D: FnMut(&Node<'_>) -> bool,
    {
        self.reduce(root, &map, &map, &op, &op, descend_if)
    }

    fn reduce_root<R, B, L, M, F, D>(
        &self,
        root: &Handle,
        path: &PosixPath,
        callbacks: &mut Callbacks<B, L, M, F, D>,
    ) -> Result<R>
    where
        B: FnMut(&Node<'_>) -> R,
        L: FnMut(&Node<'_>) -> R,
        M: FnMut(R, R) -> R,
        F: FnMut(R, R) -> R,
        D: FnMut(&Node<'_>) -> bool,
    {
        let kind = root.kind()?;
        let node = Node {
            path,
            kind,
            depth: 0,
            handle: Some(root),
        };
        if kind != FileKind::Directory {
            return Ok((callbacks.leaf)(&node));
        }
        self.visit(root, &node, callbacks)
    }

    fn visit<R, B, L, M, F, D>(
        &self,
        dir: &Handle,
        node: &Node<'_>,
        callbacks: &mut Callbacks<B, L, M, F, D>,
    ) -> Result<R>
    where
        B: FnMut(&Node<'_>) -> R,
        L: FnMut(&Node<'_>) -> R,
        M: FnMut(R, R) -> R,
        F: FnMut(R, R) -> R,
        D: FnMut(&Node<'_>) -> bool,
    {
        let mut children: Option<R> = None;
        let mut reader = dir.read_dir()?;

        for entry in &mut reader {
            let entry = entry?;
            let path = node.path.join_segment(entry.name())?;
            let mut kind = entry.kind();
            let mut follow = false;

            if kind == FileKind::Symlink && self.follow_links {
                match entry.stat(true) {
                    Ok(meta) if meta.is_dir() => {
                        log::debug!("following symlink {path}");
                        kind = FileKind::Directory;
                        follow = true;
                    }
                    Ok(_) => {}
                    Err(err) if err.is_not_found() => {}
                    Err(err) => return Err(err),
                }
            }

            let child = Node {
                path: &path,
                kind,
                depth: node.depth + 1,
                handle: None,
            };

            let result = if kind == FileKind::Directory
                && self.within_depth(child.depth)
                && (callbacks.descend_if)(&child)
            {
                let mut flags = OpenFlags::PATH | OpenFlags::DIRECTORY;
                if !follow {
                    flags |= OpenFlags::NOFOLLOW;
                }
                let mut handle = entry.open(flags)?;
                let visited = self.visit(
                    &handle,
                    &Node {
                        handle: Some(&handle),
                        ..child
                    },
                    callbacks,
                );
                let closed = handle.close();
                let visited = visited?;
                closed?;
                visited
            } else {
                if kind == FileKind::Directory {
                    log::debug!("not descending into {path}");
                }
                (callbacks.leaf)(&child)
            };

            children = Some(match children {
                Some(acc) => (callbacks.reduce)(acc, result),
                None => result,
            });
        }
        reader.close()?;

        Ok(match children {
            Some(children) => {
                let own = (callbacks.branch)(node);
                (callbacks.merge)(own, children)
            }
            None => (callbacks.leaf)(node),
        })
    }
}

/// [`TreeReducer::reduce`] with default settings
pub fn reduce<R, B, L, M, F, D>(
    root: &Handle,
    branch: B,
    leaf: L,
    merge: M,
    reduce: F,
    descend_if: D,
) -> Result<R>
where
    B: FnMut(&Node<'_>) -> R,
    L: FnMut(&Node<'_>) -> R,
    M: FnMut(R, R) -> R,
    F: FnMut(R, R) -> R,
    D: FnMut(&Node<'_>) -> bool,
{
    TreeReducer::new().reduce(root, branch, leaf, merge, reduce, descend_if)
}

/// [`TreeReducer::mapreduce`] with default settings
pub fn mapreduce<R, G, O, D>(root: &Handle, map: G, op: O, descend_if: D) -> Result<R>
where
    G: Fn(&Node<'_>) -> R,
    O: Fn(R, R) -> R,
    D: FnMut(&Node<'_>) -> bool,
{
    TreeReducer::new().mapreduce(root, map, op, descend_if)
}
