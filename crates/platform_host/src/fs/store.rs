//! Key-value store contract backing the VFS, plus in-memory and no-op adapters.

use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, BTreeSet},
    future::Future,
    pin::Pin,
    rc::Rc,
};

use super::types::VfsItem;

/// Object-safe boxed future used by [`VfsStore`] async methods.
pub type VfsStoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq)]
/// One write inside an atomic [`VfsStore::commit`] batch.
pub enum StoreOp {
    /// Insert or replace the record keyed by its path.
    Put(VfsItem),
    /// Remove the record at a path (missing keys are ignored).
    Delete(String),
}

/// Persistent record store keyed by canonical path with a secondary index on parent path.
pub trait VfsStore {
    /// Opens (or re-opens) the backing store.
    fn open<'a>(&'a self) -> VfsStoreFuture<'a, Result<(), String>>;

    /// Loads one record by path.
    fn get<'a>(&'a self, path: &'a str) -> VfsStoreFuture<'a, Result<Option<VfsItem>, String>>;

    /// Loads every record whose `parent_path` equals `parent_path`.
    fn list_by_parent<'a>(
        &'a self,
        parent_path: &'a str,
    ) -> VfsStoreFuture<'a, Result<Vec<VfsItem>, String>>;

    /// Applies all operations in order as one transaction: either every op lands or none does.
    fn commit<'a>(&'a self, ops: Vec<StoreOp>) -> VfsStoreFuture<'a, Result<(), String>>;

    /// Convenience single-record write.
    fn put<'a>(&'a self, item: VfsItem) -> VfsStoreFuture<'a, Result<(), String>> {
        self.commit(vec![StoreOp::Put(item)])
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Store adapter for hosts without persistent storage; every call fails.
pub struct NoopVfsStore;

impl NoopVfsStore {
    fn unavailable(op: &str) -> String {
        format!("vfs store unavailable: {op}")
    }
}

impl VfsStore for NoopVfsStore {
    fn open<'a>(&'a self) -> VfsStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Err(Self::unavailable("open")) })
    }

    fn get<'a>(&'a self, _path: &'a str) -> VfsStoreFuture<'a, Result<Option<VfsItem>, String>> {
        Box::pin(async { Err(Self::unavailable("get")) })
    }

    fn list_by_parent<'a>(
        &'a self,
        _parent_path: &'a str,
    ) -> VfsStoreFuture<'a, Result<Vec<VfsItem>, String>> {
        Box::pin(async { Err(Self::unavailable("list_by_parent")) })
    }

    fn commit<'a>(&'a self, _ops: Vec<StoreOp>) -> VfsStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Err(Self::unavailable("commit")) })
    }
}

#[derive(Debug, Default)]
struct MemoryVfsTables {
    items: BTreeMap<String, VfsItem>,
    by_parent: BTreeMap<String, BTreeSet<String>>,
}

impl MemoryVfsTables {
    fn insert(&mut self, item: VfsItem) {
        self.remove(&item.path);
        if let Some(parent) = &item.parent_path {
            self.by_parent
                .entry(parent.clone())
                .or_default()
                .insert(item.path.clone());
        }
        self.items.insert(item.path.clone(), item);
    }

    fn remove(&mut self, path: &str) {
        let Some(previous) = self.items.remove(path) else {
            return;
        };
        if let Some(parent) = previous.parent_path {
            if let Some(children) = self.by_parent.get_mut(&parent) {
                children.remove(path);
                if children.is_empty() {
                    self.by_parent.remove(&parent);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory VFS store shared by clones.
///
/// `fail_commits` lets tests simulate a backing-store write failure.
pub struct MemoryVfsStore {
    tables: Rc<RefCell<MemoryVfsTables>>,
    fail_commits: Rc<Cell<bool>>,
}

impl MemoryVfsStore {
    /// Makes every subsequent commit fail without touching stored records.
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.set(fail);
    }

    /// Returns the number of stored records.
    pub fn len(&self) -> usize {
        self.tables.borrow().items.len()
    }

    /// Returns `true` when no records are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns every stored path in sorted order.
    pub fn paths(&self) -> Vec<String> {
        self.tables.borrow().items.keys().cloned().collect()
    }
}

impl VfsStore for MemoryVfsStore {
    fn open<'a>(&'a self) -> VfsStoreFuture<'a, Result<(), String>> {
        Box::pin(async { Ok(()) })
    }

    fn get<'a>(&'a self, path: &'a str) -> VfsStoreFuture<'a, Result<Option<VfsItem>, String>> {
        Box::pin(async move { Ok(self.tables.borrow().items.get(path).cloned()) })
    }

    fn list_by_parent<'a>(
        &'a self,
        parent_path: &'a str,
    ) -> VfsStoreFuture<'a, Result<Vec<VfsItem>, String>> {
        Box::pin(async move {
            let tables = self.tables.borrow();
            let Some(children) = tables.by_parent.get(parent_path) else {
                return Ok(Vec::new());
            };
            Ok(children
                .iter()
                .filter_map(|path| tables.items.get(path).cloned())
                .collect())
        })
    }

    fn commit<'a>(&'a self, ops: Vec<StoreOp>) -> VfsStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            if self.fail_commits.get() {
                return Err("memory vfs store: commit rejected".to_string());
            }
            let mut tables = self.tables.borrow_mut();
            for op in ops {
                match op {
                    StoreOp::Put(item) => tables.insert(item),
                    StoreOp::Delete(path) => tables.remove(&path),
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    #[test]
    fn memory_store_indexes_children_by_parent() {
        let store = MemoryVfsStore::default();
        let store_obj: &dyn VfsStore = &store;
        block_on(store_obj.commit(vec![
            StoreOp::Put(VfsItem::folder("/", 0)),
            StoreOp::Put(VfsItem::folder("/Docs/", 0)),
            StoreOp::Put(VfsItem::file("/Docs/a.txt", "a".into(), 0, 0)),
            StoreOp::Put(VfsItem::file("/Docs/b.txt", "b".into(), 0, 0)),
        ]))
        .expect("commit");

        let children = block_on(store_obj.list_by_parent("/Docs/")).expect("list");
        assert_eq!(children.len(), 2);

        block_on(store_obj.commit(vec![StoreOp::Delete("/Docs/a.txt".into())])).expect("delete");
        let children = block_on(store_obj.list_by_parent("/Docs/")).expect("list");
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].path, "/Docs/b.txt");
        assert!(block_on(store_obj.list_by_parent("/missing/"))
            .expect("list")
            .is_empty());
    }

    #[test]
    fn rejected_commit_leaves_records_untouched() {
        let store = MemoryVfsStore::default();
        block_on(store.put(VfsItem::folder("/", 0))).expect("seed");
        store.set_fail_commits(true);

        let err = block_on(store.commit(vec![
            StoreOp::Delete("/".into()),
            StoreOp::Put(VfsItem::folder("/x/", 0)),
        ]))
        .expect_err("commit should fail");
        assert!(err.contains("rejected"));
        assert_eq!(store.paths(), vec!["/".to_string()]);
    }

    #[test]
    fn noop_store_reports_unavailable() {
        let store = NoopVfsStore;
        let err = block_on(store.open()).expect_err("open should fail");
        assert!(err.contains("open"));
    }
}
