//! Virtual filesystem service: CRUD, subtree relocation, recycle bin, and change publication.

use std::{cell::Cell, collections::BTreeSet, rc::Rc};

use super::{
    changes::{SubscriptionId, VfsChange, VfsChangeFeed},
    error::VfsError,
    path::{
        canonical_path, is_within, join_child, normalize_dir, parse_path, rebase,
        sibling_kind_path, ROOT_PATH,
    },
    store::{StoreOp, VfsStore},
    types::{RecycleTag, VfsItem, BASE_DIRECTORIES, DESKTOP_DIR, RECYCLE_BIN_DIR},
};
use crate::time::{Clock, SystemClock};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of [`VfsService::delete_item`].
pub enum DeleteOutcome {
    /// The item (and its subtree) moved into the recycle bin.
    Recycled(VfsItem),
    /// The item was already in the recycle bin and was removed for good.
    Deleted {
        /// Number of records removed, including descendants.
        removed: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Result of [`VfsService::restore_item`].
pub struct RestoreOutcome {
    /// The restored top-level item at its new location.
    pub item: VfsItem,
    /// `true` when the original location was unavailable and the desktop was used instead.
    pub fell_back: bool,
}

/// VFS business layer over a [`VfsStore`].
///
/// Clones share the same store, readiness flag, and change feed. Every operation fails with
/// [`VfsError::StorageUnavailable`] until [`VfsService::init`] succeeds. Multi-record operations
/// are staged and validated in memory and then written as one [`VfsStore::commit`] batch.
#[derive(Clone)]
pub struct VfsService {
    store: Rc<dyn VfsStore>,
    clock: Rc<dyn Clock>,
    ready: Rc<Cell<bool>>,
    changes: VfsChangeFeed,
}

impl VfsService {
    /// Creates a service over `store` using the system clock.
    pub fn new(store: Rc<dyn VfsStore>) -> Self {
        Self::with_clock(store, Rc::new(SystemClock))
    }

    /// Creates a service with an explicit clock.
    pub fn with_clock(store: Rc<dyn VfsStore>, clock: Rc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            ready: Rc::new(Cell::new(false)),
            changes: VfsChangeFeed::default(),
        }
    }

    /// Returns `true` once [`VfsService::init`] has succeeded.
    pub fn is_ready(&self) -> bool {
        self.ready.get()
    }

    /// Opens the store and creates any missing base directory.
    ///
    /// Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::StorageUnavailable`] when the store cannot be opened or seeded.
    pub async fn init(&self) -> Result<(), VfsError> {
        self.store
            .open()
            .await
            .map_err(|_| VfsError::StorageUnavailable)?;

        let now = self.clock.now_unix_ms();
        let mut ops = Vec::new();
        for dir in BASE_DIRECTORIES {
            let existing = self
                .store
                .get(dir)
                .await
                .map_err(|_| VfsError::StorageUnavailable)?;
            if existing.is_none() {
                ops.push(StoreOp::Put(VfsItem::folder(dir, now)));
            }
        }
        if !ops.is_empty() {
            self.store
                .commit(ops)
                .await
                .map_err(|_| VfsError::StorageUnavailable)?;
        }
        self.ready.set(true);
        Ok(())
    }

    /// Marks the service unavailable; later calls fail until the next [`VfsService::init`].
    pub fn close(&self) {
        self.ready.set(false);
    }

    /// Registers a directory-change listener.
    pub fn subscribe(&self, listener: impl Fn(&VfsChange) + 'static) -> SubscriptionId {
        self.changes.subscribe(listener)
    }

    /// Removes a directory-change listener.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.changes.unsubscribe(id)
    }

    /// Loads one item by canonical path.
    ///
    /// # Errors
    ///
    /// Returns an error when the service is not ready or the store read fails.
    pub async fn get_item(&self, path: &str) -> Result<Option<VfsItem>, VfsError> {
        self.ensure_ready()?;
        self.load(path).await
    }

    /// Lists the direct children of a folder in store order.
    ///
    /// # Errors
    ///
    /// Returns an error when the service is not ready or the store read fails.
    pub async fn list_directory(&self, dir_path: &str) -> Result<Vec<VfsItem>, VfsError> {
        self.ensure_ready()?;
        self.children(&normalize_dir(dir_path)).await
    }

    /// Creates (or, with `overwrite`, replaces) a text file.
    ///
    /// Overwriting keeps the original creation time.
    ///
    /// # Errors
    ///
    /// - [`VfsError::InvalidPath`] for empty names, non-rooted or folder-form paths.
    /// - [`VfsError::NameConflict`] when a folder of the same name exists.
    /// - [`VfsError::AlreadyExists`] when a file exists and `overwrite` is `false`.
    /// - [`VfsError::NotFound`] when the parent folder is missing.
    pub async fn create_file(
        &self,
        path: &str,
        content: &str,
        overwrite: bool,
    ) -> Result<VfsItem, VfsError> {
        self.ensure_ready()?;
        if !path.starts_with('/') || path.ends_with('/') || parse_path(path).name.is_empty() {
            return Err(VfsError::invalid_path(path));
        }
        if let Some(folder_form) = sibling_kind_path(path) {
            if self.load(&folder_form).await?.is_some() {
                return Err(VfsError::NameConflict {
                    path: folder_form,
                });
            }
        }

        let now = self.clock.now_unix_ms();
        let created = match self.load(path).await? {
            Some(_) if !overwrite => {
                return Err(VfsError::AlreadyExists {
                    path: path.to_string(),
                })
            }
            Some(existing) => existing.created_at_unix_ms,
            None => now,
        };
        let item = VfsItem::file(path, content.to_string(), created, now);
        self.require_parent(&item).await?;

        self.commit(vec![StoreOp::Put(item.clone())]).await?;
        self.publish_dirs(item.parent_path.iter().cloned());
        Ok(item)
    }

    /// Replaces the content of an existing file.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::NotFound`] when no file exists at `path`, otherwise as
    /// [`VfsService::create_file`].
    pub async fn write_file(&self, path: &str, content: &str) -> Result<VfsItem, VfsError> {
        self.ensure_ready()?;
        match self.load(path).await? {
            Some(existing) if existing.is_file() => self.create_file(path, content, true).await,
            _ => Err(VfsError::not_found(path)),
        }
    }

    /// Creates a folder, returning the existing one unchanged when already present.
    ///
    /// # Errors
    ///
    /// - [`VfsError::InvalidPath`] for empty names or non-rooted paths.
    /// - [`VfsError::NameConflict`] when a file of the same name exists.
    /// - [`VfsError::NotFound`] when the parent folder is missing.
    pub async fn create_folder(&self, path: &str) -> Result<VfsItem, VfsError> {
        self.ensure_ready()?;
        let folder_path = canonical_path(path, true);
        if !folder_path.starts_with('/') || parse_path(&folder_path).name.is_empty() {
            return Err(VfsError::invalid_path(path));
        }

        if let Some(existing) = self.load(&folder_path).await? {
            if existing.is_folder() {
                return Ok(existing);
            }
        }
        if let Some(file_form) = sibling_kind_path(&folder_path) {
            if self.load(&file_form).await?.is_some() {
                return Err(VfsError::NameConflict { path: file_form });
            }
        }

        let item = VfsItem::folder(&folder_path, self.clock.now_unix_ms());
        self.require_parent(&item).await?;
        self.commit(vec![StoreOp::Put(item.clone())]).await?;
        self.publish_dirs(item.parent_path.iter().cloned());
        Ok(item)
    }

    /// Renames or moves an item. Folders carry their whole subtree.
    ///
    /// Creation times are kept and modification times are bumped. The destination is
    /// canonicalized to the source's kind.
    ///
    /// # Errors
    ///
    /// - [`VfsError::NotFound`] when the source or the destination parent is missing.
    /// - [`VfsError::MoveIntoDescendant`] when a folder would move beneath itself.
    /// - [`VfsError::DestinationOccupied`] when another item holds the destination name.
    /// - [`VfsError::InvalidPath`] when an item from outside the recycle bin would move into it;
    ///   [`Self::delete_item`] is the only way in.
    ///
    /// Moving a recycled item out of the bin drops its recycle tag.
    pub async fn rename_item(&self, old_path: &str, new_path: &str) -> Result<VfsItem, VfsError> {
        self.ensure_ready()?;
        let item = self.require(old_path).await?;
        let destination = canonical_path(new_path, item.is_folder());
        if destination == ROOT_PATH || parse_path(&destination).name.is_empty() {
            return Err(VfsError::invalid_path(new_path));
        }
        if BASE_DIRECTORIES.contains(&item.path.as_str()) {
            return Err(VfsError::invalid_path(old_path));
        }
        if item.is_folder() && is_within(&destination, &item.path) {
            return Err(VfsError::MoveIntoDescendant {
                source_path: item.path.clone(),
                destination,
            });
        }
        let from_bin = is_within(&item.path, RECYCLE_BIN_DIR);
        let into_bin = is_within(&destination, RECYCLE_BIN_DIR);
        if into_bin && !from_bin {
            return Err(VfsError::invalid_path(new_path));
        }
        self.require_free(&destination, Some(&item.path)).await?;

        let now = self.clock.now_unix_ms();
        let mut top = item.relocated(&destination);
        top.modified_at_unix_ms = now;
        if !into_bin {
            top.recycled = None;
        }
        self.require_parent(&top).await?;

        let ops = self.stage_relocation(&item, top.clone(), now).await?;
        self.commit(ops).await?;

        let mut dirs = BTreeSet::new();
        dirs.extend(item.parent_path.clone());
        dirs.extend(top.parent_path.clone());
        if item.is_folder() {
            dirs.insert(item.path.clone());
            dirs.insert(top.path.clone());
        }
        self.publish_dirs(dirs);
        Ok(top)
    }

    /// Recursively copies an item. Copies get fresh timestamps and no recycle tag.
    ///
    /// # Errors
    ///
    /// - [`VfsError::NotFound`] when the source or the destination parent is missing.
    /// - [`VfsError::MoveIntoDescendant`] when a folder would be copied beneath itself.
    /// - [`VfsError::DestinationOccupied`] when the destination is taken.
    pub async fn copy_item(
        &self,
        source_path: &str,
        destination_path: &str,
    ) -> Result<VfsItem, VfsError> {
        self.ensure_ready()?;
        let item = self.require(source_path).await?;
        let destination = canonical_path(destination_path, item.is_folder());
        if destination == ROOT_PATH || parse_path(&destination).name.is_empty() {
            return Err(VfsError::invalid_path(destination_path));
        }
        if item.is_folder() && (destination == item.path || is_within(&destination, &item.path)) {
            return Err(VfsError::MoveIntoDescendant {
                source_path: item.path.clone(),
                destination,
            });
        }
        self.require_free(&destination, None).await?;

        let now = self.clock.now_unix_ms();
        let fresh = |mut record: VfsItem| {
            record.created_at_unix_ms = now;
            record.modified_at_unix_ms = now;
            record.recycled = None;
            record
        };
        let top = fresh(item.relocated(&destination));
        self.require_parent(&top).await?;

        let mut ops = vec![StoreOp::Put(top.clone())];
        for descendant in self.descendants(&item).await? {
            let Some(new_path) = rebase(&descendant.path, &item.path, &top.path) else {
                continue;
            };
            self.require_free(&new_path, None).await?;
            ops.push(StoreOp::Put(fresh(relocated_descendant(&descendant, &new_path))));
        }
        self.commit(ops).await?;
        self.publish_dirs(top.parent_path.iter().cloned());
        Ok(top)
    }

    /// Soft-deletes an item into the recycle bin, or permanently deletes items already there.
    ///
    /// Recycled items land at `/Recycle Bin/<name>_<timestamp>` (folders keep their trailing
    /// slash) and remember their original path.
    ///
    /// # Errors
    ///
    /// - [`VfsError::NotFound`] when nothing exists at `path`.
    /// - [`VfsError::InvalidPath`] for base directories.
    pub async fn delete_item(&self, path: &str) -> Result<DeleteOutcome, VfsError> {
        self.ensure_ready()?;
        let item = self.require(path).await?;
        if BASE_DIRECTORIES.contains(&item.path.as_str()) {
            return Err(VfsError::invalid_path(path));
        }
        if is_within(&item.path, RECYCLE_BIN_DIR) {
            let removed = self.permanent_delete_item(path).await?;
            return Ok(DeleteOutcome::Deleted { removed });
        }

        let mut stamp = self.clock.now_unix_ms();
        let recycle_path = loop {
            let candidate = join_child(
                RECYCLE_BIN_DIR,
                &format!("{}_{stamp}", item.name),
                item.is_folder(),
            );
            if self.occupant(&candidate).await?.is_none() {
                break candidate;
            }
            stamp += 1;
        };

        let top = VfsItem {
            path: recycle_path.clone(),
            parent_path: Some(RECYCLE_BIN_DIR.to_string()),
            modified_at_unix_ms: stamp,
            recycled: Some(RecycleTag {
                original_path: item.path.clone(),
                recycled_at_unix_ms: stamp,
            }),
            ..item.clone()
        };
        let ops = self.stage_relocation(&item, top.clone(), stamp).await?;
        self.commit(ops).await?;

        let mut dirs = BTreeSet::from([RECYCLE_BIN_DIR.to_string()]);
        dirs.extend(item.parent_path.clone());
        self.publish_dirs(dirs);
        Ok(DeleteOutcome::Recycled(top))
    }

    /// Moves a recycled item back to its original path.
    ///
    /// When the original path is occupied or its parent folder no longer exists, the item goes to
    /// `/Desktop/<name>`, then `/Desktop/<name>_<timestamp>`.
    ///
    /// # Errors
    ///
    /// - [`VfsError::NotFound`] when nothing exists at `recycle_path`.
    /// - [`VfsError::InvalidRecycledItem`] when the item carries no recycle tag.
    pub async fn restore_item(&self, recycle_path: &str) -> Result<RestoreOutcome, VfsError> {
        self.ensure_ready()?;
        let item = self.require(recycle_path).await?;
        let Some(tag) = item.recycled.clone() else {
            return Err(VfsError::InvalidRecycledItem {
                path: recycle_path.to_string(),
            });
        };

        let original = canonical_path(&tag.original_path, item.is_folder());
        let name = parse_path(&original).name;
        let now = self.clock.now_unix_ms();

        let mut target = original.clone();
        if !self.location_available(&target).await? {
            target = join_child(DESKTOP_DIR, &name, item.is_folder());
            if !self.location_available(&target).await? {
                target = join_child(DESKTOP_DIR, &format!("{name}_{now}"), item.is_folder());
                self.require_free(&target, None).await?;
            }
        }

        let mut top = item.relocated(&target);
        top.recycled = None;
        top.modified_at_unix_ms = now;
        let ops = self.stage_relocation(&item, top.clone(), now).await?;
        self.commit(ops).await?;

        let mut dirs = BTreeSet::from([RECYCLE_BIN_DIR.to_string()]);
        dirs.extend(top.parent_path.clone());
        self.publish_dirs(dirs);
        Ok(RestoreOutcome {
            fell_back: target != original,
            item: top,
        })
    }

    /// Removes an item and all its descendants for good. Returns the number of removed records.
    ///
    /// # Errors
    ///
    /// - [`VfsError::NotFound`] when nothing exists at `path`.
    /// - [`VfsError::InvalidPath`] for base directories.
    pub async fn permanent_delete_item(&self, path: &str) -> Result<usize, VfsError> {
        self.ensure_ready()?;
        let item = self.require(path).await?;
        if BASE_DIRECTORIES.contains(&item.path.as_str()) {
            return Err(VfsError::invalid_path(path));
        }
        let mut ops = vec![StoreOp::Delete(item.path.clone())];
        ops.extend(
            self.descendants(&item)
                .await?
                .into_iter()
                .map(|descendant| StoreOp::Delete(descendant.path)),
        );
        let removed = ops.len();
        self.commit(ops).await?;
        self.publish_dirs(item.parent_path.iter().cloned());
        Ok(removed)
    }

    /// Permanently deletes everything in the recycle bin. Returns the number of removed records.
    ///
    /// # Errors
    ///
    /// Returns an error when the service is not ready or a store call fails.
    pub async fn empty_recycle_bin(&self) -> Result<usize, VfsError> {
        self.ensure_ready()?;
        let mut ops = Vec::new();
        for entry in self.children(RECYCLE_BIN_DIR).await? {
            for descendant in self.descendants(&entry).await? {
                ops.push(StoreOp::Delete(descendant.path));
            }
            ops.push(StoreOp::Delete(entry.path));
        }
        if ops.is_empty() {
            return Ok(0);
        }
        let removed = ops.len();
        self.commit(ops).await?;
        self.publish_dirs([RECYCLE_BIN_DIR.to_string()]);
        Ok(removed)
    }

    fn ensure_ready(&self) -> Result<(), VfsError> {
        if self.ready.get() {
            Ok(())
        } else {
            Err(VfsError::StorageUnavailable)
        }
    }

    async fn load(&self, path: &str) -> Result<Option<VfsItem>, VfsError> {
        self.store.get(path).await.map_err(VfsError::Storage)
    }

    async fn require(&self, path: &str) -> Result<VfsItem, VfsError> {
        self.load(path)
            .await?
            .ok_or_else(|| VfsError::not_found(path))
    }

    async fn children(&self, dir_path: &str) -> Result<Vec<VfsItem>, VfsError> {
        self.store
            .list_by_parent(dir_path)
            .await
            .map_err(VfsError::Storage)
    }

    async fn commit(&self, ops: Vec<StoreOp>) -> Result<(), VfsError> {
        self.store.commit(ops).await.map_err(VfsError::Storage)
    }

    /// Returns whichever item (file or folder form) holds the name at `path`.
    async fn occupant(&self, path: &str) -> Result<Option<VfsItem>, VfsError> {
        if let Some(item) = self.load(path).await? {
            return Ok(Some(item));
        }
        match sibling_kind_path(path) {
            Some(other) => self.load(&other).await,
            None => Ok(None),
        }
    }

    async fn require_free(&self, path: &str, allow: Option<&str>) -> Result<(), VfsError> {
        match self.occupant(path).await? {
            Some(existing) if Some(existing.path.as_str()) != allow => Err(VfsError::occupied(path)),
            _ => Ok(()),
        }
    }

    async fn require_parent(&self, item: &VfsItem) -> Result<(), VfsError> {
        let Some(parent) = &item.parent_path else {
            return Ok(());
        };
        match self.load(parent).await? {
            Some(folder) if folder.is_folder() => Ok(()),
            _ => Err(VfsError::not_found(parent)),
        }
    }

    async fn location_available(&self, path: &str) -> Result<bool, VfsError> {
        if self.occupant(path).await?.is_some() {
            return Ok(false);
        }
        let Some(parent) = parse_path(path).parent_path else {
            return Ok(false);
        };
        Ok(matches!(self.load(&parent).await?, Some(folder) if folder.is_folder()))
    }

    /// Collects every record beneath a folder, parents before children.
    async fn descendants(&self, item: &VfsItem) -> Result<Vec<VfsItem>, VfsError> {
        let mut out = Vec::new();
        if !item.is_folder() {
            return Ok(out);
        }
        let mut pending = vec![item.path.clone()];
        while let Some(dir) = pending.pop() {
            for child in self.children(&dir).await? {
                if child.is_folder() {
                    pending.push(child.path.clone());
                }
                out.push(child);
            }
        }
        Ok(out)
    }

    /// Builds the batch that moves `item` and its subtree under `top`.
    ///
    /// All deletes precede all puts so that a relocation onto the same key still lands.
    async fn stage_relocation(
        &self,
        item: &VfsItem,
        top: VfsItem,
        now: u64,
    ) -> Result<Vec<StoreOp>, VfsError> {
        let descendants = self.descendants(item).await?;
        let mut deletes = vec![StoreOp::Delete(item.path.clone())];
        let mut puts = Vec::with_capacity(descendants.len() + 1);

        for descendant in descendants {
            let Some(new_path) = rebase(&descendant.path, &item.path, &top.path) else {
                continue;
            };
            if !is_within(&new_path, &item.path) && new_path != descendant.path {
                self.require_free(&new_path, None).await?;
            }
            let mut moved = relocated_descendant(&descendant, &new_path);
            moved.modified_at_unix_ms = now;
            deletes.push(StoreOp::Delete(descendant.path));
            puts.push(StoreOp::Put(moved));
        }
        puts.insert(0, StoreOp::Put(top));
        deletes.extend(puts);
        Ok(deletes)
    }

    fn publish_dirs(&self, dirs: impl IntoIterator<Item = String>) {
        let unique: BTreeSet<String> = dirs.into_iter().collect();
        for dir_path in unique {
            self.changes.publish(&VfsChange::DirectoryChanged { dir_path });
        }
    }
}

/// Descendants keep their display name (a recycled ancestor does not rename them).
fn relocated_descendant(descendant: &VfsItem, new_path: &str) -> VfsItem {
    VfsItem {
        path: new_path.to_string(),
        parent_path: parse_path(new_path).parent_path,
        ..descendant.clone()
    }
}
