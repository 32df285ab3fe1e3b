//! Ordered in-memory view over the image store.
//!
//! [`GalleryModel`] is the only path through which the rest of the crate
//! reads or writes images. After every successful operation its order equals
//! the store's contents sorted ascending by id; on a failed write the order
//! is left exactly as it was.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::record::{ImageRecord, sort_by_id};
use crate::store::ImageStore;

/// Immutable view of the gallery order, shared with observers.
pub type GallerySnapshot = Arc<[ImageRecord]>;

/// Ordered view of the gallery backed by an [`ImageStore`].
pub struct GalleryModel<S> {
    store: S,
    order: Vec<ImageRecord>,
    publisher: watch::Sender<GallerySnapshot>,
}

impl<S: ImageStore> GalleryModel<S> {
    /// Wrap a store. The view starts empty until [`reload`](Self::reload).
    pub fn new(store: S) -> Self {
        let (publisher, _) = watch::channel(GallerySnapshot::from(Vec::new()));
        Self {
            store,
            order: Vec::new(),
            publisher,
        }
    }

    /// Wrap a store and build the view from its persisted contents.
    pub async fn load(store: S) -> Result<Self> {
        let mut gallery = Self::new(store);
        gallery.reload().await?;
        Ok(gallery)
    }

    /// The backing store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Records in ascending id order.
    pub fn order(&self) -> &[ImageRecord] {
        &self.order
    }

    /// Ids in ascending order.
    pub fn ids(&self) -> Vec<i64> {
        self.order.iter().map(|r| r.id).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Look up a record by id.
    pub fn get(&self, id: i64) -> Option<&ImageRecord> {
        self.position(id).ok().map(|pos| &self.order[pos])
    }

    /// The newest id in the gallery.
    pub fn max_id(&self) -> Option<i64> {
        self.order.last().map(|r| r.id)
    }

    /// The current order as a shareable snapshot.
    pub fn snapshot(&self) -> GallerySnapshot {
        self.publisher.borrow().clone()
    }

    /// Subscribe to every future change of the order.
    pub fn subscribe(&self) -> watch::Receiver<GallerySnapshot> {
        self.publisher.subscribe()
    }

    /// Rebuild the view from the store.
    #[instrument(skip(self))]
    pub async fn reload(&mut self) -> Result<()> {
        let mut records = self.store.get_all().await?;
        sort_by_id(&mut records);
        self.order = records;
        info!(count = self.order.len(), "Gallery loaded");
        self.publish();
        Ok(())
    }

    /// Persist one record, then place it in the view.
    ///
    /// A record whose id is already present replaces the old one.
    #[instrument(skip_all, fields(id = record.id))]
    pub async fn insert(&mut self, record: ImageRecord) -> Result<()> {
        self.store.put(&record).await?;

        match self.position(record.id) {
            Ok(pos) => {
                debug!(id = record.id, "Replacing existing image");
                self.order[pos] = record;
            }
            Err(pos) => self.order.insert(pos, record),
        }
        self.publish();
        Ok(())
    }

    /// Delete a record. Returns whether it was part of the view.
    #[instrument(skip(self))]
    pub async fn remove(&mut self, id: i64) -> Result<bool> {
        self.store.delete(id).await?;

        let removed = match self.position(id) {
            Ok(pos) => {
                self.order.remove(pos);
                true
            }
            Err(_) => false,
        };
        if removed {
            self.publish();
        }
        Ok(removed)
    }

    /// Replace the whole gallery with `records`.
    #[instrument(skip_all, fields(count = records.len()))]
    pub async fn replace_all(&mut self, mut records: Vec<ImageRecord>) -> Result<()> {
        self.store.put_all(&records).await?;

        sort_by_id(&mut records);
        self.order = records;
        info!(count = self.order.len(), "Gallery replaced");
        self.publish();
        Ok(())
    }

    fn position(&self, id: i64) -> std::result::Result<usize, usize> {
        self.order.binary_search_by_key(&id, |r| r.id)
    }

    fn publish(&self) {
        self.publisher
            .send_replace(GallerySnapshot::from(self.order.clone()));
    }
}
