use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use shared_database::Subscription;

use crate::{Booking, BookingError};

/// Last list of bookings seen per doctor. Accept and reject work from this
/// rather than re-reading the store.
pub type SnapshotCache = Arc<RwLock<HashMap<String, Vec<Booking>>>>;

/// Live, newest-first list of one doctor's bookings.
///
/// Every snapshot it yields also replaces the doctor's entry in the shared
/// cache. Dropping the feed stops the listener.
pub struct BookingFeed {
    doctor_id: String,
    subscription: Subscription,
    snapshots: SnapshotCache,
}

impl BookingFeed {
    pub fn new(doctor_id: impl Into<String>, subscription: Subscription, snapshots: SnapshotCache) -> Self {
        Self {
            doctor_id: doctor_id.into(),
            subscription,
            snapshots,
        }
    }

    pub fn doctor_id(&self) -> &str {
        &self.doctor_id
    }

    /// The next full list. `None` once the underlying listener has stopped.
    pub async fn next(&mut self) -> Option<Result<Vec<Booking>, BookingError>> {
        match self.subscription.recv().await? {
            Ok(snapshot) => {
                let bookings = Booking::list_from_snapshot(&self.doctor_id, snapshot.as_ref());
                debug!("Booking feed for {} now holds {} bookings", self.doctor_id, bookings.len());
                self.snapshots
                    .write()
                    .await
                    .insert(self.doctor_id.clone(), bookings.clone());
                Some(Ok(bookings))
            }
            Err(e) => {
                warn!("Booking feed for {} failed: {}", self.doctor_id, e);
                Some(Err(BookingError::Store(e)))
            }
        }
    }

    pub fn unsubscribe(self) {
        debug!("Closing booking feed for {}", self.doctor_id);
        self.subscription.unsubscribe();
    }
}
