use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use tracing::{debug, error, info, instrument, warn};

use notification_cell::{AcceptanceTemplate, NotificationDispatcher};
use shared_config::AppConfig;
use shared_database::{paths, RealtimeStore};
use shared_utils::{Clock, SystemClock};

use crate::services::feed::{BookingFeed, SnapshotCache};
use crate::services::lifecycle::BookingLifecycleService;
use crate::services::numbering::{policy_for, SerialNumberPolicy};
use crate::services::schedule::SlotSchedule;
use crate::{
    into_fields, sort_newest_first, AcceptanceUpdate, Booking, BookingError, BookingStatus, RejectionUpdate,
};

/// The doctor's side of the booking workflow.
///
/// One instance stands for one client device: it keeps the last list of
/// bookings it has seen for each doctor and makes its accept/reject decisions
/// against that list.
pub struct BookingAcceptanceService {
    store: Arc<dyn RealtimeStore>,
    numbering: Arc<dyn SerialNumberPolicy>,
    schedule: SlotSchedule,
    lifecycle: BookingLifecycleService,
    notifications: NotificationDispatcher,
    clock: Arc<dyn Clock>,
    clinic_offset: FixedOffset,
    snapshots: SnapshotCache,
}

impl BookingAcceptanceService {
    pub fn new(
        store: Arc<dyn RealtimeStore>,
        notifications: NotificationDispatcher,
        numbering: Arc<dyn SerialNumberPolicy>,
        clock: Arc<dyn Clock>,
        clinic_offset: FixedOffset,
    ) -> Self {
        Self {
            store,
            numbering,
            schedule: SlotSchedule::default(),
            lifecycle: BookingLifecycleService::new(),
            notifications,
            clock,
            clinic_offset,
            snapshots: SnapshotCache::default(),
        }
    }

    pub fn from_config(
        config: &AppConfig,
        store: Arc<dyn RealtimeStore>,
        notifications: NotificationDispatcher,
    ) -> Self {
        let clinic_offset = clinic_offset(config.clinic_utc_offset_minutes);
        let numbering = policy_for(config.serial_numbering, clinic_offset);
        info!(
            "Serial numbering policy: {}, clinic offset {}",
            numbering.name(),
            clinic_offset
        );
        Self::new(store, notifications, numbering, Arc::new(SystemClock), clinic_offset)
    }

    /// Live list of a doctor's bookings, newest first. The current list is
    /// delivered straight away, then again after every change.
    #[instrument(skip(self))]
    pub async fn list_for_doctor(&self, doctor_id: &str) -> Result<BookingFeed, BookingError> {
        let subscription = self.store.subscribe(&paths::doctor_bookings(doctor_id)).await?;
        info!("Watching bookings for doctor {}", doctor_id);
        Ok(BookingFeed::new(doctor_id, subscription, Arc::clone(&self.snapshots)))
    }

    /// One-off read of a doctor's bookings, kept as the last-seen list.
    #[instrument(skip(self))]
    pub async fn refresh(&self, doctor_id: &str) -> Result<Vec<Booking>, BookingError> {
        let snapshot = self.store.read(&paths::doctor_bookings(doctor_id)).await?;
        let bookings = Booking::list_from_snapshot(doctor_id, snapshot.as_ref());
        debug!("Refreshed {} bookings for doctor {}", bookings.len(), doctor_id);
        self.snapshots
            .write()
            .await
            .insert(doctor_id.to_string(), bookings.clone());
        Ok(bookings)
    }

    pub async fn last_seen(&self, doctor_id: &str) -> Option<Vec<Booking>> {
        self.snapshots.read().await.get(doctor_id).cloned()
    }

    #[instrument(skip(self))]
    pub async fn get(&self, doctor_id: &str, booking_id: &str) -> Result<Booking, BookingError> {
        match self.store.read(&paths::booking(doctor_id, booking_id)).await? {
            Some(record) => Ok(Booking::from_record(doctor_id, booking_id, record)?),
            None => Err(BookingError::NotFound(booking_id.to_string())),
        }
    }

    /// Accept a pending booking: assign the next serial number and its slot,
    /// write them in one update and notify the patient in the background.
    #[instrument(skip(self))]
    pub async fn accept(&self, doctor_id: &str, booking_id: &str) -> Result<Booking, BookingError> {
        let (booking, snapshot) = self.locate(doctor_id, booking_id).await?;
        self.lifecycle
            .validate_status_transition(&booking, &BookingStatus::Accepted)?;

        let now = self.clock.now();
        let today = now.with_timezone(&self.clinic_offset).date_naive();
        let serial_number = self.numbering.next_serial(&snapshot, today);

        let update = AcceptanceUpdate {
            status: BookingStatus::Accepted,
            serial_number,
            appointment_time: self.schedule.appointment_time(serial_number),
            appointment_duration: self.schedule.duration_label(),
            accepted_at: now,
        };

        self.store
            .update(&paths::booking(doctor_id, booking_id), into_fields(&update)?)
            .await
            .map_err(|e| {
                error!("Failed to accept booking {}/{}: {}", doctor_id, booking_id, e);
                e
            })?;

        let accepted = booking.with_acceptance(&update);
        self.remember(&accepted).await;
        info!(
            "Accepted booking {} for doctor {} as serial {} at {}",
            booking_id, doctor_id, serial_number, update.appointment_time
        );

        self.notify_patient(&accepted, today);
        Ok(accepted)
    }

    #[instrument(skip(self))]
    pub async fn reject(&self, doctor_id: &str, booking_id: &str) -> Result<Booking, BookingError> {
        let (booking, _) = self.locate(doctor_id, booking_id).await?;
        self.lifecycle
            .validate_status_transition(&booking, &BookingStatus::Rejected)?;

        let update = RejectionUpdate {
            status: BookingStatus::Rejected,
            rejected_at: self.clock.now(),
        };

        self.store
            .update(&paths::booking(doctor_id, booking_id), into_fields(&update)?)
            .await
            .map_err(|e| {
                error!("Failed to reject booking {}/{}: {}", doctor_id, booking_id, e);
                e
            })?;

        let rejected = booking.with_rejection(&update);
        self.remember(&rejected).await;
        info!("Rejected booking {} for doctor {}", booking_id, doctor_id);
        Ok(rejected)
    }

    /// Remove a booking outright, whatever its status.
    #[instrument(skip(self))]
    pub async fn delete(&self, doctor_id: &str, booking_id: &str) -> Result<(), BookingError> {
        let path = paths::booking(doctor_id, booking_id);
        if self.store.read(&path).await?.is_none() {
            return Err(BookingError::NotFound(booking_id.to_string()));
        }

        self.store.remove(&path).await?;
        if let Some(bookings) = self.snapshots.write().await.get_mut(doctor_id) {
            bookings.retain(|booking| booking.id != booking_id);
        }
        info!("Deleted booking {} for doctor {}", booking_id, doctor_id);
        Ok(())
    }

    /// Find the booking in the last-seen list, reading the store once when the
    /// list is missing or does not contain it yet.
    async fn locate(&self, doctor_id: &str, booking_id: &str) -> Result<(Booking, Vec<Booking>), BookingError> {
        let (snapshot, from_cache) = match self.last_seen(doctor_id).await {
            Some(snapshot) => (snapshot, true),
            None => (self.refresh(doctor_id).await?, false),
        };

        if let Some(booking) = find(&snapshot, booking_id) {
            return Ok((booking, snapshot));
        }

        if from_cache {
            let snapshot = self.refresh(doctor_id).await?;
            if let Some(booking) = find(&snapshot, booking_id) {
                return Ok((booking, snapshot));
            }
        }

        warn!("Booking {} not found for doctor {}", booking_id, doctor_id);
        Err(BookingError::NotFound(booking_id.to_string()))
    }

    async fn remember(&self, booking: &Booking) {
        let mut snapshots = self.snapshots.write().await;
        let bookings = snapshots.entry(booking.doctor_id.clone()).or_default();
        match bookings.iter_mut().find(|seen| seen.id == booking.id) {
            Some(seen) => *seen = booking.clone(),
            None => {
                bookings.push(booking.clone());
                sort_newest_first(bookings);
            }
        }
    }

    fn notify_patient(&self, booking: &Booking, today: NaiveDate) {
        let Some(email) = booking.contact_email() else {
            debug!("Booking {} has no e-mail address, skipping notice", booking.id);
            return;
        };

        let template = AcceptanceTemplate {
            patient_email: email.to_string(),
            patient_name: booking.patient_name.clone(),
            doctor_name: booking.doctor_name.clone().unwrap_or_default(),
            appointment_date: today.format("%Y-%m-%d").to_string(),
            appointment_time: booking.appointment_time.clone().unwrap_or_default(),
            appointment_duration: booking.appointment_duration.clone().unwrap_or_default(),
            serial_number: booking.serial_number.map(|n| n.to_string()).unwrap_or_default(),
            accepted_at: booking.accepted_at.map(|at| at.to_rfc3339()).unwrap_or_default(),
            ..AcceptanceTemplate::default()
        };

        self.notifications
            .dispatch_acceptance(&booking.doctor_id, email.to_string(), template);
    }
}

fn find(snapshot: &[Booking], booking_id: &str) -> Option<Booking> {
    snapshot.iter().find(|booking| booking.id == booking_id).cloned()
}

/// Clinic time zone from a minutes-east-of-UTC setting; out of range falls
/// back to UTC.
pub fn clinic_offset(minutes_east: i32) -> FixedOffset {
    minutes_east
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| {
            warn!("Clinic UTC offset of {} minutes is out of range, using UTC", minutes_east);
            Utc.fix()
        })
}
