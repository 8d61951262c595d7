use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use shared_database::{paths, RealtimeStore};
use shared_models::Doctor;

use crate::services::sms::SmsGateway;
use crate::{BookingStatusView, NotificationError};

/// Server-side listener that texts a patient whenever one of their bookings
/// changes to `accepted`, independent of whichever client made the change.
pub struct AcceptanceSmsTrigger {
    store: Arc<dyn RealtimeStore>,
    gateway: Arc<dyn SmsGateway>,
    statuses: HashMap<(String, String), Option<String>>,
    has_baseline: bool,
}

impl AcceptanceSmsTrigger {
    pub fn new(store: Arc<dyn RealtimeStore>, gateway: Arc<dyn SmsGateway>) -> Self {
        Self {
            store,
            gateway,
            statuses: HashMap::new(),
            has_baseline: false,
        }
    }

    /// Watch the whole booking tree until the subscription ends.
    pub async fn run(mut self) -> Result<(), NotificationError> {
        let mut subscription = self.store.subscribe(paths::BOOKINGS_ROOT).await?;
        info!("SMS trigger listening on /{}", paths::BOOKINGS_ROOT);

        while let Some(snapshot) = subscription.recv().await {
            let snapshot = snapshot?;
            for booking in self.observe(snapshot.as_ref()) {
                self.send_confirmation(&booking).await;
            }
        }

        warn!("Booking subscription closed, SMS trigger stopping");
        Ok(())
    }

    /// Record the statuses in `snapshot` and return the bookings whose status
    /// just became `accepted`. The first snapshot only establishes the
    /// baseline.
    pub fn observe(&mut self, snapshot: Option<&Value>) -> Vec<BookingStatusView> {
        let current = flatten_bookings(snapshot);
        let mut newly_accepted = Vec::new();

        if self.has_baseline {
            for booking in current.values() {
                let key = (booking.doctor_id.clone(), booking.booking_id.clone());
                let was_accepted = match self.statuses.get(&key) {
                    Some(previous) => previous.as_deref() == Some("accepted"),
                    // Created after the baseline; creation is not a status update.
                    None => continue,
                };
                if booking.is_accepted() && !was_accepted {
                    newly_accepted.push(booking.clone());
                }
            }
        }

        self.statuses = current
            .into_iter()
            .map(|(key, booking)| (key, booking.status))
            .collect();
        self.has_baseline = true;

        debug!(
            "SMS trigger tracking {} bookings, {} newly accepted",
            self.statuses.len(),
            newly_accepted.len()
        );
        newly_accepted
    }

    #[instrument(skip(self, booking), fields(doctor_id = %booking.doctor_id, booking_id = %booking.booking_id))]
    async fn send_confirmation(&self, booking: &BookingStatusView) {
        let Some(destination) = booking.sms_destination() else {
            warn!("Accepted booking has no phone number, skipping SMS");
            return;
        };

        let doctor_name = match booking.doctor_name.as_deref().filter(|n| !n.trim().is_empty()) {
            Some(name) => name.to_string(),
            None => self.lookup_doctor_name(&booking.doctor_id).await,
        };

        let message = booking.confirmation_message(&doctor_name);
        if let Err(e) = self.gateway.send_sms(&destination, &message).await {
            error!("SMS send error for {}: {}", destination, e);
        }
    }

    async fn lookup_doctor_name(&self, doctor_id: &str) -> String {
        match self.store.read(&paths::doctor(doctor_id)).await {
            Ok(Some(value)) => serde_json::from_value::<Doctor>(value)
                .ok()
                .and_then(|doctor| doctor.display_name().map(str::to_string))
                .unwrap_or_default(),
            Ok(None) => String::new(),
            Err(e) => {
                warn!("Could not load doctor {}: {}", doctor_id, e);
                String::new()
            }
        }
    }
}

fn flatten_bookings(snapshot: Option<&Value>) -> HashMap<(String, String), BookingStatusView> {
    let mut bookings = HashMap::new();
    let Some(doctors) = snapshot.and_then(Value::as_object) else {
        return bookings;
    };

    for (doctor_id, doctor_bookings) in doctors {
        let Some(doctor_bookings) = doctor_bookings.as_object() else {
            continue;
        };
        for (booking_id, record) in doctor_bookings {
            match serde_json::from_value::<BookingStatusView>(record.clone()) {
                Ok(mut view) => {
                    view.doctor_id = doctor_id.clone();
                    view.booking_id = booking_id.clone();
                    bookings.insert((doctor_id.clone(), booking_id.clone()), view);
                }
                Err(e) => debug!("Skipping malformed booking {}/{}: {}", doctor_id, booking_id, e),
            }
        }
    }

    bookings
}
