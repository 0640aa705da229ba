//! Welcome notification seam.
//!
//! Delivery is at-least-once: a resident is marked notified only after
//! `notify` returns `Ok`, so a crash between send and mark re-sends next run.

use crate::model::property::Property;
use crate::model::resident::Resident;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Notifier call failure; the resident stays unnotified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationError {
    pub message: String,
}

impl NotificationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for NotificationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for NotificationError {}

/// Sends the welcome message for a newly created resident.
pub trait Notifier {
    fn notify(&self, property: &Property, resident: &Resident) -> Result<(), NotificationError>;
}

impl<N: Notifier + ?Sized> Notifier for &N {
    fn notify(&self, property: &Property, resident: &Resident) -> Result<(), NotificationError> {
        (**self).notify(property, resident)
    }
}

/// Notifier that only records the send in the log; used when no mailer is wired.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, property: &Property, resident: &Resident) -> Result<(), NotificationError> {
        info!(
            "event=resident_welcome module=notifier status=ok property_external_id={} resident_external_id={} resident_uuid={}",
            property.external_id, resident.external_id, resident.uuid
        );
        Ok(())
    }
}
