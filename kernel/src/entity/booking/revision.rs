use time::OffsetDateTime;

use crate::entity::{BookingNotes, PickupLocation, ReturnLocation};

/// Customer supplied changes to an existing booking. `None` leaves a field as it is.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct BookingRevision {
    pub start_date: Option<OffsetDateTime>,
    pub end_date: Option<OffsetDateTime>,
    pub pickup_location: Option<PickupLocation>,
    pub return_location: Option<ReturnLocation>,
    pub notes: Option<BookingNotes>,
}

impl BookingRevision {
    pub fn reschedules(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }
}
