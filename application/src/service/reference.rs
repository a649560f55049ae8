use error_stack::Report;
use tracing::{debug, error};

use kernel::interface::database::DatabaseConnection;
use kernel::interface::query::{BookingQuery, DependOnBookingQuery};
use kernel::interface::system::{BookingReferenceGenerator, DependOnBookingReferenceGenerator};
use kernel::prelude::entity::BookingReference;
use kernel::KernelError;

/// Upper bound on candidates drawn before giving up.
pub const MAX_REFERENCE_ATTEMPTS: usize = 16;

#[async_trait::async_trait]
pub trait IssueBookingReferenceService:
    'static + Sync + Send + DependOnBookingQuery + DependOnBookingReferenceGenerator
{
    /// Draws candidates until one is not yet used by any booking.
    async fn issue_booking_reference(
        &self,
        connection: &mut <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    ) -> error_stack::Result<BookingReference, KernelError> {
        for attempt in 1..=MAX_REFERENCE_ATTEMPTS {
            let candidate = self.booking_reference_generator().generate();
            let taken = self
                .booking_query()
                .exists_reference(connection, &candidate)
                .await?;
            if !taken {
                return Ok(candidate);
            }
            debug!(attempt, reference = candidate.as_ref().as_str(), "booking reference collision");
        }
        error!("no free booking reference after {MAX_REFERENCE_ATTEMPTS} attempts");
        Err(Report::new(KernelError::Internal).attach_printable(format!(
            "no free booking reference after {MAX_REFERENCE_ATTEMPTS} attempts"
        )))
    }
}

impl<T> IssueBookingReferenceService for T where
    T: DependOnBookingQuery + DependOnBookingReferenceGenerator
{
}
