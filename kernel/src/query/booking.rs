use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{Booking, BookingId, BookingPeriod, BookingReference, UserId, VehicleId};
use crate::search::BookingFilter;
use crate::KernelError;

#[async_trait::async_trait]
pub trait BookingQuery: 'static + Sync + Send {
    type Transaction: Transaction;
    async fn find_by_id(
        &self,
        con: &mut Self::Transaction,
        id: &BookingId,
    ) -> error_stack::Result<Option<Booking>, KernelError>;
    async fn exists_reference(
        &self,
        con: &mut Self::Transaction,
        reference: &BookingReference,
    ) -> error_stack::Result<bool, KernelError>;
    /// Holding bookings on `vehicle_id` whose period overlaps `period`, optionally
    /// leaving one booking out (the one being rescheduled).
    async fn find_overlapping(
        &self,
        con: &mut Self::Transaction,
        vehicle_id: &VehicleId,
        period: &BookingPeriod,
        excluding: Option<&BookingId>,
    ) -> error_stack::Result<Vec<Booking>, KernelError>;
    async fn search(
        &self,
        con: &mut Self::Transaction,
        customer_id: &UserId,
        filter: &BookingFilter,
    ) -> error_stack::Result<Vec<Booking>, KernelError>;
}

pub trait DependOnBookingQuery: 'static + Sync + Send + DependOnDatabaseConnection {
    type BookingQuery: BookingQuery<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn booking_query(&self) -> &Self::BookingQuery;
}
