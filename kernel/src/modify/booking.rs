use crate::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use crate::entity::{Booking, BookingId, VehicleId};
use crate::KernelError;

#[async_trait::async_trait]
pub trait BookingModifier: 'static + Sync + Send {
    type Transaction: Transaction;
    /// Serializes schedule changes on one vehicle. The lock is held until the
    /// transaction ends, so an overlap check made after this call stays valid
    /// for the write that follows it.
    async fn lock_vehicle_schedule(
        &self,
        con: &mut Self::Transaction,
        vehicle_id: &VehicleId,
    ) -> error_stack::Result<(), KernelError>;
    /// Holds the booking's row until the transaction ends, so a read that
    /// follows sees the latest committed state and no other writer can change it.
    async fn lock_booking(
        &self,
        con: &mut Self::Transaction,
        id: &BookingId,
    ) -> error_stack::Result<(), KernelError>;
    async fn create(
        &self,
        con: &mut Self::Transaction,
        booking: &Booking,
    ) -> error_stack::Result<(), KernelError>;
    async fn update(
        &self,
        con: &mut Self::Transaction,
        booking: &Booking,
    ) -> error_stack::Result<(), KernelError>;
}

pub trait DependOnBookingModifier: 'static + Sync + Send + DependOnDatabaseConnection {
    type BookingModifier: BookingModifier<
        Transaction = <Self::DatabaseConnection as DatabaseConnection>::Transaction,
    >;
    fn booking_modifier(&self) -> &Self::BookingModifier;
}
