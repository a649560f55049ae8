use error_stack::Report;

use kernel::interface::query::BookingQuery;
use kernel::interface::update::BookingModifier;
use kernel::prelude::entity::{
    Booking, BookingId, BookingPeriod, BookingReference, UserId, VehicleId,
};
use kernel::prelude::search::BookingFilter;
use kernel::prelude::validation::VEHICLE_ALREADY_BOOKED;
use kernel::{ErrorReason, KernelError};

use crate::database::memory::{InMemoryTransaction, MemoryStore};

pub struct InMemoryBookingRepository;

impl MemoryStore {
    fn overlapping<'a>(
        &'a self,
        vehicle_id: &'a VehicleId,
        period: &'a BookingPeriod,
        excluding: Option<&'a BookingId>,
    ) -> impl Iterator<Item = &'a Booking> + 'a {
        self.bookings.values().filter(move |booking| {
            booking.vehicle_id() == vehicle_id
                && booking.status().is_holding()
                && booking.period().overlaps(period)
                && Some(booking.id()) != excluding
        })
    }

    /// Same rule the PostgreSQL exclusion constraint enforces.
    fn ensure_schedule_free(&self, booking: &Booking) -> error_stack::Result<(), KernelError> {
        if !booking.status().is_holding() {
            return Ok(());
        }
        let clash = self
            .overlapping(booking.vehicle_id(), booking.period(), Some(booking.id()))
            .next();
        match clash {
            Some(_) => Err(Report::new(KernelError::Conflict)
                .attach_printable(ErrorReason::new(VEHICLE_ALREADY_BOOKED))),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl BookingQuery for InMemoryBookingRepository {
    type Transaction = InMemoryTransaction;

    async fn find_by_id(
        &self,
        con: &mut InMemoryTransaction,
        id: &BookingId,
    ) -> error_stack::Result<Option<Booking>, KernelError> {
        Ok(con.staged.bookings.get(id).cloned())
    }

    async fn exists_reference(
        &self,
        con: &mut InMemoryTransaction,
        reference: &BookingReference,
    ) -> error_stack::Result<bool, KernelError> {
        Ok(con
            .staged
            .bookings
            .values()
            .any(|booking| booking.reference() == reference))
    }

    async fn find_overlapping(
        &self,
        con: &mut InMemoryTransaction,
        vehicle_id: &VehicleId,
        period: &BookingPeriod,
        excluding: Option<&BookingId>,
    ) -> error_stack::Result<Vec<Booking>, KernelError> {
        Ok(con
            .staged
            .overlapping(vehicle_id, period, excluding)
            .cloned()
            .collect())
    }

    async fn search(
        &self,
        con: &mut InMemoryTransaction,
        customer_id: &UserId,
        filter: &BookingFilter,
    ) -> error_stack::Result<Vec<Booking>, KernelError> {
        let store = &con.staged;
        let mut found = store
            .bookings
            .values()
            .filter(|booking| booking.is_owned_by(customer_id))
            .filter(|booking| filter.matches(booking, store.vehicles.get(booking.vehicle_id())))
            .cloned()
            .collect::<Vec<_>>();
        found.sort_by(|a, b| filter.ordering().compare(a, b));
        let offset = usize::try_from(*filter.offset().as_ref()).unwrap_or_default();
        let limit = usize::try_from(*filter.limit().as_ref()).unwrap_or_default();
        Ok(found.into_iter().skip(offset).take(limit).collect())
    }
}

#[async_trait::async_trait]
impl BookingModifier for InMemoryBookingRepository {
    type Transaction = InMemoryTransaction;

    async fn lock_vehicle_schedule(
        &self,
        _con: &mut InMemoryTransaction,
        _vehicle_id: &VehicleId,
    ) -> error_stack::Result<(), KernelError> {
        // The transaction already holds the whole store.
        Ok(())
    }

    async fn lock_booking(
        &self,
        _con: &mut InMemoryTransaction,
        _id: &BookingId,
    ) -> error_stack::Result<(), KernelError> {
        Ok(())
    }

    async fn create(
        &self,
        con: &mut InMemoryTransaction,
        booking: &Booking,
    ) -> error_stack::Result<(), KernelError> {
        let store = &mut con.staged;
        let duplicated = store.bookings.contains_key(booking.id())
            || store
                .bookings
                .values()
                .any(|stored| stored.reference() == booking.reference());
        if duplicated {
            return Err(Report::new(KernelError::Concurrency).attach_printable(format!(
                "booking {} or reference {} already exists",
                booking.id().as_ref(),
                booking.reference().as_ref()
            )));
        }
        store.ensure_schedule_free(booking)?;
        store.bookings.insert(booking.id().clone(), booking.clone());
        Ok(())
    }

    async fn update(
        &self,
        con: &mut InMemoryTransaction,
        booking: &Booking,
    ) -> error_stack::Result<(), KernelError> {
        let store = &mut con.staged;
        if !store.bookings.contains_key(booking.id()) {
            return Err(Report::new(KernelError::NotFound)
                .attach_printable(format!("booking {} does not exist", booking.id().as_ref())));
        }
        store.ensure_schedule_free(booking)?;
        store.bookings.insert(booking.id().clone(), booking.clone());
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use rust_decimal::Decimal;
    use time::macros::datetime;
    use time::{Duration, OffsetDateTime};
    use uuid::Uuid;

    use kernel::interface::database::{DatabaseConnection, Transaction};
    use kernel::interface::query::BookingQuery;
    use kernel::interface::update::{BookingModifier, VehicleModifier};
    use kernel::prelude::entity::{
        Booking, BookingId, BookingPeriod, BookingReference, BookingStatus, DailyRate,
        SelectLimit, SelectOffset, UserId, Vehicle, VehicleId, VehicleMake, VehicleModel,
        VehicleStatus,
    };
    use kernel::prelude::search::{BookingFilter, BookingOrdering};
    use kernel::KernelError;

    use crate::database::memory::{
        InMemoryBookingRepository, InMemoryDatabase, InMemoryVehicleRepository,
    };

    const NOW: OffsetDateTime = datetime!(2030-03-10 12:00 UTC);

    fn vehicle() -> Vehicle {
        Vehicle::new(
            VehicleId::new(Uuid::new_v4()),
            UserId::new(Uuid::new_v4()),
            VehicleMake::new("Volvo"),
            VehicleModel::new("XC40"),
            DailyRate::new(Decimal::new(8000, 2)),
            VehicleStatus::Available,
        )
    }

    fn booking(
        reference: &str,
        customer: &UserId,
        vehicle: &Vehicle,
        start: OffsetDateTime,
        days: i64,
        created: OffsetDateTime,
    ) -> Booking {
        Booking::open(
            BookingId::new(Uuid::new_v4()),
            BookingReference::new(reference),
            customer.clone(),
            vehicle,
            BookingPeriod::new(start, start + Duration::days(days)).unwrap(),
            None,
            None,
            None,
            created,
        )
    }

    #[tokio::test]
    async fn holding_bookings_cannot_overlap() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::new();
        let mut con = db.transact().await?;
        let vehicle = vehicle();
        let customer = UserId::new(Uuid::new_v4());
        InMemoryVehicleRepository.create(&mut con, &vehicle).await?;

        let start = NOW + Duration::days(5);
        let first = booking("AAAA0001", &customer, &vehicle, start, 2, NOW);
        InMemoryBookingRepository.create(&mut con, &first).await?;

        let touching = booking("AAAA0002", &customer, &vehicle, start + Duration::days(2), 1, NOW);
        InMemoryBookingRepository.create(&mut con, &touching).await?;

        let clashing = booking("AAAA0003", &customer, &vehicle, start + Duration::days(1), 1, NOW);
        let report = InMemoryBookingRepository
            .create(&mut con, &clashing)
            .await
            .unwrap_err();
        assert_eq!(*report.current_context(), KernelError::Conflict);

        let found = InMemoryBookingRepository
            .find_overlapping(&mut con, vehicle.id(), clashing.period(), None)
            .await?;
        assert_eq!(found, vec![first.clone()]);
        let found = InMemoryBookingRepository
            .find_overlapping(&mut con, vehicle.id(), clashing.period(), Some(first.id()))
            .await?;
        assert!(found.is_empty());

        let cancelled = first.reconstruct(|b| b.status = BookingStatus::Cancelled);
        InMemoryBookingRepository.update(&mut con, &cancelled).await?;
        InMemoryBookingRepository.create(&mut con, &clashing).await?;
        con.commit().await
    }

    #[tokio::test]
    async fn references_are_unique() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::new();
        let mut con = db.transact().await?;
        let vehicle = vehicle();
        let customer = UserId::new(Uuid::new_v4());
        InMemoryVehicleRepository.create(&mut con, &vehicle).await?;

        let first = booking("AAAA0001", &customer, &vehicle, NOW + Duration::days(1), 1, NOW);
        InMemoryBookingRepository.create(&mut con, &first).await?;
        assert!(
            InMemoryBookingRepository
                .exists_reference(&mut con, first.reference())
                .await?
        );

        let again = booking("AAAA0001", &customer, &vehicle, NOW + Duration::days(9), 1, NOW);
        let report = InMemoryBookingRepository
            .create(&mut con, &again)
            .await
            .unwrap_err();
        assert_eq!(*report.current_context(), KernelError::Concurrency);
        Ok(())
    }

    #[tokio::test]
    async fn search_is_scoped_ordered_and_windowed() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::new();
        let mut con = db.transact().await?;
        let vehicle = vehicle();
        let customer = UserId::new(Uuid::new_v4());
        let stranger = UserId::new(Uuid::new_v4());
        InMemoryVehicleRepository.create(&mut con, &vehicle).await?;

        let start = NOW + Duration::days(1);
        let oldest = booking("AAAA0001", &customer, &vehicle, start, 1, NOW);
        let middle = booking("AAAA0002", &customer, &vehicle, start + Duration::days(2), 1, NOW + Duration::minutes(1));
        let newest = booking("AAAA0003", &customer, &vehicle, start + Duration::days(4), 1, NOW + Duration::minutes(2));
        let foreign = booking("AAAA0004", &stranger, &vehicle, start + Duration::days(6), 1, NOW);
        for booking in [&oldest, &middle, &newest, &foreign] {
            InMemoryBookingRepository.create(&mut con, booking).await?;
        }

        let all = InMemoryBookingRepository
            .search(&mut con, &customer, &BookingFilter::new())
            .await?;
        assert_eq!(all, vec![newest.clone(), middle.clone(), oldest.clone()]);

        let page = InMemoryBookingRepository
            .search(
                &mut con,
                &customer,
                &BookingFilter::new()
                    .with_ordering(BookingOrdering::parse("start_date"))
                    .with_window(SelectLimit::new(1), SelectOffset::new(1)),
            )
            .await?;
        assert_eq!(page, vec![middle]);

        let by_model = InMemoryBookingRepository
            .search(&mut con, &stranger, &BookingFilter::new().with_search(Some("xc40")))
            .await?;
        assert_eq!(by_model, vec![foreign]);
        Ok(())
    }
}
