use tracing::{debug, info};
use uuid::Uuid;

use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection, Transaction};
use kernel::interface::query::{
    BookingQuery, DependOnBookingQuery, DependOnVehicleQuery, VehicleQuery,
};
use kernel::interface::system::{Clock, DependOnClock};
use kernel::interface::update::{BookingModifier, DependOnBookingModifier};
use kernel::prelude::entity::{
    Booking, BookingId, BookingNotes, BookingPeriod, BookingRevision, PickupLocation,
    ReturnLocation, UserId, VehicleId,
};
use kernel::prelude::validation::{
    validate_cancellation_reason, validate_period, VEHICLE_ALREADY_BOOKED,
};
use kernel::{reject, KernelError, ValidationErrors};

use crate::service::IssueBookingReferenceService;
use crate::transfer::{
    BookingDto, CancelBookingDto, ConfirmBookingDto, CreateBookingDto, GetBookingDto,
    SearchBookingDto, UpdateBookingDto,
};

const BOOKING_NOT_FOUND: &str = "Booking not found";
const VEHICLE_NOT_FOUND: &str = "Vehicle not found.";
const VEHICLE_UNAVAILABLE: &str = "This vehicle is not available for booking.";

/// Loads a booking only when `customer_id` owns it; other customers' bookings
/// are indistinguishable from missing ones.
async fn find_owned<Q: BookingQuery>(
    query: &Q,
    connection: &mut Q::Transaction,
    booking_id: Uuid,
    customer_id: &UserId,
) -> error_stack::Result<Booking, KernelError> {
    query
        .find_by_id(connection, &BookingId::new(booking_id))
        .await?
        .filter(|booking| booking.is_owned_by(customer_id))
        .ok_or_else(|| reject(KernelError::NotFound, BOOKING_NOT_FOUND))
}

/// Fails with a conflict when a holding booking other than `excluding` already
/// occupies part of `period`. Callers hold the vehicle's schedule lock.
async fn ensure_vacant<Q: BookingQuery>(
    query: &Q,
    connection: &mut Q::Transaction,
    vehicle_id: &VehicleId,
    period: &BookingPeriod,
    excluding: Option<&BookingId>,
) -> error_stack::Result<(), KernelError> {
    let overlapping = query
        .find_overlapping(connection, vehicle_id, period, excluding)
        .await?;
    if !overlapping.is_empty() {
        debug!(
            vehicle = %vehicle_id.as_ref(),
            clashes = overlapping.len(),
            "requested period overlaps existing bookings"
        );
        return Err(reject(KernelError::Conflict, VEHICLE_ALREADY_BOOKED));
    }
    Ok(())
}

#[async_trait::async_trait]
pub trait GetBookingService:
    'static + Sync + Send + DependOnDatabaseConnection + DependOnBookingQuery + DependOnClock
{
    async fn get_booking(&self, dto: GetBookingDto) -> error_stack::Result<BookingDto, KernelError> {
        let now = self.clock().now();
        let mut connection = self.database_connection().transact().await?;
        let customer_id = UserId::new(dto.customer_id);
        let booking = find_owned(
            self.booking_query(),
            &mut connection,
            dto.booking_id,
            &customer_id,
        )
        .await?;
        connection.commit().await?;
        Ok(BookingDto::new(booking, now))
    }
}

impl<T> GetBookingService for T where
    T: DependOnDatabaseConnection + DependOnBookingQuery + DependOnClock
{
}

#[async_trait::async_trait]
pub trait SearchBookingService:
    'static + Sync + Send + DependOnDatabaseConnection + DependOnBookingQuery + DependOnClock
{
    async fn search_bookings(
        &self,
        dto: SearchBookingDto,
    ) -> error_stack::Result<Vec<BookingDto>, KernelError> {
        let now = self.clock().now();
        let mut connection = self.database_connection().transact().await?;
        let customer_id = UserId::new(dto.customer_id);
        let bookings = self
            .booking_query()
            .search(&mut connection, &customer_id, &dto.filter)
            .await?;
        connection.commit().await?;
        Ok(bookings
            .into_iter()
            .map(|booking| BookingDto::new(booking, now))
            .collect())
    }
}

impl<T> SearchBookingService for T where
    T: DependOnDatabaseConnection + DependOnBookingQuery + DependOnClock
{
}

#[async_trait::async_trait]
pub trait CreateBookingService:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection
    + DependOnVehicleQuery
    + DependOnBookingQuery
    + DependOnBookingModifier
    + DependOnClock
    + IssueBookingReferenceService
{
    async fn create_booking(
        &self,
        dto: CreateBookingDto,
    ) -> error_stack::Result<BookingDto, KernelError> {
        let now = self.clock().now();
        let period = validate_period(dto.start_date, dto.end_date, now)
            .map_err(ValidationErrors::into_report)?;
        let customer_id = UserId::new(dto.customer_id);
        let vehicle_id = VehicleId::new(dto.vehicle_id);

        let mut connection = self.database_connection().transact().await?;
        let vehicle = self
            .vehicle_query()
            .find_by_id(&mut connection, &vehicle_id)
            .await?
            .ok_or_else(|| reject(KernelError::NotFound, VEHICLE_NOT_FOUND))?;
        if !vehicle.is_available() {
            return Err(reject(KernelError::Conflict, VEHICLE_UNAVAILABLE));
        }

        self.booking_modifier()
            .lock_vehicle_schedule(&mut connection, &vehicle_id)
            .await?;
        ensure_vacant(
            self.booking_query(),
            &mut connection,
            &vehicle_id,
            &period,
            None,
        )
        .await?;

        let reference = self.issue_booking_reference(&mut connection).await?;
        let booking = Booking::open(
            BookingId::new(Uuid::new_v4()),
            reference,
            customer_id,
            &vehicle,
            period,
            dto.pickup_location.map(PickupLocation::new),
            dto.return_location.map(ReturnLocation::new),
            dto.notes.map(BookingNotes::new),
            now,
        );
        self.booking_modifier()
            .create(&mut connection, &booking)
            .await?;
        connection.commit().await?;

        info!(
            booking = booking.reference().as_ref().as_str(),
            vehicle = %vehicle_id.as_ref(),
            "booking created"
        );
        Ok(BookingDto::new(booking, now))
    }
}

impl<T> CreateBookingService for T where
    T: DependOnDatabaseConnection
        + DependOnVehicleQuery
        + DependOnBookingQuery
        + DependOnBookingModifier
        + DependOnClock
        + IssueBookingReferenceService
{
}

#[async_trait::async_trait]
pub trait UpdateBookingService:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection
    + DependOnBookingQuery
    + DependOnBookingModifier
    + DependOnClock
{
    async fn update_booking(
        &self,
        dto: UpdateBookingDto,
    ) -> error_stack::Result<BookingDto, KernelError> {
        let now = self.clock().now();
        let customer_id = UserId::new(dto.customer_id);
        let revision = BookingRevision {
            start_date: dto.start_date,
            end_date: dto.end_date,
            pickup_location: dto.pickup_location.map(PickupLocation::new),
            return_location: dto.return_location.map(ReturnLocation::new),
            notes: dto.notes.map(BookingNotes::new),
        };
        let reschedules = revision.reschedules();

        let mut connection = self.database_connection().transact().await?;
        self.booking_modifier()
            .lock_booking(&mut connection, &BookingId::new(dto.booking_id))
            .await?;
        let booking = find_owned(
            self.booking_query(),
            &mut connection,
            dto.booking_id,
            &customer_id,
        )
        .await?;
        let revised = booking.revise(revision, now)?;

        if reschedules {
            self.booking_modifier()
                .lock_vehicle_schedule(&mut connection, revised.vehicle_id())
                .await?;
            ensure_vacant(
                self.booking_query(),
                &mut connection,
                revised.vehicle_id(),
                revised.period(),
                Some(revised.id()),
            )
            .await?;
        }

        self.booking_modifier()
            .update(&mut connection, &revised)
            .await?;
        connection.commit().await?;

        info!(
            booking = revised.reference().as_ref().as_str(),
            reschedules, "booking updated"
        );
        Ok(BookingDto::new(revised, now))
    }
}

impl<T> UpdateBookingService for T where
    T: DependOnDatabaseConnection + DependOnBookingQuery + DependOnBookingModifier + DependOnClock
{
}

#[async_trait::async_trait]
pub trait ConfirmBookingService:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection
    + DependOnBookingQuery
    + DependOnBookingModifier
    + DependOnClock
{
    async fn confirm_booking(
        &self,
        dto: ConfirmBookingDto,
    ) -> error_stack::Result<BookingDto, KernelError> {
        let now = self.clock().now();
        let customer_id = UserId::new(dto.customer_id);

        let mut connection = self.database_connection().transact().await?;
        self.booking_modifier()
            .lock_booking(&mut connection, &BookingId::new(dto.booking_id))
            .await?;
        let booking = find_owned(
            self.booking_query(),
            &mut connection,
            dto.booking_id,
            &customer_id,
        )
        .await?;
        let confirmed = booking.confirm(now)?;
        self.booking_modifier()
            .update(&mut connection, &confirmed)
            .await?;
        connection.commit().await?;

        info!(booking = confirmed.reference().as_ref().as_str(), "booking confirmed");
        Ok(BookingDto::new(confirmed, now))
    }
}

impl<T> ConfirmBookingService for T where
    T: DependOnDatabaseConnection + DependOnBookingQuery + DependOnBookingModifier + DependOnClock
{
}

#[async_trait::async_trait]
pub trait CancelBookingService:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection
    + DependOnBookingQuery
    + DependOnBookingModifier
    + DependOnClock
{
    async fn cancel_booking(
        &self,
        dto: CancelBookingDto,
    ) -> error_stack::Result<BookingDto, KernelError> {
        let now = self.clock().now();
        let customer_id = UserId::new(dto.customer_id);
        let reason = validate_cancellation_reason(dto.cancellation_reason)
            .map_err(ValidationErrors::into_report)?;

        let mut connection = self.database_connection().transact().await?;
        self.booking_modifier()
            .lock_booking(&mut connection, &BookingId::new(dto.booking_id))
            .await?;
        let booking = find_owned(
            self.booking_query(),
            &mut connection,
            dto.booking_id,
            &customer_id,
        )
        .await?;
        let cancelled = booking.cancel(reason, now)?;
        self.booking_modifier()
            .update(&mut connection, &cancelled)
            .await?;
        connection.commit().await?;

        info!(booking = cancelled.reference().as_ref().as_str(), "booking cancelled");
        Ok(BookingDto::new(cancelled, now))
    }
}

impl<T> CancelBookingService for T where
    T: DependOnDatabaseConnection + DependOnBookingQuery + DependOnBookingModifier + DependOnClock
{
}

#[cfg(test)]
mod test {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    use error_stack::Report;
    use rust_decimal::Decimal;
    use time::macros::datetime;
    use time::{Duration, OffsetDateTime};
    use uuid::Uuid;

    use driver::database::{
        InMemoryBookingRepository, InMemoryDatabase, InMemoryVehicleRepository,
    };
    use kernel::interface::database::{
        DatabaseConnection, DependOnDatabaseConnection, Transaction,
    };
    use kernel::interface::query::{DependOnBookingQuery, DependOnVehicleQuery, BookingQuery};
    use kernel::interface::system::{
        BookingReferenceGenerator, Clock, DependOnBookingReferenceGenerator, DependOnClock,
    };
    use kernel::interface::update::{
        BookingModifier, DependOnBookingModifier, DependOnVehicleModifier, VehicleModifier,
    };
    use kernel::prelude::entity::{
        BookingId, BookingReference, BookingStatus, DailyRate, UserId, Vehicle, VehicleId,
        VehicleMake, VehicleModel, VehicleStatus,
    };
    use kernel::prelude::search::BookingFilter;
    use kernel::{ErrorReason, KernelError, ValidationErrors};

    use crate::service::{
        CancelBookingService, ConfirmBookingService, CreateBookingService, GetBookingService,
        SearchBookingService, UpdateBookingService, MAX_REFERENCE_ATTEMPTS,
    };
    use crate::transfer::{
        BookingDto, CancelBookingDto, ConfirmBookingDto, CreateBookingDto, GetBookingDto,
        SearchBookingDto, UpdateBookingDto,
    };

    const NOW: OffsetDateTime = datetime!(2030-03-10 12:00 UTC);

    struct FixedClock(Mutex<OffsetDateTime>);

    impl Clock for FixedClock {
        fn now(&self) -> OffsetDateTime {
            *self.0.lock().unwrap()
        }
    }

    /// Hands out scripted references first, then `GEN00001`, `GEN00002`, ...
    struct ScriptedReferences {
        script: Mutex<VecDeque<String>>,
        issued: AtomicU32,
    }

    impl BookingReferenceGenerator for ScriptedReferences {
        fn generate(&self) -> BookingReference {
            let scripted = self.script.lock().unwrap().pop_front();
            let reference = scripted.unwrap_or_else(|| {
                format!("GEN{:05}", self.issued.fetch_add(1, Ordering::SeqCst) + 1)
            });
            BookingReference::new(reference)
        }
    }

    struct Module {
        db: InMemoryDatabase,
        clock: FixedClock,
        references: ScriptedReferences,
    }

    impl Module {
        fn new() -> Self {
            Self {
                db: InMemoryDatabase::new(),
                clock: FixedClock(Mutex::new(NOW)),
                references: ScriptedReferences {
                    script: Mutex::new(VecDeque::new()),
                    issued: AtomicU32::new(0),
                },
            }
        }

        fn travel_to(&self, at: OffsetDateTime) {
            *self.clock.0.lock().unwrap() = at;
        }

        fn script_references(&self, references: &[&str]) {
            self.references
                .script
                .lock()
                .unwrap()
                .extend(references.iter().map(ToString::to_string));
        }

        async fn seed_vehicle(&self, rate: &str, status: VehicleStatus) -> Vehicle {
            let vehicle = Vehicle::new(
                VehicleId::new(Uuid::new_v4()),
                UserId::new(Uuid::new_v4()),
                VehicleMake::new("Toyota"),
                VehicleModel::new("Corolla"),
                DailyRate::new(dec(rate)),
                status,
            );
            let mut con = self.db.transact().await.unwrap();
            InMemoryVehicleRepository
                .create(&mut con, &vehicle)
                .await
                .unwrap();
            con.commit().await.unwrap();
            vehicle
        }

        async fn force_status(&self, booking_id: Uuid, status: BookingStatus) {
            let mut con = self.db.transact().await.unwrap();
            let booking = InMemoryBookingRepository
                .find_by_id(&mut con, &BookingId::new(booking_id))
                .await
                .unwrap()
                .unwrap();
            let booking = booking.reconstruct(|b| b.status = status);
            InMemoryBookingRepository
                .update(&mut con, &booking)
                .await
                .unwrap();
            con.commit().await.unwrap();
        }
    }

    impl DependOnDatabaseConnection for Module {
        type DatabaseConnection = InMemoryDatabase;
        fn database_connection(&self) -> &Self::DatabaseConnection {
            &self.db
        }
    }

    impl DependOnVehicleQuery for Module {
        type VehicleQuery = InMemoryVehicleRepository;
        fn vehicle_query(&self) -> &Self::VehicleQuery {
            &InMemoryVehicleRepository
        }
    }

    impl DependOnVehicleModifier for Module {
        type VehicleModifier = InMemoryVehicleRepository;
        fn vehicle_modifier(&self) -> &Self::VehicleModifier {
            &InMemoryVehicleRepository
        }
    }

    impl DependOnBookingQuery for Module {
        type BookingQuery = InMemoryBookingRepository;
        fn booking_query(&self) -> &Self::BookingQuery {
            &InMemoryBookingRepository
        }
    }

    impl DependOnBookingModifier for Module {
        type BookingModifier = InMemoryBookingRepository;
        fn booking_modifier(&self) -> &Self::BookingModifier {
            &InMemoryBookingRepository
        }
    }

    impl DependOnClock for Module {
        type Clock = FixedClock;
        fn clock(&self) -> &Self::Clock {
            &self.clock
        }
    }

    impl DependOnBookingReferenceGenerator for Module {
        type BookingReferenceGenerator = ScriptedReferences;
        fn booking_reference_generator(&self) -> &Self::BookingReferenceGenerator {
            &self.references
        }
    }

    fn dec(raw: &str) -> Decimal {
        raw.parse().unwrap()
    }

    fn reason(report: &Report<KernelError>) -> Option<&str> {
        report.downcast_ref::<ErrorReason>().map(ErrorReason::as_str)
    }

    fn create_dto(
        customer: Uuid,
        vehicle: &Vehicle,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> CreateBookingDto {
        CreateBookingDto {
            customer_id: customer,
            vehicle_id: *vehicle.id().as_ref(),
            start_date: Some(start),
            end_date: Some(end),
            pickup_location: Some("Airport".to_string()),
            return_location: None,
            notes: None,
        }
    }

    fn update_dto(customer: Uuid, booking: &BookingDto) -> UpdateBookingDto {
        UpdateBookingDto {
            customer_id: customer,
            booking_id: booking.id,
            start_date: None,
            end_date: None,
            pickup_location: None,
            return_location: None,
            notes: None,
        }
    }

    async fn get(module: &Module, customer: Uuid, booking: &BookingDto) -> BookingDto {
        module
            .get_booking(GetBookingDto {
                customer_id: customer,
                booking_id: booking.id,
            })
            .await
            .unwrap()
    }

    fn day(n: i64) -> OffsetDateTime {
        NOW + Duration::days(n)
    }

    #[tokio::test]
    async fn create_prices_two_days_and_snapshots_rate() {
        let module = Module::new();
        let customer = Uuid::new_v4();
        let vehicle = module.seed_vehicle("50.00", VehicleStatus::Available).await;

        let created = module
            .create_booking(create_dto(customer, &vehicle, day(1), day(3)))
            .await
            .unwrap();
        assert_eq!(created.total_amount, dec("100.00"));
        assert_eq!(created.deposit_amount, dec("20.00"));
        assert_eq!(created.status, BookingStatus::Pending);
        assert_eq!(created.booking_number, "GEN00001");
        assert_eq!(created.duration_days, dec("2"));
        assert!(created.is_upcoming);
        assert!(!created.is_active);
        assert_eq!(created.pickup_location.as_deref(), Some("Airport"));

        let repriced = vehicle
            .clone()
            .reconstruct(|v| v.daily_rate = DailyRate::new(dec("80.00")));
        let mut con = module.db.transact().await.unwrap();
        InMemoryVehicleRepository
            .update(&mut con, &repriced)
            .await
            .unwrap();
        con.commit().await.unwrap();

        let fetched = get(&module, customer, &created).await;
        assert_eq!(fetched.daily_rate, dec("50.00"));
        assert_eq!(fetched.total_amount, dec("100.00"));
    }

    #[tokio::test]
    async fn overlapping_create_is_rejected_and_first_is_untouched() {
        let module = Module::new();
        let customer = Uuid::new_v4();
        let vehicle = module.seed_vehicle("50.00", VehicleStatus::Available).await;

        let first = module
            .create_booking(create_dto(customer, &vehicle, day(1), day(3)))
            .await
            .unwrap();
        let report = module
            .create_booking(create_dto(Uuid::new_v4(), &vehicle, day(2), day(4)))
            .await
            .unwrap_err();
        assert_eq!(*report.current_context(), KernelError::Conflict);
        assert_eq!(
            reason(&report),
            Some("This vehicle is already booked for the selected dates.")
        );
        assert_eq!(get(&module, customer, &first).await, first);
    }

    #[tokio::test]
    async fn touching_periods_coexist() {
        let module = Module::new();
        let vehicle = module.seed_vehicle("50.00", VehicleStatus::Available).await;

        module
            .create_booking(create_dto(Uuid::new_v4(), &vehicle, day(1), day(3)))
            .await
            .unwrap();
        module
            .create_booking(create_dto(Uuid::new_v4(), &vehicle, day(3), day(4)))
            .await
            .unwrap();
        module
            .create_booking(create_dto(Uuid::new_v4(), &vehicle, day(0) + Duration::hours(1), day(1)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn concurrent_overlapping_creates_admit_one() {
        let module = Module::new();
        let vehicle = module.seed_vehicle("50.00", VehicleStatus::Available).await;

        let (a, b) = tokio::join!(
            module.create_booking(create_dto(Uuid::new_v4(), &vehicle, day(1), day(3))),
            module.create_booking(create_dto(Uuid::new_v4(), &vehicle, day(2), day(5))),
        );
        let results = [a, b];
        assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
        let failure = results.iter().find_map(|result| result.as_ref().err()).unwrap();
        assert_eq!(*failure.current_context(), KernelError::Conflict);
    }

    #[tokio::test]
    async fn cancelled_bookings_release_the_vehicle() {
        let module = Module::new();
        let customer = Uuid::new_v4();
        let vehicle = module.seed_vehicle("50.00", VehicleStatus::Available).await;

        let first = module
            .create_booking(create_dto(customer, &vehicle, day(1), day(3)))
            .await
            .unwrap();
        module
            .cancel_booking(CancelBookingDto {
                customer_id: customer,
                booking_id: first.id,
                cancellation_reason: None,
            })
            .await
            .unwrap();
        module
            .create_booking(create_dto(Uuid::new_v4(), &vehicle, day(2), day(4)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn vehicle_must_exist_and_be_available() {
        let module = Module::new();
        let in_service = module.seed_vehicle("50.00", VehicleStatus::Maintenance).await;

        let report = module
            .create_booking(create_dto(Uuid::new_v4(), &in_service, day(1), day(2)))
            .await
            .unwrap_err();
        assert_eq!(*report.current_context(), KernelError::Conflict);
        assert_eq!(reason(&report), Some("This vehicle is not available for booking."));

        let mut dto = create_dto(Uuid::new_v4(), &in_service, day(1), day(2));
        dto.vehicle_id = Uuid::new_v4();
        let report = module.create_booking(dto).await.unwrap_err();
        assert_eq!(*report.current_context(), KernelError::NotFound);
        assert_eq!(reason(&report), Some("Vehicle not found."));
    }

    #[tokio::test]
    async fn invalid_period_is_a_validation_error_and_writes_nothing() {
        let module = Module::new();
        let customer = Uuid::new_v4();
        let vehicle = module.seed_vehicle("50.00", VehicleStatus::Available).await;

        let report = module
            .create_booking(create_dto(customer, &vehicle, day(-1), day(-2)))
            .await
            .unwrap_err();
        assert_eq!(*report.current_context(), KernelError::Validation);
        let errors = report.downcast_ref::<ValidationErrors>().unwrap();
        assert!(errors.has_field("start_date"));
        assert!(errors.has_field("end_date"));

        let listed = module
            .search_bookings(SearchBookingDto {
                customer_id: customer,
                filter: BookingFilter::new(),
            })
            .await
            .unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn reference_collisions_are_redrawn() {
        let module = Module::new();
        let vehicle = module.seed_vehicle("50.00", VehicleStatus::Available).await;
        module.script_references(&["TAKEN001", "TAKEN001", "FRESH002"]);

        let first = module
            .create_booking(create_dto(Uuid::new_v4(), &vehicle, day(1), day(2)))
            .await
            .unwrap();
        let second = module
            .create_booking(create_dto(Uuid::new_v4(), &vehicle, day(2), day(3)))
            .await
            .unwrap();
        assert_eq!(first.booking_number, "TAKEN001");
        assert_eq!(second.booking_number, "FRESH002");
    }

    #[tokio::test]
    async fn exhausted_reference_space_is_an_internal_error() {
        let module = Module::new();
        let vehicle = module.seed_vehicle("50.00", VehicleStatus::Available).await;
        module.script_references(&["TAKEN001"]);
        module
            .create_booking(create_dto(Uuid::new_v4(), &vehicle, day(1), day(2)))
            .await
            .unwrap();

        module.script_references(&["TAKEN001"; MAX_REFERENCE_ATTEMPTS]);
        let report = module
            .create_booking(create_dto(Uuid::new_v4(), &vehicle, day(2), day(3)))
            .await
            .unwrap_err();
        assert_eq!(*report.current_context(), KernelError::Internal);
    }

    #[tokio::test]
    async fn confirm_is_a_guarded_transition() {
        let module = Module::new();
        let customer = Uuid::new_v4();
        let vehicle = module.seed_vehicle("50.00", VehicleStatus::Available).await;
        let created = module
            .create_booking(create_dto(customer, &vehicle, day(1), day(2)))
            .await
            .unwrap();

        let confirm = || ConfirmBookingDto {
            customer_id: customer,
            booking_id: created.id,
        };
        let confirmed = module.confirm_booking(confirm()).await.unwrap();
        assert_eq!(confirmed.status, BookingStatus::Confirmed);

        let report = module.confirm_booking(confirm()).await.unwrap_err();
        assert_eq!(*report.current_context(), KernelError::Conflict);
        assert_eq!(reason(&report), Some("Booking cannot be confirmed"));
        assert_eq!(get(&module, customer, &created).await, confirmed);
    }

    #[tokio::test]
    async fn cancel_confirmed_booking_starting_tomorrow() {
        let module = Module::new();
        let customer = Uuid::new_v4();
        let vehicle = module.seed_vehicle("50.00", VehicleStatus::Available).await;
        let created = module
            .create_booking(create_dto(customer, &vehicle, day(1), day(4)))
            .await
            .unwrap();
        module
            .confirm_booking(ConfirmBookingDto {
                customer_id: customer,
                booking_id: created.id,
            })
            .await
            .unwrap();

        let cancelled = module
            .cancel_booking(CancelBookingDto {
                customer_id: customer,
                booking_id: created.id,
                cancellation_reason: Some("Flight moved".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert!(cancelled.is_cancelled);
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("Flight moved"));
    }

    #[tokio::test]
    async fn cancel_refuses_completed_and_started_bookings() {
        let module = Module::new();
        let customer = Uuid::new_v4();
        let vehicle = module.seed_vehicle("50.00", VehicleStatus::Available).await;
        let completed = module
            .create_booking(create_dto(customer, &vehicle, day(1), day(2)))
            .await
            .unwrap();
        module.force_status(completed.id, BookingStatus::Completed).await;
        let started = module
            .create_booking(create_dto(customer, &vehicle, day(3), day(5)))
            .await
            .unwrap();

        let cancel = |booking: &BookingDto| CancelBookingDto {
            customer_id: customer,
            booking_id: booking.id,
            cancellation_reason: None,
        };
        let report = module.cancel_booking(cancel(&completed)).await.unwrap_err();
        assert_eq!(*report.current_context(), KernelError::Conflict);
        assert_eq!(reason(&report), Some("This booking cannot be cancelled"));
        assert_eq!(
            get(&module, customer, &completed).await.status,
            BookingStatus::Completed
        );

        module.travel_to(day(3) + Duration::hours(1));
        let before = get(&module, customer, &started).await;
        let report = module.cancel_booking(cancel(&started)).await.unwrap_err();
        assert_eq!(*report.current_context(), KernelError::Conflict);
        assert_eq!(get(&module, customer, &started).await, before);
    }

    #[tokio::test]
    async fn cancellation_reason_is_limited() {
        let module = Module::new();
        let customer = Uuid::new_v4();
        let vehicle = module.seed_vehicle("50.00", VehicleStatus::Available).await;
        let created = module
            .create_booking(create_dto(customer, &vehicle, day(1), day(2)))
            .await
            .unwrap();

        let report = module
            .cancel_booking(CancelBookingDto {
                customer_id: customer,
                booking_id: created.id,
                cancellation_reason: Some("x".repeat(501)),
            })
            .await
            .unwrap_err();
        assert_eq!(*report.current_context(), KernelError::Validation);
        assert_eq!(get(&module, customer, &created).await, created);
    }

    #[tokio::test]
    async fn other_customers_bookings_are_not_found() {
        let module = Module::new();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let vehicle = module.seed_vehicle("50.00", VehicleStatus::Available).await;
        let created = module
            .create_booking(create_dto(owner, &vehicle, day(1), day(2)))
            .await
            .unwrap();

        let report = module
            .get_booking(GetBookingDto {
                customer_id: stranger,
                booking_id: created.id,
            })
            .await
            .unwrap_err();
        assert_eq!(*report.current_context(), KernelError::NotFound);
        assert_eq!(reason(&report), Some("Booking not found"));

        let report = module
            .confirm_booking(ConfirmBookingDto {
                customer_id: stranger,
                booking_id: created.id,
            })
            .await
            .unwrap_err();
        assert_eq!(*report.current_context(), KernelError::NotFound);

        let report = module
            .cancel_booking(CancelBookingDto {
                customer_id: stranger,
                booking_id: created.id,
                cancellation_reason: None,
            })
            .await
            .unwrap_err();
        assert_eq!(*report.current_context(), KernelError::NotFound);
        assert_eq!(get(&module, owner, &created).await, created);
    }

    #[tokio::test]
    async fn reschedule_reprices_and_rechecks_overlap() {
        let module = Module::new();
        let customer = Uuid::new_v4();
        let vehicle = module.seed_vehicle("40.00", VehicleStatus::Available).await;
        let booking = module
            .create_booking(create_dto(customer, &vehicle, day(1), day(3)))
            .await
            .unwrap();
        let other = module
            .create_booking(create_dto(Uuid::new_v4(), &vehicle, day(5), day(6)))
            .await
            .unwrap();

        let mut shift = update_dto(customer, &booking);
        shift.start_date = Some(day(2));
        shift.end_date = Some(day(3) + Duration::hours(12));
        shift.notes = Some("late pickup".to_string());
        let shifted = module.update_booking(shift).await.unwrap();
        assert_eq!(shifted.total_amount, dec("60.00"));
        assert_eq!(shifted.deposit_amount, dec("12.00"));
        assert_eq!(shifted.daily_rate, dec("40.00"));
        assert_eq!(shifted.notes.as_deref(), Some("late pickup"));
        assert_eq!(shifted.pickup_location.as_deref(), Some("Airport"));

        let mut clash = update_dto(customer, &booking);
        clash.end_date = Some(day(5) + Duration::hours(1));
        let report = module.update_booking(clash).await.unwrap_err();
        assert_eq!(*report.current_context(), KernelError::Conflict);
        assert_eq!(get(&module, customer, &booking).await, shifted);
        assert_eq!(get(&module, other.customer_id, &other).await, other);
    }

    #[tokio::test]
    async fn update_validates_dates_and_status() {
        let module = Module::new();
        let customer = Uuid::new_v4();
        let vehicle = module.seed_vehicle("40.00", VehicleStatus::Available).await;
        let booking = module
            .create_booking(create_dto(customer, &vehicle, day(1), day(3)))
            .await
            .unwrap();

        let mut inverted = update_dto(customer, &booking);
        inverted.end_date = Some(day(1));
        let report = module.update_booking(inverted).await.unwrap_err();
        assert_eq!(*report.current_context(), KernelError::Validation);

        module.force_status(booking.id, BookingStatus::Cancelled).await;
        let report = module
            .update_booking(update_dto(customer, &booking))
            .await
            .unwrap_err();
        assert_eq!(*report.current_context(), KernelError::Conflict);
        assert_eq!(
            reason(&report),
            Some("Cannot modify completed or cancelled bookings.")
        );
    }

    #[tokio::test]
    async fn search_lists_own_bookings_newest_first() {
        let module = Module::new();
        let customer = Uuid::new_v4();
        let vehicle = module.seed_vehicle("40.00", VehicleStatus::Available).await;
        let first = module
            .create_booking(create_dto(customer, &vehicle, day(1), day(2)))
            .await
            .unwrap();
        module.travel_to(NOW + Duration::minutes(5));
        let second = module
            .create_booking(create_dto(customer, &vehicle, day(2), day(3)))
            .await
            .unwrap();
        module
            .create_booking(create_dto(Uuid::new_v4(), &vehicle, day(3), day(4)))
            .await
            .unwrap();
        module
            .confirm_booking(ConfirmBookingDto {
                customer_id: customer,
                booking_id: first.id,
            })
            .await
            .unwrap();

        let listed = module
            .search_bookings(SearchBookingDto {
                customer_id: customer,
                filter: BookingFilter::new(),
            })
            .await
            .unwrap();
        let ids = listed.iter().map(|booking| booking.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![second.id, first.id]);

        let confirmed = module
            .search_bookings(SearchBookingDto {
                customer_id: customer,
                filter: BookingFilter::new().with_status(Some(BookingStatus::Confirmed)),
            })
            .await
            .unwrap();
        assert_eq!(confirmed.len(), 1);
        assert_eq!(confirmed[0].id, first.id);
    }
}
