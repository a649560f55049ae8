use std::ops::Deref;
use std::sync::Arc;

use driver::database::{PostgresBookingRepository, PostgresDatabase, PostgresVehicleRepository};
use driver::system::{RandomBookingReferenceGenerator, SystemClock};
use kernel::interface::database::DependOnDatabaseConnection;
use kernel::interface::query::{DependOnBookingQuery, DependOnVehicleQuery};
use kernel::interface::system::{DependOnBookingReferenceGenerator, DependOnClock};
use kernel::interface::update::DependOnBookingModifier;
use kernel::KernelError;

#[derive(Clone)]
pub struct AppModule(Arc<Handler>);

impl AppModule {
    pub async fn new() -> error_stack::Result<Self, KernelError> {
        Ok(Self(Arc::new(Handler::init().await?)))
    }
}

impl Deref for AppModule {
    type Target = Handler;
    fn deref(&self) -> &Self::Target {
        Deref::deref(&self.0)
    }
}

pub struct Handler {
    pgpool: PostgresDatabase,
    clock: SystemClock,
    reference_generator: RandomBookingReferenceGenerator,
}

impl Handler {
    pub async fn init() -> error_stack::Result<Self, KernelError> {
        let pgpool = PostgresDatabase::new().await?;
        pgpool.migrate().await?;

        Ok(Self {
            pgpool,
            clock: SystemClock,
            reference_generator: RandomBookingReferenceGenerator,
        })
    }
}

impl DependOnDatabaseConnection for Handler {
    type DatabaseConnection = PostgresDatabase;
    fn database_connection(&self) -> &Self::DatabaseConnection {
        &self.pgpool
    }
}

impl DependOnVehicleQuery for Handler {
    type VehicleQuery = PostgresVehicleRepository;
    fn vehicle_query(&self) -> &Self::VehicleQuery {
        &PostgresVehicleRepository
    }
}

impl DependOnBookingQuery for Handler {
    type BookingQuery = PostgresBookingRepository;
    fn booking_query(&self) -> &Self::BookingQuery {
        &PostgresBookingRepository
    }
}

impl DependOnBookingModifier for Handler {
    type BookingModifier = PostgresBookingRepository;
    fn booking_modifier(&self) -> &Self::BookingModifier {
        &PostgresBookingRepository
    }
}

impl DependOnClock for Handler {
    type Clock = SystemClock;
    fn clock(&self) -> &Self::Clock {
        &self.clock
    }
}

impl DependOnBookingReferenceGenerator for Handler {
    type BookingReferenceGenerator = RandomBookingReferenceGenerator;
    fn booking_reference_generator(&self) -> &Self::BookingReferenceGenerator {
        &self.reference_generator
    }
}
