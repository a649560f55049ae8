use error_stack::Report;
use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use kernel::interface::query::VehicleQuery;
use kernel::interface::update::VehicleModifier;
use kernel::prelude::entity::{
    DailyRate, UserId, Vehicle, VehicleId, VehicleMake, VehicleModel, VehicleStatus,
};
use kernel::KernelError;

use crate::database::postgres::PostgresTransaction;
use crate::error::ConvertError;

pub struct PostgresVehicleRepository;

#[async_trait::async_trait]
impl VehicleQuery for PostgresVehicleRepository {
    type Transaction = PostgresTransaction;

    async fn find_by_id(
        &self,
        con: &mut PostgresTransaction,
        id: &VehicleId,
    ) -> error_stack::Result<Option<Vehicle>, KernelError> {
        PgVehicleInternal::find_by_id(con, id).await
    }
}

#[async_trait::async_trait]
impl VehicleModifier for PostgresVehicleRepository {
    type Transaction = PostgresTransaction;

    async fn create(
        &self,
        con: &mut PostgresTransaction,
        vehicle: &Vehicle,
    ) -> error_stack::Result<(), KernelError> {
        PgVehicleInternal::create(con, vehicle).await
    }

    async fn update(
        &self,
        con: &mut PostgresTransaction,
        vehicle: &Vehicle,
    ) -> error_stack::Result<(), KernelError> {
        PgVehicleInternal::update(con, vehicle).await
    }
}

#[derive(sqlx::FromRow)]
struct VehicleRow {
    id: Uuid,
    owner_id: Uuid,
    make: String,
    model: String,
    daily_rate: Decimal,
    status: String,
}

impl TryFrom<VehicleRow> for Vehicle {
    type Error = Report<KernelError>;
    fn try_from(value: VehicleRow) -> Result<Self, Self::Error> {
        let status = VehicleStatus::parse(&value.status).ok_or_else(|| {
            Report::new(KernelError::Internal)
                .attach_printable(format!("unknown vehicle status {}", value.status))
        })?;
        Ok(Vehicle::new(
            VehicleId::new(value.id),
            UserId::new(value.owner_id),
            VehicleMake::new(value.make),
            VehicleModel::new(value.model),
            DailyRate::new(value.daily_rate),
            status,
        ))
    }
}

pub(in crate::database) struct PgVehicleInternal;

impl PgVehicleInternal {
    async fn find_by_id(
        con: &mut PgConnection,
        id: &VehicleId,
    ) -> error_stack::Result<Option<Vehicle>, KernelError> {
        let row = sqlx::query_as::<_, VehicleRow>(
            // language=postgresql
            r#"
            SELECT id, owner_id, make, model, daily_rate, status
            FROM vehicles
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        row.map(Vehicle::try_from).transpose()
    }

    async fn create(con: &mut PgConnection, vehicle: &Vehicle) -> error_stack::Result<(), KernelError> {
        sqlx::query(
            // language=postgresql
            r#"
            INSERT INTO vehicles (id, owner_id, make, model, daily_rate, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(vehicle.id().as_ref())
        .bind(vehicle.owner_id().as_ref())
        .bind(AsRef::<String>::as_ref(vehicle.make()))
        .bind(AsRef::<String>::as_ref(vehicle.model()))
        .bind(vehicle.daily_rate().as_ref())
        .bind(vehicle.status().as_str())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    async fn update(con: &mut PgConnection, vehicle: &Vehicle) -> error_stack::Result<(), KernelError> {
        // language=postgresql
        sqlx::query(
            r#"
            UPDATE vehicles
            SET make = $2, model = $3, daily_rate = $4, status = $5
            WHERE id = $1
            "#,
        )
        .bind(vehicle.id().as_ref())
        .bind(AsRef::<String>::as_ref(vehicle.make()))
        .bind(AsRef::<String>::as_ref(vehicle.model()))
        .bind(vehicle.daily_rate().as_ref())
        .bind(vehicle.status().as_str())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }
}
