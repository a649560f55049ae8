use error_stack::Report;
use rust_decimal::Decimal;
use sqlx::{PgConnection, Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use kernel::interface::query::BookingQuery;
use kernel::interface::update::BookingModifier;
use kernel::prelude::entity::{
    Booking, BookingId, BookingNotes, BookingPeriod, BookingReference, BookingStatus,
    CancellationReason, CreatedAt, DailyRate, DepositAmount, PaymentStatus, PickupLocation,
    ReturnLocation, TotalAmount, UpdatedAt, UserId, VehicleId,
};
use kernel::prelude::search::{BookingFilter, OrderingKey};
use kernel::KernelError;

use crate::database::postgres::PostgresTransaction;
use crate::error::ConvertError;

pub struct PostgresBookingRepository;

#[async_trait::async_trait]
impl BookingQuery for PostgresBookingRepository {
    type Transaction = PostgresTransaction;

    async fn find_by_id(
        &self,
        con: &mut PostgresTransaction,
        id: &BookingId,
    ) -> error_stack::Result<Option<Booking>, KernelError> {
        PgBookingInternal::find_by_id(con, id).await
    }

    async fn exists_reference(
        &self,
        con: &mut PostgresTransaction,
        reference: &BookingReference,
    ) -> error_stack::Result<bool, KernelError> {
        PgBookingInternal::exists_reference(con, reference).await
    }

    async fn find_overlapping(
        &self,
        con: &mut PostgresTransaction,
        vehicle_id: &VehicleId,
        period: &BookingPeriod,
        excluding: Option<&BookingId>,
    ) -> error_stack::Result<Vec<Booking>, KernelError> {
        PgBookingInternal::find_overlapping(con, vehicle_id, period, excluding).await
    }

    async fn search(
        &self,
        con: &mut PostgresTransaction,
        customer_id: &UserId,
        filter: &BookingFilter,
    ) -> error_stack::Result<Vec<Booking>, KernelError> {
        PgBookingInternal::search(con, customer_id, filter).await
    }
}

#[async_trait::async_trait]
impl BookingModifier for PostgresBookingRepository {
    type Transaction = PostgresTransaction;

    async fn lock_vehicle_schedule(
        &self,
        con: &mut PostgresTransaction,
        vehicle_id: &VehicleId,
    ) -> error_stack::Result<(), KernelError> {
        PgBookingInternal::lock_vehicle_schedule(con, vehicle_id).await
    }

    async fn lock_booking(
        &self,
        con: &mut PostgresTransaction,
        id: &BookingId,
    ) -> error_stack::Result<(), KernelError> {
        PgBookingInternal::lock_booking(con, id).await
    }

    async fn create(
        &self,
        con: &mut PostgresTransaction,
        booking: &Booking,
    ) -> error_stack::Result<(), KernelError> {
        PgBookingInternal::create(con, booking).await
    }

    async fn update(
        &self,
        con: &mut PostgresTransaction,
        booking: &Booking,
    ) -> error_stack::Result<(), KernelError> {
        PgBookingInternal::update(con, booking).await
    }
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    reference: String,
    customer_id: Uuid,
    vehicle_id: Uuid,
    start_date: OffsetDateTime,
    end_date: OffsetDateTime,
    pickup_location: Option<String>,
    return_location: Option<String>,
    daily_rate: Decimal,
    total_amount: Decimal,
    deposit_amount: Decimal,
    status: String,
    payment_status: String,
    notes: Option<String>,
    cancellation_reason: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<BookingRow> for Booking {
    type Error = Report<KernelError>;
    fn try_from(value: BookingRow) -> Result<Self, Self::Error> {
        let period = BookingPeriod::new(value.start_date, value.end_date).ok_or_else(|| {
            Report::new(KernelError::Internal)
                .attach_printable(format!("booking {} has an empty period", value.id))
        })?;
        let status = BookingStatus::parse(&value.status).ok_or_else(|| {
            Report::new(KernelError::Internal)
                .attach_printable(format!("unknown booking status {}", value.status))
        })?;
        let payment_status = PaymentStatus::parse(&value.payment_status).ok_or_else(|| {
            Report::new(KernelError::Internal)
                .attach_printable(format!("unknown payment status {}", value.payment_status))
        })?;
        Ok(Booking::new(
            BookingId::new(value.id),
            BookingReference::new(value.reference),
            UserId::new(value.customer_id),
            VehicleId::new(value.vehicle_id),
            period,
            value.pickup_location.map(PickupLocation::new),
            value.return_location.map(ReturnLocation::new),
            DailyRate::new(value.daily_rate),
            TotalAmount::new(value.total_amount),
            DepositAmount::new(value.deposit_amount),
            status,
            payment_status,
            value.notes.map(BookingNotes::new),
            value.cancellation_reason.map(CancellationReason::new),
            CreatedAt::new(value.created_at),
            UpdatedAt::new(value.updated_at),
        ))
    }
}

fn into_bookings(rows: Vec<BookingRow>) -> error_stack::Result<Vec<Booking>, KernelError> {
    rows.into_iter().map(Booking::try_from).collect()
}

pub(in crate::database) struct PgBookingInternal;

impl PgBookingInternal {
    async fn find_by_id(
        con: &mut PgConnection,
        id: &BookingId,
    ) -> error_stack::Result<Option<Booking>, KernelError> {
        let row = sqlx::query_as::<_, BookingRow>(
            // language=postgresql
            r#"
            SELECT id, reference, customer_id, vehicle_id, start_date, end_date,
                   pickup_location, return_location, daily_rate, total_amount, deposit_amount,
                   status, payment_status, notes, cancellation_reason, created_at, updated_at
            FROM bookings
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        row.map(Booking::try_from).transpose()
    }

    async fn exists_reference(
        con: &mut PgConnection,
        reference: &BookingReference,
    ) -> error_stack::Result<bool, KernelError> {
        let exists = sqlx::query_scalar::<_, bool>(
            // language=postgresql
            r#"
            SELECT EXISTS(SELECT 1 FROM bookings WHERE reference = $1)
            "#,
        )
        .bind(reference.as_ref())
        .fetch_one(con)
        .await
        .convert_error()?;
        Ok(exists)
    }

    async fn find_overlapping(
        con: &mut PgConnection,
        vehicle_id: &VehicleId,
        period: &BookingPeriod,
        excluding: Option<&BookingId>,
    ) -> error_stack::Result<Vec<Booking>, KernelError> {
        let rows = sqlx::query_as::<_, BookingRow>(
            // language=postgresql
            r#"
            SELECT id, reference, customer_id, vehicle_id, start_date, end_date,
                   pickup_location, return_location, daily_rate, total_amount, deposit_amount,
                   status, payment_status, notes, cancellation_reason, created_at, updated_at
            FROM bookings
            WHERE vehicle_id = $1
              AND status IN ('pending', 'confirmed', 'active')
              AND start_date < $2
              AND end_date > $3
              AND ($4::uuid IS NULL OR id <> $4)
            "#,
        )
        .bind(vehicle_id.as_ref())
        .bind(period.end())
        .bind(period.start())
        .bind(excluding.map(AsRef::<Uuid>::as_ref))
        .fetch_all(con)
        .await
        .convert_error()?;
        into_bookings(rows)
    }

    async fn search(
        con: &mut PgConnection,
        customer_id: &UserId,
        filter: &BookingFilter,
    ) -> error_stack::Result<Vec<Booking>, KernelError> {
        let mut query = QueryBuilder::<Postgres>::new(
            // language=postgresql
            r#"
            SELECT b.id, b.reference, b.customer_id, b.vehicle_id, b.start_date, b.end_date,
                   b.pickup_location, b.return_location, b.daily_rate, b.total_amount,
                   b.deposit_amount, b.status, b.payment_status, b.notes, b.cancellation_reason,
                   b.created_at, b.updated_at
            FROM bookings b
            LEFT JOIN vehicles v ON v.id = b.vehicle_id
            WHERE b.customer_id = "#,
        );
        query.push_bind(*customer_id.as_ref());
        if let Some(status) = filter.status() {
            query.push(" AND b.status = ").push_bind(status.as_str());
        }
        if let Some(payment_status) = filter.payment_status() {
            query
                .push(" AND b.payment_status = ")
                .push_bind(payment_status.as_str());
        }
        if let Some(from) = filter.from() {
            query.push(" AND b.start_date >= ").push_bind(*from);
        }
        if let Some(to) = filter.to() {
            query.push(" AND b.end_date <= ").push_bind(*to);
        }
        for term in filter.terms() {
            query
                .push(" AND (strpos(lower(b.reference), ")
                .push_bind(term.clone())
                .push(") > 0 OR strpos(lower(coalesce(v.make, '')), ")
                .push_bind(term.clone())
                .push(") > 0 OR strpos(lower(coalesce(v.model, '')), ")
                .push_bind(term.clone())
                .push(") > 0)");
        }
        let column = match filter.ordering().key() {
            OrderingKey::CreatedAt => "b.created_at",
            OrderingKey::StartDate => "b.start_date",
            OrderingKey::TotalAmount => "b.total_amount",
        };
        let direction = if *filter.ordering().descending() {
            "DESC"
        } else {
            "ASC"
        };
        query
            .push(format!(
                " ORDER BY {column} {direction}, b.id {direction} LIMIT "
            ))
            .push_bind(*filter.limit().as_ref())
            .push(" OFFSET ")
            .push_bind(*filter.offset().as_ref());

        let rows = query
            .build_query_as::<BookingRow>()
            .fetch_all(con)
            .await
            .convert_error()?;
        into_bookings(rows)
    }

    async fn lock_vehicle_schedule(
        con: &mut PgConnection,
        vehicle_id: &VehicleId,
    ) -> error_stack::Result<(), KernelError> {
        sqlx::query(
            // language=postgresql
            r#"
            SELECT pg_advisory_xact_lock(hashtextextended($1, 0))
            "#,
        )
        .bind(vehicle_id.as_ref().to_string())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    async fn lock_booking(con: &mut PgConnection, id: &BookingId) -> error_stack::Result<(), KernelError> {
        sqlx::query(
            // language=postgresql
            r#"
            SELECT id FROM bookings WHERE id = $1 FOR UPDATE
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(())
    }

    async fn create(con: &mut PgConnection, booking: &Booking) -> error_stack::Result<(), KernelError> {
        sqlx::query(
            // language=postgresql
            r#"
            INSERT INTO bookings (
                id, reference, customer_id, vehicle_id, start_date, end_date,
                pickup_location, return_location, daily_rate, total_amount, deposit_amount,
                status, payment_status, notes, cancellation_reason, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(booking.id().as_ref())
        .bind(booking.reference().as_ref())
        .bind(booking.customer_id().as_ref())
        .bind(booking.vehicle_id().as_ref())
        .bind(booking.period().start())
        .bind(booking.period().end())
        .bind(booking.pickup_location().as_ref().map(AsRef::<String>::as_ref))
        .bind(booking.return_location().as_ref().map(AsRef::<String>::as_ref))
        .bind(booking.daily_rate().as_ref())
        .bind(booking.total_amount().as_ref())
        .bind(booking.deposit_amount().as_ref())
        .bind(booking.status().as_str())
        .bind(booking.payment_status().as_str())
        .bind(booking.notes().as_ref().map(AsRef::<String>::as_ref))
        .bind(booking.cancellation_reason().as_ref().map(AsRef::<String>::as_ref))
        .bind(booking.created_at().as_ref())
        .bind(booking.updated_at().as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    async fn update(con: &mut PgConnection, booking: &Booking) -> error_stack::Result<(), KernelError> {
        let updated = sqlx::query(
            // language=postgresql
            r#"
            UPDATE bookings
            SET start_date = $2, end_date = $3, pickup_location = $4, return_location = $5,
                total_amount = $6, deposit_amount = $7, status = $8, payment_status = $9,
                notes = $10, cancellation_reason = $11, updated_at = $12
            WHERE id = $1
            "#,
        )
        .bind(booking.id().as_ref())
        .bind(booking.period().start())
        .bind(booking.period().end())
        .bind(booking.pickup_location().as_ref().map(AsRef::<String>::as_ref))
        .bind(booking.return_location().as_ref().map(AsRef::<String>::as_ref))
        .bind(booking.total_amount().as_ref())
        .bind(booking.deposit_amount().as_ref())
        .bind(booking.status().as_str())
        .bind(booking.payment_status().as_str())
        .bind(booking.notes().as_ref().map(AsRef::<String>::as_ref))
        .bind(booking.cancellation_reason().as_ref().map(AsRef::<String>::as_ref))
        .bind(booking.updated_at().as_ref())
        .execute(con)
        .await
        .convert_error()?;
        if updated.rows_affected() == 0 {
            return Err(Report::new(KernelError::NotFound)
                .attach_printable(format!("booking {} does not exist", booking.id().as_ref())));
        }
        Ok(())
    }
}
