use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use application::service::{
    CancelBookingService, ConfirmBookingService, CreateBookingService, GetBookingService,
    SearchBookingService, UpdateBookingService,
};

use crate::controller::Controller;
use crate::error::ErrorStatus;
use crate::extract::{JsonBody, OptionalJson, PathParam, QueryParams};
use crate::handler::AppModule;
use crate::principal::Principal;
use crate::request::{
    BookingTransformer, CancelBookingRequest, ConfirmBookingRequest, CreateBookingRequest,
    GetBookingRequest, ListBookingsRequest, SearchBookingsRequest, UpdateBookingRequest,
};
use crate::response::BookingPresenter;

pub trait BookingRouter {
    fn route_booking(self) -> Self;
}

// PUT and PATCH share it: absent fields keep their current value either way.
async fn update_booking(
    State(module): State<AppModule>,
    principal: Principal,
    WithRejection(Path(id), _): PathParam<Uuid>,
    WithRejection(Json(req), _): JsonBody<UpdateBookingRequest>,
) -> Result<impl IntoResponse, ErrorStatus> {
    let transformed = Controller::new(BookingTransformer, BookingPresenter::updated())
        .try_intake((principal, id, req))?;
    transformed
        .handle(|dto| async move { module.update_booking(dto).await })
        .await
        .map_err(ErrorStatus::from)
}

impl BookingRouter for Router<AppModule> {
    fn route_booking(self) -> Self {
        self.route(
            "/bookings",
            get(
                |State(module): State<AppModule>,
                 principal: Principal,
                 WithRejection(Query(req), _): QueryParams<ListBookingsRequest>| async move {
                    let transformed = Controller::new(BookingTransformer, BookingPresenter::found())
                        .try_intake((principal, req))
                        .map_err(ErrorStatus::from)?;
                    transformed
                        .handle(|dto| async move { module.search_bookings(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            )
            .post(
                |State(module): State<AppModule>,
                 principal: Principal,
                 WithRejection(Json(req), _): JsonBody<CreateBookingRequest>| async move {
                    let transformed =
                        Controller::new(BookingTransformer, BookingPresenter::created())
                            .try_intake((principal, req))
                            .map_err(ErrorStatus::from)?;
                    transformed
                        .handle(|dto| async move { module.create_booking(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/bookings/search",
            get(
                |State(module): State<AppModule>,
                 principal: Principal,
                 WithRejection(Query(req), _): QueryParams<SearchBookingsRequest>| async move {
                    let transformed = Controller::new(BookingTransformer, BookingPresenter::found())
                        .try_intake((principal, req))
                        .map_err(ErrorStatus::from)?;
                    transformed
                        .handle(|dto| async move { module.search_bookings(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/bookings/:id",
            get(
                |State(module): State<AppModule>,
                 principal: Principal,
                 WithRejection(Path(id), _): PathParam<Uuid>| async move {
                    Controller::new(BookingTransformer, BookingPresenter::found())
                        .intake((principal, GetBookingRequest::new(id)))
                        .handle(|dto| async move { module.get_booking(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            )
            .put(update_booking)
            .patch(update_booking),
        )
        .route(
            "/bookings/:id/cancel",
            post(
                |State(module): State<AppModule>,
                 principal: Principal,
                 WithRejection(Path(id), _): PathParam<Uuid>,
                 OptionalJson(req): OptionalJson<CancelBookingRequest>| async move {
                    Controller::new(BookingTransformer, BookingPresenter::cancelled())
                        .intake((principal, id, req))
                        .handle(|dto| async move { module.cancel_booking(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/bookings/:id/confirm",
            post(
                |State(module): State<AppModule>,
                 principal: Principal,
                 WithRejection(Path(id), _): PathParam<Uuid>| async move {
                    Controller::new(BookingTransformer, BookingPresenter::confirmed())
                        .intake((principal, ConfirmBookingRequest::new(id)))
                        .handle(|dto| async move { module.confirm_booking(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
    }
}
