mod id;
mod name;
mod rate;
mod status;

pub use self::{id::*, name::*, rate::*, status::*};
use crate::entity::UserId;
use destructure::{Destructure, Mutation};
use vodca::References;

/// The part of a fleet listing the booking engine reads: identity, the rate in
/// force right now and whether the vehicle can be rented at all.
#[derive(Debug, Clone, Eq, PartialEq, References, Destructure, Mutation)]
pub struct Vehicle {
    id: VehicleId,
    owner_id: UserId,
    make: VehicleMake,
    model: VehicleModel,
    daily_rate: DailyRate,
    status: VehicleStatus,
}

impl Vehicle {
    pub fn new(
        id: VehicleId,
        owner_id: UserId,
        make: VehicleMake,
        model: VehicleModel,
        daily_rate: DailyRate,
        status: VehicleStatus,
    ) -> Self {
        Self {
            id,
            owner_id,
            make,
            model,
            daily_rate,
            status,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == VehicleStatus::Available
    }
}
