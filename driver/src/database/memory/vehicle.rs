use error_stack::Report;

use kernel::interface::query::VehicleQuery;
use kernel::interface::update::VehicleModifier;
use kernel::prelude::entity::{Vehicle, VehicleId};
use kernel::KernelError;

use crate::database::memory::InMemoryTransaction;

pub struct InMemoryVehicleRepository;

#[async_trait::async_trait]
impl VehicleQuery for InMemoryVehicleRepository {
    type Transaction = InMemoryTransaction;

    async fn find_by_id(
        &self,
        con: &mut InMemoryTransaction,
        id: &VehicleId,
    ) -> error_stack::Result<Option<Vehicle>, KernelError> {
        Ok(con.staged.vehicles.get(id).cloned())
    }
}

#[async_trait::async_trait]
impl VehicleModifier for InMemoryVehicleRepository {
    type Transaction = InMemoryTransaction;

    async fn create(
        &self,
        con: &mut InMemoryTransaction,
        vehicle: &Vehicle,
    ) -> error_stack::Result<(), KernelError> {
        if con.staged.vehicles.contains_key(vehicle.id()) {
            return Err(Report::new(KernelError::Concurrency)
                .attach_printable(format!("vehicle {} already exists", vehicle.id().as_ref())));
        }
        con.staged
            .vehicles
            .insert(vehicle.id().clone(), vehicle.clone());
        Ok(())
    }

    async fn update(
        &self,
        con: &mut InMemoryTransaction,
        vehicle: &Vehicle,
    ) -> error_stack::Result<(), KernelError> {
        match con.staged.vehicles.get_mut(vehicle.id()) {
            Some(stored) => {
                *stored = vehicle.clone();
                Ok(())
            }
            None => Err(Report::new(KernelError::NotFound)
                .attach_printable(format!("vehicle {} does not exist", vehicle.id().as_ref()))),
        }
    }
}
