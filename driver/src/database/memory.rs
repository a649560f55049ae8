use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::prelude::entity::{Booking, BookingId, Vehicle, VehicleId};
use kernel::KernelError;

pub use self::{booking::*, vehicle::*};

mod booking;
mod vehicle;

#[derive(Debug, Clone, Default)]
pub(in crate::database) struct MemoryStore {
    vehicles: HashMap<VehicleId, Vehicle>,
    bookings: BTreeMap<BookingId, Booking>,
}

/// Process-local store. One transaction runs at a time; the others wait for it
/// to finish, which makes every check-then-write sequence atomic.
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    store: Arc<Mutex<MemoryStore>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl DatabaseConnection for InMemoryDatabase {
    type Transaction = InMemoryTransaction;
    async fn transact(&self) -> error_stack::Result<Self::Transaction, KernelError> {
        let guard = Arc::clone(&self.store).lock_owned().await;
        let staged = guard.clone();
        Ok(InMemoryTransaction { guard, staged })
    }
}

/// Works on a private copy of the store; [`Transaction::commit`] publishes it.
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<MemoryStore>,
    staged: MemoryStore,
}

#[async_trait::async_trait]
impl Transaction for InMemoryTransaction {
    async fn commit(mut self) -> error_stack::Result<(), KernelError> {
        *self.guard = self.staged;
        Ok(())
    }

    async fn roll_back(self) -> error_stack::Result<(), KernelError> {
        Ok(())
    }
}
