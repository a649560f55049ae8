use vodca::{AsRefln, Fromln};

#[derive(Debug, Clone, Eq, PartialEq, Fromln, AsRefln)]
pub struct PickupLocation(String);

impl PickupLocation {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Fromln, AsRefln)]
pub struct ReturnLocation(String);

impl ReturnLocation {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Fromln, AsRefln)]
pub struct BookingNotes(String);

impl BookingNotes {
    pub fn new(notes: impl Into<String>) -> Self {
        Self(notes.into())
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Fromln, AsRefln)]
pub struct CancellationReason(String);

impl CancellationReason {
    pub const MAX_LENGTH: usize = 500;

    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}
