use vodca::{AsRefln, Fromln};

#[derive(Debug, Clone, Eq, PartialEq, Fromln, AsRefln)]
pub struct VehicleMake(String);

impl VehicleMake {
    pub fn new(make: impl Into<String>) -> Self {
        Self(make.into())
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Fromln, AsRefln)]
pub struct VehicleModel(String);

impl VehicleModel {
    pub fn new(model: impl Into<String>) -> Self {
        Self(model.into())
    }
}
