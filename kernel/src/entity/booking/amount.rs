use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use vodca::{AsRefln, Fromln};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, Fromln, AsRefln)]
pub struct TotalAmount(Decimal);

impl TotalAmount {
    pub fn new(amount: impl Into<Decimal>) -> Self {
        Self(amount.into())
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize, Fromln, AsRefln)]
pub struct DepositAmount(Decimal);

impl DepositAmount {
    pub fn new(amount: impl Into<Decimal>) -> Self {
        Self(amount.into())
    }
}
