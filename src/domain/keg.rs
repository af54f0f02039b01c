// Keg domain model - Sizes accepted by the pub and warehouse commands
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::dashboard::WAREHOUSE_KEGS;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid keg size {0} l")]
pub struct InvalidKegSize(pub u32);

/// Size of the keg currently tapped. Zero means no keg is tapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveKeg(u32);

impl ActiveKeg {
    pub fn litres(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for ActiveKeg {
    type Error = InvalidKegSize;

    fn try_from(litres: u32) -> Result<Self, Self::Error> {
        if litres == 0 || WAREHOUSE_KEGS.contains(&litres) {
            Ok(Self(litres))
        } else {
            Err(InvalidKegSize(litres))
        }
    }
}

/// Size of a keg stored in the warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarehouseKeg(u32);

impl WarehouseKeg {
    pub fn litres(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for WarehouseKeg {
    type Error = InvalidKegSize;

    fn try_from(litres: u32) -> Result<Self, Self::Error> {
        if WAREHOUSE_KEGS.contains(&litres) {
            Ok(Self(litres))
        } else {
            Err(InvalidKegSize(litres))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StockDirection {
    Up,
    Down,
}

impl fmt::Display for StockDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockDirection::Up => f.write_str("up"),
            StockDirection::Down => f.write_str("down"),
        }
    }
}
