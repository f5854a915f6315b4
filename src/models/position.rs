use serde::{Deserialize, Serialize};

/// Device coordinates, serialized as the `{lat, lon}` body of `/api/location`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}
