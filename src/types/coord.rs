const COORD_SCALE: f64 = 1_000_000.0;

/// A coordinate pair quantized to six decimal places.
///
/// Two coordinates that agree to six decimals map to the same key. Used as the
/// province cache key and for matching the same station across months.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct CoordKey {
    lat: i64,
    lng: i64,
}

impl CoordKey {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            lat: quantize(lat),
            lng: quantize(lng),
        }
    }

    pub fn lat(self) -> f64 {
        self.lat as f64 / COORD_SCALE
    }

    pub fn lng(self) -> f64 {
        self.lng as f64 / COORD_SCALE
    }
}

fn quantize(value: f64) -> i64 {
    (value * COORD_SCALE).round() as i64
}
