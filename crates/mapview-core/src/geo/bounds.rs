// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// Axis-aligned latitude/longitude rectangle used for redraw regions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// Degenerate box around a single point.
    #[must_use]
    pub fn from_point(point: Coordinate) -> Self {
        Self {
            min_lat: point.lat,
            min_lon: point.lon,
            max_lat: point.lat,
            max_lon: point.lon,
        }
    }

    /// Smallest box containing every point, or `None` for an empty input.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::from_point(first), |mut bbox, p| {
            bbox.extend(p);
            bbox
        }))
    }

    /// Grow the box to include `point`.
    pub fn extend(&mut self, point: Coordinate) {
        self.min_lat = self.min_lat.min(point.lat);
        self.min_lon = self.min_lon.min(point.lon);
        self.max_lat = self.max_lat.max(point.lat);
        self.max_lon = self.max_lon.max(point.lon);
    }

    #[must_use]
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_lat: self.min_lat.min(other.min_lat),
            min_lon: self.min_lon.min(other.min_lon),
            max_lat: self.max_lat.max(other.max_lat),
            max_lon: self.max_lon.max(other.max_lon),
        }
    }

    /// Union of two optional boxes.
    #[must_use]
    pub fn merge(a: Option<BoundingBox>, b: Option<BoundingBox>) -> Option<BoundingBox> {
        match (a, b) {
            (Some(a), Some(b)) => Some(a.union(&b)),
            (a, None) => a,
            (None, b) => b,
        }
    }

    #[must_use]
    pub fn contains(&self, point: &Coordinate) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lon..=self.max_lon).contains(&point.lon)
    }

    /// Box grown by `margin_deg` on every side.
    #[must_use]
    pub fn padded(&self, margin_deg: f64) -> BoundingBox {
        BoundingBox {
            min_lat: self.min_lat - margin_deg,
            min_lon: self.min_lon - margin_deg,
            max_lat: self.max_lat + margin_deg,
            max_lon: self.max_lon + margin_deg,
        }
    }

    #[must_use]
    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_empty() {
        assert!(BoundingBox::from_points(Vec::new()).is_none());
    }

    #[test]
    fn test_from_points_covers_all() {
        let bbox = BoundingBox::from_points(vec![
            Coordinate::new(47.0, 8.5),
            Coordinate::new(47.2, 8.3),
            Coordinate::new(46.9, 8.6),
        ])
        .unwrap();
        assert_eq!(bbox.min_lat, 46.9);
        assert_eq!(bbox.max_lat, 47.2);
        assert_eq!(bbox.min_lon, 8.3);
        assert_eq!(bbox.max_lon, 8.6);
        let center = bbox.center();
        assert!((center.lat - 47.05).abs() < 1e-9);
        assert!((center.lon - 8.45).abs() < 1e-9);
    }

    #[test]
    fn test_union_and_merge() {
        let a = BoundingBox::from_point(Coordinate::new(47.0, 8.5));
        let b = BoundingBox::from_point(Coordinate::new(47.1, 8.5));
        let u = a.union(&b);
        assert!(u.contains(&Coordinate::new(47.05, 8.5)));
        assert!(!u.contains(&Coordinate::new(47.2, 8.5)));

        assert_eq!(BoundingBox::merge(Some(a), None), Some(a));
        assert_eq!(BoundingBox::merge(None, Some(b)), Some(b));
        assert_eq!(BoundingBox::merge(None, None), None);
        assert_eq!(BoundingBox::merge(Some(a), Some(b)), Some(u));
    }

    #[test]
    fn test_padded() {
        let bbox = BoundingBox::from_point(Coordinate::new(0.0, 0.0)).padded(0.5);
        assert!(bbox.contains(&Coordinate::new(0.5, -0.5)));
        assert!(!bbox.contains(&Coordinate::new(0.6, 0.0)));
    }
}
