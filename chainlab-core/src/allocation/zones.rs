//! Zone-based allocation: bonus spend in rare undervalued z-score zones.
//!
//! The observed z-score range is cut into contiguous zones of `zone_size`
//! starting at the minimum finite z. A zone's rarity is the share of days that
//! fall in it. Zones entirely below zero (upper edge < 0) get
//! `baseline + (1 - rarity) * max_bonus`; every other zone gets `baseline`.
//! The model never spends less than baseline.
//!
//! Only occupied zones are materialized, keyed by bin index from the minimum.

use std::collections::BTreeMap;

use super::{AllocationError, AllocationModel, ModelKind};

/// One z-score zone `[lower, upper)` with its occupancy and multiplier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub index: i64,
    pub lower: f64,
    pub upper: f64,
    pub days: usize,
    pub rarity: f64,
    pub multiplier: f64,
}

impl Zone {
    pub fn is_undervalued(&self) -> bool {
        self.upper < 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneModel {
    zone_size: f64,
    baseline: f64,
    max_bonus: f64,
}

impl ZoneModel {
    pub fn new(zone_size: f64, baseline: f64, max_bonus: f64) -> Result<Self, AllocationError> {
        if !zone_size.is_finite() || zone_size <= 0.0 {
            return Err(AllocationError::InvalidZoneSize(zone_size));
        }
        if !baseline.is_finite() || baseline < 0.0 {
            return Err(AllocationError::InvalidMultiplier {
                name: "baseline",
                value: baseline,
            });
        }
        if !max_bonus.is_finite() || max_bonus < 0.0 {
            return Err(AllocationError::InvalidMultiplier {
                name: "max_bonus",
                value: max_bonus,
            });
        }
        Ok(Self {
            zone_size,
            baseline,
            max_bonus,
        })
    }

    /// Occupied zones of the finite z-scores, lowest first. Empty if none are finite.
    pub fn zones(&self, zscores: &[f64]) -> Vec<Zone> {
        let Some(min) = finite_min(zscores) else {
            return Vec::new();
        };

        let mut occupancy: BTreeMap<i64, usize> = BTreeMap::new();
        let mut total = 0usize;
        for &z in zscores.iter().filter(|z| z.is_finite()) {
            *occupancy.entry(self.zone_index(z, min)).or_default() += 1;
            total += 1;
        }

        occupancy
            .into_iter()
            .map(|(index, days)| {
                let lower = min + index as f64 * self.zone_size;
                let upper = lower + self.zone_size;
                let rarity = days as f64 / total as f64;
                let multiplier = if upper < 0.0 {
                    self.baseline + (1.0 - rarity) * self.max_bonus
                } else {
                    self.baseline
                };
                Zone {
                    index,
                    lower,
                    upper,
                    days,
                    rarity,
                    multiplier,
                }
            })
            .collect()
    }

    fn zone_index(&self, z: f64, min: f64) -> i64 {
        ((z - min) / self.zone_size).floor() as i64
    }
}

impl AllocationModel for ZoneModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Zones
    }

    fn allocate(&self, zscores: &[f64]) -> Result<Vec<f64>, AllocationError> {
        let Some(min) = finite_min(zscores) else {
            return Ok(vec![self.baseline; zscores.len()]);
        };
        let multipliers: BTreeMap<i64, f64> = self
            .zones(zscores)
            .into_iter()
            .map(|zone| (zone.index, zone.multiplier))
            .collect();

        Ok(zscores
            .iter()
            .map(|&z| {
                if z.is_finite() {
                    multipliers
                        .get(&self.zone_index(z, min))
                        .copied()
                        .unwrap_or(self.baseline)
                } else {
                    self.baseline
                }
            })
            .collect())
    }
}

fn finite_min(values: &[f64]) -> Option<f64> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .reduce(f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn rare_negative_zone_gets_bonus() {
        let model = ZoneModel::new(1.0, 1.0, 2.0).unwrap();
        // min = -2.5: occupied zones [-2.5,-1.5) [-0.5,0.5) [0.5,1.5)
        let z = [-2.5, 0.0, 0.1, 0.2, 1.0, 1.2];
        let zones = model.zones(&z);
        assert_eq!(zones.len(), 3);
        assert_eq!(
            zones.iter().map(|zone| zone.index).collect::<Vec<_>>(),
            vec![0, 2, 3]
        );
        assert_eq!(zones[0].days, 1);
        assert!(zones[0].is_undervalued());
        assert_approx(zones[0].multiplier, 1.0 + (1.0 - 1.0 / 6.0) * 2.0, 1e-12);
        // Zone straddling zero is not undervalued.
        assert_eq!(zones[1].days, 3);
        assert_eq!(zones[1].multiplier, 1.0);
        assert_eq!(zones[2].multiplier, 1.0);

        let m = model.allocate(&z).unwrap();
        assert_approx(m[0], zones[0].multiplier, 1e-12);
        assert!(m[1..].iter().all(|&v| v == 1.0));
    }

    #[test]
    fn non_finite_zscores_get_baseline() {
        let model = ZoneModel::new(0.5, 1.5, 1.0).unwrap();
        let m = model.allocate(&[f64::NAN, -3.0, 2.0, f64::INFINITY]).unwrap();
        assert_eq!(m[0], 1.5);
        assert!(m[1] > 1.5);
        assert_eq!(m[2], 1.5);
        assert_eq!(m[3], 1.5);
    }

    #[test]
    fn all_nan_is_all_baseline() {
        let model = ZoneModel::new(0.5, 1.0, 1.0).unwrap();
        assert_eq!(model.allocate(&[f64::NAN, f64::NAN]).unwrap(), vec![1.0, 1.0]);
        assert!(model.zones(&[f64::NAN]).is_empty());
    }

    #[test]
    fn single_value_forms_one_zone() {
        let model = ZoneModel::new(0.5, 1.0, 1.0).unwrap();
        let zones = model.zones(&[-3.0, -3.0]);
        assert_eq!(zones.len(), 1);
        // Every day in the zone → rarity 1 → no bonus even though undervalued.
        assert_eq!(zones[0].multiplier, 1.0);
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert_eq!(
            ZoneModel::new(0.0, 1.0, 1.0),
            Err(AllocationError::InvalidZoneSize(0.0))
        );
        assert!(ZoneModel::new(0.5, -1.0, 1.0).is_err());
        assert!(ZoneModel::new(0.5, 1.0, f64::NAN).is_err());
    }

    #[test]
    fn tiny_zone_size_still_allocates() {
        // Twelve z units at 0.001 per zone: 12_000 bins, two occupied.
        let model = ZoneModel::new(0.001, 1.0, 1.0).unwrap();
        let zones = model.zones(&[-6.0, 6.0]);
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[1].index, 12_000);

        let m = model.allocate(&[-6.0, 6.0, f64::NAN]).unwrap();
        assert_approx(m[0], 1.5, 1e-12);
        assert_eq!(m[1], 1.0);
        assert_eq!(m[2], 1.0);
    }
}
