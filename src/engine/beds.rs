//! Bed inventory and placement queries
//!
//! Queries never mutate; occupancy changes go through the allocation engine.
//! Beds are kept in registration order, which is the enumeration order every
//! "first free" query follows.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::bed::{Bed, BedId, BedType};
use crate::models::patient::{Location, PatientId, PatientRegistry};
use crate::{Result, VitalFlowError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OccupancyStats {
    pub icu_total: usize,
    pub icu_occupied: usize,
    pub icu_available: usize,
    pub general_total: usize,
    pub general_occupied: usize,
    pub general_available: usize,
    /// Percent of all beds occupied
    pub occupancy_rate: f64,
}

#[derive(Debug, Clone, Default)]
pub struct BedInventory {
    beds: Vec<Bed>,
}

impl BedInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, bed: Bed) -> Result<()> {
        if self.get(&bed.id).is_some() {
            return Err(VitalFlowError::DuplicateBed(bed.id));
        }
        self.beds.push(bed);
        Ok(())
    }

    pub fn get(&self, id: &BedId) -> Option<&Bed> {
        self.beds.iter().find(|b| &b.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bed> {
        self.beds.iter()
    }

    pub fn len(&self) -> usize {
        self.beds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beds.is_empty()
    }

    /// Bed currently holding `patient`, if any
    pub fn bed_of(&self, patient: &PatientId) -> Option<&Bed> {
        self.beds
            .iter()
            .find(|b| b.occupant.as_ref() == Some(patient))
    }

    pub(crate) fn set_occupant(&mut self, id: &BedId, occupant: Option<PatientId>) -> Result<()> {
        let bed = self
            .beds
            .iter_mut()
            .find(|b| &b.id == id)
            .ok_or_else(|| VitalFlowError::UnknownBed(id.clone()))?;
        bed.occupant = occupant;
        Ok(())
    }

    pub fn find_free_icu(&self) -> Option<&Bed> {
        self.beds.iter().find(|b| b.is_icu() && b.is_free())
    }

    pub fn find_free_general(&self) -> Option<&Bed> {
        self.beds
            .iter()
            .find(|b| b.bed_type == BedType::General && b.is_free())
    }

    /// Occupied ICU bed whose patient has the lowest risk strictly below
    /// `risk_below`. Ties go to the earlier bed.
    pub fn find_recovery_candidate(
        &self,
        patients: &PatientRegistry,
        risk_below: u8,
    ) -> Option<&Bed> {
        self.beds
            .iter()
            .filter(|b| b.is_icu())
            .filter_map(|b| {
                let patient = patients.get(b.occupant.as_ref()?)?;
                (patient.risk < risk_below).then_some((b, patient.risk))
            })
            .min_by_key(|&(_, risk)| risk)
            .map(|(b, _)| b)
    }

    pub fn occupancy(&self) -> OccupancyStats {
        let count = |bed_type: BedType| {
            let of_type = self.beds.iter().filter(|b| b.bed_type == bed_type);
            let total = of_type.clone().count();
            let occupied = of_type.filter(|b| !b.is_free()).count();
            (total, occupied)
        };
        let (icu_total, icu_occupied) = count(BedType::Icu);
        let (general_total, general_occupied) = count(BedType::General);

        let total = icu_total + general_total;
        let occupancy_rate = if total == 0 {
            0.0
        } else {
            (icu_occupied + general_occupied) as f64 / total as f64 * 100.0
        };

        OccupancyStats {
            icu_total,
            icu_occupied,
            icu_available: icu_total - icu_occupied,
            general_total,
            general_occupied,
            general_available: general_total - general_occupied,
            occupancy_rate,
        }
    }

    /// Check that bed occupancy and patient locations agree.
    ///
    /// Reports the first violation found.
    pub fn verify_consistency(&self, patients: &PatientRegistry) -> Result<()> {
        let inconsistent = |msg: String| Err(VitalFlowError::Inconsistent(msg));
        let mut seen: HashMap<&PatientId, &BedId> = HashMap::new();

        for bed in &self.beds {
            let Some(occupant) = &bed.occupant else {
                continue;
            };
            if let Some(other) = seen.insert(occupant, &bed.id) {
                return inconsistent(format!(
                    "patient {} is in both {} and {}",
                    occupant, other, bed.id
                ));
            }
            let Some(patient) = patients.get(occupant) else {
                return inconsistent(format!(
                    "bed {} holds unknown patient {}",
                    bed.id, occupant
                ));
            };
            if patient.location != Location::Bed(bed.id.clone()) {
                return inconsistent(format!(
                    "bed {} holds {} but patient location is {}",
                    bed.id, occupant, patient.location
                ));
            }
            if patient.in_icu != bed.is_icu() {
                return inconsistent(format!(
                    "patient {} in {} bed {} has in_icu = {}",
                    occupant, bed.bed_type, bed.id, patient.in_icu
                ));
            }
        }

        for patient in patients.iter() {
            match &patient.location {
                Location::Bed(bed_id) => {
                    let Some(bed) = self.get(bed_id) else {
                        return inconsistent(format!(
                            "patient {} located in unknown bed {}",
                            patient.id, bed_id
                        ));
                    };
                    if bed.occupant.as_ref() != Some(&patient.id) {
                        return inconsistent(format!(
                            "patient {} claims bed {} which does not hold them",
                            patient.id, bed_id
                        ));
                    }
                }
                Location::Ward(_) if patient.in_icu => {
                    return inconsistent(format!(
                        "patient {} is flagged in ICU without a bed",
                        patient.id
                    ));
                }
                Location::Ward(_) => {}
            }
        }

        Ok(())
    }
}
