//! Fixed mapping from [`Region`] to its workflow record.

use serde::{Deserialize, Serialize};

use crate::catalog::{self, REGION_COUNT, Region};
use crate::random::RandomSource;
use crate::workflow::RegionWorkflow;

/// One workflow per region, indexed by the closed region enum.
///
/// The key set is established at construction and can never change.
/// Deserialization rejects anything but exactly one record per region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RegionWorkflow>", into = "Vec<RegionWorkflow>")]
pub struct RegionMap([RegionWorkflow; REGION_COUNT]);

impl RegionMap {
    /// Fresh idle workflows with a random required patch per region.
    pub(crate) fn new(rng: &mut dyn RandomSource) -> Self {
        Self(Region::ALL.map(|region| {
            RegionWorkflow::new(region, catalog::random_patch(&mut *rng))
        }))
    }

    /// Workflow for a region.
    #[must_use]
    pub fn get(&self, region: Region) -> &RegionWorkflow {
        &self.0[region.index()]
    }

    pub(crate) fn get_mut(&mut self, region: Region) -> &mut RegionWorkflow {
        &mut self.0[region.index()]
    }

    /// Workflows in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &RegionWorkflow> {
        self.0.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut RegionWorkflow> {
        self.0.iter_mut()
    }

    /// Whether every region satisfies the predicate.
    pub fn all(&self, pred: impl Fn(&RegionWorkflow) -> bool) -> bool {
        self.0.iter().all(pred)
    }

    /// Whether any region satisfies the predicate.
    pub fn any(&self, pred: impl Fn(&RegionWorkflow) -> bool) -> bool {
        self.0.iter().any(pred)
    }

    /// Number of regions satisfying the predicate.
    pub fn count(&self, pred: impl Fn(&RegionWorkflow) -> bool) -> usize {
        self.0.iter().filter(|w| pred(w)).count()
    }

    /// Mean of the per-region error rates.
    #[must_use]
    pub fn mean_error_rate(&self) -> f64 {
        let sum: f64 = self.0.iter().map(RegionWorkflow::error_rate).sum();
        #[allow(clippy::cast_precision_loss)]
        let n = REGION_COUNT as f64;
        sum / n
    }
}

impl TryFrom<Vec<RegionWorkflow>> for RegionMap {
    type Error = String;

    fn try_from(mut workflows: Vec<RegionWorkflow>) -> Result<Self, Self::Error> {
        workflows.sort_by_key(|w| w.region().index());
        let regions: Vec<Region> = workflows.iter().map(RegionWorkflow::region).collect();
        if regions != Region::ALL {
            return Err(format!(
                "expected one workflow per region ({}), found [{}]",
                Region::names(),
                regions
                    .iter()
                    .map(|r| r.name())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        for workflow in &workflows {
            workflow.validate()?;
        }
        let array: [RegionWorkflow; REGION_COUNT] = workflows
            .try_into()
            .map_err(|_| "region count mismatch".to_string())?;
        Ok(Self(array))
    }
}

impl From<RegionMap> for Vec<RegionWorkflow> {
    fn from(map: RegionMap) -> Self {
        map.0.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FixedRandom;
    use crate::workflow::WorkflowState;

    #[test]
    fn new_map_covers_every_region_in_order() {
        let mut rng = FixedRandom::new(1, 0.5);
        let map = RegionMap::new(&mut rng);
        let regions: Vec<Region> = map.iter().map(RegionWorkflow::region).collect();
        assert_eq!(regions, Region::ALL);
        assert!(map.all(|w| w.state() == WorkflowState::Idle));
        assert!(map.all(|w| w.required_patch() == catalog::PATCH_VERSIONS[1]));
    }

    #[test]
    fn lookup_by_region() {
        let mut rng = FixedRandom::new(0, 0.5);
        let map = RegionMap::new(&mut rng);
        assert_eq!(map.get(Region::EuCentral).region(), Region::EuCentral);
    }

    #[test]
    fn deserialization_rejects_missing_region() {
        let mut rng = FixedRandom::new(0, 0.5);
        let map = RegionMap::new(&mut rng);
        let mut value = serde_json::to_value(&map).unwrap();
        value.as_array_mut().unwrap().pop();
        let err = serde_json::from_value::<RegionMap>(value).unwrap_err();
        assert!(err.to_string().contains("expected one workflow per region"));
    }

    #[test]
    fn deserialization_rejects_duplicate_region() {
        let mut rng = FixedRandom::new(0, 0.5);
        let map = RegionMap::new(&mut rng);
        let mut value = serde_json::to_value(&map).unwrap();
        let arr = value.as_array_mut().unwrap();
        arr[4] = arr[0].clone();
        assert!(serde_json::from_value::<RegionMap>(value).is_err());
    }

    #[test]
    fn deserialization_rejects_out_of_range_progress() {
        let mut rng = FixedRandom::new(0, 0.5);
        let map = RegionMap::new(&mut rng);
        let mut value = serde_json::to_value(&map).unwrap();
        value[2]["patch_progress"] = serde_json::json!(140);
        let err = serde_json::from_value::<RegionMap>(value).unwrap_err();
        assert!(err.to_string().contains("above 100"));
    }

    #[test]
    fn deserialization_accepts_any_order() {
        let mut rng = FixedRandom::new(0, 0.5);
        let map = RegionMap::new(&mut rng);
        let mut value = serde_json::to_value(&map).unwrap();
        value.as_array_mut().unwrap().reverse();
        let back: RegionMap = serde_json::from_value(value).unwrap();
        assert_eq!(back, map);
    }
}
