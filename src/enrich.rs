use std::collections::BTreeSet;

use crate::district::DistrictFeature;
use crate::records::SurvivorTable;

/// Flag every district that has at least one survivor in it. Without a
/// survivor table no district has a camp.
pub fn mark_camps(
    mut districts: Vec<DistrictFeature>,
    survivors: Option<&SurvivorTable>,
) -> Vec<DistrictFeature> {
    let camps: BTreeSet<&str> = survivors.map(SurvivorTable::districts).unwrap_or_default();
    for district in &mut districts {
        district.camp_exists = district
            .name
            .as_deref()
            .is_some_and(|name| camps.contains(name));
    }
    districts
}
