use crate::model::StatLine;
use crate::percentile::{PlayerPercentiles, percentile_column};
use crate::registry::{Flavor, IndexDef, Polarity, Role, indices_for};

/// Composite index values of one player, in `indices_for(flavor)` order.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerIndices {
    pub index: usize,
    pub role: Role,
    pub values: Vec<Option<f64>>,
}

/// Weighted mean of the present component percentiles, with weights renormalized.
pub fn composite(def: &IndexDef, centiles: &StatLine) -> Option<f64> {
    let mut acc = 0.0;
    let mut weight = 0.0;
    for (stat, w) in def.components {
        if let Some(pct) = centiles.get(*stat) {
            acc += pct * w;
            weight += w;
        }
    }
    (weight > 0.0).then(|| acc / weight)
}

/// Builds every index of `flavor` and re-ranks it inside each role population.
pub fn compose_indices(percentiles: &[PlayerPercentiles], flavor: Flavor) -> Vec<PlayerIndices> {
    let defs: Vec<&IndexDef> = indices_for(flavor).collect();
    let mut out: Vec<PlayerIndices> = percentiles
        .iter()
        .map(|p| PlayerIndices {
            index: p.index,
            role: p.role,
            values: vec![None; defs.len()],
        })
        .collect();

    for &role in flavor.roles() {
        let members: Vec<usize> = percentiles
            .iter()
            .enumerate()
            .filter(|(_, p)| p.role == role)
            .map(|(pos, _)| pos)
            .collect();
        if members.is_empty() {
            continue;
        }
        for (slot, def) in defs.iter().enumerate() {
            let raw: Vec<Option<f64>> = members
                .iter()
                .map(|&pos| composite(def, &percentiles[pos].centiles))
                .collect();
            let ranked = percentile_column(&raw, Polarity::HigherBetter);
            for (&pos, value) in members.iter().zip(ranked) {
                out[pos].values[slot] = value;
            }
        }
    }
    out
}
