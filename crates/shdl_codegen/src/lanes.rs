//! Lane assignment: packs primitive instances into 64-wide SIMD-in-a-register
//! chunks, one chunk set per primitive kind.

use shdl_ir::{BaseComponent, PrimitiveId, PrimitiveKind};
use std::collections::HashMap;

/// Number of gate instances packed into one state word.
pub const LANES_PER_CHUNK: usize = 64;

/// Where one primitive instance lives in the packed state: which kind's
/// chunk array, which chunk within that array, and which bit lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lane {
    /// The primitive kind this lane belongs to.
    pub kind: PrimitiveKind,
    /// The chunk index within that kind's state words.
    pub chunk: usize,
    /// The bit position within the chunk, 0-63.
    pub lane: usize,
}

/// The full lane assignment for a component: every stateful primitive's
/// lane, plus how many lanes are active in each `(kind, chunk)` word.
pub struct LaneMap {
    lanes: HashMap<PrimitiveId, Lane>,
    active_counts: HashMap<(PrimitiveKind, usize), usize>,
}

impl LaneMap {
    /// Assigns lanes to every primitive in `base` that contributes a state
    /// word (i.e. everything but `__VCC__`/`__GND__`), in source order.
    pub fn assign(base: &BaseComponent) -> Self {
        let mut per_kind: HashMap<PrimitiveKind, Vec<PrimitiveId>> = HashMap::new();
        for (id, inst) in base.primitives.iter() {
            if inst.kind.has_state_word() {
                per_kind.entry(inst.kind).or_default().push(id);
            }
        }

        let mut lanes = HashMap::new();
        let mut active_counts = HashMap::new();
        for (kind, ids) in per_kind {
            for (index, id) in ids.iter().enumerate() {
                let chunk = index / LANES_PER_CHUNK;
                let lane = index % LANES_PER_CHUNK;
                lanes.insert(
                    *id,
                    Lane {
                        kind,
                        chunk,
                        lane,
                    },
                );
                let count = active_counts.entry((kind, chunk)).or_insert(0);
                *count = (*count).max(lane + 1);
            }
        }
        Self {
            lanes,
            active_counts,
        }
    }

    /// Returns the lane assigned to a primitive, if it has one (`Vcc`/`Gnd`
    /// instances never do).
    pub fn lane_of(&self, id: PrimitiveId) -> Option<Lane> {
        self.lanes.get(&id).copied()
    }

    /// Returns every `(kind, chunk)` word that has at least one active lane,
    /// each paired with how many lanes in it are active, in a canonical
    /// order (by kind's declaration order, then chunk index).
    pub fn words(&self) -> Vec<(PrimitiveKind, usize, usize)> {
        let mut words: Vec<_> = self
            .active_counts
            .iter()
            .map(|(&(kind, chunk), &count)| (kind, chunk, count))
            .collect();
        words.sort_by_key(|&(kind, chunk, _)| (kind_order(kind), chunk));
        words
    }
}

fn kind_order(kind: PrimitiveKind) -> u8 {
    match kind {
        PrimitiveKind::Xor => 0,
        PrimitiveKind::And => 1,
        PrimitiveKind::Or => 2,
        PrimitiveKind::Not => 3,
        PrimitiveKind::Vcc => 4,
        PrimitiveKind::Gnd => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shdl_ir::BasePort;
    use shdl_source::{FileId, Span};

    fn dummy_span() -> Span {
        Span::new(FileId::from_raw(0), 0, 0)
    }

    #[test]
    fn packs_sixty_five_gates_of_one_kind_into_two_chunks() {
        let mut comp = BaseComponent::new(
            "Wide",
            vec![BasePort { name: "A".into(), width: 1 }],
            vec![BasePort { name: "Q".into(), width: 1 }],
        );
        for i in 0..65 {
            comp.add_primitive(format!("n{i}"), PrimitiveKind::Not, dummy_span());
        }
        let map = LaneMap::assign(&comp);
        let words = map.words();
        assert_eq!(words.len(), 2);
        assert_eq!(words[0], (PrimitiveKind::Not, 0, 64));
        assert_eq!(words[1], (PrimitiveKind::Not, 1, 1));
    }

    #[test]
    fn vcc_and_gnd_never_get_a_lane() {
        let mut comp = BaseComponent::new("C", Vec::new(), Vec::new());
        let vcc = comp.add_primitive("v", PrimitiveKind::Vcc, dummy_span());
        let map = LaneMap::assign(&comp);
        assert!(map.lane_of(vcc).is_none());
        assert!(map.words().is_empty());
    }

    #[test]
    fn different_kinds_get_independent_chunk_sequences() {
        let mut comp = BaseComponent::new("C", Vec::new(), Vec::new());
        let xor = comp.add_primitive("x", PrimitiveKind::Xor, dummy_span());
        let and = comp.add_primitive("a", PrimitiveKind::And, dummy_span());
        let map = LaneMap::assign(&comp);
        assert_eq!(map.lane_of(xor).unwrap(), Lane { kind: PrimitiveKind::Xor, chunk: 0, lane: 0 });
        assert_eq!(map.lane_of(and).unwrap(), Lane { kind: PrimitiveKind::And, chunk: 0, lane: 0 });
    }
}
