//! Point table: collected sequence points with dense ids.

use std::{collections::HashMap, fmt};

use crate::{
    analysis::cfg::InstId,
    seqpoints::{SeqPointInst, SequencePoint},
    Error::GraphError,
    Result,
};

/// Dense id of a sequence point, equal to its slot in the [`PointTable`].
///
/// Ids are also the successor references stored in a [`crate::seqpoints::SeqPointInfo`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct PointId(pub u32);

impl PointId {
    /// Returns the table slot of this id.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sp{}", self.0)
    }
}

/// The sequence points of one compiled method in collection order.
///
/// The table owns a side table from the recording instruction to the point's id, so the
/// successor builder can translate the instruction lists of basic blocks into ids.
#[derive(Debug, Clone, Default)]
pub struct PointTable {
    points: Vec<SequencePoint>,
    ids: HashMap<InstId, PointId>,
}

impl PointTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table from collected points, assigning ids in order.
    ///
    /// # Errors
    /// Returns [`crate::Error::GraphError`] if an instruction is collected twice.
    pub fn from_insts(insts: &[SeqPointInst]) -> Result<Self> {
        let mut table = PointTable {
            points: Vec::with_capacity(insts.len()),
            ids: HashMap::with_capacity(insts.len()),
        };

        for inst in insts {
            table.push(inst.inst, inst.point)?;
        }

        Ok(table)
    }

    /// Appends a point recorded by `inst` and returns its id.
    ///
    /// # Errors
    /// Returns [`crate::Error::GraphError`] if `inst` already has a point or the table
    /// would exceed `u32::MAX` entries.
    pub fn push(&mut self, inst: InstId, point: SequencePoint) -> Result<PointId> {
        let Ok(slot) = u32::try_from(self.points.len()) else {
            return Err(GraphError(format!(
                "Too many sequence points - {}",
                self.points.len()
            )));
        };

        let id = PointId(slot);
        if self.ids.insert(inst, id).is_some() {
            return Err(GraphError(format!(
                "Instruction {inst} recorded more than one sequence point"
            )));
        }

        self.points.push(point);
        Ok(id)
    }

    /// Returns the id of the point recorded by `inst`.
    #[must_use]
    pub fn id_of(&self, inst: InstId) -> Option<PointId> {
        self.ids.get(&inst).copied()
    }

    /// Returns the point with the given id.
    #[must_use]
    pub fn get(&self, id: PointId) -> Option<&SequencePoint> {
        self.points.get(id.index())
    }

    /// Returns all points in id order.
    #[must_use]
    pub fn points(&self) -> &[SequencePoint] {
        &self.points
    }

    /// Iterates over `(id, point)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (PointId, &SequencePoint)> {
        // Slots fit into u32, push() refuses anything larger.
        #[allow(clippy::cast_possible_truncation)]
        self.points
            .iter()
            .enumerate()
            .map(|(slot, point)| (PointId(slot as u32), point))
    }

    /// Returns the number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if no points were collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inst(id: u32, il: i32, native: i32) -> SeqPointInst {
        SeqPointInst::new(InstId(id), SequencePoint::new(il, native))
    }

    #[test]
    fn ids_follow_collection_order() {
        // Instruction ids deliberately differ from collection order
        let table = PointTable::from_insts(&[inst(7, 0, 0), inst(3, 4, 8), inst(5, 2, 4)]).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.id_of(InstId(7)), Some(PointId(0)));
        assert_eq!(table.id_of(InstId(3)), Some(PointId(1)));
        assert_eq!(table.id_of(InstId(5)), Some(PointId(2)));
        assert_eq!(table.id_of(InstId(1)), None);

        for (id, point) in table.iter() {
            assert_eq!(table.get(id), Some(point));
        }
        assert_eq!(table.get(PointId(1)).unwrap().il_offset, 4);
    }

    #[test]
    fn ids_are_a_bijection_with_slots() {
        let insts: Vec<_> = (0..50).map(|i| inst(100 - i, i as i32, i as i32 * 2)).collect();
        let table = PointTable::from_insts(&insts).unwrap();

        let mut seen: Vec<usize> = insts
            .iter()
            .map(|i| table.id_of(i.inst).unwrap().index())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn duplicate_instruction_is_rejected() {
        let result = PointTable::from_insts(&[inst(1, 0, 0), inst(1, 2, 2)]);
        assert!(matches!(result, Err(crate::Error::GraphError(_))));
    }

    #[test]
    fn empty_table() {
        let table = PointTable::new();
        assert!(table.is_empty());
        assert_eq!(table.iter().count(), 0);
    }
}
