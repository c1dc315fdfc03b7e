//! The sequence-point pass run after code generation.

use std::{fmt::Write as _, sync::Arc};

use tracing::{debug, trace};

use crate::{
    analysis::cfg::MethodCfg,
    config::SeqPointConfig,
    metadata::MethodKey,
    runtime::Domain,
    seqpoints::{
        build_successor_map, PointTable, SeqPointInfo, SeqPointInfoBuilder, SeqPointInst,
        SuccessorMap,
    },
    Result,
};

/// The parts of a compilation the sequence-point pass consumes.
#[derive(Debug, Clone)]
pub struct CompileUnit {
    /// The method being compiled, used as registry key
    pub method: MethodKey,
    /// The method's control-flow graph in layout order
    pub cfg: MethodCfg,
    /// Sequence points in collection order; taken by the pass
    pub seq_points: Vec<SeqPointInst>,
    /// Settings of this compilation
    pub config: SeqPointConfig,
}

impl CompileUnit {
    /// Creates a unit with the given settings and no collected points.
    #[must_use]
    pub fn new(method: MethodKey, cfg: MethodCfg, config: SeqPointConfig) -> Self {
        CompileUnit {
            method,
            cfg,
            seq_points: Vec::new(),
            config,
        }
    }
}

/// Encodes the sequence points collected for `unit` and registers them with `domain`.
///
/// The collected points are taken out of the unit. With `gen_debug_data` the step-over
/// successors are computed from the CFG and stored in the blob. Unless `compile_aot` is
/// set, the blob is registered for `unit.method`; an existing registration is kept.
///
/// Returns `Ok(None)` when nothing was collected, otherwise the blob that was built. When
/// another thread registered first, the returned blob is not the one lookups will see.
///
/// # Errors
/// Returns [`crate::Error::GraphError`] if the CFG references instructions or blocks that
/// do not exist, or the same instruction was collected twice.
pub fn save_seq_point_info(
    unit: &mut CompileUnit,
    domain: &Domain,
) -> Result<Option<Arc<SeqPointInfo>>> {
    let collected = std::mem::take(&mut unit.seq_points);
    if collected.is_empty() {
        return Ok(None);
    }

    let config = unit.config;
    let table = PointTable::from_insts(&collected)?;

    let successors = if config.gen_debug_data {
        let map = build_successor_map(&unit.cfg, &table)?;
        if config.dumps_seq_point_map() {
            debug!(
                method = %unit.method,
                "SEQ POINT MAP:\n{}",
                seq_point_map_lines(&table, &map).join("\n")
            );
        }
        Some(map)
    } else {
        None
    };

    let mut builder = SeqPointInfoBuilder::with_capacity(config.gen_debug_data, table.len());
    for (id, point) in table.iter() {
        let next = successors
            .as_ref()
            .map_or(&[][..], |map| map.successors(id));
        builder.add_seq_point(point, next);
    }

    let retained = builder.retained();
    let info = Arc::new(builder.finish());
    domain.stats().record_allocation(info.len());

    debug!(
        method = %unit.method,
        collected = table.len(),
        retained,
        bytes = info.len(),
        debug_data = config.gen_debug_data,
        "encoded sequence points"
    );

    if !config.compile_aot && !domain.register_seq_points(unit.method.clone(), Arc::clone(&info))
    {
        trace!(method = %unit.method, "kept previously registered sequence points");
    }

    Ok(Some(info))
}

/// Renders the successor map, one line per point that has successors, in id order.
///
/// Each line reads `IL0x<il>[0x<native>] -> IL0x<il> IL0x<il> ...`.
#[must_use]
pub fn seq_point_map_lines(table: &PointTable, map: &SuccessorMap) -> Vec<String> {
    let mut lines = Vec::new();

    for (id, point) in table.iter() {
        let next = map.successors(id);
        if next.is_empty() {
            continue;
        }

        let mut line = format!("\tIL0x{:x}[0x{:x}] ->", point.il_offset, point.native_offset);
        for target in next {
            if let Some(target) = table.get(*target) {
                let _ = write!(line, " IL0x{:x}", target.il_offset);
            }
        }
        lines.push(line);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::Token,
        runtime::query,
        seqpoints::{PointId, METHOD_ENTRY_IL_OFFSET},
        test::UnitFactory,
    };

    fn loop_factory() -> UnitFactory {
        // b0 -> b1 -> b2 -> b1
        let mut f = UnitFactory::new();
        let b0 = f.block();
        let b1 = f.block();
        let b2 = f.block();
        f.edge(b0, b1);
        f.edge(b1, b2);
        f.edge(b2, b1);
        f.point(b0, METHOD_ENTRY_IL_OFFSET, 0);
        f.point(b0, 0, 2);
        f.point(b1, 4, 10);
        f.point(b2, 8, 20);
        f
    }

    #[test]
    fn no_points_is_a_no_op() {
        let domain = Domain::new(0, "root");
        let mut unit = UnitFactory::new().unit(Token::method_def(1), SeqPointConfig::debugger());

        assert!(save_seq_point_info(&mut unit, &domain).unwrap().is_none());
        assert!(domain.seq_points().is_empty());
        assert_eq!(domain.stats().allocated_seq_points_size(), 0);
    }

    #[test]
    fn debugger_build_registers_successors() {
        let domain = Domain::new(0, "root");
        let method = MethodKey::new(Token::method_def(1));
        let mut unit = loop_factory().unit(Token::method_def(1), SeqPointConfig::debugger());

        let info = save_seq_point_info(&mut unit, &domain).unwrap().unwrap();
        assert!(unit.seq_points.is_empty());
        assert!(info.has_debug_data());
        assert_eq!(info.point_count(), 4);
        assert_eq!(domain.stats().allocated_seq_points_size(), info.len());

        let header = query::find_seq_point(&domain, &method, 4).unwrap();
        assert_eq!(header.next_ids(), vec![PointId(3)]);
        let latch = query::find_seq_point(&domain, &method, 8).unwrap();
        assert_eq!(latch.next_ids(), vec![PointId(2)]);
        let entry = query::find_seq_point(&domain, &method, METHOD_ENTRY_IL_OFFSET).unwrap();
        assert!(entry.next_ids().is_empty());
    }

    #[test]
    fn jit_build_drops_duplicates_and_successors() {
        let domain = Domain::new(0, "root");
        let mut f = UnitFactory::new();
        let b0 = f.block();
        f.point(b0, 0, 4);
        f.point(b0, 0, 4);
        f.point(b0, 2, 8);
        let mut unit = f.unit(Token::method_def(2), SeqPointConfig::jit());

        let info = save_seq_point_info(&mut unit, &domain).unwrap().unwrap();
        assert!(!info.has_debug_data());
        assert_eq!(info.point_count(), 2);
        assert!(info.iter().all(|entry| entry.successor_count() == 0));
    }

    #[test]
    fn aot_build_is_not_registered() {
        let domain = Domain::new(0, "root");
        let mut unit = loop_factory().unit(Token::method_def(3), SeqPointConfig::aot());

        let info = save_seq_point_info(&mut unit, &domain).unwrap();
        assert!(info.is_some());
        assert!(domain.seq_points().is_empty());
        assert!(domain.stats().allocated_seq_points_size() > 0);
    }

    #[test]
    fn second_compilation_keeps_first_blob() {
        let domain = Domain::new(0, "root");
        let method = MethodKey::new(Token::method_def(4));

        let mut first = loop_factory().unit(Token::method_def(4), SeqPointConfig::jit());
        let first = save_seq_point_info(&mut first, &domain).unwrap().unwrap();
        let mut second = loop_factory().unit(Token::method_def(4), SeqPointConfig::debugger());
        save_seq_point_info(&mut second, &domain).unwrap();

        let stored = domain.get_seq_points(&method).unwrap();
        assert!(Arc::ptr_eq(&stored, &first));
        assert_eq!(domain.stats().discarded_blobs(), 1);
    }

    #[test]
    fn map_dump_format() {
        let f = loop_factory();
        let (cfg, table) = f.parts();
        let map = build_successor_map(&cfg, &table).unwrap();

        assert_eq!(
            seq_point_map_lines(&table, &map),
            vec![
                "\tIL0x0[0x2] -> IL0x4".to_string(),
                "\tIL0x4[0xa] -> IL0x8".to_string(),
                "\tIL0x8[0x14] -> IL0x4".to_string(),
            ]
        );
    }

    #[test]
    fn verbose_dump_does_not_change_result() {
        let domain = Domain::new(0, "root");
        let config = SeqPointConfig::debugger().with_verbose_level(3);
        let mut verbose = loop_factory().unit(Token::method_def(5), config);
        let mut quiet = loop_factory().unit(Token::method_def(6), SeqPointConfig::debugger());

        let verbose = save_seq_point_info(&mut verbose, &domain).unwrap().unwrap();
        let quiet = save_seq_point_info(&mut quiet, &domain).unwrap().unwrap();
        assert_eq!(verbose.as_bytes(), quiet.as_bytes());
    }
}
