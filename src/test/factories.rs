use crate::{
    analysis::cfg::{BlockId, InstId, MethodCfg},
    config::SeqPointConfig,
    metadata::{MethodKey, Token},
    seqpoints::{CompileUnit, PointTable, SeqPointInst, SequencePoint},
};

/// Builds a control-flow graph and its collected sequence points side by side.
///
/// Points are collected in the order `point` is called, so ids follow call order.
#[derive(Default)]
pub struct UnitFactory {
    cfg: MethodCfg,
    collected: Vec<SeqPointInst>,
    next_inst: u32,
}

impl UnitFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(&mut self) -> BlockId {
        self.cfg.add_block()
    }

    pub fn edge(&mut self, from: BlockId, to: BlockId) {
        self.cfg.add_edge(from, to).unwrap();
    }

    // Helper function to record a point at the end of a block
    pub fn point(&mut self, block: BlockId, il_offset: i32, native_offset: i32) -> InstId {
        // Spread instruction ids so they never coincide with point ids
        let inst = InstId(1000 + self.next_inst * 3);
        self.next_inst += 1;

        self.cfg.push_seq_point(block, inst).unwrap();
        self.collected
            .push(SeqPointInst::new(inst, SequencePoint::new(il_offset, native_offset)));
        inst
    }

    pub fn ends_with_endfinally(&mut self, block: BlockId) {
        self.cfg.block_mut(block).unwrap().ends_with_endfinally = true;
    }

    pub fn begins_with_endfinally(&mut self, block: BlockId) {
        self.cfg.block_mut(block).unwrap().begins_with_endfinally = true;
    }

    pub fn parts(self) -> (MethodCfg, PointTable) {
        let table = PointTable::from_insts(&self.collected).unwrap();
        (self.cfg, table)
    }

    pub fn unit(self, token: Token, config: SeqPointConfig) -> CompileUnit {
        CompileUnit {
            method: MethodKey::new(token),
            cfg: self.cfg,
            seq_points: self.collected,
            config,
        }
    }
}
