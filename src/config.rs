//! Per-compilation settings of the sequence-point pass

/// Settings the sequence-point pass reads from the compilation it runs in
///
/// The JIT hands one of these to [`crate::seqpoints::save_seq_point_info`] for every
/// compiled method. The named presets cover the usual compilation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqPointConfig {
    /// Compute step-over successors and store them in the blob (debugger attached)
    /// Also disables duplicate rejection, successor ids refer to points by position
    pub gen_debug_data: bool,

    /// Compiling ahead of time: the blob is returned for the side file instead of being
    /// registered with the domain
    pub compile_aot: bool,

    /// Diagnostic verbosity; values above 2 dump the successor map through `tracing`
    pub verbose_level: u32,
}

impl Default for SeqPointConfig {
    fn default() -> Self {
        Self::jit()
    }
}

impl SeqPointConfig {
    /// Plain JIT compilation without a debugger
    #[must_use]
    pub fn jit() -> Self {
        Self {
            gen_debug_data: false,
            compile_aot: false,
            verbose_level: 0,
        }
    }

    /// JIT compilation with a debugger attached
    #[must_use]
    pub fn debugger() -> Self {
        Self {
            gen_debug_data: true,
            compile_aot: false,
            verbose_level: 0,
        }
    }

    /// Ahead-of-time compilation; blobs end up in the image's side file
    #[must_use]
    pub fn aot() -> Self {
        Self {
            gen_debug_data: false,
            compile_aot: true,
            verbose_level: 0,
        }
    }

    /// Returns a copy with successor computation switched on
    #[must_use]
    pub fn with_debug_data(mut self) -> Self {
        self.gen_debug_data = true;
        self
    }

    /// Returns a copy with the given verbosity
    #[must_use]
    pub fn with_verbose_level(mut self, verbose_level: u32) -> Self {
        self.verbose_level = verbose_level;
        self
    }

    /// True if the successor map should be dumped
    #[must_use]
    pub fn dumps_seq_point_map(&self) -> bool {
        self.verbose_level > 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        assert_eq!(SeqPointConfig::default(), SeqPointConfig::jit());
        assert!(SeqPointConfig::debugger().gen_debug_data);
        assert!(!SeqPointConfig::debugger().compile_aot);

        let aot = SeqPointConfig::aot();
        assert!(aot.compile_aot && !aot.gen_debug_data);
        assert!(aot.with_debug_data().gen_debug_data);
    }

    #[test]
    fn dump_threshold() {
        let config = SeqPointConfig::debugger();
        assert!(!config.with_verbose_level(2).dumps_seq_point_map());
        assert!(config.with_verbose_level(3).dumps_seq_point_map());
    }
}
