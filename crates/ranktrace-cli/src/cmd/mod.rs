pub mod bench;
pub mod converge;

use clap::ValueEnum;
use ranktrace_core::kernel::KernelKind;

/// Kernel choice on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KernelArg {
    /// Row-major nested loops.
    Naive,
    /// Library matrix-vector product.
    Vectorized,
    /// Rows split across a thread pool.
    Parallel,
}

impl From<KernelArg> for KernelKind {
    fn from(arg: KernelArg) -> Self {
        match arg {
            KernelArg::Naive => Self::Naive,
            KernelArg::Vectorized => Self::Vectorized,
            KernelArg::Parallel => Self::Parallel,
        }
    }
}
