//! Swap sizing.

/// Swap allocation stops paying for itself past 16 GiB.
pub const SWAP_CAP_MB: u64 = 16384;

/// Size the swap file from total physical memory.
///
/// Memory-hungry workloads want swap close to physical memory, capped at
/// [`SWAP_CAP_MB`] where the disk cost outweighs the benefit.
pub fn compute_swap_size_mb(total_memory_mb: u64) -> u64 {
    total_memory_mb.min(SWAP_CAP_MB)
}
