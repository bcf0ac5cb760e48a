//! Memory budget used to size the in-memory bitmap cache.

use sysinfo::System;

// Used when the platform reports no available memory.
const FALLBACK_BUDGET_KIB: u64 = 256 * 1024;

/// Memory currently available to the process, in KiB.
pub fn default_memory_budget_kib() -> u64 {
    let mut system = System::new();
    system.refresh_memory();

    let available_kib = system.available_memory() / 1024;
    if available_kib == 0 {
        tracing::warn!(
            fallback_kib = FALLBACK_BUDGET_KIB,
            "Available memory unknown, using fallback budget"
        );
        return FALLBACK_BUDGET_KIB;
    }
    available_kib
}

/// The memory cache gets one eighth of the budget.
pub fn memory_cache_capacity_kib(budget_kib: u64) -> u64 {
    budget_kib / 8
}
