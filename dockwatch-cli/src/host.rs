use std::sync::Mutex;

use sysinfo::System;

use dockwatch_core::runtime::{HostSource, MemoryTotals};

/// Host figures read through sysinfo. `System` needs `&mut` to refresh, so
/// it sits behind a mutex; refreshes are cheap and never held across awaits.
pub struct SysinfoHost {
    system: Mutex<System>,
}

impl SysinfoHost {
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_all();
        system.refresh_memory();
        Self {
            system: Mutex::new(system),
        }
    }
}

impl Default for SysinfoHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostSource for SysinfoHost {
    fn core_count(&self) -> usize {
        let count = match self.system.lock() {
            Ok(mut system) => {
                system.refresh_cpu_all();
                system.cpus().len()
            }
            Err(_) => 0,
        };
        if count > 0 {
            count
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }

    fn memory_totals(&self) -> MemoryTotals {
        match self.system.lock() {
            Ok(mut system) => {
                system.refresh_memory();
                MemoryTotals {
                    total: system.total_memory(),
                    free: system.free_memory(),
                }
            }
            Err(_) => MemoryTotals::default(),
        }
    }
}
