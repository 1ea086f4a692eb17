//! Disk usage accounting

/// Fixed metadata charge per file
pub const FILE_OVERHEAD: u64 = 100;

/// Fixed metadata charge per directory
pub const DIR_OVERHEAD: u64 = 50;

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

/// Human-readable size with one decimal place above 1 KiB
pub fn format_size(bytes: u64) -> String {
    if bytes >= MIB {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
