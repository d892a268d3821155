pub mod platform;

/// Answers whether the current process runs with administrator rights.
pub trait PrivilegeProbe: Send + Sync {
    fn is_elevated(&self) -> bool;
}

/// Probe backed by the operating system's notion of elevation.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsPrivilegeProbe;

impl PrivilegeProbe for OsPrivilegeProbe {
    fn is_elevated(&self) -> bool {
        platform::is_elevated()
    }
}
