//! Host diagnostics boundary.
//!
//! Opening the level database can degrade (missing resource, mapping not
//! possible). Those conditions are reported once through [`Diagnostics`] and
//! compilation carries on.

/// Receiver for warnings raised while opening the level database.
pub trait Diagnostics: Send + Sync {
    /// Reports a non-fatal warning.
    fn warning(&self, message: &str);
}

/// Forwards warnings to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn warning(&self, message: &str) {
        log::warn!("{}", message);
    }
}
