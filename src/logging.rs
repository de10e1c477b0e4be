//! ==============================================================================================
//! ========================================= Logging =============================================
//! ==============================================================================================
//!
//! Thin wrapper over the `log` facade. The library never installs a
//! subscriber (`env_logger`, `logger_bro`, or otherwise) — that choice
//! belongs to whatever embeds this crate, keeping the ambient logging
//! dependency separate from a library surface that should stay
//! backend-agnostic. Call sites live at orchestrator phase boundaries
//! (day start, barrier crossed, error latched, rate refresh).

#[inline]
pub fn debug(msg: &str) {
    log::debug!("{msg}");
}

#[inline]
pub fn warn(msg: &str) {
    log::warn!("{msg}");
}

#[inline]
pub fn error(msg: &str) {
    log::error!("{msg}");
}
