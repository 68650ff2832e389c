//! `tracing` when the `tracing` feature is enabled, and no-op stand-ins when it is not.
//!
//! Library code imports its logging macros from here rather than from `tracing` so that call sites
//! need no `#[cfg]`. The one exception is `#[instrument]`, which is written as
//! `#[cfg_attr(feature = "tracing", tracing::instrument)]`.
//!
//! Only what the crate uses is provided. Add to it as needed.

#![allow(unused_imports, unused_macros, dead_code)]

#[cfg(feature = "tracing")]
pub(crate) use tracing::{debug, debug_span, error, trace, warn};
#[cfg(feature = "tracing")]
pub(crate) use tracing_futures::Instrument;

#[cfg(not(feature = "tracing"))]
macro_rules! event {
    ($($x:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! span {
    ($($x:tt)*) => {
        ()
    };
}

#[cfg(not(feature = "tracing"))]
pub(crate) use {event as debug, event as error, event as trace, event as warn, span as debug_span};

/// Attaches a span to a future or stream. Without `tracing` there is no span to attach.
#[cfg(not(feature = "tracing"))]
pub(crate) trait Instrument: Sized {
    fn instrument(self, span: ()) -> Self;
}

#[cfg(not(feature = "tracing"))]
impl<T> Instrument for T {
    fn instrument(self, _: ()) -> Self {
        self
    }
}
