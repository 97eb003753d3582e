// self
use crate::{_prelude::*, obs::FlowKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by pipeline flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("post_broker.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a warning for a media item that was dropped from the post.
pub(crate) fn media_dropped(index: usize, error: &Error) {
	#[cfg(feature = "tracing")]
	tracing::warn!(index, kind = error.kind().as_str(), %error, "media item dropped from post");
	#[cfg(not(feature = "tracing"))]
	let _ = (index, error);
}

/// Emits a warning when alt text could not be attached; the media id is kept.
pub(crate) fn alt_text_skipped(index: usize, error: &Error) {
	#[cfg(feature = "tracing")]
	tracing::warn!(index, kind = error.kind().as_str(), %error, "alt text was not attached");
	#[cfg(not(feature = "tracing"))]
	let _ = (index, error);
}

/// Emits an event when stored token state is removed.
pub(crate) fn session_cleared(reason: &str) {
	#[cfg(feature = "tracing")]
	tracing::info!(reason, "token state cleared");
	#[cfg(not(feature = "tracing"))]
	let _ = reason;
}

/// Emits a warning when a publish event could not be delivered to its sink.
pub(crate) fn event_sink_failed(error: &std::io::Error) {
	#[cfg(feature = "tracing")]
	tracing::warn!(%error, "publish event was not recorded");
	#[cfg(not(feature = "tracing"))]
	let _ = error;
}
