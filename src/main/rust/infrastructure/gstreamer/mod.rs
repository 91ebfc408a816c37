mod gst_frame_sink;
mod gst_frame_source;
mod gst_transport_factory;
mod pipeline_builder;

pub use gst_frame_sink::GstFrameSink;
pub use gst_frame_source::GstFrameSource;
pub use gst_transport_factory::GstTransportFactory;
pub use pipeline_builder::{PipelineBuilder, APPSINK_NAME, APPSRC_NAME};
