pub mod buffer;
pub mod color_math;
pub mod events;
pub mod pixel_view;
pub mod player;
pub mod rect;
pub mod render_target;
pub mod sample;
pub mod scan;
pub mod tolerance;
pub mod trace_layer;
pub mod trace_recorder;
