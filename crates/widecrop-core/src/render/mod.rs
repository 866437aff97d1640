//! Software rasterization of the crop editor view.
//!
//! The live preview and the fixed-size export share one rasterizer: an
//! RGBA [`Surface`] that can draw a [`DecodedImage`](crate::decode::DecodedImage)
//! through an arbitrary affine map. The two pipelines only differ in the map
//! they build (see [`pipeline`]).

mod pipeline;
mod sample;
mod surface;

pub use pipeline::{
    export_affine, preview_affine, render_export, render_preview, rotation_affine, Viewport,
};
pub use sample::InterpolationFilter;
pub use surface::Surface;
