//! Pipeline steps and the per-week orchestrator.
//!
//! Each step is intentionally small so the CLI can stay thin and the
//! file-driven flow stays predictable.
pub mod generate;
pub mod publish;
pub mod render;
pub mod run;

pub use generate::{generate_step, GenerateRecord};
pub use publish::{publish_step, PublishRecord};
pub use render::{render_step, RenderOptions, RenderRecord};
pub use run::{run_pipeline, PipelineOptions};
