// Library exports for promptgraph

pub mod analysis;
pub mod completion;
pub mod csv_reader;
pub mod encode;
pub mod error;
pub mod normalize;
pub mod orchestrate;
pub mod palette;
pub mod schema;
pub mod suggest;
pub mod synthesize;

pub use completion::{CompletionClient, CompletionConfig, OpenAiClient};
pub use encode::{resolve_encoding, Encoding, SeriesKind};
pub use error::PipelineError;
pub use orchestrate::{ChartResult, Step, Workbench};
pub use schema::{Schema, SchemaOption};
pub use suggest::Suggestion;
pub use synthesize::RowOrder;
