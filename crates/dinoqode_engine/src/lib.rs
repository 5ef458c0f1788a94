//! Dinoqode engine: page extraction, batch persistence and generator orchestration.
mod artwork;
mod decode;
mod extract;
mod fetch;
mod filename;
mod generator;
mod load;
mod orchestrator;
mod page;
mod persist;
mod registry;
mod types;

pub use artwork::{album_id_from_image_url, background_image_url, best_srcset_candidate};
pub use decode::{decode_page, CharsetSource, DecodeError, DecodedPage};
pub use extract::{
    AldiLifeStrategy, AmazonMusicStrategy, AppleMusicStrategy, ExtractionStrategy,
    SpotifyStrategy,
};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher};
pub use filename::archive_filename;
pub use generator::{
    GenerationError, GenerationReport, Generator, GeneratorSettings, ProcessGenerator,
};
pub use load::{fetch_page, read_page, PageLoadError};
pub use orchestrator::{utc_clock, Clock, Orchestrator, SubmissionError, SubmissionOutcome};
pub use page::PageContext;
pub use persist::{ensure_dir, BatchStore, PersistError};
pub use registry::{ServiceAdapter, ServiceRegistry};
pub use types::{
    ExtractionError, FetchError, FetchFailure, FetchMetadata, FetchOutput, RegistryError,
};
