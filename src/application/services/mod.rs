mod complexity_analyzer;
mod conversion_worker;
mod fingerprint_cache;
mod fingerprinter;
mod orchestrator;
mod pattern_detector;
mod reconstructor;
mod sampling;
mod tier_router;
mod token_counter;

pub use complexity_analyzer::{ComplexityAnalyzer, ComplexityAnalyzerConfig};
pub(crate) use complexity_analyzer::is_multi_column;
pub use conversion_worker::{
    ConversionJob, ConversionWorker, WorkerError, WorkerHandle, spawn_worker_pool,
};
pub use fingerprint_cache::{CacheLookup, FingerprintCache, FingerprintCacheConfig, Flight};
pub use fingerprinter::{Fingerprinter, LshConfig, MAX_TABLES};
pub use orchestrator::{
    AttemptRecord, Orchestrator, PipelineError, PipelineRun, Submission, TierDeadlines,
};
pub use pattern_detector::{PatternDetector, PatternDetectorConfig, PatternReport};
pub use reconstructor::AdaptiveReconstructor;
pub use sampling::{EmbeddedSample, SamplingConfig, TextWindow, WindowSample, sample_windows};
pub use tier_router::{
    CacheState, CostEstimate, RouteTarget, RouterStats, RoutingDecision, RoutingInput,
    RoutingThresholds, TierCostModel, TierRouter, decide,
};
pub use token_counter::{count_tokens, truncate_to_tokens};
