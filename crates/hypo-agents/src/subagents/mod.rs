pub mod data_validator;
pub mod market_context;
pub mod report_generator;
pub mod statistical_analyzer;

pub use data_validator::{DataValidator, DATA_VALIDATOR};
pub use market_context::{
    ImpactTier, MarketContext, MarketContextAgent, MarketEvent, MarketTrend, MARKET_CONTEXT,
};
pub use report_generator::{GeneratedReport, ReportGenerator, REPORT_GENERATOR};
pub use statistical_analyzer::StatisticalAnalyzer;
