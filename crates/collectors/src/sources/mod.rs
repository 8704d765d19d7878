//! One module per upstream provider.

pub mod bea;
pub mod bis;
pub mod bls;
pub mod census;
pub mod ecb;
pub mod eia;
pub mod finra;
pub mod fred;
pub mod imf;
pub mod oecd;
pub mod sec;
pub mod treasury;
pub mod worldbank;

pub use bea::BeaCollector;
pub use bis::BisCollector;
pub use bls::BlsCollector;
pub use census::CensusCollector;
pub use ecb::EcbCollector;
pub use eia::EiaCollector;
pub use finra::FinraCollector;
pub use fred::FredCollector;
pub use imf::ImfCollector;
pub use oecd::OecdCollector;
pub use sec::SecCollector;
pub use treasury::TreasuryCollector;
pub use worldbank::WorldBankCollector;
