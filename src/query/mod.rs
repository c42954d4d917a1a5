pub mod executor;
pub mod scorer;

pub use executor::{QueryConfig, QueryExecutor, QueryRequest, QueryResult};
pub use scorer::{Bm25Params, Bm25Scorer};
