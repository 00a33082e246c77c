pub mod tmdb;

pub use tmdb::{
    ApiKeySource, ApiRequest, ApiResponse, HttpBackend, ReqwestBackend, RetryPolicy, TmdbClient,
    TmdbError,
};
