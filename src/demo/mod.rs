// Demo backend: fabricated API responses for running without a server.
//
// Lives behind the same FetchExecutor trait as the HTTP client, so views
// can't tell the difference. Scores are random; nothing here predicts
// anything.

pub mod executor;
