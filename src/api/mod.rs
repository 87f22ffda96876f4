// Meme Market API: everything that crosses the network boundary.
//
// Request descriptors describe a call, a FetchExecutor performs it, and the
// endpoint decoders turn raw JSON into validated models. Nothing in here
// touches view state.

pub mod client;
pub mod endpoints;
pub mod models;
pub mod request;
pub mod traits;
