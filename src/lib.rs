// Meme Market: terminal client for viral trend predictions.
//
// This is the library root. Each module corresponds to one layer of the
// fetch → loading → result → error flow every view goes through.

pub mod api;
pub mod config;
pub mod demo;
pub mod output;
pub mod polling;
pub mod view;
