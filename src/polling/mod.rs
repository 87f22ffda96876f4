// Polling: re-trigger a view on a fixed period while it's on screen.

pub mod scheduler;
