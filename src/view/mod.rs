// View state: what a screen renders, and the controller that drives it.
//
// A ViewController owns exactly one ViewState. Triggers move it to Loading;
// only the response to the most recent trigger may move it further.

pub mod controller;
pub mod state;
