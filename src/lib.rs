//! Pokedex browser - paginated catalog list with search, sort and a
//! navigation gate, driven by a tui-dispatch reducer.
//!
//! The library exposes the state machine and its collaborators so they can
//! be driven headlessly (see [`controller::ListController`]) and tested.

pub mod action;
pub mod api;
pub mod catalog;
pub mod controller;
pub mod effect;
pub mod reducer;
pub mod source;
pub mod state;
