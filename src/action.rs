use serde::{Deserialize, Serialize};

use crate::catalog::CatalogEntry;
use crate::source::CatalogPage;
use crate::state::PokemonInfo;

#[derive(tui_dispatch::Action, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[action(infer_categories)]
pub enum Action {
    Init,

    PageFetch,
    PageDidLoad { request_id: u64, page: CatalogPage },
    PageDidError { request_id: u64, error: String },

    SearchStart,
    SearchSubmit,
    SearchCancel,
    SearchQueryChange(String),

    SortToggle,
    SortDidComplete(Vec<CatalogEntry>),

    SelectionMove(i16),
    DexSelect(usize),

    NavigateBegin(u32),
    NavigationDidSettle,

    DetailDidLoad(PokemonInfo),
    DetailDidError { name: String, error: String },
    DetailClose,

    Dispose,
    UiTerminalResize(u16, u16),
    Tick,
    Quit,
}
