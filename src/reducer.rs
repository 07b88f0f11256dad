//! Reducer - the list controller's state transitions

use tui_dispatch::{DataResource, DispatchResult};

use crate::action::Action;
use crate::catalog::{entry_from_raw, filter_entries, CatalogEntry};
use crate::effect::Effect;
use crate::source::CatalogPage;
use crate::state::{AppState, Screen};

pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    match action {
        Action::Init | Action::PageFetch => fetch_next_page(state),

        Action::PageDidLoad { request_id, page } => {
            if state.pending_request != Some(request_id) {
                return DispatchResult::unchanged();
            }
            apply_page(state, page);
            DispatchResult::changed()
        }

        Action::PageDidError { request_id, error } => {
            if state.pending_request != Some(request_id) {
                return DispatchResult::unchanged();
            }
            state.pending_request = None;
            state.is_loading = false;
            state.last_error = Some(error);
            DispatchResult::changed()
        }

        Action::SearchStart => {
            if state.screen != Screen::List || state.search.active {
                return DispatchResult::unchanged();
            }
            state.search.active = true;
            DispatchResult::changed()
        }

        Action::SearchSubmit => {
            if !state.search.active {
                return DispatchResult::unchanged();
            }
            state.search.active = false;
            DispatchResult::changed()
        }

        Action::SearchCancel => {
            state.search.active = false;
            state.search.query.clear();
            apply_search(state, "");
            DispatchResult::changed()
        }

        Action::SearchQueryChange(query) => {
            apply_search(state, &query);
            state.search.query = query;
            DispatchResult::changed()
        }

        Action::SortToggle => {
            if state.disposed || state.is_loading {
                return DispatchResult::unchanged();
            }
            let order = state.sort_order;
            state.sort_order = order.toggle();
            state.is_loading = true;
            DispatchResult::changed_with(Effect::SortEntries {
                entries: state.full.clone(),
                order,
            })
        }

        Action::SortDidComplete(sorted) => {
            if state.disposed || !state.is_loading || state.pending_request.is_some() {
                return DispatchResult::unchanged();
            }
            state.visible = sorted;
            state.is_loading = false;
            state.selected_index = 0;
            DispatchResult::changed()
        }

        Action::SelectionMove(delta) => {
            let target = offset_index(state.selected_index, delta);
            select_index(state, target)
        }

        Action::DexSelect(index) => select_index(state, index),

        Action::NavigateBegin(number) => {
            if state.is_navigating {
                return DispatchResult::unchanged();
            }
            let Some(entry) = find_entry(state, number) else {
                return DispatchResult::unchanged();
            };
            let name = entry.name.to_lowercase();
            state.is_navigating = true;
            state.screen = Screen::Detail;
            state.search.active = false;
            state.detail_entry = Some(entry);
            state.detail = DataResource::Loading;
            DispatchResult::changed_with_many(vec![
                Effect::LoadDetail { name },
                Effect::SettleNavigation {
                    delay_ms: state.config.settle_delay_ms,
                },
            ])
        }

        Action::NavigationDidSettle => {
            if !state.is_navigating {
                return DispatchResult::unchanged();
            }
            state.is_navigating = false;
            state.search_cache = None;
            state.deferred.clear();
            state.search_session_active = false;
            state.search = Default::default();
            state.visible = state.full.clone();
            state.clamp_selection();
            DispatchResult::changed()
        }

        Action::DetailDidLoad(info) => {
            if !detail_matches(state, &info.name) {
                return DispatchResult::unchanged();
            }
            state.detail = DataResource::Loaded(info);
            DispatchResult::changed()
        }

        Action::DetailDidError { name, error } => {
            if !detail_matches(state, &name) {
                return DispatchResult::unchanged();
            }
            state.detail = DataResource::Failed(error);
            DispatchResult::changed()
        }

        Action::DetailClose => {
            if state.screen != Screen::Detail {
                return DispatchResult::unchanged();
            }
            state.screen = Screen::List;
            state.detail_entry = None;
            state.detail = DataResource::Empty;
            DispatchResult::changed()
        }

        Action::Dispose | Action::Quit => {
            if state.disposed {
                return DispatchResult::unchanged();
            }
            state.disposed = true;
            state.pending_request = None;
            state.is_loading = false;
            DispatchResult::changed()
        }

        Action::UiTerminalResize(width, height) => {
            state.terminal_size = (width, height);
            DispatchResult::changed()
        }

        Action::Tick => {
            state.tick = state.tick.wrapping_add(1);
            if state.is_loading || state.detail.is_loading() {
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }
    }
}

fn fetch_next_page(state: &mut AppState) -> DispatchResult<Effect> {
    if !state.can_fetch() {
        return DispatchResult::unchanged();
    }
    let request_id = state.next_request_id;
    state.next_request_id += 1;
    state.pending_request = Some(request_id);
    state.is_loading = true;
    DispatchResult::changed_with(Effect::FetchPage {
        request_id,
        limit: state.config.page_size,
        offset: state.next_offset(),
    })
}

fn apply_page(state: &mut AppState, page: CatalogPage) {
    let received = page.items.len();
    let entries: Vec<CatalogEntry> = page.items.iter().filter_map(entry_from_raw).collect();

    state.pending_request = None;
    state.pages_loaded += 1;
    state.fetched_count += received;
    state.total_count = Some(page.total_count);
    state.full.extend(entries.iter().cloned());
    if state.search_session_active {
        state.deferred.extend(entries);
    } else {
        state.visible = state.full.clone();
    }
    state.end_reached = received == 0 || state.fetched_count >= page.total_count;
    state.last_error = None;
    state.is_loading = false;
}

/// Empty query ends the session and restores the snapshot; anything else
/// filters the snapshot taken when the session began.
fn apply_search(state: &mut AppState, query: &str) {
    if query.is_empty() {
        if state.search_session_active {
            let mut restored = state.search_cache.take().unwrap_or_default();
            restored.append(&mut state.deferred);
            state.visible = restored;
            state.search_session_active = false;
            state.clamp_selection();
        }
        return;
    }

    if !state.search_session_active {
        state.search_cache = Some(state.visible.clone());
        state.deferred.clear();
        state.search_session_active = true;
    }
    state.visible = state
        .search_cache
        .as_deref()
        .map(|snapshot| filter_entries(snapshot, query))
        .unwrap_or_default();
    state.selected_index = 0;
}

fn select_index(state: &mut AppState, index: usize) -> DispatchResult<Effect> {
    let changed = state.set_selected_index(index);
    if !state.search_session_active && state.screen == Screen::List && state.near_list_end() {
        let fetch = fetch_next_page(state);
        if fetch.changed {
            return fetch;
        }
    }
    if changed {
        DispatchResult::changed()
    } else {
        DispatchResult::unchanged()
    }
}

fn offset_index(current: usize, delta: i16) -> usize {
    if delta.is_negative() {
        current.saturating_sub(delta.unsigned_abs() as usize)
    } else {
        current.saturating_add(delta as usize)
    }
}

fn find_entry(state: &AppState, number: u32) -> Option<CatalogEntry> {
    state
        .visible
        .iter()
        .chain(state.full.iter())
        .find(|entry| entry.number == number)
        .cloned()
}

fn detail_matches(state: &AppState, name: &str) -> bool {
    state
        .detail_entry
        .as_ref()
        .map(|entry| entry.name.eq_ignore_ascii_case(name))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SortOrder;
    use crate::source::RawCatalogItem;
    use crate::state::ListConfig;

    fn raw(name: &str, number: u32) -> RawCatalogItem {
        RawCatalogItem {
            source_url: format!("https://pokeapi.co/api/v2/pokemon/{number}/"),
            raw_name: name.to_string(),
        }
    }

    fn page(total_count: usize, items: &[(&str, u32)]) -> CatalogPage {
        CatalogPage {
            total_count,
            items: items.iter().map(|(name, number)| raw(name, *number)).collect(),
        }
    }

    fn pending_id(state: &AppState) -> u64 {
        state.pending_request.expect("fetch in flight")
    }

    fn loaded_state(items: &[(&str, u32)]) -> AppState {
        let mut state = AppState::default();
        reducer(&mut state, Action::PageFetch);
        let request_id = pending_id(&state);
        reducer(
            &mut state,
            Action::PageDidLoad {
                request_id,
                page: page(items.len(), items),
            },
        );
        state
    }

    fn names(entries: &[CatalogEntry]) -> Vec<&str> {
        entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    #[test]
    fn test_fetch_sets_loading_and_requests_first_page() {
        let mut state = AppState::new(ListConfig {
            page_size: 10,
            settle_delay_ms: 0,
        });

        let result = reducer(&mut state, Action::Init);

        assert!(result.changed);
        assert!(state.is_loading);
        assert_eq!(
            result.effects,
            vec![Effect::FetchPage {
                request_id: 1,
                limit: 10,
                offset: 0,
            }]
        );
    }

    #[test]
    fn test_fetch_skipped_while_loading() {
        let mut state = AppState::default();
        reducer(&mut state, Action::PageFetch);

        let result = reducer(&mut state, Action::PageFetch);

        assert!(!result.changed);
        assert!(result.effects.is_empty());
    }

    #[test]
    fn test_page_load_appends_and_advances_offset() {
        let mut state = AppState::new(ListConfig {
            page_size: 2,
            settle_delay_ms: 0,
        });
        reducer(&mut state, Action::PageFetch);
        let first = pending_id(&state);
        reducer(
            &mut state,
            Action::PageDidLoad {
                request_id: first,
                page: page(3, &[("bulbasaur", 1), ("ivysaur", 2)]),
            },
        );
        assert!(!state.is_loading);
        assert!(!state.end_reached);
        assert_eq!(names(&state.visible), vec!["Bulbasaur", "Ivysaur"]);

        let result = reducer(&mut state, Action::PageFetch);
        assert!(matches!(
            result.effects[0],
            Effect::FetchPage { offset: 2, limit: 2, .. }
        ));
        let second = pending_id(&state);
        reducer(
            &mut state,
            Action::PageDidLoad {
                request_id: second,
                page: page(3, &[("venusaur", 3)]),
            },
        );

        assert!(state.end_reached);
        assert_eq!(state.full.len(), 3);
        assert_eq!(state.visible, state.full);
        assert!(!reducer(&mut state, Action::PageFetch).changed);
    }

    #[test]
    fn test_failed_fetch_keeps_lists_and_records_error() {
        let mut state = loaded_state(&[("bulbasaur", 1)]);
        state.end_reached = false;
        let before_full = state.full.clone();
        let before_visible = state.visible.clone();

        reducer(&mut state, Action::PageFetch);
        let request_id = pending_id(&state);
        reducer(
            &mut state,
            Action::PageDidError {
                request_id,
                error: "connection reset".into(),
            },
        );

        assert_eq!(state.full, before_full);
        assert_eq!(state.visible, before_visible);
        assert_eq!(state.last_error.as_deref(), Some("connection reset"));
        assert!(!state.is_loading);
    }

    #[test]
    fn test_stale_or_disposed_results_are_ignored() {
        let mut state = AppState::default();
        reducer(&mut state, Action::PageFetch);
        let request_id = pending_id(&state);

        reducer(&mut state, Action::Dispose);
        let result = reducer(
            &mut state,
            Action::PageDidLoad {
                request_id,
                page: page(1, &[("mew", 151)]),
            },
        );

        assert!(!result.changed);
        assert!(state.full.is_empty());
        assert!(!reducer(&mut state, Action::PageFetch).changed);
    }

    #[test]
    fn test_search_filters_snapshot_and_clear_restores_it() {
        let mut state = loaded_state(&[("pikachu", 25), ("raichu", 26), ("pidgey", 16)]);
        let before = state.visible.clone();

        reducer(&mut state, Action::SearchQueryChange("chu".into()));
        assert!(state.search_session_active);
        assert_eq!(names(&state.visible), vec!["Pikachu", "Raichu"]);

        reducer(&mut state, Action::SearchQueryChange("pi".into()));
        assert_eq!(names(&state.visible), vec!["Pikachu", "Pidgey"]);

        reducer(&mut state, Action::SearchQueryChange(String::new()));
        assert!(!state.search_session_active);
        assert_eq!(state.visible, before);
    }

    #[test]
    fn test_search_by_number_is_exact() {
        let mut state = loaded_state(&[("pikachu", 25), ("nidoqueen", 31), ("wartortle", 8)]);

        reducer(&mut state, Action::SearchQueryChange("25".into()));

        assert_eq!(state.visible.len(), 1);
        assert_eq!(state.visible[0].number, 25);
    }

    #[test]
    fn test_page_during_search_is_deferred_until_clear() {
        let mut state = AppState::new(ListConfig {
            page_size: 1,
            settle_delay_ms: 0,
        });
        reducer(&mut state, Action::PageFetch);
        let first = pending_id(&state);
        reducer(
            &mut state,
            Action::PageDidLoad {
                request_id: first,
                page: page(2, &[("pikachu", 25)]),
            },
        );
        reducer(&mut state, Action::PageFetch);
        let second = pending_id(&state);

        reducer(&mut state, Action::SearchQueryChange("pika".into()));
        reducer(
            &mut state,
            Action::PageDidLoad {
                request_id: second,
                page: page(2, &[("pichu", 172)]),
            },
        );
        assert_eq!(names(&state.visible), vec!["Pikachu"]);
        assert_eq!(state.full.len(), 2);

        reducer(&mut state, Action::SearchQueryChange("pi".into()));
        assert_eq!(names(&state.visible), vec!["Pikachu"]);

        reducer(&mut state, Action::SearchQueryChange(String::new()));
        assert_eq!(names(&state.visible), vec!["Pikachu", "Pichu"]);
    }

    #[test]
    fn test_sort_toggles_and_brackets_loading() {
        let mut state = loaded_state(&[("b", 1), ("a", 2), ("a", 3)]);

        let result = reducer(&mut state, Action::SortToggle);
        assert!(state.is_loading);
        assert!(!state.sort_ascending());
        let Effect::SortEntries { entries, order } = result.effects[0].clone() else {
            panic!("expected sort effect");
        };
        assert_eq!(order, SortOrder::Ascending);
        assert!(!reducer(&mut state, Action::SortToggle).changed);

        let sorted = crate::catalog::sorted_entries(&entries, order);
        reducer(&mut state, Action::SortDidComplete(sorted));

        assert!(!state.is_loading);
        let numbers: Vec<u32> = state.visible.iter().map(|entry| entry.number).collect();
        assert_eq!(numbers, vec![2, 3, 1]);
        let full_numbers: Vec<u32> = state.full.iter().map(|entry| entry.number).collect();
        assert_eq!(full_numbers, vec![1, 2, 3]);
    }

    #[test]
    fn test_navigation_gate_rejects_second_begin() {
        let mut state = loaded_state(&[("pikachu", 25), ("raichu", 26)]);

        let first = reducer(&mut state, Action::NavigateBegin(25));
        assert!(first.changed);
        assert!(state.is_navigating);
        assert_eq!(state.screen, Screen::Detail);
        assert!(first
            .effects
            .contains(&Effect::LoadDetail { name: "pikachu".into() }));

        let second = reducer(&mut state, Action::NavigateBegin(26));
        assert!(!second.changed);
        assert!(second.effects.is_empty());
        assert!(state.is_navigating);
        assert_eq!(state.detail_entry.as_ref().map(|entry| entry.number), Some(25));
    }

    #[test]
    fn test_navigation_settle_restores_full_list() {
        let mut state = loaded_state(&[("pikachu", 25), ("raichu", 26)]);
        reducer(&mut state, Action::SearchQueryChange("rai".into()));
        reducer(&mut state, Action::NavigateBegin(26));

        reducer(&mut state, Action::NavigationDidSettle);

        assert!(!state.is_navigating);
        assert!(!state.search_session_active);
        assert_eq!(state.visible, state.full);
        assert!(reducer(&mut state, Action::NavigateBegin(25)).changed);
    }

    #[test]
    fn test_detail_results_only_apply_to_current_entry() {
        let mut state = loaded_state(&[("pikachu", 25)]);
        reducer(&mut state, Action::NavigateBegin(25));

        let other = reducer(
            &mut state,
            Action::DetailDidError {
                name: "mew".into(),
                error: "boom".into(),
            },
        );
        assert!(!other.changed);
        assert!(state.detail.is_loading());

        reducer(&mut state, Action::DetailClose);
        assert_eq!(state.screen, Screen::List);
        assert!(state.detail.is_empty());
    }

    #[test]
    fn test_selecting_near_end_requests_next_page() {
        let mut state = AppState::new(ListConfig {
            page_size: 4,
            settle_delay_ms: 0,
        });
        reducer(&mut state, Action::PageFetch);
        let request_id = pending_id(&state);
        reducer(
            &mut state,
            Action::PageDidLoad {
                request_id,
                page: page(8, &[("a", 1), ("b", 2), ("c", 3), ("d", 4)]),
            },
        );

        let result = reducer(&mut state, Action::SelectionMove(1));
        assert!(result.effects.is_empty());

        let result = reducer(&mut state, Action::SelectionMove(1));
        assert!(matches!(
            result.effects[0],
            Effect::FetchPage { offset: 4, .. }
        ));
        assert_eq!(state.selected_index, 2);
    }

    #[test]
    fn test_short_pages_advance_by_items_received() {
        let mut state = AppState::new(ListConfig {
            page_size: 3,
            settle_delay_ms: 0,
        });
        let pages = [
            (0, vec![("bulbasaur", 1), ("ivysaur", 2)]),
            (2, vec![("venusaur", 3), ("charmander", 4)]),
            (4, vec![("charmeleon", 5)]),
        ];

        for (expected_offset, items) in pages {
            assert!(!state.end_reached);
            let result = reducer(&mut state, Action::PageFetch);
            assert_eq!(
                result.effects,
                vec![Effect::FetchPage {
                    request_id: pending_id(&state),
                    limit: 3,
                    offset: expected_offset,
                }]
            );
            let request_id = pending_id(&state);
            reducer(
                &mut state,
                Action::PageDidLoad {
                    request_id,
                    page: page(5, &items),
                },
            );
        }

        assert!(state.end_reached);
        let numbers: Vec<u32> = state.full.iter().map(|entry| entry.number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_dropped_items_still_advance_offset() {
        let mut state = AppState::new(ListConfig {
            page_size: 2,
            settle_delay_ms: 0,
        });
        reducer(&mut state, Action::PageFetch);
        let request_id = pending_id(&state);
        let mut first = page(4, &[("bulbasaur", 1)]);
        first.items.push(RawCatalogItem {
            source_url: "https://pokeapi.co/api/v2/pokemon/".into(),
            raw_name: "missingno".into(),
        });
        reducer(
            &mut state,
            Action::PageDidLoad {
                request_id,
                page: first,
            },
        );

        assert_eq!(state.full.len(), 1);
        let result = reducer(&mut state, Action::PageFetch);
        assert!(matches!(
            result.effects[0],
            Effect::FetchPage { offset: 2, .. }
        ));
    }

    #[test]
    fn test_fetch_refused_while_sort_in_flight() {
        let mut state = AppState::new(ListConfig {
            page_size: 4,
            settle_delay_ms: 0,
        });
        reducer(&mut state, Action::PageFetch);
        let request_id = pending_id(&state);
        reducer(
            &mut state,
            Action::PageDidLoad {
                request_id,
                page: page(8, &[("d", 1), ("c", 2), ("b", 3), ("a", 4)]),
            },
        );
        reducer(&mut state, Action::SortToggle);
        assert!(state.is_loading);

        let fetch = reducer(&mut state, Action::PageFetch);
        assert!(!fetch.changed);
        assert!(fetch.effects.is_empty());

        reducer(&mut state, Action::SelectionMove(1));
        let near_end = reducer(&mut state, Action::SelectionMove(1));
        assert_eq!(state.selected_index, 2);
        assert!(near_end.effects.is_empty());
        assert!(state.pending_request.is_none());
    }

    #[test]
    fn test_sort_during_search_then_clear_restores_snapshot() {
        let mut state = loaded_state(&[("pikachu", 25), ("raichu", 26), ("pidgey", 16)]);
        let before = state.visible.clone();
        reducer(&mut state, Action::SearchQueryChange("chu".into()));

        let result = reducer(&mut state, Action::SortToggle);
        let Effect::SortEntries { entries, order } = result.effects[0].clone() else {
            panic!("expected sort effect");
        };
        let sorted = crate::catalog::sorted_entries(&entries, order);
        reducer(&mut state, Action::SortDidComplete(sorted));
        assert_eq!(names(&state.visible), vec!["Pidgey", "Pikachu", "Raichu"]);

        reducer(&mut state, Action::SearchQueryChange(String::new()));

        assert!(!state.search_session_active);
        assert_eq!(state.visible, before);
    }

    #[test]
    fn test_page_after_sort_resets_visible_to_full() {
        let mut state = AppState::new(ListConfig {
            page_size: 2,
            settle_delay_ms: 0,
        });
        reducer(&mut state, Action::PageFetch);
        let first = pending_id(&state);
        reducer(
            &mut state,
            Action::PageDidLoad {
                request_id: first,
                page: page(4, &[("b", 1), ("a", 2)]),
            },
        );
        let result = reducer(&mut state, Action::SortToggle);
        let Effect::SortEntries { entries, order } = result.effects[0].clone() else {
            panic!("expected sort effect");
        };
        reducer(
            &mut state,
            Action::SortDidComplete(crate::catalog::sorted_entries(&entries, order)),
        );
        assert_eq!(names(&state.visible), vec!["A", "B"]);

        reducer(&mut state, Action::PageFetch);
        let second = pending_id(&state);
        reducer(
            &mut state,
            Action::PageDidLoad {
                request_id: second,
                page: page(4, &[("d", 3), ("c", 4)]),
            },
        );

        assert_eq!(state.visible, state.full);
        assert_eq!(names(&state.visible), vec!["B", "A", "D", "C"]);
    }

    #[test]
    fn test_quit_tears_down_and_drops_late_page() {
        let mut state = AppState::default();
        reducer(&mut state, Action::PageFetch);
        let request_id = pending_id(&state);

        assert!(reducer(&mut state, Action::Quit).changed);
        let late = reducer(
            &mut state,
            Action::PageDidLoad {
                request_id,
                page: page(1, &[("mew", 151)]),
            },
        );

        assert!(state.disposed);
        assert!(!late.changed);
        assert!(state.full.is_empty());
        assert!(!state.can_fetch());
    }
}
