use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use tui_dispatch::{Component, DataResource, EventContext, EventKind, HandlerResponse, RenderContext};
use tui_dispatch_components::style::BorderStyle;
use tui_dispatch_components::{
    BaseStyle, Padding, SelectList, SelectListBehavior, SelectListProps, SelectListStyle,
    SelectionStyle, StatusBar, StatusBarHint, StatusBarItem, StatusBarProps, StatusBarSection,
    StatusBarStyle,
};

use pokedex::action::Action;
use pokedex::state::{AppState, PokemonInfo, Screen};

use crate::DexComponentId;

const BG_BASE: Color = Color::Rgb(12, 18, 28);
const BG_PANEL: Color = Color::Rgb(20, 32, 46);
const BG_HIGHLIGHT: Color = Color::Rgb(28, 92, 110);
const TEXT_MAIN: Color = Color::Rgb(232, 242, 244);
const TEXT_DIM: Color = Color::Rgb(176, 195, 207);
const ACCENT_TEAL: Color = Color::Rgb(72, 204, 184);
const ACCENT_GOLD: Color = Color::Rgb(228, 176, 88);
const ACCENT_RED: Color = Color::Rgb(224, 96, 96);
const SPINNER: [char; 4] = ['|', '/', '-', '\\'];

pub struct DexUi {
    dex_list: SelectList,
    status_bar: StatusBar,
}

impl DexUi {
    pub fn new() -> Self {
        Self {
            dex_list: SelectList::new(),
            status_bar: StatusBar::new(),
        }
    }

    pub fn render(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        state: &AppState,
        _render_ctx: RenderContext,
        event_ctx: &mut EventContext<DexComponentId>,
    ) {
        let base = Block::default().style(Style::default().bg(BG_BASE));
        frame.render_widget(base, area);
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(3),
            ])
            .split(area);

        render_header(frame, layout[0], state, event_ctx);
        match state.screen {
            Screen::List => render_list(frame, layout[1], state, event_ctx, &mut self.dex_list),
            Screen::Detail => render_detail(frame, layout[1], state, event_ctx),
        }
        render_footer(frame, layout[2], state, &mut self.status_bar);
    }

    pub fn handle_list_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        let actions = match event {
            EventKind::Key(key) => match key.code {
                crossterm::event::KeyCode::Enter => state
                    .selected_entry()
                    .map(|entry| vec![Action::NavigateBegin(entry.number)])
                    .unwrap_or_default(),
                crossterm::event::KeyCode::Char('s') => vec![Action::SortToggle],
                crossterm::event::KeyCode::Char('r') => vec![Action::PageFetch],
                crossterm::event::KeyCode::PageDown => {
                    vec![Action::SelectionMove(list_page_size(state))]
                }
                crossterm::event::KeyCode::PageUp => {
                    vec![Action::SelectionMove(-list_page_size(state))]
                }
                _ => {
                    let items = dex_items(state);
                    let props = SelectListProps {
                        items: &items,
                        count: items.len(),
                        selected: state.selected_index.min(items.len().saturating_sub(1)),
                        is_focused: true,
                        style: dex_list_style(),
                        behavior: SelectListBehavior {
                            show_scrollbar: true,
                            wrap_navigation: false,
                        },
                        on_select: Action::DexSelect,
                        render_item: &|item| item.clone(),
                    };
                    let actions: Vec<_> = self
                        .dex_list
                        .handle_event(event, props)
                        .into_iter()
                        .collect();
                    return handler_response(actions);
                }
            },
            EventKind::Scroll { delta, .. } => vec![Action::SelectionMove((*delta * 3) as i16)],
            _ => vec![],
        };
        handler_response(actions)
    }

    pub fn handle_search_event(
        &mut self,
        event: &EventKind,
        state: &AppState,
    ) -> HandlerResponse<Action> {
        let actions = match event {
            EventKind::Key(key) => match key.code {
                crossterm::event::KeyCode::Esc => vec![Action::SearchCancel],
                crossterm::event::KeyCode::Enter => vec![Action::SearchSubmit],
                crossterm::event::KeyCode::Backspace => {
                    let mut query = state.search.query.clone();
                    if query.pop().is_some() {
                        vec![Action::SearchQueryChange(query)]
                    } else {
                        vec![]
                    }
                }
                crossterm::event::KeyCode::Char(ch) => {
                    let mut query = state.search.query.clone();
                    query.push(ch);
                    vec![Action::SearchQueryChange(query)]
                }
                _ => vec![],
            },
            _ => vec![],
        };
        handler_response(actions)
    }

    pub fn handle_detail_event(
        &mut self,
        event: &EventKind,
        _state: &AppState,
    ) -> HandlerResponse<Action> {
        let actions = match event {
            EventKind::Key(key) => match key.code {
                crossterm::event::KeyCode::Esc
                | crossterm::event::KeyCode::Backspace
                | crossterm::event::KeyCode::Char('b') => vec![Action::DetailClose],
                _ => vec![],
            },
            _ => vec![],
        };
        handler_response(actions)
    }
}

fn handler_response(actions: Vec<Action>) -> HandlerResponse<Action> {
    if actions.is_empty() {
        HandlerResponse::ignored()
    } else {
        HandlerResponse {
            actions,
            consumed: true,
            needs_render: false,
        }
    }
}

fn render_header(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    event_ctx: &mut EventContext<DexComponentId>,
) {
    if state.search.active {
        event_ctx.set_component_area(DexComponentId::Search, area);
    } else {
        event_ctx.component_areas.remove(&DexComponentId::Search);
    }
    let title_style = Style::default()
        .fg(ACCENT_TEAL)
        .add_modifier(Modifier::BOLD);
    let search = if state.search.active {
        format!("/{}_", state.search.query)
    } else if state.search.query.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", state.search.query)
    };
    let header = Line::from(vec![
        Span::styled("POKEDEX", title_style),
        Span::raw("  |  Search: "),
        Span::styled(search, Style::default().fg(ACCENT_TEAL)),
        Span::raw("  |  Sort: "),
        Span::styled(state.sort_order.label(), Style::default().fg(ACCENT_GOLD)),
    ]);
    let border = if state.search.active {
        Style::default().fg(ACCENT_TEAL)
    } else {
        Style::default().fg(TEXT_DIM)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN))
        .border_style(border);
    frame.render_widget(Paragraph::new(header).block(block), area);
}

fn render_list(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    event_ctx: &mut EventContext<DexComponentId>,
    dex_list: &mut SelectList,
) {
    event_ctx.set_component_area(DexComponentId::DexList, area);
    event_ctx.component_areas.remove(&DexComponentId::Detail);
    let title = format!("DEX {}", state.visible.len());
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN))
        .border_style(Style::default().fg(ACCENT_TEAL));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.visible.is_empty() {
        frame.render_widget(empty_list_text(state), inner);
        return;
    }

    let items = dex_items(state);
    let props = SelectListProps {
        items: &items,
        count: items.len(),
        selected: state.selected_index.min(items.len().saturating_sub(1)),
        is_focused: !state.search.active,
        style: dex_list_style(),
        behavior: SelectListBehavior {
            show_scrollbar: true,
            wrap_navigation: false,
        },
        on_select: Action::DexSelect,
        render_item: &|item| item.clone(),
    };
    dex_list.render(frame, inner, props);
}

fn empty_list_text(state: &AppState) -> Paragraph<'static> {
    let lines = if state.is_loading {
        vec![Line::from(Span::styled(
            format!("{} Loading", spinner(state.tick)),
            Style::default().fg(ACCENT_GOLD),
        ))]
    } else if let Some(error) = &state.last_error {
        vec![
            Line::from(Span::styled(error.clone(), Style::default().fg(ACCENT_RED))),
            Line::from(""),
            Line::from(Span::styled(
                "press r to retry",
                Style::default().fg(TEXT_DIM),
            )),
        ]
    } else if state.search_session_active {
        vec![Line::from(Span::styled(
            "No matches",
            Style::default().fg(TEXT_DIM),
        ))]
    } else {
        vec![]
    };
    Paragraph::new(Text::from(lines)).alignment(Alignment::Center)
}

fn render_detail(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    event_ctx: &mut EventContext<DexComponentId>,
) {
    event_ctx.set_component_area(DexComponentId::Detail, area);
    event_ctx.component_areas.remove(&DexComponentId::DexList);
    let title = state
        .detail_entry
        .as_ref()
        .map(|entry| format!("#{:03} {}", entry.number, entry.name))
        .unwrap_or_else(|| "DATA".to_string());
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(Style::default().bg(BG_PANEL).fg(TEXT_MAIN))
        .border_style(Style::default().fg(ACCENT_GOLD));
    let text = match &state.detail {
        DataResource::Loaded(info) => info_text(info),
        DataResource::Failed(error) => Text::from(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(ACCENT_RED),
        ))),
        DataResource::Loading => Text::from(format!("{} Loading pokemon", spinner(state.tick))),
        DataResource::Empty => Text::default(),
    };
    let paragraph = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn info_text(info: &PokemonInfo) -> Text<'static> {
    let label = Style::default().fg(TEXT_DIM);
    let value = Style::default().fg(TEXT_MAIN);
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Type    ", label),
            Span::styled(info.types.join(" / ").to_ascii_uppercase(), Style::default().fg(ACCENT_TEAL)),
        ]),
        Line::from(vec![
            Span::styled("Height  ", label),
            Span::styled(format!("{:.1} m", info.height as f32 / 10.0), value),
        ]),
        Line::from(vec![
            Span::styled("Weight  ", label),
            Span::styled(format!("{:.1} kg", info.weight as f32 / 10.0), value),
        ]),
        Line::from(""),
    ];
    for stat in &info.stats {
        let bar = "#".repeat((stat.value / 10) as usize);
        lines.push(Line::from(vec![
            Span::styled(format!("{:<16}", stat.name), label),
            Span::styled(format!("{:>3} ", stat.value), value),
            Span::styled(bar, Style::default().fg(ACCENT_GOLD)),
        ]));
    }
    if let Some(url) = &info.sprite_url {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Sprite  ", label),
            Span::styled(url.clone(), Style::default().fg(TEXT_DIM)),
        ]));
    }
    Text::from(lines)
}

fn render_footer(frame: &mut Frame, area: Rect, state: &AppState, status_bar: &mut StatusBar) {
    let status = state.status_message();
    let (left_hints, center_hints) = status_hints(state);
    let status_span = Span::styled(status.as_str(), Style::default().fg(ACCENT_GOLD));
    let status_items = [StatusBarItem::span(status_span)];

    let style = StatusBarStyle {
        base: BaseStyle {
            border: Some(BorderStyle {
                borders: Borders::ALL,
                style: Style::default().fg(TEXT_DIM),
                focused_style: Some(Style::default().fg(ACCENT_TEAL)),
            }),
            padding: Padding::xy(1, 0),
            bg: Some(BG_PANEL),
            fg: Some(TEXT_MAIN),
        },
        text: Style::default().fg(TEXT_DIM),
        hint_key: Style::default()
            .fg(ACCENT_TEAL)
            .add_modifier(Modifier::BOLD),
        hint_label: Style::default().fg(TEXT_DIM),
        separator: Style::default().fg(TEXT_DIM),
    };

    let props = StatusBarProps {
        left: StatusBarSection::hints(&left_hints).with_separator("  "),
        center: StatusBarSection::hints(&center_hints).with_separator("  "),
        right: StatusBarSection::items(&status_items).with_separator("  "),
        style,
        is_focused: false,
    };
    Component::<Action>::render(status_bar, frame, area, props);
}

fn status_hints(state: &AppState) -> (Vec<StatusBarHint<'static>>, Vec<StatusBarHint<'static>>) {
    let center = vec![StatusBarHint::new("q", "Quit")];
    if state.search.active {
        let left = vec![
            StatusBarHint::new("Enter", "Apply"),
            StatusBarHint::new("Esc", "Clear"),
            StatusBarHint::new("Bksp", "Delete"),
        ];
        return (left, center);
    }
    let left = match state.screen {
        Screen::List => vec![
            StatusBarHint::new("j/k", "Move"),
            StatusBarHint::new("Enter", "Open"),
            StatusBarHint::new("/", "Search"),
            StatusBarHint::new("s", "Sort"),
            StatusBarHint::new("r", "Retry"),
        ],
        Screen::Detail => vec![StatusBarHint::new("Esc", "Back")],
    };
    (left, center)
}

fn dex_items(state: &AppState) -> Vec<Line<'static>> {
    state
        .visible
        .iter()
        .map(|entry| Line::from(format!("#{:03} {}", entry.number, entry.name)))
        .collect()
}

fn dex_list_style() -> SelectListStyle {
    SelectListStyle {
        base: BaseStyle {
            border: None,
            padding: Padding::xy(1, 0),
            bg: None,
            fg: Some(TEXT_MAIN),
        },
        selection: SelectionStyle {
            style: Some(
                Style::default()
                    .bg(BG_HIGHLIGHT)
                    .fg(TEXT_MAIN)
                    .add_modifier(Modifier::BOLD),
            ),
            marker: None,
            disabled: false,
        },
        ..SelectListStyle::default()
    }
}

fn list_page_size(state: &AppState) -> i16 {
    state.terminal_size.1.saturating_sub(8).max(1) as i16
}

fn spinner(tick: u64) -> char {
    SPINNER[(tick % SPINNER.len() as u64) as usize]
}
