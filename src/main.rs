mod ui;

use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::EnvFilter;
use tui_dispatch::{
    EffectContext, EffectStoreLike, EffectStoreWithMiddleware, EventBus, EventKind,
    EventRoutingState, HandlerResponse, Keybindings, TaskKey,
};
use tui_dispatch_debug::debug::DebugLayer;
use tui_dispatch_debug::{
    DebugCliArgs, DebugRunOutput, DebugSession, DebugSessionError, ReplayItem,
};

use pokedex::action::Action;
use pokedex::api::{self, PokeApi};
use pokedex::catalog::sorted_entries;
use pokedex::effect::Effect;
use pokedex::reducer::reducer;
use pokedex::source::CatalogSource;
use pokedex::state::{
    AppState, ListConfig, Screen, DEFAULT_PAGE_SIZE, DEFAULT_SETTLE_DELAY_MS,
};

#[derive(Parser, Debug)]
#[command(name = "pokedex")]
#[command(about = "Browse the PokeAPI catalog page by page")]
struct Args {
    /// Entries requested per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE as u64, value_parser = clap::value_parser!(u64).range(1..))]
    page_size: u64,

    /// Delay before the navigation gate reopens, in milliseconds
    #[arg(long, default_value_t = DEFAULT_SETTLE_DELAY_MS)]
    settle_ms: u64,

    /// PokeAPI base URL
    #[arg(long, default_value = api::API_BASE)]
    api_base: String,

    /// Skip the on-disk response cache
    #[arg(long)]
    no_cache: bool,

    /// Write logs to this file (the terminal is owned by the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Default log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(flatten)]
    debug: DebugCliArgs,
}

#[derive(tui_dispatch::ComponentId, Clone, Copy, PartialEq, Eq, Hash, Debug)]
enum DexComponentId {
    DexList,
    Search,
    Detail,
}

#[derive(tui_dispatch::BindingContext, Clone, Copy, PartialEq, Eq, Hash)]
enum DexContext {
    DexList,
    Search,
    Detail,
}

impl EventRoutingState<DexComponentId, DexContext> for AppState {
    fn focused(&self) -> Option<DexComponentId> {
        if self.search.active {
            return Some(DexComponentId::Search);
        }
        match self.screen {
            Screen::List => Some(DexComponentId::DexList),
            Screen::Detail => Some(DexComponentId::Detail),
        }
    }

    fn modal(&self) -> Option<DexComponentId> {
        if self.search.active {
            Some(DexComponentId::Search)
        } else {
            None
        }
    }

    fn binding_context(&self, id: DexComponentId) -> DexContext {
        match id {
            DexComponentId::DexList => DexContext::DexList,
            DexComponentId::Search => DexContext::Search,
            DexComponentId::Detail => DexContext::Detail,
        }
    }

    fn default_context(&self) -> DexContext {
        DexContext::DexList
    }
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref(), &args.log_level)?;

    let config = ListConfig {
        page_size: args.page_size as usize,
        settle_delay_ms: args.settle_ms,
    };
    let cache_root = (!args.no_cache).then(api::default_cache_root);
    let source = Arc::new(PokeApi::new(args.api_base, cache_root));
    tracing::info!(base = source.base(), page_size = config.page_size, "starting pokedex");

    let debug = DebugSession::new(args.debug);
    let state = debug
        .load_state_or_else_async(move || async move { Ok::<AppState, io::Error>(AppState::new(config)) })
        .await
        .map_err(debug_error)?;
    let replay_actions = debug.load_replay_items().map_err(debug_error)?;
    let (middleware, recorder) = debug.middleware_with_recorder();
    let store = EffectStoreWithMiddleware::new(state, reducer, middleware);

    let use_alt_screen = debug.use_alt_screen();
    let mut stdout = io::stdout();
    if use_alt_screen {
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &debug, store, replay_actions, source).await;

    if use_alt_screen {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
    }

    let run_output = result?;
    run_output.write_render_output()?;
    debug.save_actions(recorder.as_ref()).map_err(debug_error)?;
    tracing::info!("pokedex closed");
    Ok(())
}

fn init_logging(path: Option<&Path>, level: &str) -> io::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn debug_error(error: DebugSessionError) -> io::Error {
    io::Error::other(format!("debug session error: {error}"))
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    debug: &DebugSession,
    store: impl EffectStoreLike<AppState, Action, Effect>,
    replay_actions: Vec<ReplayItem<Action>>,
    source: Arc<PokeApi>,
) -> io::Result<DebugRunOutput<AppState>> {
    let ui = Rc::new(RefCell::new(ui::DexUi::new()));
    let mut bus: EventBus<AppState, Action, DexComponentId, DexContext> = EventBus::new();
    let keybindings: Keybindings<DexContext> = Keybindings::new();

    let ui_list = Rc::clone(&ui);
    bus.register(DexComponentId::DexList, move |event, state| {
        ui_list.borrow_mut().handle_list_event(&event.kind, state)
    });

    let ui_search = Rc::clone(&ui);
    bus.register(DexComponentId::Search, move |event, state| {
        ui_search
            .borrow_mut()
            .handle_search_event(&event.kind, state)
    });

    let ui_detail = Rc::clone(&ui);
    bus.register(DexComponentId::Detail, move |event, state| {
        ui_detail
            .borrow_mut()
            .handle_detail_event(&event.kind, state)
    });

    bus.register_global(|event, state| match event.kind {
        EventKind::Resize(width, height) => {
            HandlerResponse::action(Action::UiTerminalResize(width, height)).with_render()
        }
        EventKind::Key(key) => match key.code {
            crossterm::event::KeyCode::Char('q') if !state.search.active => {
                HandlerResponse::action(Action::Quit)
            }
            crossterm::event::KeyCode::Char('/')
                if !state.search.active && state.screen == Screen::List =>
            {
                HandlerResponse::action(Action::SearchStart)
            }
            _ => HandlerResponse::ignored(),
        },
        _ => HandlerResponse::ignored(),
    });

    debug
        .run_effect_app_with_bus(
            terminal,
            store,
            DebugLayer::simple(),
            replay_actions,
            Some(Action::Init),
            Some(Action::Quit),
            |runtime| {
                if debug.render_once() {
                    return;
                }
                runtime
                    .subscriptions()
                    .interval("tick", Duration::from_millis(120), || Action::Tick);
            },
            &mut bus,
            &keybindings,
            |frame, area, state, render_ctx, event_ctx| {
                ui.borrow_mut()
                    .render(frame, area, state, render_ctx, event_ctx);
            },
            |action| matches!(action, Action::Quit),
            move |effect, ctx| handle_effect(effect, ctx, &source),
        )
        .await
}

fn handle_effect(effect: Effect, ctx: &mut EffectContext<Action>, source: &Arc<PokeApi>) {
    match effect {
        Effect::FetchPage {
            request_id,
            limit,
            offset,
        } => {
            let source = Arc::clone(source);
            ctx.tasks().spawn(TaskKey::new("page"), async move {
                match source.fetch_page(limit, offset).await {
                    Ok(page) => Action::PageDidLoad { request_id, page },
                    Err(error) => {
                        tracing::warn!(request_id, %error, "page fetch failed");
                        Action::PageDidError {
                            request_id,
                            error: error.to_string(),
                        }
                    }
                }
            });
        }
        Effect::SortEntries { entries, order } => {
            ctx.tasks().spawn(TaskKey::new("sort"), async move {
                Action::SortDidComplete(sorted_entries(&entries, order))
            });
        }
        Effect::LoadDetail { name } => {
            let source = Arc::clone(source);
            let key = format!("detail_{name}");
            ctx.tasks().spawn(TaskKey::new(key), async move {
                match source.fetch_info(&name).await {
                    Ok(info) => Action::DetailDidLoad(info),
                    Err(error) => Action::DetailDidError {
                        name,
                        error: error.to_string(),
                    },
                }
            });
        }
        Effect::SettleNavigation { delay_ms } => {
            ctx.tasks().spawn(TaskKey::new("navigation_settle"), async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Action::NavigationDidSettle
            });
        }
    }
}
