//! Browser binding: DOM display, `<canvas>` surface, `setInterval` pump and
//! `localStorage`, wired into a `#[wasm_bindgen]` widget.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;
use std::time::Duration;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Document, Element, Event, HtmlCanvasElement, HtmlElement,
    HtmlInputElement, Storage, Window,
};

use crate::clock::{SystemClock, TickHandle, TickScheduler};
use crate::config::{CanvasConfig, WidgetConfig};
use crate::controller::TimerController;
use crate::error::{Error, Result};
use crate::pomodoro::Mode;
use crate::storage::PersistentStore;
use crate::todo::TodoList;
use crate::ui::{DisplaySink, DrawSurface};

const ACTIVE: &str = "active";
const DONE: &str = "text-decoration-line-through";

type WebController = TimerController<SystemClock, IntervalPump, DomDisplay, CanvasSurface>;
type Handler = Closure<dyn FnMut(Event)>;

/// Event handler registered on a page element, detached on drop.
struct Listener {
    target: Element,
    kind: &'static str,
    handler: Handler,
}

impl Drop for Listener {
    fn drop(&mut self) {
        let detached = self
            .target
            .remove_event_listener_with_callback(self.kind, self.handler.as_ref().unchecked_ref());
        if let Err(e) = detached {
            log::warn!("could not detach {} listener: {:?}", self.kind, e);
        }
    }
}

impl From<Error> for JsValue {
    fn from(e: Error) -> Self {
        JsValue::from_str(&e.to_string())
    }
}

fn js_error(kind: fn(String) -> Error, context: &str) -> impl Fn(JsValue) -> Error + '_ {
    move |value| kind(format!("{}: {:?}", context, value))
}

struct ConsoleLogger;

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            log::Level::Error => web_sys::console::error_1(&line),
            log::Level::Warn => web_sys::console::warn_1(&line),
            log::Level::Info => web_sys::console::info_1(&line),
            log::Level::Debug | log::Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

static LOGGER: ConsoleLogger = ConsoleLogger;

fn init_logging() {
    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Info);
        }
    });
}

/// `window.localStorage`.
#[derive(Clone)]
pub struct LocalStore {
    storage: Storage,
}

impl LocalStore {
    pub fn open(window: &Window) -> Result<Self> {
        let storage = window
            .local_storage()
            .map_err(js_error(Error::Storage, "localStorage"))?
            .ok_or_else(|| Error::Storage("localStorage unavailable".to_string()))?;
        Ok(Self { storage })
    }
}

impl PersistentStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.storage
            .get_item(key)
            .map_err(js_error(Error::Storage, key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.storage
            .set_item(key, value)
            .map_err(js_error(Error::Storage, key))
    }
}

type TickSlot = Rc<RefCell<Option<Box<dyn FnMut()>>>>;

/// Recurring tick on `window.setInterval`.
///
/// One callback lives for the pump's lifetime so an interval can be cleared
/// and re-armed from inside its own tick.
pub struct IntervalPump {
    window: Window,
    slot: TickSlot,
    callback: Closure<dyn FnMut()>,
}

impl IntervalPump {
    fn new(window: Window) -> Self {
        let slot: TickSlot = Rc::new(RefCell::new(None));
        let target = Rc::clone(&slot);
        let callback = Closure::<dyn FnMut()>::new(move || {
            if let Ok(mut on_tick) = target.try_borrow_mut() {
                if let Some(on_tick) = on_tick.as_mut() {
                    on_tick();
                }
            }
        });
        Self {
            window,
            slot,
            callback,
        }
    }

    fn tick_slot(&self) -> TickSlot {
        Rc::clone(&self.slot)
    }
}

impl TickScheduler for IntervalPump {
    fn schedule(&mut self, period: Duration) -> Result<TickHandle> {
        self.window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                self.callback.as_ref().unchecked_ref(),
                period.as_millis() as i32,
            )
            .map(TickHandle)
            .map_err(js_error(Error::Scheduler, "setInterval"))
    }

    fn cancel(&mut self, handle: TickHandle) {
        self.window.clear_interval_with_handle(handle.0);
    }
}

/// Clock digits, start/stop button and mode selectors.
pub struct DomDisplay {
    minutes: Element,
    seconds: Element,
    main_button: Element,
    mode_buttons: Vec<Element>,
    body: Option<HtmlElement>,
}

impl DomDisplay {
    fn bind(document: &Document) -> Result<Self> {
        let nodes = document
            .query_selector_all("button[data-mode]")
            .map_err(js_error(Error::Surface, "mode buttons"))?;
        let mode_buttons = (0..nodes.length())
            .filter_map(|i| nodes.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect();
        Ok(Self {
            minutes: element(document, "js-minutes")?,
            seconds: element(document, "js-seconds")?,
            main_button: element(document, "js-btn")?,
            mode_buttons,
            body: document.body(),
        })
    }
}

impl DisplaySink for DomDisplay {
    fn show_time(&mut self, minutes: &str, seconds: &str) {
        self.minutes.set_text_content(Some(minutes));
        self.seconds.set_text_content(Some(seconds));
    }

    fn show_mode(&mut self, mode: Mode) {
        for button in &self.mode_buttons {
            let is_mode = button.get_attribute("data-mode").as_deref() == Some(mode.as_str());
            if let Err(e) = button.class_list().toggle_with_force(ACTIVE, is_mode) {
                log::warn!("mode button class: {:?}", e);
            }
        }
        if let Some(body) = &self.body {
            let color = format!("var(--{})", mode.as_str());
            if let Err(e) = body.style().set_property("background-color", &color) {
                log::warn!("background color: {:?}", e);
            }
        }
    }

    fn show_running(&mut self, running: bool) {
        let action = if running { "stop" } else { "start" };
        if let Err(e) = self.main_button.set_attribute("data-action", action) {
            log::warn!("main button action: {:?}", e);
        }
        self.main_button.set_text_content(Some(action));
        if let Err(e) = self.main_button.class_list().toggle_with_force(ACTIVE, running) {
            log::warn!("main button class: {:?}", e);
        }
    }
}

/// 2D context of the dial `<canvas>`.
pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
    width: f64,
    height: f64,
}

impl CanvasSurface {
    fn bind(document: &Document, size: CanvasConfig) -> Result<Self> {
        let canvas = element(document, "timerFace")?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| Error::Surface("#timerFace is not a canvas".to_string()))?;
        canvas.set_width(size.width);
        canvas.set_height(size.height);
        let ctx = canvas
            .get_context("2d")
            .map_err(js_error(Error::Surface, "getContext"))?
            .ok_or_else(|| Error::Surface("2d context unavailable".to_string()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| Error::Surface("unexpected context type".to_string()))?;
        Ok(Self {
            ctx,
            width: f64::from(size.width),
            height: f64::from(size.height),
        })
    }
}

impl DrawSurface for CanvasSurface {
    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        self.ctx.clear_rect(0.0, 0.0, self.width, self.height);
    }

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn begin_path(&mut self) {
        self.ctx.begin_path();
    }

    fn translate(&mut self, x: f64, y: f64) -> Result<()> {
        self.ctx
            .translate(x, y)
            .map_err(js_error(Error::Surface, "translate"))
    }

    fn rotate(&mut self, angle: f64) -> Result<()> {
        self.ctx
            .rotate(angle)
            .map_err(js_error(Error::Surface, "rotate"))
    }

    fn arc(
        &mut self,
        x: f64,
        y: f64,
        radius: f64,
        start: f64,
        end: f64,
        anticlockwise: bool,
    ) -> Result<()> {
        self.ctx
            .arc_with_anticlockwise(x, y, radius, start, end, anticlockwise)
            .map_err(js_error(Error::Surface, "arc"))
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ctx.line_to(x, y);
    }

    fn set_fill(&mut self, color: &str) {
        self.ctx.set_fill_style_str(color);
    }

    fn fill(&mut self) {
        self.ctx.fill();
    }
}

fn element(document: &Document, id: &str) -> Result<Element> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| Error::Surface(format!("missing #{}", id)))
}

fn event_element(event: &Event) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()
}

/// Index of the to-do row an event landed on.
fn todo_index(target: &Element) -> Option<usize> {
    target
        .closest("li[data-index]")
        .ok()??
        .get_attribute("data-index")?
        .parse()
        .ok()
}

fn render_todos(document: &Document, ul: &Element, todos: &TodoList<LocalStore>) -> Result<()> {
    let dom = js_error(Error::Surface, "todo list");
    ul.set_inner_html("");
    for (index, item) in todos.items().iter().enumerate() {
        let li = document.create_element("li").map_err(&dom)?;
        li.class_list().add_1("list-group-item").map_err(&dom)?;
        if item.completed {
            li.class_list().add_1(DONE).map_err(&dom)?;
        }
        li.set_attribute("data-index", &index.to_string())
            .map_err(&dom)?;

        let delete = document.create_element("button").map_err(&dom)?;
        delete.class_list().add_2("btn-danger", "mr-2").map_err(&dom)?;
        delete.set_inner_html(r#"<i class="bi bi-trash"></i>"#);
        li.append_child(&delete).map_err(&dom)?;

        let text = document.create_element("span").map_err(&dom)?;
        text.set_text_content(Some(&item.text));
        li.append_child(&text).map_err(&dom)?;

        ul.append_child(&li).map_err(&dom)?;
    }
    Ok(())
}

fn listen(
    target: &Element,
    kind: &'static str,
    handler: impl FnMut(Event) + 'static,
) -> Result<Listener> {
    let handler = Handler::new(handler);
    target
        .add_event_listener_with_callback(kind, handler.as_ref().unchecked_ref())
        .map_err(js_error(Error::Surface, kind))?;
    Ok(Listener {
        target: target.clone(),
        kind,
        handler,
    })
}

fn log_failure(result: Result<()>) {
    if let Err(e) = result {
        log::error!("{}", e);
    }
}

/// The timer dial and to-do list bound to the page.
#[wasm_bindgen]
pub struct PomodoroWidget {
    controller: Rc<RefCell<WebController>>,
    todos: Rc<RefCell<TodoList<LocalStore>>>,
    settings: LocalStore,
    listeners: Vec<Listener>,
}

#[wasm_bindgen]
impl PomodoroWidget {
    /// Bind to the page's markup, load saved settings and to-dos, and show
    /// an idle pomodoro.
    #[wasm_bindgen(constructor)]
    pub fn new() -> std::result::Result<PomodoroWidget, JsValue> {
        init_logging();
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let store = LocalStore::open(&window)?;
        let config = WidgetConfig::load(&store)?;

        let pump = IntervalPump::new(window.clone());
        let tick_slot = pump.tick_slot();
        let surface = CanvasSurface::bind(&document, config.canvas)?;
        let display = DomDisplay::bind(&document)?;
        let controller = Rc::new(RefCell::new(TimerController::new(
            config,
            SystemClock,
            pump,
            display,
            surface,
        )?));

        let weak = Rc::downgrade(&controller);
        *tick_slot.borrow_mut() = Some(Box::new(move || {
            let Some(controller) = weak.upgrade() else {
                return;
            };
            let Ok(mut controller) = controller.try_borrow_mut() else {
                log::warn!("tick skipped, controller busy");
                return;
            };
            if let Err(e) = controller.tick() {
                log::error!("tick failed: {}", e);
            }
        }));

        let settings = store.clone();
        let todos = Rc::new(RefCell::new(TodoList::load(store)?));
        let mut listeners = Vec::new();

        let main_button = element(&document, "js-btn")?;
        let ctl = Rc::clone(&controller);
        listeners.push(listen(&main_button, "click", move |_| {
            log_failure(ctl.borrow_mut().toggle());
        })?);

        let mode_buttons = element(&document, "js-mode-buttons")?;
        let ctl = Rc::clone(&controller);
        listeners.push(listen(&mode_buttons, "click", move |event| {
            let Some(mode) = event_element(&event).and_then(|t| t.get_attribute("data-mode"))
            else {
                return;
            };
            log_failure(ctl.borrow_mut().select_mode(&mode));
        })?);

        let ul = element(&document, "ul")?;
        render_todos(&document, &ul, &todos.borrow())?;

        let form = element(&document, "form")?;
        let input = element(&document, "input")?
            .dyn_into::<HtmlInputElement>()
            .map_err(|_| JsValue::from_str("#input is not an input"))?;
        let (list, doc, list_ul) = (Rc::clone(&todos), document.clone(), ul.clone());
        listeners.push(listen(&form, "submit", move |event| {
            event.prevent_default();
            let text = input.value();
            let mut list = list.borrow_mut();
            let added = list.add(&text).and_then(|added| {
                if added {
                    input.set_value("");
                    render_todos(&doc, &list_ul, &list)?;
                }
                Ok(())
            });
            log_failure(added);
        })?);

        let (list, doc, list_ul) = (Rc::clone(&todos), document.clone(), ul.clone());
        listeners.push(listen(&ul, "click", move |event| {
            let Some(target) = event_element(&event) else {
                return;
            };
            let Some(index) = todo_index(&target) else {
                return;
            };
            let on_delete = matches!(target.closest("button"), Ok(Some(_)));
            let mut list = list.borrow_mut();
            let changed = if on_delete {
                list.remove(index).map(|_| ())
            } else {
                list.toggle(index).map(|_| ())
            };
            log_failure(changed.and_then(|()| render_todos(&doc, &list_ul, &list)));
        })?);

        let (list, doc, list_ul) = (Rc::clone(&todos), document.clone(), ul.clone());
        listeners.push(listen(&ul, "contextmenu", move |event| {
            let Some(index) = event_element(&event).and_then(|t| todo_index(&t)) else {
                return;
            };
            event.prevent_default();
            let mut list = list.borrow_mut();
            let removed = list.remove(index).map(|_| ());
            log_failure(removed.and_then(|()| render_todos(&doc, &list_ul, &list)));
        })?);

        log::info!("pomodoro widget ready");
        Ok(Self {
            controller,
            todos,
            settings,
            listeners,
        })
    }

    pub fn start(&self) -> std::result::Result<(), JsValue> {
        Ok(self.controller.borrow_mut().start()?)
    }

    pub fn stop(&self) {
        self.controller.borrow_mut().stop();
    }

    #[wasm_bindgen(js_name = selectMode)]
    pub fn select_mode(&self, mode: &str) -> std::result::Result<(), JsValue> {
        Ok(self.controller.borrow_mut().select_mode(mode)?)
    }

    #[wasm_bindgen(js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.controller.borrow().is_running()
    }

    #[wasm_bindgen(js_name = sessionCount)]
    pub fn session_count(&self) -> u32 {
        self.controller.borrow().state().session_count
    }

    /// Apply settings JSON (same shape as `pomodoro_settings`) and save it.
    /// The countdown stops and the current mode restarts at its new length.
    pub fn configure(&mut self, json: &str) -> std::result::Result<(), JsValue> {
        let config = WidgetConfig::from_json(json)?;
        self.controller.borrow_mut().reconfigure(config.clone())?;
        config.save(&mut self.settings)?;
        log::info!("settings saved");
        Ok(())
    }

    #[wasm_bindgen(js_name = settingsJson)]
    pub fn settings_json(&self) -> std::result::Result<String, JsValue> {
        let controller = self.controller.borrow();
        Ok(serde_json::to_string(controller.config()).map_err(Error::from)?)
    }

    /// Current to-do list as the JSON stored under `todos`.
    #[wasm_bindgen(js_name = todosJson)]
    pub fn todos_json(&self) -> std::result::Result<String, JsValue> {
        let todos = self.todos.borrow();
        serde_json::to_string(todos.items()).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl Drop for PomodoroWidget {
    fn drop(&mut self) {
        self.listeners.clear();
        if let Ok(mut controller) = self.controller.try_borrow_mut() {
            controller.stop();
        }
    }
}
