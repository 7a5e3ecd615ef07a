use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use gloo_timers::callback::{Interval, Timeout};
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Document, Element, HtmlInputElement, HtmlTableSectionElement};

use crate::backoff::{
    classify_status, timer_delay_ms, RetryScheduler, RetryTarget, StatusClass, RETRY_AFTER_HEADER,
};
use crate::endpoints::{normalize_player_id, rank_url, top_url};
use crate::models::{LeaderboardEntry, LeaderboardResponse, LeaderboardSnapshot, RankLookupResponse};
use crate::sequence::ResponseSequencer;
use crate::view::{leaderboard_rows, DetailLevel, ResultMessage};

const DEFAULT_API_BASE: &str = "http://localhost:8080/api";
const DEFAULT_POLL_INTERVAL_MS: u32 = 5000;

enum Fetched<T> {
    Ready(T),
    RateLimited(u64),
    Failed(u16),
}

struct AppState {
    document: Document,
    table_body: Option<HtmlTableSectionElement>,
    player_input: Option<HtmlInputElement>,
    result_el: Option<Element>,
    lookup_button: Option<Element>,
    api_base: String,
    detail: DetailLevel,
    poll_interval_ms: u32,
    poll_timer: Option<Interval>,
    retry: RetryScheduler<Timeout>,
    sequencer: ResponseSequencer,
}

impl AppState {
    fn new(document: Document) -> Self {
        let table_body = document
            .get_element_by_id("leaderboard-body")
            .and_then(|el| el.dyn_into::<HtmlTableSectionElement>().ok());
        let player_input = document
            .get_element_by_id("player-id")
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok());
        let result_el = document.get_element_by_id("player-result");
        let lookup_button = document.get_element_by_id("lookup-button");
        let api_base = read_meta(&document, "leaderboard-api-base")
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let detail = read_meta(&document, "lookup-detail")
            .and_then(|value| value.parse::<DetailLevel>().ok())
            .unwrap_or_default();
        let poll_interval_ms = read_meta(&document, "poll-interval-ms")
            .and_then(|value| value.parse::<u32>().ok())
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);

        Self {
            document,
            table_body,
            player_input,
            result_el,
            lookup_button,
            api_base,
            detail,
            poll_interval_ms,
            poll_timer: None,
            retry: RetryScheduler::new(),
            sequencer: ResponseSequencer::new(),
        }
    }
}

fn read_meta(document: &Document, name: &str) -> Option<String> {
    let meta = document
        .query_selector(&format!("meta[name=\"{}\"]", name))
        .ok()
        .flatten()?;
    let value = meta.get_attribute("content")?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn read_initial_payload(document: &Document) -> Option<LeaderboardSnapshot> {
    let el = document.get_element_by_id("initial-data")?;
    let text = el.text_content().unwrap_or_default();
    if text.trim().is_empty() {
        return None;
    }
    let value = js_sys::JSON::parse(&text).ok()?;
    let payload: LeaderboardSnapshot = serde_wasm_bindgen::from_value(value).ok()?;
    el.remove();
    Some(payload)
}

fn log_error(message: &str) {
    web_sys::console::error_1(&JsValue::from_str(message));
}

fn js_error_message(err: JsValue, fallback: &str) -> String {
    if let Some(message) = err.as_string() {
        return message;
    }
    if let Ok(error) = err.dyn_into::<js_sys::Error>() {
        return error.message().into();
    }
    fallback.to_string()
}

fn render_table(state: &AppState, entries: &[LeaderboardEntry]) {
    let table_body = match &state.table_body {
        Some(body) => body,
        None => return,
    };

    table_body.set_inner_html("");
    let fragment = state.document.create_document_fragment();
    for row in leaderboard_rows(entries) {
        let tr = match state.document.create_element("tr") {
            Ok(tr) => tr,
            Err(_) => continue,
        };
        for value in row.cells() {
            if let Ok(td) = state.document.create_element("td") {
                td.set_text_content(Some(value));
                let _ = tr.append_child(&td);
            }
        }
        let _ = fragment.append_child(&tr);
    }
    let _ = table_body.append_child(&fragment);
}

fn show_player_result(state: &AppState, message: &ResultMessage) {
    if let Some(result_el) = &state.result_el {
        result_el.set_text_content(Some(&message.text));
        result_el.set_class_name(message.tone.class_name());
    }
}

async fn fetch_api<T: DeserializeOwned>(url: &str) -> Result<Fetched<T>, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("window unavailable"))?;
    let response = JsFuture::from(window.fetch_with_str(url)).await?;
    let response: web_sys::Response = response.dyn_into()?;
    let retry_after = response.headers().get(RETRY_AFTER_HEADER).ok().flatten();

    match classify_status(response.status(), retry_after.as_deref()) {
        StatusClass::Success => {
            let value = JsFuture::from(response.json()?).await?;
            let payload = serde_wasm_bindgen::from_value(value)
                .map_err(|err| JsValue::from_str(&err.to_string()))?;
            Ok(Fetched::Ready(payload))
        }
        StatusClass::RateLimited { retry_after_secs } => Ok(Fetched::RateLimited(retry_after_secs)),
        StatusClass::Failure { status } => Ok(Fetched::Failed(status)),
    }
}

fn fetch_leaderboard(state_rc: Rc<RefCell<AppState>>) {
    let request = {
        let mut state = state_rc.borrow_mut();
        match top_url(&state.api_base) {
            Ok(url) => Some((url.to_string(), state.sequencer.begin())),
            Err(err) => {
                log_error(&format!("Error fetching leaderboard: {}", err));
                None
            }
        }
    };
    let (url, seq) = match request {
        Some(request) => request,
        None => return,
    };

    spawn_local(async move {
        match fetch_api::<LeaderboardResponse>(&url).await {
            Ok(Fetched::Ready(data)) => {
                let mut state = state_rc.borrow_mut();
                if state.sequencer.accept(seq) {
                    render_table(&state, &data.leaderboard);
                }
            }
            Ok(Fetched::RateLimited(retry_after_secs)) => {
                handle_rate_limit(state_rc, retry_after_secs, RetryTarget::Leaderboard);
            }
            Ok(Fetched::Failed(status)) => {
                log_error(&format!(
                    "Error fetching leaderboard: Failed to fetch leaderboard (HTTP {})",
                    status
                ));
            }
            Err(err) => {
                let message = js_error_message(err, "Request failed");
                log_error(&format!("Error fetching leaderboard: {}", message));
            }
        }
    });
}

fn lookup_player(state_rc: Rc<RefCell<AppState>>) {
    let player_id = {
        let state = state_rc.borrow();
        let raw = state
            .player_input
            .as_ref()
            .map(|input| input.value())
            .unwrap_or_default();
        match normalize_player_id(&raw) {
            Some(player_id) => player_id,
            None => {
                show_player_result(&state, &ResultMessage::missing_player_id());
                return;
            }
        }
    };
    request_lookup(state_rc, player_id);
}

fn request_lookup(state_rc: Rc<RefCell<AppState>>, player_id: String) {
    let request = {
        let state = state_rc.borrow();
        match rank_url(&state.api_base, &player_id) {
            Ok(url) => Some((url.to_string(), state.detail)),
            Err(err) => {
                log_error(&format!("Error looking up player: {}", err));
                show_player_result(&state, &ResultMessage::lookup_failed());
                None
            }
        }
    };
    let (url, detail) = match request {
        Some(request) => request,
        None => return,
    };

    spawn_local(async move {
        let message = match fetch_api::<RankLookupResponse>(&url).await {
            Ok(Fetched::Ready(player)) => ResultMessage::lookup_found(&player, detail),
            Ok(Fetched::RateLimited(retry_after_secs)) => {
                handle_rate_limit(state_rc, retry_after_secs, RetryTarget::Lookup(player_id));
                return;
            }
            Ok(Fetched::Failed(_)) => ResultMessage::lookup_failed(),
            Err(err) => {
                log_error(&format!(
                    "Error looking up player: {}",
                    js_error_message(err, "Request failed")
                ));
                ResultMessage::lookup_failed()
            }
        };
        let state = state_rc.borrow();
        show_player_result(&state, &message);
    });
}

fn handle_rate_limit(state_rc: Rc<RefCell<AppState>>, retry_after_secs: u64, target: RetryTarget) {
    let delay = Duration::from_secs(retry_after_secs);
    let millis = timer_delay_ms(delay);
    web_sys::console::warn_1(&JsValue::from_str(&format!(
        "Rate limited; retrying {:?} in {}s",
        target, retry_after_secs
    )));

    let timer_state = state_rc.clone();
    let mut state = state_rc.borrow_mut();
    show_player_result(&state, &ResultMessage::rate_limited(retry_after_secs));
    state.retry.schedule_retry(delay, target, move |generation| {
        Timeout::new(millis, move || run_retry(timer_state, generation))
    });
}

fn run_retry(state_rc: Rc<RefCell<AppState>>, generation: u64) {
    let target = state_rc.borrow_mut().retry.fire(generation);
    match target {
        Some(RetryTarget::Leaderboard) => fetch_leaderboard(state_rc),
        Some(RetryTarget::Lookup(player_id)) => request_lookup(state_rc, player_id),
        None => {}
    }
}

fn start_polling(state_rc: Rc<RefCell<AppState>>) {
    fetch_leaderboard(state_rc.clone());

    let interval_ms = state_rc.borrow().poll_interval_ms;
    let poll_state = state_rc.clone();
    let poll_timer = Interval::new(interval_ms, move || {
        fetch_leaderboard(poll_state.clone());
    });
    state_rc.borrow_mut().poll_timer = Some(poll_timer);
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("window unavailable"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("document unavailable"))?;
    let initial_payload = read_initial_payload(&document);
    let state_rc = Rc::new(RefCell::new(AppState::new(document)));

    if let Some(snapshot) = initial_payload {
        let state = state_rc.borrow();
        render_table(&state, &snapshot.entries);
    }

    start_polling(state_rc.clone());

    {
        let state = state_rc.borrow();
        if let Some(button) = &state.lookup_button {
            let state_clone = state_rc.clone();
            let handler = Closure::wrap(Box::new(move |_event: web_sys::Event| {
                lookup_player(state_clone.clone());
            }) as Box<dyn FnMut(web_sys::Event)>);
            let _ = button.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref());
            handler.forget();
        }

        if let Some(input) = &state.player_input {
            let state_clone = state_rc.clone();
            let handler = Closure::wrap(Box::new(move |event: web_sys::Event| {
                let key_event = match event.dyn_into::<web_sys::KeyboardEvent>() {
                    Ok(event) => event,
                    Err(_) => return,
                };
                if key_event.key() != "Enter" {
                    return;
                }
                key_event.prevent_default();
                lookup_player(state_clone.clone());
            }) as Box<dyn FnMut(web_sys::Event)>);
            let _ = input.add_event_listener_with_callback("keydown", handler.as_ref().unchecked_ref());
            handler.forget();
        }
    }

    Ok(())
}
