use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Once;
use tracing::{Level, info, warn};
use trellis_client::Client;
use trellis_client::render::page_param;
use trellis_client::types::ClientEvent;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{MessageEvent, WebSocket};

pub mod channel;
pub mod dom;

pub use channel::WebSocketChannel;
pub use dom::{EventSink, WebDom};

type WebClient = Client<WebDom, WebSocketChannel>;
type SharedClient = Rc<RefCell<WebClient>>;

#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    init_logging(Level::INFO);
}

/// Send `tracing` output to the browser console. Only the first call
/// installs the subscriber.
pub fn init_logging(level: Level) {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        tracing_wasm::set_as_global_default_with_config(
            tracing_wasm::WASMLayerConfigBuilder::new()
                .set_max_level(level)
                .build(),
        );
    });
}

/// Mount a server-driven UI into the element with id `mount_id` and
/// connect to the server that served the page.
#[wasm_bindgen]
pub fn start(mount_id: &str) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;
    let mount = document
        .get_element_by_id(mount_id)
        .ok_or("mount element not found")?;

    let client: SharedClient = Rc::new_cyclic(|weak: &Weak<RefCell<WebClient>>| {
        let weak = weak.clone();
        let sink: EventSink = Rc::new(move |event: ClientEvent| {
            let Some(client) = weak.upgrade() else {
                return;
            };
            // dropped and logged by the client when the socket is down
            let _ = client.borrow_mut().dispatch(event);
        });
        RefCell::new(Client::new(
            WebDom::new(document, mount, sink),
            WebSocketChannel::disconnected(),
        ))
    });

    listen_popstate(&client)?;
    connect(&client, &socket_url()?)
}

/// `ws:`/`wss:` URL of the `/ws` endpoint on the page's own host.
fn socket_url() -> Result<String, JsValue> {
    let location = web_sys::window().ok_or("no window")?.location();
    let scheme = if location.protocol()? == "https:" {
        "wss:"
    } else {
        "ws:"
    };
    Ok(format!("{scheme}//{}/ws", location.host()?))
}

fn connect(client: &SharedClient, url: &str) -> Result<(), JsValue> {
    let socket = WebSocket::new(url)?;
    info!(url, "connecting");

    let on_open = {
        let client = client.clone();
        Closure::<dyn FnMut()>::new(move || {
            if let Err(err) = client.borrow_mut().on_open() {
                warn!(error = %err, "resync request failed");
            }
        })
    };
    socket.set_onopen(Some(on_open.as_ref().unchecked_ref()));
    on_open.forget();

    let on_message = {
        let client = client.clone();
        Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            match event.data().dyn_into::<js_sys::JsString>() {
                Ok(text) => client.borrow_mut().on_message(&String::from(text)),
                Err(_) => warn!("non-text frame ignored"),
            }
        })
    };
    socket.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
    on_message.forget();

    let on_close = {
        let client = client.clone();
        let url = url.to_string();
        Closure::<dyn FnMut()>::new(move || {
            let delay = client.borrow_mut().on_close();
            schedule_reconnect(&client, &url, delay.as_millis() as i32);
        })
    };
    socket.set_onclose(Some(on_close.as_ref().unchecked_ref()));
    on_close.forget();

    client
        .borrow_mut()
        .replace_channel(WebSocketChannel::new(socket));
    Ok(())
}

fn schedule_reconnect(client: &SharedClient, url: &str, delay_ms: i32) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let client = client.clone();
    let url = url.to_string();
    let retry = Closure::once(move || {
        if let Err(err) = connect(&client, &url) {
            warn!(error = ?err, "reconnect failed");
            schedule_reconnect(&client, &url, delay_ms);
        }
    });
    if let Err(err) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
        retry.as_ref().unchecked_ref(),
        delay_ms,
    ) {
        warn!(error = ?err, "could not schedule reconnect");
    }
    retry.forget();
}

/// Back/forward: tell the server which page the address bar now names.
fn listen_popstate(client: &SharedClient) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    let client = client.clone();
    let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| {
        let Some(path) = current_page_param() else {
            return;
        };
        if let Err(err) = client.borrow_mut().location_changed(&path) {
            warn!(error = %err, path, "navigation not sent");
        }
    });
    window.add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref())?;
    closure.forget();
    Ok(())
}

fn current_page_param() -> Option<String> {
    let search = web_sys::window()?.location().search().ok()?;
    page_param(&search)
}
