//! Three-page demo application: a counter, an about page and a contact form.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, error, info};
use trellis_ui::types::WidgetId;
use trellis_ui::widgets::{button, label, nav_link, text_box};
use trellis_ui::{HandlerResult, NavigationError, SharedUi, Ui, sync_handler};

pub const HOME: &str = "home";
pub const ABOUT: &str = "about";
pub const CONTACT: &str = "contact";

/// The demo with its clock label ticking once a second.
pub fn demo_ui() -> SharedUi {
    demo_ui_with_clock(Some(Duration::from_secs(1)))
}

/// The demo with an optional background counter. `None` leaves the clock
/// label static, so every op can be traced back to a client event.
pub fn demo_ui_with_clock(period: Option<Duration>) -> SharedUi {
    let mut ui = Ui::new();
    let clock = match build(&mut ui) {
        Ok(clock) => clock,
        Err(err) => {
            // the layout is static, so this only trips on a programming error
            error!(error = %err, "demo layout rejected");
            return ui.into_shared();
        }
    };
    let ui = ui.into_shared();
    if let Some(period) = period {
        spawn_clock(Arc::downgrade(&ui), clock, period);
    }
    ui
}

fn build(ui: &mut Ui) -> Result<WidgetId, NavigationError> {
    let home = ui.register_page(HOME, "HomePage", "Trellis - Home")?;
    let about = ui.register_page(ABOUT, "AboutPage", "Trellis - About")?;
    let contact = ui.register_page(CONTACT, "ContactPage", "Trellis - Contact")?;
    ui.set_default_page(HOME)?;

    let clock = build_home(ui, &home)?;
    build_about(ui, &about)?;
    build_contact(ui, &contact)?;
    Ok(clock)
}

fn build_home(ui: &mut Ui, page: &WidgetId) -> Result<WidgetId, NavigationError> {
    ui.attach(page, label("Welcome to the Trellis multi-page app!").with("text_size", "large"))?;
    ui.attach(page, label("Every widget here lives on the server."))?;
    ui.attach(page, label("Go to:"))?;
    ui.attach(page, nav_link("About", ABOUT))?;
    ui.attach(page, nav_link("Contact", CONTACT))?;

    let count = ui.attach(page, label("Count: 0"))?;
    let increment = ui.attach(page, button("Increment"))?;
    let clicks = Arc::new(Mutex::new(0u64));
    ui.on_click(
        &increment,
        sync_handler(move |ui, _ctx| {
            let mut clicks = clicks.lock();
            *clicks += 1;
            ui.set_property(&count, "text", format!("Count: {}", *clicks))?;
            Ok(())
        }),
    );

    Ok(ui.attach(page, label("Seconds connected: 0"))?)
}

fn build_about(ui: &mut Ui, page: &WidgetId) -> Result<(), NavigationError> {
    ui.attach(page, label("About Trellis").with("text_size", "large"))?;
    ui.attach(page, label("Trellis keeps the widget tree on the server and ships diffs to the browser."))?;
    ui.attach(page, label("Highlights:"))?;
    for line in [
        "- Event-driven handlers",
        "- Reusable widgets",
        "- Multiple pages with history",
    ] {
        ui.attach(page, label(line))?;
    }
    ui.attach(page, label(""))?;
    ui.attach(page, nav_link("Back to Home", HOME))?;
    ui.attach(page, nav_link("Go to Contact", CONTACT))?;
    Ok(())
}

fn build_contact(ui: &mut Ui, page: &WidgetId) -> Result<(), NavigationError> {
    ui.attach(page, label("Get in touch").with("text_size", "large"))?;
    ui.attach(page, label("Fill in the form below:"))?;

    ui.attach(page, label("Name:"))?;
    let name = ui.attach(page, text_box("", "Your name"))?;
    ui.attach(page, label("Email:"))?;
    let email = ui.attach(page, text_box("", "you@example.com"))?;
    ui.attach(page, label("Message:"))?;
    let message = ui.attach(page, text_box("", "Your message"))?;

    let send = ui.attach(page, button("Send"))?;
    let result = ui.attach(page, label(""))?;
    {
        let result = result.clone();
        ui.on_click(
            &send,
            sync_handler(move |ui, _ctx| submit(ui, [&name, &email, &message], &result)),
        );
    }
    // a fresh visit starts without the previous outcome
    ui.on_navigated_to(
        page,
        sync_handler(move |ui, _ctx| {
            ui.set_property(&result, "text", "")?;
            Ok(())
        }),
    );

    ui.attach(page, label(""))?;
    ui.attach(page, nav_link("Back to Home", HOME))?;
    ui.attach(page, nav_link("Go to About", ABOUT))?;
    Ok(())
}

fn submit(ui: &mut Ui, fields: [&WidgetId; 3], result: &WidgetId) -> HandlerResult {
    let values: Vec<String> = fields
        .iter()
        .map(|id| ui.str_property(id, "value").unwrap_or_default().to_string())
        .collect();
    if values.iter().any(|value| value.trim().is_empty()) {
        ui.set_property(result, "text", "Please fill in every field!")?;
        return Ok(());
    }

    info!(from = %values[1], "contact form submitted");
    ui.set_property(
        result,
        "text",
        format!("Thanks, {}! We will reply to {}.", values[0], values[1]),
    )?;
    for id in fields {
        ui.set_property(id, "value", "")?;
    }
    Ok(())
}

/// Bump the clock label every `period` until the session's tree is dropped.
fn spawn_clock(ui: Weak<Mutex<Ui>>, clock: WidgetId, period: Duration) {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        debug!("no runtime, demo clock disabled");
        return;
    };
    runtime.spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        let mut seconds = 0u64;
        loop {
            ticker.tick().await;
            let Some(shared) = ui.upgrade() else {
                break;
            };
            seconds += 1;
            let text = format!("Seconds connected: {seconds}");
            if shared.lock().set_property(&clock, "text", text).is_err() {
                break;
            }
        }
        debug!("demo clock stopped");
    });
}
