//! Iter Bene desktop shell.
//!
//! Mounts the realtime provider at the root so every view below shares one
//! connection, and shows its status and recent activity.

#![allow(non_snake_case)]

use dioxus::prelude::*;
use iterbene_client::components::{ConnectionBadge, EventFeed};
use iterbene_client::{logging, AppConfig, RealtimeProvider};

fn main() {
    logging::init();
    dioxus::launch(App);
}

#[component]
fn App() -> Element {
    let config = use_hook(AppConfig::from_env);

    rsx! {
        RealtimeProvider {
            endpoint: config.socket_url.clone(),
            options: config.realtime.clone(),
            header { class: "flex items-center justify-between p-4 border-b border-gray-700",
                h1 { class: "text-lg font-semibold", "Iter Bene" }
                ConnectionBadge {}
            }
            main { class: "p-4", EventFeed {} }
        }
    }
}
