//! Connection badge - a colored dot and label for the realtime connection.

use dioxus::prelude::*;

use crate::realtime::{use_connection_state, ConnectionState};

#[derive(Props, Clone, PartialEq)]
pub struct ConnectionBadgeProps {
    #[props(optional)]
    pub size: Option<&'static str>,
}

#[component]
pub fn ConnectionBadge(props: ConnectionBadgeProps) -> Element {
    let state = use_connection_state();
    let size = props.size.unwrap_or("w-2.5 h-2.5");

    let color_class = match state {
        ConnectionState::Connected => "bg-green-500",
        ConnectionState::Connecting | ConnectionState::Reconnecting { .. } => {
            "bg-yellow-500 animate-pulse"
        }
        ConnectionState::Disconnected => "bg-gray-500",
        ConnectionState::ReconnectExhausted => "bg-red-500",
    };

    let title = state.to_string();
    let label = state.label();

    rsx! {
        span { class: "inline-flex items-center gap-2 text-xs text-gray-300", title: "{title}",
            span { class: "{size} {color_class} rounded-full inline-block" }
            "{label}"
        }
    }
}
