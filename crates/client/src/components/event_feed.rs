//! Live list of incoming realtime events with relative timestamps.

use chrono::Utc;
use dioxus::prelude::*;

use crate::format::relative_time;
use crate::realtime::use_realtime_events;

const DEFAULT_LIMIT: usize = 50;

#[derive(Props, Clone, PartialEq)]
pub struct EventFeedProps {
    #[props(optional)]
    pub limit: Option<usize>,
}

#[component]
pub fn EventFeed(props: EventFeedProps) -> Element {
    let events = use_realtime_events(props.limit.unwrap_or(DEFAULT_LIMIT));
    let now = Utc::now();

    // Newest first
    let rows: Vec<(String, String, String)> = events
        .read()
        .iter()
        .rev()
        .map(|e| (e.id.clone(), e.event.clone(), relative_time(e.ts, now)))
        .collect();

    rsx! {
        ul { class: "flex flex-col gap-1 text-sm",
            if rows.is_empty() {
                li { class: "text-gray-500 italic", "No activity yet" }
            }
            for (id, event, ago) in rows {
                li { key: "{id}", class: "flex justify-between gap-4",
                    span { class: "font-mono text-gray-200", "{event}" }
                    span { class: "text-gray-500", "{ago}" }
                }
            }
        }
    }
}
