//! The editor page.
//!
//! Renders one `<select>` per slot with the current value pre-selected. The
//! inline script keeps the page in sync over `/ws`.

use axum::{extract::State, response::Html};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::sync::Arc;
use std::time::Duration;

use crate::server::state::AppState;
use crate::store::{Label, SlotIndex, StateSnapshot};

const STYLE: &str = r#"
body {
  background-color: black;
}

label {
  display: inline-block;
  width: 20px;
  text-align: right;
  color: aqua;
  margin-right: 5px;
}

select {
  display: inline-block;
  vertical-align: middle;
  font-weight: bold;
}
"#;

const SCRIPT: &str = r#"
const scheme = window.location.protocol === "https:" ? "wss://" : "ws://";
const socket = new WebSocket(scheme + window.location.host + "/ws");

function applySlot(index, value) {
  const element = document.getElementById("slot" + index);
  if (element) {
    element.value = value;
  } else {
    console.warn("No element for slot", index);
  }
}

socket.onmessage = function (event) {
  const data = JSON.parse(event.data);
  if (data === null || typeof data !== "object" || Array.isArray(data)) {
    return;
  }
  // Updates carry exactly index and value; anything else is a snapshot.
  if ("index" in data && "value" in data) {
    applySlot(data.index, data.value);
    return;
  }
  for (const key in data) {
    applySlot(key, data[key]);
  }
};

function updateSlot(index) {
  const value = document.getElementById("slot" + index).value;
  socket.send(JSON.stringify({ index: index, value: value }));
}
"#;

/// GET / - The editor page.
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let snapshot = state.engine.store().snapshot();
    let page = render_page(
        state.config.slot_count,
        &state.config.labels,
        &snapshot,
        state.config.page_reload,
    );
    Html(page.into_string())
}

/// Renders the page for the given slots, labels and current state.
pub fn render_page(
    slot_count: SlotIndex,
    labels: &[Label],
    snapshot: &StateSnapshot,
    reload: Option<Duration>,
) -> Markup {
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { "Slot Editor" }
                style { (PreEscaped(STYLE)) }
                script {
                    (PreEscaped(SCRIPT))
                    @if let Some(every) = reload {
                        (PreEscaped(format!(
                            "setInterval(function () {{ location.reload(); }}, {});",
                            every.as_millis()
                        )))
                    }
                }
            }
            body {
                @for index in 1..=slot_count {
                    @let id = format!("slot{index}");
                    @let current = snapshot.get(index);
                    label for=(id) { (index) }
                    select id=(id) onchange=(format!("updateSlot({index})")) {
                        @for choice in labels {
                            option
                                value=(choice.value)
                                selected[current == Some(choice.value.as_str())]
                            { (choice.text) }
                        }
                    }
                    br;
                }
            }
        }
    }
}
