use std::sync::Arc;

use axum::extract::State;
use chrono::Utc;
use maud::{Markup, html};
use tracker::{Entity, Frame, Tracker, civil};

use crate::charts::svg::format_count;
use crate::state::AppState;
use crate::styles::Counts as CountsClass;

use super::page_shell;

pub async fn index(State(state): State<Arc<AppState>>) -> Markup {
    let trigger = format!("every {}ms", state.counts_poll.as_millis());
    let content = html! {
        h1 { "> japan vaccination tracker" }
        div #counts
            hx-get="/fragments/counts"
            hx-trigger=(trigger)
            hx-swap="innerHTML"
        {
            (render_counts(&state.tracker, state.latest_frame().as_deref()))
        }
    };
    page_shell("Japan Vaccination Tracker", content)
}

pub async fn fragment_counts(State(state): State<Arc<AppState>>) -> Markup {
    render_counts(&state.tracker, state.latest_frame().as_deref())
}

pub fn render_counts(tracker: &Tracker, frame: Option<&Frame>) -> Markup {
    let clock = civil::to_tokyo(frame.map_or_else(Utc::now, |f| f.at))
        .format("%Y年%-m月%-d日 %H:%M:%S")
        .to_string();

    let Some(frame) = frame else {
        return html! {
            div.(CountsClass::CLOCK) { (clock) }
            p.(CountsClass::WAITING) { "Waiting for vaccination data..." }
        };
    };

    html! {
        div.(CountsClass::CLOCK) { (clock) }
        @if let Some(total) = frame.total() {
            div.(CountsClass::TOTAL_LABEL) { "national total, 1st dose" }
            div.(CountsClass::TOTAL_COUNT) { (format_count(total.value[0])) }
            div.(CountsClass::TOTAL_LABEL) { "2nd dose: " (format_count(total.value[1])) }
        }
        table.(CountsClass::COUNT_TABLE) {
            @for event in frame.events.iter().filter(|e| e.entity != Entity::Total) {
                @let id = event.entity.to_string();
                @let name = tracker.catalog().get(&id).map_or(id.as_str(), |p| p.name.as_str());
                tr.(if event.flash > 0 { CountsClass::FLASH } else { "" }) {
                    td { a href=(format!("/prefecture/{id}")) { (name) } }
                    td.(CountsClass::COUNT_CELL) { (format_count(event.value[0])) }
                    td.(CountsClass::COUNT_CELL) { (format_count(event.value[1])) }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use tracker::{Catalog, Dose, FrameGate, Prefecture, Ticker, VaccinationRecord};

    use super::*;

    fn tracker() -> Arc<Tracker> {
        let catalog = Catalog::new([Prefecture {
            id: "13".to_owned(),
            name: "東京都".to_owned(),
            population: Some(14_047_594),
            lat: 35.69,
            lng: 139.69,
            leader_angle: 120.0,
            leader_length: 80.0,
        }])
        .unwrap();
        Arc::new(Tracker::new(catalog, 7))
    }

    #[tokio::test]
    async fn index_polls_at_configured_period() {
        let (_tx, rx) = tokio::sync::watch::channel(None);
        let state = Arc::new(AppState::new(
            tracker(),
            rx,
            std::time::Duration::from_millis(581),
        ));
        let markup = index(State(state)).await.into_string();
        assert!(markup.contains(r#"hx-trigger="every 581ms""#));
    }

    #[test]
    fn renders_waiting_message_without_frame() {
        let markup = render_counts(&tracker(), None).into_string();
        assert!(markup.contains("Waiting for vaccination data"));
    }

    #[test]
    fn renders_prefecture_rows_and_total() {
        let tracker = tracker();
        let date = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
        tracker
            .ingest(
                &[VaccinationRecord::new(date, "13", Dose::First, 1_234_567)],
                Utc::now(),
            )
            .unwrap();
        let at = civil::epoch_start(date);
        let frame = Ticker::new(Arc::clone(&tracker), FrameGate::per_second(6))
            .tick(at)
            .unwrap();

        let markup = render_counts(&tracker, Some(&frame)).into_string();
        assert!(markup.contains("東京都"));
        assert!(markup.contains("/prefecture/13"));
        assert!(markup.contains("1,234,567"));
        assert!(markup.contains("2021年6月2日 00:00:00"));
    }
}
